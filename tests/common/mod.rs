//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use cats::pipeline::{ActionPdfValue, Example, LearnError, Learner, PdfSegment};
use tempfile::TempDir;

/// In-memory writer whose contents stay readable after it has been boxed away
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Calls seen by a `RecordingLearner`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calls {
    pub predicts: usize,
    pub learns: usize,
}

/// Base learner that writes a fixed prediction and counts its calls
#[derive(Debug)]
pub struct RecordingLearner {
    pub calls: Rc<RefCell<Calls>>,
    pub prediction: ActionPdfValue,
    pub pdf: Vec<PdfSegment>,
}

impl RecordingLearner {
    pub fn new(action: f32, pdf_value: f32) -> (Self, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let learner = Self {
            calls: Rc::clone(&calls),
            prediction: ActionPdfValue::new(action, pdf_value),
            pdf: vec![PdfSegment {
                left: 0.0,
                right: 1.0,
                pdf_value: 1.0,
            }],
        };
        (learner, calls)
    }
}

impl Learner for RecordingLearner {
    fn predict(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        self.calls.borrow_mut().predicts += 1;
        ec.pred.pdf = self.pdf.clone();
        ec.pred.a_pdf = self.prediction;
        Ok(())
    }

    fn learn(&mut self, _ec: &mut Example) -> Result<(), LearnError> {
        self.calls.borrow_mut().learns += 1;
        Ok(())
    }
}

/// Labeled example with one feature
pub fn labeled_example(action: f32, cost: f32, pdf_value: f32) -> Example {
    Example::new()
        .with_label(action, cost, pdf_value)
        .with_feature("user", "age", 0.3)
}

/// Deterministic labeled stream over [0, 1]: low actions are cheap
pub fn example_stream(n: usize) -> Vec<Example> {
    (0..n)
        .map(|i| {
            let action = (i % 10) as f32 / 10.0 + 0.05;
            labeled_example(action, action, 0.5).with_feature("item", "slot", (i % 3) as f32)
        })
        .collect()
}

/// Write a data file into a fresh temporary directory
pub fn create_temp_data(lines: &[&str]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("train.dat");
    std::fs::write(&data_path, lines.join("\n")).unwrap();
    (temp_dir, data_path)
}

/// Assert that every prediction line reads `action,pdf_value` with numeric parts
pub fn assert_prediction_lines(text: &str, expected: usize) {
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), expected, "prediction line count mismatch: {:?}", lines);
    for line in lines {
        let parts: Vec<&str> = line.split(',').collect();
        assert_eq!(parts.len(), 2, "malformed prediction line: '{}'", line);
        assert!(parts[0].parse::<f32>().is_ok(), "bad action in '{}'", line);
        assert!(parts[1].parse::<f32>().is_ok(), "bad pdf value in '{}'", line);
    }
}
