//! Tests for the pass-through reduction

mod common;

use cats::pipeline::{Cats, Example, LearnError, Learner};
use common::{labeled_example, RecordingLearner};

#[test]
fn test_predict_matches_base_learner() {
    let (mut base, _) = RecordingLearner::new(0.42, 1.7);
    let (inner, calls) = RecordingLearner::new(0.42, 1.7);
    let mut cats = Cats::new(Box::new(inner));

    let mut direct = labeled_example(0.2, 1.0, 0.5);
    let mut wrapped = direct.clone();
    base.predict(&mut direct).unwrap();
    cats.predict(&mut wrapped).unwrap();

    assert_eq!(wrapped.pred, direct.pred);
    assert_eq!(calls.borrow().predicts, 1);
    assert_eq!(calls.borrow().learns, 0);
}

#[test]
fn test_learn_forwards_after_predicting() {
    let (inner, calls) = RecordingLearner::new(0.9, 3.0);
    let mut cats = Cats::new(Box::new(inner));
    let mut ec = labeled_example(0.5, 0.25, 0.5);

    cats.learn(&mut ec).unwrap();

    assert_eq!(calls.borrow().predicts, 1);
    assert_eq!(calls.borrow().learns, 1);
    assert_eq!(ec.pred.a_pdf.action, 0.9);
    assert_eq!(ec.pred.a_pdf.pdf_value, 3.0);
}

#[test]
fn test_learn_on_test_only_leaves_base_untouched() {
    let (inner, calls) = RecordingLearner::new(0.9, 3.0);
    let mut cats = Cats::new(Box::new(inner));
    let mut ec = labeled_example(0.5, 0.25, 0.5).with_test_only(true);
    let before = ec.clone();

    assert_eq!(cats.learn(&mut ec), Err(LearnError::TestOnlyExample));
    assert_eq!(calls.borrow().predicts, 0);
    assert_eq!(calls.borrow().learns, 0);
    assert_eq!(ec, before);
}

#[test]
fn test_predict_allowed_on_test_only() {
    let (inner, calls) = RecordingLearner::new(0.1, 2.0);
    let mut cats = Cats::new(Box::new(inner));
    let mut ec = Example::new().with_test_only(true);

    cats.predict(&mut ec).unwrap();

    assert_eq!(calls.borrow().predicts, 1);
    assert_eq!(ec.pred.a_pdf.action, 0.1);
}
