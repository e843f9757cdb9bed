//! Running statistics for one learning session
//!
//! A `SessionMetrics` is created once before the first example and is updated
//! exactly once per finished example by the reporter. It is never reset while
//! the session runs.

use std::io::{self, Write};

use serde::Serialize;

/// How the dump interval advances after each progress line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSchedule {
    /// Additive (`true`) or multiplicative (`false`) schedule.
    pub add: bool,
    pub arg: f32,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self {
            add: false,
            arg: 2.0,
        }
    }
}

impl ProgressSchedule {
    /// Parse a `--progress` value: with a decimal point it is a multiplier,
    /// otherwise an additive step.
    pub fn parse(s: &str) -> Result<Self, String> {
        let add = !s.contains('.');
        let arg: f32 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid number", s))?;

        if add && arg <= 0.0 {
            return Err(format!("additive progress step must be positive, got {}", s));
        }
        if !add && arg <= 1.0 {
            return Err(format!("multiplicative progress factor must be greater than 1.0, got {}", s));
        }
        Ok(Self { add, arg })
    }

    fn initial_dump_interval(&self) -> f64 {
        if self.add {
            f64::from(self.arg)
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub weighted_labeled_examples: f64,
    pub old_weighted_labeled_examples: f64,
    pub weighted_unlabeled_examples: f64,
    pub weighted_labels: f64,
    pub sum_loss: f64,
    pub sum_loss_since_last_dump: f64,
    pub weighted_holdout_examples: f64,
    pub weighted_holdout_examples_since_last_dump: f64,
    pub holdout_sum_loss: f64,
    pub holdout_sum_loss_since_last_dump: f64,
    pub example_number: u64,
    pub total_features: u64,
    pub dump_interval: f64,
}

impl SessionMetrics {
    pub fn new(schedule: ProgressSchedule) -> Self {
        Self {
            weighted_labeled_examples: 0.0,
            old_weighted_labeled_examples: 0.0,
            weighted_unlabeled_examples: 0.0,
            weighted_labels: 0.0,
            sum_loss: 0.0,
            sum_loss_since_last_dump: 0.0,
            weighted_holdout_examples: 0.0,
            weighted_holdout_examples_since_last_dump: 0.0,
            holdout_sum_loss: 0.0,
            holdout_sum_loss_since_last_dump: 0.0,
            example_number: 0,
            total_features: 0,
            dump_interval: schedule.initial_dump_interval(),
        }
    }

    /// Account for one finished example.
    ///
    /// Labeled test-only examples are holdout examples and only feed the
    /// holdout sums. Everything else feeds the training sums.
    pub fn update(
        &mut self,
        test_only: bool,
        labeled: bool,
        loss: f32,
        weight: f32,
        num_features: usize,
    ) {
        let loss = f64::from(loss);
        let weight = f64::from(weight);
        if test_only && labeled {
            self.weighted_holdout_examples += weight;
            self.weighted_holdout_examples_since_last_dump += weight;
            self.holdout_sum_loss += loss;
            self.holdout_sum_loss_since_last_dump += loss;
        } else {
            if labeled {
                self.weighted_labeled_examples += weight;
            } else {
                self.weighted_unlabeled_examples += weight;
            }
            self.sum_loss += loss;
            self.sum_loss_since_last_dump += loss;
            self.total_features += num_features as u64;
            self.example_number += 1;
        }
    }

    pub fn weighted_examples(&self) -> f64 {
        self.weighted_labeled_examples + self.weighted_unlabeled_examples
    }

    pub fn average_loss(&self) -> f64 {
        ratio(self.sum_loss, self.weighted_labeled_examples)
    }

    pub fn since_last_loss(&self) -> f64 {
        ratio(
            self.sum_loss_since_last_dump,
            self.weighted_labeled_examples - self.old_weighted_labeled_examples,
        )
    }

    /// Average holdout loss, `None` before any holdout example was seen.
    pub fn holdout_average_loss(&self) -> Option<f64> {
        (self.weighted_holdout_examples > 0.0)
            .then(|| self.holdout_sum_loss / self.weighted_holdout_examples)
    }

    fn holdout_since_last_loss(&self) -> Option<f64> {
        (self.weighted_holdout_examples_since_last_dump > 0.0).then(|| {
            self.holdout_sum_loss_since_last_dump / self.weighted_holdout_examples_since_last_dump
        })
    }

    /// Column header matching `print_update`.
    pub fn print_header(out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "{:<8} {:<8} {:>12} {:>14} {:>12} {:>12} {:>8}",
            "average", "since", "example", "example", "current", "current", "current"
        )?;
        writeln!(
            out,
            "{:<8} {:<8} {:>12} {:>14} {:>12} {:>12} {:>8}",
            "loss", "last", "counter", "weight", "label", "predict", "features"
        )
    }

    /// Print one progress line and move the dump interval forward.
    ///
    /// From the second pass on, with holdout enabled, the loss columns show the
    /// holdout loss and the line is suffixed with ` h`.
    #[allow(clippy::too_many_arguments)]
    pub fn print_update(
        &mut self,
        out: &mut dyn Write,
        holdout_set_off: bool,
        current_pass: usize,
        label: &str,
        prediction: &str,
        num_features: usize,
        progress_add: bool,
        progress_arg: f32,
    ) -> io::Result<()> {
        let holdout = !holdout_set_off && current_pass >= 1;
        let (avg, since) = if holdout {
            (
                fmt_loss(self.holdout_average_loss()),
                fmt_loss(self.holdout_since_last_loss()),
            )
        } else {
            (
                fmt_loss(Some(self.average_loss())),
                fmt_loss(Some(self.since_last_loss())),
            )
        };

        let written = writeln!(
            out,
            "{} {} {:>12} {:>14.1} {:>12} {:>12} {:>8}{}",
            avg,
            since,
            self.example_number,
            self.weighted_examples(),
            label,
            prediction,
            num_features,
            if holdout { " h" } else { "" }
        );

        self.update_dump_interval(progress_add, progress_arg);
        written
    }

    pub fn update_dump_interval(&mut self, progress_add: bool, progress_arg: f32) {
        self.sum_loss_since_last_dump = 0.0;
        self.old_weighted_labeled_examples = self.weighted_labeled_examples;
        self.holdout_sum_loss_since_last_dump = 0.0;
        self.weighted_holdout_examples_since_last_dump = 0.0;

        let arg = f64::from(progress_arg);
        self.dump_interval = if progress_add {
            self.weighted_examples() + arg
        } else {
            self.weighted_examples() * arg
        };
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn fmt_loss(loss: Option<f64>) -> String {
    match loss {
        Some(v) => format!("{:<8.6}", v),
        None => format!("{:<8}", "unknown"),
    }
}
