//! Error types for stack setup, learning, and example parsing.
//!
//! Setup errors are fatal: they abort construction of the reduction stack
//! before any stage is published. `LearnError::TestOnlyExample` is a caller
//! contract violation and must abort the session rather than be retried.

use thiserror::Error;

/// Errors raised while composing the reduction stack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    /// `--cats` was supplied with a count that is not strictly positive.
    #[error("num_actions_gt_zero: number of actions must be greater than zero, got --cats {0}")]
    NumActionsGtZero(i64),

    /// `--cats_pdf` was supplied explicitly and disagrees with `--cats`.
    #[error("action_counts_disagree: --cats {cats} does not match --cats_pdf {cats_pdf}")]
    ActionCountsDisagree { cats: i64, cats_pdf: i64 },

    /// An option value could not be interpreted.
    #[error("invalid value '{value}' for option --{name}: {reason}")]
    InvalidOptionValue {
        name: String,
        value: String,
        reason: String,
    },

    /// The continuous action range is empty or inverted.
    #[error("--min_value ({min}) must be less than --max_value ({max})")]
    InvalidRange { min: f32, max: f32 },

    /// No stage in the stack was able to act as the base learner.
    #[error("no base learner configured; supply --cats or --cats_pdf")]
    NoBaseLearner,
}

/// Errors raised by a stage while learning or predicting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearnError {
    /// `learn` was called on a test-only (held-out or unlabeled) example.
    #[error("learn called on a test-only example; refusing to train on held-out data")]
    TestOnlyExample,

    /// The inner stage produced a density with no positive mass to sample from.
    #[error("predicted pdf has no positive mass to sample an action from")]
    EmptyPdf,
}

/// Errors raised while reading examples from text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed label element '{token}': {reason}")]
    MalformedLabel {
        line: usize,
        token: String,
        reason: String,
    },

    #[error("line {line}: malformed feature '{token}'")]
    MalformedFeature { line: usize, token: String },

    #[error("line {line}: unexpected label token '{token}', expected 'ca'")]
    UnknownLabelType { line: usize, token: String },
}
