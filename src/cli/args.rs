//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::cats::{CATS, CATS_PDF};
use crate::pipeline::cats_pdf::{BANDWIDTH, EPSILON, LEARNING_RATE, MAX_VALUE, MIN_VALUE};
use crate::pipeline::sample_pdf::{RANDOM_SEED, SAMPLE_PDF};
use crate::pipeline::{Options, SessionSettings};
use crate::report::ProgressSchedule;

/// Cats - contextual bandit learning over a continuous action space
#[derive(Parser, Debug)]
#[command(name = "cats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Example data file, one `ca action:cost:pdf | features` example per line
    #[arg(short, long)]
    pub data: PathBuf,

    /// Number of discretized actions; supplying it activates the cats reduction
    #[arg(long = "cats", allow_negative_numbers = true)]
    pub cats: Option<i64>,

    /// Number of discretized actions of the pdf stage. Must equal --cats when both are given.
    #[arg(long = "cats_pdf", allow_negative_numbers = true)]
    pub cats_pdf: Option<i64>,

    /// Sample an action from the predicted pdf (added automatically under --cats)
    #[arg(long = "sample_pdf", default_value = "false")]
    pub sample_pdf: bool,

    /// Lower bound of the continuous action range
    #[arg(long = "min_value", allow_negative_numbers = true)]
    pub min_value: Option<f32>,

    /// Upper bound of the continuous action range
    #[arg(long = "max_value", allow_negative_numbers = true)]
    pub max_value: Option<f32>,

    /// Smoothing half-width around each discretized action.
    /// Defaults to half the width of one discretized action.
    #[arg(long)]
    pub bandwidth: Option<f32>,

    /// Exploration probability spread evenly over all discretized actions (0.0 to 1.0)
    #[arg(long, value_parser = validate_epsilon)]
    pub epsilon: Option<f32>,

    /// Step size of the per-action cost regressors
    #[arg(long = "learning_rate", short = 'l')]
    pub learning_rate: Option<f32>,

    /// Seed for the action sampler
    #[arg(long = "random_seed")]
    pub random_seed: Option<u64>,

    /// Prediction output file (repeatable). Use '-' for stdout.
    #[arg(short, long = "predictions")]
    pub predictions: Vec<PathBuf>,

    /// Ignore labels and only predict
    #[arg(short = 't', long = "testonly", default_value = "false")]
    pub testonly: bool,

    /// Suppress the banner, progress lines and summary
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Number of passes over the data
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub passes: u64,

    /// Do not hold out examples when running multiple passes
    #[arg(long = "holdout_off", default_value = "false")]
    pub holdout_off: bool,

    /// Hold out every N-th example when running multiple passes
    #[arg(long = "holdout_period", default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub holdout_period: u64,

    /// Progress line schedule: a value with a decimal point multiplies the
    /// dump interval (e.g. 2.0), an integer adds to it (e.g. 100)
    #[arg(short = 'P', long, default_value = "2.0", value_parser = ProgressSchedule::parse)]
    pub progress: ProgressSchedule,

    /// Write a JSON run summary to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,

    /// Emit debug traces of every learn/predict call on stderr
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Option snapshot holding exactly the stack options that were supplied.
    pub fn to_options(&self) -> Options {
        let mut options = Options::new();
        if let Some(v) = self.cats {
            options = options.insert(CATS, v);
        }
        if let Some(v) = self.cats_pdf {
            options = options.insert(CATS_PDF, v);
        }
        if self.sample_pdf {
            options = options.insert(SAMPLE_PDF, "");
        }
        if let Some(v) = self.min_value {
            options = options.insert(MIN_VALUE, v);
        }
        if let Some(v) = self.max_value {
            options = options.insert(MAX_VALUE, v);
        }
        if let Some(v) = self.bandwidth {
            options = options.insert(BANDWIDTH, v);
        }
        if let Some(v) = self.epsilon {
            options = options.insert(EPSILON, v);
        }
        if let Some(v) = self.learning_rate {
            options = options.insert(LEARNING_RATE, v);
        }
        if let Some(v) = self.random_seed {
            options = options.insert(RANDOM_SEED, v);
        }
        options
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            passes: self.passes as usize,
            holdout_period: self.holdout_period as usize,
            holdout_off: self.holdout_off,
            test_only: self.testonly,
            quiet: self.quiet,
            bfgs: false,
            progress: self.progress,
        }
    }
}

/// Validator for epsilon parameter
fn validate_epsilon(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("epsilon must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}
