//! Reduction stack composition
//!
//! Stages are tried in a fixed order. Each setup function decides on its own
//! whether it participates; a participating reduction asks the builder for the
//! rest of the stack beneath it through `setup_base`.

use tracing::debug;

use super::error::SetupError;
use super::learner::LearnerStage;
use super::options::{OptionGroup, Options, ParsedGroup};
use super::{cats, cats_pdf, sample_pdf};

/// Signature shared by every stage's setup function.
///
/// Returns `Ok(None)` when the stage was not requested.
pub type SetupFn = fn(&Options, &mut StackBuilder) -> Result<Option<LearnerStage>, SetupError>;

/// Builds a reduction stack from an ordered list of setup functions.
pub struct StackBuilder {
    setups: Vec<(&'static str, SetupFn)>,
    next: usize,
    resolved: Options,
    kept: Vec<(String, String)>,
}

impl StackBuilder {
    pub fn new(setups: Vec<(&'static str, SetupFn)>) -> Self {
        Self {
            setups,
            next: 0,
            resolved: Options::new(),
            kept: Vec::new(),
        }
    }

    /// The continuous-action chain: `cats -> sample_pdf -> cats_pdf`.
    pub fn continuous_actions() -> Self {
        Self::new(vec![
            (cats::CATS, cats::setup as SetupFn),
            (sample_pdf::SAMPLE_PDF, sample_pdf::setup as SetupFn),
            (cats::CATS_PDF, cats_pdf::setup as SetupFn),
        ])
    }

    /// Parse a stage's option group and remember its supplied `keep` options.
    pub fn parse_group(&mut self, options: &Options, group: &OptionGroup) -> ParsedGroup {
        let parsed = options.add_and_parse(group);
        for spec in &group.specs {
            debug!(
                group = group.name,
                option = spec.name,
                supplied = parsed.was_supplied(spec.name),
                help = spec.help,
                "declared option"
            );
        }
        for (name, value) in parsed.kept() {
            if !self.kept.iter().any(|(k, _)| k == name) {
                self.kept.push((name.clone(), value.clone()));
            }
        }
        parsed
    }

    /// Build the rest of the stack below the caller.
    ///
    /// Runs the remaining setup functions in order and returns the first stage
    /// that participates.
    pub fn setup_base(&mut self, options: &Options) -> Result<LearnerStage, SetupError> {
        self.resolved = options.clone();
        while let Some(&(name, setup)) = self.setups.get(self.next) {
            self.next += 1;
            if let Some(stage) = setup(options, self)? {
                debug!(stage = name, "stage added to stack");
                return Ok(stage);
            }
            debug!(stage = name, "stage not requested");
        }
        Err(SetupError::NoBaseLearner)
    }

    /// The option snapshot seen by the deepest stage, including derived values.
    pub fn resolved_options(&self) -> &Options {
        &self.resolved
    }

    pub fn kept(&self) -> &[(String, String)] {
        &self.kept
    }
}

/// A fully composed stack.
#[derive(Debug)]
pub struct BuiltStack {
    pub top: LearnerStage,
    pub options: Options,
    pub kept: Vec<(String, String)>,
}

/// Compose the continuous-action stack from operator options.
pub fn build_stack(options: &Options) -> Result<BuiltStack, SetupError> {
    let mut builder = StackBuilder::continuous_actions();
    let top = builder.setup_base(options)?;
    Ok(BuiltStack {
        top,
        options: builder.resolved_options().clone(),
        kept: builder.kept().to_vec(),
    })
}
