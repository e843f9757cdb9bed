//! Learner capability interface and stage registration

use std::fmt;

use super::error::LearnError;
use super::example::Example;
use crate::report::ReportContext;

/// Anything that can sit in the reduction stack.
///
/// Both calls operate in place on the example's prediction and label fields.
pub trait Learner: fmt::Debug {
    fn predict(&mut self, ec: &mut Example) -> Result<(), LearnError>;
    fn learn(&mut self, ec: &mut Example) -> Result<(), LearnError>;
}

/// Kind of prediction a stage leaves on the example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionType {
    /// A full piecewise-constant density in `pred.pdf`.
    Pdf,
    /// A sampled action with its density in `pred.a_pdf`.
    ActionPdfValue,
}

/// Hook run once per example after learn/predict and before the example is finalized.
pub type FinishExampleFn = fn(&mut ReportContext<'_>, &Example);

/// A stage registered in the stack, with the wiring the driver needs.
pub struct LearnerStage {
    name: &'static str,
    learner: Box<dyn Learner>,
    prediction_type: PredictionType,
    predictions_per_example: usize,
    finish_example: Option<FinishExampleFn>,
}

impl LearnerStage {
    pub fn new(
        name: &'static str,
        learner: Box<dyn Learner>,
        prediction_type: PredictionType,
        predictions_per_example: usize,
    ) -> Self {
        Self {
            name,
            learner,
            prediction_type,
            predictions_per_example,
            finish_example: None,
        }
    }

    pub fn set_finish_example(mut self, hook: FinishExampleFn) -> Self {
        self.finish_example = Some(hook);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prediction_type(&self) -> PredictionType {
        self.prediction_type
    }

    pub fn predictions_per_example(&self) -> usize {
        self.predictions_per_example
    }

    pub fn finish_example(&self) -> Option<FinishExampleFn> {
        self.finish_example
    }

    pub fn learner_mut(&mut self) -> &mut dyn Learner {
        self.learner.as_mut()
    }

    /// Hand the learner to the stage that wraps this one.
    pub fn into_learner(self) -> Box<dyn Learner> {
        self.learner
    }
}

impl fmt::Debug for LearnerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnerStage")
            .field("name", &self.name)
            .field("learner", &self.learner)
            .field("prediction_type", &self.prediction_type)
            .field("predictions_per_example", &self.predictions_per_example)
            .field("finish_example", &self.finish_example.is_some())
            .finish()
    }
}
