//! Continuous action tree with smoothing
//!
//! Outermost reduction of the continuous-action chain. It is a pass-through:
//! `predict` and `learn` are forwarded to the stage below, which produces the
//! sampled action and its density. What this stage owns is the wiring of the
//! chain at setup time, the refusal to learn on test-only examples, and the
//! per-example progress and prediction output (see `report::output`).
//!
//! Stack: `cats -> sample_pdf -> cats_pdf -> ...`

use tracing::debug;

use super::error::{LearnError, SetupError};
use super::example::{features_to_string, label_to_string, Example};
use super::learner::{Learner, LearnerStage, PredictionType};
use super::options::{OptionGroup, OptionSpec, Options, ParsedGroup};
use super::sample_pdf::SAMPLE_PDF;
use super::stack::StackBuilder;
use crate::report::{output_predictions, report_progress, ReportContext};

pub const CATS: &str = "cats";
pub const CATS_PDF: &str = "cats_pdf";

/// The pass-through reduction. Owns the stage directly beneath it.
#[derive(Debug)]
pub struct Cats {
    base: Box<dyn Learner>,
}

impl Cats {
    pub fn new(base: Box<dyn Learner>) -> Self {
        Self { base }
    }
}

impl Learner for Cats {
    fn predict(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        debug!(features = %features_to_string(ec), "cats::predict");
        self.base.predict(ec)
    }

    /// Predicts first so that every learn pass carries a prediction.
    ///
    /// Returns `LearnError::TestOnlyExample` without touching the stage below
    /// when the example is test-only. Callers must treat that as fatal.
    fn learn(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        if ec.test_only {
            return Err(LearnError::TestOnlyExample);
        }
        self.predict(ec)?;
        debug!(
            label = %label_to_string(ec),
            features = %features_to_string(ec),
            "cats::learn"
        );
        self.base.learn(ec)
    }
}

/// Values this stage synthesizes for the stages beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatsPlan {
    pub num_actions: i64,
    pub derived: Vec<(String, String)>,
}

pub fn option_group() -> OptionGroup {
    OptionGroup::new("Continuous action tree with smoothing")
        .add(
            OptionSpec::new(CATS, 0)
                .keep()
                .help("Continuous action tree with smoothing"),
        )
        .add(
            OptionSpec::new(CATS_PDF, 0)
                .keep()
                .help("Continuous action tree with smoothing (pdf)"),
        )
}

/// Validate the cats options and work out what the stages below must see.
///
/// `Ok(None)` means the reduction was not requested.
pub fn resolve(options: &Options) -> Result<Option<CatsPlan>, SetupError> {
    plan(&options.add_and_parse(&option_group()), options)
}

fn plan(parsed: &ParsedGroup, options: &Options) -> Result<Option<CatsPlan>, SetupError> {
    if !parsed.was_supplied(CATS) {
        return Ok(None);
    }

    let num_actions: i64 = parsed.get(CATS)?;
    if num_actions <= 0 {
        return Err(SetupError::NumActionsGtZero(num_actions));
    }

    let mut derived = Vec::new();

    if !options.was_supplied(SAMPLE_PDF) {
        derived.push((SAMPLE_PDF.to_string(), String::new()));
    }

    if parsed.was_supplied(CATS_PDF) {
        let pdf_num_actions: i64 = parsed.get(CATS_PDF)?;
        if pdf_num_actions != num_actions {
            return Err(SetupError::ActionCountsDisagree {
                cats: num_actions,
                cats_pdf: pdf_num_actions,
            });
        }
    } else {
        derived.push((CATS_PDF.to_string(), num_actions.to_string()));
    }

    Ok(Some(CatsPlan {
        num_actions,
        derived,
    }))
}

/// Add the cats reduction to the stack if `--cats` was supplied.
pub fn setup(
    options: &Options,
    builder: &mut StackBuilder,
) -> Result<Option<LearnerStage>, SetupError> {
    let parsed = builder.parse_group(options, &option_group());
    let Some(plan) = plan(&parsed, options)? else {
        return Ok(None);
    };
    debug!(num_actions = plan.num_actions, derived = ?plan.derived, "cats setup");

    let stack_options = options.with_derived(&plan.derived);
    let base = builder.setup_base(&stack_options)?;
    let reduction = Cats::new(base.into_learner());

    Ok(Some(
        LearnerStage::new(
            CATS,
            Box::new(reduction),
            PredictionType::ActionPdfValue,
            1,
        )
        .set_finish_example(finish_example),
    ))
}

/// Report progress and write the prediction; the driver finalizes the example afterwards.
pub fn finish_example(ctx: &mut ReportContext<'_>, ec: &Example) {
    report_progress(ctx, ec);
    output_predictions(ctx.sinks, &ec.pred.a_pdf);
}
