//! Sample a continuous action from the density predicted below

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{LearnError, SetupError};
use super::example::{ActionPdfValue, Example, PdfSegment};
use super::learner::{Learner, LearnerStage, PredictionType};
use super::options::{OptionGroup, OptionSpec, Options};
use super::stack::StackBuilder;

pub const SAMPLE_PDF: &str = "sample_pdf";
pub const RANDOM_SEED: &str = "random_seed";

#[derive(Debug)]
pub struct SamplePdf {
    base: Box<dyn Learner>,
    rng: StdRng,
}

impl SamplePdf {
    pub fn new(base: Box<dyn Learner>, seed: u64) -> Self {
        Self {
            base,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Learner for SamplePdf {
    fn predict(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        self.base.predict(ec)?;
        let u: f32 = self.rng.gen();
        ec.pred.a_pdf = sample_from_pdf(&ec.pred.pdf, u).ok_or(LearnError::EmptyPdf)?;
        Ok(())
    }

    fn learn(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        self.base.learn(ec)
    }
}

/// Invert the CDF of a piecewise-constant density at `u` in `[0, 1)`.
///
/// The density is normalized by its total mass, so the returned `pdf_value`
/// is the density of the chosen action. `None` if nothing has positive mass.
pub fn sample_from_pdf(pdf: &[PdfSegment], u: f32) -> Option<ActionPdfValue> {
    let total: f32 = pdf
        .iter()
        .filter(|s| s.pdf_value > 0.0 && s.right > s.left)
        .map(PdfSegment::mass)
        .sum();
    if total <= 0.0 {
        return None;
    }

    let target = u.clamp(0.0, 1.0) * total;
    let mut acc = 0.0_f32;
    let mut last = None;
    for seg in pdf.iter().filter(|s| s.pdf_value > 0.0 && s.right > s.left) {
        let mass = seg.mass();
        if acc + mass > target {
            let action = (seg.left + (target - acc) / seg.pdf_value).min(seg.right);
            return Some(ActionPdfValue::new(action, seg.pdf_value / total));
        }
        acc += mass;
        last = Some(seg);
    }

    // Rounding left `target` at the very top of the CDF.
    last.map(|seg| ActionPdfValue::new((seg.left + seg.right) / 2.0, seg.pdf_value / total))
}

pub fn option_group() -> OptionGroup {
    OptionGroup::new("Sample pdf")
        .add(OptionSpec::new(SAMPLE_PDF, "").help("Sample a pdf and pick a continuous valued action"))
        .add(OptionSpec::new(RANDOM_SEED, 0).help("Seed for the action sampler"))
}

pub fn setup(
    options: &Options,
    builder: &mut StackBuilder,
) -> Result<Option<LearnerStage>, SetupError> {
    let parsed = builder.parse_group(options, &option_group());
    if !parsed.was_supplied(SAMPLE_PDF) {
        return Ok(None);
    }
    let seed: u64 = parsed.get(RANDOM_SEED)?;

    let base = builder.setup_base(options)?;
    let reduction = SamplePdf::new(base.into_learner(), seed);

    Ok(Some(LearnerStage::new(
        SAMPLE_PDF,
        Box::new(reduction),
        PredictionType::ActionPdfValue,
        1,
    )))
}
