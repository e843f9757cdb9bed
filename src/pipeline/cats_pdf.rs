//! Discretized, smoothed density over a continuous action range
//!
//! The range `[min_value, max_value)` is split into `num_actions` equal
//! buckets. Each bucket carries a linear regressor of the cost of playing an
//! action in it. Prediction puts `1 - epsilon` of the mass on the cheapest
//! bucket and spreads `epsilon` evenly over all buckets, then smooths every
//! bucket's mass uniformly over `[center - bandwidth, center + bandwidth]`
//! clipped to the range.

use std::collections::HashMap;

use super::cats::CATS_PDF;
use super::error::{LearnError, SetupError};
use super::example::{Example, PdfSegment};
use super::learner::{Learner, LearnerStage, PredictionType};
use super::options::{OptionGroup, OptionSpec, Options};
use super::stack::StackBuilder;

pub const MIN_VALUE: &str = "min_value";
pub const MAX_VALUE: &str = "max_value";
pub const BANDWIDTH: &str = "bandwidth";
pub const EPSILON: &str = "epsilon";
pub const LEARNING_RATE: &str = "learning_rate";

/// Largest supported number of discretized actions (one regressor per bucket).
pub const MAX_NUM_ACTIONS: i64 = 1 << 20;

/// Linear cost estimate for one bucket.
#[derive(Debug, Clone, Default)]
struct CostRegressor {
    bias: f32,
    weights: HashMap<String, f32>,
}

impl CostRegressor {
    fn predict(&self, ec: &Example) -> f32 {
        ec.features().fold(self.bias, |acc, (ns, f)| {
            acc + self.weights.get(&feature_key(ns, &f.name)).copied().unwrap_or(0.0) * f.value
        })
    }

    fn update(&mut self, ec: &Example, cost: f32, rate: f32) {
        let err = self.predict(ec) - cost;
        self.bias -= rate * err;
        for (ns, f) in ec.features() {
            *self.weights.entry(feature_key(ns, &f.name)).or_insert(0.0) -= rate * err * f.value;
        }
    }
}

fn feature_key(ns: &str, name: &str) -> String {
    format!("{}^{}", ns, name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatsPdfConfig {
    pub num_actions: usize,
    pub min_value: f32,
    pub max_value: f32,
    pub bandwidth: f32,
    pub epsilon: f32,
    pub learning_rate: f32,
}

impl CatsPdfConfig {
    /// Half a bucket: neighbouring smoothing windows touch without overlapping.
    pub fn default_bandwidth(num_actions: usize, min_value: f32, max_value: f32) -> f32 {
        (max_value - min_value) / num_actions as f32 / 2.0
    }

    fn unit(&self) -> f32 {
        (self.max_value - self.min_value) / self.num_actions as f32
    }
}

#[derive(Debug)]
pub struct CatsPdf {
    config: CatsPdfConfig,
    buckets: Vec<CostRegressor>,
}

impl CatsPdf {
    pub fn new(config: CatsPdfConfig) -> Self {
        Self {
            config,
            buckets: vec![CostRegressor::default(); config.num_actions],
        }
    }

    pub fn config(&self) -> &CatsPdfConfig {
        &self.config
    }

    /// Bucket containing `action`, clamped into the range.
    pub fn bucket_of(&self, action: f32) -> usize {
        let idx = ((action - self.config.min_value) / self.config.unit()).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(self.config.num_actions - 1)
        }
    }

    /// Bucket with the lowest predicted cost; ties go to the lowest index.
    fn best_bucket(&self, ec: &Example) -> usize {
        let mut best = 0;
        let mut best_cost = f32::INFINITY;
        for (i, bucket) in self.buckets.iter().enumerate() {
            let cost = bucket.predict(ec);
            if cost < best_cost {
                best = i;
                best_cost = cost;
            }
        }
        best
    }

    fn pmf(&self, chosen: usize) -> Vec<f32> {
        let k = self.config.num_actions;
        let explore = self.config.epsilon / k as f32;
        let mut pmf = vec![explore; k];
        pmf[chosen] += 1.0 - self.config.epsilon;
        pmf
    }
}

/// Spread each bucket's probability uniformly over its clipped window.
///
/// The result covers `[min_value, max_value]` with sorted, non-overlapping
/// segments and integrates to the total probability of `pmf`.
pub fn smooth_pmf(pmf: &[f32], min_value: f32, max_value: f32, bandwidth: f32) -> Vec<PdfSegment> {
    let unit = (max_value - min_value) / pmf.len() as f32;
    let windows: Vec<(f32, f32, f32)> = pmf
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let center = min_value + (i as f32 + 0.5) * unit;
            let left = (center - bandwidth).max(min_value);
            let right = (center + bandwidth).min(max_value);
            (left, right, p)
        })
        .collect();

    let mut points: Vec<f32> = Vec::with_capacity(windows.len() * 2 + 2);
    points.push(min_value);
    points.push(max_value);
    for &(left, right, _) in &windows {
        points.push(left);
        points.push(right);
    }
    points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    points.dedup();

    points
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| {
            let mid = (w[0] + w[1]) / 2.0;
            let pdf_value = windows
                .iter()
                .filter(|(left, right, _)| *left <= mid && mid < *right)
                .map(|(left, right, p)| p / (right - left))
                .sum();
            PdfSegment {
                left: w[0],
                right: w[1],
                pdf_value,
            }
        })
        .collect()
}

impl Learner for CatsPdf {
    fn predict(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        let chosen = self.best_bucket(ec);
        let pmf = self.pmf(chosen);
        ec.pred.pdf = smooth_pmf(
            &pmf,
            self.config.min_value,
            self.config.max_value,
            self.config.bandwidth,
        );
        Ok(())
    }

    fn learn(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        let Some(elm) = ec.label.first().filter(|_| ec.label.is_usable()).copied() else {
            return Ok(());
        };
        let bucket = self.bucket_of(elm.action);
        let rate = self.config.learning_rate * ec.weight;
        self.buckets[bucket].update(ec, elm.cost, rate);
        Ok(())
    }
}

pub fn option_group() -> OptionGroup {
    OptionGroup::new("Continuous action pdf")
        .add(
            OptionSpec::new(CATS_PDF, 0)
                .keep()
                .help("Number of discrete actions the pdf is built over"),
        )
        .add(
            OptionSpec::new(MIN_VALUE, 0.0)
                .keep()
                .help("Lower bound of the continuous action range"),
        )
        .add(
            OptionSpec::new(MAX_VALUE, 1.0)
                .keep()
                .help("Upper bound of the continuous action range"),
        )
        .add(
            OptionSpec::new(BANDWIDTH, 0.0)
                .keep()
                .help("Smoothing half-width; defaults to half a bucket"),
        )
        .add(OptionSpec::new(EPSILON, 0.05).help("Exploration probability"))
        .add(OptionSpec::new(LEARNING_RATE, 0.5).help("Step size of the per-bucket cost regressors"))
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> SetupError {
    SetupError::InvalidOptionValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn setup(
    options: &Options,
    builder: &mut StackBuilder,
) -> Result<Option<LearnerStage>, SetupError> {
    let parsed = builder.parse_group(options, &option_group());
    if !parsed.was_supplied(CATS_PDF) {
        return Ok(None);
    }

    let num_actions: i64 = parsed.get(CATS_PDF)?;
    if num_actions <= 0 {
        return Err(invalid(CATS_PDF, num_actions, "must be greater than zero"));
    }
    if num_actions > MAX_NUM_ACTIONS {
        return Err(invalid(
            CATS_PDF,
            num_actions,
            &format!("must be at most {}", MAX_NUM_ACTIONS),
        ));
    }
    let num_actions = num_actions as usize;

    let min_value: f32 = parsed.get(MIN_VALUE)?;
    let max_value: f32 = parsed.get(MAX_VALUE)?;
    if !(min_value < max_value) {
        return Err(SetupError::InvalidRange {
            min: min_value,
            max: max_value,
        });
    }

    let bandwidth: f32 = parsed.get(BANDWIDTH)?;
    let bandwidth = if parsed.was_supplied(BANDWIDTH) {
        if !(bandwidth > 0.0) {
            return Err(invalid(BANDWIDTH, bandwidth, "must be greater than zero"));
        }
        bandwidth
    } else {
        CatsPdfConfig::default_bandwidth(num_actions, min_value, max_value)
    };

    let epsilon: f32 = parsed.get(EPSILON)?;
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(invalid(EPSILON, epsilon, "must be between 0.0 and 1.0"));
    }

    let learning_rate: f32 = parsed.get(LEARNING_RATE)?;
    if !(learning_rate > 0.0) {
        return Err(invalid(LEARNING_RATE, learning_rate, "must be greater than zero"));
    }

    let learner = CatsPdf::new(CatsPdfConfig {
        num_actions,
        min_value,
        max_value,
        bandwidth,
        epsilon,
        learning_rate,
    });

    Ok(Some(LearnerStage::new(
        CATS_PDF,
        Box::new(learner),
        PredictionType::Pdf,
        1,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_actions: usize, epsilon: f32) -> CatsPdfConfig {
        CatsPdfConfig {
            num_actions,
            min_value: 0.0,
            max_value: 4.0,
            bandwidth: CatsPdfConfig::default_bandwidth(num_actions, 0.0, 4.0),
            epsilon,
            learning_rate: 0.5,
        }
    }

    fn total_mass(pdf: &[PdfSegment]) -> f32 {
        pdf.iter().map(PdfSegment::mass).sum()
    }

    #[test]
    fn test_default_bandwidth_matches_buckets() {
        let pmf = vec![0.25; 4];
        let pdf = smooth_pmf(&pmf, 0.0, 4.0, 0.5);

        assert_eq!(pdf.len(), 4);
        for seg in &pdf {
            assert!((seg.right - seg.left - 1.0).abs() < 1e-6);
            assert!((seg.pdf_value - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wide_bandwidth_conserves_mass() {
        let pmf = vec![0.1, 0.6, 0.2, 0.1];
        let pdf = smooth_pmf(&pmf, 0.0, 4.0, 1.3);

        assert!((total_mass(&pdf) - 1.0).abs() < 1e-5);
        assert!(pdf.windows(2).all(|w| w[0].right <= w[1].left + 1e-6));
        assert!((pdf[0].left - 0.0).abs() < 1e-6);
        assert!((pdf[pdf.len() - 1].right - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_favours_cheapest_bucket() {
        let mut learner = CatsPdf::new(config(4, 0.0));
        let mut ec = Example::new().with_label(2.5, -1.0, 0.25);

        learner.learn(&mut ec).unwrap();
        learner.predict(&mut ec).unwrap();

        let dense: Vec<&PdfSegment> = ec.pred.pdf.iter().filter(|s| s.pdf_value > 0.0).collect();
        assert_eq!(dense.len(), 1);
        assert!((dense[0].left - 2.0).abs() < 1e-6);
        assert!((dense[0].pdf_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_exploration_keeps_every_bucket_reachable() {
        let mut learner = CatsPdf::new(config(4, 0.2));
        let mut ec = Example::new();

        learner.predict(&mut ec).unwrap();

        assert!(ec.pred.pdf.iter().all(|s| s.pdf_value > 0.0));
        assert!((total_mass(&ec.pred.pdf) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_learn_ignores_missing_action() {
        let mut learner = CatsPdf::new(config(4, 0.0));
        let mut ec = Example::new().with_label(f32::MAX, -5.0, 0.0);

        learner.learn(&mut ec).unwrap();
        learner.predict(&mut ec).unwrap();

        // untouched model: all buckets tie and the first one wins
        let dense: Vec<&PdfSegment> = ec.pred.pdf.iter().filter(|s| s.pdf_value > 0.0).collect();
        assert!((dense[0].left - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_action_count_is_rejected() {
        let options = Options::new().insert(CATS_PDF, MAX_NUM_ACTIONS + 1);
        let mut builder = StackBuilder::continuous_actions();

        let err = builder.setup_base(&options).unwrap_err();
        assert!(matches!(err, SetupError::InvalidOptionValue { ref name, .. } if name == CATS_PDF));
    }

    #[test]
    fn test_bucket_of_clamps() {
        let learner = CatsPdf::new(config(4, 0.0));
        assert_eq!(learner.bucket_of(-3.0), 0);
        assert_eq!(learner.bucket_of(1.5), 1);
        assert_eq!(learner.bucket_of(4.0), 3);
        assert_eq!(learner.bucket_of(100.0), 3);
    }
}
