//! Session driver - feeds examples through the stack one at a time

use std::io::Write;

use tracing::warn;

use super::error::LearnError;
use super::example::{Example, Prediction};
use super::learner::LearnerStage;
use crate::report::{
    PredictionSinks, ProgressSchedule, ReportContext, ReportSettings, SessionMetrics,
};

/// Knobs for one learning session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub passes: usize,
    /// Every `holdout_period`-th example is held out when holdout is active.
    pub holdout_period: usize,
    pub holdout_off: bool,
    /// Predict only; never learn.
    pub test_only: bool,
    pub quiet: bool,
    pub bfgs: bool,
    pub progress: ProgressSchedule,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            passes: 1,
            holdout_period: 10,
            holdout_off: false,
            test_only: false,
            quiet: false,
            bfgs: false,
            progress: ProgressSchedule::default(),
        }
    }
}

impl SessionSettings {
    /// Holdout only makes sense when examples are seen more than once.
    pub fn holdout_set_off(&self) -> bool {
        self.holdout_off || self.passes <= 1
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            quiet: self.quiet,
            bfgs: self.bfgs,
            holdout_set_off: self.holdout_set_off(),
            progress: self.progress,
        }
    }

    fn is_holdout(&self, index: usize) -> bool {
        !self.holdout_set_off() && self.holdout_period > 0 && (index + 1) % self.holdout_period == 0
    }
}

/// One learning session: the stack, its statistics, and its outputs.
pub struct Session {
    stack: LearnerStage,
    settings: SessionSettings,
    report: ReportSettings,
    metrics: SessionMetrics,
    sinks: PredictionSinks,
    progress_out: Box<dyn Write>,
    current_pass: usize,
    header_printed: bool,
}

impl Session {
    pub fn new(
        stack: LearnerStage,
        settings: SessionSettings,
        sinks: PredictionSinks,
        progress_out: Box<dyn Write>,
    ) -> Self {
        let report = settings.report_settings();
        Self {
            stack,
            metrics: SessionMetrics::new(settings.progress),
            settings,
            report,
            sinks,
            progress_out,
            current_pass: 0,
            header_printed: false,
        }
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn current_pass(&self) -> usize {
        self.current_pass
    }

    /// Learn (or predict, for test-only examples), then finish the example.
    ///
    /// Examples without a usable label are marked test-only here.
    /// An error means the stack refused the example; the session must not continue.
    pub fn process(&mut self, ec: &mut Example) -> Result<(), LearnError> {
        if !self.header_printed && !self.report.quiet && !self.report.bfgs {
            if let Err(err) = SessionMetrics::print_header(&mut *self.progress_out) {
                warn!(error = %err, "failed to write progress header");
            }
            self.header_printed = true;
        }

        if !ec.label.is_usable() {
            ec.test_only = true;
        }

        let learner = self.stack.learner_mut();
        if ec.test_only {
            learner.predict(ec)?;
        } else {
            learner.learn(ec)?;
        }

        let hook = self.stack.finish_example();
        let mut ctx = ReportContext {
            metrics: &mut self.metrics,
            sinks: &mut self.sinks,
            settings: &self.report,
            current_pass: self.current_pass,
            progress_out: &mut *self.progress_out,
        };
        match hook {
            Some(finish) => finish(&mut ctx, ec),
            None => default_finish_example(&mut ctx, ec),
        }

        finalize_example(ec);
        Ok(())
    }

    /// Run all passes over `examples`.
    ///
    /// Holdout and `--testonly` decide each example's test-only flag per pass;
    /// examples that arrived test-only stay test-only.
    pub fn run(&mut self, examples: &mut [Example]) -> Result<(), LearnError> {
        let arrived_test_only: Vec<bool> = examples.iter().map(|ec| ec.test_only).collect();
        for pass in 0..self.settings.passes {
            self.current_pass = pass;
            for (idx, ec) in examples.iter_mut().enumerate() {
                ec.test_only =
                    arrived_test_only[idx] || self.settings.test_only || self.settings.is_holdout(idx);
                self.process(ec)?;
            }
        }
        Ok(())
    }

    /// Flush sinks and hand back the final statistics.
    pub fn finish(mut self) -> std::io::Result<SessionMetrics> {
        self.sinks.flush()?;
        self.progress_out.flush()?;
        Ok(self.metrics)
    }
}

/// Statistics-only finish for stacks without their own hook.
fn default_finish_example(ctx: &mut ReportContext<'_>, ec: &Example) {
    let cost = ec.label.first().map_or(0.0, |elm| elm.cost);
    ctx.metrics.update(
        ec.test_only,
        ec.label.is_usable(),
        cost,
        ec.weight,
        ec.num_features(),
    );
}

/// Release the example back to the driver so it can be replayed on the next pass.
pub fn finalize_example(ec: &mut Example) {
    ec.pred = Prediction::default();
}
