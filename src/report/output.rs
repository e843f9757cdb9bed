//! Per-example progress reporting and prediction output

use std::io::Write;

use tracing::warn;

use super::metrics::{ProgressSchedule, SessionMetrics};
use super::sinks::PredictionSinks;
use crate::pipeline::example::{label_to_string, ActionPdfValue, Example};

/// Session-wide switches read by the reporter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReportSettings {
    pub quiet: bool,
    /// A second-order optimizer is driving the session and prints its own progress.
    pub bfgs: bool,
    pub holdout_set_off: bool,
    pub progress: ProgressSchedule,
}

/// What a finish-example hook may touch.
pub struct ReportContext<'a> {
    pub metrics: &'a mut SessionMetrics,
    pub sinks: &'a mut PredictionSinks,
    pub settings: &'a ReportSettings,
    pub current_pass: usize,
    pub progress_out: &'a mut dyn Write,
}

/// Non-empty label whose first element carries a real action.
pub fn has_label(ec: &Example) -> bool {
    ec.label.is_usable()
}

/// Fold the example into the running statistics and print a progress line when due.
pub fn report_progress(ctx: &mut ReportContext<'_>, ec: &Example) {
    let cost = ec.label.first().map_or(0.0, |elm| elm.cost);
    ctx.metrics.update(
        ec.test_only,
        has_label(ec),
        cost,
        ec.weight,
        ec.num_features(),
    );
    // Accumulates whether or not the label was usable.
    ctx.metrics.weighted_labels += f64::from(ec.weight);
    print_update_cb_cont(ctx, ec);
}

fn print_update_cb_cont(ctx: &mut ReportContext<'_>, ec: &Example) {
    let settings = ctx.settings;
    if ctx.metrics.weighted_examples() >= ctx.metrics.dump_interval
        && !settings.quiet
        && !settings.bfgs
    {
        let printed = ctx.metrics.print_update(
            ctx.progress_out,
            settings.holdout_set_off,
            ctx.current_pass,
            &label_to_string(ec),
            &ec.pred.a_pdf.to_text(false),
            ec.num_features(),
            settings.progress.add,
            settings.progress.arg,
        );
        if let Err(err) = printed {
            warn!(error = %err, "failed to write progress line");
        }
    }
}

/// Write the prediction to every enabled sink.
pub fn output_predictions(sinks: &mut PredictionSinks, prediction: &ActionPdfValue) {
    let text = prediction.to_text(true);
    sinks.write_all(text.as_bytes());
}
