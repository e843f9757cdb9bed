//! Cats: continuous action tree with smoothing
//!
//! Reads continuous-action examples, runs them through the reduction stack,
//! and writes one `action,pdf_value` prediction per example.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use cats::cli::Cli;
use cats::pipeline::{build_stack, read_examples, Session};
use cats::report::{export_summary_json, PredictionSinks, RunSummary};
use cats::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_info, print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let options = cli.to_options();
    let settings = cli.session_settings();

    // Setup errors are configuration errors: abort before touching any data.
    let stack = build_stack(&options).context("Failed to set up the reduction stack")?;

    if !cli.quiet {
        print_banner(env!("CARGO_PKG_VERSION"));
        let stages: Vec<(String, String)> = stack
            .options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let outputs: Vec<&Path> = cli.predictions.iter().map(|p| p.as_path()).collect();
        print_config(&cli.data, &stages, settings.passes, &outputs);
    }

    let spinner = (!cli.quiet).then(|| create_spinner("Reading examples..."));
    let mut examples = read_examples(&cli.data)?;
    if let Some(spinner) = &spinner {
        finish_with_success(spinner, &format!("Read {} example(s)", examples.len()));
    }

    if examples.is_empty() && !cli.quiet {
        print_warning("Data file contains no examples");
    }

    let sinks = PredictionSinks::open(&cli.predictions)?;
    if sinks.is_empty() && !cli.quiet {
        print_info("No prediction output requested (use -p to write predictions)");
    }

    let resolved: BTreeMap<String, String> = stack
        .options
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let kept = stack.kept.clone();

    let mut session = Session::new(stack.top, settings.clone(), sinks, Box::new(std::io::stderr()));
    session
        .run(&mut examples)
        .context("Learning aborted")?;
    let metrics = session.finish().context("Failed to flush prediction output")?;

    let summary = RunSummary::from_metrics(&metrics, settings.passes);
    if !cli.quiet {
        summary.display();
    }

    if let Some(path) = &cli.summary_json {
        export_summary_json(&summary, &cli.data, &kept, resolved, path)?;
        if !cli.quiet {
            print_success(&format!("Summary written to {}", path.display()));
        }
    }

    if !cli.quiet {
        print_completion();
    }

    Ok(())
}
