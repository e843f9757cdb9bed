//! Report module - progress, prediction output, and run summaries

pub mod metrics;
pub mod output;
pub mod sinks;
pub mod summary;

pub use metrics::*;
pub use output::*;
pub use sinks::*;
pub use summary::*;
