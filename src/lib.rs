//! Cats: continuous action tree with smoothing
//!
//! An online contextual-bandit reduction stack over a continuous action
//! space: option-driven stack composition, a pass-through outer reduction,
//! and per-example progress and prediction reporting.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
