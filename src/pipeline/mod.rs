//! Pipeline module - the continuous-action reduction stack and its driver

pub mod cats;
pub mod cats_pdf;
pub mod error;
pub mod example;
pub mod learner;
pub mod options;
pub mod parser;
pub mod sample_pdf;
pub mod session;
pub mod stack;

pub use cats::Cats;
pub use error::*;
pub use example::*;
pub use learner::*;
pub use options::*;
pub use parser::*;
pub use session::*;
pub use stack::*;
