//! hoare-fv-driver: runs the verification pipeline over a module and
//! reports per-function results.
//!
//! The binary is a thin wrapper around [`cli::run`]; the modules are
//! exported for integration tests and embedding.

pub mod cex_render;
pub mod cli;
pub mod error;
pub mod json_output;
pub mod options;
pub mod output;
pub mod parallel;
pub mod pipeline;
pub mod types;

pub use cex_render::{Counterexample, render_counterexample};
pub use error::DriverError;
pub use options::{OutputFormat, VerifyOptions};
pub use pipeline::Pipeline;
pub use types::{CheckState, FunctionOutcome, FunctionResult, RunReport, Tally};
