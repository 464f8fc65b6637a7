use std::path::PathBuf;

use thiserror::Error;

use crate::config::SolverKind;

/// Errors from solver interaction.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    /// Solver binary not found at the specified path.
    #[error("{0} binary not found at: {path}", path = .1.display())]
    NotFound(SolverKind, PathBuf),
    /// Process failed to start or crashed.
    #[error("Solver process error: {0}")]
    ProcessError(String),
    /// Failed to parse solver output.
    #[error("Failed to parse solver output: {0}")]
    ParseError(String),
}
