//! Errors that stop a run before any function is checked.
//!
//! Per-function failures never surface here; they are outcomes in the
//! [`RunReport`](crate::types::RunReport).

use std::io;
use std::path::PathBuf;

use hoare_fv_analysis::VerifyError;
use hoare_fv_solver::SolverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input module failed to deserialize.
    #[error("invalid input: {0}")]
    Input(#[from] VerifyError),

    /// No usable solver backend.
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("cannot build worker pool: {0}")]
    Pool(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoare_fv_solver::SolverKind;

    #[test]
    fn read_error_names_path() {
        let err = DriverError::Read {
            path: PathBuf::from("/no/such.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "cannot read /no/such.json: not found");
    }

    #[test]
    fn solver_errors_pass_through() {
        let err: DriverError = SolverError::NotFound(SolverKind::Z3, "/x/z3".into()).into();
        assert_eq!(err.to_string(), "Z3 binary not found at: /x/z3");
    }
}
