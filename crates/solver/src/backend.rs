//! Abstraction over SMT solver backends.
//!
//! The verification pipeline only talks to [`SolverBackend`]; the
//! subprocess [`CliSolver`] is the production implementation, and tests
//! plug in scripted backends.

use hoare_fv_smtlib::script::Script;

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;
use crate::result::SolverResult;
use crate::solver::CliSolver;

/// A solver that can decide satisfiability of an SMT-LIB script.
///
/// `Sync` so that one backend can be shared by parallel verification workers.
pub trait SolverBackend: Sync {
    /// Check satisfiability of the given SMT script.
    ///
    /// Returns:
    /// - `Ok(SolverResult::Sat(model))` if satisfiable (counterexample found)
    /// - `Ok(SolverResult::Unsat)` if unsatisfiable (property proved)
    /// - `Ok(SolverResult::Unknown(reason))` if the solver gave up or timed out
    /// - `Err(SolverError)` if the solver invocation failed
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError>;

    /// Short human-readable backend name for logs and reports.
    fn name(&self) -> String;
}

impl SolverBackend for CliSolver {
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        CliSolver::check_sat(self, script)
    }

    fn name(&self) -> String {
        self.config().kind.to_string()
    }
}

/// Create a subprocess backend for `kind`, auto-detecting its binary.
pub fn create_backend(kind: SolverKind, timeout_ms: u64) -> Result<Box<dyn SolverBackend>, SolverError> {
    let config = SolverConfig::auto_detect_for(kind)?.with_timeout(timeout_ms);
    tracing::debug!(path = %config.solver_path.display(), "Using {kind} subprocess backend");
    Ok(Box::new(CliSolver::new(config)))
}

/// Create the default backend (Z3).
pub fn create_default_backend(timeout_ms: u64) -> Result<Box<dyn SolverBackend>, SolverError> {
    create_backend(SolverKind::Z3, timeout_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_solver_error_names_kind() {
        // Whether or not CVC5 is installed, an error must mention it.
        if let Err(err) = create_backend(SolverKind::Cvc5, 0) {
            assert!(err.to_string().contains("CVC5"), "got: {err}");
        }
    }

    #[test]
    fn cli_backend_reports_kind_name() {
        let solver = CliSolver::new(SolverConfig::new(SolverKind::Yices, "/x".into()));
        assert_eq!(SolverBackend::name(&solver), "Yices");
    }
}
