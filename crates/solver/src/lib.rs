//! # hoare-fv-solver
//!
//! SMT solver interface for the verifier.
//!
//! Solvers run as external processes fed SMT-LIB2 text on stdin. Each
//! query is bounded by the configured timeout, enforced both through the
//! solver's own flag and a wall-clock deadline.
//!
//! ## Usage
//!
//! ```no_run
//! use hoare_fv_solver::{CliSolver, SolverResult};
//!
//! let solver = CliSolver::with_default_config().unwrap();
//! let result = solver.check_sat_raw("
//!     (declare-const x Int)
//!     (assert (> x 0))
//!     (assert (< x 10))
//!     (check-sat)
//!     (get-model)
//! ").unwrap();
//!
//! match result {
//!     SolverResult::Sat(model) => println!("SAT: {model:?}"),
//!     SolverResult::Unsat => println!("UNSAT (proved)"),
//!     SolverResult::Unknown(reason) => println!("Unknown: {reason}"),
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
mod parser;
pub mod result;
pub mod solver;

pub use backend::{SolverBackend, create_backend, create_default_backend};
pub use config::{SolverConfig, SolverKind};
pub use error::SolverError;
pub use model::Model;
pub use result::SolverResult;
pub use solver::{CliSolver, render_query};
