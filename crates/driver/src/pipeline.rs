//! Per-function verification.
//!
//! Each function moves through `Pending → Built → Encoded → Discharged`:
//! the VC `Pre ⇒ WP(body, Post)` is built, encoded against a
//! [`SolverSession`], and its negation handed to the solver backend. A
//! failure at any step ends that function's check with an error outcome;
//! the other functions are still checked.

use std::fs;
use std::path::Path;
use std::time::Instant;

use hoare_fv_analysis::ir::{Function, Module, Predicate};
use hoare_fv_analysis::{EncodedVc, SolverSession, build_vc_with, encode_vc};
use hoare_fv_solver::{SolverBackend, SolverResult, render_query};

use crate::cex_render::render_counterexample;
use crate::error::DriverError;
use crate::options::VerifyOptions;
use crate::parallel::verify_functions_parallel;
use crate::types::{CheckState, FunctionOutcome, FunctionResult, RunReport};

/// Where one function's check stands, with the data of that state.
enum Check {
    Pending,
    Built(Predicate),
    Encoded(EncodedVc),
    Discharged(FunctionOutcome),
}

impl Check {
    fn state(&self) -> CheckState {
        match self {
            Check::Pending => CheckState::Pending,
            Check::Built(_) => CheckState::Built,
            Check::Encoded(_) => CheckState::Encoded,
            Check::Discharged(_) => CheckState::Discharged,
        }
    }
}

/// Verifies the functions of one module against one solver backend.
pub struct Pipeline<'a> {
    module: &'a Module,
    backend: &'a dyn SolverBackend,
    options: &'a VerifyOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(module: &'a Module, backend: &'a dyn SolverBackend, options: &'a VerifyOptions) -> Self {
        Self {
            module,
            backend,
            options,
        }
    }

    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// Check every function of the module, in module order.
    ///
    /// With one job all functions share a session, so axioms synthesized
    /// for a callee are reused by every later caller. With more jobs each
    /// function gets its own session.
    pub fn run(&self, module_name: &str) -> Result<RunReport, DriverError> {
        tracing::info!(
            module = module_name,
            functions = self.module.functions.len(),
            backend = %self.backend.name(),
            "Starting verification run"
        );
        let functions = if self.options.jobs > 1 {
            verify_functions_parallel(self, self.options.jobs)?
        } else {
            let mut session = SolverSession::new();
            self.module
                .functions
                .iter()
                .map(|func| self.verify_function(&mut session, func))
                .collect()
        };
        Ok(RunReport {
            module: module_name.to_string(),
            functions,
        })
    }

    /// Drive one function's check to completion.
    pub fn verify_function(&self, session: &mut SolverSession, func: &Function) -> FunctionResult {
        let start = Instant::now();
        tracing::info!(function = %func.name, "Verifying function");

        let mut check = Check::Pending;
        let outcome = loop {
            check = match check {
                Check::Discharged(outcome) => break outcome,
                current => {
                    let stage = current.state();
                    match self.advance(current, session, func) {
                        Ok(next) => next,
                        Err(message) => break FunctionOutcome::Error { stage, message },
                    }
                }
            };
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            FunctionOutcome::Error { stage, message } => {
                tracing::info!(function = %func.name, %stage, "Check stopped: {message}");
            }
            other => {
                tracing::info!(function = %func.name, duration_ms, outcome = outcome_label(other), "Check finished");
            }
        }
        FunctionResult::new(func.name.clone(), outcome, duration_ms)
    }

    fn advance(&self, check: Check, session: &mut SolverSession, func: &Function) -> Result<Check, String> {
        match check {
            Check::Pending => {
                let vc = build_vc_with(func, &self.options.wp).map_err(|e| e.to_string())?;
                Ok(match vc {
                    Some(vc) => Check::Built(vc),
                    None => Check::Discharged(FunctionOutcome::Skipped),
                })
            }
            Check::Built(vc) => {
                let encoded = encode_vc(session, self.module, func, &vc).map_err(|e| e.to_string())?;
                if let Some(dir) = &self.options.dump_smt {
                    dump_script(dir, &encoded);
                }
                Ok(Check::Encoded(encoded))
            }
            Check::Encoded(encoded) => {
                let start = Instant::now();
                let result = self
                    .backend
                    .check_sat(&encoded.script)
                    .map_err(|e| e.to_string())?;
                tracing::debug!(
                    function = %func.name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Solver answered"
                );
                Ok(Check::Discharged(self.interpret(func, &encoded, result)))
            }
            discharged @ Check::Discharged(_) => Ok(discharged),
        }
    }

    fn interpret(&self, func: &Function, encoded: &EncodedVc, result: SolverResult) -> FunctionOutcome {
        match result {
            SolverResult::Unsat => FunctionOutcome::Verified,
            SolverResult::Sat(model) => FunctionOutcome::Failed {
                counterexample: render_counterexample(self.module, func, &encoded.symbols, model.as_ref()),
            },
            SolverResult::Unknown(reason) => FunctionOutcome::Inconclusive { reason },
        }
    }
}

/// Short lowercase name of an outcome, for logs and JSON.
pub fn outcome_label(outcome: &FunctionOutcome) -> &'static str {
    match outcome {
        FunctionOutcome::Verified => "verified",
        FunctionOutcome::Failed { .. } => "failed",
        FunctionOutcome::Inconclusive { .. } => "inconclusive",
        FunctionOutcome::Error { .. } => "error",
        FunctionOutcome::Skipped => "skipped",
    }
}

fn dump_script(dir: &Path, encoded: &EncodedVc) {
    let path = dir.join(format!("{}.smt2", encoded.function));
    let written = fs::create_dir_all(dir).and_then(|()| fs::write(&path, render_query(&encoded.script)));
    match written {
        Ok(()) => tracing::debug!(path = %path.display(), "Wrote SMT query"),
        Err(err) => tracing::warn!(path = %path.display(), "Cannot write SMT query: {err}"),
    }
}
