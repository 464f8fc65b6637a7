//! Parallel verification using Rayon.
//!
//! Functions are checked concurrently, each against its own
//! [`SolverSession`]; axioms synthesized for a callee are therefore not
//! shared between workers. Solver queries are independent subprocesses.
//! Results keep module order.

use rayon::prelude::*;

use hoare_fv_analysis::SolverSession;

use crate::error::DriverError;
use crate::pipeline::Pipeline;
use crate::types::FunctionResult;

/// Verify every function of the pipeline's module on `jobs` threads.
pub fn verify_functions_parallel(
    pipeline: &Pipeline<'_>,
    jobs: usize,
) -> Result<Vec<FunctionResult>, DriverError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| DriverError::Pool(e.to_string()))?;

    let functions = &pipeline.module().functions;
    tracing::debug!(jobs, functions = functions.len(), "Verifying in parallel");

    Ok(pool.install(|| {
        functions
            .par_iter()
            .map(|func| {
                let mut session = SolverSession::new();
                pipeline.verify_function(&mut session, func)
            })
            .collect()
    }))
}

/// Default job count: half the available cores, at least one.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(1))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoare_fv_analysis::parse_module;
    use hoare_fv_smtlib::script::Script;
    use hoare_fv_solver::{SolverBackend, SolverError, SolverResult};

    use crate::options::VerifyOptions;
    use crate::types::FunctionOutcome;

    struct AlwaysUnsat;

    impl SolverBackend for AlwaysUnsat {
        fn check_sat(&self, _script: &Script) -> Result<SolverResult, SolverError> {
            Ok(SolverResult::Unsat)
        }

        fn name(&self) -> String {
            "unsat".into()
        }
    }

    fn module_of(n: usize) -> String {
        let functions: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"name": "f{i}", "returns": [{{"name": "r"}}],
                        "postcondition": {{"kind": "eq", "left": {{"type": "var", "name": "r"}}, "right": {{"type": "const", "value": {i}}}}},
                        "body": {{"type": "assign", "targets": [{{"type": "lvar", "name": "r"}}], "exprs": [{{"type": "const", "value": {i}}}]}}}}"#
                )
            })
            .collect();
        format!(r#"{{"functions": [{}]}}"#, functions.join(","))
    }

    #[test]
    fn parallel_run_preserves_module_order() {
        let module = parse_module(&module_of(12)).unwrap();
        let options = VerifyOptions {
            jobs: 4,
            ..VerifyOptions::default()
        };
        let report = Pipeline::new(&module, &AlwaysUnsat, &options).run("m").unwrap();
        let names: Vec<&str> = report.functions.iter().map(|f| f.name.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();
        assert_eq!(names, expected);
        assert!(report
            .functions
            .iter()
            .all(|f| f.outcome == FunctionOutcome::Verified));
    }

    #[test]
    fn default_jobs_is_positive() {
        assert!(default_jobs() >= 1);
    }
}
