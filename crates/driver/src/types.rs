//! Verification result types shared by the pipeline and the renderers.

use std::fmt;

use crate::cex_render::Counterexample;

/// Where a function check stands.
///
/// `Pending → Built → Encoded → Discharged`; a failure in any state ends
/// the check with [`FunctionOutcome::Error`] recording that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Nothing computed yet.
    Pending,
    /// Verification condition built.
    Built,
    /// SMT script assembled.
    Encoded,
    /// Solver answered.
    Discharged,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckState::Pending => "pending",
            CheckState::Built => "built",
            CheckState::Encoded => "encoded",
            CheckState::Discharged => "discharged",
        };
        f.write_str(s)
    }
}

/// How the check of one function ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionOutcome {
    /// The negated VC is unsatisfiable.
    Verified,
    /// The solver found a model of the negated VC.
    Failed { counterexample: Counterexample },
    /// The solver gave up or timed out.
    Inconclusive { reason: String },
    /// The check stopped before the solver could answer.
    Error { stage: CheckState, message: String },
    /// No postcondition, nothing to prove.
    Skipped,
}

/// Result of checking a single function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub name: String,
    /// Verified, or vacuously accepted for lack of a postcondition.
    pub verified: bool,
    pub outcome: FunctionOutcome,
    pub duration_ms: u64,
}

impl FunctionResult {
    pub fn new(name: impl Into<String>, outcome: FunctionOutcome, duration_ms: u64) -> Self {
        let verified = matches!(outcome, FunctionOutcome::Verified | FunctionOutcome::Skipped);
        Self {
            name: name.into(),
            verified,
            outcome,
            duration_ms,
        }
    }
}

/// Outcome counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub verified: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.verified + self.failed + self.inconclusive + self.errors + self.skipped
    }
}

/// Results for every function of a module, in module order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub module: String,
    pub functions: Vec<FunctionResult>,
}

impl RunReport {
    /// True when no function failed, was inconclusive, or hit an error.
    pub fn all_verified(&self) -> bool {
        self.functions.iter().all(|f| f.verified)
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for f in &self.functions {
            match f.outcome {
                FunctionOutcome::Verified => tally.verified += 1,
                FunctionOutcome::Failed { .. } => tally.failed += 1,
                FunctionOutcome::Inconclusive { .. } => tally.inconclusive += 1,
                FunctionOutcome::Error { .. } => tally.errors += 1,
                FunctionOutcome::Skipped => tally.skipped += 1,
            }
        }
        tally
    }

    pub fn total_ms(&self) -> u64 {
        self.functions.iter().map(|f| f.duration_ms).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<FunctionOutcome>) -> RunReport {
        RunReport {
            module: "m".into(),
            functions: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, o)| FunctionResult::new(format!("f{i}"), o, 1))
                .collect(),
        }
    }

    #[test]
    fn skipped_functions_do_not_fail_the_run() {
        let r = report(vec![FunctionOutcome::Verified, FunctionOutcome::Skipped]);
        assert!(r.all_verified());
        assert_eq!(r.tally().skipped, 1);
        assert_eq!(r.total_ms(), 2);
    }

    #[test]
    fn any_non_verified_outcome_fails_the_run() {
        for bad in [
            FunctionOutcome::Inconclusive {
                reason: "timeout".into(),
            },
            FunctionOutcome::Error {
                stage: CheckState::Pending,
                message: "loop has no invariant".into(),
            },
        ] {
            let r = report(vec![FunctionOutcome::Verified, bad]);
            assert!(!r.all_verified());
        }
    }

    #[test]
    fn tally_counts_each_outcome() {
        let r = report(vec![
            FunctionOutcome::Verified,
            FunctionOutcome::Verified,
            FunctionOutcome::Skipped,
            FunctionOutcome::Inconclusive {
                reason: "unknown".into(),
            },
        ]);
        let t = r.tally();
        assert_eq!(t.verified, 2);
        assert_eq!(t.inconclusive, 1);
        assert_eq!(t.total(), 4);
    }

    #[test]
    fn check_state_display() {
        assert_eq!(CheckState::Encoded.to_string(), "encoded");
    }
}
