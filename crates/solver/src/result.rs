use crate::model::Model;

/// Result from the SMT solver.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult {
    /// Satisfiable: the negated verification condition has a model,
    /// which is a counterexample.
    Sat(Option<Model>),
    /// Unsatisfiable: the verification condition is valid.
    Unsat,
    /// Solver couldn't determine (timeout, incomplete quantifier reasoning, ...).
    Unknown(String),
}

impl SolverResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverResult::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, SolverResult::Unsat)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SolverResult::Unknown(_))
    }

    /// Returns the model if the result is `Sat` with a model.
    pub fn model(&self) -> Option<&Model> {
        match self {
            SolverResult::Sat(Some(model)) => Some(model),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_are_exclusive() {
        let sat = SolverResult::Sat(None);
        assert!(sat.is_sat() && !sat.is_unsat() && !sat.is_unknown());
        assert!(SolverResult::Unsat.is_unsat());
        assert!(SolverResult::Unknown("timeout".into()).is_unknown());
    }

    #[test]
    fn model_only_for_sat_with_model() {
        let m = Model::with_assignments(vec![("x".into(), "1".into())]);
        assert_eq!(SolverResult::Sat(Some(m.clone())).model(), Some(&m));
        assert_eq!(SolverResult::Sat(None).model(), None);
        assert_eq!(SolverResult::Unsat.model(), None);
    }
}
