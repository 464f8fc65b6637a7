//! Errors raised while building or encoding verification conditions.

use thiserror::Error;

/// Failure to produce a verification condition or its SMT encoding.
///
/// Every variant is scoped to the function being checked: the driver
/// records it in that function's result and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Malformed or unsupported AST shape.
    #[error("malformed program: {0}")]
    Structural(String),

    /// A `while` loop reached by the WP calculus carries no invariant.
    #[error("loop `while ({condition})` has no invariant")]
    MissingInvariant { condition: String },

    /// A variable that is neither declared nor bound by a quantifier.
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    /// A formula reference to an undefined formula.
    #[error("unknown formula `{0}`")]
    UnknownFormula(String),

    /// Wrong number of arguments to a function or formula.
    #[error("`{name}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A construct the SMT encoding cannot express.
    #[error("cannot encode: {0}")]
    Encoding(String),
}

impl VerifyError {
    /// Whether this error stems from the input shape rather than the
    /// encoding back end.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            VerifyError::Structural(_) | VerifyError::MissingInvariant { .. }
        )
    }
}
