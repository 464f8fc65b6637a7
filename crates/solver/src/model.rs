/// A model (counterexample) from the solver.
///
/// Holds the nullary `define-fun` entries of a `(get-model)` response.
/// Function interpretations are not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    /// Variable assignments: `(name, value_string)` pairs.
    pub assignments: Vec<(String, String)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: Vec<(String, String)>) -> Self {
        Self { assignments }
    }

    /// Look up a variable's value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an integer value, accepting both `5` and `(- 5)`.
    pub fn get_int(&self, name: &str) -> Option<i128> {
        parse_int_value(self.get(name)?)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Parse an SMT-LIB integer value as printed in models.
pub fn parse_int_value(text: &str) -> Option<i128> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("(-").and_then(|s| s.strip_suffix(')')) {
        return inner.trim().parse::<i128>().ok().map(|v| -v);
    }
    text.parse().ok()
}
