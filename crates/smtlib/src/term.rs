use crate::sort::Sort;

/// SMT-LIB term (expression) over the Int/Bool fragment with
/// uninterpreted functions and quantifiers.
///
/// `Eq` and `Hash` are derived so encoded terms can key memo tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    // === Literals ===
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal (unbounded)
    IntLit(i128),

    // === Variables ===
    /// Named constant/variable reference
    Const(String),

    // === Boolean operations ===
    /// Logical NOT
    Not(Box<Term>),
    /// Logical AND (n-ary)
    And(Vec<Term>),
    /// Logical OR (n-ary)
    Or(Vec<Term>),
    /// Logical implication: `(=> a b)`
    Implies(Box<Term>, Box<Term>),

    // === Core ===
    /// Equality: `(= a b)`
    Eq(Box<Term>, Box<Term>),
    /// If-then-else: `(ite cond then else)`
    Ite(Box<Term>, Box<Term>, Box<Term>),

    // === Integer arithmetic ===
    /// `(+ a b)`
    IntAdd(Box<Term>, Box<Term>),
    /// `(- a b)`
    IntSub(Box<Term>, Box<Term>),
    /// `(* a b)`
    IntMul(Box<Term>, Box<Term>),
    /// `(div a b)`, Euclidean division as defined by SMT-LIB
    IntDiv(Box<Term>, Box<Term>),
    /// `(- a)`
    IntNeg(Box<Term>),
    /// `(< a b)`
    IntLt(Box<Term>, Box<Term>),
    /// `(<= a b)`
    IntLe(Box<Term>, Box<Term>),
    /// `(> a b)`
    IntGt(Box<Term>, Box<Term>),
    /// `(>= a b)`
    IntGe(Box<Term>, Box<Term>),

    // === Quantifiers ===
    /// `(forall ((x Sort) ...) body)`
    Forall(Vec<(String, Sort)>, Box<Term>),
    /// `(exists ((x Sort) ...) body)`
    Exists(Vec<(String, Sort)>, Box<Term>),

    // === Function application ===
    /// `(f arg1 arg2 ...)`
    App(String, Vec<Term>),
}

impl Term {
    /// Reference to a named constant.
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// Integer literal from any integer that widens losslessly.
    pub fn int(value: impl Into<i128>) -> Self {
        Term::IntLit(value.into())
    }

    pub fn not(t: Term) -> Self {
        Term::Not(Box::new(t))
    }

    pub fn implies(lhs: Term, rhs: Term) -> Self {
        Term::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn equals(lhs: Term, rhs: Term) -> Self {
        Term::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn ite(cond: Term, then_term: Term, else_term: Term) -> Self {
        Term::Ite(Box::new(cond), Box::new(then_term), Box::new(else_term))
    }

    /// Whether any `Const` in this term is one of `names`.
    ///
    /// Quantifier binders are not tracked; callers pass names that are
    /// globally fresh.
    pub fn mentions_any(&self, names: &[String]) -> bool {
        match self {
            Term::BoolLit(_) | Term::IntLit(_) => false,
            Term::Const(n) => names.contains(n),
            Term::Not(a) | Term::IntNeg(a) => a.mentions_any(names),
            Term::And(ts) | Term::Or(ts) | Term::App(_, ts) => {
                ts.iter().any(|t| t.mentions_any(names))
            }
            Term::Implies(a, b)
            | Term::Eq(a, b)
            | Term::IntAdd(a, b)
            | Term::IntSub(a, b)
            | Term::IntMul(a, b)
            | Term::IntDiv(a, b)
            | Term::IntLt(a, b)
            | Term::IntLe(a, b)
            | Term::IntGt(a, b)
            | Term::IntGe(a, b) => a.mentions_any(names) || b.mentions_any(names),
            Term::Ite(c, t, e) => {
                c.mentions_any(names) || t.mentions_any(names) || e.mentions_any(names)
            }
            Term::Forall(_, body) | Term::Exists(_, body) => body.mentions_any(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_any_finds_nested_const() {
        let t = Term::IntAdd(
            Box::new(Term::constant("x")),
            Box::new(Term::App("f".into(), vec![Term::constant("q!0")])),
        );
        assert!(t.mentions_any(&["q!0".to_string()]));
        assert!(!t.mentions_any(&["y".to_string()]));
    }

    #[test]
    fn literals_mention_nothing() {
        assert!(!Term::int(3).mentions_any(&["x".to_string()]));
        assert!(!Term::BoolLit(true).mentions_any(&["x".to_string()]));
    }

    #[test]
    fn terms_usable_as_hash_keys() {
        use std::collections::HashMap;
        let mut m = HashMap::new();
        m.insert(("a".to_string(), Term::int(1)), 7);
        assert_eq!(m.get(&("a".to_string(), Term::int(1))), Some(&7));
        assert_eq!(m.get(&("a".to_string(), Term::int(2))), None);
    }
}
