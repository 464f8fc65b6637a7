//! Local algebraic simplification of predicates and expressions.
//!
//! A single bottom-up pass that performs:
//!
//! - Constant folding of literal arithmetic and comparisons
//! - Identity elimination (`x + 0`, `x - 0`, `x * 1`, `x / 1`, `--x`)
//! - Unit/absorbing elements of `and`, `or` and implication
//! - Double negation elimination and parenthesis removal
//! - Reflexive comparisons via structural equality (`x == x` is true)
//! - Conditional expressions with literal conditions or equal branches
//!
//! Quantified formulas and formula references are left untouched. Every
//! rule produces either a literal, an already-simplified child, or a node
//! no rule matches, so the pass is idempotent.

use crate::ir::{ArithOp, CmpOp, Expr, Predicate};

/// Simplify a predicate recursively.
pub fn simplify_predicate(pred: &Predicate) -> Predicate {
    match pred {
        Predicate::Bool(_) => pred.clone(),

        Predicate::Compare { op, lhs, rhs } => {
            let lhs = simplify_expr(lhs);
            let rhs = simplify_expr(rhs);
            if let (Expr::Const(a), Expr::Const(b)) = (&lhs, &rhs) {
                return Predicate::Bool(op.holds(*a, *b));
            }
            if lhs == rhs {
                return Predicate::Bool(matches!(op, CmpOp::Eq | CmpOp::Le | CmpOp::Ge));
            }
            Predicate::Compare { op: *op, lhs, rhs }
        }

        Predicate::Not(inner) => negate(simplify_predicate(inner)),

        Predicate::And(a, b) => {
            match (simplify_predicate(a), simplify_predicate(b)) {
                (Predicate::Bool(false), _) | (_, Predicate::Bool(false)) => Predicate::FALSE,
                (Predicate::Bool(true), p) | (p, Predicate::Bool(true)) => p,
                (a, b) => Predicate::and(a, b),
            }
        }

        Predicate::Or(a, b) => {
            match (simplify_predicate(a), simplify_predicate(b)) {
                (Predicate::Bool(true), _) | (_, Predicate::Bool(true)) => Predicate::TRUE,
                (Predicate::Bool(false), p) | (p, Predicate::Bool(false)) => p,
                (a, b) => Predicate::or(a, b),
            }
        }

        Predicate::Implies(a, b) => {
            match (simplify_predicate(a), simplify_predicate(b)) {
                (Predicate::Bool(true), q) => q,
                (Predicate::Bool(false), _) | (_, Predicate::Bool(true)) => Predicate::TRUE,
                (p, Predicate::Bool(false)) => negate(p),
                (p, q) => Predicate::implies(p, q),
            }
        }

        Predicate::Paren(inner) => simplify_predicate(inner),

        Predicate::Quantified { .. } | Predicate::FormulaRef { .. } => pred.clone(),
    }
}

/// Negate an already-simplified predicate, folding literals and double
/// negation.
fn negate(p: Predicate) -> Predicate {
    match p {
        Predicate::Bool(b) => Predicate::Bool(!b),
        Predicate::Not(inner) => *inner,
        other => Predicate::Not(Box::new(other)),
    }
}

/// Simplify an expression recursively.
pub fn simplify_expr(expr: &Expr) -> Expr {
    match expr {
        Expr::Const(_) | Expr::Var(_) => expr.clone(),

        Expr::Neg(inner) => match simplify_expr(inner) {
            Expr::Const(n) => n
                .checked_neg()
                .map(Expr::Const)
                .unwrap_or_else(|| Expr::neg(Expr::Const(n))),
            Expr::Neg(e) => *e,
            e => Expr::neg(e),
        },

        Expr::Binary { op, lhs, rhs } => {
            let lhs = simplify_expr(lhs);
            let rhs = simplify_expr(rhs);
            if let (Expr::Const(a), Expr::Const(b)) = (&lhs, &rhs)
                && let Some(v) = fold(*op, *a, *b)
            {
                return Expr::Const(v);
            }
            match (op, lhs, rhs) {
                (ArithOp::Add, e, Expr::Const(0)) | (ArithOp::Add, Expr::Const(0), e) => e,
                (ArithOp::Sub, e, Expr::Const(0)) => e,
                (ArithOp::Mul, e, Expr::Const(1)) | (ArithOp::Mul, Expr::Const(1), e) => e,
                (ArithOp::Div, e, Expr::Const(1)) => e,
                (op, lhs, rhs) => Expr::binary(*op, lhs, rhs),
            }
        }

        Expr::ArrayRead { array, index } => Expr::read(array.clone(), simplify_expr(index)),

        Expr::Call { name, args } => {
            Expr::call(name.clone(), args.iter().map(simplify_expr).collect())
        }

        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => match simplify_predicate(cond) {
            Predicate::Bool(true) => simplify_expr(then_expr),
            Predicate::Bool(false) => simplify_expr(else_expr),
            cond => {
                let then_expr = simplify_expr(then_expr);
                let else_expr = simplify_expr(else_expr);
                if then_expr == else_expr {
                    then_expr
                } else {
                    Expr::cond(cond, then_expr, else_expr)
                }
            }
        },
    }
}

/// Fold literal arithmetic. `None` on overflow or division by zero, which
/// leaves the node in place.
fn fold(op: ArithOp, a: i64, b: i64) -> Option<i64> {
    match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        // i64 division truncates toward zero
        ArithOp::Div => a.checked_div(b),
    }
}
