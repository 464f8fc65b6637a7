//! Weakest-precondition calculus.
//!
//! `wp(S, Q)` is computed by structural recursion over statements:
//!
//! | statement                 | weakest precondition                                  |
//! |---------------------------|-------------------------------------------------------|
//! | `x := e`                  | `Q[x ↦ e]`                                            |
//! | `x1, .., xn := e1, .., en`| simultaneous `Q[x1 ↦ e1, .., xn ↦ en]`                |
//! | `a[i] := e`               | `Q[a[i] ↦ e]` (structural index match)                |
//! | `f(..);`                  | `Q`                                                   |
//! | `x1, .., xn := f(..)`     | `∀t1..tn. Q[x1 ↦ t1, ..]`                             |
//! | `S1; S2`                  | `wp(S1, wp(S2, Q))`                                   |
//! | `if C then T else E`      | `(C ∧ wp(T,Q)) ∨ (¬C ∧ wp(E,Q))`                      |
//! | `while C inv I do B`      | `I ∧ ((I ∧ C) ⇒ wp(B, I)) ∧ ((I ∧ ¬C) ⇒ Q)`           |
//!
//! Each case result is simplified. A loop without an invariant is a
//! [`VerifyError::MissingInvariant`].

use std::collections::{BTreeSet, HashMap};

use crate::error::VerifyError;
use crate::ir::{Expr, LValue, Predicate, Statement};
use crate::simplify::simplify_predicate;
use crate::subst::{
    fresh_name, free_vars, free_vars_expr, substitute_array_read, substitute_variable,
    substitute_variables,
};

/// Knobs for the WP calculus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WpOptions {
    /// Universally quantify the preservation and exit obligations of every
    /// loop over the scalar variables its body assigns.
    ///
    /// Off by default: the obligations are then stated over the entry
    /// state exactly as in the table above. That open form is unsound.
    /// With `requires n > 0`, the body `i := 0; while i < n inv i >= 0 do
    /// i := i + 1` verifies against `ensures i == 1`, because the exit
    /// obligation is only checked for `i = 0`. Turn this on for real
    /// proofs.
    pub close_loop_obligations: bool,
}

/// Weakest precondition of `stmt` with respect to `post`.
pub fn wp(stmt: &Statement, post: &Predicate) -> Result<Predicate, VerifyError> {
    wp_with(stmt, post, &WpOptions::default())
}

/// [`wp`] with explicit options.
pub fn wp_with(
    stmt: &Statement,
    post: &Predicate,
    opts: &WpOptions,
) -> Result<Predicate, VerifyError> {
    let result = match stmt {
        Statement::Assign { targets, exprs } => wp_assign(targets, exprs, post)?,

        Statement::Block { stmts } => {
            return stmts
                .iter()
                .rev()
                .try_fold(post.clone(), |q, s| wp_with(s, &q, opts));
        }

        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let then_wp = wp_with(then_branch, post, opts)?;
            let else_wp = match else_branch {
                Some(e) => wp_with(e, post, opts)?,
                None => post.clone(),
            };
            Predicate::or(
                Predicate::and(condition.clone(), then_wp),
                Predicate::and(Predicate::not(condition.clone()), else_wp),
            )
        }

        Statement::While {
            condition,
            body,
            invariant,
        } => {
            let inv = invariant
                .as_ref()
                .ok_or_else(|| VerifyError::MissingInvariant {
                    condition: condition.to_string(),
                })?;
            let body_wp = wp_with(body, inv, opts)?;

            let mut preserve = Predicate::implies(
                Predicate::and(inv.clone(), condition.clone()),
                body_wp,
            );
            let mut exit = Predicate::implies(
                Predicate::and(inv.clone(), Predicate::not(condition.clone())),
                post.clone(),
            );
            if opts.close_loop_obligations {
                let modified = assigned_scalars(body);
                preserve = close_over(&modified, preserve);
                exit = close_over(&modified, exit);
            }
            Predicate::and(inv.clone(), Predicate::and(preserve, exit))
        }
    };
    Ok(simplify_predicate(&result))
}

fn wp_assign(
    targets: &[LValue],
    exprs: &[Expr],
    post: &Predicate,
) -> Result<Predicate, VerifyError> {
    // Bare call statement: results are discarded, state is unchanged.
    if targets.is_empty() {
        return Ok(post.clone());
    }

    for t in targets {
        if let LValue::ArrayElem { name, .. } = t
            && let Some(formula) = formula_taking_array(post, name)
        {
            return Err(VerifyError::Structural(format!(
                "cell of `{name}` written while `{formula}` takes the whole array; \
                 array writes only rewrite explicit reads"
            )));
        }
    }

    // Multi-return call: targets take arbitrary values.
    if targets.len() > 1 && exprs.len() == 1 && matches!(exprs[0], Expr::Call { .. }) {
        return Ok(havoc(targets, post));
    }

    if targets.len() != exprs.len() {
        return Err(VerifyError::Structural(format!(
            "assignment has {} target(s) but {} expression(s)",
            targets.len(),
            exprs.len()
        )));
    }

    match targets {
        [LValue::Var { name }] => Ok(substitute_variable(post, name, &exprs[0])),
        [LValue::ArrayElem { name, index }] => {
            Ok(substitute_array_read(post, name, index, &exprs[0]))
        }
        _ if targets.iter().all(|t| matches!(t, LValue::Var { .. })) => {
            let map: HashMap<String, Expr> = targets
                .iter()
                .zip(exprs)
                .map(|(t, e)| (t.name().to_string(), e.clone()))
                .collect();
            Ok(substitute_variables(post, &map))
        }
        _ => Ok(simultaneous_via_temporaries(targets, exprs, post)),
    }
}

/// Name of the first formula reference in `pred` that receives `array`
/// as a bare argument. Such a reference hides reads the cell substitution
/// cannot reach.
fn formula_taking_array(pred: &Predicate, array: &str) -> Option<String> {
    match pred {
        Predicate::Bool(_) => None,
        Predicate::Compare { lhs, rhs, .. } => formula_taking_array_expr(lhs, array)
            .or_else(|| formula_taking_array_expr(rhs, array)),
        Predicate::Not(p) | Predicate::Paren(p) => formula_taking_array(p, array),
        Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Implies(a, b) => {
            formula_taking_array(a, array).or_else(|| formula_taking_array(b, array))
        }
        Predicate::Quantified { var, body, .. } => {
            if var.name == array {
                None
            } else {
                formula_taking_array(body, array)
            }
        }
        Predicate::FormulaRef { name, args } => {
            if args.iter().any(|a| mentions_var(a, array)) {
                Some(name.clone())
            } else {
                args.iter().find_map(|a| formula_taking_array_expr(a, array))
            }
        }
    }
}

fn formula_taking_array_expr(expr: &Expr, array: &str) -> Option<String> {
    match expr {
        Expr::Const(_) | Expr::Var(_) => None,
        Expr::Neg(e) => formula_taking_array_expr(e, array),
        Expr::Binary { lhs, rhs, .. } => formula_taking_array_expr(lhs, array)
            .or_else(|| formula_taking_array_expr(rhs, array)),
        Expr::ArrayRead { index, .. } => formula_taking_array_expr(index, array),
        Expr::Call { args, .. } => args.iter().find_map(|a| formula_taking_array_expr(a, array)),
        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => formula_taking_array(cond, array)
            .or_else(|| formula_taking_array_expr(then_expr, array))
            .or_else(|| formula_taking_array_expr(else_expr, array)),
    }
}

fn mentions_var(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Const(_) => false,
        Expr::Var(v) => v == name,
        Expr::Neg(e) => mentions_var(e, name),
        Expr::Binary { lhs, rhs, .. } => mentions_var(lhs, name) || mentions_var(rhs, name),
        Expr::ArrayRead { index, .. } => mentions_var(index, name),
        Expr::Call { args, .. } => args.iter().any(|a| mentions_var(a, name)),
        Expr::Cond {
            then_expr,
            else_expr,
            ..
        } => mentions_var(then_expr, name) || mentions_var(else_expr, name),
    }
}

/// Simultaneous assignment with array targets: every right-hand side is
/// first bound to a fresh temporary, then array cells and finally scalars
/// are written from the temporaries.
fn simultaneous_via_temporaries(targets: &[LValue], exprs: &[Expr], post: &Predicate) -> Predicate {
    let mut avoid = free_vars(post);
    for (t, e) in targets.iter().zip(exprs) {
        avoid.insert(t.name().to_string());
        avoid.extend(free_vars_expr(e));
        if let LValue::ArrayElem { index, .. } = t {
            avoid.extend(free_vars_expr(index));
        }
    }
    let temps: Vec<String> = targets
        .iter()
        .map(|t| {
            let name = fresh_name(&format!("{}_tmp", t.name()), &avoid);
            avoid.insert(name.clone());
            name
        })
        .collect();

    // Backwards over the write sequence: scalars were written last.
    let mut q = post.clone();
    for (t, tmp) in targets.iter().zip(&temps) {
        if let LValue::Var { name } = t {
            q = substitute_variable(&q, name, &Expr::var(tmp.clone()));
        }
    }
    for (t, tmp) in targets.iter().zip(&temps) {
        if let LValue::ArrayElem { name, index } = t {
            q = substitute_array_read(&q, name, index, &Expr::var(tmp.clone()));
        }
    }
    let bind: HashMap<String, Expr> = temps.into_iter().zip(exprs.iter().cloned()).collect();
    substitute_variables(&q, &bind)
}

/// `∀t1..tn. Q[x1 ↦ t1, ..]` for targets receiving unknown values.
fn havoc(targets: &[LValue], post: &Predicate) -> Predicate {
    let mut avoid = free_vars(post);
    avoid.extend(targets.iter().map(|t| t.name().to_string()));

    let mut q = post.clone();
    let mut bound = Vec::with_capacity(targets.len());
    for t in targets {
        let fresh = fresh_name(t.name(), &avoid);
        avoid.insert(fresh.clone());
        let value = Expr::var(fresh.clone());
        q = match t {
            LValue::Var { name } => substitute_variable(&q, name, &value),
            LValue::ArrayElem { name, index } => substitute_array_read(&q, name, index, &value),
        };
        bound.push(fresh);
    }
    bound
        .into_iter()
        .rev()
        .fold(q, |body, name| Predicate::forall(name, body))
}

/// Scalar variables assigned anywhere in `stmt`, in name order.
pub fn assigned_scalars(stmt: &Statement) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_assigned(stmt, &mut out);
    out
}

fn collect_assigned(stmt: &Statement, out: &mut BTreeSet<String>) {
    match stmt {
        Statement::Assign { targets, .. } => {
            for t in targets {
                if let LValue::Var { name } = t {
                    out.insert(name.clone());
                }
            }
        }
        Statement::Block { stmts } => stmts.iter().for_each(|s| collect_assigned(s, out)),
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_assigned(then_branch, out);
            if let Some(e) = else_branch {
                collect_assigned(e, out);
            }
        }
        Statement::While { body, .. } => collect_assigned(body, out),
    }
}

fn close_over(vars: &BTreeSet<String>, body: Predicate) -> Predicate {
    vars.iter()
        .rev()
        .fold(body, |acc, v| Predicate::forall(v.clone(), acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::CmpOp;

    fn v(n: &str) -> Expr {
        Expr::var(n)
    }

    fn set(name: &str, e: Expr) -> Statement {
        Statement::assign(LValue::var(name), e)
    }

    #[test]
    fn assignment_substitutes() {
        // wp(x := x + 1, x > 0) = x + 1 > 0
        let q = Predicate::compare(CmpOp::Gt, v("x"), Expr::int(0));
        let r = wp(&set("x", Expr::add(v("x"), Expr::int(1))), &q).unwrap();
        assert_eq!(
            r,
            Predicate::compare(CmpOp::Gt, Expr::add(v("x"), Expr::int(1)), Expr::int(0))
        );
    }

    #[test]
    fn tuple_assignment_is_simultaneous() {
        // wp(x, y := y, x, x < y) = y < x
        let stmt = Statement::Assign {
            targets: vec![LValue::var("x"), LValue::var("y")],
            exprs: vec![v("y"), v("x")],
        };
        let q = Predicate::compare(CmpOp::Lt, v("x"), v("y"));
        assert_eq!(
            wp(&stmt, &q).unwrap(),
            Predicate::compare(CmpOp::Lt, v("y"), v("x"))
        );
    }

    #[test]
    fn mixed_tuple_assignment_reads_old_values() {
        // wp(a[0], x := x, 7, a[0] == 3 and x == 7) = x == 3
        let stmt = Statement::Assign {
            targets: vec![LValue::elem("a", Expr::int(0)), LValue::var("x")],
            exprs: vec![v("x"), Expr::int(7)],
        };
        let q = Predicate::and(
            Predicate::equal(Expr::read("a", Expr::int(0)), Expr::int(3)),
            Predicate::equal(v("x"), Expr::int(7)),
        );
        assert_eq!(
            wp(&stmt, &q).unwrap(),
            Predicate::equal(v("x"), Expr::int(3))
        );
    }

    #[test]
    fn bare_call_keeps_post() {
        let stmt = Statement::Assign {
            targets: vec![],
            exprs: vec![Expr::call("log", vec![v("x")])],
        };
        let q = Predicate::equal(v("x"), Expr::int(1));
        assert_eq!(wp(&stmt, &q).unwrap(), q);
    }

    #[test]
    fn multi_return_call_havocs_targets() {
        let stmt = Statement::Assign {
            targets: vec![LValue::var("q"), LValue::var("r")],
            exprs: vec![Expr::call("divmod", vec![v("a"), v("b")])],
        };
        let post = Predicate::compare(CmpOp::Ge, v("r"), v("q"));
        let Predicate::Quantified { var: q1, body, .. } = wp(&stmt, &post).unwrap() else {
            panic!("expected quantifier");
        };
        let Predicate::Quantified { var: r1, body, .. } = *body else {
            panic!("expected nested quantifier");
        };
        assert_eq!(
            *body,
            Predicate::compare(CmpOp::Ge, v(&r1.name), v(&q1.name))
        );
    }

    #[test]
    fn array_assignment_resolves_read() {
        // wp(a[0] := 5; v := a[0], v == 5) = true
        let body = Statement::block(vec![
            Statement::assign(LValue::elem("a", Expr::int(0)), Expr::int(5)),
            set("v", Expr::read("a", Expr::int(0))),
        ]);
        let q = Predicate::equal(v("v"), Expr::int(5));
        assert_eq!(wp(&body, &q).unwrap(), Predicate::TRUE);
    }

    #[test]
    fn cell_write_under_formula_taking_array_is_rejected() {
        // wp(a[0] := 3, five(a)) must not come back as five(a)
        let stmt = Statement::assign(LValue::elem("a", Expr::int(0)), Expr::int(3));
        let q = Predicate::FormulaRef {
            name: "five".into(),
            args: vec![v("a")],
        };
        let err = wp(&stmt, &q).unwrap_err();
        assert!(
            matches!(&err, VerifyError::Structural(msg) if msg.contains("five")),
            "got {err:?}"
        );
    }

    #[test]
    fn cell_write_under_formula_on_other_values_is_kept() {
        // five(a[1]) reads an explicit cell; five(b) does not mention a
        let stmt = Statement::assign(LValue::elem("a", Expr::int(0)), Expr::int(3));
        let five = |arg| Predicate::FormulaRef {
            name: "five".into(),
            args: vec![arg],
        };
        let q = Predicate::and(five(Expr::read("a", Expr::int(1))), five(v("b")));
        assert_eq!(wp(&stmt, &q).unwrap(), simplify_predicate(&q));
    }

    #[test]
    fn conditional_is_disjunctive() {
        let c = Predicate::compare(CmpOp::Gt, v("x"), Expr::int(0));
        let stmt = Statement::if_then(c.clone(), set("r", v("x")), Some(set("r", Expr::neg(v("x")))));
        let q = Predicate::compare(CmpOp::Ge, v("r"), Expr::int(0));
        let expected = Predicate::or(
            Predicate::and(c.clone(), Predicate::compare(CmpOp::Ge, v("x"), Expr::int(0))),
            Predicate::and(
                Predicate::not(c),
                Predicate::compare(CmpOp::Ge, Expr::neg(v("x")), Expr::int(0)),
            ),
        );
        assert_eq!(wp(&stmt, &q).unwrap(), expected);
    }

    #[test]
    fn missing_else_is_skip() {
        let c = Predicate::compare(CmpOp::Lt, v("x"), Expr::int(0));
        let stmt = Statement::if_then(c.clone(), set("x", Expr::int(0)), None);
        let q = Predicate::compare(CmpOp::Ge, v("x"), Expr::int(0));
        let expected = Predicate::or(
            Predicate::and(c.clone(), Predicate::TRUE),
            Predicate::and(Predicate::not(c), q.clone()),
        );
        assert_eq!(wp(&stmt, &q).unwrap(), simplify_predicate(&expected));
    }

    #[test]
    fn loop_without_invariant_fails() {
        let stmt = Statement::while_loop(
            Predicate::compare(CmpOp::Lt, v("i"), v("n")),
            None,
            set("i", Expr::add(v("i"), Expr::int(1))),
        );
        let err = wp(&stmt, &Predicate::TRUE).unwrap_err();
        assert_eq!(
            err,
            VerifyError::MissingInvariant {
                condition: "i < n".into()
            }
        );
    }

    #[test]
    fn loop_first_conjunct_is_invariant() {
        let inv = Predicate::compare(CmpOp::Le, v("i"), v("n"));
        let stmt = Statement::while_loop(
            Predicate::compare(CmpOp::Lt, v("i"), v("n")),
            Some(inv.clone()),
            set("i", Expr::add(v("i"), Expr::int(1))),
        );
        let q = Predicate::equal(v("i"), v("n"));
        let Predicate::And(first, _) = wp(&stmt, &q).unwrap() else {
            panic!("expected conjunction");
        };
        assert_eq!(*first, inv);
    }

    #[test]
    fn closed_loop_obligations_quantify_modified_scalars() {
        let inv = Predicate::compare(CmpOp::Le, v("i"), v("n"));
        let stmt = Statement::while_loop(
            Predicate::compare(CmpOp::Lt, v("i"), v("n")),
            Some(inv.clone()),
            set("i", Expr::add(v("i"), Expr::int(1))),
        );
        let q = Predicate::equal(v("i"), v("n"));
        let opts = WpOptions {
            close_loop_obligations: true,
        };
        let r = wp_with(&stmt, &q, &opts).unwrap();
        let Predicate::And(first, rest) = r else {
            panic!("expected conjunction");
        };
        assert_eq!(*first, inv);
        let Predicate::And(preserve, exit) = *rest else {
            panic!("expected conjunction");
        };
        for obligation in [*preserve, *exit] {
            assert!(
                matches!(&obligation, Predicate::Quantified { var, .. } if var.name == "i"),
                "{obligation}"
            );
        }
    }

    #[test]
    fn assigned_scalars_skips_array_cells() {
        let body = Statement::block(vec![
            set("s", Expr::int(0)),
            Statement::assign(LValue::elem("a", v("i")), Expr::int(1)),
            Statement::if_then(Predicate::TRUE, set("i", Expr::int(1)), None),
        ]);
        let names: Vec<_> = assigned_scalars(&body).into_iter().collect();
        assert_eq!(names, ["i", "s"]);
    }

    #[test]
    fn count_mismatch_is_structural() {
        let stmt = Statement::Assign {
            targets: vec![LValue::var("x"), LValue::var("y")],
            exprs: vec![Expr::int(1)],
        };
        assert!(matches!(
            wp(&stmt, &Predicate::TRUE),
            Err(VerifyError::Structural(_))
        ));
    }
}
