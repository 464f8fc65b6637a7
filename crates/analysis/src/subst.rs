//! Capture-avoiding substitution over predicates.
//!
//! Two flavors drive the WP calculus:
//!
//! - variable substitution `P[x ↦ e]` (scalar assignment), also available
//!   in a simultaneous multi-variable form for tuple assignment;
//! - array-read substitution `P[a[i] ↦ e]` (array-element assignment),
//!   which replaces reads of `a` whose index is *structurally* equal to `i`.
//!   `a[i+1]` and `a[1+i]` are different indices here; that syntactic
//!   under-approximation of the array-update axiom is intentional.
//!
//! When a quantifier's bound variable occurs free in the replacement, the
//! bound variable is renamed to a fresh name before descending.

use std::collections::{BTreeSet, HashMap};

use crate::ir::{Expr, Predicate};

/// `pred[name ↦ replacement]`.
pub fn substitute_variable(pred: &Predicate, name: &str, replacement: &Expr) -> Predicate {
    let mut map = HashMap::with_capacity(1);
    map.insert(name.to_string(), replacement.clone());
    substitute_variables(pred, &map)
}

/// Simultaneous substitution of every key of `map` by its expression.
pub fn substitute_variables(pred: &Predicate, map: &HashMap<String, Expr>) -> Predicate {
    if map.is_empty() {
        return pred.clone();
    }
    subst_vars_pred(pred, map)
}

/// Simultaneous substitution inside a single expression.
pub fn substitute_variables_in_expr(expr: &Expr, map: &HashMap<String, Expr>) -> Expr {
    if map.is_empty() {
        return expr.clone();
    }
    subst_vars_expr(expr, map)
}

/// `pred[array[index] ↦ replacement]`, matching indices structurally.
pub fn substitute_array_read(
    pred: &Predicate,
    array: &str,
    index: &Expr,
    replacement: &Expr,
) -> Predicate {
    let target = ReadTarget {
        array,
        index,
        replacement,
    };
    subst_read_pred(pred, &target)
}

// ---------------------------------------------------------------------------
// Free variables and fresh names
// ---------------------------------------------------------------------------

/// Names occurring free in `expr`, including array names.
pub fn free_vars_expr(expr: &Expr) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_expr(expr, &mut Vec::new(), &mut out);
    out
}

/// Names occurring free in `pred`, including array names.
pub fn free_vars(pred: &Predicate) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_pred(pred, &mut Vec::new(), &mut out);
    out
}

fn collect_expr(expr: &Expr, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Const(_) => {}
        Expr::Var(name) => {
            if !bound.contains(name) {
                out.insert(name.clone());
            }
        }
        Expr::Neg(e) => collect_expr(e, bound, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_expr(lhs, bound, out);
            collect_expr(rhs, bound, out);
        }
        Expr::ArrayRead { array, index } => {
            if !bound.contains(array) {
                out.insert(array.clone());
            }
            collect_expr(index, bound, out);
        }
        Expr::Call { args, .. } => args.iter().for_each(|a| collect_expr(a, bound, out)),
        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => {
            collect_pred(cond, bound, out);
            collect_expr(then_expr, bound, out);
            collect_expr(else_expr, bound, out);
        }
    }
}

fn collect_pred(pred: &Predicate, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
    match pred {
        Predicate::Bool(_) => {}
        Predicate::Compare { lhs, rhs, .. } => {
            collect_expr(lhs, bound, out);
            collect_expr(rhs, bound, out);
        }
        Predicate::Not(p) | Predicate::Paren(p) => collect_pred(p, bound, out),
        Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Implies(a, b) => {
            collect_pred(a, bound, out);
            collect_pred(b, bound, out);
        }
        Predicate::Quantified { var, body, .. } => {
            bound.push(var.name.clone());
            collect_pred(body, bound, out);
            bound.pop();
        }
        Predicate::FormulaRef { args, .. } => {
            args.iter().for_each(|a| collect_expr(a, bound, out));
        }
    }
}

/// First of `base_1`, `base_2`, ... not contained in `avoid`.
pub fn fresh_name(base: &str, avoid: &BTreeSet<String>) -> String {
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !avoid.contains(candidate))
        .unwrap_or_else(|| format!("{base}_"))
}

/// Rename the bound variable of a quantifier to a name outside `avoid`.
/// Returns the new name and the renamed body.
fn alpha_rename(var: &str, body: &Predicate, avoid: &BTreeSet<String>) -> (String, Predicate) {
    let mut avoid = avoid.clone();
    avoid.extend(free_vars(body));
    avoid.insert(var.to_string());
    let fresh = fresh_name(var, &avoid);
    let renamed = substitute_variable(body, var, &Expr::Var(fresh.clone()));
    (fresh, renamed)
}

// ---------------------------------------------------------------------------
// Variable substitution
// ---------------------------------------------------------------------------

fn subst_vars_expr(expr: &Expr, map: &HashMap<String, Expr>) -> Expr {
    match expr {
        Expr::Const(_) => expr.clone(),
        Expr::Var(name) => map.get(name).cloned().unwrap_or_else(|| expr.clone()),
        Expr::Neg(e) => Expr::Neg(Box::new(subst_vars_expr(e, map))),
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(subst_vars_expr(lhs, map)),
            rhs: Box::new(subst_vars_expr(rhs, map)),
        },
        Expr::ArrayRead { array, index } => Expr::ArrayRead {
            array: array.clone(),
            index: Box::new(subst_vars_expr(index, map)),
        },
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|a| subst_vars_expr(a, map)).collect(),
        },
        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => Expr::Cond {
            cond: Box::new(subst_vars_pred(cond, map)),
            then_expr: Box::new(subst_vars_expr(then_expr, map)),
            else_expr: Box::new(subst_vars_expr(else_expr, map)),
        },
    }
}

fn subst_vars_pred(pred: &Predicate, map: &HashMap<String, Expr>) -> Predicate {
    match pred {
        Predicate::Bool(_) => pred.clone(),
        Predicate::Compare { op, lhs, rhs } => Predicate::Compare {
            op: *op,
            lhs: subst_vars_expr(lhs, map),
            rhs: subst_vars_expr(rhs, map),
        },
        Predicate::Not(p) => Predicate::Not(Box::new(subst_vars_pred(p, map))),
        Predicate::Paren(p) => Predicate::Paren(Box::new(subst_vars_pred(p, map))),
        Predicate::And(a, b) => Predicate::and(subst_vars_pred(a, map), subst_vars_pred(b, map)),
        Predicate::Or(a, b) => Predicate::or(subst_vars_pred(a, map), subst_vars_pred(b, map)),
        Predicate::Implies(a, b) => {
            Predicate::implies(subst_vars_pred(a, map), subst_vars_pred(b, map))
        }
        Predicate::Quantified {
            quantifier,
            var,
            body,
        } => {
            // The binder shadows its own name.
            let inner: HashMap<String, Expr> = map
                .iter()
                .filter(|(k, _)| **k != var.name)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if inner.is_empty() {
                return pred.clone();
            }

            let replacement_vars: BTreeSet<String> =
                inner.values().flat_map(free_vars_expr).collect();
            let mut var = var.clone();
            let body = if replacement_vars.contains(&var.name) {
                let mut avoid = replacement_vars;
                avoid.extend(inner.keys().cloned());
                let (fresh, renamed) = alpha_rename(&var.name, body, &avoid);
                var.name = fresh;
                renamed
            } else {
                (**body).clone()
            };

            Predicate::Quantified {
                quantifier: *quantifier,
                var,
                body: Box::new(subst_vars_pred(&body, &inner)),
            }
        }
        Predicate::FormulaRef { name, args } => Predicate::FormulaRef {
            name: name.clone(),
            args: args.iter().map(|a| subst_vars_expr(a, map)).collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Array-read substitution
// ---------------------------------------------------------------------------

struct ReadTarget<'a> {
    array: &'a str,
    index: &'a Expr,
    replacement: &'a Expr,
}

fn subst_read_expr(expr: &Expr, t: &ReadTarget<'_>) -> Expr {
    match expr {
        Expr::Const(_) | Expr::Var(_) => expr.clone(),
        Expr::ArrayRead { array, index } => {
            // Match on the original node before rewriting its index.
            if array == t.array && **index == *t.index {
                t.replacement.clone()
            } else {
                Expr::ArrayRead {
                    array: array.clone(),
                    index: Box::new(subst_read_expr(index, t)),
                }
            }
        }
        Expr::Neg(e) => Expr::Neg(Box::new(subst_read_expr(e, t))),
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(subst_read_expr(lhs, t)),
            rhs: Box::new(subst_read_expr(rhs, t)),
        },
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(|a| subst_read_expr(a, t)).collect(),
        },
        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => Expr::Cond {
            cond: Box::new(subst_read_pred(cond, t)),
            then_expr: Box::new(subst_read_expr(then_expr, t)),
            else_expr: Box::new(subst_read_expr(else_expr, t)),
        },
    }
}

fn subst_read_pred(pred: &Predicate, t: &ReadTarget<'_>) -> Predicate {
    match pred {
        Predicate::Bool(_) => pred.clone(),
        Predicate::Compare { op, lhs, rhs } => Predicate::Compare {
            op: *op,
            lhs: subst_read_expr(lhs, t),
            rhs: subst_read_expr(rhs, t),
        },
        Predicate::Not(p) => Predicate::Not(Box::new(subst_read_pred(p, t))),
        Predicate::Paren(p) => Predicate::Paren(Box::new(subst_read_pred(p, t))),
        Predicate::And(a, b) => Predicate::and(subst_read_pred(a, t), subst_read_pred(b, t)),
        Predicate::Or(a, b) => Predicate::or(subst_read_pred(a, t), subst_read_pred(b, t)),
        Predicate::Implies(a, b) => {
            Predicate::implies(subst_read_pred(a, t), subst_read_pred(b, t))
        }
        Predicate::Quantified {
            quantifier,
            var,
            body,
        } => {
            let mut outside = free_vars_expr(t.index);
            outside.extend(free_vars_expr(t.replacement));
            let mut var = var.clone();
            let body = if outside.contains(&var.name) {
                outside.insert(t.array.to_string());
                let (fresh, renamed) = alpha_rename(&var.name, body, &outside);
                var.name = fresh;
                renamed
            } else {
                (**body).clone()
            };
            Predicate::Quantified {
                quantifier: *quantifier,
                var,
                body: Box::new(subst_read_pred(&body, t)),
            }
        }
        Predicate::FormulaRef { name, args } => Predicate::FormulaRef {
            name: name.clone(),
            args: args.iter().map(|a| subst_read_expr(a, t)).collect(),
        },
    }
}
