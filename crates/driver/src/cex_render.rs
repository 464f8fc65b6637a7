//! Counterexample rendering.
//!
//! A satisfying model of the negated VC fixes the function's inputs. The
//! body is replayed from those inputs to obtain the returns and locals of
//! the failing run; when replay is impossible (unsupported construct,
//! runaway loop, values out of range) or does not reproduce the failure,
//! the raw model values are shown instead.
//!
//! ```text
//! f(3, {0: 5}) => [r = 1]
//! i = 3
//! a[0] = 5
//! ```

use std::collections::BTreeMap;
use std::fmt;

use hoare_fv_analysis::interp::{Interpreter, State, Value};
use hoare_fv_analysis::ir::{Function, Module, Param, VarType};
use hoare_fv_analysis::vcgen::SymbolTable;
use hoare_fv_solver::Model;
use hoare_fv_solver::model::parse_int_value;

/// A rendered counterexample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    /// `f(args) => [r = v, ...]`
    pub call: String,
    /// One `name = value` line per local, `a[i] = v` per array cell.
    pub lines: Vec<String>,
    /// Whether values come from replaying the body rather than the model.
    pub replayed: bool,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.call)?;
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Render the counterexample `model` gives for `func`.
pub fn render_counterexample(
    module: &Module,
    func: &Function,
    symbols: &SymbolTable,
    model: Option<&Model>,
) -> Counterexample {
    let empty = Model::new();
    let model = model.unwrap_or(&empty);
    let inputs = model_inputs(func, symbols, model);

    let replay = inputs.as_ref().and_then(|args| replay(module, func, args));
    let source = match &replay {
        Some(end) => Values::Replay(end),
        None => Values::Model { symbols, model },
    };

    let args: Vec<String> = func
        .params
        .iter()
        .map(|p| match inputs.as_ref().and_then(|s| s.get(&p.name)) {
            Some(v) => render_value(v),
            None => source.render(p),
        })
        .collect();
    let returns: Vec<String> = func
        .returns
        .iter()
        .map(|r| format!("{} = {}", r.name, source.render(r)))
        .collect();

    let mut lines = Vec::new();
    for local in &func.locals {
        match local.ty {
            VarType::Int => lines.push(format!("{} = {}", local.name, source.render(local))),
            VarType::IntArray => {
                let cells = source.cells(&local.name);
                if cells.is_empty() {
                    lines.push(format!("{} = {{}}", local.name));
                }
                lines.extend(
                    cells
                        .into_iter()
                        .map(|(i, v)| format!("{}[{i}] = {v}", local.name)),
                );
            }
        }
    }

    Counterexample {
        call: format!("{}({}) => [{}]", func.name, args.join(", "), returns.join(", ")),
        lines,
        replayed: replay.is_some(),
    }
}

/// Parameter values from the model; absent scalars are unconstrained and
/// taken as `0`. `None` if a value does not fit an `i64`.
fn model_inputs(func: &Function, symbols: &SymbolTable, model: &Model) -> Option<State> {
    let mut state = State::new();
    for p in &func.params {
        let value = match p.ty {
            VarType::Int => {
                let raw = symbols
                    .scalar(&p.name)
                    .and_then(|s| model.get_int(s))
                    .unwrap_or(0);
                Value::Int(i64::try_from(raw).ok()?)
            }
            VarType::IntArray => {
                let mut cells = BTreeMap::new();
                for (index, symbol) in symbols.literal_cells(&p.name) {
                    if let Some(v) = model.get_int(symbol) {
                        cells.insert(i64::try_from(index).ok()?, i64::try_from(v).ok()?);
                    }
                }
                Value::Array(cells)
            }
        };
        state.insert(p.name.clone(), value);
    }
    Some(state)
}

/// Final state of running `func` from `args`, if the run reproduces the
/// postcondition violation.
fn replay(module: &Module, func: &Function, args: &State) -> Option<State> {
    let interp = Interpreter::new(module);
    let end = match interp.run(func, args) {
        Ok(end) => end,
        Err(err) => {
            tracing::debug!(function = %func.name, error = %err, "Counterexample replay failed");
            return None;
        }
    };
    match func.post.as_ref().map(|post| interp.eval_predicate(post, &end)) {
        Some(Ok(true)) => {
            tracing::debug!(
                function = %func.name,
                "Replay satisfies the postcondition; falling back to model values"
            );
            None
        }
        _ => Some(end),
    }
}

enum Values<'a> {
    Replay(&'a State),
    Model {
        symbols: &'a SymbolTable,
        model: &'a Model,
    },
}

impl Values<'_> {
    fn render(&self, var: &Param) -> String {
        match self {
            Values::Replay(state) => state
                .get(&var.name)
                .map(render_value)
                .unwrap_or_else(|| unknown(&var.name)),
            Values::Model { symbols, model } => match var.ty {
                VarType::Int => symbols
                    .scalar(&var.name)
                    .and_then(|s| model.get(s))
                    .map(normalize)
                    .unwrap_or_else(|| unknown(&var.name)),
                VarType::IntArray => render_cells(&self.cells(&var.name)),
            },
        }
    }

    fn cells(&self, array: &str) -> Vec<(String, String)> {
        match self {
            Values::Replay(state) => match state.get(array) {
                Some(Value::Array(cells)) => cells
                    .iter()
                    .map(|(i, v)| (i.to_string(), v.to_string()))
                    .collect(),
                _ => Vec::new(),
            },
            Values::Model { symbols, model } => {
                let mut cells: Vec<(i128, String)> = symbols
                    .literal_cells(array)
                    .filter_map(|(i, s)| model.get(s).map(|v| (i, normalize(v))))
                    .collect();
                cells.sort_by_key(|(i, _)| *i);
                cells.into_iter().map(|(i, v)| (i.to_string(), v)).collect()
            }
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Array(cells) => render_cells(
            &cells
                .iter()
                .map(|(i, v)| (i.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        ),
    }
}

fn render_cells(cells: &[(String, String)]) -> String {
    let body: Vec<String> = cells.iter().map(|(i, v)| format!("{i}: {v}")).collect();
    format!("{{{}}}", body.join(", "))
}

/// `(- 5)` becomes `-5`; anything that is not an integer is kept verbatim.
fn normalize(raw: &str) -> String {
    parse_int_value(raw)
        .map(|n| n.to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn unknown(name: &str) -> String {
    format!("<unknown:{name}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoare_fv_analysis::ir::{CmpOp, Expr, LValue, Predicate, Statement};
    use hoare_fv_analysis::session::ElementConst;
    use hoare_fv_smtlib::term::Term;

    fn set(name: &str, e: Expr) -> Statement {
        Statement::assign(LValue::var(name), e)
    }

    fn symbols(names: &[&str]) -> SymbolTable {
        SymbolTable {
            scalars: names
                .iter()
                .map(|n| (n.to_string(), n.to_string()))
                .collect(),
            cells: vec![],
        }
    }

    #[test]
    fn broken_constant_return_replays_to_one() {
        // f() returns (r) ensures r == 2 { r = 1; }
        let f = Function {
            name: "f".into(),
            params: vec![],
            returns: vec![Param::int("r")],
            locals: vec![],
            body: set("r", Expr::int(1)),
            pre: None,
            post: Some(Predicate::equal(Expr::var("r"), Expr::int(2))),
        };
        // The solver is free to pick any r; the replay fixes it.
        let model = Model::with_assignments(vec![("r".into(), "0".into())]);
        let cex = render_counterexample(&Module::default(), &f, &symbols(&["r"]), Some(&model));
        assert_eq!(cex.call, "f() => [r = 1]");
        assert!(cex.replayed);
    }

    #[test]
    fn renders_params_and_locals() {
        // g(n) returns (r) local i ensures r > n { i = n; r = i; }
        let g = Function {
            name: "g".into(),
            params: vec![Param::int("n")],
            returns: vec![Param::int("r")],
            locals: vec![Param::int("i")],
            body: Statement::block(vec![set("i", Expr::var("n")), set("r", Expr::var("i"))]),
            pre: None,
            post: Some(Predicate::compare(CmpOp::Gt, Expr::var("r"), Expr::var("n"))),
        };
        let model = Model::with_assignments(vec![("n".into(), "(- 4)".into())]);
        let cex = render_counterexample(
            &Module::default(),
            &g,
            &symbols(&["n", "r", "i"]),
            Some(&model),
        );
        assert_eq!(cex.to_string(), "g(-4) => [r = -4]\ni = -4");
    }

    #[test]
    fn falls_back_to_model_when_replay_fails() {
        // Division by zero stops the replay.
        let h = Function {
            name: "h".into(),
            params: vec![Param::int("d")],
            returns: vec![Param::int("q")],
            locals: vec![],
            body: set("q", Expr::div(Expr::int(1), Expr::var("d"))),
            pre: None,
            post: Some(Predicate::equal(Expr::var("q"), Expr::int(7))),
        };
        let model = Model::with_assignments(vec![("d".into(), "0".into())]);
        let cex = render_counterexample(&Module::default(), &h, &symbols(&["d", "q"]), Some(&model));
        assert!(!cex.replayed);
        assert_eq!(cex.call, "h(0) => [q = <unknown:q>]");
    }

    #[test]
    fn array_cells_come_from_model_elements() {
        let f = Function {
            name: "f".into(),
            params: vec![Param::array("a")],
            returns: vec![Param::int("r")],
            locals: vec![Param::array("b")],
            body: Statement::block(vec![
                Statement::assign(LValue::elem("b", Expr::int(1)), Expr::read("a", Expr::int(0))),
                set("r", Expr::read("b", Expr::int(1))),
            ]),
            pre: None,
            post: Some(Predicate::compare(CmpOp::Gt, Expr::var("r"), Expr::int(5))),
        };
        let table = SymbolTable {
            scalars: vec![("r".into(), "r".into())],
            cells: vec![ElementConst {
                array: "a".into(),
                index: Term::int(0),
                symbol: "a!elem!1".into(),
            }],
        };
        let model = Model::with_assignments(vec![("a!elem!1".into(), "5".into())]);
        let cex = render_counterexample(&Module::default(), &f, &table, Some(&model));
        assert_eq!(cex.to_string(), "f({0: 5}) => [r = 5]\nb[1] = 5");
    }

    #[test]
    fn missing_model_still_renders() {
        let f = Function {
            name: "f".into(),
            params: vec![Param::int("x")],
            returns: vec![Param::int("r")],
            locals: vec![],
            body: set("r", Expr::var("x")),
            pre: None,
            post: Some(Predicate::compare(CmpOp::Gt, Expr::var("r"), Expr::var("x"))),
        };
        let cex = render_counterexample(&Module::default(), &f, &symbols(&["x", "r"]), None);
        assert_eq!(cex.call, "f(0) => [r = 0]");
    }
}
