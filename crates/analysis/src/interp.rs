//! Concrete execution of function bodies.
//!
//! Used to replay a counterexample: the solver model fixes the inputs,
//! running the body from them yields the returns and locals the failing
//! run ends with. Loops consume fuel and calls are depth-limited so a
//! replay always terminates.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ir::{ArithOp, Expr, Function, LValue, Module, Predicate, Statement, VarType};

/// Runtime value of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    /// Sparse array; unset cells read as `0`.
    Array(BTreeMap<i64, i64>),
}

impl Value {
    fn default_for(ty: VarType) -> Self {
        match ty {
            VarType::Int => Value::Int(0),
            VarType::IntArray => Value::Array(BTreeMap::new()),
        }
    }
}

/// Variable name to value.
pub type State = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("variable `{0}` is not defined")]
    Unbound(String),
    #[error("`{0}` has the wrong kind of value")]
    Kind(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("loop iteration limit reached")]
    OutOfFuel,
    #[error("call depth limit reached in `{0}`")]
    TooDeep(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("unknown formula `{0}`")]
    UnknownFormula(String),
    #[error("`{name}` expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("quantified predicates cannot be evaluated")]
    Quantifier,
}

pub struct Interpreter<'m> {
    module: &'m Module,
    fuel: u64,
    max_depth: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self {
            module,
            fuel: 100_000,
            max_depth: 64,
        }
    }

    /// Total loop iterations allowed per run.
    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = fuel;
        self
    }

    /// Run `func` with the given parameter values; missing parameters,
    /// returns and locals start at zero. Returns the final state.
    pub fn run(&self, func: &Function, args: &State) -> Result<State, EvalError> {
        let mut fuel = self.fuel;
        self.run_at_depth(func, args, &mut fuel, 0)
    }

    /// Evaluate `pred` in `state`.
    pub fn eval_predicate(&self, pred: &Predicate, state: &State) -> Result<bool, EvalError> {
        let mut fuel = self.fuel;
        let mut frame = Frame {
            interp: self,
            fuel: &mut fuel,
            depth: 0,
        };
        frame.holds(pred, state)
    }

    fn run_at_depth(
        &self,
        func: &Function,
        args: &State,
        fuel: &mut u64,
        depth: usize,
    ) -> Result<State, EvalError> {
        if depth > self.max_depth {
            return Err(EvalError::TooDeep(func.name.clone()));
        }
        let mut state: State = func
            .variables()
            .map(|p| {
                let value = args
                    .get(&p.name)
                    .cloned()
                    .unwrap_or_else(|| Value::default_for(p.ty));
                (p.name.clone(), value)
            })
            .collect();
        let mut frame = Frame {
            interp: self,
            fuel,
            depth,
        };
        frame.exec(&func.body, &mut state)?;
        Ok(state)
    }
}

struct Frame<'a, 'm> {
    interp: &'a Interpreter<'m>,
    fuel: &'a mut u64,
    depth: usize,
}

impl Frame<'_, '_> {
    fn exec(&mut self, stmt: &Statement, state: &mut State) -> Result<(), EvalError> {
        match stmt {
            Statement::Assign { targets, exprs } => self.assign(targets, exprs, state),
            Statement::Block { stmts } => stmts.iter().try_for_each(|s| self.exec(s, state)),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.holds(condition, state)? {
                    self.exec(then_branch, state)
                } else if let Some(e) = else_branch {
                    self.exec(e, state)
                } else {
                    Ok(())
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                while self.holds(condition, state)? {
                    if *self.fuel == 0 {
                        return Err(EvalError::OutOfFuel);
                    }
                    *self.fuel -= 1;
                    self.exec(body, state)?;
                }
                Ok(())
            }
        }
    }

    fn assign(&mut self, targets: &[LValue], exprs: &[Expr], state: &mut State) -> Result<(), EvalError> {
        let values = match (targets.len(), exprs) {
            (n, [Expr::Call { name, args }]) if n != 1 => {
                let returned = self.call(name, args, state)?;
                if n == 0 {
                    return Ok(());
                }
                returned
            }
            _ => exprs
                .iter()
                .map(|e| self.operand(e, state))
                .collect::<Result<Vec<_>, _>>()?,
        };
        if values.len() != targets.len() {
            return Err(EvalError::Arity {
                name: "assignment".into(),
                expected: targets.len(),
                found: values.len(),
            });
        }

        // Indices are evaluated against the state before any write.
        let mut writes = Vec::with_capacity(targets.len());
        for (target, value) in targets.iter().zip(values) {
            let index = match target {
                LValue::Var { .. } => None,
                LValue::ArrayElem { index, .. } => Some(self.int(index, state)?),
            };
            writes.push((target.name(), index, value));
        }
        for (name, index, value) in writes {
            match index {
                None => {
                    state.insert(name.to_string(), value);
                }
                Some(i) => {
                    let Value::Int(v) = value else {
                        return Err(EvalError::Kind(name.to_string()));
                    };
                    match state.get_mut(name) {
                        Some(Value::Array(cells)) => {
                            cells.insert(i, v);
                        }
                        Some(Value::Int(_)) => return Err(EvalError::Kind(name.to_string())),
                        None => return Err(EvalError::Unbound(name.to_string())),
                    }
                }
            }
        }
        Ok(())
    }

    /// Value of an argument or right-hand side; bare array names pass the
    /// whole array.
    fn operand(&mut self, expr: &Expr, state: &State) -> Result<Value, EvalError> {
        if let Expr::Var(name) = expr
            && let Some(v @ Value::Array(_)) = state.get(name)
        {
            return Ok(v.clone());
        }
        Ok(Value::Int(self.int(expr, state)?))
    }

    fn int(&mut self, expr: &Expr, state: &State) -> Result<i64, EvalError> {
        match expr {
            Expr::Const(n) => Ok(*n),
            Expr::Var(name) => match state.get(name) {
                Some(Value::Int(v)) => Ok(*v),
                Some(Value::Array(_)) => Err(EvalError::Kind(name.clone())),
                None => Err(EvalError::Unbound(name.clone())),
            },
            Expr::Neg(e) => self.int(e, state)?.checked_neg().ok_or(EvalError::Overflow),
            Expr::Binary { op, lhs, rhs } => {
                let a = self.int(lhs, state)?;
                let b = self.int(rhs, state)?;
                match op {
                    ArithOp::Add => a.checked_add(b).ok_or(EvalError::Overflow),
                    ArithOp::Sub => a.checked_sub(b).ok_or(EvalError::Overflow),
                    ArithOp::Mul => a.checked_mul(b).ok_or(EvalError::Overflow),
                    ArithOp::Div if b == 0 => Err(EvalError::DivisionByZero),
                    ArithOp::Div => a.checked_div(b).ok_or(EvalError::Overflow),
                }
            }
            Expr::ArrayRead { array, index } => {
                let i = self.int(index, state)?;
                match state.get(array) {
                    Some(Value::Array(cells)) => Ok(cells.get(&i).copied().unwrap_or(0)),
                    Some(Value::Int(_)) => Err(EvalError::Kind(array.clone())),
                    None => Err(EvalError::Unbound(array.clone())),
                }
            }
            Expr::Call { name, args } => {
                if name == "length"
                    && let [Expr::Var(a)] = args.as_slice()
                    && let Some(Value::Array(cells)) = state.get(a)
                {
                    return Ok(cells.keys().next_back().map_or(0, |last| last + 1));
                }
                match self.call(name, args, state)?.as_slice() {
                    [Value::Int(v)] => Ok(*v),
                    _ => Err(EvalError::Kind(name.clone())),
                }
            }
            Expr::Cond {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.holds(cond, state)? {
                    self.int(then_expr, state)
                } else {
                    self.int(else_expr, state)
                }
            }
        }
    }

    fn holds(&mut self, pred: &Predicate, state: &State) -> Result<bool, EvalError> {
        match pred {
            Predicate::Bool(b) => Ok(*b),
            Predicate::Compare { op, lhs, rhs } => {
                let a = self.int(lhs, state)?;
                let b = self.int(rhs, state)?;
                Ok(op.holds(a, b))
            }
            Predicate::Not(p) => Ok(!self.holds(p, state)?),
            Predicate::And(a, b) => Ok(self.holds(a, state)? && self.holds(b, state)?),
            Predicate::Or(a, b) => Ok(self.holds(a, state)? || self.holds(b, state)?),
            Predicate::Implies(a, b) => Ok(!self.holds(a, state)? || self.holds(b, state)?),
            Predicate::Paren(p) => self.holds(p, state),
            Predicate::Quantified { .. } => Err(EvalError::Quantifier),
            Predicate::FormulaRef { name, args } => {
                let def = self
                    .interp
                    .module
                    .formula(name)
                    .ok_or_else(|| EvalError::UnknownFormula(name.clone()))?;
                if def.params.len() != args.len() {
                    return Err(EvalError::Arity {
                        name: name.clone(),
                        expected: def.params.len(),
                        found: args.len(),
                    });
                }
                if self.depth >= self.interp.max_depth {
                    return Err(EvalError::TooDeep(name.clone()));
                }
                let mut scope = State::new();
                for (param, arg) in def.params.iter().zip(args) {
                    scope.insert(param.name.clone(), self.operand(arg, state)?);
                }
                self.depth += 1;
                let result = self.holds(&def.body, &scope);
                self.depth -= 1;
                result
            }
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], state: &State) -> Result<Vec<Value>, EvalError> {
        let callee = self
            .interp
            .module
            .function(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        if callee.params.len() != args.len() {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected: callee.params.len(),
                found: args.len(),
            });
        }
        let mut bound = State::new();
        for (param, arg) in callee.params.iter().zip(args) {
            bound.insert(param.name.clone(), self.operand(arg, state)?);
        }
        let end = self
            .interp
            .run_at_depth(callee, &bound, self.fuel, self.depth + 1)?;
        Ok(callee
            .returns
            .iter()
            .map(|r| end.get(&r.name).cloned().unwrap_or(Value::Int(0)))
            .collect())
    }
}
