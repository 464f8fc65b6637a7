/// Encode predicates and expressions as SMT-LIB terms.
///
/// Everything is over the integer sort. Program variables become
/// constants, array cells become memoized constants (or applications of a
/// per-array selector when the index mentions a quantifier-bound symbol),
/// calls become uninterpreted functions whose contracts are axiomatized
/// on first use (see `axioms`).
use hoare_fv_smtlib::sort::Sort;
use hoare_fv_smtlib::term::Term;

use crate::error::VerifyError;
use crate::ir::{ArithOp, CmpOp, Expr, Function, Module, Predicate, Quantifier, VarType};
use crate::session::SolverSession;

/// Words that cannot be used as plain SMT-LIB constant names.
const RESERVED: &[&str] = &[
    "_", "!", "as", "let", "exists", "forall", "match", "par", "and", "or", "not", "xor",
    "ite", "true", "false", "distinct", "div", "mod", "abs", "select", "store", "assert",
    "Int", "Bool", "Array",
];

/// SMT constant for a program variable.
pub fn var_symbol(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}!v")
    } else {
        name.to_string()
    }
}

/// Uninterpreted function standing for a call to `name`.
pub fn fn_symbol(name: &str) -> String {
    format!("fn.{name}")
}

/// What a source-level name refers to during encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(Term),
    /// An array, identified by the name its cells are memoized under.
    Array(String),
}

/// Scoped name bindings plus the quantifier-bound symbols in scope.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Vec<(String, Binding)>,
    bound: Vec<String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings for every parameter, return and local of `func`.
    pub fn for_function(func: &Function) -> Self {
        let mut env = Env::new();
        for p in func.variables() {
            match p.ty {
                VarType::Int => env.bind_scalar(&p.name, Term::constant(var_symbol(&p.name))),
                VarType::IntArray => env.bind_array(&p.name, &p.name),
            }
        }
        env
    }

    pub fn bind_scalar(&mut self, name: &str, term: Term) {
        self.bindings.push((name.to_string(), Binding::Scalar(term)));
    }

    pub fn bind_array(&mut self, name: &str, array: &str) {
        self.bindings
            .push((name.to_string(), Binding::Array(array.to_string())));
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    /// Quantifier-bound SMT symbols currently in scope.
    pub fn bound(&self) -> &[String] {
        &self.bound
    }

    /// An empty scope that still knows which symbols are bound.
    pub fn closed(&self) -> Env {
        Env {
            bindings: Vec::new(),
            bound: self.bound.clone(),
        }
    }

    pub(crate) fn push_bound(&mut self, symbol: &str) {
        self.bound.push(symbol.to_string());
    }

    fn with_bound(&self, name: &str, symbol: &str) -> Env {
        let mut inner = self.clone();
        inner.bind_scalar(name, Term::constant(symbol));
        inner.push_bound(symbol);
        inner
    }
}

/// Translates the predicate model into SMT terms, recording declarations
/// and axioms in the session.
pub struct Encoder<'a> {
    pub(crate) module: &'a Module,
    pub(crate) session: &'a mut SolverSession,
    expanding: Vec<String>,
}

impl<'a> Encoder<'a> {
    pub fn new(module: &'a Module, session: &'a mut SolverSession) -> Self {
        Self {
            module,
            session,
            expanding: Vec::new(),
        }
    }

    pub fn encode_predicate(&mut self, pred: &Predicate, env: &Env) -> Result<Term, VerifyError> {
        Ok(match pred {
            Predicate::Bool(b) => Term::BoolLit(*b),
            Predicate::Compare { op, lhs, rhs } => {
                let l = Box::new(self.encode_expr(lhs, env)?);
                let r = Box::new(self.encode_expr(rhs, env)?);
                match op {
                    CmpOp::Eq => Term::Eq(l, r),
                    CmpOp::Ne => Term::not(Term::Eq(l, r)),
                    CmpOp::Gt => Term::IntGt(l, r),
                    CmpOp::Lt => Term::IntLt(l, r),
                    CmpOp::Ge => Term::IntGe(l, r),
                    CmpOp::Le => Term::IntLe(l, r),
                }
            }
            Predicate::Not(p) => Term::not(self.encode_predicate(p, env)?),
            Predicate::And(a, b) => Term::And(vec![
                self.encode_predicate(a, env)?,
                self.encode_predicate(b, env)?,
            ]),
            Predicate::Or(a, b) => Term::Or(vec![
                self.encode_predicate(a, env)?,
                self.encode_predicate(b, env)?,
            ]),
            Predicate::Implies(a, b) => Term::implies(
                self.encode_predicate(a, env)?,
                self.encode_predicate(b, env)?,
            ),
            Predicate::Paren(p) => self.encode_predicate(p, env)?,
            Predicate::Quantified {
                quantifier,
                var,
                body,
            } => {
                if var.ty != VarType::Int {
                    return Err(VerifyError::Encoding(format!(
                        "quantified variable `{}` must be an int",
                        var.name
                    )));
                }
                let symbol = self.session.fresh_symbol(&var.name);
                let inner = env.with_bound(&var.name, &symbol);
                let body = Box::new(self.encode_predicate(body, &inner)?);
                let vars = vec![(symbol, Sort::Int)];
                match quantifier {
                    Quantifier::Forall => Term::Forall(vars, body),
                    Quantifier::Exists => Term::Exists(vars, body),
                }
            }
            Predicate::FormulaRef { name, args } => self.expand_formula(name, args, env)?,
        })
    }

    pub fn encode_expr(&mut self, expr: &Expr, env: &Env) -> Result<Term, VerifyError> {
        Ok(match expr {
            Expr::Const(n) => Term::int(*n),
            Expr::Var(name) => match env.lookup(name) {
                Some(Binding::Scalar(t)) => t.clone(),
                Some(Binding::Array(_)) => {
                    return Err(VerifyError::Encoding(format!(
                        "array `{name}` used as a scalar"
                    )));
                }
                None => return Err(VerifyError::UnboundVariable(name.clone())),
            },
            Expr::Neg(e) => Term::IntNeg(Box::new(self.encode_expr(e, env)?)),
            Expr::Binary { op, lhs, rhs } => {
                let l = self.encode_expr(lhs, env)?;
                let r = self.encode_expr(rhs, env)?;
                match op {
                    ArithOp::Add => Term::IntAdd(Box::new(l), Box::new(r)),
                    ArithOp::Sub => Term::IntSub(Box::new(l), Box::new(r)),
                    ArithOp::Mul => Term::IntMul(Box::new(l), Box::new(r)),
                    ArithOp::Div => truncating_div(l, r),
                }
            }
            Expr::ArrayRead { array, index } => {
                let arr = match env.lookup(array) {
                    Some(Binding::Array(arr)) => arr.clone(),
                    Some(Binding::Scalar(_)) => {
                        return Err(VerifyError::Encoding(format!(
                            "`{array}` is not an array"
                        )));
                    }
                    None => return Err(VerifyError::UnboundVariable(array.clone())),
                };
                let idx = self.encode_expr(index, env)?;
                if idx.mentions_any(env.bound()) {
                    let sel = self.session.selector(&arr);
                    Term::App(sel, vec![idx])
                } else {
                    Term::constant(self.session.element(&arr, idx))
                }
            }
            Expr::Call { name, args } => self.encode_call(name, args, env)?,
            Expr::Cond {
                cond,
                then_expr,
                else_expr,
            } => Term::ite(
                self.encode_predicate(cond, env)?,
                self.encode_expr(then_expr, env)?,
                self.encode_expr(else_expr, env)?,
            ),
        })
    }

    fn encode_call(&mut self, name: &str, args: &[Expr], env: &Env) -> Result<Term, VerifyError> {
        if name == "length"
            && let [Expr::Var(a)] = args
            && let Some(Binding::Array(arr)) = env.lookup(a)
        {
            let arr = arr.clone();
            return Ok(Term::constant(self.session.length(&arr)));
        }

        let module = self.module;
        let symbol = fn_symbol(name);
        let Some(callee) = module.function(name) else {
            let terms = self.encode_args(args, env)?;
            self.session.declare_fun(&symbol, terms.len())?;
            return Ok(Term::App(symbol, terms));
        };

        if callee.params.len() != args.len() {
            return Err(VerifyError::ArityMismatch {
                name: name.to_string(),
                expected: callee.params.len(),
                found: args.len(),
            });
        }
        if callee.has_array_params() {
            return Err(VerifyError::Encoding(format!(
                "call to `{name}` passes arrays; only scalar arguments are supported"
            )));
        }
        if callee.returns.len() != 1 {
            return Err(VerifyError::Encoding(format!(
                "`{name}` returns {} values and cannot be used in an expression",
                callee.returns.len()
            )));
        }

        let terms = self.encode_args(args, env)?;
        self.session.declare_fun(&symbol, terms.len())?;
        self.ensure_axioms(callee);
        self.instantiate_call_site(callee, &terms, env);
        Ok(Term::App(symbol, terms))
    }

    fn encode_args(&mut self, args: &[Expr], env: &Env) -> Result<Vec<Term>, VerifyError> {
        args.iter().map(|a| self.encode_expr(a, env)).collect()
    }

    /// Inline a named formula with its parameters bound to the arguments.
    fn expand_formula(&mut self, name: &str, args: &[Expr], env: &Env) -> Result<Term, VerifyError> {
        let module = self.module;
        let def = module
            .formula(name)
            .ok_or_else(|| VerifyError::UnknownFormula(name.to_string()))?;
        if def.params.len() != args.len() {
            return Err(VerifyError::ArityMismatch {
                name: name.to_string(),
                expected: def.params.len(),
                found: args.len(),
            });
        }
        if self.expanding.iter().any(|n| n == name) {
            return Err(VerifyError::Encoding(format!(
                "formula `{name}` refers to itself"
            )));
        }

        let mut scope = env.closed();
        for (param, arg) in def.params.iter().zip(args) {
            match param.ty {
                VarType::Int => {
                    let term = self.encode_expr(arg, env)?;
                    scope.bind_scalar(&param.name, term);
                }
                VarType::IntArray => match arg {
                    Expr::Var(a) => match env.lookup(a) {
                        Some(Binding::Array(arr)) => scope.bind_array(&param.name, arr),
                        Some(Binding::Scalar(_)) => {
                            return Err(VerifyError::Encoding(format!(
                                "`{a}` passed for array parameter `{}` of `{name}`",
                                param.name
                            )));
                        }
                        None => return Err(VerifyError::UnboundVariable(a.clone())),
                    },
                    other => {
                        return Err(VerifyError::Encoding(format!(
                            "array parameter `{}` of `{name}` needs an array name, got `{other}`",
                            param.name
                        )));
                    }
                },
            }
        }

        self.expanding.push(name.to_string());
        let result = self.encode_predicate(&def.body, &scope);
        self.expanding.pop();
        result
    }
}

/// `a / b` rounding toward zero on top of SMT-LIB's euclidean `div`.
fn truncating_div(a: Term, b: Term) -> Term {
    let neg_a = Term::IntNeg(Box::new(a.clone()));
    Term::ite(
        Term::IntGe(Box::new(a.clone()), Box::new(Term::int(0))),
        Term::IntDiv(Box::new(a), Box::new(b.clone())),
        Term::IntNeg(Box::new(Term::IntDiv(Box::new(neg_a), Box::new(b)))),
    )
}
