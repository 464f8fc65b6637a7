//! Contract axioms for called functions.
//!
//! A call `g(args)` is encoded as the uninterpreted application
//! `fn.g(args)`. The first time `g` is met in a session its contract is
//! turned into assertions about `fn.g`:
//!
//! 1. **Self-referential** (`g` has one int parameter, one return, and its
//!    postcondition calls `g`): a base case at `0`, an inductive step
//!    `∀n. n > 0 ∧ Pre(n) ⇒ Post(n, g(n))`, and ground instances at
//!    `1`, `2`, `3`.
//! 2. **Otherwise**: `Pre ⇒ Post` at fresh formal constants `g.arg.<p>`,
//!    and at all-`0` / all-`1` arguments.
//!
//! Independently, every call site gets its own instance at the actual
//! argument terms, once per distinct tuple within a function check.
//!
//! Calls to a function whose axioms are being synthesized stay plain
//! applications; synthesis failures are logged and the function is left
//! unaxiomatized.
use hoare_fv_smtlib::sort::Sort;
use hoare_fv_smtlib::term::Term;

use crate::encode_term::{Encoder, Env, fn_symbol};
use crate::error::VerifyError;
use crate::ir::{Expr, Function, Predicate};

/// Ground instances emitted alongside the inductive step.
const GROUND_INSTANCES: [i64; 3] = [1, 2, 3];

/// Arguments tried for every scalar parameter at once.
const FIXED_ARGUMENTS: [i64; 2] = [0, 1];

impl Encoder<'_> {
    /// Synthesize the contract axioms of `g` unless already done or under way.
    pub(crate) fn ensure_axioms(&mut self, g: &Function) {
        let name = g.name.as_str();
        if self.session.is_axiomatized(name) || self.session.is_in_progress(name) {
            return;
        }
        self.session.enter(name);
        self.session.begin_staging();

        let outcome = match &g.post {
            None => Ok(0),
            Some(post) if is_self_referential(g, post) => self.synthesize_inductive(g, post),
            Some(post) => self.synthesize_instances(g, post),
        };
        let commit = match outcome {
            Ok(count) => {
                tracing::debug!(function = %name, axioms = count, "Synthesized contract axioms");
                true
            }
            Err(err) => {
                tracing::warn!(
                    function = %name,
                    error = %err,
                    "Axiom synthesis failed; calls stay uninterpreted"
                );
                false
            }
        };

        self.session.finish_staging(name, commit);
        self.session.leave(name);
    }

    /// Assert `Pre ⇒ Post` of `g` at the argument terms of one call site.
    pub(crate) fn instantiate_call_site(&mut self, g: &Function, args: &[Term], env: &Env) {
        let Some(post) = &g.post else {
            return;
        };
        if self.session.is_in_progress(&g.name)
            || args.iter().any(|t| t.mentions_any(env.bound()))
            || !self.session.note_call_site(&g.name, args)
        {
            return;
        }

        self.session.enter(&g.name);
        match self.contract_instance(g, post, args.to_vec(), env.bound(), None) {
            Ok(instance) => self.session.assert_local(instance),
            Err(err) => tracing::warn!(
                function = %g.name,
                error = %err,
                "Skipping call-site instance"
            ),
        }
        self.session.leave(&g.name);
    }

    fn synthesize_inductive(&mut self, g: &Function, post: &Predicate) -> Result<usize, VerifyError> {
        let base = self.contract_instance(g, post, vec![Term::int(0)], &[], None)?;
        self.session.stage_axiom(base);

        let n = self.session.fresh_symbol(&g.params[0].name);
        let n_term = Term::constant(n.clone());
        let positive = Term::IntGt(Box::new(n_term.clone()), Box::new(Term::int(0)));
        let step = self.contract_instance(g, post, vec![n_term], &[n.clone()], Some(positive))?;
        self.session
            .stage_axiom(Term::Forall(vec![(n, Sort::Int)], Box::new(step)));

        for k in GROUND_INSTANCES {
            let ground = self.contract_instance(g, post, vec![Term::int(k)], &[], None)?;
            self.session.stage_axiom(ground);
        }
        Ok(2 + GROUND_INSTANCES.len())
    }

    fn synthesize_instances(&mut self, g: &Function, post: &Predicate) -> Result<usize, VerifyError> {
        let formals: Vec<Term> = g
            .params
            .iter()
            .map(|p| {
                let symbol = format!("{}.arg.{}", g.name, p.name);
                self.session.declare_global_const(&symbol);
                Term::constant(symbol)
            })
            .collect();
        let formal = self.contract_instance(g, post, formals, &[], None)?;
        self.session.stage_axiom(formal);

        if g.params.is_empty() {
            return Ok(1);
        }
        for k in FIXED_ARGUMENTS {
            let args = vec![Term::int(k); g.params.len()];
            let fixed = self.contract_instance(g, post, args, &[], None)?;
            self.session.stage_axiom(fixed);
        }
        Ok(1 + FIXED_ARGUMENTS.len())
    }

    /// `guard ∧ Pre(args) ⇒ Post(args, g(args))`.
    fn contract_instance(
        &mut self,
        g: &Function,
        post: &Predicate,
        args: Vec<Term>,
        bound: &[String],
        guard: Option<Term>,
    ) -> Result<Term, VerifyError> {
        let mut env = Env::new();
        for symbol in bound {
            env.push_bound(symbol);
        }
        for (param, arg) in g.params.iter().zip(&args) {
            env.bind_scalar(&param.name, arg.clone());
        }
        if let Some(ret) = g.returns.first() {
            env.bind_scalar(&ret.name, Term::App(fn_symbol(&g.name), args));
        }

        let consequent = self.encode_predicate(post, &env)?;
        let mut hypotheses: Vec<Term> = guard.into_iter().collect();
        if let Some(pre) = &g.pre {
            hypotheses.push(self.encode_predicate(pre, &env)?);
        }
        Ok(match hypotheses.len() {
            0 => consequent,
            1 => Term::implies(hypotheses.remove(0), consequent),
            _ => Term::implies(Term::And(hypotheses), consequent),
        })
    }
}

fn is_self_referential(g: &Function, post: &Predicate) -> bool {
    g.params.len() == 1 && g.returns.len() == 1 && predicate_calls(post, &g.name)
}

/// Whether `pred` contains a call to `name` outside formula references.
fn predicate_calls(pred: &Predicate, name: &str) -> bool {
    match pred {
        Predicate::Bool(_) => false,
        Predicate::Compare { lhs, rhs, .. } => expr_calls(lhs, name) || expr_calls(rhs, name),
        Predicate::Not(p) | Predicate::Paren(p) => predicate_calls(p, name),
        Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Implies(a, b) => {
            predicate_calls(a, name) || predicate_calls(b, name)
        }
        Predicate::Quantified { body, .. } => predicate_calls(body, name),
        Predicate::FormulaRef { args, .. } => args.iter().any(|a| expr_calls(a, name)),
    }
}

fn expr_calls(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Const(_) | Expr::Var(_) => false,
        Expr::Neg(e) => expr_calls(e, name),
        Expr::Binary { lhs, rhs, .. } => expr_calls(lhs, name) || expr_calls(rhs, name),
        Expr::ArrayRead { index, .. } => expr_calls(index, name),
        Expr::Call { name: callee, args } => {
            callee == name || args.iter().any(|a| expr_calls(a, name))
        }
        Expr::Cond {
            cond,
            then_expr,
            else_expr,
        } => {
            predicate_calls(cond, name) || expr_calls(then_expr, name) || expr_calls(else_expr, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpOp, Module, Param, Statement};
    use crate::session::SolverSession;
    use hoare_fv_smtlib::command::Command;

    fn v(n: &str) -> Expr {
        Expr::var(n)
    }

    /// `fact(n) returns (r) requires n >= 0 ensures r == (n == 0 ? 1 : n * fact(n - 1))`
    fn fact() -> Function {
        Function {
            name: "fact".into(),
            params: vec![Param::int("n")],
            returns: vec![Param::int("r")],
            locals: vec![],
            body: Statement::block(vec![]),
            pre: Some(Predicate::compare(CmpOp::Ge, v("n"), Expr::int(0))),
            post: Some(Predicate::equal(
                v("r"),
                Expr::cond(
                    Predicate::equal(v("n"), Expr::int(0)),
                    Expr::int(1),
                    Expr::mul(
                        v("n"),
                        Expr::call("fact", vec![Expr::sub(v("n"), Expr::int(1))]),
                    ),
                ),
            )),
        }
    }

    /// `inc(x) returns (y) ensures y == x + 1`
    fn inc() -> Function {
        Function {
            name: "inc".into(),
            params: vec![Param::int("x")],
            returns: vec![Param::int("y")],
            locals: vec![],
            body: Statement::block(vec![]),
            pre: None,
            post: Some(Predicate::equal(v("y"), Expr::add(v("x"), Expr::int(1)))),
        }
    }

    fn caller() -> Function {
        Function {
            name: "main".into(),
            params: vec![Param::int("k")],
            returns: vec![Param::int("out")],
            locals: vec![],
            body: Statement::block(vec![]),
            pre: None,
            post: None,
        }
    }

    fn encode_in(module: &Module, session: &mut SolverSession, e: &Expr) -> Term {
        session.begin_function("main");
        let env = Env::for_function(&caller());
        Encoder::new(module, session).encode_expr(e, &env).unwrap()
    }

    fn asserted(session: &SolverSession) -> Vec<String> {
        session
            .assemble(Term::BoolLit(true))
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Assert(t) => Some(t.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn detects_self_reference() {
        let f = fact();
        assert!(is_self_referential(&f, f.post.as_ref().unwrap()));
        let g = inc();
        assert!(!is_self_referential(&g, g.post.as_ref().unwrap()));
    }

    #[test]
    fn recursive_function_gets_base_step_and_ground_instances() {
        let module = Module {
            functions: vec![fact()],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        encode_in(&module, &mut session, &Expr::call("fact", vec![v("k")]));

        assert!(session.is_axiomatized("fact"));
        assert!(!session.is_in_progress("fact"));
        // base + step + 3 ground
        assert_eq!(session.axiom_count(), 5);

        let all = asserted(&session);
        assert!(all.iter().any(|a| a.starts_with("(forall ((n!")), "{all:?}");
        assert!(
            all.iter().any(|a| a.contains("(fn.fact k)")),
            "call-site instance missing: {all:?}"
        );
    }

    #[test]
    fn second_call_reuses_axioms() {
        let module = Module {
            functions: vec![fact()],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        encode_in(&module, &mut session, &Expr::call("fact", vec![v("k")]));
        let before = session.axiom_count();
        encode_in(&module, &mut session, &Expr::call("fact", vec![Expr::int(5)]));
        assert_eq!(session.axiom_count(), before);
    }

    #[test]
    fn plain_function_gets_formal_and_fixed_instances() {
        let module = Module {
            functions: vec![inc()],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        encode_in(&module, &mut session, &Expr::call("inc", vec![v("k")]));

        assert_eq!(session.axiom_count(), 3);
        let all = asserted(&session);
        assert!(all.contains(&"(= (fn.inc inc.arg.x) (+ inc.arg.x 1))".to_string()));
        assert!(all.contains(&"(= (fn.inc 0) (+ 0 1))".to_string()));
        assert!(all.contains(&"(= (fn.inc 1) (+ 1 1))".to_string()));
        assert!(all.contains(&"(= (fn.inc k) (+ k 1))".to_string()));
    }

    #[test]
    fn call_site_instance_emitted_once_per_tuple() {
        let module = Module {
            functions: vec![inc()],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        session.begin_function("main");
        let env = Env::for_function(&caller());
        let mut enc = Encoder::new(&module, &mut session);
        let call = Expr::call("inc", vec![v("k")]);
        enc.encode_expr(&call, &env).unwrap();
        enc.encode_expr(&call, &env).unwrap();
        let all = asserted(&session);
        let instances = all.iter().filter(|a| *a == "(= (fn.inc k) (+ k 1))").count();
        assert_eq!(instances, 1);
    }

    #[test]
    fn bound_arguments_get_no_call_site_instance() {
        let module = Module {
            functions: vec![inc()],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        session.begin_function("main");
        let env = Env::for_function(&caller());
        let p = Predicate::forall(
            "j",
            Predicate::compare(CmpOp::Gt, Expr::call("inc", vec![v("j")]), v("j")),
        );
        Encoder::new(&module, &mut session)
            .encode_predicate(&p, &env)
            .unwrap();
        let all = asserted(&session);
        assert!(all.iter().all(|a| !a.contains("(fn.inc j!")), "{all:?}");
    }

    #[test]
    fn failed_synthesis_leaves_bare_uf() {
        // The postcondition mentions a local the axioms cannot bind.
        let mut bad = inc();
        bad.locals = vec![Param::int("t")];
        bad.post = Some(Predicate::equal(v("y"), v("t")));
        let module = Module {
            functions: vec![bad],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        let t = encode_in(&module, &mut session, &Expr::call("inc", vec![v("k")]));
        assert_eq!(t, Term::App("fn.inc".into(), vec![Term::constant("k")]));
        assert!(session.is_axiomatized("inc"));
        assert_eq!(session.axiom_count(), 0);
    }

    #[test]
    fn array_arguments_are_rejected() {
        let mut sum = inc();
        sum.params = vec![Param::array("xs")];
        let module = Module {
            functions: vec![sum],
            formulas: vec![],
        };
        let mut session = SolverSession::new();
        session.begin_function("main");
        let env = Env::for_function(&caller());
        let err = Encoder::new(&module, &mut session)
            .encode_expr(&Expr::call("inc", vec![v("k")]), &env)
            .unwrap_err();
        assert!(matches!(err, VerifyError::Encoding(_)));
    }
}
