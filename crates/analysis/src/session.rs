//! Per-run solver session.
//!
//! Owns everything the encoder accumulates across function checks: the
//! uninterpreted functions declared so far, the axiom caches
//! (`axioms_added`, `axioms_in_progress`) and the global command list the
//! axioms live in. Per-function state (variable declarations, array
//! element constants, call-site instances) is reset by
//! [`SolverSession::begin_function`].
//!
//! Two sessions never share state; parallel runs give every worker its
//! own session.

use std::collections::{BTreeMap, HashMap, HashSet};

use hoare_fv_smtlib::command::Command;
use hoare_fv_smtlib::script::Script;
use hoare_fv_smtlib::sort::Sort;
use hoare_fv_smtlib::term::Term;

use crate::error::VerifyError;

/// Memoized constant standing for one array cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementConst {
    pub array: String,
    pub index: Term,
    pub symbol: String,
}

/// State for the function currently being encoded.
#[derive(Debug, Default)]
struct LocalState {
    function: String,
    declared: HashSet<String>,
    decls: Vec<Command>,
    assertions: Vec<Command>,
    elements: HashMap<(String, Term), usize>,
    element_order: Vec<ElementConst>,
    selectors: BTreeMap<String, String>,
    lengths: BTreeMap<String, String>,
    call_sites: HashSet<(String, Vec<Term>)>,
}

#[derive(Debug, Default)]
pub struct SolverSession {
    fun_arity: HashMap<String, usize>,
    global_consts: HashSet<String>,
    axioms_added: HashSet<String>,
    axioms_in_progress: HashSet<String>,
    global: Vec<Command>,
    staging: Vec<Vec<Command>>,
    local: LocalState,
    fresh: usize,
}

impl SolverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all per-function state and start encoding `function`.
    pub fn begin_function(&mut self, function: &str) {
        self.local = LocalState {
            function: function.to_string(),
            ..LocalState::default()
        };
    }

    /// Name of the function passed to the last `begin_function`.
    pub fn current_function(&self) -> &str {
        &self.local.function
    }

    /// A session-unique symbol `base!N`.
    pub fn fresh_symbol(&mut self, base: &str) -> String {
        self.fresh += 1;
        format!("{base}!{}", self.fresh)
    }

    // -- declarations -----------------------------------------------------

    /// Declare an `Int^arity -> Int` function once per session.
    pub(crate) fn declare_fun(&mut self, name: &str, arity: usize) -> Result<(), VerifyError> {
        match self.fun_arity.get(name) {
            Some(&expected) if expected != arity => Err(VerifyError::ArityMismatch {
                name: name.to_string(),
                expected,
                found: arity,
            }),
            Some(_) => Ok(()),
            None => {
                self.fun_arity.insert(name.to_string(), arity);
                self.global.push(Command::DeclareFun(
                    name.to_string(),
                    vec![Sort::Int; arity],
                    Sort::Int,
                ));
                Ok(())
            }
        }
    }

    pub fn is_declared_fun(&self, name: &str) -> bool {
        self.fun_arity.contains_key(name)
    }

    pub(crate) fn declare_global_const(&mut self, name: &str) {
        if self.global_consts.insert(name.to_string()) {
            self.global
                .push(Command::DeclareConst(name.to_string(), Sort::Int));
        }
    }

    pub(crate) fn declare_local_const(&mut self, name: &str) {
        if self.local.declared.insert(name.to_string()) {
            self.local
                .decls
                .push(Command::DeclareConst(name.to_string(), Sort::Int));
        }
    }

    pub(crate) fn assert_local(&mut self, term: Term) {
        self.local.assertions.push(Command::Assert(term));
    }

    // -- arrays -----------------------------------------------------------

    /// Constant standing for `array[index]` at a ground index.
    pub(crate) fn element(&mut self, array: &str, index: Term) -> String {
        let key = (array.to_string(), index);
        if let Some(&pos) = self.local.elements.get(&key) {
            return self.local.element_order[pos].symbol.clone();
        }
        let symbol = self.fresh_symbol(&format!("{array}!elem"));
        self.declare_local_const(&symbol);
        self.local.elements.insert(key.clone(), self.local.element_order.len());
        self.local.element_order.push(ElementConst {
            array: key.0,
            index: key.1,
            symbol: symbol.clone(),
        });
        symbol
    }

    /// Selector function for reads of `array` at quantifier-bound indices.
    pub(crate) fn selector(&mut self, array: &str) -> String {
        if let Some(sel) = self.local.selectors.get(array) {
            return sel.clone();
        }
        let sel = format!("{array}!sel");
        self.local
            .decls
            .push(Command::DeclareFun(sel.clone(), vec![Sort::Int], Sort::Int));
        self.local.selectors.insert(array.to_string(), sel.clone());
        sel
    }

    /// Constant for `length(array)`, known to be non-negative.
    pub(crate) fn length(&mut self, array: &str) -> String {
        if let Some(len) = self.local.lengths.get(array) {
            return len.clone();
        }
        let len = format!("{array}!len");
        self.declare_local_const(&len);
        self.assert_local(Term::IntGe(
            Box::new(Term::constant(len.clone())),
            Box::new(Term::int(0)),
        ));
        self.local.lengths.insert(array.to_string(), len.clone());
        len
    }

    /// Array cells memoized while encoding the current function.
    pub fn elements(&self) -> &[ElementConst] {
        &self.local.element_order
    }

    // -- axiom caches -----------------------------------------------------

    pub fn is_axiomatized(&self, name: &str) -> bool {
        self.axioms_added.contains(name)
    }

    pub fn is_in_progress(&self, name: &str) -> bool {
        self.axioms_in_progress.contains(name)
    }

    /// Mark `name` as being worked on. Returns `false` if it already was.
    pub(crate) fn enter(&mut self, name: &str) -> bool {
        self.axioms_in_progress.insert(name.to_string())
    }

    pub(crate) fn leave(&mut self, name: &str) {
        self.axioms_in_progress.remove(name);
    }

    /// Open a staging buffer for the axioms of one synthesis.
    pub(crate) fn begin_staging(&mut self) {
        self.staging.push(Vec::new());
    }

    /// Queue an axiom; it reaches the script only if the enclosing
    /// synthesis commits.
    pub(crate) fn stage_axiom(&mut self, term: Term) {
        match self.staging.last_mut() {
            Some(buf) => buf.push(Command::Assert(term)),
            None => self.global.push(Command::Assert(term)),
        }
    }

    /// Close the innermost staging buffer, keeping its axioms when
    /// `commit` is set. Either way `name` counts as axiomatized.
    pub(crate) fn finish_staging(&mut self, name: &str, commit: bool) {
        if let Some(buf) = self.staging.pop()
            && commit
        {
            self.global.extend(buf);
        }
        self.axioms_added.insert(name.to_string());
    }

    /// Record a call-site instance for `(name, args)`. Returns `false` if
    /// one was already emitted in this function.
    pub(crate) fn note_call_site(&mut self, name: &str, args: &[Term]) -> bool {
        self.local
            .call_sites
            .insert((name.to_string(), args.to_vec()))
    }

    /// Number of axiom assertions committed so far.
    pub fn axiom_count(&self) -> usize {
        self.global
            .iter()
            .filter(|c| matches!(c, Command::Assert(_)))
            .count()
    }

    // -- assembly ---------------------------------------------------------

    /// Script checking satisfiability of `goal` together with everything
    /// declared and asserted so far.
    pub fn assemble(&self, goal: Term) -> Script {
        let mut script = Script::new();
        script.push(Command::SetLogic("ALL".to_string()));
        script.push(Command::Comment(format!(
            "verification condition for `{}`",
            self.local.function
        )));
        script.extend(self.global.iter().cloned());
        script.extend(self.local.decls.iter().cloned());
        script.extend(self.local.assertions.iter().cloned());
        for elem in &self.local.element_order {
            if let Some(sel) = self.local.selectors.get(&elem.array) {
                script.push(Command::Assert(Term::equals(
                    Term::constant(elem.symbol.clone()),
                    Term::App(sel.clone(), vec![elem.index.clone()]),
                )));
            }
        }
        script.push(Command::Assert(Term::not(goal)));
        script.push(Command::CheckSat);
        script.push(Command::GetModel);
        script
    }
}
