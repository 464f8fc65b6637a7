/// Verification condition generation.
///
/// `VC(f) = Pre ⇒ wp(body, Post)`, simplified. A function without a
/// postcondition has no VC. The encoded form asserts `¬VC` on top of the
/// session's accumulated declarations and axioms, so `unsat` means the
/// contract holds.
use hoare_fv_smtlib::script::Script;
use hoare_fv_smtlib::term::Term;

use crate::encode_term::{Encoder, Env, var_symbol};
use crate::error::VerifyError;
use crate::ir::{Function, Module, Predicate, VarType};
use crate::session::{ElementConst, SolverSession};
use crate::simplify::simplify_predicate;
use crate::wp::{WpOptions, wp_with};

/// Build the verification condition of `func`.
pub fn build_vc(func: &Function) -> Result<Option<Predicate>, VerifyError> {
    build_vc_with(func, &WpOptions::default())
}

/// [`build_vc`] with explicit WP options.
pub fn build_vc_with(func: &Function, opts: &WpOptions) -> Result<Option<Predicate>, VerifyError> {
    let Some(post) = &func.post else {
        tracing::info!(function = %func.name, "No postcondition; nothing to verify");
        return Ok(None);
    };
    tracing::info!(function = %func.name, "Generating verification condition");

    let body_wp = wp_with(&func.body, post, opts)?;
    let pre = func.pre.clone().unwrap_or(Predicate::TRUE);
    let vc = simplify_predicate(&Predicate::implies(pre, body_wp));

    tracing::debug!(function = %func.name, size = vc.size(), "Verification condition built");
    Ok(Some(vc))
}

/// Which SMT symbols stand for which program entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    /// `(variable, constant)` for every scalar parameter, return and local.
    pub scalars: Vec<(String, String)>,
    /// Array cells the encoding refers to at ground indices.
    pub cells: Vec<ElementConst>,
}

impl SymbolTable {
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.scalars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    /// Cells of `array` whose index is an integer literal.
    pub fn literal_cells<'s>(&'s self, array: &'s str) -> impl Iterator<Item = (i128, &'s str)> + 's {
        self.cells.iter().filter_map(move |c| match c.index {
            Term::IntLit(i) if c.array == array => Some((i, c.symbol.as_str())),
            _ => None,
        })
    }
}

/// A verification condition ready for the solver.
#[derive(Debug, Clone)]
pub struct EncodedVc {
    pub function: String,
    pub script: Script,
    pub symbols: SymbolTable,
}

/// Encode `vc` for `func`, recording declarations and axioms in `session`.
pub fn encode_vc(
    session: &mut SolverSession,
    module: &Module,
    func: &Function,
    vc: &Predicate,
) -> Result<EncodedVc, VerifyError> {
    session.begin_function(&func.name);

    let env = Env::for_function(func);
    let mut scalars = Vec::new();
    for p in func.variables().filter(|p| p.ty == VarType::Int) {
        let symbol = var_symbol(&p.name);
        session.declare_local_const(&symbol);
        scalars.push((p.name.clone(), symbol));
    }

    let goal = Encoder::new(module, session).encode_predicate(vc, &env)?;
    let script = session.assemble(goal);
    tracing::debug!(
        function = %func.name,
        commands = script.len(),
        assertions = script.assertion_count(),
        "Encoded verification condition"
    );

    Ok(EncodedVc {
        function: func.name.clone(),
        script,
        symbols: SymbolTable {
            scalars,
            cells: session.elements().to_vec(),
        },
    })
}
