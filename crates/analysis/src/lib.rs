//! Verification engine for annotated imperative modules.
//!
//! Pipeline for one function:
//!
//! ```text
//! Function ──wp──▶ Pre ⇒ wp(body, Post) ──simplify──▶ VC ──encode──▶ SMT script
//! ```
//!
//! - [`ir`]: expressions, predicates, statements, functions, modules
//! - [`ingest`]: JSON input
//! - [`subst`], [`simplify`]: capture-avoiding substitution and rewriting
//! - [`wp`], [`vcgen`]: weakest preconditions and verification conditions
//! - [`encode_term`], [`axioms`], [`session`]: SMT encoding with contract
//!   axioms for called functions
//! - [`interp`]: concrete replay used for counterexamples

pub mod axioms;
pub mod encode_term;
pub mod error;
pub mod ingest;
pub mod interp;
pub mod ir;
pub mod session;
pub mod simplify;
pub mod subst;
pub mod vcgen;
pub mod wp;

pub use error::VerifyError;
pub use ingest::parse_module;
pub use ir::{Expr, Function, Module, Predicate, Statement};
pub use session::SolverSession;
pub use vcgen::{EncodedVc, SymbolTable, build_vc, build_vc_with, encode_vc};
pub use wp::{WpOptions, wp, wp_with};
