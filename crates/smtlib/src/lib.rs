//! # hoare-fv-smtlib
//!
//! A small SMT-LIB2 abstract syntax: sorts, terms, commands and scripts,
//! plus `Display` implementations that print solver-ready text.

pub mod command;
pub mod formatter;
pub mod script;
pub mod sort;
pub mod term;

pub use command::Command;
pub use script::Script;
pub use sort::Sort;
pub use term::Term;
