//! JSON ingestion of validated program ASTs.
//!
//! Expressions are tagged by `"type"` and predicates by `"kind"`. The
//! predicate family accepts both the `comparison` node with an `op` field
//! and the short spellings `eq neq gt lt ge le`, normalizing them to
//! [`Predicate::Compare`]. Unknown tags are rejected by serde and surface
//! as [`VerifyError::Structural`].

use serde::Deserialize;

use crate::error::VerifyError;
use crate::ir::{ArithOp, CmpOp, Expr, Module, Param, Predicate, Quantifier};

/// Parse a module from its JSON form.
pub fn parse_module(json: &str) -> Result<Module, VerifyError> {
    let module: Module =
        serde_json::from_str(json).map_err(|e| VerifyError::Structural(e.to_string()))?;
    tracing::debug!(
        functions = module.functions.len(),
        formulas = module.formulas.len(),
        "module ingested"
    );
    Ok(module)
}

#[derive(Deserialize)]
#[serde(tag = "type")]
pub(crate) enum RawExpr {
    #[serde(rename = "const")]
    Const { value: i64 },
    #[serde(rename = "var")]
    Var { name: String },
    #[serde(rename = "unary")]
    Unary { argument: Box<Expr> },
    #[serde(rename = "binop")]
    Binop {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    #[serde(rename = "arraccess")]
    ArrAccess { name: String, index: Box<Expr> },
    #[serde(rename = "funccall")]
    FuncCall {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    #[serde(rename = "ite")]
    Ite {
        condition: Box<Predicate>,
        #[serde(rename = "thenExpr")]
        then_expr: Box<Expr>,
        #[serde(rename = "elseExpr")]
        else_expr: Box<Expr>,
    },
}

impl From<RawExpr> for Expr {
    fn from(raw: RawExpr) -> Self {
        match raw {
            RawExpr::Const { value } => Expr::Const(value),
            RawExpr::Var { name } => Expr::Var(name),
            RawExpr::Unary { argument } => Expr::Neg(argument),
            RawExpr::Binop { op, left, right } => Expr::Binary {
                op,
                lhs: left,
                rhs: right,
            },
            RawExpr::ArrAccess { name, index } => Expr::ArrayRead { array: name, index },
            RawExpr::FuncCall { name, args } => Expr::Call { name, args },
            RawExpr::Ite {
                condition,
                then_expr,
                else_expr,
            } => Expr::Cond {
                cond: condition,
                then_expr,
                else_expr,
            },
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct Operands {
    left: Expr,
    right: Expr,
}

#[derive(Deserialize)]
pub(crate) struct Connective {
    left: Box<Predicate>,
    right: Box<Predicate>,
}

#[derive(Deserialize)]
#[serde(tag = "kind")]
pub(crate) enum RawPredicate {
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    #[serde(rename = "comparison")]
    Comparison { op: CmpOp, left: Expr, right: Expr },
    #[serde(rename = "eq")]
    Eq(Operands),
    #[serde(rename = "neq")]
    Neq(Operands),
    #[serde(rename = "gt")]
    Gt(Operands),
    #[serde(rename = "lt")]
    Lt(Operands),
    #[serde(rename = "ge")]
    Ge(Operands),
    #[serde(rename = "le")]
    Le(Operands),
    #[serde(rename = "not")]
    Not { condition: Box<Predicate> },
    #[serde(rename = "and")]
    And(Connective),
    #[serde(rename = "or")]
    Or(Connective),
    #[serde(rename = "implies")]
    Implies(Connective),
    #[serde(rename = "paren")]
    Paren { inner: Box<Predicate> },
    #[serde(rename = "forall")]
    Forall {
        variable: Param,
        predicate: Box<Predicate>,
    },
    #[serde(rename = "exists")]
    Exists {
        variable: Param,
        predicate: Box<Predicate>,
    },
    #[serde(rename = "formulaRef")]
    FormulaRef {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl From<RawPredicate> for Predicate {
    fn from(raw: RawPredicate) -> Self {
        let cmp = |op, o: Operands| Predicate::Compare {
            op,
            lhs: o.left,
            rhs: o.right,
        };
        match raw {
            RawPredicate::True => Predicate::Bool(true),
            RawPredicate::False => Predicate::Bool(false),
            RawPredicate::Comparison { op, left, right } => Predicate::Compare {
                op,
                lhs: left,
                rhs: right,
            },
            RawPredicate::Eq(o) => cmp(CmpOp::Eq, o),
            RawPredicate::Neq(o) => cmp(CmpOp::Ne, o),
            RawPredicate::Gt(o) => cmp(CmpOp::Gt, o),
            RawPredicate::Lt(o) => cmp(CmpOp::Lt, o),
            RawPredicate::Ge(o) => cmp(CmpOp::Ge, o),
            RawPredicate::Le(o) => cmp(CmpOp::Le, o),
            RawPredicate::Not { condition } => Predicate::Not(condition),
            RawPredicate::And(c) => Predicate::And(c.left, c.right),
            RawPredicate::Or(c) => Predicate::Or(c.left, c.right),
            RawPredicate::Implies(c) => Predicate::Implies(c.left, c.right),
            RawPredicate::Paren { inner } => Predicate::Paren(inner),
            RawPredicate::Forall {
                variable,
                predicate,
            } => Predicate::Quantified {
                quantifier: Quantifier::Forall,
                var: variable,
                body: predicate,
            },
            RawPredicate::Exists {
                variable,
                predicate,
            } => Predicate::Quantified {
                quantifier: Quantifier::Exists,
                var: variable,
                body: predicate,
            },
            RawPredicate::FormulaRef { name, args } => Predicate::FormulaRef { name, args },
        }
    }
}
