//! Our own intermediate representation of annotated programs.
//!
//! Closed sum types for expressions, predicates, statements and left-values,
//! plus the function and module containers. Everything here is plain data:
//! structural equality is the derived `PartialEq`, and the only behavior is
//! construction helpers, node counting and infix pretty-printing.
//!
//! Deserialization goes through the raw JSON shapes in [`crate::ingest`].

use std::fmt;

use serde::Deserialize;

/// Integer arithmetic operators. Division truncates toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        }
    }

    /// Evaluate on concrete integers.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Le => lhs <= rhs,
        }
    }
}

/// Integer-valued expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "crate::ingest::RawExpr")]
pub enum Expr {
    Const(i64),
    Var(String),
    /// Unary minus
    Neg(Box<Expr>),
    Binary {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `array[index]`
    ArrayRead {
        array: String,
        index: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Conditional expression `cond ? then_expr : else_expr`
    Cond {
        cond: Box<Predicate>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Const(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn neg(e: Expr) -> Self {
        Expr::Neg(Box::new(e))
    }

    pub fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(ArithOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(ArithOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(ArithOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(ArithOp::Div, lhs, rhs)
    }

    pub fn read(array: impl Into<String>, index: Expr) -> Self {
        Expr::ArrayRead {
            array: array.into(),
            index: Box::new(index),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn cond(cond: Predicate, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::Cond {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    /// Number of AST nodes, counting nested predicates.
    pub fn size(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Var(_) => 1,
            Expr::Neg(e) => 1 + e.size(),
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.size() + rhs.size(),
            Expr::ArrayRead { index, .. } => 1 + index.size(),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::size).sum::<usize>(),
            Expr::Cond {
                cond,
                then_expr,
                else_expr,
            } => 1 + cond.size() + then_expr.size() + else_expr.size(),
        }
    }
}

/// Quantifier flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// Logical formula over program expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "crate::ingest::RawPredicate")]
pub enum Predicate {
    Bool(bool),
    Compare {
        op: CmpOp,
        lhs: Expr,
        rhs: Expr,
    },
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Implies(Box<Predicate>, Box<Predicate>),
    /// Explicit parenthesization; semantically transparent.
    Paren(Box<Predicate>),
    Quantified {
        quantifier: Quantifier,
        var: Param,
        body: Box<Predicate>,
    },
    /// Use of a named formula definition.
    FormulaRef {
        name: String,
        args: Vec<Expr>,
    },
}

impl Predicate {
    pub const TRUE: Predicate = Predicate::Bool(true);
    pub const FALSE: Predicate = Predicate::Bool(false);

    pub fn compare(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Predicate::Compare { op, lhs, rhs }
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Self::compare(CmpOp::Eq, lhs, rhs)
    }

    pub fn not(p: Predicate) -> Self {
        Predicate::Not(Box::new(p))
    }

    pub fn and(lhs: Predicate, rhs: Predicate) -> Self {
        Predicate::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Predicate, rhs: Predicate) -> Self {
        Predicate::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Predicate, rhs: Predicate) -> Self {
        Predicate::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn forall(var: impl Into<String>, body: Predicate) -> Self {
        Predicate::Quantified {
            quantifier: Quantifier::Forall,
            var: Param::int(var),
            body: Box::new(body),
        }
    }

    pub fn exists(var: impl Into<String>, body: Predicate) -> Self {
        Predicate::Quantified {
            quantifier: Quantifier::Exists,
            var: Param::int(var),
            body: Box::new(body),
        }
    }

    /// Number of AST nodes, counting nested expressions.
    pub fn size(&self) -> usize {
        match self {
            Predicate::Bool(_) => 1,
            Predicate::Compare { lhs, rhs, .. } => 1 + lhs.size() + rhs.size(),
            Predicate::Not(p) | Predicate::Paren(p) => 1 + p.size(),
            Predicate::And(a, b) | Predicate::Or(a, b) | Predicate::Implies(a, b) => {
                1 + a.size() + b.size()
            }
            Predicate::Quantified { body, .. } => 1 + body.size(),
            Predicate::FormulaRef { args, .. } => 1 + args.iter().map(Expr::size).sum::<usize>(),
        }
    }
}

/// Declared type of a parameter, return or local.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum VarType {
    #[default]
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "int[]")]
    IntArray,
}

/// A typed name: function parameter, return, local, formula parameter or
/// quantifier-bound variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "varType", default)]
    pub ty: VarType,
}

impl Param {
    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: VarType::Int,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: VarType::IntArray,
        }
    }
}

/// Assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum LValue {
    #[serde(rename = "lvar")]
    Var { name: String },
    #[serde(rename = "larr")]
    ArrayElem { name: String, index: Expr },
}

impl LValue {
    pub fn var(name: impl Into<String>) -> Self {
        LValue::Var { name: name.into() }
    }

    pub fn elem(name: impl Into<String>, index: Expr) -> Self {
        LValue::ArrayElem {
            name: name.into(),
            index,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LValue::Var { name } | LValue::ArrayElem { name, .. } => name,
        }
    }
}

/// Statement of the imperative language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Statement {
    /// Simultaneous assignment. No targets means a bare call statement.
    Assign {
        targets: Vec<LValue>,
        exprs: Vec<Expr>,
    },
    Block {
        stmts: Vec<Statement>,
    },
    If {
        condition: Predicate,
        #[serde(rename = "then")]
        then_branch: Box<Statement>,
        #[serde(rename = "else", default)]
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Predicate,
        body: Box<Statement>,
        #[serde(default)]
        invariant: Option<Predicate>,
    },
}

impl Statement {
    pub fn assign(target: LValue, expr: Expr) -> Self {
        Statement::Assign {
            targets: vec![target],
            exprs: vec![expr],
        }
    }

    pub fn block(stmts: Vec<Statement>) -> Self {
        Statement::Block { stmts }
    }

    pub fn if_then(condition: Predicate, then_branch: Statement, else_branch: Option<Statement>) -> Self {
        Statement::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn while_loop(condition: Predicate, invariant: Option<Predicate>, body: Statement) -> Self {
        Statement::While {
            condition,
            body: Box::new(body),
            invariant,
        }
    }
}

/// A function with its optional contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(rename = "parameters", default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub returns: Vec<Param>,
    #[serde(default)]
    pub locals: Vec<Param>,
    pub body: Statement,
    #[serde(rename = "precondition", default)]
    pub pre: Option<Predicate>,
    #[serde(rename = "postcondition", default)]
    pub post: Option<Predicate>,
}

impl Function {
    /// Parameters, then returns, then locals.
    pub fn variables(&self) -> impl Iterator<Item = &Param> {
        self.params
            .iter()
            .chain(self.returns.iter())
            .chain(self.locals.iter())
    }

    pub fn lookup(&self, name: &str) -> Option<&Param> {
        self.variables().find(|p| p.name == name)
    }

    pub fn has_array_params(&self) -> bool {
        self.params.iter().any(|p| p.ty == VarType::IntArray)
    }
}

/// Named reusable predicate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormulaDef {
    pub name: String,
    #[serde(rename = "parameters", default)]
    pub params: Vec<Param>,
    pub body: Predicate,
}

/// A whole program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub formulas: Vec<FormulaDef>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn formula(&self, name: &str) -> Option<&FormulaDef> {
        self.formulas.iter().find(|f| f.name == name)
    }
}

// ---------------------------------------------------------------------------
// Pretty-printing
// ---------------------------------------------------------------------------

fn fmt_args(args: &[Expr], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{a}")?;
    }
    Ok(())
}

/// Write `e`, parenthesized unless it is atomic.
fn fmt_operand(e: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match e {
        Expr::Binary { .. } | Expr::Cond { .. } => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(n) => write!(f, "{n}"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Neg(e) => {
                write!(f, "-")?;
                fmt_operand(e, f)
            }
            Expr::Binary { op, lhs, rhs } => {
                fmt_operand(lhs, f)?;
                write!(f, " {} ", op.symbol())?;
                fmt_operand(rhs, f)
            }
            Expr::ArrayRead { array, index } => write!(f, "{array}[{index}]"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                fmt_args(args, f)?;
                write!(f, ")")
            }
            Expr::Cond {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "{cond} ? {then_expr} : {else_expr}"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Bool(b) => write!(f, "{b}"),
            Predicate::Compare { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Predicate::Not(p) => write!(f, "not ({p})"),
            Predicate::And(a, b) => write!(f, "({a} and {b})"),
            Predicate::Or(a, b) => write!(f, "({a} or {b})"),
            Predicate::Implies(a, b) => write!(f, "({a} -> {b})"),
            Predicate::Paren(p) => write!(f, "({p})"),
            Predicate::Quantified {
                quantifier,
                var,
                body,
            } => {
                let kw = match quantifier {
                    Quantifier::Forall => "forall",
                    Quantifier::Exists => "exists",
                };
                write!(f, "{kw} ({}: {} | {body})", var.name, var.ty)
            }
            Predicate::FormulaRef { name, args } => {
                write!(f, "{name}(")?;
                fmt_args(args, f)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Int => write!(f, "int"),
            VarType::IntArray => write!(f, "int[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_counts_all_nodes() {
        // s + 1 == i
        let p = Predicate::equal(Expr::add(Expr::var("s"), Expr::int(1)), Expr::var("i"));
        assert_eq!(p.size(), 5);
        let q = Predicate::forall("k", Predicate::and(p.clone(), Predicate::TRUE));
        assert_eq!(q.size(), 1 + 1 + 5 + 1);
    }

    #[test]
    fn display_is_infix() {
        let p = Predicate::implies(
            Predicate::compare(CmpOp::Ge, Expr::var("n"), Expr::int(0)),
            Predicate::equal(
                Expr::read("a", Expr::sub(Expr::var("n"), Expr::int(1))),
                Expr::neg(Expr::mul(Expr::var("x"), Expr::int(2))),
            ),
        );
        assert_eq!(p.to_string(), "(n >= 0 -> a[n - 1] == -(x * 2))");
    }

    #[test]
    fn display_quantifier_and_formula_ref() {
        let p = Predicate::forall(
            "i",
            Predicate::FormulaRef {
                name: "sorted".into(),
                args: vec![Expr::var("a"), Expr::var("i")],
            },
        );
        assert_eq!(p.to_string(), "forall (i: int | sorted(a, i))");
    }

    #[test]
    fn function_variable_lookup() {
        let f = Function {
            name: "f".into(),
            params: vec![Param::array("a")],
            returns: vec![Param::int("r")],
            locals: vec![Param::int("i")],
            body: Statement::block(vec![]),
            pre: None,
            post: None,
        };
        let names: Vec<_> = f.variables().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "r", "i"]);
        assert_eq!(f.lookup("a").map(|p| p.ty), Some(VarType::IntArray));
        assert!(f.has_array_params());
        assert!(f.lookup("zz").is_none());
    }
}
