/**
 * Binding Expression AST
 *
 * Syntax tree for the JavaScript subset a binding fragment may contain.
 * Every node records the offset where it starts so translation errors can be
 * positioned.
 */

use crate::codedom::{BinaryOperator, UnaryOperator};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(String),
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    This,
    Parens(Box<Expr>),
    /// `target.name`
    Member {
        target: Box<Expr>,
        name: String,
    },
    /// `target[key]`
    Index {
        target: Box<Expr>,
        key: Box<Expr>,
    },
    Call {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    TypeOf(Box<Expr>),
    /// Arithmetic, comparison, logical and assignment operators
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    In {
        key: Box<Expr>,
        target: Box<Expr>,
    },
    InstanceOf {
        target: Box<Expr>,
        type_expr: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Comma(Vec<Expr>),
    Object(Vec<(PropertyKey, Expr)>),
    Array(Vec<Expr>),
    Function(Box<Function>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Name(String),
    Literal(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Var(Vec<VarInit>),
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Function(Function),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarInit {
    pub name: String,
    pub init: Option<Expr>,
    pub index: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, index: usize) -> Self {
        Expr { kind, index }
    }

    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, index: usize) -> Self {
        Stmt { kind, index }
    }
}
