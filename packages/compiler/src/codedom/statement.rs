//! CodeDOM Statements

use crate::codedom::expression::Expression;
use crate::codedom::types::CodeType;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(ExpressionStatement),
    VariableDecl(VariableDeclStatement),
    /// Several declarations sharing one type, e.g. a loop header
    CompoundDecl(CompoundDeclStatement),
    Condition(ConditionStatement),
    Iteration(IterationStatement),
    Return(ReturnStatement),
    Comment(CommentStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclStatement {
    pub code_type: CodeType,
    pub name: String,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundDeclStatement {
    pub vars: Vec<VariableDeclStatement>,
}

/// `if`/`else`; a false branch holding exactly one condition renders as `else if`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionStatement {
    pub test: Expression,
    pub true_statements: Vec<Statement>,
    pub false_statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationStatement {
    pub init: Option<Box<Statement>>,
    pub test: Expression,
    pub increment: Option<Box<Statement>>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub expr: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentStatement {
    pub value: String,
}

impl VariableDeclStatement {
    pub fn new(code_type: CodeType, name: impl Into<String>, init: Option<Expression>) -> Self {
        VariableDeclStatement {
            code_type,
            name: name.into(),
            init,
        }
    }

    /// A reference to the declared local.
    pub fn var_ref(&self) -> Expression {
        crate::codedom::expression::variable(self.code_type.clone(), self.name.clone())
    }
}

impl From<VariableDeclStatement> for Statement {
    fn from(value: VariableDeclStatement) -> Self {
        Statement::VariableDecl(value)
    }
}

impl From<Expression> for Statement {
    fn from(expr: Expression) -> Self {
        Statement::Expression(ExpressionStatement { expr })
    }
}

//// Constructors

pub fn expr_stmt(expr: Expression) -> Statement {
    Statement::Expression(ExpressionStatement { expr })
}

pub fn var_decl(code_type: CodeType, name: impl Into<String>, init: Expression) -> Statement {
    Statement::VariableDecl(VariableDeclStatement::new(code_type, name, Some(init)))
}

pub fn compound_decl(vars: Vec<VariableDeclStatement>) -> Statement {
    Statement::CompoundDecl(CompoundDeclStatement { vars })
}

pub fn condition(
    test: Expression,
    true_statements: Vec<Statement>,
    false_statements: Vec<Statement>,
) -> Statement {
    Statement::Condition(ConditionStatement {
        test,
        true_statements,
        false_statements,
    })
}

pub fn iteration(
    init: Option<Statement>,
    test: Expression,
    increment: Option<Statement>,
    statements: Vec<Statement>,
) -> Statement {
    Statement::Iteration(IterationStatement {
        init: init.map(Box::new),
        test,
        increment: increment.map(Box::new),
        statements,
    })
}

pub fn return_stmt(expr: Expression) -> Statement {
    Statement::Return(ReturnStatement { expr: Some(expr) })
}

pub fn comment(value: impl Into<String>) -> Statement {
    Statement::Comment(CommentStatement { value: value.into() })
}
