/**
 * Binding Expression Translator
 *
 * Lowers a parsed fragment into CodeDOM members. The fragment is always the
 * client-side function wrapper of a code block; its body becomes a private
 * render-signature method on the view being built.
 */

use indexmap::IndexSet;

use super::ast::*;
use super::lowering::{lower_binary, lower_ternary, lower_unary};
use super::parser::Parser;
use crate::codedom::expression::*;
use crate::codedom::statement::*;
use crate::codedom::utility::*;
use crate::codedom::{AccessModifier, CodeType, IdentifierScope, Member, Method};
use crate::codegen::js_utility;
use crate::error::{CompilerError, Result};
use crate::parse_util::SourcePosition;

/// Largest length an array literal may request.
const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Members produced for one fragment plus what it needs from the ambient store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationResult {
    pub members: Vec<Member>,
    /// Names read from the ambient store, in first-use order
    pub extra_refs: IndexSet<String>,
    /// Whether the fragment writes to the ambient store
    pub extra_assign: bool,
}

impl TranslationResult {
    /// The translated body method.
    pub fn method(&self) -> Option<&Method> {
        self.members.first().and_then(Member::as_method)
    }

    pub fn has_extras(&self) -> bool {
        self.extra_assign || !self.extra_refs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameUse {
    Read,
    /// Direct left side of a plain `=`
    Assign,
    Declare,
}

pub struct ScriptTranslator<'a> {
    scope: &'a mut dyn IdentifierScope,
    parser: Parser,
    source: String,
    extra_refs: IndexSet<String>,
    extra_assign: bool,
}

impl<'a> ScriptTranslator<'a> {
    pub fn new(scope: &'a mut dyn IdentifierScope) -> Self {
        ScriptTranslator {
            scope,
            parser: Parser::new(),
            source: String::new(),
            extra_refs: IndexSet::new(),
            extra_assign: false,
        }
    }

    /// Translates function-wrapped fragment source. Errors are positioned
    /// relative to `source`.
    pub fn translate(&mut self, source: &str) -> Result<TranslationResult> {
        self.source = source.to_string();
        self.extra_refs = IndexSet::new();
        self.extra_assign = false;

        let program = self.parser.parse(source)?;

        let mut members = Vec::new();
        for stmt in &program {
            match &stmt.kind {
                StmtKind::Function(function) => {
                    members.push(Member::Method(self.visit_function(function)?));
                }
                StmtKind::Empty => {}
                _ => return Err(self.error("Unexpected member", stmt.index)),
            }
        }

        Ok(TranslationResult {
            members,
            extra_refs: std::mem::take(&mut self.extra_refs),
            extra_assign: self.extra_assign,
        })
    }

    fn error(&self, message: impl Into<String>, index: usize) -> CompilerError {
        CompilerError::translation(message, SourcePosition::locate(&self.source, index))
    }

    fn visit_function(&mut self, function: &Function) -> Result<Method> {
        // parameter names are fixed by the render signature
        let name = self.scope.next_ident("code_");

        let mut statements = Vec::new();
        for stmt in &function.body {
            self.visit_statement(stmt, &mut statements)?;
        }

        if !matches!(statements.last(), Some(Statement::Return(_))) {
            statements.push(return_stmt(undefined_expr()));
        }

        Ok(Method::new(AccessModifier::Private, CodeType::Object, name, render_params())
            .with_statements(statements))
    }

    fn visit_statement(&mut self, stmt: &Stmt, out: &mut Vec<Statement>) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for inner in stmts {
                    self.visit_statement(inner, out)?;
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.visit_expr(expr)?,
                    None => undefined_expr(),
                };
                out.push(return_stmt(value));
            }
            StmtKind::For { init, test, update, body } => {
                out.push(self.visit_for(init.as_deref(), test.as_ref(), update.as_ref(), body)?);
            }
            StmtKind::Function(function) => {
                return Err(self.error("Nested functions not yet supported.", function.index));
            }
            StmtKind::Expr(_) | StmtKind::Var(_) | StmtKind::Empty => {
                out.extend(self.visit_simple(stmt)?);
            }
        }
        Ok(())
    }

    /// Statements allowed in a loop header.
    fn visit_simple(&mut self, stmt: &Stmt) -> Result<Option<Statement>> {
        match &stmt.kind {
            StmtKind::Expr(expr) => Ok(Some(expr_stmt(self.visit_expr(expr)?))),
            StmtKind::Var(vars) => self.visit_var(vars, stmt.index).map(Some),
            StmtKind::Empty => Ok(None),
            _ => Err(self.error("Expected a statement", stmt.index)),
        }
    }

    fn visit_var(&mut self, vars: &[VarInit], index: usize) -> Result<Statement> {
        let mut decls = Vec::with_capacity(vars.len());
        for var in vars {
            let (code_type, name) = match self.visit_name(&var.name, NameUse::Declare) {
                Expression::VariableRef(var_ref) => (var_ref.code_type, var_ref.name),
                _ => return Err(self.error("Unexpected VAR type", var.index)),
            };
            let init = var.init.as_ref().map(|e| self.visit_expr(e)).transpose()?;
            decls.push(VariableDeclStatement::new(code_type, name, init));
        }

        match decls.len() {
            0 => Err(self.error("Unexpected VAR node", index)),
            1 => Ok(Statement::VariableDecl(decls.remove(0))),
            _ => Ok(compound_decl(decls)),
        }
    }

    fn visit_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<Statement> {
        let init = match init {
            Some(stmt) => self.visit_simple(stmt)?,
            None => None,
        };
        let test = match test {
            Some(expr) => self.visit_expr(expr)?,
            None => primitive(true),
        };
        let increment = match update {
            Some(expr) => Some(expr_stmt(self.visit_expr(expr)?)),
            None => None,
        };

        let mut statements = Vec::new();
        match &body.kind {
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.visit_statement(stmt, &mut statements)?;
                }
            }
            _ => return Err(self.error("Expected statement block", body.index)),
        }

        Ok(iteration(init, test, increment, statements))
    }

    fn visit_name(&mut self, ident: &str, usage: NameUse) -> Expression {
        if js_utility::is_global_ident(ident) {
            match ident {
                "undefined" => return undefined_expr(),
                "NaN" => return number(f64::NAN),
                "Infinity" => return number(f64::INFINITY),
                _ => {}
            }
        } else {
            match ident {
                "data" => return variable(CodeType::Object, ident),
                "index" | "count" => return variable(CodeType::Int, ident),
                "key" => return variable(CodeType::String, ident),
                _ if usage == NameUse::Declare || self.scope.is_local_ident(ident) => {
                    return variable(CodeType::Object, self.scope.unique_ident(ident));
                }
                _ => {}
            }
        }

        // pure assignments never need to check for existence first
        if usage == NameUse::Assign {
            self.extra_assign = true;
        } else {
            self.extra_refs.insert(ident.to_string());
        }
        extra_ref(ident)
    }

    fn visit_exprs(&mut self, exprs: &[Expr]) -> Result<Vec<Expression>> {
        exprs.iter().map(|e| self.visit_expr(e)).collect()
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expression> {
        match &expr.kind {
            ExprKind::Name(ident) => Ok(self.visit_name(ident, NameUse::Read)),
            ExprKind::Number(value) => Ok(number(*value)),
            ExprKind::String(value) => Ok(primitive(value.as_str())),
            ExprKind::Boolean(value) => Ok(primitive(*value)),
            ExprKind::Null => Ok(null_expr()),
            ExprKind::This => Err(self.error("'this' not legal in binding expressions", expr.index)),
            ExprKind::Parens(inner) => Ok(self.visit_expr(inner)?.with_parens()),
            ExprKind::Member { target, name } => {
                let target = self.visit_expr(target)?;
                Ok(property(target, primitive(name.as_str())))
            }
            ExprKind::Index { target, key } => {
                let target = self.visit_expr(target)?;
                let key = self.visit_expr(key)?;
                Ok(property(target, key))
            }
            ExprKind::Call { target, args } => self.visit_call(target, args),
            ExprKind::New { target, args } => self.visit_new(target, args, expr.index),
            ExprKind::Unary { operator, operand } => {
                let operand = self.visit_expr(operand)?;
                Ok(lower_unary(*operator, operand))
            }
            ExprKind::TypeOf(operand) => {
                let operand = self.visit_expr(operand)?;
                Ok(invoke(CodeType::String, duel_data(), "typeOf", vec![operand]))
            }
            ExprKind::Binary { operator, left, right } => {
                let left = match &left.kind {
                    ExprKind::Name(ident) if *operator == BinaryOperator::Assign => {
                        self.visit_name(ident, NameUse::Assign)
                    }
                    _ => self.visit_expr(left)?,
                };
                let right = self.visit_expr(right)?;
                Ok(lower_binary(*operator, left, right))
            }
            ExprKind::In { key, target } => {
                let key = self.visit_expr(key)?;
                let target = self.visit_expr(target)?;
                Ok(invoke(CodeType::Boolean, duel_data(), "containsKey", vec![target, key]))
            }
            ExprKind::InstanceOf { target, type_expr } => self.visit_instance_of(target, type_expr, expr.index),
            ExprKind::Conditional { test, when_true, when_false } => {
                let test = self.visit_expr(test)?;
                let when_true = self.visit_expr(when_true)?;
                let when_false = self.visit_expr(when_false)?;
                Ok(lower_ternary(test, when_true, when_false))
            }
            ExprKind::Comma(_) => Err(self.error("Token not yet supported (,)", expr.index)),
            ExprKind::Object(properties) => {
                let mut initializers = Vec::with_capacity(properties.len() * 2);
                for (key, value) in properties {
                    initializers.push(match key {
                        PropertyKey::Name(name) => primitive(name.as_str()),
                        PropertyKey::Literal(key) => self.visit_expr(key)?,
                    });
                    initializers.push(self.visit_expr(value)?);
                }
                Ok(invoke(CodeType::Map, duel_data(), "asMap", initializers))
            }
            ExprKind::Array(items) => Ok(array_create(CodeType::Object, 0, self.visit_exprs(items)?)),
            ExprKind::Function(function) => {
                Err(self.error("Nested functions not yet supported.", function.index))
            }
        }
    }

    fn visit_call(&mut self, target: &Expr, args: &[Expr]) -> Result<Expression> {
        let callee = self.visit_expr(target)?;
        let (object, method) = match callee {
            Expression::PropertyRef(prop) => match prop.key.as_primitive() {
                Some(key) => (*prop.target, key.as_string()),
                None => return Err(self.error("Unsupported function call", target.index)),
            },
            _ => return Err(self.error("Unsupported function call", target.index)),
        };

        let args = self.visit_exprs(args)?;
        translate_method_call(object, &method, args)
            .ok_or_else(|| self.error(format!("Unsupported function call ({})", method), target.index))
    }

    fn visit_new(&mut self, target: &Expr, args: &[Expr], index: usize) -> Result<Expression> {
        match &target.kind {
            ExprKind::Name(ident) if ident == "Array" => {}
            _ => return Err(self.error("Create object type not yet supported", index)),
        }

        // a single numeric argument is a length, not an element
        if let [arg] = args {
            if let Some(size) = literal_number(arg) {
                if size < 0.0 || size.fract() != 0.0 || size > MAX_ARRAY_LENGTH {
                    return Err(self.error(format!("Invalid array length ({})", size), arg.index));
                }
                return Ok(array_create(CodeType::Object, size as usize, Vec::new()));
            }
        }
        let args = self.visit_exprs(args)?;
        Ok(array_create(CodeType::Object, 0, args))
    }

    fn visit_instance_of(&mut self, target: &Expr, type_expr: &Expr, index: usize) -> Result<Expression> {
        let target = self.visit_expr(target)?;
        let type_name = match &type_expr.kind {
            ExprKind::Name(ident) => ident.as_str(),
            _ => return Err(self.error("Unexpected type expression", type_expr.index)),
        };

        let method = match type_name {
            "Array" => "isArray",
            "Date" => "isDate",
            other => {
                return Err(self.error(
                    format!(
                        "Translation for 'instanceof' token currently only supports Array and Date ({})",
                        other
                    ),
                    index,
                ))
            }
        };

        Ok(ternary(
            binary(BinaryOperator::IdentityEquality, target.clone(), null_expr()).with_parens(),
            primitive(false),
            invoke(
                CodeType::Boolean,
                duel_data(),
                method,
                vec![invoke(CodeType::Class, target, "getClass", Vec::new())],
            ),
        ))
    }
}

/// Built-in string methods with a native equivalent.
fn translate_method_call(target: Expression, method: &str, mut args: Vec<Expression>) -> Option<Expression> {
    match method {
        "toString" => Some(ensure_string(target)),
        "substring" => Some(invoke(CodeType::String, ensure_string(target), "substring", args)),
        "substr" => {
            // (start, length) becomes (start, start + length)
            if args.len() > 1 {
                let length = args.remove(1);
                let end = lower_binary(BinaryOperator::Add, args[0].clone(), length);
                args.insert(1, end);
            }
            Some(invoke(CodeType::String, ensure_string(target), "substring", args))
        }
        _ => None,
    }
}

/// The value of a numeric literal, allowing a leading sign.
fn literal_number(expr: &Expr) -> Option<f64> {
    match &expr.kind {
        ExprKind::Number(value) => Some(*value),
        ExprKind::Parens(inner) => literal_number(inner),
        ExprKind::Unary { operator: UnaryOperator::Negation, operand } => literal_number(operand).map(|v| -v),
        ExprKind::Unary { operator: UnaryOperator::Positive, operand } => literal_number(operand),
        _ => None,
    }
}
