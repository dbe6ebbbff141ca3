//! Server Code Generator
//!
//! Renders view classes as Java source. Dynamic property access has no
//! native spelling in the target, so property and extra references collapse
//! into accessor helpers inherited from the runtime view base class.

use std::collections::HashMap;
use std::fmt::Write;

use super::builder::CodeDomBuilder;
use super::CodeGenerator;
use crate::ast::ViewCommand;
use crate::codedom::expression::*;
use crate::codedom::statement::*;
use crate::codedom::utility::{coerce_equal, coerce_not_equal, ensure_boolean, equal, not_equal};
use crate::codedom::{AccessModifier, CodeType, Constructor, Field, Member, Method, Parameter, TypeDeclaration};
use crate::config::CodeGenSettings;
use crate::error::Result;

/// Package of the runtime the generated classes extend.
const RUNTIME_PACKAGE: &str = "org.duelengine.duel";

lazy_static::lazy_static! {
    static ref BINARY_OPERATORS: HashMap<BinaryOperator, &'static str> = {
        let mut m = HashMap::new();
        m.insert(BinaryOperator::Assign, " = ");
        m.insert(BinaryOperator::Add, " + ");
        m.insert(BinaryOperator::AddAssign, " += ");
        m.insert(BinaryOperator::Subtract, " - ");
        m.insert(BinaryOperator::SubtractAssign, " -= ");
        m.insert(BinaryOperator::Multiply, " * ");
        m.insert(BinaryOperator::MultiplyAssign, " *= ");
        m.insert(BinaryOperator::Divide, " / ");
        m.insert(BinaryOperator::DivideAssign, " /= ");
        m.insert(BinaryOperator::Modulus, " % ");
        m.insert(BinaryOperator::ModulusAssign, " %= ");
        m.insert(BinaryOperator::BitwiseAnd, " & ");
        m.insert(BinaryOperator::BitwiseAndAssign, " &= ");
        m.insert(BinaryOperator::BitwiseOr, " | ");
        m.insert(BinaryOperator::BitwiseOrAssign, " |= ");
        m.insert(BinaryOperator::BitwiseXor, " ^ ");
        m.insert(BinaryOperator::BitwiseXorAssign, " ^= ");
        m.insert(BinaryOperator::ShiftLeft, " << ");
        m.insert(BinaryOperator::ShiftLeftAssign, " <<= ");
        m.insert(BinaryOperator::ShiftRight, " >> ");
        m.insert(BinaryOperator::ShiftRightAssign, " >>= ");
        m.insert(BinaryOperator::UShiftRight, " >>> ");
        m.insert(BinaryOperator::UShiftRightAssign, " >>>= ");
        m.insert(BinaryOperator::BooleanAnd, " && ");
        m.insert(BinaryOperator::BooleanOr, " || ");
        m.insert(BinaryOperator::LessThan, " < ");
        m.insert(BinaryOperator::LessThanOrEqual, " <= ");
        m.insert(BinaryOperator::GreaterThan, " > ");
        m.insert(BinaryOperator::GreaterThanOrEqual, " >= ");
        m.insert(BinaryOperator::IdentityEquality, " == ");
        m.insert(BinaryOperator::IdentityInequality, " != ");
        m
    };

    static ref UNARY_OPERATORS: HashMap<UnaryOperator, &'static str> = {
        let mut m = HashMap::new();
        m.insert(UnaryOperator::LogicalNegation, "!");
        m.insert(UnaryOperator::BitwiseNegation, "~");
        m.insert(UnaryOperator::Negation, "-");
        m.insert(UnaryOperator::Positive, "+");
        m.insert(UnaryOperator::PreIncrement, "++");
        m.insert(UnaryOperator::PreDecrement, "--");
        m.insert(UnaryOperator::PostIncrement, "++");
        m.insert(UnaryOperator::PostDecrement, "--");
        m
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parens {
    /// Follow the expression's own flag
    Auto,
    Force,
    Suppress,
}

/// Emits Java classes. Holds no mutable state, so one instance may serve
/// any number of outputs.
#[derive(Debug, Clone, Default)]
pub struct ServerCodeGen {
    settings: CodeGenSettings,
}

impl CodeGenerator for ServerCodeGen {
    fn file_extension(&self) -> &str {
        ".java"
    }

    fn write(&self, output: &mut String, views: &[ViewCommand]) -> Result<()> {
        let mut imports_written = false;
        for view in views {
            if view.client_only {
                tracing::warn!("Skipping client-only view {}", view.name);
                continue;
            }

            let view_type = CodeDomBuilder::new(self.settings.clone()).build_view(view)?;
            if imports_written {
                self.writeln(output, 0);
            } else {
                self.write_package(output, view_type.namespace.as_deref());
                imports_written = true;
            }

            self.write_type_declaration(output, &view_type, 0);
            self.writeln(output, 0);
            tracing::debug!("Emitted server view {}", view_type.full_name());
        }
        Ok(())
    }
}

impl ServerCodeGen {
    pub fn new(settings: CodeGenSettings) -> Self {
        ServerCodeGen { settings }
    }

    /// Writes a complete compilation unit for an already built class.
    pub fn write_type(&self, output: &mut String, view_type: &TypeDeclaration) {
        self.write_package(output, view_type.namespace.as_deref());
        self.write_type_declaration(output, view_type, 0);
        self.writeln(output, 0);
    }

    pub fn write_statement_code(&self, output: &mut String, statement: &Statement) {
        self.write_statement(output, statement, 0, false);
    }

    pub fn write_expression_code(&self, output: &mut String, expr: &Expression) {
        self.write_expression(output, expr, Parens::Auto);
    }

    fn write_package(&self, output: &mut String, namespace: Option<&str>) {
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            let _ = write!(output, "package {};", ns);
            self.writelns(output, 0, 2);
        }

        output.push_str("import java.io.*;");
        self.writeln(output, 0);
        output.push_str("import java.util.*;");
        self.writeln(output, 0);
        output.push_str("import java.util.Map.Entry;");
        self.writeln(output, 0);
        let _ = write!(output, "import {}.*;", RUNTIME_PACKAGE);
        self.writelns(output, 0, 2);
    }

    ///// Members

    fn write_type_declaration(&self, output: &mut String, view_type: &TypeDeclaration, depth: usize) {
        write_access(output, view_type.access);
        let _ = write!(output, "class {}", view_type.name);
        if view_type.base_type != CodeType::Object {
            output.push_str(" extends ");
            output.push_str(&type_name(&view_type.base_type));
        }
        output.push_str(" {");

        for member in &view_type.members {
            self.writelns(output, depth + 1, 2);
            self.write_member(output, &view_type.name, member, depth + 1);
        }

        self.writeln(output, depth);
        output.push('}');
    }

    fn write_member(&self, output: &mut String, class_name: &str, member: &Member, depth: usize) {
        match member {
            Member::Constructor(ctor) => self.write_constructor(output, ctor, class_name, depth),
            Member::Method(method) => self.write_method(output, method, depth),
            Member::Field(field) => write_field(output, field),
            Member::Type(nested) => self.write_type_declaration(output, nested, depth),
        }
    }

    fn write_constructor(&self, output: &mut String, ctor: &Constructor, class_name: &str, depth: usize) {
        write_access(output, ctor.access);
        output.push_str(class_name);
        write_parameters(output, &ctor.parameters);
        output.push_str(" {");

        if !ctor.base_args.is_empty() {
            self.writeln(output, depth + 1);
            output.push_str("super(");
            self.write_args(output, &ctor.base_args, Parens::Auto);
            output.push_str(");");
        }
        for statement in &ctor.statements {
            self.write_statement(output, statement, depth + 1, false);
        }

        self.writeln(output, depth);
        output.push('}');
    }

    fn write_method(&self, output: &mut String, method: &Method, depth: usize) {
        if method.overrides {
            output.push_str("@Override");
            self.writeln(output, depth);
        }
        write_access(output, method.access);
        let _ = write!(output, "{} {}", type_name(&method.return_type), method.name);
        write_parameters(output, &method.parameters);

        for (i, exception) in method.throws.iter().enumerate() {
            output.push_str(if i == 0 { " throws " } else { ", " });
            output.push_str(&type_name(exception));
        }

        output.push_str(" {");
        for statement in &method.statements {
            self.write_statement(output, statement, depth + 1, false);
        }
        self.writeln(output, depth);
        output.push('}');
    }

    ///// Statements

    fn write_statement(&self, output: &mut String, statement: &Statement, depth: usize, inline: bool) {
        if !inline {
            self.writeln(output, depth);
        }

        let needs_semicolon = match statement {
            Statement::Expression(stmt) => {
                self.write_expression(output, &stmt.expr, Parens::Suppress);
                true
            }
            Statement::VariableDecl(decl) => {
                output.push_str(&type_name(&decl.code_type));
                output.push(' ');
                self.write_declarator(output, decl, inline);
                true
            }
            Statement::CompoundDecl(compound) => self.write_compound_decl(output, compound, depth, inline),
            Statement::Condition(stmt) => {
                self.write_condition(output, stmt, depth);
                false
            }
            Statement::Iteration(stmt) => {
                self.write_iteration(output, stmt, depth);
                false
            }
            Statement::Return(stmt) => {
                output.push_str("return");
                if let Some(expr) = &stmt.expr {
                    output.push(' ');
                    self.write_expression(output, expr, Parens::Auto);
                }
                true
            }
            Statement::Comment(stmt) => {
                // a nested terminator would end the comment early
                let _ = write!(output, "/*{}*/", stmt.value.replace("*/", "*\\/"));
                false
            }
        };

        if needs_semicolon && !inline {
            output.push(';');
        }
    }

    fn write_declarator(&self, output: &mut String, decl: &VariableDeclStatement, inline: bool) {
        output.push_str(&decl.name);
        if let Some(init) = &decl.init {
            output.push_str(if inline { "=" } else { " = " });
            self.write_expression(output, init, Parens::Auto);
        }
    }

    fn write_compound_decl(
        &self,
        output: &mut String,
        compound: &CompoundDeclStatement,
        depth: usize,
        inline: bool,
    ) -> bool {
        let first = match compound.vars.first() {
            Some(first) => first,
            None => return false,
        };

        output.push_str(&type_name(&first.code_type));
        output.push(' ');
        for (i, decl) in compound.vars.iter().enumerate() {
            if i > 0 {
                output.push(',');
                if inline {
                    output.push(' ');
                } else {
                    self.writeln(output, depth + 1);
                }
            }
            self.write_declarator(output, decl, inline);
        }
        true
    }

    fn write_condition(&self, output: &mut String, stmt: &ConditionStatement, depth: usize) {
        output.push_str("if (");
        self.write_expression(output, &ensure_boolean(stmt.test.clone()), Parens::Suppress);
        output.push_str(") {");
        for statement in &stmt.true_statements {
            self.write_statement(output, statement, depth + 1, false);
        }
        self.writeln(output, depth);
        output.push('}');

        match stmt.false_statements.as_slice() {
            [] => {}
            [Statement::Condition(nested)] => {
                output.push_str(" else ");
                self.write_condition(output, nested, depth);
            }
            statements => {
                output.push_str(" else {");
                for statement in statements {
                    self.write_statement(output, statement, depth + 1, false);
                }
                self.writeln(output, depth);
                output.push('}');
            }
        }
    }

    fn write_iteration(&self, output: &mut String, stmt: &IterationStatement, depth: usize) {
        output.push_str("for (");
        if let Some(init) = &stmt.init {
            self.write_statement(output, init, depth, true);
        }
        output.push_str("; ");
        self.write_expression(output, &ensure_boolean(stmt.test.clone()), Parens::Auto);
        output.push_str("; ");
        if let Some(increment) = &stmt.increment {
            self.write_statement(output, increment, depth, true);
        }
        output.push_str(") {");

        for statement in &stmt.statements {
            self.write_statement(output, statement, depth + 1, false);
        }
        self.writeln(output, depth);
        output.push('}');
    }

    ///// Expressions

    fn write_expression(&self, output: &mut String, expr: &Expression, parens: Parens) {
        let needs_parens = match parens {
            Parens::Force => true,
            Parens::Suppress => false,
            Parens::Auto => expr.has_parens(),
        };

        match expr {
            Expression::Primitive(e) => self.write_primitive(output, &e.value),
            Expression::VariableRef(e) => output.push_str(&e.name),
            Expression::PropertyRef(e) => {
                let getter = invoke_this(
                    CodeType::Object,
                    "getProperty",
                    vec![(*e.target).clone(), (*e.key).clone()],
                );
                self.write_expression(output, &getter, Parens::Auto);
            }
            Expression::FieldRef(e) => {
                self.write_expression(output, &e.target, Parens::Auto);
                output.push('.');
                output.push_str(&e.name);
            }
            Expression::This(_) => output.push_str("this"),
            Expression::TypeRef(e) => output.push_str(&type_name(&e.code_type)),
            Expression::Binary(e) => {
                wrap(output, needs_parens, |output| self.write_binary(output, e));
            }
            Expression::Unary(e) => {
                wrap(output, needs_parens, |output| self.write_unary(output, e));
            }
            Expression::Ternary(e) => wrap(output, needs_parens, |output| {
                self.write_expression(output, &ensure_boolean((*e.test).clone()), Parens::Auto);
                output.push_str(" ? ");
                self.write_expression(output, &e.when_true, Parens::Auto);
                output.push_str(" : ");
                self.write_expression(output, &e.when_false, Parens::Auto);
            }),
            Expression::MethodInvoke(e) => {
                self.write_expression(output, &e.target, Parens::Auto);
                let _ = write!(output, ".{}(", e.method);
                self.write_args(output, &e.args, Parens::Auto);
                output.push(')');
            }
            Expression::ObjectCreate(e) => {
                let _ = write!(output, "new {}(", e.type_name);
                self.write_args(output, &e.args, Parens::Auto);
                output.push(')');
            }
            Expression::ArrayCreate(e) => self.write_array_create(output, e),
            Expression::Cast(e) => wrap(output, needs_parens, |output| {
                let _ = write!(output, "({})", type_name(&e.code_type));
                self.write_expression(output, &e.expr, Parens::Force);
            }),
            Expression::ExtraRef(e) => {
                let lookup = invoke_this(
                    CodeType::Object,
                    "getExtra",
                    vec![context_ref(), primitive(e.name.as_str())],
                );
                self.write_expression(output, &lookup, Parens::Auto);
            }
        }
    }

    /// A lone argument never needs its own parentheses.
    fn write_args(&self, output: &mut String, args: &[Expression], parens: Parens) {
        let parens = if args.len() == 1 { Parens::Suppress } else { parens };
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                output.push_str(", ");
            }
            self.write_expression(output, arg, parens);
        }
    }

    fn write_binary(&self, output: &mut String, e: &BinaryOperatorExpr) {
        let left = &*e.left;
        let right = &*e.right;

        // hand-built trees may still carry the dynamic comparisons
        let rewritten = match e.operator {
            BinaryOperator::IdentityEquality if !left.is_null_or_undefined() && !right.is_null_or_undefined() => {
                Some(equal(left.clone(), right.clone()))
            }
            BinaryOperator::IdentityInequality
                if !left.is_null_or_undefined() && !right.is_null_or_undefined() =>
            {
                Some(not_equal(left.clone(), right.clone()))
            }
            BinaryOperator::ValueEquality => Some(coerce_equal(left.clone(), right.clone())),
            BinaryOperator::ValueInequality => Some(coerce_not_equal(left.clone(), right.clone())),
            _ => None,
        };
        if let Some(rewritten) = rewritten {
            self.write_expression(output, &rewritten, Parens::Auto);
            return;
        }

        if e.operator.is_assignment() {
            let setter = match left {
                Expression::PropertyRef(target) => Some(invoke_this(
                    e.result_type(),
                    "setProperty",
                    vec![(*target.target).clone(), (*target.key).clone(), right.clone()],
                )),
                Expression::ExtraRef(extra) => Some(invoke_this(
                    e.result_type(),
                    "putExtra",
                    vec![context_ref(), primitive(extra.name.as_str()), right.clone()],
                )),
                _ => None,
            };
            if let Some(setter) = setter {
                self.write_expression(output, &setter, Parens::Auto);
                return;
            }
        }

        self.write_expression(output, left, Parens::Auto);
        if let Some(op) = BINARY_OPERATORS.get(&e.operator) {
            output.push_str(op);
        }
        self.write_expression(output, right, Parens::Auto);
    }

    fn write_unary(&self, output: &mut String, e: &UnaryOperatorExpr) {
        let op = UNARY_OPERATORS.get(&e.operator).copied().unwrap_or_default();
        if e.operator.is_post() {
            self.write_expression(output, &e.expr, Parens::Auto);
            output.push_str(op);
        } else {
            output.push_str(op);
            let mut operand = String::new();
            self.write_expression(&mut operand, &e.expr, Parens::Auto);
            // `- -x` must not fuse into a decrement
            if op.ends_with(&['-', '+'][..]) && operand.starts_with(&['-', '+'][..]) {
                output.push(' ');
            }
            output.push_str(&operand);
        }
    }

    fn write_array_create(&self, output: &mut String, e: &ArrayCreateExpr) {
        if e.initializers.is_empty() {
            let _ = write!(output, "new ArrayList<{}>(", boxed_type_name(&e.element_type));
            if e.size > 0 {
                let _ = write!(output, "{}", e.size);
            }
            output.push(')');
            return;
        }

        output.push_str("Arrays.asList(");
        self.write_args(output, &e.initializers, Parens::Auto);
        output.push(')');
    }

    fn write_primitive(&self, output: &mut String, value: &Primitive) {
        match value {
            Primitive::Null => output.push_str("null"),
            Primitive::Undefined => output.push_str("JSUtility.UNDEFINED"),
            Primitive::Boolean(b) => output.push_str(if *b { "true" } else { "false" }),
            Primitive::Char(ch) => self.write_char(output, *ch),
            Primitive::Int(n) => {
                let _ = write!(output, "{}", n);
            }
            Primitive::Long(n) => {
                let _ = write!(output, "{}L", n);
            }
            Primitive::Double(n) => {
                if n.is_nan() {
                    output.push_str("Double.NaN");
                } else if n.is_infinite() {
                    output.push_str(if *n > 0.0 { "Double.POSITIVE_INFINITY" } else { "Double.NEGATIVE_INFINITY" });
                } else {
                    let _ = write!(output, "{:?}", n);
                }
            }
            Primitive::String(s) => self.write_string(output, s),
        }
    }

    fn write_char(&self, output: &mut String, ch: char) {
        let convert = self.settings.convert_line_endings;
        match ch {
            '\'' => output.push_str("'\\''"),
            '\\' => output.push_str("'\\\\'"),
            '\t' if convert && self.settings.indent != "\t" => self.write_string(output, &self.settings.indent),
            '\t' => output.push_str("'\\t'"),
            '\n' if convert && self.settings.newline != "\n" => self.write_string(output, &self.settings.newline),
            '\n' => output.push_str("'\\n'"),
            '\r' => output.push_str("'\\r'"),
            '\u{000C}' => output.push_str("'\\f'"),
            '\u{0008}' => output.push_str("'\\b'"),
            ' '..='\u{007E}' => {
                let _ = write!(output, "'{}'", ch);
            }
            _ => {
                // a supplementary char has no single-unit literal
                let mut units = [0u16; 2];
                match ch.encode_utf16(&mut units) {
                    [unit] => {
                        let _ = write!(output, "'\\u{:04X}'", unit);
                    }
                    _ => self.write_string(output, &ch.to_string()),
                }
            }
        }
    }

    fn write_string(&self, output: &mut String, value: &str) {
        let mut value = value.to_string();
        if self.settings.convert_line_endings {
            if self.settings.indent != "\t" {
                value = value.replace('\t', &self.settings.indent);
            }
            value = value.replace("\r\n", "\n").replace('\r', "\n");
            if self.settings.newline != "\n" {
                value = value.replace('\n', &self.settings.newline);
            }
        }

        output.push('"');
        for ch in value.chars() {
            match ch {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\t' => output.push_str("\\t"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\u{000C}' => output.push_str("\\f"),
                '\u{0008}' => output.push_str("\\b"),
                ' '..='\u{007E}' => output.push(ch),
                _ => {
                    let mut units = [0u16; 2];
                    for unit in ch.encode_utf16(&mut units) {
                        let _ = write!(output, "\\u{:04X}", unit);
                    }
                }
            }
        }
        output.push('"');
    }

    fn writeln(&self, output: &mut String, depth: usize) {
        self.writelns(output, depth, 1);
    }

    fn writelns(&self, output: &mut String, depth: usize, newlines: usize) {
        for _ in 0..newlines {
            output.push_str(&self.settings.newline);
        }
        for _ in 0..depth {
            output.push_str(&self.settings.indent);
        }
    }
}

fn wrap(output: &mut String, parens: bool, body: impl FnOnce(&mut String)) {
    if parens {
        output.push('(');
    }
    body(output);
    if parens {
        output.push(')');
    }
}

fn write_access(output: &mut String, access: AccessModifier) {
    output.push_str(match access {
        AccessModifier::Private => "private ",
        AccessModifier::Protected => "protected ",
        AccessModifier::Public => "public ",
    });
}

fn write_field(output: &mut String, field: &Field) {
    write_access(output, field.access);
    let _ = write!(output, "{} {};", type_name(&field.code_type), field.name);
}

fn write_parameters(output: &mut String, parameters: &[Parameter]) {
    output.push('(');
    for (i, param) in parameters.iter().enumerate() {
        if i > 0 {
            output.push_str(", ");
        }
        output.push_str(&type_name(&param.code_type));
        output.push_str(if param.var_args { "... " } else { " " });
        output.push_str(&param.name);
    }
    output.push(')');
}

/// Simple names suffice: every runtime package is imported.
fn type_name(code_type: &CodeType) -> String {
    match code_type {
        CodeType::Void => "void",
        CodeType::Object => "Object",
        CodeType::Boolean => "boolean",
        CodeType::Char => "char",
        CodeType::Int => "int",
        CodeType::Long => "long",
        CodeType::Double => "double",
        CodeType::Number => "Number",
        CodeType::String => "String",
        CodeType::Class => "Class",
        CodeType::Collection => "Collection",
        CodeType::Iterator => "Iterator",
        CodeType::MapEntry => "Entry",
        CodeType::Map => "Map",
        CodeType::List => "List",
        CodeType::Context => "DuelContext",
        CodeType::View => "DuelView",
        CodeType::Part => "DuelPart",
        CodeType::IoException => "IOException",
        CodeType::Named(name) => return name.clone(),
    }
    .to_string()
}

/// Generic arguments cannot be scalars.
fn boxed_type_name(code_type: &CodeType) -> String {
    match code_type {
        CodeType::Boolean => "Boolean".to_string(),
        CodeType::Char => "Character".to_string(),
        CodeType::Int => "Integer".to_string(),
        CodeType::Long => "Long".to_string(),
        CodeType::Double => "Double".to_string(),
        other => type_name(other),
    }
}
