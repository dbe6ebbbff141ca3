//! Coercion and construction helpers shared by the translator and the view builder.

use crate::codedom::expression::*;
use crate::codedom::member::{Constructor, Member, Method, Parameter, TypeDeclaration};
use crate::codedom::statement::Statement;
use crate::codedom::types::{AccessModifier, CodeType};

/// Name of the runtime helper class hosting the coercions.
pub const DUEL_DATA: &str = "DuelData";

pub fn duel_data() -> Expression {
    type_ref(CodeType::named(DUEL_DATA))
}

fn coerce(result_type: CodeType, method: &str, expr: Expression) -> Expression {
    invoke(result_type, duel_data(), method, vec![expr])
}

pub fn ensure_boolean(expr: Expression) -> Expression {
    if expr.result_type().is_boolean() {
        return expr;
    }
    coerce(CodeType::Boolean, "coerceBoolean", expr)
}

pub fn ensure_number(expr: Expression) -> Expression {
    if expr.result_type().is_number() {
        return expr;
    }
    coerce(CodeType::Double, "coerceNumber", expr)
}

pub fn ensure_string(expr: Expression) -> Expression {
    if expr.result_type().is_string() {
        return expr;
    }
    coerce(CodeType::String, "coerceString", expr)
}

pub fn ensure_collection(expr: Expression) -> Expression {
    if expr.result_type() == CodeType::List {
        return expr;
    }
    coerce(CodeType::Collection, "coerceCollection", expr)
}

pub fn ensure_map(expr: Expression) -> Expression {
    if expr.result_type() == CodeType::Map {
        return expr;
    }
    coerce(CodeType::Map, "coerceMap", expr)
}

/// Coerces `expr` so it may be stored in a slot of `var_type`.
pub fn ensure_type(var_type: &CodeType, expr: Expression) -> Expression {
    if var_type.accepts(&expr.result_type()) {
        return expr;
    }
    if var_type.is_number() {
        ensure_number(expr)
    } else if var_type.is_string() {
        ensure_string(expr)
    } else if var_type.is_boolean() {
        ensure_boolean(expr)
    } else {
        expr
    }
}

/// Strict equality honoring the sublanguage's reference-or-value rules.
pub fn equal(a: Expression, b: Expression) -> Expression {
    invoke_this(CodeType::Boolean, "equal", vec![a, b])
}

pub fn not_equal(a: Expression, b: Expression) -> Expression {
    unary(UnaryOperator::LogicalNegation, equal(a, b))
}

/// Loose equality with implicit type coercion.
pub fn coerce_equal(a: Expression, b: Expression) -> Expression {
    invoke_this(CodeType::Boolean, "coerceEqual", vec![a, b])
}

pub fn coerce_not_equal(a: Expression, b: Expression) -> Expression {
    unary(UnaryOperator::LogicalNegation, coerce_equal(a, b))
}

/// `(assign = (left OP right))`
pub fn as_assignment(
    operator: BinaryOperator,
    assign: Expression,
    left: Expression,
    right: Expression,
) -> Expression {
    binary(
        BinaryOperator::Assign,
        assign,
        binary(operator, left, right).with_parens(),
    )
    .with_parens()
}

pub fn safe_pre_increment(target: Expression) -> Expression {
    let left = ensure_number(target.clone());
    as_assignment(BinaryOperator::Add, target, left, primitive(1))
}

pub fn safe_pre_decrement(target: Expression) -> Expression {
    let left = ensure_number(target.clone());
    as_assignment(BinaryOperator::Subtract, target, left, primitive(1))
}

/// Evaluates to the value before incrementing.
pub fn safe_post_increment(target: Expression) -> Expression {
    safe_post(BinaryOperator::Add, target)
}

pub fn safe_post_decrement(target: Expression) -> Expression {
    safe_post(BinaryOperator::Subtract, target)
}

fn safe_post(operator: BinaryOperator, target: Expression) -> Expression {
    let before = ensure_number(target.clone());
    let assign = as_assignment(operator, target.clone(), ensure_number(target), primitive(1));
    invoke_this(CodeType::Double, "echo", vec![before, assign])
}

/// The five parameters every control-block body method takes.
pub fn render_params() -> Vec<Parameter> {
    vec![
        Parameter::new(CodeType::Context, "context"),
        Parameter::new(CodeType::Object, "data"),
        Parameter::new(CodeType::Int, "index"),
        Parameter::new(CodeType::Int, "count"),
        Parameter::new(CodeType::String, "key"),
    ]
}

/// Extracts the returned expression of a five-parameter method whose body is a
/// single `return`. `None` when the method has any other shape.
pub fn inline_method(method: &Method) -> Option<Expression> {
    if method.parameters.len() != 5 || method.parameters[0].code_type != CodeType::Context {
        return None;
    }
    match method.statements.as_slice() {
        [Statement::Return(ret)] => ret.expr.clone(),
        _ => None,
    }
}

pub fn create_ctor(parameters: Vec<Parameter>) -> Constructor {
    let base_args = parameters.iter().map(Parameter::var_ref).collect();
    Constructor {
        access: AccessModifier::Public,
        parameters,
        base_args,
        statements: Vec::new(),
    }
}

/// A public view class with its no-arg and part-accepting constructors.
pub fn create_view_type(namespace: Option<String>, name: impl Into<String>) -> TypeDeclaration {
    let parts = Parameter {
        code_type: CodeType::Part,
        name: "parts".to_string(),
        var_args: true,
    };
    TypeDeclaration::new(AccessModifier::Public, namespace, name, CodeType::View).with_members([
        Member::Constructor(create_ctor(Vec::new())),
        Member::Constructor(create_ctor(vec![parts])),
    ])
}

pub fn create_part_type(name: impl Into<String>) -> TypeDeclaration {
    TypeDeclaration::new(AccessModifier::Private, None, name, CodeType::Part)
}
