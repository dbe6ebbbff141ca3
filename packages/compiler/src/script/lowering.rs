//! Operator lowering
//!
//! Rewrites the sublanguage's dynamically typed operators into typed
//! expressions the managed runtime can evaluate directly. Each rule keys off
//! the static result types of the operands.

use crate::codedom::expression::*;
use crate::codedom::utility::*;
use crate::codedom::CodeType;

/// Targets that cannot be natively read-modify-written.
fn needs_rewrite(target: &Expression) -> bool {
    matches!(target, Expression::PropertyRef(_) | Expression::ExtraRef(_))
        || !target.result_type().is_number()
}

fn concatenates(expr: &Expression) -> bool {
    expr.result_type().to_primitive().is_string()
}

pub fn lower_binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    use BinaryOperator::*;

    match operator {
        IdentityEquality | IdentityInequality => {
            if left.is_null_or_undefined() || right.is_null_or_undefined() {
                binary(operator, left, right)
            } else if operator == IdentityEquality {
                equal(left, right)
            } else {
                not_equal(left, right)
            }
        }
        ValueEquality => coerce_equal(left, right),
        ValueInequality => coerce_not_equal(left, right),
        Add => {
            if concatenates(&left) || concatenates(&right) {
                binary(Add, ensure_string(left), ensure_string(right))
            } else {
                binary(Add, ensure_number(left), ensure_number(right))
            }
        }
        AddAssign => {
            let (read, value) = if concatenates(&left) {
                (ensure_string(left.clone()), ensure_string(right))
            } else {
                (ensure_number(left.clone()), ensure_number(right))
            };
            as_assignment(Add, left, read, value)
        }
        Assign => {
            let right = ensure_type(&left.result_type(), right);
            binary(Assign, left, right)
        }
        BooleanAnd | BooleanOr => {
            if left.result_type().is_boolean() && right.result_type().is_boolean() {
                return binary(operator, left, right);
            }
            // short-circuit on truthiness and yield the deciding operand
            let helper = if operator == BooleanAnd { "LogicalAND" } else { "LogicalOR" };
            invoke_this(CodeType::Object, helper, vec![left, right])
        }
        _ => match operator.compound_base() {
            Some(base) if needs_rewrite(&left) => {
                let read = ensure_number(left.clone());
                as_assignment(base, left, read, ensure_number(right))
            }
            Some(_) => {
                let right = ensure_type(&left.result_type(), right);
                binary(operator, left, right)
            }
            None => binary(operator, ensure_number(left), ensure_number(right)),
        },
    }
}

pub fn lower_unary(operator: UnaryOperator, expr: Expression) -> Expression {
    use UnaryOperator::*;

    let numeric = expr.result_type().is_number();
    match operator {
        LogicalNegation => unary(operator, ensure_boolean(expr)),
        BitwiseNegation | Negation | Positive => unary(operator, ensure_number(expr)),
        _ if numeric => unary(operator, expr),
        PreIncrement => safe_pre_increment(expr),
        PreDecrement => safe_pre_decrement(expr),
        PostIncrement => safe_post_increment(expr),
        PostDecrement => safe_post_decrement(expr),
    }
}

pub fn lower_ternary(test: Expression, when_true: Expression, when_false: Expression) -> Expression {
    ternary(ensure_boolean(test), when_true, when_false)
}
