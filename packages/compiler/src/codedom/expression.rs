//! CodeDOM Expressions
//!
//! Every expression reports a static result type and carries a flag recording
//! whether the source wrapped it in parentheses.

use crate::codedom::types::CodeType;

//// Operators

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Assign,
    Add,
    AddAssign,
    Subtract,
    SubtractAssign,
    Multiply,
    MultiplyAssign,
    Divide,
    DivideAssign,
    Modulus,
    ModulusAssign,
    BitwiseAnd,
    BitwiseAndAssign,
    BitwiseOr,
    BitwiseOrAssign,
    BitwiseXor,
    BitwiseXorAssign,
    ShiftLeft,
    ShiftLeftAssign,
    ShiftRight,
    ShiftRightAssign,
    UShiftRight,
    UShiftRightAssign,
    BooleanAnd,
    BooleanOr,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    IdentityEquality,
    IdentityInequality,
    ValueEquality,
    ValueInequality,
}

impl BinaryOperator {
    /// The arithmetic operator behind a compound assignment.
    pub fn compound_base(&self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        match self {
            AddAssign => Some(Add),
            SubtractAssign => Some(Subtract),
            MultiplyAssign => Some(Multiply),
            DivideAssign => Some(Divide),
            ModulusAssign => Some(Modulus),
            BitwiseAndAssign => Some(BitwiseAnd),
            BitwiseOrAssign => Some(BitwiseOr),
            BitwiseXorAssign => Some(BitwiseXor),
            ShiftLeftAssign => Some(ShiftLeft),
            ShiftRightAssign => Some(ShiftRight),
            UShiftRightAssign => Some(UShiftRight),
            _ => None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        *self == BinaryOperator::Assign || self.compound_base().is_some()
    }

    pub fn is_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(
            self,
            LessThan
                | LessThanOrEqual
                | GreaterThan
                | GreaterThanOrEqual
                | IdentityEquality
                | IdentityInequality
                | ValueEquality
                | ValueInequality
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    LogicalNegation,
    BitwiseNegation,
    Negation,
    Positive,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOperator {
    pub fn is_post(&self) -> bool {
        matches!(self, UnaryOperator::PostIncrement | UnaryOperator::PostDecrement)
    }

    pub fn is_increment_or_decrement(&self) -> bool {
        matches!(
            self,
            UnaryOperator::PreIncrement
                | UnaryOperator::PreDecrement
                | UnaryOperator::PostIncrement
                | UnaryOperator::PostDecrement
        )
    }
}

//// Constants

/// A compile-time constant.
#[derive(Debug, Clone)]
pub enum Primitive {
    Null,
    /// The scripting sublanguage's `undefined`, distinct from null
    Undefined,
    Boolean(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl Primitive {
    /// Classifies a parsed number as the narrowest of int, long or double
    /// that represents it exactly.
    pub fn number(value: f64) -> Primitive {
        if value.is_finite() && value.fract() == 0.0 && !(value == 0.0 && value.is_sign_negative()) {
            if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
                return Primitive::Int(value as i32);
            }
            if value >= -9_223_372_036_854_775_808.0 && value < 9_223_372_036_854_775_808.0 {
                return Primitive::Long(value as i64);
            }
        }
        Primitive::Double(value)
    }

    pub fn code_type(&self) -> CodeType {
        match self {
            Primitive::Null | Primitive::Undefined => CodeType::Object,
            Primitive::Boolean(_) => CodeType::Boolean,
            Primitive::Char(_) => CodeType::Char,
            Primitive::Int(_) => CodeType::Int,
            Primitive::Long(_) => CodeType::Long,
            Primitive::Double(_) => CodeType::Double,
            Primitive::String(_) => CodeType::String,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Primitive::Int(v) => Some(*v as f64),
            Primitive::Long(v) => Some(*v as f64),
            Primitive::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as the sublanguage would stringify it.
    pub fn as_string(&self) -> String {
        match self {
            Primitive::Null => "null".to_string(),
            Primitive::Undefined => String::new(),
            Primitive::Boolean(v) => v.to_string(),
            Primitive::Char(v) => v.to_string(),
            Primitive::Int(v) => v.to_string(),
            Primitive::Long(v) => v.to_string(),
            Primitive::Double(v) => {
                if v.is_nan() {
                    "NaN".to_string()
                } else if v.is_infinite() {
                    if *v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
                } else {
                    v.to_string()
                }
            }
            Primitive::String(v) => v.clone(),
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::Null, Primitive::Null) => true,
            (Primitive::Undefined, Primitive::Undefined) => true,
            (Primitive::Boolean(a), Primitive::Boolean(b)) => a == b,
            (Primitive::Char(a), Primitive::Char(b)) => a == b,
            (Primitive::Int(a), Primitive::Int(b)) => a == b,
            (Primitive::Long(a), Primitive::Long(b)) => a == b,
            // NaN constants are structurally equal
            (Primitive::Double(a), Primitive::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Primitive::String(a), Primitive::String(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Boolean(value)
    }
}

impl From<i32> for Primitive {
    fn from(value: i32) -> Self {
        Primitive::Int(value)
    }
}

impl From<char> for Primitive {
    fn from(value: char) -> Self {
        Primitive::Char(value)
    }
}

///// Expressions

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Primitive(PrimitiveExpr),
    VariableRef(VariableRefExpr),
    PropertyRef(PropertyRefExpr),
    FieldRef(FieldRefExpr),
    This(ThisExpr),
    TypeRef(TypeRefExpr),
    Binary(BinaryOperatorExpr),
    Unary(UnaryOperatorExpr),
    Ternary(TernaryOperatorExpr),
    MethodInvoke(MethodInvokeExpr),
    ObjectCreate(ObjectCreateExpr),
    ArrayCreate(ArrayCreateExpr),
    Cast(CastExpr),
    /// Name resolved at render time from the ambient store
    ExtraRef(ExtraRefExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveExpr {
    pub value: Primitive,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRefExpr {
    pub name: String,
    pub code_type: CodeType,
    pub parens: bool,
}

/// Dynamic property access; the key may itself be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRefExpr {
    pub target: Box<Expression>,
    pub key: Box<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRefExpr {
    pub target: Box<Expression>,
    pub name: String,
    pub code_type: CodeType,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThisExpr {
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRefExpr {
    pub code_type: CodeType,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperatorExpr {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperatorExpr {
    pub operator: UnaryOperator,
    pub expr: Box<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryOperatorExpr {
    pub test: Box<Expression>,
    pub when_true: Box<Expression>,
    pub when_false: Box<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInvokeExpr {
    pub result_type: CodeType,
    pub target: Box<Expression>,
    pub method: String,
    pub args: Vec<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCreateExpr {
    pub type_name: String,
    pub args: Vec<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCreateExpr {
    pub element_type: CodeType,
    pub size: usize,
    pub initializers: Vec<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub code_type: CodeType,
    pub expr: Box<Expression>,
    pub parens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraRefExpr {
    pub name: String,
    pub parens: bool,
}

impl Expression {
    /// Static result type; unknown values are `Object`.
    pub fn result_type(&self) -> CodeType {
        match self {
            Expression::Primitive(e) => e.value.code_type(),
            Expression::VariableRef(e) => e.code_type.clone(),
            Expression::PropertyRef(_) | Expression::ExtraRef(_) => CodeType::Object,
            Expression::FieldRef(e) => e.code_type.clone(),
            Expression::This(_) => CodeType::Object,
            Expression::TypeRef(e) => e.code_type.clone(),
            Expression::Binary(e) => e.result_type(),
            Expression::Unary(e) => match e.operator {
                UnaryOperator::LogicalNegation => CodeType::Boolean,
                _ => CodeType::Number,
            },
            Expression::Ternary(e) => {
                let true_type = e.when_true.result_type();
                if true_type != CodeType::Object {
                    true_type
                } else {
                    e.when_false.result_type()
                }
            }
            Expression::MethodInvoke(e) => e.result_type.clone(),
            Expression::ObjectCreate(e) => CodeType::Named(e.type_name.clone()),
            Expression::ArrayCreate(_) => CodeType::List,
            Expression::Cast(e) => e.code_type.clone(),
        }
    }

    pub fn has_parens(&self) -> bool {
        match self {
            Expression::Primitive(e) => e.parens,
            Expression::VariableRef(e) => e.parens,
            Expression::PropertyRef(e) => e.parens,
            Expression::FieldRef(e) => e.parens,
            Expression::This(e) => e.parens,
            Expression::TypeRef(e) => e.parens,
            Expression::Binary(e) => e.parens,
            Expression::Unary(e) => e.parens,
            Expression::Ternary(e) => e.parens,
            Expression::MethodInvoke(e) => e.parens,
            Expression::ObjectCreate(e) => e.parens,
            Expression::ArrayCreate(e) => e.parens,
            Expression::Cast(e) => e.parens,
            Expression::ExtraRef(e) => e.parens,
        }
    }

    pub fn set_parens(&mut self, value: bool) {
        let parens = match self {
            Expression::Primitive(e) => &mut e.parens,
            Expression::VariableRef(e) => &mut e.parens,
            Expression::PropertyRef(e) => &mut e.parens,
            Expression::FieldRef(e) => &mut e.parens,
            Expression::This(e) => &mut e.parens,
            Expression::TypeRef(e) => &mut e.parens,
            Expression::Binary(e) => &mut e.parens,
            Expression::Unary(e) => &mut e.parens,
            Expression::Ternary(e) => &mut e.parens,
            Expression::MethodInvoke(e) => &mut e.parens,
            Expression::ObjectCreate(e) => &mut e.parens,
            Expression::ArrayCreate(e) => &mut e.parens,
            Expression::Cast(e) => &mut e.parens,
            Expression::ExtraRef(e) => &mut e.parens,
        };
        *parens = value;
    }

    pub fn with_parens(mut self) -> Expression {
        self.set_parens(true);
        self
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Expression::Primitive(e) => Some(&e.value),
            _ => None,
        }
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self.as_primitive(), Some(Primitive::Null) | Some(Primitive::Undefined))
    }
}

impl BinaryOperatorExpr {
    pub fn result_type(&self) -> CodeType {
        use BinaryOperator::*;
        match self.operator {
            Add => {
                if self.left.result_type().is_string() || self.right.result_type().is_string() {
                    CodeType::String
                } else {
                    CodeType::Number
                }
            }
            BooleanAnd | BooleanOr => {
                if self.left.result_type().is_boolean() && self.right.result_type().is_boolean() {
                    CodeType::Boolean
                } else {
                    CodeType::Object
                }
            }
            Assign => {
                let left = self.left.result_type();
                if left != CodeType::Object {
                    left
                } else {
                    self.right.result_type()
                }
            }
            op if op.is_comparison() => CodeType::Boolean,
            _ => CodeType::Number,
        }
    }
}

//// Constructors

pub fn primitive(value: impl Into<Primitive>) -> Expression {
    Expression::Primitive(PrimitiveExpr {
        value: value.into(),
        parens: false,
    })
}

pub fn null_expr() -> Expression {
    Expression::Primitive(PrimitiveExpr {
        value: Primitive::Null,
        parens: false,
    })
}

pub fn undefined_expr() -> Expression {
    Expression::Primitive(PrimitiveExpr {
        value: Primitive::Undefined,
        parens: false,
    })
}

pub fn number(value: f64) -> Expression {
    Expression::Primitive(PrimitiveExpr {
        value: Primitive::number(value),
        parens: false,
    })
}

pub fn variable(code_type: CodeType, name: impl Into<String>) -> Expression {
    Expression::VariableRef(VariableRefExpr {
        name: name.into(),
        code_type,
        parens: false,
    })
}

/// The render context parameter shared by every generated method.
pub fn context_ref() -> Expression {
    variable(CodeType::Context, "context")
}

pub fn property(target: Expression, key: Expression) -> Expression {
    Expression::PropertyRef(PropertyRefExpr {
        target: Box::new(target),
        key: Box::new(key),
        parens: false,
    })
}

pub fn field_ref(target: Expression, name: impl Into<String>, code_type: CodeType) -> Expression {
    Expression::FieldRef(FieldRefExpr {
        target: Box::new(target),
        name: name.into(),
        code_type,
        parens: false,
    })
}

pub fn this_ref() -> Expression {
    Expression::This(ThisExpr { parens: false })
}

pub fn type_ref(code_type: CodeType) -> Expression {
    Expression::TypeRef(TypeRefExpr {
        code_type,
        parens: false,
    })
}

pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryOperatorExpr {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        parens: false,
    })
}

pub fn unary(operator: UnaryOperator, expr: Expression) -> Expression {
    Expression::Unary(UnaryOperatorExpr {
        operator,
        expr: Box::new(expr),
        parens: false,
    })
}

pub fn ternary(test: Expression, when_true: Expression, when_false: Expression) -> Expression {
    Expression::Ternary(TernaryOperatorExpr {
        test: Box::new(test),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
        parens: false,
    })
}

pub fn invoke(
    result_type: CodeType,
    target: Expression,
    method: impl Into<String>,
    args: Vec<Expression>,
) -> Expression {
    Expression::MethodInvoke(MethodInvokeExpr {
        result_type,
        target: Box::new(target),
        method: method.into(),
        args,
        parens: false,
    })
}

/// Invokes an inherited helper on the current view.
pub fn invoke_this(result_type: CodeType, method: impl Into<String>, args: Vec<Expression>) -> Expression {
    invoke(result_type, this_ref(), method, args)
}

pub fn object_create(type_name: impl Into<String>, args: Vec<Expression>) -> Expression {
    Expression::ObjectCreate(ObjectCreateExpr {
        type_name: type_name.into(),
        args,
        parens: false,
    })
}

pub fn array_create(element_type: CodeType, size: usize, initializers: Vec<Expression>) -> Expression {
    Expression::ArrayCreate(ArrayCreateExpr {
        element_type,
        size,
        initializers,
        parens: false,
    })
}

pub fn cast(code_type: CodeType, expr: Expression) -> Expression {
    Expression::Cast(CastExpr {
        code_type,
        expr: Box::new(expr),
        parens: false,
    })
}

pub fn extra_ref(name: impl Into<String>) -> Expression {
    Expression::ExtraRef(ExtraRefExpr {
        name: name.into(),
        parens: false,
    })
}
