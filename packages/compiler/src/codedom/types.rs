//! CodeDOM Types
//!
//! Concrete types carried by expressions and declarations, and the coarse
//! semantic type that drives coercion decisions.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessModifier {
    Private,
    Protected,
    Public,
}

/// What the scripting sublanguage can observe about a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Object,
    Number,
    String,
    Boolean,
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeType {
    Void,
    Object,
    Boolean,
    Char,
    Int,
    Long,
    Double,
    Number,
    String,
    Class,
    Collection,
    Iterator,
    MapEntry,
    Map,
    List,
    /// Runtime render context
    Context,
    /// Base type of compiled views
    View,
    /// Base type of compiled view parts
    Part,
    IoException,
    /// Runtime helper or generated type referenced by name
    Named(String),
}

impl CodeType {
    pub fn named(name: impl Into<String>) -> CodeType {
        CodeType::Named(name.into())
    }

    pub fn semantic(&self) -> SemanticType {
        match self {
            CodeType::Void => SemanticType::Void,
            CodeType::Boolean => SemanticType::Boolean,
            CodeType::Int | CodeType::Long | CodeType::Double | CodeType::Number => SemanticType::Number,
            CodeType::Char | CodeType::String => SemanticType::String,
            _ => SemanticType::Object,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.semantic() == SemanticType::Boolean
    }

    pub fn is_number(&self) -> bool {
        self.semantic() == SemanticType::Number
    }

    pub fn is_string(&self) -> bool {
        self.semantic() == SemanticType::String
    }

    /// Unboxed scalar types of the managed runtime
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            CodeType::Boolean | CodeType::Char | CodeType::Int | CodeType::Long | CodeType::Double
        )
    }

    /// Whether a value of `value` may be stored in a slot of this type without coercion.
    pub fn accepts(&self, value: &CodeType) -> bool {
        match self {
            CodeType::Object => true,
            CodeType::Number => value.is_number(),
            CodeType::Collection => matches!(value, CodeType::Collection | CodeType::List),
            _ => self == value,
        }
    }

    /// Simplified ToPrimitive: scalars, numbers and booleans stay, everything else becomes a string.
    pub fn to_primitive(&self) -> CodeType {
        if self.is_scalar() || self.is_number() || self.is_boolean() {
            self.clone()
        } else {
            CodeType::String
        }
    }
}
