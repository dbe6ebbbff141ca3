//! CodeDOM
//!
//! Typed intermediate representation between the template walk and the emitters.

pub mod expression;
pub mod member;
pub mod statement;
pub mod types;
pub mod utility;

pub use expression::{BinaryOperator, Expression, Primitive, UnaryOperator};
pub use member::{Constructor, Field, IdentAllocator, IdentifierScope, Member, Method, Parameter, TypeDeclaration};
pub use statement::Statement;
pub use types::{AccessModifier, CodeType, SemanticType};
