//! Binding expression sublanguage
//!
//! Lexer, parser and the translator lowering fragments into CodeDOM.

pub mod ast;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod translator;

pub use lexer::{Lexer, Token, TokenType};
pub use parser::Parser;
pub use translator::{ScriptTranslator, TranslationResult};
