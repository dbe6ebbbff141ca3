#![deny(clippy::all)]

/**
 * DUEL view compiler
 *
 * Compiles view templates into a server-side class and a client-side
 * JavaScript view from a single source tree.
 */

// Core modules
pub mod chars;
pub mod config;
pub mod error;
pub mod parse_util;

// Input tree
pub mod ast;

// Intermediate representation
pub mod codedom;

// Binding expression sublanguage
pub mod script;

// Output generation
pub mod codegen;

// Re-exports
pub use config::CodeGenSettings;
pub use error::{CompilerError, Result};
pub use parse_util::SourcePosition;

pub use ast::{Node, ViewCommand};
pub use codegen::{ClientCodeGen, CodeDomBuilder, CodeGenerator, ServerCodeGen};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiles the views into server-side source.
pub fn compile_server(views: &[ViewCommand], settings: &CodeGenSettings) -> Result<String> {
    let mut output = String::new();
    ServerCodeGen::new(settings.clone()).write(&mut output, views)?;
    Ok(output)
}

/// Compiles the views into client-side source.
pub fn compile_client(views: &[ViewCommand], settings: &CodeGenSettings) -> Result<String> {
    let mut output = String::new();
    ClientCodeGen::new(settings.clone()).write(&mut output, views)?;
    Ok(output)
}
