//! Code generation
//!
//! The view builder lowers templates into CodeDOM; the server emitter renders
//! that as Java, while the client emitter works straight from the template.

pub mod builder;
pub mod client_codegen;
pub mod data_encoder;
pub mod html_formatter;
pub mod js_utility;
pub mod server_codegen;

pub use builder::CodeDomBuilder;
pub use client_codegen::ClientCodeGen;
pub use data_encoder::{DataEncoder, JsValue};
pub use html_formatter::HtmlFormatter;
pub use server_codegen::ServerCodeGen;

use crate::ast::ViewCommand;
use crate::error::Result;

/// A backend that turns compiled views into source text.
pub trait CodeGenerator {
    /// Extension of the files this backend produces, dot included.
    fn file_extension(&self) -> &str;

    fn write(&self, output: &mut String, views: &[ViewCommand]) -> Result<()>;
}
