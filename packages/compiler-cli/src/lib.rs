#![deny(clippy::all)]

/**
 * DUEL Compiler CLI
 *
 * Batch front end compiling view tree files into client scripts and
 * server classes
 */
pub use duel_compiler as compiler;

pub mod main_entry;
pub mod options;
pub mod perform_compile;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
