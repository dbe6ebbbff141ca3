//! Perform Compile
//!
//! Compiles one view tree file into its client script and server classes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use duel_compiler::{ClientCodeGen, CodeGenSettings, CodeGenerator, CompilerError, ServerCodeGen, ViewCommand};
use thiserror::Error;
use tracing::debug;

pub const CLIENT_DIR: &str = "client";
pub const SERVER_DIR: &str = "server";

/// A failure tied to one input file.
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error("{}:{line}:{column}: {message}", .file.display())]
    Positioned {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}: {message}", .file.display())]
    File { file: PathBuf, message: String },
}

impl Diagnostic {
    pub fn from_error(file: &Path, err: &CompilerError) -> Self {
        match err.position() {
            Some(position) => Diagnostic::Positioned {
                file: file.to_path_buf(),
                line: position.line,
                column: position.column,
                message: err.to_string(),
            },
            None => Diagnostic::File {
                file: file.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn io(file: &Path, err: &io::Error) -> Self {
        Diagnostic::File {
            file: file.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn file(&self) -> &Path {
        match self {
            Diagnostic::Positioned { file, .. } | Diagnostic::File { file, .. } => file,
        }
    }
}

/// Client pass: collapsed whitespace, line endings left alone.
pub fn client_settings(settings: &CodeGenSettings) -> CodeGenSettings {
    CodeGenSettings {
        normalize_whitespace: true,
        convert_line_endings: false,
        ..settings.clone()
    }
}

/// Server pass: literal whitespace kept, line endings converted.
pub fn server_settings(settings: &CodeGenSettings) -> CodeGenSettings {
    CodeGenSettings {
        normalize_whitespace: false,
        convert_line_endings: true,
        ..settings.clone()
    }
}

/// Reads either a single view or an array of views.
pub fn read_views(source: &str) -> duel_compiler::Result<Vec<ViewCommand>> {
    // dispatch on the first token so JSON errors keep their positions
    if source.trim_start().starts_with('[') {
        Ok(serde_json::from_str(source)?)
    } else {
        Ok(vec![serde_json::from_str(source)?])
    }
}

/// Generated sources keyed by their path under the output directory.
pub fn emit_views(
    views: &[ViewCommand],
    settings: &CodeGenSettings,
) -> duel_compiler::Result<Vec<(PathBuf, String)>> {
    let mut outputs = Vec::new();
    let Some(first) = views.first() else {
        return Ok(outputs);
    };

    if views.iter().any(|view| !view.server_only) {
        let client = ClientCodeGen::new(client_settings(settings));
        let mut text = String::new();
        client.write(&mut text, views)?;
        let path = Path::new(CLIENT_DIR).join(settings.client_path(&first.name, client.file_extension()));
        outputs.push((path, text));
    }

    let server = ServerCodeGen::new(server_settings(settings));
    for view in views.iter().filter(|view| !view.client_only) {
        let mut text = String::new();
        server.write(&mut text, std::slice::from_ref(view))?;
        let path = Path::new(SERVER_DIR).join(settings.server_path(&view.name, server.file_extension()));
        outputs.push((path, text));
    }

    Ok(outputs)
}

/// Compiles `input` and writes its outputs below `out_dir`.
///
/// Nothing is written unless every view in the file compiles.
pub fn perform_compile(
    input: &Path,
    out_dir: &Path,
    settings: &CodeGenSettings,
) -> Result<Vec<PathBuf>, Diagnostic> {
    let source = fs::read_to_string(input).map_err(|err| Diagnostic::io(input, &err))?;
    let views = read_views(&source).map_err(|err| Diagnostic::from_error(input, &err))?;
    debug!(file = %input.display(), views = views.len(), "Read view tree");

    let outputs = emit_views(&views, settings).map_err(|err| Diagnostic::from_error(input, &err))?;

    let mut written = Vec::with_capacity(outputs.len());
    for (relative, text) in outputs {
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| Diagnostic::io(&target, &err))?;
        }
        fs::write(&target, text).map_err(|err| Diagnostic::io(&target, &err))?;
        debug!(file = %target.display(), "Wrote");
        written.push(target);
    }
    Ok(written)
}
