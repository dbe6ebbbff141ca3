//! Command Line Options
//!
//! Parsed arguments, settings loading and input expansion.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use duel_compiler::CodeGenSettings;

#[derive(Debug, Clone, Parser)]
#[command(name = "duelc", version, about = "DUEL view compiler")]
pub struct CliOptions {
    /// View tree JSON file or glob pattern
    #[arg(short = 'i', long = "input", value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Directory receiving the client/ and server/ trees
    #[arg(short = 'o', long = "outdir", value_name = "OUTDIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Namespace prepended to server class names
    #[arg(long, value_name = "PREFIX")]
    pub server_prefix: Option<String>,

    /// Namespace prepended to client view names
    #[arg(long, value_name = "PREFIX")]
    pub client_prefix: Option<String>,

    /// JSON file with code generation settings
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log each view and emitted file
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliOptions {
    /// Settings from the config file (or defaults) with flag overrides applied.
    pub fn settings(&self) -> anyhow::Result<CodeGenSettings> {
        let mut settings = match &self.config {
            Some(path) => read_settings(path)?,
            None => CodeGenSettings::default(),
        };
        if let Some(prefix) = &self.server_prefix {
            settings.server_prefix = Some(prefix.clone());
        }
        if let Some(prefix) = &self.client_prefix {
            settings.client_prefix = Some(prefix.clone());
        }
        Ok(settings)
    }

    /// Expands every input pattern. Each pattern must match at least one file.
    pub fn input_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for pattern in &self.inputs {
            let entries =
                glob::glob(pattern).with_context(|| format!("Invalid input pattern: {}", pattern))?;

            let before = files.len();
            for entry in entries {
                let path = entry.with_context(|| format!("Cannot read match of {}", pattern))?;
                if path.is_file() {
                    files.push(path);
                }
            }
            if files.len() == before {
                bail!("No input files match {}", pattern);
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

pub fn read_settings(path: &Path) -> anyhow::Result<CodeGenSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid settings in {}", path.display()))
}
