// Main Entry Point
//
// Expands the inputs, compiles every file in parallel and reports
// failures without stopping the rest of the batch.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::options::CliOptions;
use crate::perform_compile::{perform_compile, Diagnostic};

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchResult {
    pub fn exit_code(&self) -> i32 {
        if self.diagnostics.is_empty() {
            0
        } else {
            1
        }
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` wins unless verbose.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // a subscriber may already be installed by an embedding host
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(options: &CliOptions) -> anyhow::Result<BatchResult> {
    let settings = options.settings()?;
    let files = options.input_files()?;

    let start = Instant::now();
    info!("Compiling {} view files...", files.len());

    let results: Vec<_> = files
        .par_iter()
        .map(|file| perform_compile(file, &options.out_dir, &settings))
        .collect();

    let mut batch = BatchResult::default();
    for result in results {
        match result {
            Ok(written) => batch.written.extend(written),
            Err(diagnostic) => batch.diagnostics.push(diagnostic),
        }
    }

    debug!(files = batch.written.len(), "Emitted");
    info!(
        failed = batch.diagnostics.len(),
        "Compilation finished in {:?}",
        start.elapsed()
    );
    Ok(batch)
}

/// Runs the batch, printing one line per failed file. Returns the exit code.
pub fn main(options: &CliOptions) -> i32 {
    match run(options) {
        Ok(batch) => {
            for diagnostic in &batch.diagnostics {
                eprintln!("{}", diagnostic);
            }
            batch.exit_code()
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            2
        }
    }
}
