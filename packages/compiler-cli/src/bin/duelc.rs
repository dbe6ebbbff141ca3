/**
 * DUEL Compiler CLI - duelc
 *
 * Compiles view tree files into client scripts and server classes
 */
use clap::Parser;
use std::process;

use duel_compiler_cli::main_entry;
use duel_compiler_cli::options::CliOptions;

fn main() {
    let options = CliOptions::parse();
    main_entry::init_logging(options.verbose);
    process::exit(main_entry::main(&options));
}
