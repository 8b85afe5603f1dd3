// gifforge-cli/src/main.rs
//
// Binary entry point: parses arguments, initializes logging, installs the
// last-resort panic hook, and dispatches to the command implementations.

use clap::Parser;
use gifforge_cli::cli::{Cli, Commands};
use gifforge_cli::commands::convert::run_convert;
use gifforge_cli::logging;
use std::process;

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Convert(args) => args.verbose,
    };
    if let Err(e) = logging::init(verbose) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    // Last-resort diagnostic for anything that escapes the per-file
    // boundaries; no recovery is attempted.
    std::panic::set_hook(Box::new(|info| {
        log::error!("Unhandled panic: {info}");
    }));

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
    };

    // Startup and batch-level errors fail the process; individual file
    // failures are reported in the summary and do not change the exit code.
    if let Err(e) = result {
        log::error!("{e}");
        process::exit(1);
    }
}
