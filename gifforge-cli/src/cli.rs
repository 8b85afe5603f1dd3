// gifforge-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "GifForge: Batch video to GIF converter",
    long_about = "Converts whole directory trees of video files into size-budgeted GIFs \
                  using ffmpeg and gifsicle via the gifforge-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts every file under the configured input directory into a GIF
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Path of the key/value configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "CONFIG_FILE",
        env = "GIFFORGE_CONFIG",
        default_value = "gifforge.conf"
    )]
    pub config_path: PathBuf,

    /// Override the configured input directory
    #[arg(short = 'i', long = "input", value_name = "INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Override the configured output directory
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the number of parallel conversion jobs
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Optional: write the batch report as JSON to this file
    #[arg(long = "report-json", value_name = "REPORT_FILE")]
    pub report_json: Option<PathBuf>,

    /// Enable debug output on stderr
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}
