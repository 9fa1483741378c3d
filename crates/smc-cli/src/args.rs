//! Command-line argument definitions for the SMC CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, output mode and logging verbosity.

use clap::Parser;

/// Command-line arguments for the state machine compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input state machine file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output file, standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit the resolved semantic machine instead of the flattened tables
    #[arg(long)]
    pub no_optimize: bool,
}
