//! SMC CLI library
//!
//! This module contains the core CLI logic for the state machine compiler.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::{info, warn};

use smc::{Compiler, SmcError, config::AppConfig};

/// Run the SMC CLI application
///
/// This function compiles the input file and writes the textual rendering
/// of the resulting machine to the output file, or to standard output.
///
/// # Errors
///
/// Returns `SmcError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax errors
/// - Semantic errors, and warnings when they are denied
pub fn run(args: &Args) -> Result<(), SmcError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Compiling state machine"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.no_optimize {
        app_config = AppConfig::new(app_config.compiler().clone().with_optimize(false));
    }

    let source = fs::read_to_string(&args.input)?;

    let compiler = Compiler::new(app_config);
    let compiled = compiler.compile(&source)?;
    for warning in compiled.warnings() {
        warn!(code:? = warning.code(); "{}", warning.message());
    }

    let rendered = compiled.to_string();
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output_file = path.as_str(); "Output written successfully");
        }
        None => io::stdout().lock().write_all(rendered.as_bytes())?,
    }

    Ok(())
}
