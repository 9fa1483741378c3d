//! `smc` binary: compile one state machine source.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, info};
use miette::GraphicalReportHandler;

use smc_cli::{Args, error_adapter::render_report};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "Parsed arguments");

    match smc_cli::run(&args) {
        Ok(()) => info!(input = args.input.as_str(); "Compilation finished"),
        Err(err) => {
            // Diagnostics reach stderr even with logging turned off.
            eprint!("{}", render_report(&err, &GraphicalReportHandler::new()));
            process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let filter = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("smc: unknown log level `{level}`, falling back to `warn`");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .format_target(false)
        .init();
}
