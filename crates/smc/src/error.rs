//! Error types for compiler operations.
//!
//! [`SmcError`] wraps the conditions that can stop a compilation.

use std::io;

use thiserror::Error;

use smc_parser::error::ParseError;

/// The main error type for compiler operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic of the failed phase together
/// with the source text, so callers can render labelled snippets.
#[derive(Debug, Error)]
pub enum SmcError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },
}

impl SmcError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
