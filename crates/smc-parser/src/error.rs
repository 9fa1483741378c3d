//! Error and diagnostic system for the state machine compiler.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans for syntax errors
//! - Severity levels, so semantic warnings travel next to errors
//! - Diagnostic collector for accumulating every problem of a phase
//!
//! # Overview
//!
//! The compiler never stops at the first problem. Every phase reports all of
//! its findings as [`Diagnostic`]s; a [`ParseError`] wraps them when at least
//! one of them is an error.
//!
//! # Example
//!
//! ```
//! # use smc_parser::error::{Diagnostic, ErrorCode};
//! # use smc_parser::Span;
//!
//! let diag = Diagnostic::error("STATE_SPEC|CLOSED_BRACE")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(12..13), "unexpected here")
//!     .with_help("a state spec must be followed by a transition or a `{` group");
//! ```

mod collector;
mod convert;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
