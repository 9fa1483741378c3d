//! # SMC Parser
//!
//! Front end of the state machine compiler: source text to a validated,
//! single-inheritance [`SemanticStateMachine`].
//!
//! ## Usage
//!
//! ```
//! # use smc_parser::{analyze, check_semantics, check_syntax, parse, resolve_inheritance, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         FSM: TwoCoinTurnstile
//!         Initial: Locked
//!         {
//!             Locked Coin Unlocked unlock
//!             Unlocked Pass Locked lock
//!         }
//!     "#;
//!
//!     let syntax = parse(source);
//!     check_syntax(&syntax)?;
//!
//!     let mut machine = analyze(&syntax);
//!     resolve_inheritance(&mut machine);
//!     let warnings = check_semantics(&machine, false)?;
//!     assert!(warnings.is_empty());
//!     Ok(())
//! }
//! ```

mod analyzer;
mod builder;
pub mod error;
mod inheritance;
pub mod lexer;
pub mod parser;
mod span;
pub mod syntax;
pub mod tokens;

pub use analyzer::analyze;
pub use error::{Diagnostic, ErrorCode, ParseError, Severity};
pub use inheritance::resolve_inheritance;
pub use span::Span;
pub use syntax::FsmSyntax;

use log::debug;
use smc_core::semantic::SemanticStateMachine;

use error::DiagnosticCollector;

/// Parse source text into a raw syntax tree.
///
/// Parsing never fails: lexical and syntax errors are recorded in
/// [`FsmSyntax::errors`] and the parser keeps going, so every problem of
/// the source is reported at once.
///
/// 1. **Tokenize** - split the source into tokens and lexical errors
/// 2. **Parse** - drive the transition table with one event per token,
///    then a final end-of-input event
pub fn parse(source: &str) -> FsmSyntax {
    let events = lexer::tokenize(source);
    debug!(events = events.len(); "Tokenized source");

    let mut parser = parser::Parser::new();
    for event in &events {
        parser.handle_lex_event(event);
    }
    let (line, column) = lexer::end_of_input(source);
    parser.handle_eof(line, column, Span::new(source.len()..source.len()));

    let syntax = parser.finish();
    debug!(
        headers = syntax.headers.len(),
        transitions = syntax.logic.len(),
        errors = syntax.errors.len();
        "Parsed source"
    );
    syntax
}

/// Turn the syntax errors of `syntax` into a [`ParseError`], if there are any.
pub fn check_syntax(syntax: &FsmSyntax) -> Result<(), ParseError> {
    let mut collector = DiagnosticCollector::new();
    collector.extend(syntax.errors.iter().map(Diagnostic::from));
    collector.finish().map(|_| ())
}

/// Collect the semantic diagnostics of `machine`.
///
/// Returns the warnings when the machine has no errors. With
/// `deny_warnings`, warnings are reported as errors.
pub fn check_semantics(
    machine: &SemanticStateMachine,
    deny_warnings: bool,
) -> Result<Vec<Diagnostic>, ParseError> {
    let mut collector = DiagnosticCollector::new();
    collector.extend(machine.errors().iter().map(Diagnostic::from));
    collector.extend(machine.warnings().iter().map(|warning| {
        let diagnostic = Diagnostic::from(warning);
        if deny_warnings {
            diagnostic.into_error()
        } else {
            diagnostic
        }
    }));
    collector.finish()
}
