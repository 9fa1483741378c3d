//! The ParseError type for wrapping compiler diagnostics.
//!
//! [`ParseError`] wraps the diagnostics of a failed phase (lexing, parsing
//! or semantic analysis), warnings of that phase included.

use std::fmt;

use crate::error::Diagnostic;

/// Error type for the compilation lifecycle.
///
/// Wraps one or more diagnostics, at least one of which is an error.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics with error severity.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_error())
            .count()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_error_from_diagnostic() {
        let diag = Diagnostic::error("NO_FSM").with_code(ErrorCode::E200);
        let err: ParseError = diag.into();

        assert_eq!(err.diagnostics().len(), 1);
        assert_eq!(err.diagnostics()[0].message(), "NO_FSM");
    }

    #[test]
    fn test_parse_error_display_single() {
        let err: ParseError = Diagnostic::error("UNDEFINED_STATE(x)").into();

        assert_eq!(err.to_string(), "error: UNDEFINED_STATE(x)");
    }

    #[test]
    fn test_parse_error_display_multiple() {
        let err: ParseError = vec![
            Diagnostic::error("NO_FSM"),
            Diagnostic::error("NO_INITIAL"),
            Diagnostic::warning("INCONSISTENT_ABSTRACTION(s)"),
        ]
        .into();

        assert_eq!(err.to_string(), "error: NO_FSM (+2 more)");
        assert_eq!(err.error_count(), 2);
    }
}
