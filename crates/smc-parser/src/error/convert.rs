//! Conversions from phase-specific problems into [`Diagnostic`]s.

use smc_core::semantic::{AnalysisError, AnalysisWarning};

use crate::{
    error::{Diagnostic, ErrorCode},
    syntax::{SyntaxError, SyntaxErrorKind},
};

impl From<SyntaxErrorKind> for ErrorCode {
    fn from(kind: SyntaxErrorKind) -> Self {
        match kind {
            SyntaxErrorKind::Syntax => ErrorCode::E001,
            SyntaxErrorKind::Header => ErrorCode::E100,
            SyntaxErrorKind::State => ErrorCode::E101,
            SyntaxErrorKind::Transition => ErrorCode::E102,
            SyntaxErrorKind::TransitionGroup => ErrorCode::E103,
            SyntaxErrorKind::End => ErrorCode::E104,
        }
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(error: &SyntaxError) -> Self {
        let code = ErrorCode::from(error.kind);
        let label = match error.kind {
            SyntaxErrorKind::Syntax => "not part of any token",
            _ => "unexpected here",
        };
        let mut diagnostic = Diagnostic::error(error.message.clone())
            .with_code(code)
            .with_label(error.span, label);
        if let Some(state) = error.state {
            diagnostic = diagnostic.with_secondary_label(state, "in the transitions of this state");
        }
        diagnostic.with_help(code.description())
    }
}

impl From<&AnalysisError> for Diagnostic {
    fn from(error: &AnalysisError) -> Self {
        let code = ErrorCode::from(error.kind());
        Diagnostic::error(subject_message(error.kind().as_str(), error.subject()))
            .with_code(code)
            .with_help(code.description())
    }
}

impl From<&AnalysisWarning> for Diagnostic {
    fn from(warning: &AnalysisWarning) -> Self {
        let code = ErrorCode::from(warning.kind());
        Diagnostic::warning(subject_message(warning.kind().as_str(), warning.subject()))
            .with_code(code)
            .with_help(code.description())
    }
}

fn subject_message(kind: &str, subject: &str) -> String {
    if subject.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}({subject})")
    }
}
