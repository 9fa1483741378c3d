//! Error adapter for converting SmcError to miette diagnostics.
//!
//! This module provides the bridge between the compiler's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A [`smc_parser::error::ParseError`] holds every problem of a compilation
//! phase. Each diagnostic is rendered independently.

use std::fmt::{self, Write};

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, SourceSpan};

use smc::SmcError;
use smc_parser::error::Diagnostic;

/// Adapter for a single compiler diagnostic.
pub struct DiagnosticAdapter<'a> {
    /// The wrapped diagnostic
    diag: &'a Diagnostic,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        if self.diag.severity().is_warning() {
            Some(miette::Severity::Warning)
        } else {
            Some(miette::Severity::Error)
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for [`SmcError`] variants without diagnostics, such as I/O errors.
pub struct ErrorAdapter<'a>(pub &'a SmcError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            SmcError::Io(_) => Some(Box::new("smc::io")),
            SmcError::Parse { .. } => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

fn span_to_miette(span: smc_parser::Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert an [`SmcError`] into a list of reportable errors.
///
/// [`SmcError::Parse`] yields one [`Reportable`] per diagnostic, every other
/// variant a single one.
pub fn to_reportables(err: &SmcError) -> Vec<Reportable<'_>> {
    match err {
        SmcError::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        SmcError::Io(_) => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Render every reportable of `err` with `handler`, one report after another.
pub fn render_report(err: &SmcError, handler: &GraphicalReportHandler) -> String {
    let mut rendered = String::new();
    for reportable in to_reportables(err) {
        if handler.render_report(&mut rendered, &reportable).is_err() {
            let _ = writeln!(rendered, "{reportable}");
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use std::io;

    use miette::GraphicalTheme;

    use smc_parser::{
        Span,
        error::{ErrorCode, ParseError},
    };

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("STATE_MODIFIER|COLON")
            .with_code(ErrorCode::E101)
            .with_label(Span::new(2..3), "unexpected here")
            .with_help("syntax error in a state spec");
        let err = SmcError::new_parse_error(ParseError::from(diag), "{s : }");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "STATE_MODIFIER|COLON");
                assert_eq!(d.code().map(|code| code.to_string()), Some("E101".to_string()));
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("UNDEFINED_STATE(b)").with_code(ErrorCode::E204),
            Diagnostic::error("UNUSED_STATE(a)").with_code(ErrorCode::E206),
            Diagnostic::warning("INCONSISTENT_ABSTRACTION(s)").into_error(),
        ];
        let err = SmcError::new_parse_error(ParseError::from(diags), "{a e b -}");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[0].to_string(), "UNDEFINED_STATE(b)");
        assert_eq!(reportables[2].to_string(), "INCONSISTENT_ABSTRACTION(s)");
        assert!(reportables[0].labels().is_none());
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("IMPLICIT_SUPERSTATE(m:s)");
        let adapter = DiagnosticAdapter::new(&diag, "");
        assert_eq!(adapter.severity(), Some(miette::Severity::Warning));
    }

    #[test]
    fn test_io_error() {
        let err = SmcError::Io(io::Error::new(io::ErrorKind::NotFound, "missing.sm"));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "I/O error: missing.sm");
                assert_eq!(e.code().map(|code| code.to_string()), Some("smc::io".to_string()));
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_render_report_lists_every_diagnostic() {
        let diags = vec![
            Diagnostic::error("UNDEFINED_STATE(b)").with_code(ErrorCode::E204),
            Diagnostic::error("SINGLE_EVENT|EOF")
                .with_code(ErrorCode::E102)
                .with_label(Span::new(5..5), "unexpected here")
                .with_secondary_label(Span::new(1..2), "in the transitions of this state"),
        ];
        let err = SmcError::new_parse_error(ParseError::from(diags), "{a e b");
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());

        let rendered = render_report(&err, &handler);
        let undefined = rendered.find("UNDEFINED_STATE(b)").expect("first diagnostic");
        let eof = rendered.find("SINGLE_EVENT|EOF").expect("second diagnostic");
        assert!(undefined < eof);
        assert!(rendered.contains("E102"));
        assert!(rendered.contains("in the transitions of this state"));
    }

    #[test]
    fn test_render_report_of_io_error() {
        let err = SmcError::Io(io::Error::new(io::ErrorKind::NotFound, "missing.sm"));
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());

        let rendered = render_report(&err, &handler);
        assert!(rendered.contains("I/O error: missing.sm"));
        assert!(rendered.contains("smc::io"));
    }

    #[test]
    fn test_primary_flag_on_labels() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..5), "primary")
            .with_secondary_label(Span::new(10..15), "secondary");

        let adapter = DiagnosticAdapter::new(&diag, "some source code");

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
        assert_eq!(labels[1].label(), Some("secondary"));
    }
}
