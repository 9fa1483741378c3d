//! Source spans attached to a [`Diagnostic`](super::Diagnostic).

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// The token the parser choked on.
    Offender,
    /// The state spec enclosing a broken transition.
    Context,
}

/// A message pinned to a span of the source.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    role: Role,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Role::Offender)
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, Role::Context)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the label marks the offending token itself.
    pub fn is_primary(&self) -> bool {
        self.role == Role::Offender
    }

    pub fn is_secondary(&self) -> bool {
        self.role == Role::Context
    }

    fn new(span: Span, message: impl Into<String>, role: Role) -> Self {
        Self {
            span,
            message: message.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offending_token_label() {
        let label = Label::primary(Span::new(4..5), "unexpected here");

        assert_eq!(label.span(), Span::new(4..5));
        assert_eq!(label.message(), "unexpected here");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_enclosing_state_label() {
        let label = Label::secondary(Span::new(1..9), "in the transitions of this state");

        assert_eq!(label.span().start(), 1);
        assert!(label.is_secondary());
        assert!(!label.is_primary());
    }
}
