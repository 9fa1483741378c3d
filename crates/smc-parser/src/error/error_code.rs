//! Error codes for the compiler's diagnostics.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Syntax errors, one per parser state group
//! - `E2xx` - Semantic errors
//! - `W3xx` - Semantic warnings

use std::fmt;

use smc_core::semantic::{AnalysisErrorKind, AnalysisWarningKind};

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unexpected character.
    ///
    /// The character does not start a name, a punctuation token, whitespace
    /// or a `//` comment.
    E001,

    // =========================================================================
    // Syntax Errors (E1xx)
    // =========================================================================
    /// Syntax error in a header.
    ///
    /// Headers have the form `name: value` and precede the `{` of the logic.
    E100,

    /// Syntax error in a state spec.
    ///
    /// Covers `(abstract)` names and the `:super`, `<entry` and `>exit`
    /// modifiers.
    E101,

    /// Syntax error in a single transition.
    ///
    /// A transition is `event next-state action-spec`.
    E102,

    /// Syntax error in a transition group.
    ///
    /// A group is a `{ ... }` block of transitions after a state spec.
    E103,

    /// Syntax error after the logic block.
    ///
    /// Nothing may follow the closing `}` of the machine.
    E104,

    // =========================================================================
    // Semantic Errors (E2xx)
    // =========================================================================
    /// Missing `fsm` header.
    E200,

    /// Missing `initial` header.
    E201,

    /// Unknown header name.
    ///
    /// Only `fsm`, `initial` and `actions` are recognized.
    E202,

    /// Repeated header.
    ///
    /// The first occurrence of a header wins.
    E203,

    /// Undefined state.
    ///
    /// A next state or the initial state names a state that is never used as
    /// the subject of a transition.
    E204,

    /// Undefined superstate.
    E205,

    /// Unused state.
    ///
    /// The state is never a next state, never the initial state and never a
    /// superstate.
    E206,

    /// Duplicate transition.
    ///
    /// A state declares the same event twice.
    E207,

    /// Abstract state used as a next state.
    E208,

    /// State actions multiply defined.
    ///
    /// Two declarations of a state list different entry or exit actions.
    E209,

    /// Conflicting superstates.
    ///
    /// Two superstates of a state handle the same event differently and the
    /// state does not override it.
    E210,

    // =========================================================================
    // Semantic Warnings (W3xx)
    // =========================================================================
    /// State declared both abstract and concrete.
    W300,

    /// Implicit superstate.
    ///
    /// A superstate without superstates of its own was inserted under another
    /// superstate that covers all of its substates.
    W301,

    /// Redundant superstate.
    ///
    /// A superstate's substates were already covered by another superstate.
    W302,

    /// Superstates intersection.
    ///
    /// The state is reached through more than one superstate path; inherited
    /// behavior was copied onto it.
    W303,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            // Syntax errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Semantic errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E208 => "E208",
            ErrorCode::E209 => "E209",
            ErrorCode::E210 => "E210",
            // Semantic warnings
            ErrorCode::W300 => "W300",
            ErrorCode::W301 => "W301",
            ErrorCode::W302 => "W302",
            ErrorCode::W303 => "W303",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unexpected character",
            // Syntax errors
            ErrorCode::E100 => "syntax error in a header",
            ErrorCode::E101 => "syntax error in a state spec",
            ErrorCode::E102 => "syntax error in a transition",
            ErrorCode::E103 => "syntax error in a transition group",
            ErrorCode::E104 => "unexpected input after the end of the machine",
            // Semantic errors
            ErrorCode::E200 => "missing `fsm` header",
            ErrorCode::E201 => "missing `initial` header",
            ErrorCode::E202 => "unknown header",
            ErrorCode::E203 => "repeated header is ignored",
            ErrorCode::E204 => "undefined state",
            ErrorCode::E205 => "undefined superstate",
            ErrorCode::E206 => "state is never used",
            ErrorCode::E207 => "duplicate transition",
            ErrorCode::E208 => "abstract state used as next state",
            ErrorCode::E209 => "state actions are defined differently",
            ErrorCode::E210 => "superstates handle the same event differently",
            // Semantic warnings
            ErrorCode::W300 => "state is declared both abstract and concrete",
            ErrorCode::W301 => "superstate was inserted implicitly",
            ErrorCode::W302 => "superstate is redundant",
            ErrorCode::W303 => "state is reached through several superstates",
        }
    }
}

impl From<AnalysisErrorKind> for ErrorCode {
    fn from(kind: AnalysisErrorKind) -> Self {
        match kind {
            AnalysisErrorKind::NoFsm => ErrorCode::E200,
            AnalysisErrorKind::NoInitial => ErrorCode::E201,
            AnalysisErrorKind::InvalidHeader => ErrorCode::E202,
            AnalysisErrorKind::ExtraHeaderIgnored => ErrorCode::E203,
            AnalysisErrorKind::UndefinedState => ErrorCode::E204,
            AnalysisErrorKind::UndefinedSuperState => ErrorCode::E205,
            AnalysisErrorKind::UnusedState => ErrorCode::E206,
            AnalysisErrorKind::DuplicateTransition => ErrorCode::E207,
            AnalysisErrorKind::AbstractStateUsedAsNextState => ErrorCode::E208,
            AnalysisErrorKind::StateActionsMultiplyDefined => ErrorCode::E209,
            AnalysisErrorKind::ConflictingSuperstates => ErrorCode::E210,
        }
    }
}

impl From<AnalysisWarningKind> for ErrorCode {
    fn from(kind: AnalysisWarningKind) -> Self {
        match kind {
            AnalysisWarningKind::InconsistentAbstraction => ErrorCode::W300,
            AnalysisWarningKind::ImplicitSuperstate => ErrorCode::W301,
            AnalysisWarningKind::RedundantSuperstate => ErrorCode::W302,
            AnalysisWarningKind::SuperstatesIntersection => ErrorCode::W303,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E103.to_string(), "E103");
        assert_eq!(ErrorCode::E210.to_string(), "E210");
        assert_eq!(ErrorCode::W303.to_string(), "W303");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unexpected character");
        assert_eq!(ErrorCode::E206.description(), "state is never used");
        assert_eq!(ErrorCode::W302.description(), "superstate is redundant");
    }

    #[test]
    fn test_semantic_kinds_map_to_codes() {
        assert_eq!(ErrorCode::from(AnalysisErrorKind::NoFsm), ErrorCode::E200);
        assert_eq!(
            ErrorCode::from(AnalysisErrorKind::ConflictingSuperstates),
            ErrorCode::E210
        );
        assert_eq!(
            ErrorCode::from(AnalysisWarningKind::SuperstatesIntersection),
            ErrorCode::W303
        );
    }
}
