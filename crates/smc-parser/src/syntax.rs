//! Raw syntax tree of a state machine source.
//!
//! The tree mirrors the source one to one: headers and transitions keep
//! their declaration order, repeated headers and repeated state specs are
//! preserved, and nothing is resolved yet. Names are interned [`Id`]s;
//! a nil event or next state (`-`) is `None`.

use std::fmt;

use smc_core::identifier::Id;

use crate::span::Span;

/// A `name: value` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub name: Id,
    pub value: Id,
}

impl Header {
    pub fn new(name: Id, value: Id) -> Self {
        Self { name, value }
    }
}

/// The left-hand side of a transition: a state and its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSpec {
    pub name: Id,
    pub is_abstract: bool,
    pub super_states: Vec<Id>,
    pub entry_actions: Vec<Id>,
    pub exit_actions: Vec<Id>,
}

impl StateSpec {
    pub fn new(name: Id, is_abstract: bool) -> Self {
        Self {
            name,
            is_abstract,
            super_states: Vec::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
        }
    }

    /// Whether this spec declares any entry or exit action.
    pub fn has_actions(&self) -> bool {
        !self.entry_actions.is_empty() || !self.exit_actions.is_empty()
    }
}

/// `event next-state actions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTransition {
    pub event: Option<Id>,
    pub next_state: Option<Id>,
    pub actions: Vec<Id>,
}

impl SubTransition {
    pub fn new(event: Option<Id>) -> Self {
        Self {
            event,
            next_state: None,
            actions: Vec::new(),
        }
    }
}

/// A state spec with the sub-transitions declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: StateSpec,
    pub sub_transitions: Vec<SubTransition>,
}

impl Transition {
    pub fn new(state: StateSpec) -> Self {
        Self {
            state,
            sub_transitions: Vec::new(),
        }
    }
}

/// Parser state group a syntax error was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    Header,
    State,
    Transition,
    TransitionGroup,
    End,
    /// A character the lexer could not turn into a token.
    Syntax,
}

impl SyntaxErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "HEADER",
            Self::State => "STATE",
            Self::Transition => "TRANSITION",
            Self::TransitionGroup => "TRANSITION_GROUP",
            Self::End => "END",
            Self::Syntax => "SYNTAX",
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexical or syntax error with its position.
///
/// `line` is 1-based and `position` is the 0-based column of the offending
/// token or character. `state` is the name of the state spec a broken
/// transition belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub line: usize,
    pub position: usize,
    pub span: Span,
    pub state: Option<Span>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Syntax Error Line: {}, Position: {}.  ({}) {}",
            self.line, self.position, self.kind, self.message
        )
    }
}

/// The raw syntax tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsmSyntax {
    pub headers: Vec<Header>,
    pub logic: Vec<Transition>,
    pub errors: Vec<SyntaxError>,
    /// Set once the closing `}` of the logic block has been parsed.
    pub done: bool,
}

impl FsmSyntax {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for FsmSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            writeln!(f, "{}:{}", header.name, header.value)?;
        }
        if self.done || !self.logic.is_empty() {
            writeln!(f, "{{")?;
            for transition in &self.logic {
                write!(f, "  ")?;
                write_state_spec(f, &transition.state)?;
                write!(f, " ")?;
                if let [single] = transition.sub_transitions.as_slice() {
                    write_sub_transition(f, single)?;
                } else {
                    writeln!(f, "{{")?;
                    for sub in &transition.sub_transitions {
                        write!(f, "    ")?;
                        write_sub_transition(f, sub)?;
                        writeln!(f)?;
                    }
                    write!(f, "  }}")?;
                }
                writeln!(f)?;
            }
            writeln!(f, "}}")?;
        }
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

fn write_state_spec(f: &mut fmt::Formatter<'_>, spec: &StateSpec) -> fmt::Result {
    if spec.is_abstract {
        write!(f, "({})", spec.name)?;
    } else {
        write!(f, "{}", spec.name)?;
    }
    for super_state in &spec.super_states {
        write!(f, ":{super_state}")?;
    }
    for action in &spec.entry_actions {
        write!(f, " <{action}")?;
    }
    for action in &spec.exit_actions {
        write!(f, " >{action}")?;
    }
    Ok(())
}

fn write_sub_transition(f: &mut fmt::Formatter<'_>, sub: &SubTransition) -> fmt::Result {
    write!(f, "{} {} ", NilOr(sub.event), NilOr(sub.next_state))?;
    match sub.actions.as_slice() {
        [single] => write!(f, "{single}"),
        actions => {
            write!(f, "{{")?;
            for (idx, action) in actions.iter().enumerate() {
                if idx > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{action}")?;
            }
            write!(f, "}}")
        }
    }
}

/// Renders `-` for the nil event or next state.
struct NilOr(Option<Id>);

impl fmt::Display for NilOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, "{name}"),
            None => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let error = SyntaxError {
            kind: SyntaxErrorKind::TransitionGroup,
            message: "GROUP_EVENT|COLON".to_string(),
            line: 3,
            position: 7,
            span: Span::new(20..21),
            state: Some(Span::new(2..3)),
        };
        assert_eq!(
            error.to_string(),
            "Syntax Error Line: 3, Position: 7.  (TRANSITION_GROUP) GROUP_EVENT|COLON"
        );
    }

    #[test]
    fn test_display_of_small_machine() {
        let mut spec = StateSpec::new(Id::new("s"), true);
        spec.super_states.push(Id::new("b"));
        spec.entry_actions.push(Id::new("n"));
        spec.exit_actions.push(Id::new("x"));

        let mut single = SubTransition::new(None);
        single.actions = vec![Id::new("a1"), Id::new("a2")];

        let syntax = FsmSyntax {
            headers: vec![Header::new(Id::new("fsm"), Id::new("f"))],
            logic: vec![Transition {
                state: spec,
                sub_transitions: vec![single],
            }],
            errors: Vec::new(),
            done: true,
        };

        assert_eq!(syntax.to_string(), "fsm:f\n{\n  (s):b <n >x - - {a1 a2}\n}\n");
    }

    #[test]
    fn test_has_actions() {
        let mut spec = StateSpec::new(Id::new("s"), false);
        assert!(!spec.has_actions());
        spec.exit_actions.push(Id::new("x"));
        assert!(spec.has_actions());
    }
}
