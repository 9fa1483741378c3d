//! Table-driven parser.
//!
//! The grammar is encoded as the [`TRANSITIONS`] table: each row maps a
//! `(parser state, input event)` pair to the next parser state and an
//! optional [`BuilderOp`]. Input events are the lexer's token kinds plus a
//! final [`ParserEvent::Eof`].
//!
//! ```text
//! FSM           := header* logic
//! header        := NAME ':' NAME
//! logic         := '{' transition* '}'
//! transition    := state-spec subtransition | state-spec '{' subtransition* '}'
//! state-spec    := ('(' NAME ')' | NAME) modifier*
//! modifier      := ':' NAME | '<' action-spec | '>' action-spec
//! action-spec   := NAME | '{' NAME* '}'
//! subtransition := event next-state action-spec
//! event         := NAME | '-'
//! next-state    := NAME | '-'
//! ```
//!
//! An input with no matching row is reported as a syntax error and skipped;
//! the parser state does not change, so parsing always runs to the end.

use std::fmt;

use log::trace;
use smc_core::identifier::Id;

use crate::{
    builder::SyntaxBuilder,
    span::Span,
    syntax::SyntaxErrorKind,
    tokens::{LexEvent, PositionedToken, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    Header,
    HeaderColon,
    HeaderValue,
    StateSpec,
    AbstractStateName,
    AbstractStateClose,
    StateModifier,
    EntryAction,
    MultipleEntryActions,
    ExitAction,
    MultipleExitActions,
    StateBase,
    SingleEvent,
    SingleNextState,
    SingleActionGroup,
    SingleActionGroupName,
    SubtransitionGroup,
    GroupEvent,
    GroupNextState,
    GroupActionGroup,
    GroupActionGroupName,
    End,
}

impl ParserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "HEADER",
            Self::HeaderColon => "HEADER_COLON",
            Self::HeaderValue => "HEADER_VALUE",
            Self::StateSpec => "STATE_SPEC",
            Self::AbstractStateName => "ABSTRACT_STATE_NAME",
            Self::AbstractStateClose => "ABSTRACT_STATE_CLOSE",
            Self::StateModifier => "STATE_MODIFIER",
            Self::EntryAction => "ENTRY_ACTION",
            Self::MultipleEntryActions => "MULTIPLE_ENTRY_ACTIONS",
            Self::ExitAction => "EXIT_ACTION",
            Self::MultipleExitActions => "MULTIPLE_EXIT_ACTIONS",
            Self::StateBase => "STATE_BASE",
            Self::SingleEvent => "SINGLE_EVENT",
            Self::SingleNextState => "SINGLE_NEXT_STATE",
            Self::SingleActionGroup => "SINGLE_ACTION_GROUP",
            Self::SingleActionGroupName => "SINGLE_ACTION_GROUP_NAME",
            Self::SubtransitionGroup => "SUBTRANSITION_GROUP",
            Self::GroupEvent => "GROUP_EVENT",
            Self::GroupNextState => "GROUP_NEXT_STATE",
            Self::GroupActionGroup => "GROUP_ACTION_GROUP",
            Self::GroupActionGroupName => "GROUP_ACTION_GROUP_NAME",
            Self::End => "END",
        }
    }

    /// The error group reported for unexpected input in this state.
    pub fn error_kind(&self) -> SyntaxErrorKind {
        match self {
            Self::Header | Self::HeaderColon | Self::HeaderValue => SyntaxErrorKind::Header,
            Self::StateSpec
            | Self::AbstractStateName
            | Self::AbstractStateClose
            | Self::StateModifier
            | Self::EntryAction
            | Self::MultipleEntryActions
            | Self::ExitAction
            | Self::MultipleExitActions
            | Self::StateBase => SyntaxErrorKind::State,
            Self::SingleEvent
            | Self::SingleNextState
            | Self::SingleActionGroup
            | Self::SingleActionGroupName => SyntaxErrorKind::Transition,
            Self::SubtransitionGroup
            | Self::GroupEvent
            | Self::GroupNextState
            | Self::GroupActionGroup
            | Self::GroupActionGroupName => SyntaxErrorKind::TransitionGroup,
            Self::End => SyntaxErrorKind::End,
        }
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserEvent {
    Name,
    OpenBrace,
    ClosedBrace,
    OpenParen,
    ClosedParen,
    OpenAngle,
    ClosedAngle,
    Dash,
    Colon,
    Eof,
}

impl ParserEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::OpenBrace => "OPEN_BRACE",
            Self::ClosedBrace => "CLOSED_BRACE",
            Self::OpenParen => "OPEN_PAREN",
            Self::ClosedParen => "CLOSED_PAREN",
            Self::OpenAngle => "OPEN_ANGLE",
            Self::ClosedAngle => "CLOSED_ANGLE",
            Self::Dash => "DASH",
            Self::Colon => "COLON",
            Self::Eof => "EOF",
        }
    }
}

impl fmt::Display for ParserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Token<'_>> for ParserEvent {
    fn from(token: &Token<'_>) -> Self {
        match token {
            Token::Name(_) => Self::Name,
            Token::OpenBrace => Self::OpenBrace,
            Token::ClosedBrace => Self::ClosedBrace,
            Token::OpenParen => Self::OpenParen,
            Token::ClosedParen => Self::ClosedParen,
            Token::OpenAngle => Self::OpenAngle,
            Token::ClosedAngle => Self::ClosedAngle,
            Token::Dash => Self::Dash,
            Token::Colon => Self::Colon,
        }
    }
}

/// Operations the table invokes on the [`SyntaxBuilder`].
///
/// Operations marked *name* consume the text of the `NAME` token that
/// triggered the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderOp {
    /// *name*: start a header.
    BeginHeader,
    /// *name*: complete the pending header.
    CommitHeader,
    /// *name*: start a concrete state spec.
    BeginState,
    /// *name*: start an abstract state spec.
    BeginAbstractState,
    /// *name*
    AddSuperState,
    /// *name*
    AddEntryAction,
    /// *name*
    AddExitAction,
    /// *name*: start a sub-transition on an event.
    BeginSubTransition,
    /// Start a sub-transition on the nil event.
    BeginNilSubTransition,
    /// *name*
    SetNextState,
    SetNilNextState,
    /// *name*
    AddAction,
    /// *name*: add the single action and commit the sub-transition.
    CommitWithAction,
    /// Commit the sub-transition with the actions gathered so far.
    CommitSubTransition,
    Done,
}

impl BuilderOp {
    /// Whether the operation reads the text of a `NAME` token.
    pub fn needs_name(&self) -> bool {
        !matches!(
            self,
            Self::BeginNilSubTransition
                | Self::SetNilNextState
                | Self::CommitSubTransition
                | Self::Done
        )
    }
}

/// One row of the parser table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRow {
    pub current: ParserState,
    pub event: ParserEvent,
    pub next: ParserState,
    pub action: Option<BuilderOp>,
}

const fn row(
    current: ParserState,
    event: ParserEvent,
    next: ParserState,
    action: Option<BuilderOp>,
) -> TransitionRow {
    TransitionRow {
        current,
        event,
        next,
        action,
    }
}

use BuilderOp as Op;
use ParserEvent as E;
use ParserState as S;

pub const TRANSITIONS: &[TransitionRow] = &[
    row(S::Header, E::Name, S::HeaderColon, Some(Op::BeginHeader)),
    row(S::Header, E::OpenBrace, S::StateSpec, None),
    row(S::HeaderColon, E::Colon, S::HeaderValue, None),
    row(S::HeaderValue, E::Name, S::Header, Some(Op::CommitHeader)),
    row(S::StateSpec, E::OpenParen, S::AbstractStateName, None),
    row(S::StateSpec, E::Name, S::StateModifier, Some(Op::BeginState)),
    row(S::StateSpec, E::ClosedBrace, S::End, Some(Op::Done)),
    row(S::AbstractStateName, E::Name, S::AbstractStateClose, Some(Op::BeginAbstractState)),
    row(S::AbstractStateClose, E::ClosedParen, S::StateModifier, None),
    row(S::StateModifier, E::OpenAngle, S::EntryAction, None),
    row(S::StateModifier, E::ClosedAngle, S::ExitAction, None),
    row(S::StateModifier, E::Colon, S::StateBase, None),
    row(S::StateModifier, E::Name, S::SingleEvent, Some(Op::BeginSubTransition)),
    row(S::StateModifier, E::Dash, S::SingleEvent, Some(Op::BeginNilSubTransition)),
    row(S::StateModifier, E::OpenBrace, S::SubtransitionGroup, None),
    row(S::EntryAction, E::Name, S::StateModifier, Some(Op::AddEntryAction)),
    row(S::EntryAction, E::OpenBrace, S::MultipleEntryActions, None),
    row(S::MultipleEntryActions, E::Name, S::MultipleEntryActions, Some(Op::AddEntryAction)),
    row(S::MultipleEntryActions, E::ClosedBrace, S::StateModifier, None),
    row(S::ExitAction, E::Name, S::StateModifier, Some(Op::AddExitAction)),
    row(S::ExitAction, E::OpenBrace, S::MultipleExitActions, None),
    row(S::MultipleExitActions, E::Name, S::MultipleExitActions, Some(Op::AddExitAction)),
    row(S::MultipleExitActions, E::ClosedBrace, S::StateModifier, None),
    row(S::StateBase, E::Name, S::StateModifier, Some(Op::AddSuperState)),
    row(S::SingleEvent, E::Name, S::SingleNextState, Some(Op::SetNextState)),
    row(S::SingleEvent, E::Dash, S::SingleNextState, Some(Op::SetNilNextState)),
    row(S::SingleNextState, E::Name, S::StateSpec, Some(Op::CommitWithAction)),
    row(S::SingleNextState, E::Dash, S::StateSpec, Some(Op::CommitSubTransition)),
    row(S::SingleNextState, E::OpenBrace, S::SingleActionGroup, None),
    row(S::SingleActionGroup, E::Name, S::SingleActionGroupName, Some(Op::AddAction)),
    row(S::SingleActionGroup, E::ClosedBrace, S::StateSpec, Some(Op::CommitSubTransition)),
    row(S::SingleActionGroupName, E::Name, S::SingleActionGroupName, Some(Op::AddAction)),
    row(S::SingleActionGroupName, E::ClosedBrace, S::StateSpec, Some(Op::CommitSubTransition)),
    row(S::SubtransitionGroup, E::ClosedBrace, S::StateSpec, None),
    row(S::SubtransitionGroup, E::Name, S::GroupEvent, Some(Op::BeginSubTransition)),
    row(S::SubtransitionGroup, E::Dash, S::GroupEvent, Some(Op::BeginNilSubTransition)),
    row(S::GroupEvent, E::Name, S::GroupNextState, Some(Op::SetNextState)),
    row(S::GroupEvent, E::Dash, S::GroupNextState, Some(Op::SetNilNextState)),
    row(S::GroupNextState, E::Name, S::SubtransitionGroup, Some(Op::CommitWithAction)),
    row(S::GroupNextState, E::Dash, S::SubtransitionGroup, Some(Op::CommitSubTransition)),
    row(S::GroupNextState, E::OpenBrace, S::GroupActionGroup, None),
    row(S::GroupActionGroup, E::Name, S::GroupActionGroupName, Some(Op::AddAction)),
    row(S::GroupActionGroup, E::ClosedBrace, S::SubtransitionGroup, Some(Op::CommitSubTransition)),
    row(S::GroupActionGroupName, E::Name, S::GroupActionGroupName, Some(Op::AddAction)),
    row(S::GroupActionGroupName, E::ClosedBrace, S::SubtransitionGroup, Some(Op::CommitSubTransition)),
    row(S::End, E::Eof, S::End, None),
];

/// Find the single row for `(state, event)`.
fn lookup(state: ParserState, event: ParserEvent) -> Option<&'static TransitionRow> {
    TRANSITIONS
        .iter()
        .find(|row| row.current == state && row.event == event)
}

/// Drives a [`SyntaxBuilder`] from lexer events.
pub struct Parser {
    state: ParserState,
    builder: SyntaxBuilder,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Header,
            builder: SyntaxBuilder::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feed one lexer event.
    pub fn handle_lex_event(&mut self, event: &LexEvent<'_>) {
        match event {
            LexEvent::Token(token) => self.handle_token(token),
            LexEvent::Error(error) => self.builder.lexical_error(error),
        }
    }

    pub fn handle_token(&mut self, token: &PositionedToken<'_>) {
        let name = match token.token {
            Token::Name(text) => Some(Id::new(text)),
            _ => None,
        };
        self.handle_event(
            ParserEvent::from(&token.token),
            name,
            token.line,
            token.column,
            token.span,
        );
    }

    /// Feed the end-of-input event located at `span`.
    pub fn handle_eof(&mut self, line: usize, column: usize, span: Span) {
        self.handle_event(ParserEvent::Eof, None, line, column, span);
    }

    pub fn handle_event(
        &mut self,
        event: ParserEvent,
        name: Option<Id>,
        line: usize,
        column: usize,
        span: Span,
    ) {
        match lookup(self.state, event) {
            Some(row) => {
                trace!(from = self.state.as_str(), event = event.as_str(), to = row.next.as_str(); "Parser transition");
                self.state = row.next;
                if let Some(op) = row.action {
                    self.apply(op, name, span);
                }
            }
            None => {
                trace!(state = self.state.as_str(), event = event.as_str(), line = line, column = column; "Unexpected parser input");
                self.builder.syntax_error(
                    self.state.error_kind(),
                    format!("{}|{}", self.state, event),
                    line,
                    column,
                    span,
                );
            }
        }
    }

    pub fn finish(self) -> crate::syntax::FsmSyntax {
        self.builder.finish()
    }

    fn apply(&mut self, op: BuilderOp, name: Option<Id>, span: Span) {
        let builder = &mut self.builder;
        match (op, name) {
            (BuilderOp::BeginHeader, Some(name)) => builder.begin_header(name),
            (BuilderOp::CommitHeader, Some(value)) => builder.commit_header(value),
            (BuilderOp::BeginState, Some(name)) => builder.begin_state(name, false, span),
            (BuilderOp::BeginAbstractState, Some(name)) => builder.begin_state(name, true, span),
            (BuilderOp::AddSuperState, Some(name)) => builder.add_super_state(name),
            (BuilderOp::AddEntryAction, Some(action)) => builder.add_entry_action(action),
            (BuilderOp::AddExitAction, Some(action)) => builder.add_exit_action(action),
            (BuilderOp::BeginSubTransition, Some(event)) => builder.begin_sub_transition(Some(event)),
            (BuilderOp::BeginNilSubTransition, _) => builder.begin_sub_transition(None),
            (BuilderOp::SetNextState, Some(next)) => builder.set_next_state(Some(next)),
            (BuilderOp::SetNilNextState, _) => builder.set_next_state(None),
            (BuilderOp::AddAction, Some(action)) => builder.add_action(action),
            (BuilderOp::CommitWithAction, Some(action)) => {
                builder.add_action(action);
                builder.commit_sub_transition();
            }
            (BuilderOp::CommitSubTransition, _) => builder.commit_sub_transition(),
            (BuilderOp::Done, _) => builder.done(),
            // Name operations only appear on NAME rows.
            (_, None) => {}
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{lexer::tokenize, syntax::FsmSyntax};

    fn parse(source: &str) -> FsmSyntax {
        let mut parser = Parser::new();
        for event in tokenize(source) {
            parser.handle_lex_event(&event);
        }
        let end = Span::new(source.len()..source.len());
        parser.handle_eof(0, 0, end);
        parser.finish()
    }

    #[test]
    fn test_table_has_no_duplicate_pairs() {
        let mut seen = HashSet::new();
        for row in TRANSITIONS {
            assert!(
                seen.insert((row.current, row.event)),
                "duplicate row for {}|{}",
                row.current,
                row.event
            );
        }
    }

    #[test]
    fn test_name_operations_only_on_name_rows() {
        for row in TRANSITIONS {
            if let Some(op) = row.action {
                if op.needs_name() {
                    assert_eq!(row.event, ParserEvent::Name, "{op:?} on {}", row.event);
                }
            }
        }
    }

    #[test]
    fn test_parse_headers_and_simple_transition() {
        let syntax = parse("fsm:f initial:i {s e n a}");

        assert!(syntax.errors.is_empty(), "{:?}", syntax.errors);
        assert!(syntax.done);
        assert_eq!(syntax.headers.len(), 2);
        assert_eq!(syntax.headers[1].name, "initial");
        assert_eq!(syntax.logic.len(), 1);

        let sub = &syntax.logic[0].sub_transitions[0];
        assert_eq!(sub.event, Some(Id::new("e")));
        assert_eq!(sub.next_state, Some(Id::new("n")));
        assert_eq!(sub.actions, vec![Id::new("a")]);
    }

    #[test]
    fn test_parse_state_modifiers() {
        let syntax = parse("{(b) <{n1 n2} >x - - - s:b:c <e >{} - - -}");

        assert!(syntax.errors.is_empty(), "{:?}", syntax.errors);
        let abstract_spec = &syntax.logic[0].state;
        assert!(abstract_spec.is_abstract);
        assert_eq!(abstract_spec.entry_actions, vec![Id::new("n1"), Id::new("n2")]);
        assert_eq!(abstract_spec.exit_actions, vec![Id::new("x")]);

        let spec = &syntax.logic[1].state;
        assert!(!spec.is_abstract);
        assert_eq!(spec.super_states, vec![Id::new("b"), Id::new("c")]);
        assert_eq!(spec.entry_actions, vec![Id::new("e")]);
        assert!(spec.exit_actions.is_empty());
    }

    #[test]
    fn test_parse_groups_and_nil_values() {
        let syntax = parse("{s { e1 - {a b} - n - e2 n {} }}");

        assert!(syntax.errors.is_empty(), "{:?}", syntax.errors);
        let subs = &syntax.logic[0].sub_transitions;
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[0].next_state, None);
        assert_eq!(subs[0].actions, vec![Id::new("a"), Id::new("b")]);
        assert_eq!(subs[1].event, None);
        assert!(subs[1].actions.is_empty());
        assert!(subs[2].actions.is_empty());
    }

    #[test]
    fn test_error_kind_follows_state_group() {
        let cases = [
            ("fsm fsm", SyntaxErrorKind::Header, "HEADER_COLON|NAME"),
            ("{s <:}", SyntaxErrorKind::State, "ENTRY_ACTION|COLON"),
            ("{s <{a :", SyntaxErrorKind::State, "MULTIPLE_ENTRY_ACTIONS|COLON"),
            ("{s e (", SyntaxErrorKind::Transition, "SINGLE_EVENT|OPEN_PAREN"),
            ("{s {e :", SyntaxErrorKind::TransitionGroup, "GROUP_EVENT|COLON"),
            ("{} x", SyntaxErrorKind::End, "END|NAME"),
        ];
        for (source, kind, message) in cases {
            let syntax = parse(source);
            let first = syntax.errors.first().expect("expected a syntax error");
            assert_eq!(first.kind, kind, "{source}");
            assert_eq!(first.message, message, "{source}");
        }
    }

    #[test]
    fn test_unexpected_input_keeps_state() {
        let mut parser = Parser::new();
        for event in tokenize("fsm : :") {
            parser.handle_lex_event(&event);
        }
        assert_eq!(parser.state(), ParserState::HeaderValue);
        let syntax = parser.finish();
        assert_eq!(syntax.errors.len(), 1);
        assert_eq!(syntax.errors[0].position, 6);
    }

    #[test]
    fn test_eof_outside_end_is_generic_error() {
        let syntax = parse("{s e");
        let last = syntax.errors.last().expect("expected an error");
        assert_eq!(last.message, "SINGLE_EVENT|EOF");
        assert_eq!(last.kind, SyntaxErrorKind::Transition);
    }

    #[test]
    fn test_lexical_errors_are_recorded() {
        let syntax = parse("{s e n a .}");
        assert!(syntax.done);
        assert_eq!(syntax.errors.len(), 1);
        assert_eq!(syntax.errors[0].kind, SyntaxErrorKind::Syntax);
        assert_eq!(syntax.errors[0].message, "unexpected character '.'");
        assert_eq!(syntax.errors[0].position, 9);
    }
}
