//! Accumulator that turns parser operations into an [`FsmSyntax`].
//!
//! The parser never touches the tree directly. It drives a [`SyntaxBuilder`]
//! whose pending header, state spec and sub-transition are flushed into the
//! tree only by the `commit_*` operations (or by starting the next state),
//! so a half-read construct never leaks into `logic`.

use smc_core::identifier::Id;

use crate::{
    span::Span,
    syntax::{FsmSyntax, Header, StateSpec, SubTransition, SyntaxError, SyntaxErrorKind, Transition},
    tokens::LexicalError,
};

#[derive(Debug, Default)]
pub struct SyntaxBuilder {
    syntax: FsmSyntax,
    header_name: Option<Id>,
    transition: Option<Transition>,
    state_span: Option<Span>,
    sub_transition: Option<SubTransition>,
}

impl SyntaxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_header(&mut self, name: Id) {
        self.header_name = Some(name);
    }

    /// Complete the pending header with its value.
    pub fn commit_header(&mut self, value: Id) {
        if let Some(name) = self.header_name.take() {
            self.syntax.headers.push(Header::new(name, value));
        }
    }

    /// Start a new state spec named at `span`, flushing the previous one into the tree.
    pub fn begin_state(&mut self, name: Id, is_abstract: bool, span: Span) {
        self.flush_transition();
        self.transition = Some(Transition::new(StateSpec::new(name, is_abstract)));
        self.state_span = Some(span);
    }

    pub fn add_super_state(&mut self, name: Id) {
        if let Some(spec) = self.state_spec() {
            spec.super_states.push(name);
        }
    }

    pub fn add_entry_action(&mut self, action: Id) {
        if let Some(spec) = self.state_spec() {
            spec.entry_actions.push(action);
        }
    }

    pub fn add_exit_action(&mut self, action: Id) {
        if let Some(spec) = self.state_spec() {
            spec.exit_actions.push(action);
        }
    }

    /// Start a sub-transition; `None` is the nil event.
    pub fn begin_sub_transition(&mut self, event: Option<Id>) {
        self.sub_transition = Some(SubTransition::new(event));
    }

    /// Set the next state of the pending sub-transition; `None` is nil.
    pub fn set_next_state(&mut self, next_state: Option<Id>) {
        if let Some(sub) = self.sub_transition.as_mut() {
            sub.next_state = next_state;
        }
    }

    pub fn add_action(&mut self, action: Id) {
        if let Some(sub) = self.sub_transition.as_mut() {
            sub.actions.push(action);
        }
    }

    /// Attach the pending sub-transition to the pending state spec.
    pub fn commit_sub_transition(&mut self) {
        let Some(sub) = self.sub_transition.take() else {
            return;
        };
        if let Some(transition) = self.transition.as_mut() {
            transition.sub_transitions.push(sub);
        }
    }

    /// Mark the logic block as complete.
    pub fn done(&mut self) {
        self.flush_transition();
        self.syntax.done = true;
    }

    pub fn syntax_error(
        &mut self,
        kind: SyntaxErrorKind,
        message: String,
        line: usize,
        position: usize,
        span: Span,
    ) {
        let state = match kind {
            SyntaxErrorKind::Transition | SyntaxErrorKind::TransitionGroup => self.state_span,
            _ => None,
        };
        self.syntax.errors.push(SyntaxError {
            kind,
            message,
            line,
            position,
            span,
            state,
        });
    }

    pub fn lexical_error(&mut self, error: &LexicalError) {
        self.syntax_error(
            SyntaxErrorKind::Syntax,
            error.to_string(),
            error.line,
            error.column,
            error.span,
        );
    }

    /// Flush whatever is still pending and return the tree.
    pub fn finish(mut self) -> FsmSyntax {
        self.commit_sub_transition();
        self.flush_transition();
        self.syntax
    }

    fn state_spec(&mut self) -> Option<&mut StateSpec> {
        self.transition.as_mut().map(|transition| &mut transition.state)
    }

    fn flush_transition(&mut self) {
        self.state_span = None;
        if let Some(transition) = self.transition.take() {
            self.syntax.logic.push(transition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_needs_a_name() {
        let mut builder = SyntaxBuilder::new();
        builder.commit_header(Id::new("orphan"));
        builder.begin_header(Id::new("fsm"));
        builder.commit_header(Id::new("f"));

        let syntax = builder.finish();
        assert_eq!(syntax.headers, vec![Header::new(Id::new("fsm"), Id::new("f"))]);
    }

    #[test]
    fn test_states_are_flushed_in_order() {
        let mut builder = SyntaxBuilder::new();
        builder.begin_state(Id::new("a"), false, Span::new(0..1));
        builder.add_super_state(Id::new("base"));
        builder.begin_sub_transition(Some(Id::new("e")));
        builder.set_next_state(None);
        builder.add_action(Id::new("x"));
        builder.commit_sub_transition();
        builder.begin_state(Id::new("base"), true, Span::new(20..24));
        builder.done();

        let syntax = builder.finish();
        assert!(syntax.done);
        assert_eq!(syntax.logic.len(), 2);
        assert_eq!(syntax.logic[0].state.super_states, vec![Id::new("base")]);
        assert_eq!(syntax.logic[0].sub_transitions[0].actions, vec![Id::new("x")]);
        assert!(syntax.logic[1].state.is_abstract);
        assert!(syntax.logic[1].sub_transitions.is_empty());
    }

    #[test]
    fn test_uncommitted_sub_transition_is_kept_by_finish() {
        let mut builder = SyntaxBuilder::new();
        builder.begin_state(Id::new("s"), false, Span::new(0..1));
        builder.begin_sub_transition(Some(Id::new("e")));

        let syntax = builder.finish();
        assert!(!syntax.done);
        assert_eq!(syntax.logic[0].sub_transitions.len(), 1);
    }

    #[test]
    fn test_transition_errors_point_at_their_state() {
        let mut builder = SyntaxBuilder::new();
        let error = |builder: &mut SyntaxBuilder, kind: SyntaxErrorKind, at: usize| {
            builder.syntax_error(kind, kind.to_string(), 1, at, Span::new(at..at + 1));
        };
        error(&mut builder, SyntaxErrorKind::Transition, 3);
        builder.begin_state(Id::new("s"), false, Span::new(6..7));
        error(&mut builder, SyntaxErrorKind::TransitionGroup, 11);
        error(&mut builder, SyntaxErrorKind::State, 13);
        builder.done();
        error(&mut builder, SyntaxErrorKind::Transition, 15);

        let states: Vec<Option<Span>> = builder.finish().errors.iter().map(|error| error.state).collect();
        assert_eq!(states, vec![None, Some(Span::new(6..7)), None, None]);
    }
}
