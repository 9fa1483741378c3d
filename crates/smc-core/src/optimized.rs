//! Flattened, override-resolved transition tables.
//!
//! An [`OptimizedStateMachine`] is the final output of the compiler and the
//! input of every code or diagram generator. It holds one
//! [`OptimizedTransition`] per concrete state, each with at most one
//! [`OptimizedSubTransition`] per event, and every sub-transition already
//! carries the full exit, entry and declared action sequence.

use std::fmt;

use serde::Serialize;

use crate::{
    identifier::Id,
    semantic::{OptionalName, write_joined},
};

/// Header values copied from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizedHeader {
    fsm: Option<Id>,
    initial: Option<Id>,
    actions_class: Option<Id>,
}

impl OptimizedHeader {
    pub fn new(fsm: Option<Id>, initial: Option<Id>, actions_class: Option<Id>) -> Self {
        Self {
            fsm,
            initial,
            actions_class,
        }
    }

    pub fn fsm(&self) -> Option<Id> {
        self.fsm
    }

    pub fn initial(&self) -> Option<Id> {
        self.initial
    }

    pub fn actions_class(&self) -> Option<Id> {
        self.actions_class
    }
}

/// One resolved reaction of a state to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedSubTransition {
    event: Id,
    next_state: Id,
    actions: Vec<Id>,
}

impl OptimizedSubTransition {
    pub fn new(event: Id, next_state: Id, actions: Vec<Id>) -> Self {
        Self {
            event,
            next_state,
            actions,
        }
    }

    pub fn event(&self) -> Id {
        self.event
    }

    pub fn next_state(&self) -> Id {
        self.next_state
    }

    /// Exit actions, then entry actions, then the declared actions.
    pub fn actions(&self) -> &[Id] {
        &self.actions
    }
}

/// The complete transition table of one concrete state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizedTransition {
    current_state: Id,
    sub_transitions: Vec<OptimizedSubTransition>,
}

impl OptimizedTransition {
    pub fn new(current_state: Id, sub_transitions: Vec<OptimizedSubTransition>) -> Self {
        Self {
            current_state,
            sub_transitions,
        }
    }

    pub fn current_state(&self) -> Id {
        self.current_state
    }

    pub fn sub_transitions(&self) -> &[OptimizedSubTransition] {
        &self.sub_transitions
    }

    /// Look up the sub-transition handling `event`.
    pub fn sub_transition(&self, event: Id) -> Option<&OptimizedSubTransition> {
        self.sub_transitions.iter().find(|st| st.event == event)
    }
}

/// Final output of the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizedStateMachine {
    header: OptimizedHeader,
    states: Vec<Id>,
    events: Vec<Id>,
    actions: Vec<Id>,
    transitions: Vec<OptimizedTransition>,
}

impl OptimizedStateMachine {
    pub fn new(
        header: OptimizedHeader,
        states: Vec<Id>,
        events: Vec<Id>,
        actions: Vec<Id>,
        transitions: Vec<OptimizedTransition>,
    ) -> Self {
        Self {
            header,
            states,
            events,
            actions,
            transitions,
        }
    }

    pub fn header(&self) -> &OptimizedHeader {
        &self.header
    }

    /// Concrete state names in hierarchy order.
    pub fn states(&self) -> &[Id] {
        &self.states
    }

    pub fn events(&self) -> &[Id] {
        &self.events
    }

    pub fn actions(&self) -> &[Id] {
        &self.actions
    }

    pub fn transitions(&self) -> &[OptimizedTransition] {
        &self.transitions
    }

    /// Look up the transition table of a concrete state.
    pub fn transition(&self, state: Id) -> Option<&OptimizedTransition> {
        self.transitions
            .iter()
            .find(|transition| transition.current_state == state)
    }
}

impl fmt::Display for OptimizedStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initial: {}", OptionalName(self.header.initial))?;
        writeln!(f, "Fsm: {}", OptionalName(self.header.fsm))?;
        writeln!(f, "Actions:{}", OptionalName(self.header.actions_class))?;
        writeln!(f, "{{")?;
        for transition in &self.transitions {
            writeln!(f, "  {} {{", transition.current_state)?;
            for sub in &transition.sub_transitions {
                write!(f, "    {} {} {{", sub.event, sub.next_state)?;
                write_joined(f, &sub.actions)?;
                writeln!(f, "}}")?;
            }
            writeln!(f, "  }}")?;
        }
        writeln!(f, "}}")
    }
}
