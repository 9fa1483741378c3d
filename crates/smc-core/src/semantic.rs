//! Validated, name-resolved state machine model.
//!
//! The semantic analyzer builds a [`SemanticStateMachine`] once from the raw
//! syntax tree; the inheritance resolver then rewrites it in place so every
//! state has at most one superstate. After that it is read-only input for the
//! optimizer and for generators that work on the non-flattened machine.
//!
//! # Ordering
//!
//! - `states` keep the order in which they were registered, until the
//!   inheritance resolver replaces it with a depth-first walk of the tree.
//! - superstates of a state are ordered by name.
//! - `events` and `actions` keep the order of their first occurrence.
//!
//! States reference each other only by [`Id`]; the machine owns every state.

use std::{collections::BTreeSet, fmt};

use indexmap::{IndexMap, IndexSet};

use crate::identifier::Id;

/// Kinds of hard semantic errors. Any of these blocks code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisErrorKind {
    NoFsm,
    NoInitial,
    InvalidHeader,
    ExtraHeaderIgnored,
    UndefinedState,
    UndefinedSuperState,
    UnusedState,
    DuplicateTransition,
    AbstractStateUsedAsNextState,
    StateActionsMultiplyDefined,
    ConflictingSuperstates,
}

impl AnalysisErrorKind {
    /// Returns the canonical upper-case name, e.g. `UNDEFINED_STATE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFsm => "NO_FSM",
            Self::NoInitial => "NO_INITIAL",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::ExtraHeaderIgnored => "EXTRA_HEADER_IGNORED",
            Self::UndefinedState => "UNDEFINED_STATE",
            Self::UndefinedSuperState => "UNDEFINED_SUPER_STATE",
            Self::UnusedState => "UNUSED_STATE",
            Self::DuplicateTransition => "DUPLICATE_TRANSITION",
            Self::AbstractStateUsedAsNextState => "ABSTRACT_STATE_USED_AS_NEXT_STATE",
            Self::StateActionsMultiplyDefined => "STATE_ACTIONS_MULTIPLY_DEFINED",
            Self::ConflictingSuperstates => "CONFLICTING_SUPERSTATES",
        }
    }
}

impl fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of soft semantic findings. Warnings never block generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisWarningKind {
    InconsistentAbstraction,
    ImplicitSuperstate,
    RedundantSuperstate,
    SuperstatesIntersection,
}

impl AnalysisWarningKind {
    /// Returns the canonical upper-case name, e.g. `REDUNDANT_SUPERSTATE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InconsistentAbstraction => "INCONSISTENT_ABSTRACTION",
            Self::ImplicitSuperstate => "IMPLICIT_SUPERSTATE",
            Self::RedundantSuperstate => "REDUNDANT_SUPERSTATE",
            Self::SuperstatesIntersection => "SUPERSTATES_INTERSECTION",
        }
    }
}

impl fmt::Display for AnalysisWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A semantic error together with the subject it refers to.
///
/// The subject is a short rendering of the offending construct, e.g.
/// `s(e)` for a duplicate transition or `x|e1` for a superstate conflict.
/// It is empty for errors about the machine as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisError {
    kind: AnalysisErrorKind,
    subject: String,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }

    pub fn kind(&self) -> AnalysisErrorKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Semantic Error: {}({})", self.kind, self.subject)
    }
}

impl std::error::Error for AnalysisError {}

/// A semantic warning together with the subject it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisWarning {
    kind: AnalysisWarningKind,
    subject: String,
}

impl AnalysisWarning {
    pub fn new(kind: AnalysisWarningKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
        }
    }

    pub fn kind(&self) -> AnalysisWarningKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Semantic Warning: {}({})", self.kind, self.subject)
    }
}

/// A transition owned by a [`SemanticState`].
///
/// `event` is `None` for the nil event `-`. The next state is always a
/// concrete key: a nil next-state is resolved to the declaring state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticTransition {
    event: Option<Id>,
    next_state: Id,
    actions: Vec<Id>,
}

impl SemanticTransition {
    pub fn new(event: Option<Id>, next_state: Id, actions: Vec<Id>) -> Self {
        Self {
            event,
            next_state,
            actions,
        }
    }

    pub fn event(&self) -> Option<Id> {
        self.event
    }

    pub fn next_state(&self) -> Id {
        self.next_state
    }

    pub fn actions(&self) -> &[Id] {
        &self.actions
    }

    /// Insert `actions` in front of the declared actions, keeping their order.
    pub fn prepend_actions(&mut self, actions: &[Id]) {
        if actions.is_empty() {
            return;
        }
        self.actions.splice(0..0, actions.iter().copied());
    }
}

/// A state after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticState {
    name: Id,
    is_abstract: bool,
    super_states: BTreeSet<Id>,
    entry_actions: Vec<Id>,
    exit_actions: Vec<Id>,
    transitions: Vec<SemanticTransition>,
}

impl SemanticState {
    pub fn new(name: Id) -> Self {
        Self {
            name,
            is_abstract: false,
            super_states: BTreeSet::new(),
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    /// Abstract states group behavior for substates and are never emitted.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn super_states(&self) -> &BTreeSet<Id> {
        &self.super_states
    }

    pub fn entry_actions(&self) -> &[Id] {
        &self.entry_actions
    }

    pub fn exit_actions(&self) -> &[Id] {
        &self.exit_actions
    }

    pub fn transitions(&self) -> &[SemanticTransition] {
        &self.transitions
    }

    pub fn transitions_mut(&mut self) -> &mut Vec<SemanticTransition> {
        &mut self.transitions
    }

    pub fn mark_abstract(&mut self) {
        self.is_abstract = true;
    }

    pub fn add_super_state(&mut self, super_state: Id) {
        self.super_states.insert(super_state);
    }

    /// Replace all superstates with at most one.
    pub fn set_super_state(&mut self, super_state: Option<Id>) {
        self.super_states.clear();
        self.super_states.extend(super_state);
    }

    /// Append an entry action unless the list already holds it.
    pub fn add_entry_action(&mut self, action: Id) {
        if !self.entry_actions.contains(&action) {
            self.entry_actions.push(action);
        }
    }

    /// Append an exit action unless the list already holds it.
    pub fn add_exit_action(&mut self, action: Id) {
        if !self.exit_actions.contains(&action) {
            self.exit_actions.push(action);
        }
    }

    pub fn add_transition(&mut self, transition: SemanticTransition) {
        self.transitions.push(transition);
    }
}

impl fmt::Display for SemanticState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_abstract {
            write!(f, "\n  ({})", self.name)?;
        } else {
            write!(f, "\n  {}", self.name)?;
        }
        for super_state in &self.super_states {
            write!(f, " :{super_state}")?;
        }
        for action in &self.entry_actions {
            write!(f, " <{action}")?;
        }
        for action in &self.exit_actions {
            write!(f, " >{action}")?;
        }
        writeln!(f, " {{")?;
        for transition in &self.transitions {
            match transition.event {
                Some(event) => write!(f, "    {event}")?,
                None => write!(f, "    null")?,
            }
            write!(f, " {} {{", transition.next_state)?;
            write_joined(f, &transition.actions)?;
            writeln!(f, "}}")?;
        }
        writeln!(f, "  }}")
    }
}

/// The whole machine after semantic analysis.
#[derive(Debug, Clone, Default)]
pub struct SemanticStateMachine {
    fsm_name: Option<Id>,
    initial_state: Option<Id>,
    action_class: Option<Id>,
    states: IndexMap<Id, SemanticState>,
    events: IndexSet<Id>,
    actions: IndexSet<Id>,
    errors: Vec<AnalysisError>,
    warnings: Vec<AnalysisWarning>,
}

impl SemanticStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `fsm` header.
    pub fn fsm_name(&self) -> Option<Id> {
        self.fsm_name
    }

    /// Value of the `initial` header, set only when it names a defined state.
    pub fn initial_state(&self) -> Option<Id> {
        self.initial_state
    }

    /// Value of the `actions` header.
    pub fn action_class(&self) -> Option<Id> {
        self.action_class
    }

    pub fn states(&self) -> &IndexMap<Id, SemanticState> {
        &self.states
    }

    pub fn state(&self, name: Id) -> Option<&SemanticState> {
        self.states.get(&name)
    }

    pub fn state_mut(&mut self, name: Id) -> Option<&mut SemanticState> {
        self.states.get_mut(&name)
    }

    pub fn contains_state(&self, name: Id) -> bool {
        self.states.contains_key(&name)
    }

    pub fn events(&self) -> &IndexSet<Id> {
        &self.events
    }

    pub fn actions(&self) -> &IndexSet<Id> {
        &self.actions
    }

    pub fn errors(&self) -> &[AnalysisError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn set_fsm_name(&mut self, name: Id) {
        self.fsm_name = Some(name);
    }

    pub fn set_initial_state(&mut self, name: Id) {
        self.initial_state = Some(name);
    }

    pub fn set_action_class(&mut self, name: Id) {
        self.action_class = Some(name);
    }

    /// Return the state called `name`, registering an empty one first if needed.
    pub fn state_entry(&mut self, name: Id) -> &mut SemanticState {
        self.states
            .entry(name)
            .or_insert_with(|| SemanticState::new(name))
    }

    pub fn add_event(&mut self, event: Id) {
        self.events.insert(event);
    }

    pub fn add_action(&mut self, action: Id) {
        self.actions.insert(action);
    }

    pub fn add_error(&mut self, error: AnalysisError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: AnalysisWarning) {
        self.warnings.push(warning);
    }

    /// Reorder states to follow `order`.
    ///
    /// Names in `order` that are not states are ignored; states missing from
    /// `order` keep their relative order after the listed ones.
    pub fn reorder_states(&mut self, order: impl IntoIterator<Item = Id>) {
        let mut remaining = std::mem::take(&mut self.states);
        let mut states = IndexMap::with_capacity(remaining.len());
        for name in order {
            if let Some(state) = remaining.shift_remove(&name) {
                states.insert(name, state);
            }
        }
        states.extend(remaining);
        self.states = states;
    }
}

impl fmt::Display for SemanticStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Actions: {}", OptionalName(self.action_class))?;
        writeln!(f, "FSM: {}", OptionalName(self.fsm_name))?;
        write!(f, "Initial: {}", OptionalName(self.initial_state))?;
        write!(f, "{{")?;
        for state in self.states.values() {
            write!(f, "{state}")?;
        }
        writeln!(f, "}}")
    }
}

/// Renders an optional header value, empty when absent.
pub(crate) struct OptionalName(pub(crate) Option<Id>);

impl fmt::Display for OptionalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, "{name}"),
            None => Ok(()),
        }
    }
}

pub(crate) fn write_joined(f: &mut fmt::Formatter<'_>, names: &[Id]) -> fmt::Result {
    for (idx, name) in names.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{name}")?;
    }
    Ok(())
}
