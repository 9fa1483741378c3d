//! Semantic analysis: name resolution and validation of an [`FsmSyntax`].
//!
//! The analyzer runs in a fixed order, which also fixes the order of the
//! reported diagnostics:
//!
//! 1. headers
//! 2. state registration (merging repeated state specs)
//! 3. superstate, next-state and initial-state references
//! 4. unused states
//! 5. duplicate transitions
//! 6. abstraction consistency
//! 7. conflicting superstates
//!
//! No flattening happens here; see [`crate::inheritance`] for that.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use smc_core::{
    identifier::Id,
    semantic::{
        AnalysisError, AnalysisErrorKind, AnalysisWarning, AnalysisWarningKind, SemanticStateMachine,
        SemanticTransition,
    },
};

use crate::syntax::{FsmSyntax, Header};

/// Build a [`SemanticStateMachine`] from a syntax tree.
///
/// Never fails: every problem is recorded in the machine's errors and
/// warnings.
pub fn analyze(syntax: &FsmSyntax) -> SemanticStateMachine {
    debug!(transitions = syntax.logic.len(), headers = syntax.headers.len(); "Analyzing state machine");
    let mut analyzer = SemanticAnalyzer::new(syntax);
    analyzer.analyze_headers();
    analyzer.register_states();
    analyzer.resolve_references();
    analyzer.check_unused_states();
    analyzer.check_duplicate_transitions();
    analyzer.check_abstraction_consistency();
    analyzer.check_conflicting_superstates();
    let machine = analyzer.machine;
    debug!(
        states = machine.states().len(),
        errors = machine.errors().len(),
        warnings = machine.warnings().len();
        "Semantic analysis finished"
    );
    machine
}

struct SemanticAnalyzer<'a> {
    syntax: &'a FsmSyntax,
    machine: SemanticStateMachine,
    initial_header: Option<Id>,
    reported: HashSet<(AnalysisErrorKind, String)>,
    abstract_declarations: HashSet<Id>,
    concrete_declarations: HashSet<Id>,
}

impl<'a> SemanticAnalyzer<'a> {
    fn new(syntax: &'a FsmSyntax) -> Self {
        Self {
            syntax,
            machine: SemanticStateMachine::new(),
            initial_header: None,
            reported: HashSet::new(),
            abstract_declarations: HashSet::new(),
            concrete_declarations: HashSet::new(),
        }
    }

    /// Record an error once per kind and subject.
    fn error(&mut self, kind: AnalysisErrorKind, subject: impl Into<String>) {
        let subject = subject.into();
        if self.reported.insert((kind, subject.clone())) {
            trace!(kind = kind.as_str(), subject = subject.as_str(); "Semantic error");
            self.machine.add_error(AnalysisError::new(kind, subject));
        }
    }

    fn analyze_headers(&mut self) {
        let syntax = self.syntax;
        for header in &syntax.headers {
            let name = header.name.to_string().to_ascii_lowercase();
            match name.as_str() {
                "fsm" => match self.machine.fsm_name() {
                    None => self.machine.set_fsm_name(header.value),
                    Some(_) => self.extra_header(header),
                },
                "initial" => match self.initial_header {
                    None => self.initial_header = Some(header.value),
                    Some(_) => self.extra_header(header),
                },
                "actions" => match self.machine.action_class() {
                    None => self.machine.set_action_class(header.value),
                    Some(_) => self.extra_header(header),
                },
                _ => self.error(AnalysisErrorKind::InvalidHeader, header_subject(header)),
            }
        }

        if self.machine.fsm_name().is_none() {
            self.error(AnalysisErrorKind::NoFsm, "");
        }
        if self.initial_header.is_none() {
            self.error(AnalysisErrorKind::NoInitial, "");
        }
    }

    fn extra_header(&mut self, header: &Header) {
        self.error(AnalysisErrorKind::ExtraHeaderIgnored, header_subject(header));
    }

    /// Register every transition subject as a state and merge repeated specs.
    fn register_states(&mut self) {
        let syntax = self.syntax;
        let mut declared_actions: HashMap<Id, (&[Id], &[Id])> = HashMap::new();

        for transition in &syntax.logic {
            let spec = &transition.state;
            if spec.is_abstract {
                self.abstract_declarations.insert(spec.name);
            } else {
                self.concrete_declarations.insert(spec.name);
            }

            let state = self.machine.state_entry(spec.name);
            if spec.is_abstract {
                state.mark_abstract();
            }
            for action in &spec.entry_actions {
                state.add_entry_action(*action);
            }
            for action in &spec.exit_actions {
                state.add_exit_action(*action);
            }

            if spec.has_actions() {
                let key = (spec.entry_actions.as_slice(), spec.exit_actions.as_slice());
                match declared_actions.get(&spec.name) {
                    None => {
                        declared_actions.insert(spec.name, key);
                    }
                    Some(previous) if *previous != key => {
                        self.error(
                            AnalysisErrorKind::StateActionsMultiplyDefined,
                            spec.name.to_string(),
                        );
                    }
                    Some(_) => {}
                }
            }

            for action in spec.entry_actions.iter().chain(&spec.exit_actions) {
                self.machine.add_action(*action);
            }
            for sub in &transition.sub_transitions {
                if let Some(event) = sub.event {
                    self.machine.add_event(event);
                }
                for action in &sub.actions {
                    self.machine.add_action(*action);
                }
            }
        }
    }

    /// Resolve superstates and next states, then the initial state.
    fn resolve_references(&mut self) {
        let syntax = self.syntax;
        for transition in &syntax.logic {
            let spec = &transition.state;

            for super_state in &spec.super_states {
                if self.machine.contains_state(*super_state) {
                    if let Some(state) = self.machine.state_mut(spec.name) {
                        state.add_super_state(*super_state);
                    }
                } else {
                    self.error(AnalysisErrorKind::UndefinedSuperState, super_state.to_string());
                }
            }

            for sub in &transition.sub_transitions {
                let next_state = sub.next_state.unwrap_or(spec.name);
                let Some(target) = self.machine.state(next_state) else {
                    self.error(AnalysisErrorKind::UndefinedState, next_state.to_string());
                    continue;
                };
                if sub.next_state.is_some() && target.is_abstract() {
                    let event = sub.event.map_or_else(|| "-".to_string(), |event| event.to_string());
                    self.error(
                        AnalysisErrorKind::AbstractStateUsedAsNextState,
                        format!("{}({event})->{next_state}", spec.name),
                    );
                }
                if let Some(state) = self.machine.state_mut(spec.name) {
                    state.add_transition(SemanticTransition::new(
                        sub.event,
                        next_state,
                        sub.actions.clone(),
                    ));
                }
            }
        }

        if let Some(initial) = self.initial_header {
            if self.machine.contains_state(initial) {
                self.machine.set_initial_state(initial);
            } else {
                self.error(AnalysisErrorKind::UndefinedState, format!("initial: {initial}"));
            }
        }
    }

    /// A state is used when it is the initial state, a superstate or a next state.
    fn check_unused_states(&mut self) {
        let mut used: HashSet<Id> = self.initial_header.into_iter().collect();
        for state in self.machine.states().values() {
            used.extend(state.super_states().iter().copied());
            used.extend(state.transitions().iter().map(SemanticTransition::next_state));
        }

        let unused: Vec<Id> = self
            .machine
            .states()
            .keys()
            .copied()
            .filter(|name| !used.contains(name))
            .collect();
        for name in unused {
            self.error(AnalysisErrorKind::UnusedState, name.to_string());
        }
    }

    /// Nil events never count as duplicates.
    fn check_duplicate_transitions(&mut self) {
        let syntax = self.syntax;
        let mut seen: HashSet<(Id, Id)> = HashSet::new();
        for transition in &syntax.logic {
            let state = transition.state.name;
            for event in transition.sub_transitions.iter().filter_map(|sub| sub.event) {
                if !seen.insert((state, event)) {
                    self.error(AnalysisErrorKind::DuplicateTransition, format!("{state}({event})"));
                }
            }
        }
    }

    fn check_abstraction_consistency(&mut self) {
        let inconsistent: Vec<Id> = self
            .machine
            .states()
            .keys()
            .copied()
            .filter(|name| {
                self.abstract_declarations.contains(name) && self.concrete_declarations.contains(name)
            })
            .collect();
        for name in inconsistent {
            self.machine.add_warning(AnalysisWarning::new(
                AnalysisWarningKind::InconsistentAbstraction,
                name.to_string(),
            ));
        }
    }

    /// Two direct superstates must agree on every event the state inherits.
    fn check_conflicting_superstates(&mut self) {
        let mut conflicts = Vec::new();
        for state in self.machine.states().values() {
            if state.super_states().len() < 2 {
                continue;
            }
            let own_events: HashSet<Id> = state
                .transitions()
                .iter()
                .filter_map(SemanticTransition::event)
                .collect();
            let supers: Vec<Id> = state.super_states().iter().copied().collect();

            for (idx, first) in supers.iter().enumerate() {
                for second in &supers[idx + 1..] {
                    let (Some(first), Some(second)) =
                        (self.machine.state(*first), self.machine.state(*second))
                    else {
                        continue;
                    };
                    for inherited in first.transitions() {
                        let Some(event) = inherited.event() else {
                            continue;
                        };
                        if own_events.contains(&event) {
                            continue;
                        }
                        let differs = second
                            .transitions()
                            .iter()
                            .filter(|other| other.event() == Some(event))
                            .any(|other| {
                                other.next_state() != inherited.next_state()
                                    || other.actions() != inherited.actions()
                            });
                        if differs {
                            conflicts.push(format!("{}|{event}", state.name()));
                        }
                    }
                }
            }
        }
        for subject in conflicts {
            self.error(AnalysisErrorKind::ConflictingSuperstates, subject);
        }
    }
}

fn header_subject(header: &Header) -> String {
    format!("{}:{}", header.name, header.value)
}
