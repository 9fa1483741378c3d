//! Flattening of a resolved [`SemanticStateMachine`] into transition tables.
//!
//! Each concrete state gets one [`OptimizedTransition`] holding every event
//! it reacts to, its own and inherited ones. The most specific definition of
//! an event wins. Every sub-transition carries the complete action sequence:
//!
//! ```text
//! exits of the source chain the target is not part of (innermost first)
//! ++ entries of the target chain the source is not part of (outermost first)
//! ++ declared actions
//! ```
//!
//! The input is expected to be free of semantic errors and to have passed
//! through inheritance resolution.

use std::collections::HashSet;

use indexmap::IndexSet;
use log::{debug, trace};
use smc_core::{
    identifier::Id,
    optimized::{OptimizedHeader, OptimizedStateMachine, OptimizedSubTransition, OptimizedTransition},
    semantic::{SemanticStateMachine, SemanticTransition},
};

/// Build the optimized transition tables of `machine`.
pub fn optimize(machine: &SemanticStateMachine) -> OptimizedStateMachine {
    let optimizer = Optimizer { machine };

    let mut states = Vec::new();
    let mut transitions = Vec::new();
    for state in machine.states().values().filter(|state| !state.is_abstract()) {
        states.push(state.name());
        transitions.push(optimizer.transition(state.name()));
    }
    debug!(states = states.len(); "Optimized state machine");

    OptimizedStateMachine::new(
        OptimizedHeader::new(machine.fsm_name(), machine.initial_state(), machine.action_class()),
        states,
        machine.events().iter().copied().collect(),
        machine.actions().iter().copied().collect(),
        transitions,
    )
}

struct Optimizer<'a> {
    machine: &'a SemanticStateMachine,
}

impl Optimizer<'_> {
    /// The state's ancestors root first, ending with the state itself.
    fn chain(&self, state: Id) -> IndexSet<Id> {
        let mut chain = IndexSet::new();
        let mut visiting = HashSet::new();
        self.collect_chain(state, &mut chain, &mut visiting);
        chain
    }

    fn collect_chain(&self, state: Id, chain: &mut IndexSet<Id>, visiting: &mut HashSet<Id>) {
        if !visiting.insert(state) {
            return;
        }
        if let Some(semantic) = self.machine.state(state) {
            for super_state in semantic.super_states() {
                self.collect_chain(*super_state, chain, visiting);
            }
        }
        chain.insert(state);
    }

    fn transition(&self, state: Id) -> OptimizedTransition {
        let chain = self.chain(state);
        let mut handled = HashSet::new();
        let mut sub_transitions = Vec::new();

        for owner in chain.iter().rev() {
            let Some(owner) = self.machine.state(*owner) else {
                continue;
            };
            for transition in owner.transitions() {
                let Some(event) = transition.event() else {
                    continue;
                };
                if !handled.insert(event) {
                    trace!(state = state.to_string(), event = event.to_string(); "Inherited event overridden");
                    continue;
                }
                sub_transitions.push(self.sub_transition(&chain, event, transition));
            }
        }
        OptimizedTransition::new(state, sub_transitions)
    }

    fn sub_transition(
        &self,
        source_chain: &IndexSet<Id>,
        event: Id,
        transition: &SemanticTransition,
    ) -> OptimizedSubTransition {
        let target = transition.next_state();
        let target_chain = self.chain(target);

        let exits = source_chain
            .iter()
            .rev()
            .filter(|state| !target_chain.contains(*state))
            .filter_map(|state| self.machine.state(*state))
            .flat_map(|state| state.exit_actions().iter().copied());
        let entries = target_chain
            .iter()
            .filter(|state| !source_chain.contains(*state))
            .filter_map(|state| self.machine.state(*state))
            .flat_map(|state| state.entry_actions().iter().copied());
        let actions = exits
            .chain(entries)
            .chain(transition.actions().iter().copied())
            .collect();

        OptimizedSubTransition::new(event, target, actions)
    }
}

#[cfg(test)]
mod tests {
    use smc_parser::{analyze, parse, resolve_inheritance};

    use super::*;

    fn optimized(source: &str) -> OptimizedStateMachine {
        let mut machine = analyze(&parse(source));
        assert!(!machine.has_errors(), "{:?}", machine.errors());
        resolve_inheritance(&mut machine);
        optimize(&machine)
    }

    fn ids(names: &[&str]) -> Vec<Id> {
        names.iter().map(|name| Id::new(name)).collect()
    }

    fn actions(machine: &OptimizedStateMachine, state: &str, event: &str) -> Vec<Id> {
        machine
            .transition(Id::new(state))
            .and_then(|transition| transition.sub_transition(Id::new(event)))
            .map(|sub| sub.actions().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_diamond_action_sequence() {
        let machine = optimized(
            "fsm:f initial:i {
               (ib1) >ib1x {}
               (ib2) :ib1 >ib2x {}
               (ib3) :ib1 >ib3x {}
               i :ib2 :ib3 >x e s a
               s e i -
             }",
        );
        assert_eq!(actions(&machine, "i", "e"), ids(&["x", "ib3x", "ib2x", "ib1x", "a"]));
        assert_eq!(machine.states(), ids(&["i", "s"]).as_slice());
    }

    #[test]
    fn test_override_keeps_most_specific_definition() {
        let machine = optimized(
            "fsm:f initial:s {
               (b) e s fromBase
               s :b e s own
             }",
        );
        let transition = machine.transition(Id::new("s")).expect("state s");
        assert_eq!(transition.sub_transitions().len(), 1);
        assert_eq!(actions(&machine, "s", "e"), ids(&["own"]));
    }

    #[test]
    fn test_self_transition_skips_exit_and_entry() {
        let machine = optimized("fsm:f initial:s {s <n >x e - a}");
        assert_eq!(actions(&machine, "s", "e"), ids(&["a"]));
    }

    #[test]
    fn test_transition_within_superstate() {
        let machine = optimized(
            "fsm:f initial:a {
               (p) <pn >px {}
               a :p <an >ax e b act
               b :p <bn >bx e a -
             }",
        );
        assert_eq!(actions(&machine, "a", "e"), ids(&["ax", "bn", "act"]));
    }

    #[test]
    fn test_transition_leaving_superstate() {
        let machine = optimized(
            "fsm:f initial:a {
               (p) <pn >px {}
               a :p <an >ax e b act
               b <bn >bx e a -
             }",
        );
        assert_eq!(actions(&machine, "a", "e"), ids(&["ax", "px", "bn", "act"]));
        assert_eq!(actions(&machine, "b", "e"), ids(&["bx", "pn", "an"]));
    }

    #[test]
    fn test_nil_events_are_not_emitted() {
        let machine = optimized("fsm:f initial:s {s - - a}");
        let transition = machine.transition(Id::new("s")).expect("state s");
        assert!(transition.sub_transitions().is_empty());
    }

    #[test]
    fn test_turnstile_acceptance() {
        let machine = optimized(
            "Actions: Turnstile
             FSM: TwoCoinTurnstile
             Initial: Locked
             {
               (Base) Reset Locked lock
               Locked : Base { Pass Alarming - Coin FirstCoin - }
               Alarming : Base <alarmOn >alarmOff - - -
               FirstCoin : Base { Pass Alarming - Coin Unlocked unlock }
               Unlocked : Base { Pass Locked lock Coin - thankyou }
             }",
        );

        assert_eq!(
            machine.states(),
            ids(&["Locked", "Alarming", "FirstCoin", "Unlocked"]).as_slice()
        );
        assert_eq!(machine.transitions().len(), 4);
        assert_eq!(machine.header().fsm(), Some(Id::new("TwoCoinTurnstile")));

        for name in ["Locked", "FirstCoin", "Unlocked"] {
            let transition = machine.transition(Id::new(name)).expect("concrete state");
            let events: HashSet<Id> = transition.sub_transitions().iter().map(|sub| sub.event()).collect();
            assert_eq!(transition.sub_transitions().len(), 3, "{name}");
            assert_eq!(events, ids(&["Reset", "Pass", "Coin"]).into_iter().collect());
        }

        assert_eq!(actions(&machine, "Locked", "Pass"), ids(&["alarmOn"]));
        assert_eq!(actions(&machine, "Alarming", "Reset"), ids(&["alarmOff", "lock"]));
        assert_eq!(actions(&machine, "Unlocked", "Coin"), ids(&["thankyou"]));
        assert_eq!(
            machine
                .transition(Id::new("Alarming"))
                .map(|transition| transition.sub_transitions().len()),
            Some(1)
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;
    use smc_core::semantic::SemanticTransition;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// `(parent pick, abstract, [(event, target pick)])` per state.
    type StatePlan = (prop::sample::Index, bool, Vec<(u8, prop::sample::Index)>);

    fn machine_strategy() -> impl Strategy<Value = Vec<StatePlan>> {
        prop::collection::vec(
            (
                any::<prop::sample::Index>(),
                any::<bool>(),
                prop::collection::vec((0u8..4, any::<prop::sample::Index>()), 0..4),
            ),
            1..10,
        )
    }

    fn build_machine(plan: &[StatePlan]) -> SemanticStateMachine {
        let name = |idx: usize| Id::new(&format!("plan_state_{idx}"));
        let mut machine = SemanticStateMachine::new();
        for (idx, (parent, is_abstract, transitions)) in plan.iter().enumerate() {
            let parent = parent.index(idx + 1);
            let state = machine.state_entry(name(idx));
            if *is_abstract {
                state.mark_abstract();
            }
            if parent < idx {
                state.add_super_state(name(parent));
            }
            for (event, target) in transitions {
                let event = Id::new(&format!("plan_event_{event}"));
                state.add_transition(SemanticTransition::new(
                    Some(event),
                    name(target.index(plan.len())),
                    Vec::new(),
                ));
            }
        }
        machine
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Only concrete states are emitted, each event at most once per state.
    fn check_tables_are_well_formed(plan: &[StatePlan]) -> Result<(), TestCaseError> {
        let machine = build_machine(plan);
        let optimized = optimize(&machine);

        let concrete: Vec<Id> = machine
            .states()
            .values()
            .filter(|state| !state.is_abstract())
            .map(|state| state.name())
            .collect();
        prop_assert_eq!(optimized.states(), concrete.as_slice());
        prop_assert_eq!(optimized.transitions().len(), concrete.len());

        for transition in optimized.transitions() {
            let mut events = HashSet::new();
            for sub in transition.sub_transitions() {
                prop_assert!(events.insert(sub.event()));
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn tables_are_well_formed(plan in machine_strategy()) {
            check_tables_are_well_formed(&plan)?;
        }
    }
}
