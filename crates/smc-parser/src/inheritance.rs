//! Flattening of multiple inheritance into a single-parent tree.
//!
//! After [`resolve_inheritance`] every state has at most one superstate and
//! the states are ordered by a depth-first walk of the resulting tree.
//!
//! The resolver works on an arena of tree nodes. Every state starts as a
//! child of a virtual root, holding one fresh leaf per declared substate.
//! Merging moves whole subtrees under the superstate that covers them:
//!
//! - **substitution**: when all children of `src` are direct children of some
//!   node below `dst`, a node for `src` replaces them there;
//! - **union**: when `dst`'s subtree already holds a node named `src`, the
//!   children of `src` are merged into it.
//!
//! A leaf still reachable through several paths afterwards is an
//! *intersection*: it is moved to the root and inherits the behavior of all
//! of its former ancestors explicitly.
//!
//! Running the resolver on a machine whose states already have at most one
//! superstate changes nothing and reports nothing.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use smc_core::{
    identifier::Id,
    semantic::{AnalysisWarning, AnalysisWarningKind, SemanticStateMachine},
};

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug)]
struct Node {
    name: Id,
    children: IndexMap<Id, NodeId>,
}

/// How a state was merged into another subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Substituted,
    United,
}

/// Rewrite `machine` so that every state has at most one superstate.
///
/// Appends `IMPLICIT_SUPERSTATE`, `REDUNDANT_SUPERSTATE` and
/// `SUPERSTATES_INTERSECTION` warnings to the machine.
pub fn resolve_inheritance(machine: &mut SemanticStateMachine) {
    debug!(states = machine.states().len(); "Resolving inheritance");
    let mut tree = InheritanceTree::from_machine(machine);

    let mut warnings = tree.simplify(machine);
    warnings.extend(tree.resolve_intersections(machine));

    tree.assign_super_states(machine);
    machine.reorder_states(tree.preorder());

    debug!(warnings = warnings.len(); "Inheritance resolved");
    for warning in warnings {
        machine.add_warning(warning);
    }
}

struct InheritanceTree {
    nodes: Vec<Node>,
}

impl InheritanceTree {
    /// One root child per state, each holding a fresh leaf per declared substate.
    fn from_machine(machine: &SemanticStateMachine) -> Self {
        let mut parent_children: IndexMap<Id, Vec<Id>> = IndexMap::new();
        for state in machine.states().values() {
            parent_children.entry(state.name()).or_default();
            for super_state in state.super_states() {
                parent_children
                    .entry(*super_state)
                    .or_default()
                    .push(state.name());
            }
        }

        let mut tree = Self {
            nodes: vec![Node {
                name: Id::new(""),
                children: IndexMap::new(),
            }],
        };
        for (name, children) in parent_children {
            let leaves = children
                .into_iter()
                .map(|child| (child, tree.add_node(child, IndexMap::new())))
                .collect();
            let node = tree.add_node(name, leaves);
            tree.nodes[ROOT].children.insert(name, node);
        }
        tree
    }

    fn add_node(&mut self, name: Id, children: IndexMap<Id, NodeId>) -> NodeId {
        self.nodes.push(Node { name, children });
        self.nodes.len() - 1
    }

    fn child_entries(&self, node: NodeId) -> Vec<(Id, NodeId)> {
        self.nodes[node]
            .children
            .iter()
            .map(|(name, child)| (*name, *child))
            .collect()
    }

    /// Merge root subtrees into each other until no more merges apply.
    ///
    /// Root superstates are merged among themselves first, then every state
    /// is tried against the ones after it, smallest subtrees first.
    fn simplify(&mut self, machine: &SemanticStateMachine) -> Vec<AnalysisWarning> {
        let mut candidates: Vec<(usize, Id, NodeId)> = self.nodes[ROOT]
            .children
            .iter()
            .enumerate()
            .map(|(idx, (name, node))| (idx, *name, *node))
            .collect();
        candidates.sort_by(|(lhs_idx, _, lhs), (rhs_idx, _, rhs)| {
            self.nodes[*lhs]
                .children
                .len()
                .cmp(&self.nodes[*rhs].children.len())
                .then(rhs_idx.cmp(lhs_idx))
        });

        let (roots, rest): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .map(|(_, name, node)| (name, node))
            .partition(|(name, _)| {
                machine
                    .state(*name)
                    .is_none_or(|state| state.super_states().is_empty())
            });

        let mut removed = HashSet::new();
        let mut warnings = self.substitute_all(&roots, &mut removed, machine);
        let everything: Vec<(Id, NodeId)> = rest.into_iter().chain(roots).collect();
        warnings.extend(self.substitute_all(&everything, &mut removed, machine));
        warnings
    }

    fn substitute_all(
        &mut self,
        candidates: &[(Id, NodeId)],
        removed: &mut HashSet<Id>,
        machine: &SemanticStateMachine,
    ) -> Vec<AnalysisWarning> {
        let mut warnings = Vec::new();
        for (idx, (src_name, src)) in candidates.iter().enumerate() {
            if removed.contains(src_name) {
                continue;
            }
            for (dst_name, dst) in &candidates[idx + 1..] {
                if removed.contains(dst_name) {
                    continue;
                }
                let src_children: Vec<Id> = self.nodes[*src].children.keys().copied().collect();
                let Some(merge) = self.substitute_if_subset(*src, *dst) else {
                    continue;
                };
                trace!(src = src_name.to_string(), dst = dst_name.to_string(), merge:? = merge; "Merged superstate");
                warnings.extend(merge_warning(machine, *src_name, &src_children, *dst_name, merge));
                removed.insert(*src_name);
                self.nodes[ROOT].children.shift_remove(src_name);
                break;
            }
        }
        warnings
    }

    fn substitute_if_subset(&mut self, src: NodeId, dst: NodeId) -> Option<Merge> {
        let merge = if self.substitute_into(dst, src, &mut HashSet::new()) {
            Merge::Substituted
        } else if self.union_if_found(src, dst, &mut HashSet::new()) {
            Merge::United
        } else {
            return None;
        };
        self.remove_nested_duplicates(dst);
        Some(merge)
    }

    /// Replace the children of `suspect` found directly under `target` (or a
    /// node below it) by a single node for `suspect`.
    fn substitute_into(&mut self, target: NodeId, suspect: NodeId, visited: &mut HashSet<NodeId>) -> bool {
        if !visited.insert(target) {
            return false;
        }
        let suspect_name = self.nodes[suspect].name;

        if target != suspect && self.nodes[target].name != suspect_name {
            let wanted: Vec<Id> = self.nodes[suspect].children.keys().copied().collect();
            let mut found = IndexMap::new();
            for name in &wanted {
                match self.nodes[target].children.get(name) {
                    Some(node) => {
                        found.insert(*name, *node);
                    }
                    None => break,
                }
            }

            if !found.is_empty() && found.len() == wanted.len() {
                let found_names: Vec<Id> = found.keys().copied().collect();
                let wrapper = self.add_node(suspect_name, found);
                self.union(suspect, wrapper, &mut HashSet::new());
                let children = &mut self.nodes[target].children;
                children.insert(suspect_name, wrapper);
                for name in found_names {
                    if name != suspect_name {
                        children.shift_remove(&name);
                    }
                }
                return true;
            }
        }

        let children: Vec<NodeId> = self.nodes[target].children.values().copied().collect();
        children
            .into_iter()
            .any(|child| self.substitute_into(child, suspect, visited))
    }

    /// Merge `needle` into the node of the same name inside `haystack`.
    fn union_if_found(&mut self, needle: NodeId, haystack: NodeId, visited: &mut HashSet<NodeId>) -> bool {
        if !visited.insert(haystack) || self.nodes[haystack].children.is_empty() {
            return false;
        }
        let name = self.nodes[needle].name;
        if let Some(existing) = self.nodes[haystack].children.get(&name).copied() {
            self.union(needle, existing, &mut HashSet::new());
            return true;
        }

        let children: Vec<NodeId> = self.nodes[haystack].children.values().copied().collect();
        children
            .into_iter()
            .any(|child| self.union_if_found(needle, child, visited))
    }

    /// Copy the subtree of `src` into `dst`, merging nodes of the same name.
    fn union(&mut self, src: NodeId, dst: NodeId, visited: &mut HashSet<(NodeId, NodeId)>) {
        if src == dst || !visited.insert((src, dst)) {
            return;
        }
        for (name, child) in self.child_entries(src) {
            match self.nodes[dst].children.get(&name).copied() {
                None => {
                    self.nodes[dst].children.insert(name, child);
                }
                Some(existing) => self.union(child, existing, visited),
            }
        }
    }

    /// Drop children of `node` that also appear below one of their siblings.
    ///
    /// Siblings are compared smallest subtree first; the children keep their
    /// order in the tree.
    fn remove_nested_duplicates(&mut self, node: NodeId) {
        let mut entries = self.child_entries(node);
        entries.sort_by_key(|(_, child)| self.nodes[*child].children.len());

        for (idx, (name, child)) in entries.iter().enumerate() {
            for (_, sibling) in &entries[idx + 1..] {
                if self.union_if_found(*child, *sibling, &mut HashSet::new()) {
                    self.nodes[node].children.shift_remove(name);
                }
            }
        }
    }

    /// Leaves reachable through at least two paths, with every path below the
    /// root that leads to them.
    fn intersections(&self) -> IndexMap<Id, Vec<Vec<NodeId>>> {
        let mut paths: IndexMap<Id, Vec<Vec<NodeId>>> = IndexMap::new();
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        self.collect_leaf_paths(ROOT, &mut path, &mut on_path, &mut paths);
        paths.retain(|_, leaf_paths| leaf_paths.len() >= 2);
        paths
    }

    fn collect_leaf_paths(
        &self,
        node: NodeId,
        path: &mut Vec<NodeId>,
        on_path: &mut HashSet<NodeId>,
        paths: &mut IndexMap<Id, Vec<Vec<NodeId>>>,
    ) {
        for (name, child) in &self.nodes[node].children {
            if on_path.contains(child) {
                continue;
            }
            if self.nodes[*child].children.is_empty() {
                if !path.is_empty() {
                    paths.entry(*name).or_default().push(path.clone());
                }
            } else {
                path.push(*child);
                on_path.insert(*child);
                self.collect_leaf_paths(*child, path, on_path, paths);
                on_path.remove(child);
                path.pop();
            }
        }
    }

    /// Move every intersection to the root, copying inherited behavior onto it.
    fn resolve_intersections(&mut self, machine: &mut SemanticStateMachine) -> Vec<AnalysisWarning> {
        let intersections = self.intersections();
        if intersections.is_empty() {
            return Vec::new();
        }

        let hierarchies: HashMap<Id, HashSet<Id>> = machine
            .states()
            .keys()
            .map(|name| (*name, hierarchy(machine, *name)))
            .collect();

        let ancestors: IndexMap<Id, IndexSet<Id>> = intersections
            .iter()
            .map(|(name, paths)| {
                let ancestors: IndexSet<Id> = paths
                    .iter()
                    .flatten()
                    .map(|node| self.nodes[*node].name)
                    .collect();
                debug!(state = name.to_string(), ancestors = ancestors.len(); "Superstates intersection");
                (*name, ancestors)
            })
            .collect();

        for (name, ancestors) in &ancestors {
            inherit_transitions(machine, *name, ancestors);
        }
        prepend_boundary_actions(machine, &ancestors, &hierarchies);

        let mut warnings = Vec::new();
        for (name, paths) in intersections {
            for path in &paths {
                if let Some(parent) = path.last() {
                    self.nodes[*parent].children.shift_remove(&name);
                }
            }
            let leaf = self.add_node(name, IndexMap::new());
            self.nodes[ROOT].children.insert(name, leaf);
            if let Some(state) = machine.state_mut(name) {
                state.set_super_state(None);
            }

            warnings.push(AnalysisWarning::new(
                AnalysisWarningKind::SuperstatesIntersection,
                name.to_string(),
            ));
        }
        warnings
    }

    /// Give every state the superstate it has in the tree.
    fn assign_super_states(&self, machine: &mut SemanticStateMachine) {
        for name in self.nodes[ROOT].children.keys() {
            if let Some(state) = machine.state_mut(*name) {
                state.set_super_state(None);
            }
        }

        let mut visited = HashSet::from([ROOT]);
        let mut stack: Vec<NodeId> = self.nodes[ROOT].children.values().copied().collect();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            let parent = self.nodes[node].name;
            for (name, child) in &self.nodes[node].children {
                if let Some(state) = machine.state_mut(*name) {
                    state.set_super_state(Some(parent));
                }
                stack.push(*child);
            }
        }
    }

    /// State names in depth-first preorder.
    ///
    /// Root entries that also appear below another state are visited there.
    fn preorder(&self) -> Vec<Id> {
        let mut nested = HashSet::new();
        let mut visited = HashSet::from([ROOT]);
        let mut stack: Vec<NodeId> = self.nodes[ROOT].children.values().copied().collect();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            for (name, child) in &self.nodes[node].children {
                nested.insert(*name);
                stack.push(*child);
            }
        }

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut visited = HashSet::new();
        for (name, node) in &self.nodes[ROOT].children {
            if !nested.contains(name) && seen.insert(*name) {
                order.push(*name);
                self.visit_preorder(*node, &mut order, &mut seen, &mut visited);
            }
        }
        order
    }

    fn visit_preorder(
        &self,
        node: NodeId,
        order: &mut Vec<Id>,
        seen: &mut HashSet<Id>,
        visited: &mut HashSet<NodeId>,
    ) {
        if !visited.insert(node) {
            return;
        }
        for (name, child) in &self.nodes[node].children {
            if seen.insert(*name) {
                order.push(*name);
                self.visit_preorder(*child, order, seen, visited);
            }
        }
    }
}

/// The state itself and all of its declared superstates, transitively.
fn hierarchy(machine: &SemanticStateMachine, name: Id) -> HashSet<Id> {
    let mut hierarchy = HashSet::new();
    let mut pending = vec![name];
    while let Some(current) = pending.pop() {
        if !hierarchy.insert(current) {
            continue;
        }
        if let Some(state) = machine.state(current) {
            pending.extend(state.super_states().iter().copied());
        }
    }
    hierarchy
}

/// Append the transitions of every ancestor, nearest ancestor first.
fn inherit_transitions(machine: &mut SemanticStateMachine, name: Id, ancestors: &IndexSet<Id>) {
    let inherited: Vec<_> = ancestors
        .iter()
        .rev()
        .filter_map(|ancestor| machine.state(*ancestor))
        .flat_map(|ancestor| ancestor.transitions().iter().cloned())
        .collect();
    if let Some(state) = machine.state_mut(name) {
        state.transitions_mut().extend(inherited);
    }
}

/// Prefix every transition that leaves or enters an intersection with the
/// exit and entry actions of the ancestors it lost.
///
/// Leaving exits the ancestors the target is not part of, innermost first.
/// Entering then enters the ancestors the source is not part of, outermost
/// first. Both apply when one intersection moves to another.
fn prepend_boundary_actions(
    machine: &mut SemanticStateMachine,
    intersections: &IndexMap<Id, IndexSet<Id>>,
    hierarchies: &HashMap<Id, HashSet<Id>>,
) {
    let exit_actions: HashMap<Id, Vec<Id>> = machine
        .states()
        .values()
        .map(|state| (state.name(), state.exit_actions().to_vec()))
        .collect();
    let entry_actions: HashMap<Id, Vec<Id>> = machine
        .states()
        .values()
        .map(|state| (state.name(), state.entry_actions().to_vec()))
        .collect();

    let sources: Vec<Id> = machine.states().keys().copied().collect();
    for source in sources {
        let source_hierarchy = hierarchies.get(&source);
        let left = intersections.get(&source);
        let Some(state) = machine.state_mut(source) else {
            continue;
        };
        for transition in state.transitions_mut() {
            let next = transition.next_state();
            let mut actions: Vec<Id> = Vec::new();
            if let Some(ancestors) = left {
                let target = hierarchies.get(&next);
                actions.extend(
                    ancestors
                        .iter()
                        .rev()
                        .filter(|ancestor| target.is_none_or(|target| !target.contains(*ancestor)))
                        .filter_map(|ancestor| exit_actions.get(ancestor))
                        .flatten()
                        .copied(),
                );
            }
            if let Some(ancestors) = intersections.get(&next) {
                actions.extend(
                    ancestors
                        .iter()
                        .filter(|ancestor| {
                            source_hierarchy.is_none_or(|hierarchy| !hierarchy.contains(*ancestor))
                        })
                        .filter_map(|ancestor| entry_actions.get(ancestor))
                        .flatten()
                        .copied(),
                );
            }
            transition.prepend_actions(&actions);
        }
    }
}

/// Warning for a merge of `src` into the subtree of `dst`, if any.
///
/// Only substitutions are reported: a root superstate was placed
/// implicitly, any other one was redundant.
fn merge_warning(
    machine: &SemanticStateMachine,
    src: Id,
    src_children: &[Id],
    dst: Id,
    merge: Merge,
) -> Option<AnalysisWarning> {
    if merge == Merge::United || src_children.is_empty() {
        return None;
    }
    let src_is_root = machine
        .state(src)
        .is_none_or(|state| state.super_states().is_empty());
    if src_is_root {
        Some(AnalysisWarning::new(
            AnalysisWarningKind::ImplicitSuperstate,
            format!("{src}:{dst}"),
        ))
    } else {
        Some(redundant(src_children, dst))
    }
}

fn redundant(children: &[Id], dst: Id) -> AnalysisWarning {
    let children: Vec<String> = children.iter().map(Id::to_string).collect();
    AnalysisWarning::new(
        AnalysisWarningKind::RedundantSuperstate,
        format!("{}:{dst}", children.join(",")),
    )
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Parent picks for a forest: entry `k` names a parent among states `0..k`.
    fn forest_strategy() -> impl Strategy<Value = (Vec<prop::sample::Index>, bool)> {
        (prop::collection::vec(any::<prop::sample::Index>(), 1..12), any::<bool>())
    }

    fn build_forest(picks: &[prop::sample::Index], reversed: bool) -> SemanticStateMachine {
        let parents: Vec<Option<usize>> = picks
            .iter()
            .enumerate()
            .map(|(k, pick)| {
                let idx = pick.index(k + 1);
                (idx < k).then_some(idx)
            })
            .collect();
        let name = |idx: usize| Id::new(&format!("forest_state_{idx}"));

        let mut declared: Vec<usize> = (0..parents.len()).collect();
        if reversed {
            declared.reverse();
        }
        let mut machine = SemanticStateMachine::new();
        for idx in declared {
            let state = machine.state_entry(name(idx));
            if let Some(parent) = parents[idx] {
                state.add_super_state(name(parent));
            }
        }
        machine
    }

    // ===================
    // Property Test Functions
    // ===================

    /// A single-parent forest keeps its superstates and reports nothing.
    fn check_single_parent_forest_is_stable(
        picks: &[prop::sample::Index],
        reversed: bool,
    ) -> Result<(), TestCaseError> {
        let mut machine = build_forest(picks, reversed);
        let declared: HashMap<Id, Vec<Id>> = machine
            .states()
            .values()
            .map(|state| (state.name(), state.super_states().iter().copied().collect()))
            .collect();

        resolve_inheritance(&mut machine);
        prop_assert!(machine.warnings().is_empty());
        prop_assert_eq!(machine.states().len(), declared.len());
        for state in machine.states().values() {
            let supers: Vec<Id> = state.super_states().iter().copied().collect();
            prop_assert_eq!(Some(&supers), declared.get(&state.name()));
        }

        // Superstates precede their substates.
        let position: HashMap<Id, usize> = machine
            .states()
            .keys()
            .enumerate()
            .map(|(idx, name)| (*name, idx))
            .collect();
        for state in machine.states().values() {
            for parent in state.super_states() {
                prop_assert!(position[parent] < position[&state.name()]);
            }
        }
        Ok(())
    }

    /// A second run changes neither the states nor their order.
    fn check_resolver_is_idempotent(
        picks: &[prop::sample::Index],
        reversed: bool,
    ) -> Result<(), TestCaseError> {
        let mut machine = build_forest(picks, reversed);
        resolve_inheritance(&mut machine);
        let first = machine.to_string();

        resolve_inheritance(&mut machine);
        prop_assert_eq!(machine.to_string(), first);
        prop_assert!(machine.warnings().is_empty());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn single_parent_forest_is_stable((picks, reversed) in forest_strategy()) {
            check_single_parent_forest_is_stable(&picks, reversed)?;
        }

        #[test]
        fn resolver_is_idempotent((picks, reversed) in forest_strategy()) {
            check_resolver_is_idempotent(&picks, reversed)?;
        }
    }
}
