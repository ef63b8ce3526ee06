//! Explicit-state collaborators for small systems.
//!
//! [`ExplicitSet`] stores its members in an ordered set, which makes it
//! canonical for free. [`ExplicitSystem`] is a labelled edge list indexed in
//! both directions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::oracle::TransitionOracle;
use crate::set::SymbolicSet;

/// A finite set of concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplicitSet<T: Ord>(BTreeSet<T>);

impl<T: Ord> ExplicitSet<T> {
    pub fn new() -> Self {
        ExplicitSet(BTreeSet::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn insert(&mut self, value: T) -> bool {
        self.0.insert(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord> Default for ExplicitSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for ExplicitSet<T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        ExplicitSet(iter.into_iter().collect())
    }
}

impl<T: Ord + fmt::Debug> fmt::Display for ExplicitSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<T: Ord + Clone> SymbolicSet for ExplicitSet<T> {
    type Element = T;

    fn union(&self, other: &Self) -> Self {
        ExplicitSet(self.0.union(&other.0).cloned().collect())
    }

    fn difference(&self, other: &Self) -> Self {
        ExplicitSet(self.0.difference(&other.0).cloned().collect())
    }

    fn intersection(&self, other: &Self) -> Self {
        ExplicitSet(self.0.intersection(&other.0).cloned().collect())
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn pick_one(&self) -> Option<T> {
        self.0.first().cloned()
    }

    fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

/// Transition system given by its labelled edges `(from, input, to)`.
#[derive(Debug, Clone)]
pub struct ExplicitSystem<S: Ord, I: Ord> {
    successors: BTreeMap<S, BTreeSet<(I, S)>>,
    predecessors: BTreeMap<S, BTreeSet<(I, S)>>,
}

impl<S: Ord + Clone, I: Ord + Clone> ExplicitSystem<S, I> {
    pub fn new() -> Self {
        ExplicitSystem {
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn add_transition(&mut self, from: S, input: I, to: S) {
        self.successors
            .entry(from.clone())
            .or_default()
            .insert((input.clone(), to.clone()));
        self.predecessors.entry(to).or_default().insert((input, from));
    }

    /// Outgoing edges of `state` as `(input, target)` pairs.
    pub fn successors(&self, state: &S) -> impl Iterator<Item = &(I, S)> {
        self.successors.get(state).into_iter().flatten()
    }

    pub fn is_transition(&self, from: &S, input: &I, to: &S) -> bool {
        self.successors
            .get(from)
            .is_some_and(|edges| edges.iter().any(|(i, t)| i == input && t == to))
    }

    /// Number of labelled edges.
    pub fn num_transitions(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }
}

impl<S: Ord + Clone, I: Ord + Clone> Default for ExplicitSystem<S, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Ord + Clone, I: Ord + Clone> TransitionOracle for ExplicitSystem<S, I> {
    type States = ExplicitSet<S>;
    type Inputs = ExplicitSet<I>;

    fn forward_image(&self, states: &ExplicitSet<S>) -> ExplicitSet<S> {
        states
            .iter()
            .filter_map(|s| self.successors.get(s))
            .flatten()
            .map(|(_, t)| t.clone())
            .collect()
    }

    fn backward_image(&self, states: &ExplicitSet<S>) -> ExplicitSet<S> {
        states
            .iter()
            .filter_map(|s| self.predecessors.get(s))
            .flatten()
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn inputs_between(&self, from: &S, to: &S) -> ExplicitSet<I> {
        self.successors(from)
            .filter(|(_, t)| t == to)
            .map(|(i, _)| i.clone())
            .collect()
    }

    fn singleton(&self, state: &S) -> ExplicitSet<S> {
        ExplicitSet::from_iter([state.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_algebra() {
        let a = ExplicitSet::from_iter([1, 2, 3]);
        let b = ExplicitSet::from_iter([3, 4]);

        assert_eq!(a.union(&b), ExplicitSet::from_iter([1, 2, 3, 4]));
        assert_eq!(a.difference(&b), ExplicitSet::from_iter([1, 2]));
        assert_eq!(a.intersection(&b), ExplicitSet::from_iter([3]));
        assert!(ExplicitSet::from_iter([2, 3]).is_subset(&a));
        assert!(!b.is_subset(&a));
        assert_eq!(a.pick_one(), Some(1));
        assert_eq!(ExplicitSet::<i32>::new().pick_one(), None);
        assert_eq!(a.to_string(), "{1, 2, 3}");
    }

    #[test]
    fn test_images() {
        let mut sys = ExplicitSystem::new();
        sys.add_transition("a", 0, "b");
        sys.add_transition("a", 1, "b");
        sys.add_transition("a", 0, "c");
        sys.add_transition("c", 0, "a");

        let a = sys.singleton(&"a");
        assert_eq!(sys.forward_image(&a), ExplicitSet::from_iter(["b", "c"]));
        assert_eq!(sys.backward_image(&a), ExplicitSet::from_iter(["c"]));
        assert_eq!(sys.backward_image(&sys.singleton(&"b")), a);
        assert_eq!(sys.inputs_between(&"a", &"b"), ExplicitSet::from_iter([0, 1]));
        assert!(sys.inputs_between(&"b", &"a").is_empty());
        assert!(sys.is_transition(&"a", &1, &"b"));
        assert!(!sys.is_transition(&"c", &1, &"a"));
        assert_eq!(sys.num_transitions(), 4);
    }
}
