//! Capability interface of a symbolic set of valuations.
//!
//! The reachability and counterexample algorithms only need the boolean
//! algebra below plus the ability to pick a concrete member. Any canonical
//! representation works: decision diagrams, explicit sets, SAT-backed sets.

/// An immutable, canonical set of valuations.
///
/// Equality must be exact set equality.
pub trait SymbolicSet: Clone + PartialEq {
    /// A single, total valuation drawn from the set.
    type Element: Clone;

    fn union(&self, other: &Self) -> Self;

    fn difference(&self, other: &Self) -> Self;

    fn intersection(&self, other: &Self) -> Self;

    fn is_empty(&self) -> bool;

    /// Some member of the set, or `None` iff the set is empty.
    ///
    /// Callers must not depend on which member is returned.
    fn pick_one(&self) -> Option<Self::Element>;

    /// `self ⊆ other`.
    fn is_subset(&self, other: &Self) -> bool {
        self.difference(other).is_empty()
    }
}
