//! Capability interface of a transition relation.

use crate::set::SymbolicSet;

/// Image and pre-image operators of a finite transition system.
///
/// States and inputs are symbolic sets. Implementations must be exact:
/// `backward_image` has to agree with `forward_image`, i.e. `s ∈ backward_image(T)`
/// iff `forward_image({s}) ∩ T` is non-empty.
pub trait TransitionOracle {
    type States: SymbolicSet;
    type Inputs: SymbolicSet;

    /// States reachable in exactly one step from some member of `states`.
    fn forward_image(&self, states: &Self::States) -> Self::States;

    /// States reaching some member of `states` in exactly one step.
    fn backward_image(&self, states: &Self::States) -> Self::States;

    /// All input valuations moving `from` to `to` in one step.
    fn inputs_between(
        &self,
        from: &<Self::States as SymbolicSet>::Element,
        to: &<Self::States as SymbolicSet>::Element,
    ) -> Self::Inputs;

    /// The set containing exactly `state`.
    fn singleton(&self, state: &<Self::States as SymbolicSet>::Element) -> Self::States;
}

/// Concrete state type of an oracle.
pub type StateOf<O> = <<O as TransitionOracle>::States as SymbolicSet>::Element;

/// Concrete input type of an oracle.
pub type InputOf<O> = <<O as TransitionOracle>::Inputs as SymbolicSet>::Element;
