//! Shortest counterexample reconstruction.
//!
//! Given the BFS layers of a reachability run and a set of bad states, the
//! builder finds the shallowest layer `Lh` containing a bad state, picks one
//! such state, and walks back to `L0` one layer at a time:
//!
//! ```text
//! head      ∈ Lh ∩ Bad
//! prev      ∈ L(i-1) ∩ Pre({head})
//! input     ∈ Inputs(prev, head)
//! ```
//!
//! Each backward step stays inside the previous layer, so the trace has
//! exactly `h` transitions, the BFS depth of the closest bad state.

use std::fmt;

use log::{debug, info};

use crate::error::{CheckError, CheckResult};
use crate::oracle::{InputOf, StateOf, TransitionOracle};
use crate::reach::Layers;
use crate::set::SymbolicSet;

/// A finite execution: `s0, i1, s1, i2, s2, …, ik, sk`.
///
/// Always starts and ends with a state; `2k + 1` elements for `k` transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace<S, I> {
    initial: S,
    steps: Vec<(I, S)>,
}

/// One element of a [`Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceElement<'a, S, I> {
    State(&'a S),
    Input(&'a I),
}

impl<S, I> Trace<S, I> {
    pub fn new(initial: S, steps: Vec<(I, S)>) -> Self {
        Trace { initial, steps }
    }

    /// Number of transitions `k`.
    pub fn num_transitions(&self) -> usize {
        self.steps.len()
    }

    /// Number of elements, `2k + 1`.
    pub fn len(&self) -> usize {
        2 * self.steps.len() + 1
    }

    /// Never true: a trace holds at least its initial state.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn initial(&self) -> &S {
        &self.initial
    }

    pub fn last(&self) -> &S {
        self.steps.last().map_or(&self.initial, |(_, s)| s)
    }

    /// `(input, target)` pairs in execution order.
    pub fn steps(&self) -> &[(I, S)] {
        &self.steps
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        std::iter::once(&self.initial).chain(self.steps.iter().map(|(_, s)| s))
    }

    pub fn inputs(&self) -> impl Iterator<Item = &I> {
        self.steps.iter().map(|(i, _)| i)
    }

    /// `(from, input, to)` for every transition.
    pub fn transitions(&self) -> impl Iterator<Item = (&S, &I, &S)> {
        self.states().zip(self.steps.iter()).map(|(from, (i, to))| (from, i, to))
    }

    /// Alternating states and inputs.
    pub fn elements(&self) -> impl Iterator<Item = TraceElement<'_, S, I>> {
        std::iter::once(TraceElement::State(&self.initial)).chain(
            self.steps
                .iter()
                .flat_map(|(i, s)| [TraceElement::Input(i), TraceElement::State(s)]),
        )
    }

    /// Convert element types, e.g. to render valuations for display.
    pub fn map<S2, I2>(self, mut f_state: impl FnMut(S) -> S2, mut f_input: impl FnMut(I) -> I2) -> Trace<S2, I2> {
        let initial = f_state(self.initial);
        let steps = self
            .steps
            .into_iter()
            .map(|(i, s)| (f_input(i), f_state(s)))
            .collect();
        Trace { initial, steps }
    }
}

impl<S: fmt::Display, I: fmt::Display> fmt::Display for Trace<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let k = self.num_transitions();
        writeln!(f, "Counterexample ({} transition{}):", k, if k == 1 { "" } else { "s" })?;
        write!(f, "  State 0: {}  [INIT]", self.initial)?;
        for (k, (input, state)) in self.steps.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "  Input {}: {}", k + 1, input)?;
            write!(f, "  State {}: {}", k + 1, state)?;
        }
        if !self.steps.is_empty() {
            write!(f, "  [VIOLATION]")?;
        }
        writeln!(f)
    }
}

/// Reconstruct a shortest trace from `Init` into `violating`.
///
/// `layers` must come from [`compute_reachable`][crate::reach::compute_reachable]
/// on the same `oracle`, and `violating` must meet at least one layer.
pub fn build_trace<O>(
    oracle: &O,
    layers: &Layers<O::States>,
    violating: &O::States,
) -> CheckResult<Trace<StateOf<O>, InputOf<O>>>
where
    O: TransitionOracle,
{
    let (depth, hits) = layers
        .first_intersecting(violating)
        .ok_or(CheckError::ViolationOutsideLayers)?;
    info!("trace: closest violation at depth {}", depth);

    let mut head = hits.pick_one().ok_or(CheckError::EmptyPick { what: "violating" })?;
    let mut steps = Vec::with_capacity(depth);

    // Cursor `i` is the layer of `head`.
    for i in (1..=depth).rev() {
        let pre = oracle.backward_image(&oracle.singleton(&head));
        let candidates = layers[i - 1].intersection(&pre);
        let prev = candidates
            .pick_one()
            .ok_or(CheckError::MissingPredecessor { depth: i })?;

        let input = oracle
            .inputs_between(&prev, &head)
            .pick_one()
            .ok_or(CheckError::MissingInputs { depth: i - 1 })?;

        debug!("trace: stepped back from layer {} to layer {}", i, i - 1);
        steps.push((input, head));
        head = prev;
    }

    steps.reverse();
    Ok(Trace::new(head, steps))
}
