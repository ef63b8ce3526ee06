//! Invariant checking: reachability, containment, and counterexamples.

use log::info;

use crate::error::CheckResult;
use crate::oracle::{InputOf, StateOf, TransitionOracle};
use crate::reach::compute_reachable;
use crate::set::SymbolicSet;
use crate::trace::{build_trace, Trace};

/// Outcome of an invariant check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<S, I> {
    /// Every reachable state satisfies the invariant.
    Holds,
    /// Some reachable state violates it; the trace reaches one by a shortest path.
    Violated(Trace<S, I>),
}

impl<S, I> Verdict<S, I> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Holds)
    }

    pub fn trace(&self) -> Option<&Trace<S, I>> {
        match self {
            Verdict::Holds => None,
            Verdict::Violated(trace) => Some(trace),
        }
    }

    /// `(satisfied, counterexample)`.
    pub fn into_parts(self) -> (bool, Option<Trace<S, I>>) {
        match self {
            Verdict::Holds => (true, None),
            Verdict::Violated(trace) => (false, Some(trace)),
        }
    }
}

/// Exact containment test `reachable ⊆ invariant`.
///
/// Returns whether it holds, together with `reachable \ invariant`.
pub fn find_violations<S: SymbolicSet>(reachable: &S, invariant: &S) -> (bool, S) {
    let violating = reachable.difference(invariant);
    (violating.is_empty(), violating)
}

/// Check that every state reachable from `initial` lies in `invariant`.
pub fn check_invariant<O>(
    oracle: &O,
    initial: &O::States,
    invariant: &O::States,
) -> CheckResult<Verdict<StateOf<O>, InputOf<O>>>
where
    O: TransitionOracle,
{
    let reach = compute_reachable(oracle, initial);
    let (satisfied, violating) = find_violations(&reach.reachable, invariant);
    if satisfied {
        info!("check: invariant holds");
        return Ok(Verdict::Holds);
    }

    let trace = build_trace(oracle, &reach.layers, &violating)?;
    info!("check: invariant violated, trace of {} transitions", trace.num_transitions());
    Ok(Verdict::Violated(trace))
}
