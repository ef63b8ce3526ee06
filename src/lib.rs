//! # bdd-invar: invariant checking with shortest counterexamples
//!
//! **`bdd-invar`** decides whether every state reachable from the initial
//! states of a finite transition system satisfies an invariant. When it does
//! not, it returns a counterexample of minimal length: an alternating sequence
//! of states and inputs from an initial state to a violating one.
//!
//! ## How it works
//!
//! 1. [`reach`] computes the reachable states by breadth-first image
//!    computation, recording the BFS layers (states at exact distance `i`).
//! 2. [`check`] tests `Reach ⊆ Inv` exactly and isolates `Reach \ Inv`.
//! 3. [`trace`] finds the shallowest layer with a bad state and walks back
//!    one layer at a time, so the trace length equals that layer's depth.
//!
//! The algorithms only see two capability traits: [`SymbolicSet`] for the
//! set algebra and [`TransitionOracle`] for images and pre-images. Two
//! implementations ship with the crate:
//!
//! - [`transition::TransitionSystem`]: symbolic, over the BDD engine in [`bdd`].
//! - [`explicit::ExplicitSystem`]: explicit state sets, for small systems.
//!
//! ## Example
//!
//! ```
//! use bdd_invar::check::check_invariant;
//! use bdd_invar::explicit::{ExplicitSet, ExplicitSystem};
//!
//! // s0 -> s1 -> s1, with the invariant "never s1".
//! let mut sys = ExplicitSystem::new();
//! sys.add_transition("s0", "go", "s1");
//! sys.add_transition("s1", "stay", "s1");
//!
//! let init = ExplicitSet::from_iter(["s0"]);
//! let inv = ExplicitSet::from_iter(["s0"]);
//!
//! let (satisfied, trace) = check_invariant(&sys, &init, &inv).unwrap().into_parts();
//! assert!(!satisfied);
//! let trace = trace.unwrap();
//! assert_eq!(trace.num_transitions(), 1);
//! assert_eq!(*trace.last(), "s1");
//! ```

pub mod bdd;
pub mod cache;
pub mod check;
pub mod error;
pub mod explicit;
pub mod oracle;
pub mod reach;
pub mod reference;
pub mod set;
pub mod trace;
pub mod transition;
pub mod types;

pub use check::{check_invariant, find_violations, Verdict};
pub use error::{CheckError, CheckResult};
pub use oracle::TransitionOracle;
pub use reach::{compute_reachable, Layers, Reachability};
pub use set::SymbolicSet;
pub use trace::{build_trace, Trace, TraceElement};
