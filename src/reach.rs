//! Forward reachability by breadth-first image computation.
//!
//! Starting from the initial states, the engine repeatedly takes the forward
//! image of the current frontier and removes everything already reached.
//! The non-empty frontiers form the BFS layers `L0, L1, …, Lk`:
//!
//! ```text
//! L0      = Init
//! L(i+1)  = Post(Li) \ (L0 ∪ … ∪ Li)
//! ```
//!
//! The layers are pairwise disjoint and `Li` holds exactly the states whose
//! shortest distance from `Init` is `i`. Their union is the least fixpoint
//! containing `Init` and closed under `Post`.

use log::{debug, info};

use crate::oracle::TransitionOracle;
use crate::set::SymbolicSet;

/// BFS layers of a reachability computation, in increasing depth order.
#[derive(Debug, Clone)]
pub struct Layers<S> {
    layers: Vec<S>,
}

impl<S: SymbolicSet> Layers<S> {
    fn new(initial: S) -> Self {
        Layers { layers: vec![initial] }
    }

    fn push(&mut self, layer: S) {
        self.layers.push(layer);
    }

    /// Number of layers, always at least one.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Never true: layer 0 is always present, even for an empty initial set.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Index of the deepest layer, i.e. the longest shortest path from `Init`.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn get(&self, depth: usize) -> Option<&S> {
        self.layers.get(depth)
    }

    /// Layer 0.
    pub fn initial(&self) -> &S {
        &self.layers[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.layers.iter()
    }

    /// The shallowest layer meeting `set`, with the meeting part.
    ///
    /// Scans in increasing depth order, so the returned depth is the length
    /// of a shortest path from `Init` into `set`.
    pub fn first_intersecting(&self, set: &S) -> Option<(usize, S)> {
        self.layers.iter().enumerate().find_map(|(depth, layer)| {
            let hit = layer.intersection(set);
            if hit.is_empty() {
                None
            } else {
                Some((depth, hit))
            }
        })
    }
}

impl<S> std::ops::Index<usize> for Layers<S> {
    type Output = S;

    fn index(&self, depth: usize) -> &S {
        &self.layers[depth]
    }
}

/// Result of [`compute_reachable`].
#[derive(Debug, Clone)]
pub struct Reachability<S> {
    /// All states reachable from `Init`.
    pub reachable: S,
    /// The BFS layers whose union is `reachable`.
    pub layers: Layers<S>,
}

/// Compute the reachable states of `oracle` from `initial`, recording BFS layers.
pub fn compute_reachable<O>(oracle: &O, initial: &O::States) -> Reachability<O::States>
where
    O: TransitionOracle,
{
    let mut reachable = initial.clone();
    let mut frontier = initial.clone();
    let mut layers = Layers::new(initial.clone());

    loop {
        let next = oracle.forward_image(&frontier).difference(&reachable);
        if next.is_empty() {
            break;
        }
        reachable = reachable.union(&next);
        debug!("reach: discovered layer {}", layers.len());
        layers.push(next.clone());
        frontier = next;
    }

    info!("reach: fixpoint after {} layers", layers.len());
    Reachability { reachable, layers }
}
