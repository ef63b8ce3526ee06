//! Hash-consed BDD manager with complemented edges.
//!
//! All nodes live in a single [`Bdd`] manager. A node is identified by a
//! [`Ref`]; the sign of the handle marks a complemented edge, so negation is
//! free and `f` and `¬f` share the same node. The high edge of a stored node
//! is never complemented, which keeps the representation canonical: for the
//! fixed variable order, two handles are equal iff they denote the same
//! boolean function.
//!
//! The variable order is the numeric order of [`Var`] indices.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use log::debug;
use num_bigint::BigUint;

use crate::cache::{Cache, SlotHash};
use crate::reference::Ref;
use crate::types::{Lit, Var};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Node {
    /// Variable index, 0 for the terminal.
    variable: u32,
    low: Ref,
    high: Ref,
}

/// Sizing knobs for a [`Bdd`] manager.
#[derive(Debug, Clone)]
pub struct BddConfig {
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
    /// Initial capacity of the node storage.
    pub capacity: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            cache_bits: 16,
            capacity: 1 << 12,
        }
    }
}

impl BddConfig {
    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        self.cache_bits = cache_bits;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct IteKey(Ref, Ref, Ref);

impl SlotHash for IteKey {
    fn slot_hash(&self) -> u64 {
        (self.0, self.1, self.2).slot_hash()
    }
}

pub struct Bdd {
    nodes: RefCell<Vec<Node>>,
    unique: RefCell<HashMap<Node, u32>>,
    cache: RefCell<Cache<IteKey, Ref>>,
    num_vars: Cell<u32>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn with_config(config: BddConfig) -> Self {
        let mut nodes = Vec::with_capacity(config.capacity.max(2));
        // Index 0 is unused so that every handle has a distinct sign.
        nodes.push(Node {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        });
        // Index 1 is the terminal node.
        nodes.push(Node {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        });
        let one = Ref::positive(1);
        let zero = -one;

        Self {
            nodes: RefCell::new(nodes),
            unique: RefCell::new(HashMap::with_capacity(config.capacity)),
            cache: RefCell::new(Cache::new(config.cache_bits)),
            num_vars: Cell::new(0),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::with_config(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("num_vars", &self.num_vars.get())
            .field("num_nodes", &self.num_nodes())
            .field("cache_hits", &self.cache_hits())
            .field("cache_misses", &self.cache_misses())
            .finish()
    }
}

impl Bdd {
    /// Number of allocated internal nodes (terminal excluded).
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 2
    }

    pub fn cache_hits(&self) -> usize {
        self.cache.borrow().hits()
    }

    pub fn cache_misses(&self) -> usize {
        self.cache.borrow().misses()
    }

    /// Allocate a fresh variable below all existing ones.
    pub fn allocate_variable(&self) -> Var {
        let id = self.num_vars.get() + 1;
        self.num_vars.set(id);
        Var::new(id)
    }

    /// Number of variables handed out by [`Bdd::allocate_variable`].
    pub fn num_vars(&self) -> u32 {
        self.num_vars.get()
    }

    /// Variable index of the node (0 for terminals).
    pub fn variable(&self, node: Ref) -> u32 {
        self.nodes.borrow()[node.index() as usize].variable
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.nodes.borrow()[node.index() as usize].low;
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.nodes.borrow()[node.index() as usize].high;
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }

    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }
        if low == high {
            return low;
        }

        let node = Node { variable: v, low, high };
        if let Some(&i) = self.unique.borrow().get(&node) {
            return Ref::positive(i);
        }

        let mut nodes = self.nodes.borrow_mut();
        let i = nodes.len() as u32;
        assert!(i < i32::MAX as u32, "BDD node storage exhausted");
        nodes.push(node);
        self.unique.borrow_mut().insert(node, i);
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: Var) -> Ref {
        self.mk_node(v.id(), self.zero, self.one)
    }

    pub fn mk_lit(&self, lit: Lit) -> Ref {
        let r = self.mk_var(lit.var());
        if lit.is_negative() {
            -r
        } else {
            r
        }
    }

    /// Conjunction of the given literals.
    pub fn cube(&self, literals: impl IntoIterator<Item = Lit>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|lit| std::cmp::Reverse(lit.var()));
        debug!("cube(literals = {:?})", literals);
        let mut current = self.one;
        for lit in literals {
            let v = lit.var().id();
            current = if lit.is_negative() {
                self.mk_node(v, current, self.zero)
            } else {
                self.mk_node(v, self.zero, current)
            };
        }
        current
    }

    fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        if self.is_terminal(node) || v < self.variable(node) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // ite(1,G,H) => G
        // ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        // ite(F,G,G) => G
        // ite(F,1,0) => F
        // ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }
        // ite(F,F,H) => ite(F,1,H)
        // ite(F,~F,H) => ite(F,0,H)
        // ite(F,G,F) => ite(F,G,0)
        // ite(F,G,~F) => ite(F,G,1)
        let g = if g == f {
            self.one
        } else if g == -f {
            self.zero
        } else {
            g
        };
        let h = if h == f {
            self.zero
        } else if h == -f {
            self.one
        } else {
            h
        };
        if g == h {
            return g;
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };
        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() { (-g, -h, true) } else { (g, h, false) };

        let key = IteKey(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if negate { -res } else { res };
        }

        let m = [f, g, h]
            .into_iter()
            .filter(|&x| !self.is_terminal(x))
            .map(|x| self.variable(x))
            .min()
            .expect("f is not terminal");

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0);
        let t = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        self.cache.borrow_mut().insert(key, res);

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    /// Set difference: `u ∧ ¬v`.
    pub fn apply_diff(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(v, self.zero, u)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
        }
        res
    }

    /// Existential quantification `∃vars. f`.
    pub fn exists(&self, f: Ref, vars: &[Var]) -> Ref {
        debug!("exists(f = {}, vars = {:?})", f, vars);
        let vars: HashSet<u32> = vars.iter().map(|v| v.id()).collect();
        let mut cache = HashMap::new();
        self.exists_(f, &vars, &mut cache)
    }

    fn exists_(&self, f: Ref, vars: &HashSet<u32>, cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) || vars.is_empty() {
            return f;
        }
        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let v = self.variable(f);
        let low = self.exists_(self.low_node(f), vars, cache);
        let high = self.exists_(self.high_node(f), vars, cache);
        let res = if vars.contains(&v) {
            self.apply_or(low, high)
        } else {
            self.mk_node(v, low, high)
        };
        cache.insert(f, res);
        res
    }

    /// Relational product `∃vars. f ∧ g`.
    pub fn rel_product(&self, f: Ref, g: Ref, vars: &[Var]) -> Ref {
        debug!("rel_product(f = {}, g = {})", f, g);
        let conj = self.apply_and(f, g);
        self.exists(conj, vars)
    }

    /// Simultaneous variable substitution. Variables absent from `perm` are kept.
    pub fn rename_vars(&self, f: Ref, perm: &HashMap<Var, Var>) -> Ref {
        debug!("rename_vars(f = {}, perm = {:?})", f, perm);
        let mut cache = HashMap::new();
        self.rename_vars_(f, perm, &mut cache)
    }

    fn rename_vars_(&self, f: Ref, perm: &HashMap<Var, Var>, cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let v = Var::new(self.variable(f));
        let target = perm.get(&v).copied().unwrap_or(v);
        let low = self.rename_vars_(self.low_node(f), perm, cache);
        let high = self.rename_vars_(self.high_node(f), perm, cache);
        // The target may sit anywhere in the order, so rebuild through ITE.
        let res = self.apply_ite(self.mk_var(target), high, low);
        cache.insert(f, res);
        res
    }

    /// Returns one satisfying path of the BDD, if any exists.
    ///
    /// Variables not mentioned on the path are unconstrained.
    /// Returns `None` if the BDD represents the constant false function.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<Lit>> {
        if self.is_zero(node) {
            return None;
        }

        let mut path = Vec::new();
        let mut current = node;
        while !self.is_one(current) {
            let var = Var::new(self.variable(current));
            let high = self.high_node(current);
            if !self.is_zero(high) {
                path.push(var.pos());
                current = high;
            } else {
                path.push(var.neg());
                current = self.low_node(current);
            }
        }
        Some(path)
    }

    /// Number of assignments over `vars` satisfying `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` depends on a variable outside `vars`.
    pub fn sat_count(&self, node: Ref, vars: &[Var]) -> BigUint {
        let mut vars: Vec<u32> = vars.iter().map(|v| v.id()).collect();
        vars.sort_unstable();
        vars.dedup();
        let mut cache = HashMap::new();
        self.sat_count_(node, 0, &vars, &mut cache)
    }

    /// Count over `vars[pos..]`.
    fn sat_count_(&self, node: Ref, pos: usize, vars: &[u32], cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::from(0u32);
        }
        if self.is_one(node) {
            return BigUint::from(1u32) << (vars.len() - pos);
        }

        let v = self.variable(node);
        let k = vars
            .binary_search(&v)
            .unwrap_or_else(|_| panic!("Variable x{} is outside the counting domain", v));
        assert!(k >= pos);

        let own = match cache.get(&node) {
            Some(count) => count.clone(),
            None => {
                let low = self.sat_count_(self.low_node(node), k + 1, vars, cache);
                let high = self.sat_count_(self.high_node(node), k + 1, vars, cache);
                let count = low + high;
                cache.insert(node, count.clone());
                count
            }
        };
        own << (k - pos)
    }

    /// Variables the function depends on, in order.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let mut seen = HashSet::new();
        let mut vars = HashSet::new();
        let mut stack = vec![f.regular()];
        while let Some(node) = stack.pop() {
            if self.is_terminal(node) || !seen.insert(node) {
                continue;
            }
            vars.insert(self.variable(node));
            stack.push(self.low_node(node).regular());
            stack.push(self.high_node(node).regular());
        }
        let mut vars: Vec<Var> = vars.into_iter().map(Var::new).collect();
        vars.sort();
        vars
    }

    /// Number of nodes reachable from `f`, terminal included.
    pub fn size(&self, f: Ref) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![f.regular()];
        while let Some(node) = stack.pop() {
            if !seen.insert(node) || self.is_terminal(node) {
                continue;
            }
            stack.push(self.low_node(node).regular());
            stack.push(self.high_node(node).regular());
        }
        seen.len()
    }
}
