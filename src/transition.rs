//! BDD-encoded transition systems.
//!
//! A [`TransitionSystem`] ranges over named boolean state variables and input
//! variables. Every state variable `x` gets two BDD variables: a present-state
//! copy `x` and a next-state copy `x'`. The transition relation `T(s, i, s')`
//! relates present states, inputs and next states.
//!
//! Sets of states and sets of inputs are [`BddSet`]s: a BDD handle together
//! with the [`Domain`] of named variables it ranges over. Domains only grow,
//! and every set shares its system's live domain, so a set built before a
//! later declaration still picks total valuations.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use log::debug;
use num_traits::ToPrimitive;

use crate::bdd::Bdd;
use crate::oracle::TransitionOracle;
use crate::reference::Ref;
use crate::set::SymbolicSet;
use crate::types::{Lit, Var};

/// A total assignment of boolean values to named variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Valuation(BTreeMap<String, bool>);

impl Valuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.0.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Assignments in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Valuation {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Valuation(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .iter()
            .map(|(k, v)| format!("{}={}", k, if v { "1" } else { "0" }))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", body)
    }
}

/// Ordered named BDD variables that a [`BddSet`] ranges over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Domain {
    vars: Vec<(String, Var)>,
}

impl Domain {
    fn push(&mut self, name: String, var: Var) {
        self.vars.push((name, var));
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Var> {
        self.vars.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(n, _)| n.as_str())
    }

    pub fn bdd_vars(&self) -> Vec<Var> {
        self.vars.iter().map(|&(_, v)| v).collect()
    }

    /// Total valuation from a satisfying path. Domain variables absent from
    /// the path are unconstrained and get `false`.
    fn complete(&self, path: &[Lit]) -> Valuation {
        let values: HashMap<Var, bool> = path.iter().map(|lit| (lit.var(), lit.is_positive())).collect();
        self.vars
            .iter()
            .map(|(name, var)| (name.as_str(), values.get(var).copied().unwrap_or(false)))
            .collect()
    }

    /// The minterm of a total valuation.
    ///
    /// # Panics
    ///
    /// Panics if `valuation` leaves a domain variable unassigned.
    fn minterm(&self, bdd: &Bdd, valuation: &Valuation) -> Ref {
        let literals = self.vars.iter().map(|(name, var)| {
            let value = valuation
                .get(name)
                .unwrap_or_else(|| panic!("Valuation does not assign variable `{}`", name));
            Lit::new(*var, !value)
        });
        bdd.cube(literals)
    }
}

/// A [`Domain`] shared between a system and the sets built over it.
pub type SharedDomain = Rc<RefCell<Domain>>;

/// A set of valuations over a [`Domain`], represented by a BDD.
#[derive(Debug, Clone)]
pub struct BddSet {
    bdd: Rc<Bdd>,
    domain: SharedDomain,
    node: Ref,
}

impl BddSet {
    pub fn new(bdd: Rc<Bdd>, domain: SharedDomain, node: Ref) -> Self {
        BddSet { bdd, domain, node }
    }

    pub fn node(&self) -> Ref {
        self.node
    }

    /// Current variables of the domain.
    pub fn domain(&self) -> Domain {
        self.domain.borrow().clone()
    }

    pub fn contains(&self, valuation: &Valuation) -> bool {
        let minterm = self.domain.borrow().minterm(&self.bdd, valuation);
        !self.bdd.is_zero(self.bdd.apply_and(self.node, minterm))
    }

    fn with_node(&self, node: Ref) -> Self {
        BddSet {
            bdd: self.bdd.clone(),
            domain: self.domain.clone(),
            node,
        }
    }
}

impl PartialEq for BddSet {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.bdd, &other.bdd) && self.node == other.node
    }
}

impl Eq for BddSet {}

impl SymbolicSet for BddSet {
    type Element = Valuation;

    fn union(&self, other: &Self) -> Self {
        self.with_node(self.bdd.apply_or(self.node, other.node))
    }

    fn difference(&self, other: &Self) -> Self {
        self.with_node(self.bdd.apply_diff(self.node, other.node))
    }

    fn intersection(&self, other: &Self) -> Self {
        self.with_node(self.bdd.apply_and(self.node, other.node))
    }

    fn is_empty(&self) -> bool {
        self.bdd.is_zero(self.node)
    }

    fn pick_one(&self) -> Option<Valuation> {
        let path = self.bdd.one_sat(self.node)?;
        Some(self.domain.borrow().complete(&path))
    }

    fn is_subset(&self, other: &Self) -> bool {
        self.bdd.is_one(self.bdd.apply_imply(self.node, other.node))
    }
}

/// Allocation of BDD variables for named state and input variables.
#[derive(Debug, Clone, Default)]
pub struct VarManager {
    present: HashMap<String, Var>,
    next: HashMap<String, Var>,
    inputs: HashMap<String, Var>,
    states: SharedDomain,
    input_domain: SharedDomain,
}

impl VarManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.present.contains_key(name) || self.inputs.contains_key(name)
    }

    pub fn get_present(&self, name: &str) -> Option<Var> {
        self.present.get(name).copied()
    }

    pub fn get_next(&self, name: &str) -> Option<Var> {
        self.next.get(name).copied()
    }

    pub fn get_input(&self, name: &str) -> Option<Var> {
        self.inputs.get(name).copied()
    }

    pub fn num_state_vars(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn num_input_vars(&self) -> usize {
        self.input_domain.borrow().len()
    }

    pub fn present_vars(&self) -> Vec<Var> {
        self.states.borrow().bdd_vars()
    }

    pub fn next_vars(&self) -> Vec<Var> {
        self.states.borrow().names().map(|n| self.next[n]).collect()
    }

    pub fn input_vars(&self) -> Vec<Var> {
        self.input_domain.borrow().bdd_vars()
    }
}

/// A symbolic transition system with inputs.
#[derive(Debug, Clone)]
pub struct TransitionSystem {
    bdd: Rc<Bdd>,
    var_manager: VarManager,
    /// Initial states: I(s)
    initial: Ref,
    /// Transition relation: T(s, i, s')
    transition: Ref,
}

impl TransitionSystem {
    /// Create an empty system: no variables, no initial states, no transitions.
    pub fn new(bdd: Rc<Bdd>) -> Self {
        let zero = bdd.zero;
        TransitionSystem {
            bdd,
            var_manager: VarManager::new(),
            initial: zero,
            transition: zero,
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn var_manager(&self) -> &VarManager {
        &self.var_manager
    }

    /// Declare a state variable, allocating its present and next copies.
    pub fn declare_state_var(&mut self, name: impl Into<String>) -> (Var, Var) {
        let name = name.into();
        if let (Some(present), Some(next)) = (self.var_manager.get_present(&name), self.var_manager.get_next(&name)) {
            return (present, next);
        }
        assert!(
            !self.var_manager.is_declared(&name),
            "Variable `{}` is already declared as an input",
            name
        );
        let present = self.bdd.allocate_variable();
        let next = self.bdd.allocate_variable();
        debug!("declare_state_var({}) -> ({}, {})", name, present, next);
        self.var_manager.present.insert(name.clone(), present);
        self.var_manager.next.insert(name.clone(), next);
        self.var_manager.states.borrow_mut().push(name, present);
        (present, next)
    }

    /// Declare an input variable.
    pub fn declare_input_var(&mut self, name: impl Into<String>) -> Var {
        let name = name.into();
        if let Some(var) = self.var_manager.get_input(&name) {
            return var;
        }
        assert!(
            !self.var_manager.is_declared(&name),
            "Variable `{}` is already declared as a state variable",
            name
        );
        let var = self.bdd.allocate_variable();
        debug!("declare_input_var({}) -> {}", name, var);
        self.var_manager.inputs.insert(name.clone(), var);
        self.var_manager.input_domain.borrow_mut().push(name, var);
        var
    }

    /// Present-state literal of a state variable.
    pub fn state_var(&self, name: &str) -> Ref {
        let var = self
            .var_manager
            .get_present(name)
            .unwrap_or_else(|| panic!("State variable `{}` is not declared", name));
        self.bdd.mk_var(var)
    }

    /// Next-state literal of a state variable.
    pub fn next_var(&self, name: &str) -> Ref {
        let var = self
            .var_manager
            .get_next(name)
            .unwrap_or_else(|| panic!("State variable `{}` is not declared", name));
        self.bdd.mk_var(var)
    }

    pub fn input_var(&self, name: &str) -> Ref {
        let var = self
            .var_manager
            .get_input(name)
            .unwrap_or_else(|| panic!("Input variable `{}` is not declared", name));
        self.bdd.mk_var(var)
    }

    pub fn set_initial(&mut self, initial: Ref) {
        self.initial = initial;
    }

    pub fn initial(&self) -> Ref {
        self.initial
    }

    pub fn initial_states(&self) -> BddSet {
        self.states(self.initial)
    }

    pub fn set_transition(&mut self, transition: Ref) {
        self.transition = transition;
    }

    pub fn transition(&self) -> Ref {
        self.transition
    }

    /// Wrap a predicate over present-state variables as a state set.
    pub fn states(&self, node: Ref) -> BddSet {
        BddSet::new(self.bdd.clone(), self.var_manager.states.clone(), node)
    }

    /// Wrap a predicate over input variables as an input set.
    pub fn inputs(&self, node: Ref) -> BddSet {
        BddSet::new(self.bdd.clone(), self.var_manager.input_domain.clone(), node)
    }

    /// Constraint `var' ↔ expr` for the assignment `next(var) := expr`.
    pub fn assign_var(&self, name: &str, next_state_expr: Ref) -> Ref {
        self.bdd.apply_eq(self.next_var(name), next_state_expr)
    }

    /// Constraint `var' ↔ var`.
    pub fn unchanged_var(&self, name: &str) -> Ref {
        self.assign_var(name, self.state_var(name))
    }

    /// Conjunction of per-variable constraints.
    pub fn build_transition(&self, assignments: &[Ref]) -> Ref {
        self.bdd.apply_and_many(assignments.iter().copied())
    }

    /// Successors: `(∃s,i. from(s) ∧ T(s, i, s'))[s' → s]`.
    pub fn image(&self, from: Ref) -> Ref {
        let mut vars = self.var_manager.present_vars();
        vars.extend(self.var_manager.input_vars());
        let result_in_next = self.bdd.rel_product(from, self.transition, &vars);
        self.rename_next_to_present(result_in_next)
    }

    /// Predecessors: `∃i,s'. T(s, i, s') ∧ to(s')`.
    pub fn preimage(&self, to: Ref) -> Ref {
        let to_next = self.rename_present_to_next(to);
        let mut vars = self.var_manager.next_vars();
        vars.extend(self.var_manager.input_vars());
        self.bdd.rel_product(self.transition, to_next, &vars)
    }

    /// Inputs moving some state of `from` into some state of `to`:
    /// `∃s,s'. from(s) ∧ T(s, i, s') ∧ to(s')`.
    pub fn inputs_between_sets(&self, from: Ref, to: Ref) -> Ref {
        let to_next = self.rename_present_to_next(to);
        let mut vars = self.var_manager.present_vars();
        vars.extend(self.var_manager.next_vars());
        let from_t = self.bdd.apply_and(from, self.transition);
        self.bdd.rel_product(from_t, to_next, &vars)
    }

    pub fn state_minterm(&self, state: &Valuation) -> Ref {
        self.var_manager.states.borrow().minterm(&self.bdd, state)
    }

    pub fn input_minterm(&self, input: &Valuation) -> Ref {
        self.var_manager.input_domain.borrow().minterm(&self.bdd, input)
    }

    /// Whether `input` moves `from` to `to` in one step.
    pub fn is_transition(&self, from: &Valuation, input: &Valuation, to: &Valuation) -> bool {
        let step = self.bdd.apply_and_many([
            self.state_minterm(from),
            self.input_minterm(input),
            self.rename_present_to_next(self.state_minterm(to)),
            self.transition,
        ]);
        !self.bdd.is_zero(step)
    }

    /// Number of states in a state set, if it fits in `u64`.
    pub fn count_states(&self, states: &BddSet) -> Option<u64> {
        self.bdd
            .sat_count(states.node(), &self.var_manager.present_vars())
            .to_u64()
    }

    fn rename_present_to_next(&self, f: Ref) -> Ref {
        let perm: HashMap<Var, Var> = self
            .var_manager
            .present_vars()
            .into_iter()
            .zip(self.var_manager.next_vars())
            .collect();
        self.bdd.rename_vars(f, &perm)
    }

    fn rename_next_to_present(&self, f: Ref) -> Ref {
        let perm: HashMap<Var, Var> = self
            .var_manager
            .next_vars()
            .into_iter()
            .zip(self.var_manager.present_vars())
            .collect();
        self.bdd.rename_vars(f, &perm)
    }
}

impl TransitionOracle for TransitionSystem {
    type States = BddSet;
    type Inputs = BddSet;

    fn forward_image(&self, states: &BddSet) -> BddSet {
        self.states(self.image(states.node()))
    }

    fn backward_image(&self, states: &BddSet) -> BddSet {
        self.states(self.preimage(states.node()))
    }

    fn inputs_between(&self, from: &Valuation, to: &Valuation) -> BddSet {
        let inputs = self.inputs_between_sets(self.state_minterm(from), self.state_minterm(to));
        self.inputs(inputs)
    }

    fn singleton(&self, state: &Valuation) -> BddSet {
        self.states(self.state_minterm(state))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::check::{check_invariant, Verdict};
    use crate::reach::compute_reachable;

    /// `bits`-bit counter that increments when input `inc` is set.
    fn counter(bits: usize) -> TransitionSystem {
        let bdd = Rc::new(Bdd::default());
        let mut ts = TransitionSystem::new(bdd);
        let names: Vec<String> = (0..bits).map(|i| format!("x{}", i)).collect();
        for name in &names {
            ts.declare_state_var(name.as_str());
        }
        ts.declare_input_var("inc");

        let mut carry = ts.input_var("inc");
        let mut constraints = Vec::new();
        for name in &names {
            let x = ts.state_var(name);
            constraints.push(ts.assign_var(name, ts.bdd().apply_xor(x, carry)));
            carry = ts.bdd().apply_and(x, carry);
        }
        let transition = ts.build_transition(&constraints);
        ts.set_transition(transition);

        let initial = ts.bdd().apply_and_many(names.iter().map(|n| -ts.state_var(n)));
        ts.set_initial(initial);
        ts
    }

    fn val(pairs: &[(&str, bool)]) -> Valuation {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_valuation_display() {
        let v = val(&[("y", false), ("x", true)]);
        assert_eq!(v.to_string(), "{x=1, y=0}");
        assert_eq!(v.get("x"), Some(true));
        assert_eq!(v.get("z"), None);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_var_manager() {
        let bdd = Rc::new(Bdd::default());
        let mut ts = TransitionSystem::new(bdd);

        let (x, x_next) = ts.declare_state_var("x");
        let i = ts.declare_input_var("i");
        let (y, y_next) = ts.declare_state_var("y");

        assert_eq!(ts.declare_state_var("x"), (x, x_next));
        let vm = ts.var_manager();
        assert_eq!(vm.present_vars(), vec![x, y]);
        assert_eq!(vm.next_vars(), vec![x_next, y_next]);
        assert_eq!(vm.input_vars(), vec![i]);
        assert_eq!(vm.num_state_vars(), 2);
        assert_eq!(vm.num_input_vars(), 1);
        assert!(vm.is_declared("i"));
        assert!(!vm.is_declared("z"));
    }

    #[test]
    #[should_panic(expected = "already declared as a state variable")]
    fn test_name_clash_panics() {
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("x");
        ts.declare_input_var("x");
    }

    #[test]
    fn test_toggle_image_preimage() {
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("x");
        let x = ts.state_var("x");
        let t = ts.assign_var("x", -x);
        ts.set_transition(t);

        assert_eq!(ts.image(-x), x);
        assert_eq!(ts.image(x), -x);
        assert_eq!(ts.preimage(x), -x);
        assert_eq!(ts.image(ts.bdd().zero), ts.bdd().zero);
    }

    #[test]
    fn test_pick_one_is_total() {
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("a");
        ts.declare_state_var("b");
        let set = ts.states(ts.state_var("a"));

        let picked = set.pick_one().unwrap();

        assert_eq!(picked.len(), 2);
        assert_eq!(picked.get("a"), Some(true));
        assert!(set.contains(&picked));
        assert_eq!(ts.states(ts.bdd().zero).pick_one(), None);
    }

    #[test]
    fn test_singleton_and_set_algebra() {
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("a");
        ts.declare_state_var("b");
        let s = val(&[("a", true), ("b", false)]);

        let single = ts.singleton(&s);
        assert_eq!(ts.count_states(&single), Some(1));
        assert_eq!(single.pick_one(), Some(s.clone()));

        let all = ts.states(ts.bdd().one);
        assert_eq!(ts.count_states(&all), Some(4));
        assert!(single.is_subset(&all));
        assert_eq!(all.difference(&single).union(&single), all);
        assert_eq!(all.intersection(&single), single);
        assert!(single.difference(&all).is_empty());
    }

    #[test]
    fn test_counter_inputs_between() {
        let ts = counter(3);
        let zero = val(&[("x0", false), ("x1", false), ("x2", false)]);
        let one = val(&[("x0", true), ("x1", false), ("x2", false)]);
        let two = val(&[("x0", false), ("x1", true), ("x2", false)]);

        let inc = ts.inputs_between(&zero, &one);
        assert_eq!(inc.pick_one(), Some(val(&[("inc", true)])));
        let stay = ts.inputs_between(&zero, &zero);
        assert_eq!(stay.pick_one(), Some(val(&[("inc", false)])));
        assert!(ts.inputs_between(&zero, &two).is_empty());

        assert!(ts.is_transition(&one, &val(&[("inc", true)]), &two));
        assert!(!ts.is_transition(&one, &val(&[("inc", false)]), &two));
    }

    #[test]
    fn test_counter_reachability() {
        let ts = counter(3);
        let r = compute_reachable(&ts, &ts.initial_states());

        assert_eq!(ts.count_states(&r.reachable), Some(8));
        assert_eq!(r.layers.len(), 8);
        for layer in r.layers.iter() {
            assert_eq!(ts.count_states(layer), Some(1));
        }
        assert!(ts.forward_image(&r.reachable).is_subset(&r.reachable));
    }

    #[test]
    fn test_counter_violation() {
        let ts = counter(3);
        let all_ones = ts
            .bdd()
            .apply_and_many(["x0", "x1", "x2"].iter().map(|n| ts.state_var(n)));
        let invariant = ts.states(-all_ones);

        let verdict = check_invariant(&ts, &ts.initial_states(), &invariant).unwrap();

        let trace = match verdict {
            Verdict::Violated(trace) => trace,
            Verdict::Holds => panic!("counter must reach 7"),
        };
        assert_eq!(trace.num_transitions(), 7);
        assert_eq!(trace.len(), 15);
        assert!(ts.initial_states().contains(trace.initial()));
        for (from, input, to) in trace.transitions() {
            assert!(ts.is_transition(from, input, to));
            assert_eq!(input.get("inc"), Some(true));
        }
        assert_eq!(*trace.last(), val(&[("x0", true), ("x1", true), ("x2", true)]));
    }

    #[test]
    fn test_deep_counter_violation() {
        let mut ts = counter(10);
        // Unconstrained by the transition relation.
        ts.declare_input_var("noise");
        let all_ones = ts
            .bdd()
            .apply_and_many((0..10).map(|i| ts.state_var(&format!("x{}", i))));
        let invariant = ts.states(-all_ones);

        let reach = compute_reachable(&ts, &ts.initial_states());
        assert_eq!(reach.layers.depth(), 1023);

        let trace = match check_invariant(&ts, &ts.initial_states(), &invariant).unwrap() {
            Verdict::Violated(trace) => trace,
            Verdict::Holds => panic!("counter must reach 1023"),
        };
        assert_eq!(trace.num_transitions(), reach.layers.depth());
        assert!(ts.initial_states().contains(trace.initial()));
        for (from, input, to) in trace.transitions() {
            assert_eq!(from.len(), 10);
            assert_eq!(input.len(), 2);
            assert_eq!(input.get("inc"), Some(true));
            assert!(ts.is_transition(from, input, to));
        }
        assert!(!invariant.contains(trace.last()));
    }

    #[test]
    fn test_sets_follow_later_declarations() {
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("a");
        let set = ts.states(ts.state_var("a"));
        ts.declare_state_var("b");

        let picked = set.pick_one().unwrap();

        assert_eq!(picked, val(&[("a", true), ("b", false)]));
        assert_eq!(set.domain().len(), 2);
        assert!(set.contains(&picked));
        assert_eq!(ts.count_states(&ts.singleton(&picked)), Some(1));
    }

    #[test]
    fn test_exclusive_flags_hold() {
        // a' := in ∧ ¬b, b' := ¬in ∧ ¬a; never both set.
        let mut ts = TransitionSystem::new(Rc::new(Bdd::default()));
        ts.declare_state_var("a");
        ts.declare_state_var("b");
        ts.declare_input_var("in");
        let (a, b, i) = (ts.state_var("a"), ts.state_var("b"), ts.input_var("in"));
        let t = ts.build_transition(&[
            ts.assign_var("a", ts.bdd().apply_and(i, -b)),
            ts.assign_var("b", ts.bdd().apply_and(-i, -a)),
        ]);
        ts.set_transition(t);
        ts.set_initial(ts.bdd().apply_and(-a, -b));
        let invariant = ts.states(-ts.bdd().apply_and(a, b));

        let verdict = check_invariant(&ts, &ts.initial_states(), &invariant).unwrap();

        assert!(verdict.is_satisfied());
        let r = compute_reachable(&ts, &ts.initial_states());
        assert_eq!(ts.count_states(&r.reachable), Some(3));
    }
}
