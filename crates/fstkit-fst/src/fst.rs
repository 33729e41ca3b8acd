// Mutable automaton store: states, arcs, final weights and a start state.

use std::ops::Range;

use fstkit_core::{EPSILON, FstError, Label, NO_STATE_ID, Semiring, StateId};

use crate::properties::{Properties, compute_properties};

/// A transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W: Semiring> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Arc {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }

    /// An unweighted epsilon:epsilon arc.
    pub fn epsilon(nextstate: StateId) -> Self {
        Arc::new(EPSILON, EPSILON, W::one(), nextstate)
    }

    pub fn is_epsilon(&self) -> bool {
        self.ilabel == EPSILON && self.olabel == EPSILON
    }
}

#[derive(Debug, Clone, PartialEq)]
struct State<W> {
    final_weight: W,
    arcs: Vec<Arc<W>>,
}

/// Order for [`VectorFst::arc_sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSortType {
    ILabel,
    OLabel,
}

/// Properties preserved when arcs or states are removed.
const DELETION_STABLE: Properties = Properties::ACCEPTOR
    .union(Properties::UNWEIGHTED)
    .union(Properties::ACYCLIC)
    .union(Properties::I_DETERMINISTIC)
    .union(Properties::NO_EPSILONS);

/// A weighted finite-state transducer with states stored in a vector.
///
/// States are dense indices `0..num_states()`. An automaton with no start
/// state (`start() == NO_STATE_ID`) accepts nothing. Structural properties
/// are cached and kept up to date by the mutators; bits that a mutation may
/// have invalidated are forgotten rather than recomputed.
#[derive(Debug, Clone)]
pub struct VectorFst<W: Semiring> {
    states: Vec<State<W>>,
    start: StateId,
    properties: Properties,
}

impl<W: Semiring> PartialEq for VectorFst<W> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.states == other.states
    }
}

impl<W: Semiring> Default for VectorFst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Semiring> VectorFst<W> {
    pub fn new() -> Self {
        VectorFst {
            states: Vec::new(),
            start: NO_STATE_ID,
            properties: Properties::ACCEPTOR
                | Properties::UNWEIGHTED
                | Properties::ACYCLIC
                | Properties::I_DETERMINISTIC
                | Properties::NO_EPSILONS,
        }
    }

    #[inline]
    pub fn start(&self) -> StateId {
        self.start
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn states(&self) -> Range<StateId> {
        0..self.states.len()
    }

    #[inline]
    pub fn num_arcs(&self, s: StateId) -> usize {
        self.states[s].arcs.len()
    }

    pub fn total_arcs(&self) -> usize {
        self.states.iter().map(|st| st.arcs.len()).sum()
    }

    #[inline]
    pub fn final_weight(&self, s: StateId) -> W {
        self.states[s].final_weight
    }

    #[inline]
    pub fn is_final(&self, s: StateId) -> bool {
        !self.states[s].final_weight.is_zero()
    }

    #[inline]
    pub fn arcs(&self, s: StateId) -> std::slice::Iter<'_, Arc<W>> {
        self.states[s].arcs.iter()
    }

    /// True if the automaton has no start state.
    pub fn is_empty(&self) -> bool {
        self.start == NO_STATE_ID
    }

    fn check_state(&self, s: StateId) -> Result<(), FstError> {
        if s >= self.states.len() {
            return Err(FstError::StateIndexOutOfRange {
                state: s,
                num_states: self.states.len(),
            });
        }
        Ok(())
    }

    pub fn add_state(&mut self) -> StateId {
        self.states.push(State {
            final_weight: W::zero(),
            arcs: Vec::new(),
        });
        self.states.len() - 1
    }

    /// Append `n` fresh states and return their index range.
    pub fn add_states(&mut self, n: usize) -> Range<StateId> {
        let first = self.states.len();
        for _ in 0..n {
            self.add_state();
        }
        first..self.states.len()
    }

    pub fn set_start(&mut self, s: StateId) -> Result<(), FstError> {
        self.check_state(s)?;
        self.start = s;
        Ok(())
    }

    pub(crate) fn set_start_unchecked(&mut self, s: StateId) {
        debug_assert!(s < self.states.len());
        self.start = s;
    }

    pub(crate) fn clear_start(&mut self) {
        self.start = NO_STATE_ID;
    }

    pub fn set_final(&mut self, s: StateId, weight: W) -> Result<(), FstError> {
        self.check_state(s)?;
        if !weight.is_member() {
            return Err(FstError::InvalidWeight(weight.value()));
        }
        self.put_final(s, weight);
        Ok(())
    }

    /// `set_final` without range or domain checks.
    pub(crate) fn put_final(&mut self, s: StateId, weight: W) {
        if !weight.is_zero() && !weight.is_one() {
            self.properties = self.properties.set(Properties::WEIGHTED);
        } else if self.properties.contains(Properties::WEIGHTED) {
            self.properties = self.properties.forget(Properties::WEIGHTED);
        }
        self.states[s].final_weight = weight;
    }

    pub fn add_arc(&mut self, s: StateId, arc: Arc<W>) -> Result<(), FstError> {
        self.check_state(s)?;
        self.check_state(arc.nextstate)?;
        if !arc.weight.is_member() {
            return Err(FstError::InvalidWeight(arc.weight.value()));
        }
        self.push_arc(s, arc);
        Ok(())
    }

    /// `add_arc` without range or domain checks, for algorithms that build
    /// states before wiring them.
    pub(crate) fn push_arc(&mut self, s: StateId, arc: Arc<W>) {
        let mut p = self.properties;
        if arc.ilabel != arc.olabel {
            p = p.set(Properties::NOT_ACCEPTOR);
        }
        if !arc.weight.is_one() {
            p = p.set(Properties::WEIGHTED);
        }
        if arc.is_epsilon() {
            p = p.set(Properties::EPSILONS);
        }
        if arc.ilabel == EPSILON {
            p = p.set(Properties::NON_I_DETERMINISTIC);
        } else if p.contains(Properties::I_DETERMINISTIC)
            && self.states[s].arcs.iter().any(|a| a.ilabel == arc.ilabel)
        {
            p = p.set(Properties::NON_I_DETERMINISTIC);
        }
        if arc.nextstate == s {
            p = p.set(Properties::CYCLIC);
        } else if p.contains(Properties::ACYCLIC) {
            p = p.forget(Properties::ACYCLIC);
        }
        self.properties = p;
        self.states[s].arcs.push(arc);
    }

    /// Mutable access to a state's arcs. Forgets every cached property;
    /// callers that know better restore them with `set_properties`.
    pub(crate) fn arcs_mut(&mut self, s: StateId) -> &mut Vec<Arc<W>> {
        self.properties = Properties::empty();
        &mut self.states[s].arcs
    }

    pub(crate) fn set_properties(&mut self, props: Properties) {
        self.properties = props;
    }

    pub fn delete_arcs(&mut self, s: StateId) -> Result<(), FstError> {
        self.check_state(s)?;
        self.states[s].arcs.clear();
        self.properties = self.properties & DELETION_STABLE;
        Ok(())
    }

    /// Remove `states` and every arc into them. Remaining states keep their
    /// relative order. Deleting the start state empties the automaton.
    pub fn delete_states(&mut self, states: &[StateId]) -> Result<(), FstError> {
        let mut keep = vec![true; self.states.len()];
        for &s in states {
            self.check_state(s)?;
            keep[s] = false;
        }
        self.retain_states(&keep);
        Ok(())
    }

    /// Keep exactly the states with `keep[s]`, renumbering densely.
    pub(crate) fn retain_states(&mut self, keep: &[bool]) {
        let mut map = vec![NO_STATE_ID; self.states.len()];
        let mut next = 0;
        for (s, &k) in keep.iter().enumerate() {
            if k {
                map[s] = next;
                next += 1;
            }
        }
        if next == self.states.len() {
            return;
        }
        let old = std::mem::take(&mut self.states);
        self.states = Vec::with_capacity(next);
        for (s, mut state) in old.into_iter().enumerate() {
            if !keep[s] {
                continue;
            }
            state.arcs.retain(|a| keep[a.nextstate]);
            for arc in &mut state.arcs {
                arc.nextstate = map[arc.nextstate];
            }
            self.states.push(state);
        }
        self.start = if self.start == NO_STATE_ID {
            NO_STATE_ID
        } else {
            map[self.start]
        };
        self.properties = self.properties & DELETION_STABLE;
    }

    /// Remove all states.
    pub fn delete_all_states(&mut self) {
        *self = Self::new();
    }

    pub fn arc_sort(&mut self, sort_type: ArcSortType) {
        let props = self.properties;
        for s in 0..self.states.len() {
            let arcs = &mut self.states[s].arcs;
            match sort_type {
                ArcSortType::ILabel => arcs.sort_by_key(|a| (a.ilabel, a.olabel)),
                ArcSortType::OLabel => arcs.sort_by_key(|a| (a.olabel, a.ilabel)),
            }
        }
        self.properties = props;
    }

    pub fn reserve_arcs(&mut self, s: StateId, n: usize) {
        self.states[s].arcs.reserve(n);
    }

    /// Cached properties; only known bits are set.
    pub fn properties(&self) -> Properties {
        self.properties
    }

    /// Properties restricted to the pairs in `mask`, computing them if any
    /// is unknown. Nothing is cached.
    pub fn test_properties(&self, mask: Properties) -> Properties {
        let pairs = mask.pair_mask();
        if self.properties.knows(pairs) {
            self.properties & pairs
        } else {
            compute_properties(self) & pairs
        }
    }

    /// Like `test_properties`, but caches the computed bits.
    pub fn update_properties(&mut self, mask: Properties) -> Properties {
        let pairs = mask.pair_mask();
        if !self.properties.knows(pairs) {
            self.properties = compute_properties(self);
        }
        self.properties & pairs
    }

    pub fn is_acceptor(&self) -> bool {
        self.test_properties(Properties::ACCEPTOR)
            .contains(Properties::ACCEPTOR)
    }

    /// Every arc weight is `one` and every final weight is `zero` or `one`.
    pub fn is_unweighted(&self) -> bool {
        self.test_properties(Properties::UNWEIGHTED)
            .contains(Properties::UNWEIGHTED)
    }

    pub fn is_cyclic(&self) -> bool {
        self.test_properties(Properties::CYCLIC)
            .contains(Properties::CYCLIC)
    }

    /// Check internal consistency: the start state and arc targets are in
    /// range, weights are semiring members and the cached properties agree
    /// with freshly computed ones.
    pub fn verify(&self) -> bool {
        let n = self.states.len();
        if self.start != NO_STATE_ID && self.start >= n {
            return false;
        }
        for state in &self.states {
            if !state.final_weight.is_member() {
                return false;
            }
            for arc in &state.arcs {
                if arc.nextstate >= n || !arc.weight.is_member() {
                    return false;
                }
            }
        }
        compute_properties(self).contains(self.properties)
    }
}
