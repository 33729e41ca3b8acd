// Trimming and topological order.

use std::collections::VecDeque;

use fstkit_core::{NO_STATE_ID, Semiring, StateId};
use tracing::debug;

use crate::fst::VectorFst;
use crate::properties::Properties;

/// States reachable from the start state.
pub fn accessible<W: Semiring>(fst: &VectorFst<W>) -> Vec<bool> {
    let mut seen = vec![false; fst.num_states()];
    if fst.start() == NO_STATE_ID {
        return seen;
    }
    let mut stack = vec![fst.start()];
    seen[fst.start()] = true;
    while let Some(s) = stack.pop() {
        for arc in fst.arcs(s) {
            if !seen[arc.nextstate] {
                seen[arc.nextstate] = true;
                stack.push(arc.nextstate);
            }
        }
    }
    seen
}

/// States from which some final state is reachable.
pub fn coaccessible<W: Semiring>(fst: &VectorFst<W>) -> Vec<bool> {
    let n = fst.num_states();
    let mut incoming: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for s in fst.states() {
        for arc in fst.arcs(s) {
            incoming[arc.nextstate].push(s);
        }
    }
    let mut seen = vec![false; n];
    let mut stack: Vec<StateId> = fst.states().filter(|&s| fst.is_final(s)).collect();
    for &s in &stack {
        seen[s] = true;
    }
    while let Some(s) = stack.pop() {
        for &p in &incoming[s] {
            if !seen[p] {
                seen[p] = true;
                stack.push(p);
            }
        }
    }
    seen
}

/// States that are both accessible and coaccessible.
pub fn connected_states<W: Semiring>(fst: &VectorFst<W>) -> Vec<bool> {
    let acc = accessible(fst);
    let coacc = coaccessible(fst);
    acc.iter().zip(&coacc).map(|(&a, &c)| a && c).collect()
}

/// Topological order of the states selected by `mask`, considering only
/// arcs between selected states. `None` if they contain a cycle.
pub(crate) fn top_order_masked<W: Semiring>(
    fst: &VectorFst<W>,
    mask: &[bool],
) -> Option<Vec<StateId>> {
    let n = fst.num_states();
    let mut indegree = vec![0usize; n];
    for s in fst.states().filter(|&s| mask[s]) {
        for arc in fst.arcs(s) {
            if mask[arc.nextstate] {
                indegree[arc.nextstate] += 1;
            }
        }
    }
    let mut queue: VecDeque<StateId> = fst
        .states()
        .filter(|&s| mask[s] && indegree[s] == 0)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(s) = queue.pop_front() {
        order.push(s);
        for arc in fst.arcs(s) {
            let q = arc.nextstate;
            if mask[q] {
                indegree[q] -= 1;
                if indegree[q] == 0 {
                    queue.push_back(q);
                }
            }
        }
    }
    let selected = mask.iter().filter(|&&m| m).count();
    (order.len() == selected).then_some(order)
}

/// True if any state lies on a cycle.
pub fn has_cycle<W: Semiring>(fst: &VectorFst<W>) -> bool {
    let all = vec![true; fst.num_states()];
    top_order_masked(fst, &all).is_none()
}

/// True if some successful path can pass through a cycle.
pub fn has_successful_cycle<W: Semiring>(fst: &VectorFst<W>) -> bool {
    let mask = connected_states(fst);
    top_order_masked(fst, &mask).is_none()
}

/// Topological order of all states, or `None` if the automaton is cyclic.
pub fn top_order<W: Semiring>(fst: &VectorFst<W>) -> Option<Vec<StateId>> {
    let all = vec![true; fst.num_states()];
    top_order_masked(fst, &all)
}

impl<W: Semiring> VectorFst<W> {
    /// Remove states that are not on any path from the start state to a
    /// final state. Surviving states keep their relative order.
    pub fn connect(&mut self) {
        let keep = connected_states(self);
        let before = self.num_states();
        self.retain_states(&keep);
        if self.num_states() == 0 {
            self.clear_start();
        }
        if before != self.num_states() {
            debug!(before, after = self.num_states(), "connect removed states");
        }
    }

    /// Renumber states in topological order. Returns `false`, leaving the
    /// automaton unchanged, if it is cyclic.
    pub fn top_sort(&mut self) -> bool {
        let Some(order) = top_order(self) else {
            return false;
        };
        let mut rank = vec![0; self.num_states()];
        for (i, &s) in order.iter().enumerate() {
            rank[s] = i;
        }
        let props = self.properties();
        let mut sorted = VectorFst::new();
        sorted.add_states(self.num_states());
        for &s in &order {
            sorted.put_final(rank[s], self.final_weight(s));
            for arc in self.arcs(s) {
                let mut arc = *arc;
                arc.nextstate = rank[arc.nextstate];
                sorted.push_arc(rank[s], arc);
            }
        }
        if self.start() != NO_STATE_ID {
            sorted.set_start_unchecked(rank[self.start()]);
        }
        sorted.set_properties(props.set(Properties::ACYCLIC));
        *self = sorted;
        true
    }
}
