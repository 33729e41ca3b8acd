// Minimization by partition refinement.
//
// Two states fall in the same class when their final weights and the
// multisets of (ilabel, olabel, quantized weight, class of destination)
// coincide. Refinement repeats until the number of classes is stable; the
// quotient is then renumbered breadth-first from the start class so that
// equal languages with equal structure get identical numbering.

use std::collections::VecDeque;

use fstkit_core::{DELTA, Label, NO_STATE_ID, Semiring, StateId};
use hashbrown::HashMap;
use tracing::debug;

use crate::connect::accessible;
use crate::fst::{Arc, VectorFst};

type Signature = (usize, u32, Vec<(Label, Label, u32, usize)>);

/// Class of every state after refinement. Class ids follow the order in
/// which each class's lowest state appears.
fn refine<W: Semiring>(fst: &VectorFst<W>, delta: f32) -> (Vec<usize>, usize) {
    let n = fst.num_states();
    let mut class = vec![0usize; n];
    let mut count = 1usize.min(n);
    loop {
        let mut ids: HashMap<Signature, usize> = HashMap::with_capacity(count);
        let mut next = vec![0usize; n];
        for s in fst.states() {
            let mut arcs: Vec<(Label, Label, u32, usize)> = fst
                .arcs(s)
                .map(|a| (a.ilabel, a.olabel, a.weight.quantized_key(delta), class[a.nextstate]))
                .collect();
            arcs.sort_unstable();
            let key = (class[s], fst.final_weight(s).quantized_key(delta), arcs);
            let fresh = ids.len();
            next[s] = *ids.entry(key).or_insert(fresh);
        }
        let new_count = ids.len();
        class = next;
        if new_count == count {
            return (class, count);
        }
        count = new_count;
    }
}

impl<W: Semiring> VectorFst<W> {
    /// Merge equivalent states. Inaccessible states are dropped first;
    /// states that are accessible but cannot reach a final state are kept
    /// (merged into one class).
    pub fn minimize(&mut self) {
        if self.is_empty() {
            return;
        }
        let keep = accessible(self);
        self.retain_states(&keep);

        let before = self.num_states();
        let (class, count) = refine(self, DELTA);

        let mut rep = vec![NO_STATE_ID; count];
        for s in self.states() {
            if rep[class[s]] == NO_STATE_ID {
                rep[class[s]] = s;
            }
        }

        // breadth-first numbering over sorted arcs
        let sorted_arcs = |s: StateId| {
            let mut arcs: Vec<Arc<W>> = self.arcs(s).copied().collect();
            arcs.sort_by(|a, b| {
                (a.ilabel, a.olabel)
                    .cmp(&(b.ilabel, b.olabel))
                    .then_with(|| a.weight.value().total_cmp(&b.weight.value()))
            });
            arcs
        };
        let mut number = vec![NO_STATE_ID; count];
        let mut order = Vec::with_capacity(count);
        let mut queue = VecDeque::new();
        let start_class = class[self.start()];
        number[start_class] = 0;
        order.push(start_class);
        queue.push_back(start_class);
        while let Some(c) = queue.pop_front() {
            for arc in sorted_arcs(rep[c]) {
                let d = class[arc.nextstate];
                if number[d] == NO_STATE_ID {
                    number[d] = order.len();
                    order.push(d);
                    queue.push_back(d);
                }
            }
        }

        let mut out = VectorFst::new();
        out.add_states(order.len());
        out.set_start_unchecked(0);
        for (new_id, &c) in order.iter().enumerate() {
            let r = rep[c];
            let fw = self.final_weight(r);
            if !fw.is_zero() {
                out.put_final(new_id, fw);
            }
            let mut arcs: Vec<Arc<W>> = self
                .arcs(r)
                .map(|a| Arc::new(a.ilabel, a.olabel, a.weight, number[class[a.nextstate]]))
                .collect();
            arcs.sort_by(|a, b| {
                (a.ilabel, a.olabel)
                    .cmp(&(b.ilabel, b.olabel))
                    .then_with(|| a.weight.value().total_cmp(&b.weight.value()))
                    .then_with(|| a.nextstate.cmp(&b.nextstate))
            });
            out.reserve_arcs(new_id, arcs.len());
            for arc in arcs {
                out.push_arc(new_id, arc);
            }
        }
        debug!(before, after = out.num_states(), "minimized");
        *self = out;
    }
}

/// Minimized copy of `fst`.
pub fn minimize<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = fst.clone();
    out.minimize();
    out
}
