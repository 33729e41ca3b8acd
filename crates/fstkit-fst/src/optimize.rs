// Canonical optimization: trim, remove epsilons, merge parallel arcs,
// determinize and minimize over (ilabel, olabel, weight) codes, decode.
// The pass repeats until the automaton stops changing.

use fstkit_core::{DELTA, Semiring};
use tracing::{debug, warn};

use crate::determinize::weighted_subsets;
use crate::encode::{EncodeTable, EncodeType};
use crate::fst::{Arc, VectorFst};

/// Upper bound on optimization passes.
const MAX_OPTIMIZE_PASSES: usize = 8;

impl<W: Semiring> VectorFst<W> {
    /// Combine arcs that share source, labels and destination into one arc
    /// whose weight is the `plus` of theirs. Arcs end up sorted by
    /// (ilabel, olabel, nextstate).
    pub fn merge_parallel_arcs(&mut self) {
        for s in self.states() {
            if self.num_arcs(s) < 2 {
                continue;
            }
            let mut arcs = std::mem::take(self.arcs_mut(s));
            arcs.sort_by_key(|a| (a.ilabel, a.olabel, a.nextstate));
            let mut merged: Vec<Arc<W>> = Vec::with_capacity(arcs.len());
            for arc in arcs {
                match merged.last_mut() {
                    Some(last)
                        if (last.ilabel, last.olabel, last.nextstate)
                            == (arc.ilabel, arc.olabel, arc.nextstate) =>
                    {
                        last.weight = last.weight.plus(&arc.weight);
                    }
                    _ => merged.push(arc),
                }
            }
            *self.arcs_mut(s) = merged;
        }
    }

    fn optimize_pass(&mut self) {
        self.connect();
        self.rm_epsilon();
        if self.is_empty() {
            return;
        }
        self.merge_parallel_arcs();

        let table = EncodeTable::from_fst(self, EncodeType::LabelsAndWeights);
        let encoded = table.encode_fst(self);
        let (mut det, _) = weighted_subsets(&encoded, None, DELTA);
        det.minimize();
        *self = table.decode_fst(&det);
    }

    /// Reduce to a canonical equivalent: epsilon-free, deterministic over
    /// (ilabel, olabel, weight) triples, minimal, and numbered
    /// breadth-first. Optimizing an optimized automaton leaves it unchanged.
    pub fn optimize(&mut self) {
        let before = self.num_states();
        for pass in 0..MAX_OPTIMIZE_PASSES {
            let previous = self.clone();
            self.optimize_pass();
            if *self == previous {
                debug!(before, after = self.num_states(), passes = pass + 1, "optimized");
                return;
            }
        }
        warn!(passes = MAX_OPTIMIZE_PASSES, "optimization did not reach a fixpoint");
    }
}

/// Optimized copy of `fst`.
pub fn optimize<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = fst.clone();
    out.optimize();
    out
}
