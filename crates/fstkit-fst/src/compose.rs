// Composition with a three-state epsilon filter.
//
// Product states are (q1, q2, filter). The filter admits exactly one
// alignment of epsilon moves per pair of paths:
//
//   T1 moves alone on an epsilon output:   0 -> 1, 1 -> 1, blocked from 2
//   T2 moves alone on an epsilon input:    0 -> 2, 2 -> 2, blocked from 1
//   both move on epsilon together:         0 -> 0 only
//   labels match:                          any -> 0

use std::collections::VecDeque;

use fstkit_core::{EPSILON, FstError, Label, Semiring, StateId};
use hashbrown::HashMap;
use tracing::debug;

use crate::fst::{Arc, VectorFst};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Trim the result.
    pub connect: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions { connect: true }
    }
}

type Filter = u8;
type Triple = (StateId, StateId, Filter);

struct Composer<'a, W: Semiring> {
    a: &'a VectorFst<W>,
    b: &'a VectorFst<W>,
    /// Arcs of `b` sorted by input label, for binary-search matching.
    b_sorted: Vec<Vec<Arc<W>>>,
    out: VectorFst<W>,
    ids: HashMap<Triple, StateId>,
    queue: VecDeque<Triple>,
}

impl<'a, W: Semiring> Composer<'a, W> {
    fn new(a: &'a VectorFst<W>, b: &'a VectorFst<W>) -> Self {
        let b_sorted = b
            .states()
            .map(|s| {
                let mut arcs: Vec<Arc<W>> = b.arcs(s).copied().collect();
                arcs.sort_by_key(|arc| arc.ilabel);
                arcs
            })
            .collect();
        Composer {
            a,
            b,
            b_sorted,
            out: VectorFst::new(),
            ids: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    fn state_id(&mut self, key: Triple) -> StateId {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.out.add_state();
        self.ids.insert(key, id);
        self.queue.push_back(key);
        id
    }

    fn b_matches(&self, q2: StateId, label: Label) -> &[Arc<W>] {
        let arcs = &self.b_sorted[q2];
        let lo = arcs.partition_point(|a| a.ilabel < label);
        let hi = arcs.partition_point(|a| a.ilabel <= label);
        &arcs[lo..hi]
    }

    fn expand(&mut self, key: Triple) {
        let (q1, q2, filter) = key;
        let s = self.ids[&key];

        let fw = self.a.final_weight(q1).times(&self.b.final_weight(q2));
        if !fw.is_zero() {
            self.out.put_final(s, fw);
        }

        let mut pending: Vec<(Label, Label, W, Triple)> = Vec::new();
        for arc1 in self.a.arcs(q1) {
            if arc1.olabel == EPSILON {
                if filter != 2 {
                    pending.push((arc1.ilabel, EPSILON, arc1.weight, (arc1.nextstate, q2, 1)));
                }
                if filter == 0 {
                    for arc2 in self.b_matches(q2, EPSILON) {
                        pending.push((
                            arc1.ilabel,
                            arc2.olabel,
                            arc1.weight.times(&arc2.weight),
                            (arc1.nextstate, arc2.nextstate, 0),
                        ));
                    }
                }
            } else {
                for arc2 in self.b_matches(q2, arc1.olabel) {
                    pending.push((
                        arc1.ilabel,
                        arc2.olabel,
                        arc1.weight.times(&arc2.weight),
                        (arc1.nextstate, arc2.nextstate, 0),
                    ));
                }
            }
        }
        if filter != 1 {
            for arc2 in self.b_matches(q2, EPSILON) {
                pending.push((EPSILON, arc2.olabel, arc2.weight, (q1, arc2.nextstate, 2)));
            }
        }

        for (ilabel, olabel, weight, dest) in pending {
            if weight.is_zero() {
                continue;
            }
            let next = self.state_id(dest);
            self.out.push_arc(s, Arc::new(ilabel, olabel, weight, next));
        }
    }
}

/// Compose `a` with `b`: the relation mapping x to z whenever `a` maps x to
/// some y and `b` maps y to z. Path weights multiply. States are numbered
/// in breadth-first discovery order.
pub fn compose<W: Semiring>(a: &VectorFst<W>, b: &VectorFst<W>) -> VectorFst<W> {
    compose_with_options(a, b, &ComposeOptions::default())
}

pub fn compose_with_options<W: Semiring>(
    a: &VectorFst<W>,
    b: &VectorFst<W>,
    opts: &ComposeOptions,
) -> VectorFst<W> {
    if a.is_empty() || b.is_empty() {
        return VectorFst::new();
    }

    let mut composer = Composer::new(a, b);
    let start = composer.state_id((a.start(), b.start(), 0));
    composer.out.set_start_unchecked(start);
    while let Some(key) = composer.queue.pop_front() {
        composer.expand(key);
    }

    let mut out = composer.out;
    debug!(states = out.num_states(), arcs = out.total_arcs(), "composed");
    if opts.connect {
        out.connect();
    }
    out
}

/// Intersection of two acceptors.
pub fn intersect<W: Semiring>(
    a: &VectorFst<W>,
    b: &VectorFst<W>,
) -> Result<VectorFst<W>, FstError> {
    if !a.is_acceptor() || !b.is_acceptor() {
        return Err(FstError::NotAnAcceptor);
    }
    Ok(compose(a, b))
}
