// Encoding of (ilabel, olabel[, weight]) into single acceptor labels, so
// that acceptor algorithms can be applied to transducers.

use std::cmp::Ordering;

use fstkit_core::{EPSILON, Label, Semiring};
use hashbrown::HashMap;

use crate::fst::{Arc, VectorFst};

/// What is folded into the code label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeType {
    /// Label pairs only; arc weights stay on the arcs. `(0, 0)` keeps code 0.
    Labels,
    /// Label pairs and weights. Final weights become arcs into a fresh
    /// super-final state, and every triple (epsilons included) gets a
    /// non-zero code.
    LabelsAndWeights,
}

/// Bijection between label/weight tuples and code labels.
///
/// Codes are assigned in sorted tuple order, so the numbering depends only
/// on the set of tuples and not on the order they were seen in.
#[derive(Debug, Clone)]
pub struct EncodeTable<W: Semiring> {
    encode_type: EncodeType,
    tuples: Vec<(Label, Label, W)>,
    codes: HashMap<(Label, Label, u32), Label>,
}

fn cmp_tuple<W: Semiring>(a: &(Label, Label, W), b: &(Label, Label, W)) -> Ordering {
    (a.0, a.1)
        .cmp(&(b.0, b.1))
        .then_with(|| a.2.value().total_cmp(&b.2.value()))
}

impl<W: Semiring> EncodeTable<W> {
    /// Build a table covering every arc (and, when encoding weights, every
    /// final weight) of `fst`.
    pub fn from_fst(fst: &VectorFst<W>, encode_type: EncodeType) -> Self {
        let mut tuples: Vec<(Label, Label, W)> = Vec::new();
        for s in fst.states() {
            for arc in fst.arcs(s) {
                tuples.push(Self::tuple_of(encode_type, arc.ilabel, arc.olabel, arc.weight));
            }
            if encode_type == EncodeType::LabelsAndWeights && fst.is_final(s) {
                tuples.push((EPSILON, EPSILON, fst.final_weight(s)));
            }
        }
        tuples.sort_by(cmp_tuple);
        tuples.dedup_by(|a, b| cmp_tuple(a, b) == Ordering::Equal);
        if encode_type == EncodeType::Labels {
            tuples.retain(|t| !(t.0 == EPSILON && t.1 == EPSILON));
        }

        let mut codes = HashMap::with_capacity(tuples.len());
        for (k, t) in tuples.iter().enumerate() {
            codes.insert((t.0, t.1, t.2.value().to_bits()), k as Label + 1);
        }
        EncodeTable {
            encode_type,
            tuples,
            codes,
        }
    }

    fn tuple_of(encode_type: EncodeType, i: Label, o: Label, w: W) -> (Label, Label, W) {
        match encode_type {
            EncodeType::Labels => (i, o, W::one()),
            EncodeType::LabelsAndWeights => (i, o, w),
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Code for a tuple. Tuples absent from the table encode as epsilon.
    pub fn encode(&self, i: Label, o: Label, w: W) -> Label {
        let (i, o, w) = Self::tuple_of(self.encode_type, i, o, w);
        self.codes
            .get(&(i, o, w.value().to_bits()))
            .copied()
            .unwrap_or(EPSILON)
    }

    /// Tuple for a code. `None` for epsilon or an unknown code.
    pub fn decode(&self, code: Label) -> Option<(Label, Label, W)> {
        if code == EPSILON {
            return None;
        }
        self.tuples.get(code as usize - 1).copied()
    }

    /// Encoded acceptor.
    pub fn encode_fst(&self, fst: &VectorFst<W>) -> VectorFst<W> {
        let mut out = VectorFst::new();
        out.add_states(fst.num_states());
        let super_final = match self.encode_type {
            EncodeType::LabelsAndWeights => {
                let f = out.add_state();
                out.put_final(f, W::one());
                Some(f)
            }
            EncodeType::Labels => None,
        };
        for s in fst.states() {
            for arc in fst.arcs(s) {
                let code = self.encode(arc.ilabel, arc.olabel, arc.weight);
                let weight = match self.encode_type {
                    EncodeType::Labels => arc.weight,
                    EncodeType::LabelsAndWeights => W::one(),
                };
                out.push_arc(s, Arc::new(code, code, weight, arc.nextstate));
            }
            let fw = fst.final_weight(s);
            if fw.is_zero() {
                continue;
            }
            match super_final {
                Some(f) => {
                    let code = self.encode(EPSILON, EPSILON, fw);
                    out.push_arc(s, Arc::new(code, code, W::one(), f));
                }
                None => out.put_final(s, fw),
            }
        }
        if !fst.is_empty() {
            out.set_start_unchecked(fst.start());
        }
        out
    }

    /// Decode an automaton produced from `encode_fst`. When weights were
    /// encoded, epsilon arcs into an arc-less state with final weight `one`
    /// are folded back into final weights.
    pub fn decode_fst(&self, fst: &VectorFst<W>) -> VectorFst<W> {
        let mut out = VectorFst::new();
        out.add_states(fst.num_states());
        for s in fst.states() {
            let fw = fst.final_weight(s);
            if !fw.is_zero() {
                out.put_final(s, fw);
            }
            for arc in fst.arcs(s) {
                let (i, o, w) = self
                    .decode(arc.ilabel)
                    .unwrap_or((EPSILON, EPSILON, W::one()));
                let weight = match self.encode_type {
                    EncodeType::Labels => arc.weight,
                    EncodeType::LabelsAndWeights => w.times(&arc.weight),
                };
                out.push_arc(s, Arc::new(i, o, weight, arc.nextstate));
            }
        }
        if !fst.is_empty() {
            out.set_start_unchecked(fst.start());
        }
        if self.encode_type == EncodeType::LabelsAndWeights {
            out.fold_final_arcs();
        }
        out
    }
}

impl<W: Semiring> VectorFst<W> {
    /// Replace epsilon arcs into arc-less states with final weight `one`
    /// by final weights, then trim.
    pub(crate) fn fold_final_arcs(&mut self) {
        let sinks: Vec<bool> = self
            .states()
            .map(|s| self.num_arcs(s) == 0 && self.final_weight(s).is_one())
            .collect();
        for s in self.states() {
            let folds = self
                .arcs(s)
                .any(|a| a.is_epsilon() && sinks[a.nextstate]);
            if !folds {
                continue;
            }
            let mut fw = self.final_weight(s);
            let arcs = std::mem::take(self.arcs_mut(s));
            let mut kept = Vec::with_capacity(arcs.len());
            for arc in arcs {
                if arc.is_epsilon() && sinks[arc.nextstate] {
                    fw = fw.plus(&arc.weight);
                } else {
                    kept.push(arc);
                }
            }
            *self.arcs_mut(s) = kept;
            self.put_final(s, fw);
        }
        self.connect();
    }
}
