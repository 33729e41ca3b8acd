// Weighted determinization (weighted subset construction).
//
// A subset is a sorted list of (state, residual weight) pairs. Two subsets
// are the same state when their residuals agree after quantization. The
// arc leaving a subset on label `l` carries the sum of all `l`-arc weights
// (times residuals); what is left over is pushed into the next subset.
//
// Transducers are determinized as acceptors over encoded label pairs, and
// the result is decoded back.

use std::collections::BTreeMap;

use fstkit_core::{DELTA, FstError, Label, Semiring, StateId};
use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::encode::{EncodeTable, EncodeType};
use crate::fst::{Arc, VectorFst};
use crate::prune::prune;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminizeOptions<W> {
    /// Stop creating states past this many. The result is then partial.
    pub max_states: Option<usize>,
    /// Keep only paths within this weight of the best path.
    pub weight_threshold: Option<W>,
    /// Quantization used to compare residual weights.
    pub delta: f32,
}

impl<W: Semiring> Default for DeterminizeOptions<W> {
    fn default() -> Self {
        DeterminizeOptions {
            max_states: None,
            weight_threshold: None,
            delta: DELTA,
        }
    }
}

/// Result of a determinization that may have hit its state ceiling.
#[derive(Debug, Clone)]
pub struct Determinized<W: Semiring> {
    fst: VectorFst<W>,
    truncated: bool,
    max_states: usize,
}

impl<W: Semiring> Determinized<W> {
    pub fn fst(&self) -> &VectorFst<W> {
        &self.fst
    }

    /// The automaton, partial or not.
    pub fn into_fst(self) -> VectorFst<W> {
        self.fst
    }

    /// True if the state ceiling was reached. The automaton then accepts a
    /// subset of the input's language.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The automaton, or `Truncated` if the ceiling was reached.
    pub fn into_complete(self) -> Result<VectorFst<W>, FstError> {
        if self.truncated {
            return Err(FstError::Truncated {
                max_states: self.max_states,
            });
        }
        Ok(self.fst)
    }
}

/// Subset construction over an epsilon-free acceptor. Returns the result
/// and whether the state ceiling cut it short.
pub(crate) fn weighted_subsets<W: Semiring>(
    fst: &VectorFst<W>,
    max_states: Option<usize>,
    delta: f32,
) -> (VectorFst<W>, bool) {
    let mut out = VectorFst::new();
    if fst.is_empty() {
        return (out, false);
    }

    let mut subsets: Vec<Vec<(StateId, W)>> = Vec::new();
    let mut ids: HashMap<Vec<(StateId, u32)>, StateId> = HashMap::new();
    let start = vec![(fst.start(), W::one())];
    ids.insert(vec![(fst.start(), W::one().quantized_key(delta))], 0);
    subsets.push(start);
    out.add_state();
    out.set_start_unchecked(0);

    let mut truncated = false;
    let mut current = 0;
    while current < subsets.len() {
        let subset = subsets[current].clone();

        let mut fw = W::zero();
        let mut groups: BTreeMap<Label, Vec<(StateId, W)>> = BTreeMap::new();
        for &(q, r) in &subset {
            fw = fw.plus(&r.times(&fst.final_weight(q)));
            for arc in fst.arcs(q) {
                groups
                    .entry(arc.ilabel)
                    .or_default()
                    .push((arc.nextstate, r.times(&arc.weight)));
            }
        }
        if !fw.is_zero() {
            out.put_final(current, fw);
        }

        for (label, contributions) in groups {
            let weight = contributions
                .iter()
                .fold(W::zero(), |acc, (_, w)| acc.plus(w));
            if weight.is_zero() {
                continue;
            }
            let mut residuals: BTreeMap<StateId, W> = BTreeMap::new();
            for (q, c) in contributions {
                let Some(res) = c.divide(&weight) else {
                    continue;
                };
                let entry = residuals.entry(q).or_insert_with(W::zero);
                *entry = entry.plus(&res);
            }
            let next: Vec<(StateId, W)> = residuals.into_iter().collect();
            let key: Vec<(StateId, u32)> = next
                .iter()
                .map(|&(q, r)| (q, r.quantized_key(delta)))
                .collect();

            let dest = match ids.get(&key) {
                Some(&d) => d,
                None => {
                    if max_states.is_some_and(|m| subsets.len() >= m) {
                        truncated = true;
                        continue;
                    }
                    let d = out.add_state();
                    ids.insert(key, d);
                    subsets.push(next);
                    d
                }
            };
            out.push_arc(current, Arc::new(label, label, weight, dest));
        }
        current += 1;
    }
    (out, truncated)
}

/// Determinize with default options.
pub fn determinize<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    determinize_with_options(fst, &DeterminizeOptions::default()).into_fst()
}

/// Determinize `fst`. Epsilons are removed first. With a weight threshold
/// the input is pruned before and the output after the subset construction;
/// with a threshold of `one` exactly the optimal paths survive.
pub fn determinize_with_options<W: Semiring>(
    fst: &VectorFst<W>,
    opts: &DeterminizeOptions<W>,
) -> Determinized<W> {
    let table = (!fst.is_acceptor()).then(|| EncodeTable::from_fst(fst, EncodeType::Labels));
    let mut input = match &table {
        Some(t) => t.encode_fst(fst),
        None => fst.clone(),
    };
    input.rm_epsilon();
    if let Some(threshold) = opts.weight_threshold {
        input = prune(&input, threshold);
    }

    let (mut out, truncated) = weighted_subsets(&input, opts.max_states, opts.delta);
    if truncated {
        warn!(
            max_states = opts.max_states.unwrap_or_default(),
            "determinization truncated"
        );
        out.connect();
    }
    if let Some(threshold) = opts.weight_threshold {
        out = prune(&out, threshold);
    }
    let out = match table {
        Some(t) => t.decode_fst(&out),
        None => out,
    };
    debug!(states = out.num_states(), truncated, "determinized");
    Determinized {
        fst: out,
        truncated,
        max_states: opts.max_states.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{accep, cross_strings};
    use crate::paths::PathIterator;
    use crate::properties::Properties;
    use crate::rational::{ClosureType, closure, union};
    use fstkit_core::{LogWeight, TropicalWeight};

    type W = TropicalWeight;

    fn strings_with_weights(fst: &VectorFst<W>) -> Vec<(String, f32)> {
        let mut it = PathIterator::new(fst).unwrap();
        let mut out = Vec::new();
        while !it.done() {
            out.push((it.ostring().unwrap(), it.weight().value()));
            it.next();
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    #[test]
    fn merges_common_prefixes() {
        let u = union(&accep::<W>("ab", W::one()), &accep("ac", W::one()));
        let d = determinize(&u);
        assert!(
            d.test_properties(Properties::I_DETERMINISTIC)
                .contains(Properties::I_DETERMINISTIC)
        );
        assert_eq!(d.num_arcs(d.start()), 1);
        assert_eq!(d.num_states(), 4);
    }

    #[test]
    fn keeps_best_weight_per_string() {
        let u = union(&accep::<W>("ab", W::from(3.0)), &accep("ab", W::from(1.0)));
        let d = determinize(&u);
        assert_eq!(strings_with_weights(&d), vec![("ab".to_string(), 1.0)]);
    }

    #[test]
    fn distinct_strings_keep_their_weights() {
        let u = union(&accep::<W>("ab", W::from(1.0)), &accep("ac", W::from(4.0)));
        let d = determinize(&u);
        assert_eq!(
            strings_with_weights(&d),
            vec![("ab".to_string(), 1.0), ("ac".to_string(), 4.0)]
        );
    }

    #[test]
    fn shared_label_weight_moves_to_shared_arc() {
        let mut fst = VectorFst::<W>::new();
        fst.add_states(3);
        fst.set_start(0).unwrap();
        fst.set_final(1, W::from(1.0)).unwrap();
        fst.set_final(2, W::one()).unwrap();
        fst.add_arc(0, Arc::new(97, 97, W::from(2.0), 1)).unwrap();
        fst.add_arc(0, Arc::new(97, 97, W::from(5.0), 2)).unwrap();
        let d = determinize(&fst);
        let first = d.arcs(d.start()).next().unwrap();
        assert_eq!(first.weight.value(), 2.0);
        assert_eq!(d.final_weight(first.nextstate).value(), 1.0);
    }

    #[test]
    fn log_semiring_sums_duplicates() {
        let a = accep::<LogWeight>("x", LogWeight::from(1.0));
        let d = determinize(&union(&a, &a));
        let (_, _, w) = d.linear_path().unwrap();
        assert!((w.value() - (1.0 - std::f32::consts::LN_2)).abs() < 1e-5);
    }

    #[test]
    fn transducers_determinize_over_pairs() {
        let t = union(
            &cross_strings::<W>("ab", "xy", W::one()),
            &cross_strings("ac", "xz", W::one()),
        );
        let d = determinize(&t);
        assert_eq!(d.num_arcs(d.start()), 1);
        let mut outs = PathIterator::new(&d).unwrap().ostrings().unwrap();
        outs.sort();
        assert_eq!(outs, vec!["xy", "xz"]);
    }

    #[test]
    fn threshold_one_keeps_only_best() {
        let u = union(
            &union(&accep::<W>("a", W::from(2.0)), &accep("b", W::from(1.0))),
            &accep("c", W::from(1.0)),
        );
        let opts = DeterminizeOptions {
            weight_threshold: Some(W::one()),
            ..Default::default()
        };
        let d = determinize_with_options(&u, &opts).into_complete().unwrap();
        let strings: Vec<String> = strings_with_weights(&d).into_iter().map(|p| p.0).collect();
        assert_eq!(strings, vec!["b", "c"]);
    }

    #[test]
    fn state_ceiling_truncates() {
        let words = ["abcd", "abce", "abde", "bcde"];
        let mut u = VectorFst::<W>::new();
        for w in words {
            u.union(&accep(w, W::one()));
        }
        let opts = DeterminizeOptions {
            max_states: Some(3),
            ..Default::default()
        };
        let result = determinize_with_options(&u, &opts);
        assert!(result.is_truncated());
        assert!(result.fst().num_states() <= 3);
        assert_eq!(
            result.into_complete().unwrap_err(),
            FstError::Truncated { max_states: 3 }
        );
    }

    #[test]
    fn cyclic_unweighted_input() {
        let sigma = union(&accep::<W>("a", W::one()), &accep("b", W::one()));
        let star = closure(&sigma, ClosureType::Star);
        let d = determinize(&star);
        assert_eq!(d.num_states(), 3);
        assert!(d.is_final(d.start()));
        assert!(d.verify());
    }

    #[test]
    fn empty_input() {
        let d = determinize(&VectorFst::<W>::new());
        assert!(d.is_empty());
    }
}
