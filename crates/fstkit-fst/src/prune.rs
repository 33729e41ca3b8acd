// Weight-threshold pruning.
//
// Distances here use the natural order (best path) regardless of the
// semiring's `plus`, so pruning in the log semiring behaves like Viterbi
// pruning.

use std::collections::VecDeque;

use fstkit_core::{DELTA, Semiring, StateId};
use tracing::{debug, warn};

use crate::MAX_RELAXATIONS;
use crate::fst::VectorFst;

fn better<W: Semiring>(a: W, b: W) -> W {
    if b.less(&a) { b } else { a }
}

/// Best-path weight from the start state to every state (`forward`), or
/// from every state to a final state (`!forward`). Cycles are handled by
/// queue relaxation; with negative cycles the loop stops at the relaxation
/// limit.
pub(crate) fn best_distances<W: Semiring>(fst: &VectorFst<W>, forward: bool) -> Vec<W> {
    let n = fst.num_states();
    let mut dist = vec![W::zero(); n];
    if fst.is_empty() {
        return dist;
    }

    // adjacency in the direction of propagation
    let mut edges: Vec<Vec<(StateId, W)>> = vec![Vec::new(); n];
    for s in fst.states() {
        for arc in fst.arcs(s) {
            if forward {
                edges[s].push((arc.nextstate, arc.weight));
            } else {
                edges[arc.nextstate].push((s, arc.weight));
            }
        }
    }

    let mut queue = VecDeque::new();
    let mut queued = vec![false; n];
    if forward {
        dist[fst.start()] = W::one();
        queue.push_back(fst.start());
        queued[fst.start()] = true;
    } else {
        for s in fst.states() {
            let fw = fst.final_weight(s);
            if !fw.is_zero() {
                dist[s] = fw;
                queue.push_back(s);
                queued[s] = true;
            }
        }
    }

    let mut relaxations = 0usize;
    while let Some(s) = queue.pop_front() {
        queued[s] = false;
        let ds = dist[s];
        for &(t, w) in &edges[s] {
            let cand = if forward { ds.times(&w) } else { w.times(&ds) };
            if cand.less(&dist[t]) && !cand.approx_eq(&dist[t], DELTA / 16.0) {
                dist[t] = better(dist[t], cand);
                if !queued[t] {
                    queued[t] = true;
                    queue.push_back(t);
                }
            }
        }
        relaxations += 1;
        if relaxations > MAX_RELAXATIONS {
            warn!("best-path distances did not converge; stopping early");
            break;
        }
    }
    dist
}

/// True if `w` is no worse than `limit`, within `DELTA`.
fn within<W: Semiring>(w: &W, limit: &W) -> bool {
    !limit.less(w) || w.approx_eq(limit, DELTA)
}

/// Remove every arc and final weight that lies only on paths worse than
/// the best path times `threshold`. The result is trimmed.
pub fn prune<W: Semiring>(fst: &VectorFst<W>, threshold: W) -> VectorFst<W> {
    let mut out = fst.clone();
    if fst.is_empty() {
        return out;
    }
    let alpha = best_distances(fst, true);
    let beta = best_distances(fst, false);
    let best = beta[fst.start()];
    if best.is_zero() {
        return VectorFst::new();
    }
    let limit = best.times(&threshold);

    for s in fst.states() {
        if alpha[s].is_zero() {
            continue;
        }
        let fw = fst.final_weight(s);
        if !fw.is_zero() && !within(&alpha[s].times(&fw), &limit) {
            out.put_final(s, W::zero());
        }
        let keep: Vec<bool> = fst
            .arcs(s)
            .map(|arc| within(&alpha[s].times(&arc.weight).times(&beta[arc.nextstate]), &limit))
            .collect();
        if keep.iter().all(|&k| k) {
            continue;
        }
        let arcs = out.arcs_mut(s);
        let mut k = keep.iter();
        arcs.retain(|_| k.next().copied().unwrap_or(true));
    }
    let before = fst.total_arcs();
    out.connect();
    debug!(before, after = out.total_arcs(), "pruned");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::accep;
    use crate::paths::PathIterator;
    use crate::rational::union;
    use fstkit_core::{LogWeight, TropicalWeight};

    type W = TropicalWeight;

    fn sorted_strings(fst: &VectorFst<W>) -> Vec<String> {
        let mut out = PathIterator::new(fst).unwrap().ostrings().unwrap();
        out.sort();
        out
    }

    fn sample() -> VectorFst<W> {
        let mut u = accep::<W>("a", W::from(1.0));
        u.union(&accep("b", W::from(2.0)));
        u.union(&accep("c", W::from(5.0)));
        u
    }

    #[test]
    fn keeps_paths_within_threshold() {
        let p = prune(&sample(), W::from(1.5));
        assert_eq!(sorted_strings(&p), vec!["a", "b"]);
        assert!(p.verify());
    }

    #[test]
    fn threshold_one_keeps_ties() {
        let mut u = sample();
        u.union(&accep("d", W::from(1.0)));
        let p = prune(&u, W::one());
        assert_eq!(sorted_strings(&p), vec!["a", "d"]);
    }

    #[test]
    fn large_threshold_keeps_everything() {
        let p = prune(&sample(), W::from(100.0));
        assert_eq!(sorted_strings(&p), vec!["a", "b", "c"]);
    }

    #[test]
    fn prunes_final_weights() {
        let mut fst = accep::<W>("", W::from(3.0));
        fst.union(&accep("x", W::one()));
        let p = prune(&fst, W::from(1.0));
        assert_eq!(sorted_strings(&p), vec!["x"]);
    }

    #[test]
    fn distances_on_cycles() {
        let mut fst = accep::<W>("ab", W::from(1.0));
        fst.push_arc(2, crate::fst::Arc::new(99, 99, W::from(1.0), 0));
        let alpha = best_distances(&fst, true);
        assert_eq!(alpha[2].value(), 1.0);
        let beta = best_distances(&fst, false);
        assert_eq!(beta[0].value(), 1.0);
    }

    #[test]
    fn log_pruning_uses_best_path() {
        let u = union(&accep::<LogWeight>("a", LogWeight::from(1.0)), &accep("b", LogWeight::from(3.0)));
        let p = prune(&u, LogWeight::from(1.0));
        let strings = PathIterator::new(&p).unwrap().ostrings().unwrap();
        assert_eq!(strings, vec!["a"]);
    }
}
