// Epsilon removal.
//
// For each state p, the epsilon closure is computed with a queue-based
// shortest-distance relaxation over epsilon:epsilon arcs. Every non-epsilon
// arc and final weight reachable through the closure is then copied to p,
// multiplied by the closure distance.

use std::collections::VecDeque;

use fstkit_core::{DELTA, Semiring, StateId};
use hashbrown::{HashMap, HashSet};
use tracing::warn;

use crate::MAX_RELAXATIONS;
use crate::fst::{Arc, VectorFst};
use crate::properties::Properties;

/// Epsilon distances from `p`, sorted by state. Includes `p` itself.
fn epsilon_closure<W: Semiring>(fst: &VectorFst<W>, p: StateId) -> Vec<(StateId, W)> {
    let mut distance: HashMap<StateId, W> = HashMap::new();
    let mut residual: HashMap<StateId, W> = HashMap::new();
    let mut queue = VecDeque::new();
    let mut queued = HashSet::new();
    distance.insert(p, W::one());
    residual.insert(p, W::one());
    queue.push_back(p);
    queued.insert(p);

    let mut relaxations = 0usize;
    while let Some(q) = queue.pop_front() {
        queued.remove(&q);
        let r = residual.insert(q, W::zero()).unwrap_or_else(W::zero);
        if r.is_zero() {
            continue;
        }
        for arc in fst.arcs(q).filter(|a| a.is_epsilon()) {
            let next = arc.nextstate;
            let old = distance.get(&next).copied().unwrap_or_else(W::zero);
            let add = r.times(&arc.weight);
            let new = old.plus(&add);
            if !new.approx_eq(&old, DELTA) {
                distance.insert(next, new);
                let rn = residual.get(&next).copied().unwrap_or_else(W::zero);
                residual.insert(next, rn.plus(&add));
                if queued.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        relaxations += 1;
        if relaxations > MAX_RELAXATIONS {
            warn!(state = p, "epsilon closure did not converge; stopping early");
            break;
        }
    }

    let mut closure: Vec<(StateId, W)> = distance.into_iter().collect();
    closure.sort_unstable_by_key(|&(s, _)| s);
    closure
}

impl<W: Semiring> VectorFst<W> {
    /// Remove all epsilon:epsilon arcs without changing the weighted
    /// relation. The result is trimmed.
    pub fn rm_epsilon(&mut self) {
        if self.is_empty() {
            return;
        }
        let has_epsilons = self
            .test_properties(Properties::EPSILONS)
            .contains(Properties::EPSILONS);
        if !has_epsilons {
            self.connect();
            return;
        }

        let n = self.num_states();
        let mut new_arcs: Vec<Vec<Arc<W>>> = Vec::with_capacity(n);
        let mut new_finals: Vec<W> = Vec::with_capacity(n);
        for p in 0..n {
            let mut arcs = Vec::new();
            let mut fw = W::zero();
            for (q, d) in epsilon_closure(self, p) {
                fw = fw.plus(&d.times(&self.final_weight(q)));
                for arc in self.arcs(q).filter(|a| !a.is_epsilon()) {
                    arcs.push(Arc::new(
                        arc.ilabel,
                        arc.olabel,
                        d.times(&arc.weight),
                        arc.nextstate,
                    ));
                }
            }
            new_arcs.push(arcs);
            new_finals.push(fw);
        }

        let props = self.properties();
        for (p, (arcs, fw)) in new_arcs.into_iter().zip(new_finals).enumerate() {
            *self.arcs_mut(p) = arcs;
            self.put_final(p, fw);
        }
        let kept = props & (Properties::ACCEPTOR | Properties::NOT_ACCEPTOR);
        self.set_properties(kept.set(Properties::NO_EPSILONS));
        self.connect();
    }
}

/// Epsilon-free copy of `fst`.
pub fn rm_epsilon<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = fst.clone();
    out.rm_epsilon();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::accep;
    use crate::paths::PathIterator;
    use crate::rational::{ClosureType, closure, concat, union};
    use fstkit_core::{LogWeight, TropicalWeight};

    type W = TropicalWeight;

    fn no_epsilons<W: Semiring>(fst: &VectorFst<W>) -> bool {
        fst.states().all(|s| fst.arcs(s).all(|a| !a.is_epsilon()))
    }

    #[test]
    fn removes_union_epsilons() {
        let u = union(&accep::<W>("a", W::one()), &accep("b", W::from(1.0)));
        let r = rm_epsilon(&u);
        assert!(no_epsilons(&r));
        assert!(r.verify());
        let mut strings = PathIterator::new(&r).unwrap().ostrings().unwrap();
        strings.sort();
        assert_eq!(strings, vec!["a", "b"]);
    }

    #[test]
    fn keeps_concat_weights() {
        let c = concat(&accep::<W>("a", W::from(1.0)), &accep("b", W::from(2.0)));
        let r = rm_epsilon(&c);
        assert!(no_epsilons(&r));
        let (_, _, w) = r.linear_path().unwrap();
        assert_eq!(w.value(), 3.0);
    }

    #[test]
    fn epsilon_into_final_moves_weight() {
        let mut fst = VectorFst::<W>::new();
        fst.add_states(2);
        fst.set_start(0).unwrap();
        fst.set_final(1, W::from(0.5)).unwrap();
        fst.add_arc(0, Arc::new(0, 0, W::from(2.0), 1)).unwrap();
        let r = rm_epsilon(&fst);
        assert_eq!(r.num_states(), 1);
        assert_eq!(r.final_weight(0).value(), 2.5);
    }

    #[test]
    fn star_closure_terminates() {
        let star = closure(&accep::<W>("ab", W::one()), ClosureType::Star);
        let r = rm_epsilon(&star);
        assert!(no_epsilons(&r));
        assert!(r.is_final(r.start()));
    }

    #[test]
    fn log_closure_sums_parallel_epsilons() {
        let mut fst = VectorFst::<LogWeight>::new();
        fst.add_states(2);
        fst.set_start(0).unwrap();
        fst.set_final(1, LogWeight::one()).unwrap();
        fst.add_arc(0, Arc::new(0, 0, LogWeight::from(1.0), 1)).unwrap();
        fst.add_arc(0, Arc::new(0, 0, LogWeight::from(1.0), 1)).unwrap();
        let r = rm_epsilon(&fst);
        let expected = 1.0 - std::f32::consts::LN_2;
        assert!((r.final_weight(0).value() - expected).abs() < 1e-5);
    }

    #[test]
    fn epsilon_cycle_converges() {
        let mut fst = VectorFst::<W>::new();
        fst.add_states(2);
        fst.set_start(0).unwrap();
        fst.set_final(1, W::one()).unwrap();
        fst.add_arc(0, Arc::new(0, 0, W::from(1.0), 1)).unwrap();
        fst.add_arc(1, Arc::new(0, 0, W::from(1.0), 0)).unwrap();
        let r = rm_epsilon(&fst);
        assert_eq!(r.final_weight(r.start()).value(), 1.0);
    }
}
