// Single-source shortest distance over automata whose successful paths are
// acyclic, visiting states in topological order.

use fstkit_core::{FstError, Semiring};

use crate::connect::{connected_states, top_order_masked};
use crate::fst::VectorFst;

/// Accumulate distances in topological order. `combine` is the semiring
/// `plus` or a natural-order minimum.
pub(crate) fn acyclic_distance<W: Semiring>(
    fst: &VectorFst<W>,
    reverse: bool,
    combine: impl Fn(&W, &W) -> W,
) -> Result<Vec<W>, FstError> {
    let n = fst.num_states();
    let mut dist = vec![W::zero(); n];
    if fst.is_empty() {
        return Ok(dist);
    }
    let mask = connected_states(fst);
    let order = top_order_masked(fst, &mask).ok_or(FstError::CyclicAutomaton)?;

    if reverse {
        for &s in order.iter().rev() {
            let mut d = fst.final_weight(s);
            for arc in fst.arcs(s).filter(|a| mask[a.nextstate]) {
                d = combine(&d, &arc.weight.times(&dist[arc.nextstate]));
            }
            dist[s] = d;
        }
    } else {
        if mask[fst.start()] {
            dist[fst.start()] = W::one();
        }
        for &s in &order {
            let ds = dist[s];
            if ds.is_zero() {
                continue;
            }
            for arc in fst.arcs(s).filter(|a| mask[a.nextstate]) {
                let t = arc.nextstate;
                dist[t] = combine(&dist[t], &ds.times(&arc.weight));
            }
        }
    }
    Ok(dist)
}

/// Shortest distance from the start state to each state (`reverse ==
/// false`), or from each state to the final states (`reverse == true`),
/// summed with the semiring's `plus`.
///
/// Only states on successful paths are considered; all other states get
/// `zero`. Fails with `CyclicAutomaton` if a successful path can loop.
pub fn shortest_distance<W: Semiring>(
    fst: &VectorFst<W>,
    reverse: bool,
) -> Result<Vec<W>, FstError> {
    acyclic_distance(fst, reverse, |a, b| a.plus(b))
}

/// Total weight of all successful paths.
pub fn total_weight<W: Semiring>(fst: &VectorFst<W>) -> Result<W, FstError> {
    if fst.is_empty() {
        return Ok(W::zero());
    }
    let beta = shortest_distance(fst, true)?;
    Ok(beta[fst.start()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::accep;
    use crate::fst::Arc;
    use crate::rational::{ClosureType, closure, union};
    use fstkit_core::{LogWeight, TropicalWeight};

    type W = TropicalWeight;

    #[test]
    fn forward_and_reverse() {
        let u = union(&accep::<W>("ab", W::from(2.0)), &accep("c", W::from(1.0)));
        let alpha = shortest_distance(&u, false).unwrap();
        assert_eq!(alpha[u.start()], W::one());
        let beta = shortest_distance(&u, true).unwrap();
        assert_eq!(beta[u.start()].value(), 1.0);
    }

    #[test]
    fn log_total_sums_paths() {
        let a = accep::<LogWeight>("a", LogWeight::from(1.0));
        let total = total_weight(&union(&a, &a)).unwrap();
        assert!((total.value() - (1.0 - std::f32::consts::LN_2)).abs() < 1e-5);
    }

    #[test]
    fn cyclic_success_path_fails() {
        let star = closure(&accep::<W>("a", W::one()), ClosureType::Star);
        assert_eq!(shortest_distance(&star, false), Err(FstError::CyclicAutomaton));
    }

    #[test]
    fn dead_cycles_are_ignored() {
        let mut fst = accep::<W>("ab", W::one());
        let dead = fst.add_state();
        fst.push_arc(0, Arc::new(120, 120, W::one(), dead));
        fst.push_arc(dead, Arc::new(121, 121, W::one(), dead));
        let beta = shortest_distance(&fst, true).unwrap();
        assert_eq!(beta[0], W::one());
        assert!(beta[dead].is_zero());
    }

    #[test]
    fn empty_total_is_zero() {
        assert!(total_weight(&VectorFst::<W>::new()).unwrap().is_zero());
    }
}
