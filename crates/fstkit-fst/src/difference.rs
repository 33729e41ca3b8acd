// Difference of unweighted acceptors, A - B = A ∩ complement(B).
//
// B is determinized and walked in lockstep with A. When B has no matching
// arc the pair falls into a sink that accepts everything; a product state
// is final when A is final and B is not.

use std::collections::VecDeque;

use fstkit_core::{FstError, NO_STATE_ID, Semiring, StateId};
use hashbrown::HashMap;
use tracing::debug;

use crate::determinize::determinize;
use crate::fst::{Arc, VectorFst};
use crate::rmepsilon::rm_epsilon;

fn check_operand<W: Semiring>(fst: &VectorFst<W>) -> Result<(), FstError> {
    if !fst.is_acceptor() {
        return Err(FstError::NotAnAcceptor);
    }
    if !fst.is_unweighted() {
        return Err(FstError::UnsupportedForWeighted);
    }
    Ok(())
}

/// Strings accepted by `a` but not by `b`. Both operands must be
/// unweighted acceptors.
pub fn difference<W: Semiring>(
    a: &VectorFst<W>,
    b: &VectorFst<W>,
) -> Result<VectorFst<W>, FstError> {
    check_operand(a)?;
    check_operand(b)?;

    let a = rm_epsilon(a);
    let mut out = VectorFst::new();
    if a.is_empty() {
        return Ok(out);
    }
    let b = determinize(b);
    let b_start = if b.is_empty() { NO_STATE_ID } else { b.start() };

    // NO_STATE_ID on the B side is the accept-all sink
    let mut ids: HashMap<(StateId, StateId), StateId> = HashMap::new();
    let mut queue = VecDeque::new();
    let start = out.add_state();
    out.set_start_unchecked(start);
    ids.insert((a.start(), b_start), start);
    queue.push_back((a.start(), b_start));

    while let Some((qa, qb)) = queue.pop_front() {
        let s = ids[&(qa, qb)];
        let b_accepts = qb != NO_STATE_ID && b.is_final(qb);
        if a.is_final(qa) && !b_accepts {
            out.put_final(s, a.final_weight(qa));
        }
        for arc in a.arcs(qa) {
            let next_b = if qb == NO_STATE_ID {
                NO_STATE_ID
            } else {
                b.arcs(qb)
                    .find(|x| x.ilabel == arc.ilabel)
                    .map_or(NO_STATE_ID, |x| x.nextstate)
            };
            let key = (arc.nextstate, next_b);
            let t = match ids.get(&key) {
                Some(&t) => t,
                None => {
                    let t = out.add_state();
                    ids.insert(key, t);
                    queue.push_back(key);
                    t
                }
            };
            out.push_arc(s, Arc::new(arc.ilabel, arc.olabel, arc.weight, t));
        }
    }
    out.connect();
    debug!(states = out.num_states(), "difference");
    Ok(out)
}
