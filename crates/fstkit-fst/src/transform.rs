// Label and weight transforms: project, invert, reverse, cross, weight removal
// and semiring conversion.

use fstkit_core::{EPSILON, FstError, Label, Semiring, convert_weight};

use crate::fst::{Arc, VectorFst};
use crate::properties::Properties;

/// Which side `project` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Input,
    Output,
}

impl<W: Semiring> VectorFst<W> {
    /// Replace each arc's labels with one side, making an acceptor.
    pub fn project(&mut self, project_type: ProjectType) {
        let props = self.properties();
        for s in self.states() {
            for arc in self.arcs_mut(s).iter_mut() {
                match project_type {
                    ProjectType::Input => arc.olabel = arc.ilabel,
                    ProjectType::Output => arc.ilabel = arc.olabel,
                }
            }
        }
        let kept = props & (Properties::WEIGHTED | Properties::UNWEIGHTED)
            | props & (Properties::CYCLIC | Properties::ACYCLIC);
        self.set_properties(kept.set(Properties::ACCEPTOR));
    }

    /// Swap input and output labels.
    pub fn invert(&mut self) {
        let props = self.properties();
        for s in self.states() {
            for arc in self.arcs_mut(s).iter_mut() {
                std::mem::swap(&mut arc.ilabel, &mut arc.olabel);
            }
        }
        let kept = props
            & (Properties::ACCEPTOR
                | Properties::NOT_ACCEPTOR
                | Properties::WEIGHTED
                | Properties::UNWEIGHTED
                | Properties::CYCLIC
                | Properties::ACYCLIC
                | Properties::EPSILONS
                | Properties::NO_EPSILONS);
        self.set_properties(kept);
    }

    /// Set every non-zero weight to `one`.
    pub fn rm_weight(&mut self) {
        for s in self.states() {
            if self.is_final(s) {
                self.put_final(s, W::one());
            }
            for arc in self.arcs_mut(s).iter_mut() {
                arc.weight = W::one();
            }
        }
    }

    /// Multiply every final weight by `weight`.
    pub fn times_final(&mut self, weight: W) {
        for s in self.states() {
            let fw = self.final_weight(s);
            if !fw.is_zero() {
                self.put_final(s, fw.times(&weight));
            }
        }
    }

    /// Relabel arcs through `f(ilabel, olabel)`.
    pub fn relabel(&mut self, mut f: impl FnMut(Label, Label) -> (Label, Label)) {
        for s in self.states() {
            for arc in self.arcs_mut(s).iter_mut() {
                let (i, o) = f(arc.ilabel, arc.olabel);
                arc.ilabel = i;
                arc.olabel = o;
            }
        }
    }
}

pub fn project<W: Semiring>(fst: &VectorFst<W>, project_type: ProjectType) -> VectorFst<W> {
    let mut out = fst.clone();
    out.project(project_type);
    out
}

pub fn invert<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = fst.clone();
    out.invert();
    out
}

/// Reverse every path. State 0 of the result is a fresh start state with
/// epsilon arcs (carrying the old final weights) into the old final
/// states; old state `s` becomes `s + 1` and the old start becomes final.
pub fn reverse<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = VectorFst::new();
    if fst.is_empty() {
        return out;
    }
    out.add_states(fst.num_states() + 1);
    out.set_start_unchecked(0);
    for s in fst.states() {
        let fw = fst.final_weight(s);
        if !fw.is_zero() {
            out.push_arc(0, Arc::new(EPSILON, EPSILON, fw, s + 1));
        }
        for arc in fst.arcs(s) {
            out.push_arc(
                arc.nextstate + 1,
                Arc::new(arc.ilabel, arc.olabel, arc.weight, s + 1),
            );
        }
    }
    out.put_final(fst.start() + 1, W::one());
    out
}

/// Cross product of two acceptors: maps every string of `a` to every
/// string of `b`. Built as `a` with epsilon outputs followed by `b` with
/// epsilon inputs.
pub fn cross<W: Semiring>(a: &VectorFst<W>, b: &VectorFst<W>) -> Result<VectorFst<W>, FstError> {
    if !a.is_acceptor() || !b.is_acceptor() {
        return Err(FstError::NotAnAcceptor);
    }
    let mut left = a.clone();
    left.relabel(|i, _| (i, EPSILON));
    let mut right = b.clone();
    right.relabel(|_, o| (EPSILON, o));
    left.concat(&right);
    Ok(left)
}

/// Copy `fst` into another semiring, re-interpreting each weight's value.
pub fn convert_weights<W1: Semiring, W2: Semiring>(
    fst: &VectorFst<W1>,
) -> Result<VectorFst<W2>, FstError> {
    let mut out = VectorFst::new();
    out.add_states(fst.num_states());
    for s in fst.states() {
        let fw = fst.final_weight(s);
        if !fw.is_zero() {
            out.put_final(s, convert_weight(fw)?);
        }
        for arc in fst.arcs(s) {
            out.push_arc(
                s,
                Arc::new(arc.ilabel, arc.olabel, convert_weight(arc.weight)?, arc.nextstate),
            );
        }
    }
    if !fst.is_empty() {
        out.set_start_unchecked(fst.start());
    }
    Ok(out)
}
