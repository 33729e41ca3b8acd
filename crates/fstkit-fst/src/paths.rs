// Path enumeration over automata whose successful paths are acyclic.
//
// Traversal keeps an explicit DFS stack (state and next arc index at each
// depth) instead of recursing, so deep automata cannot overflow the call
// stack. States that cannot reach a final state are never entered.

use fstkit_core::{EPSILON, FstError, Label, Semiring, StateId, labels_to_string};

use crate::connect::{coaccessible, has_successful_cycle};
use crate::fst::{Arc, VectorFst};
use crate::shortest_path::WeightedPath;

/// Read-only enumeration of the successful paths of an automaton.
///
/// Paths come out depth-first in arc order; a path ending at a final state
/// is produced before the paths that continue through it. The order is the
/// same on every pass. The iterator borrows the automaton, so it cannot be
/// mutated while the view is alive.
///
/// ```ignore
/// let mut it = PathIterator::new(&fst)?;
/// while !it.done() {
///     println!("{} {}", it.ostring()?, it.weight());
///     it.next();
/// }
/// ```
pub struct PathIterator<'a, W: Semiring> {
    fst: &'a VectorFst<W>,
    live: Vec<bool>,

    /// State at each stack depth.
    state_stack: Vec<StateId>,
    /// Index of the next arc to try at each stack depth.
    next_arc_stack: Vec<usize>,
    /// Arc taken from depth `k` to depth `k + 1`.
    arc_stack: Vec<Arc<W>>,

    ilabels: Vec<Label>,
    olabels: Vec<Label>,
    weight: W,
    done: bool,
}

impl<'a, W: Semiring> PathIterator<'a, W> {
    /// Fails with `CyclicAutomaton` if some successful path can loop.
    pub fn new(fst: &'a VectorFst<W>) -> Result<Self, FstError> {
        if has_successful_cycle(fst) {
            return Err(FstError::CyclicAutomaton);
        }
        let mut it = PathIterator {
            fst,
            live: coaccessible(fst),
            state_stack: Vec::new(),
            next_arc_stack: Vec::new(),
            arc_stack: Vec::new(),
            ilabels: Vec::new(),
            olabels: Vec::new(),
            weight: W::zero(),
            done: true,
        };
        it.reset();
        Ok(it)
    }

    /// Restart from the first path.
    pub fn reset(&mut self) {
        self.state_stack.clear();
        self.next_arc_stack.clear();
        self.arc_stack.clear();
        self.done = false;
        if self.fst.is_empty() || !self.live[self.fst.start()] {
            self.finish();
            return;
        }
        let start = self.fst.start();
        self.state_stack.push(start);
        self.next_arc_stack.push(0);
        if self.fst.is_final(start) {
            self.emit();
        } else {
            self.advance();
        }
    }

    /// True once every path has been visited.
    pub fn done(&self) -> bool {
        self.done
    }

    /// Move to the next path.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if !self.done {
            self.advance();
        }
    }

    /// Non-epsilon input labels of the current path.
    pub fn ilabels(&self) -> &[Label] {
        &self.ilabels
    }

    /// Non-epsilon output labels of the current path.
    pub fn olabels(&self) -> &[Label] {
        &self.olabels
    }

    pub fn istring(&self) -> Result<String, FstError> {
        labels_to_string(&self.ilabels)
    }

    pub fn ostring(&self) -> Result<String, FstError> {
        labels_to_string(&self.olabels)
    }

    /// Weight of the current path including the final weight; `zero` once
    /// done.
    pub fn weight(&self) -> W {
        self.weight
    }

    /// Input strings of all paths, from the first path.
    pub fn istrings(&mut self) -> Result<Vec<String>, FstError> {
        self.collect(|it| it.istring())
    }

    /// Output strings of all paths, from the first path.
    pub fn ostrings(&mut self) -> Result<Vec<String>, FstError> {
        self.collect(|it| it.ostring())
    }

    /// All paths with labels and weights, from the first path.
    pub fn paths(&mut self) -> Vec<WeightedPath<W>> {
        self.reset();
        let mut out = Vec::new();
        while !self.done {
            out.push(WeightedPath {
                ilabels: self.ilabels.clone(),
                olabels: self.olabels.clone(),
                weight: self.weight,
            });
            self.advance();
        }
        out
    }

    fn collect(
        &mut self,
        mut f: impl FnMut(&Self) -> Result<String, FstError>,
    ) -> Result<Vec<String>, FstError> {
        self.reset();
        let mut out = Vec::new();
        while !self.done {
            out.push(f(self)?);
            self.advance();
        }
        Ok(out)
    }

    fn advance(&mut self) {
        loop {
            let depth = self.state_stack.len();
            if depth == 0 {
                self.finish();
                return;
            }
            let state = self.state_stack[depth - 1];
            let arcs = self.fst.arcs(state).as_slice();
            let mut i = self.next_arc_stack[depth - 1];
            while i < arcs.len() && !self.live[arcs[i].nextstate] {
                i += 1;
            }
            if i == arcs.len() {
                // exhausted: backtrack
                self.state_stack.pop();
                self.next_arc_stack.pop();
                self.arc_stack.pop();
                continue;
            }
            self.next_arc_stack[depth - 1] = i + 1;
            let arc = arcs[i];
            self.arc_stack.push(arc);
            self.state_stack.push(arc.nextstate);
            self.next_arc_stack.push(0);
            if self.fst.is_final(arc.nextstate) {
                self.emit();
                return;
            }
        }
    }

    fn emit(&mut self) {
        self.ilabels.clear();
        self.olabels.clear();
        let mut weight = W::one();
        for arc in &self.arc_stack {
            if arc.ilabel != EPSILON {
                self.ilabels.push(arc.ilabel);
            }
            if arc.olabel != EPSILON {
                self.olabels.push(arc.olabel);
            }
            weight = weight.times(&arc.weight);
        }
        if let Some(&last) = self.state_stack.last() {
            weight = weight.times(&self.fst.final_weight(last));
        }
        self.weight = weight;
    }

    fn finish(&mut self) {
        self.done = true;
        self.ilabels.clear();
        self.olabels.clear();
        self.weight = W::zero();
    }
}
