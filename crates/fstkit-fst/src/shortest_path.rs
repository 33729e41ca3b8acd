// N-best paths by A* search.
//
// The heuristic is the exact best-path distance to a final state, so
// complete paths leave the queue in order of weight even with negative
// weights. Paths whose weights are equal within `delta` form a tie group;
// the group at the cut-off is always collected whole and every group is
// ordered by (output labels, input labels), which makes the selection
// independent of state numbering.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fstkit_core::{DELTA, EPSILON, FstError, Label, Semiring, StateId, labels_to_string};
use hashbrown::HashSet;
use tracing::warn;

use crate::fst::{Arc, VectorFst};
use crate::shortest_distance::acyclic_distance;

/// Largest tie group collected before the search gives up on completeness.
const MAX_TIE_GROUP: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortestPathOptions {
    /// Number of paths to return.
    pub nshortest: usize,
    /// Return at most one path per output string.
    pub unique: bool,
    /// Weights closer than this are ties.
    pub delta: f32,
}

impl Default for ShortestPathOptions {
    fn default() -> Self {
        ShortestPathOptions {
            nshortest: 1,
            unique: false,
            delta: DELTA,
        }
    }
}

impl ShortestPathOptions {
    pub fn new(nshortest: usize) -> Self {
        ShortestPathOptions {
            nshortest,
            ..Default::default()
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}

/// A successful path: its non-epsilon labels and total weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPath<W> {
    pub ilabels: Vec<Label>,
    pub olabels: Vec<Label>,
    pub weight: W,
}

impl<W: Semiring> WeightedPath<W> {
    pub fn istring(&self) -> Result<String, FstError> {
        labels_to_string(&self.ilabels)
    }

    pub fn ostring(&self) -> Result<String, FstError> {
        labels_to_string(&self.olabels)
    }
}

struct Node<W> {
    parent: Option<usize>,
    arc: Option<Arc<W>>,
    state: StateId,
    weight: W,
}

struct Entry {
    priority: f32,
    seq: usize,
    node: usize,
    complete: bool,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap is a max-heap: invert so the best priority, then the
    // oldest entry, comes out first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A complete path with the arcs it took.
struct Found<W> {
    arcs: Vec<Arc<W>>,
    final_weight: W,
    path: WeightedPath<W>,
}

fn natural_min<W: Semiring>(a: &W, b: &W) -> W {
    if b.less(a) { *b } else { *a }
}

fn search<W: Semiring>(
    fst: &VectorFst<W>,
    opts: &ShortestPathOptions,
) -> Result<Vec<Found<W>>, FstError> {
    if fst.is_empty() || opts.nshortest == 0 {
        return Ok(Vec::new());
    }
    let beta = acyclic_distance(fst, true, natural_min)?;
    if beta[fst.start()].is_zero() {
        return Ok(Vec::new());
    }

    let mut nodes = vec![Node {
        parent: None,
        arc: None,
        state: fst.start(),
        weight: W::one(),
    }];
    let mut heap = BinaryHeap::new();
    let mut seq = 0usize;
    heap.push(Entry {
        priority: beta[fst.start()].value(),
        seq,
        node: 0,
        complete: false,
    });

    let mut groups: Vec<Vec<Found<W>>> = Vec::new();
    let mut seen_outputs: HashSet<Vec<Label>> = HashSet::new();
    let mut selected = 0usize;

    while let Some(entry) = heap.pop() {
        if entry.complete {
            let found = collect_path(fst, &nodes, entry.node);
            let joins_last = groups.last().is_some_and(|g| {
                g[0].path.weight.approx_eq(&found.path.weight, opts.delta)
            });
            if !joins_last {
                if selected >= opts.nshortest {
                    break;
                }
                groups.push(Vec::new());
            } else if groups.last().is_some_and(|g| g.len() >= MAX_TIE_GROUP) {
                warn!(size = MAX_TIE_GROUP, "tie group too large; stopping search");
                break;
            }
            if !opts.unique || seen_outputs.insert(found.path.olabels.clone()) {
                selected += 1;
            }
            if let Some(group) = groups.last_mut() {
                group.push(found);
            }
            continue;
        }

        let (state, weight) = (nodes[entry.node].state, nodes[entry.node].weight);
        let fw = fst.final_weight(state);
        if !fw.is_zero() {
            seq += 1;
            heap.push(Entry {
                priority: weight.times(&fw).value(),
                seq,
                node: entry.node,
                complete: true,
            });
        }
        for arc in fst.arcs(state) {
            let rest = beta[arc.nextstate];
            if rest.is_zero() {
                continue;
            }
            let g = weight.times(&arc.weight);
            nodes.push(Node {
                parent: Some(entry.node),
                arc: Some(*arc),
                state: arc.nextstate,
                weight: g,
            });
            seq += 1;
            heap.push(Entry {
                priority: g.times(&rest).value(),
                seq,
                node: nodes.len() - 1,
                complete: false,
            });
        }
    }

    let mut out = Vec::new();
    let mut emitted: HashSet<Vec<Label>> = HashSet::new();
    for mut group in groups {
        group.sort_by(|a, b| {
            a.path
                .olabels
                .cmp(&b.path.olabels)
                .then_with(|| a.path.ilabels.cmp(&b.path.ilabels))
        });
        for found in group {
            if opts.unique && !emitted.insert(found.path.olabels.clone()) {
                continue;
            }
            out.push(found);
        }
    }
    out.truncate(opts.nshortest);
    Ok(out)
}

fn collect_path<W: Semiring>(fst: &VectorFst<W>, nodes: &[Node<W>], leaf: usize) -> Found<W> {
    let mut arcs = Vec::new();
    let mut cursor = Some(leaf);
    while let Some(i) = cursor {
        if let Some(arc) = nodes[i].arc {
            arcs.push(arc);
        }
        cursor = nodes[i].parent;
    }
    arcs.reverse();
    let final_weight = fst.final_weight(nodes[leaf].state);
    let path = WeightedPath {
        ilabels: arcs
            .iter()
            .map(|a| a.ilabel)
            .filter(|&l| l != EPSILON)
            .collect(),
        olabels: arcs
            .iter()
            .map(|a| a.olabel)
            .filter(|&l| l != EPSILON)
            .collect(),
        weight: nodes[leaf].weight.times(&final_weight),
    };
    Found {
        arcs,
        final_weight,
        path,
    }
}

/// The `nshortest` best paths in order of weight. Ties are ordered by
/// output labels, then input labels. With `unique`, only the first path
/// for each output string is kept.
///
/// Fails with `CyclicAutomaton` if a successful path can loop.
pub fn n_best<W: Semiring>(
    fst: &VectorFst<W>,
    opts: &ShortestPathOptions,
) -> Result<Vec<WeightedPath<W>>, FstError> {
    Ok(search(fst, opts)?.into_iter().map(|f| f.path).collect())
}

/// The `nshortest` best paths as an automaton with one linear branch per
/// path, arc weights preserved.
pub fn shortest_path<W: Semiring>(
    fst: &VectorFst<W>,
    opts: &ShortestPathOptions,
) -> Result<VectorFst<W>, FstError> {
    let found = search(fst, opts)?;
    let mut out = VectorFst::new();
    if found.is_empty() {
        return Ok(out);
    }
    let start = out.add_state();
    out.set_start_unchecked(start);
    for f in found {
        let mut prev = start;
        for arc in &f.arcs {
            let next = out.add_state();
            out.push_arc(prev, Arc::new(arc.ilabel, arc.olabel, arc.weight, next));
            prev = next;
        }
        let fw = out.final_weight(prev).plus(&f.final_weight);
        out.put_final(prev, fw);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{accep, cross_strings};
    use crate::paths::PathIterator;
    use crate::rational::{ClosureType, closure};
    use fstkit_core::TropicalWeight;

    type W = TropicalWeight;

    fn lattice(entries: &[(&str, f32)]) -> VectorFst<W> {
        let mut u = VectorFst::new();
        for &(s, w) in entries {
            u.union(&accep(s, W::from(w)));
        }
        u
    }

    fn ostrings(paths: &[WeightedPath<W>]) -> Vec<String> {
        paths.iter().map(|p| p.ostring().unwrap()).collect()
    }

    #[test]
    fn single_best() {
        let l = lattice(&[("b", 2.0), ("a", 1.0), ("c", 3.0)]);
        let best = n_best(&l, &ShortestPathOptions::default()).unwrap();
        assert_eq!(ostrings(&best), vec!["a"]);
        assert_eq!(best[0].weight.value(), 1.0);
    }

    #[test]
    fn n_best_in_weight_order() {
        let l = lattice(&[("b", 2.0), ("a", 1.0), ("c", 3.0)]);
        let best = n_best(&l, &ShortestPathOptions::new(2)).unwrap();
        assert_eq!(ostrings(&best), vec!["a", "b"]);
    }

    #[test]
    fn ties_break_by_labels() {
        let l = lattice(&[("zeta", 1.0), ("alpha", 1.0), ("mid", 0.5)]);
        let best = n_best(&l, &ShortestPathOptions::new(2)).unwrap();
        assert_eq!(ostrings(&best), vec!["mid", "alpha"]);
        let reordered = lattice(&[("alpha", 1.0), ("mid", 0.5), ("zeta", 1.0)]);
        let again = n_best(&reordered, &ShortestPathOptions::new(2)).unwrap();
        assert_eq!(ostrings(&again), vec!["mid", "alpha"]);
    }

    #[test]
    fn unique_drops_duplicate_outputs() {
        let mut l = lattice(&[("x", 1.0), ("y", 2.0)]);
        l.union(&cross_strings("q", "x", W::from(1.5)));
        let plain = n_best(&l, &ShortestPathOptions::new(2)).unwrap();
        assert_eq!(ostrings(&plain), vec!["x", "x"]);
        let unique = n_best(&l, &ShortestPathOptions::new(2).unique(true)).unwrap();
        assert_eq!(ostrings(&unique), vec!["x", "y"]);
    }

    #[test]
    fn negative_weights() {
        let l = lattice(&[("a", 1.0), ("b", -2.0)]);
        let best = n_best(&l, &ShortestPathOptions::new(2)).unwrap();
        assert_eq!(ostrings(&best), vec!["b", "a"]);
        assert_eq!(best[0].weight.value(), -2.0);
    }

    #[test]
    fn fewer_paths_than_requested() {
        let l = lattice(&[("a", 1.0)]);
        let best = n_best(&l, &ShortestPathOptions::new(5)).unwrap();
        assert_eq!(best.len(), 1);
        assert!(n_best(&VectorFst::<W>::new(), &ShortestPathOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn cyclic_input_fails() {
        let star = closure(&accep::<W>("a", W::one()), ClosureType::Star);
        assert!(matches!(
            n_best(&star, &ShortestPathOptions::default()),
            Err(FstError::CyclicAutomaton)
        ));
    }

    #[test]
    fn shortest_path_builds_branches() {
        let l = lattice(&[("ab", 2.0), ("c", 1.0), ("d", 3.0)]);
        let sp = shortest_path(&l, &ShortestPathOptions::new(2)).unwrap();
        let mut it = PathIterator::new(&sp).unwrap();
        let mut got = Vec::new();
        while !it.done() {
            got.push((it.ostring().unwrap(), it.weight().value()));
            it.next();
        }
        got.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(got, vec![("ab".to_string(), 2.0), ("c".to_string(), 1.0)]);
    }
}
