// Rational operations: union, concatenation, closure and bounded repetition.
//
// All of these are epsilon constructions; run `optimize` or `rm_epsilon`
// afterwards if a compact result is needed.

use fstkit_core::{Semiring, StateId};

use crate::compile::epsilon_machine;
use crate::fst::{Arc, VectorFst};

/// Closure variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureType {
    /// Zero or more repetitions.
    Star,
    /// One or more repetitions.
    Plus,
    /// Zero or one occurrence.
    Ques,
}

impl<W: Semiring> VectorFst<W> {
    /// Copy `other`'s states after ours. Returns the offset of the copy.
    fn append_copy(&mut self, other: &VectorFst<W>) -> StateId {
        let offset = self.num_states();
        self.add_states(other.num_states());
        for s in other.states() {
            let fw = other.final_weight(s);
            if !fw.is_zero() {
                self.put_final(s + offset, fw);
            }
            self.reserve_arcs(s + offset, other.num_arcs(s));
            for arc in other.arcs(s) {
                let mut arc = *arc;
                arc.nextstate += offset;
                self.push_arc(s + offset, arc);
            }
        }
        offset
    }

    /// In-place union: `self` accepts everything either operand accepts.
    pub fn union(&mut self, other: &VectorFst<W>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        let old_start = self.start();
        let offset = self.append_copy(other);
        let start = self.add_state();
        self.push_arc(start, Arc::epsilon(old_start));
        self.push_arc(start, Arc::epsilon(other.start() + offset));
        self.set_start_unchecked(start);
    }

    /// In-place concatenation: `self` followed by `other`.
    pub fn concat(&mut self, other: &VectorFst<W>) {
        if self.is_empty() {
            return;
        }
        if other.is_empty() {
            *self = VectorFst::new();
            return;
        }
        let left_states = self.num_states();
        let offset = self.append_copy(other);
        let target = other.start() + offset;
        for s in 0..left_states {
            let fw = self.final_weight(s);
            if fw.is_zero() {
                continue;
            }
            self.push_arc(s, Arc::new(0, 0, fw, target));
            self.put_final(s, W::zero());
        }
    }

    /// In-place closure.
    pub fn closure(&mut self, closure_type: ClosureType) {
        if self.is_empty() {
            // ∅* and ∅? accept only the empty string
            if closure_type != ClosureType::Plus {
                *self = epsilon_machine(W::one());
            }
            return;
        }
        let old_start = self.start();
        if closure_type != ClosureType::Ques {
            for s in self.states() {
                let fw = self.final_weight(s);
                if !fw.is_zero() {
                    self.push_arc(s, Arc::new(0, 0, fw, old_start));
                }
            }
        }
        if closure_type != ClosureType::Plus {
            let start = self.add_state();
            self.put_final(start, W::one());
            self.push_arc(start, Arc::epsilon(old_start));
            self.set_start_unchecked(start);
        }
    }

    /// In-place bounded repetition: between `lower` and `upper` copies, or
    /// `lower` or more when `upper` is `None`. An upper bound below `lower`
    /// is raised to `lower`.
    pub fn closure_range(&mut self, lower: usize, upper: Option<usize>) {
        let unit = std::mem::take(self);
        let mut result = epsilon_machine(W::one());
        for _ in 0..lower {
            result.concat(&unit);
        }
        match upper {
            None => {
                let mut star = unit;
                star.closure(ClosureType::Star);
                result.concat(&star);
            }
            Some(upper) => {
                // (x(x(x)?)?)? keeps the optional tail unambiguous
                let mut tail = epsilon_machine(W::one());
                for _ in lower..upper.max(lower) {
                    let mut step = unit.clone();
                    step.concat(&tail);
                    step.closure(ClosureType::Ques);
                    tail = step;
                }
                result.concat(&tail);
            }
        }
        *self = result;
    }

    /// In-place exact repetition.
    pub fn repeat(&mut self, n: usize) {
        self.closure_range(n, Some(n));
    }
}

/// Union of two automata.
pub fn union<W: Semiring>(a: &VectorFst<W>, b: &VectorFst<W>) -> VectorFst<W> {
    let mut out = a.clone();
    out.union(b);
    out
}

/// Union of any number of automata. An empty input gives the empty automaton.
pub fn union_all<'a, W: Semiring>(
    fsts: impl IntoIterator<Item = &'a VectorFst<W>>,
) -> VectorFst<W> {
    let mut out = VectorFst::new();
    let start = out.add_state();
    out.set_start_unchecked(start);
    let mut any = false;
    for fst in fsts {
        if fst.is_empty() {
            continue;
        }
        let offset = out.append_copy(fst);
        out.push_arc(start, Arc::epsilon(fst.start() + offset));
        any = true;
    }
    if !any {
        return VectorFst::new();
    }
    out
}

/// Concatenation of two automata.
pub fn concat<W: Semiring>(a: &VectorFst<W>, b: &VectorFst<W>) -> VectorFst<W> {
    let mut out = a.clone();
    out.concat(b);
    out
}

pub fn closure<W: Semiring>(fst: &VectorFst<W>, closure_type: ClosureType) -> VectorFst<W> {
    let mut out = fst.clone();
    out.closure(closure_type);
    out
}

pub fn closure_range<W: Semiring>(
    fst: &VectorFst<W>,
    lower: usize,
    upper: Option<usize>,
) -> VectorFst<W> {
    let mut out = fst.clone();
    out.closure_range(lower, upper);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::accep;
    use crate::compose::compose;
    use fstkit_core::TropicalWeight;

    type W = TropicalWeight;

    fn accepts(fst: &VectorFst<W>, s: &str) -> bool {
        !compose(&accep(s, W::one()), fst).is_empty()
    }

    fn cost(fst: &VectorFst<W>, s: &str) -> Option<f32> {
        let mut lattice = compose(&accep(s, W::one()), fst);
        lattice.rm_epsilon();
        let d = crate::shortest_distance::shortest_distance(&lattice, true).ok()?;
        d.get(lattice.start()).map(|w| w.value())
    }

    #[test]
    fn union_accepts_both() {
        let u = union(&accep("ab", W::one()), &accep("c", W::one()));
        assert!(accepts(&u, "ab"));
        assert!(accepts(&u, "c"));
        assert!(!accepts(&u, "abc"));
        assert!(u.verify());
    }

    #[test]
    fn union_with_empty() {
        let a = accep::<W>("a", W::one());
        assert_eq!(union(&a, &VectorFst::new()), a);
        assert_eq!(union(&VectorFst::new(), &a), a);
    }

    #[test]
    fn union_all_of_nothing_is_empty() {
        assert!(union_all::<W>(std::iter::empty()).is_empty());
        let parts = [accep("x", W::one()), accep("y", W::one())];
        let u = union_all(parts.iter());
        assert!(accepts(&u, "x") && accepts(&u, "y"));
    }

    #[test]
    fn concat_carries_final_weight() {
        let c = concat(&accep("a", W::from(1.0)), &accep("b", W::from(2.0)));
        assert!(accepts(&c, "ab"));
        assert!(!accepts(&c, "a"));
        assert_eq!(cost(&c, "ab"), Some(3.0));
    }

    #[test]
    fn concat_with_empty_is_empty() {
        let c = concat(&accep::<W>("a", W::one()), &VectorFst::new());
        assert!(c.is_empty());
    }

    #[test]
    fn star_plus_and_ques() {
        let a = accep::<W>("ab", W::one());
        let star = closure(&a, ClosureType::Star);
        assert!(accepts(&star, ""));
        assert!(accepts(&star, "abab"));
        let plus = closure(&a, ClosureType::Plus);
        assert!(!accepts(&plus, ""));
        assert!(accepts(&plus, "ababab"));
        let ques = closure(&a, ClosureType::Ques);
        assert!(accepts(&ques, ""));
        assert!(accepts(&ques, "ab"));
        assert!(!accepts(&ques, "abab"));
    }

    #[test]
    fn closure_of_empty() {
        let empty = VectorFst::<W>::new();
        assert!(accepts(&closure(&empty, ClosureType::Star), ""));
        assert!(closure(&empty, ClosureType::Plus).is_empty());
    }

    #[test]
    fn bounded_repetition() {
        let a = accep::<W>("a", W::one());
        let r = closure_range(&a, 2, Some(4));
        assert!(!accepts(&r, "a"));
        assert!(accepts(&r, "aa"));
        assert!(accepts(&r, "aaaa"));
        assert!(!accepts(&r, "aaaaa"));
        let open = closure_range(&a, 3, None);
        assert!(!accepts(&open, "aa"));
        assert!(accepts(&open, "aaaaaaa"));
    }

    #[test]
    fn repeat_is_exact() {
        let mut a = accep::<W>("ab", W::one());
        a.repeat(2);
        assert!(accepts(&a, "abab"));
        assert!(!accepts(&a, "ab"));
    }
}
