// Structural property bits.
//
// Each property is a pair of bits (P, NOT_P). Having neither set means the
// property is unknown; a computed property sets exactly one of the pair.

use std::ops::{BitAnd, BitOr, Not};

use fstkit_core::{EPSILON, Semiring};

use crate::fst::VectorFst;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Properties(u32);

impl Properties {
    /// Every arc has `ilabel == olabel`.
    pub const ACCEPTOR: Self = Self(1 << 0);
    pub const NOT_ACCEPTOR: Self = Self(1 << 1);
    /// Some arc or final weight is neither `zero` nor `one`.
    pub const WEIGHTED: Self = Self(1 << 2);
    pub const UNWEIGHTED: Self = Self(1 << 3);
    /// Some state lies on a cycle.
    pub const CYCLIC: Self = Self(1 << 4);
    pub const ACYCLIC: Self = Self(1 << 5);
    /// No state has two arcs with the same input label, and no arc has an
    /// epsilon input.
    pub const I_DETERMINISTIC: Self = Self(1 << 6);
    pub const NON_I_DETERMINISTIC: Self = Self(1 << 7);
    /// Some arc is epsilon:epsilon.
    pub const EPSILONS: Self = Self(1 << 8);
    pub const NO_EPSILONS: Self = Self(1 << 9);

    pub const ALL: Self = Self((1 << 10) - 1);

    const PAIRS: [(Self, Self); 5] = [
        (Self::ACCEPTOR, Self::NOT_ACCEPTOR),
        (Self::WEIGHTED, Self::UNWEIGHTED),
        (Self::CYCLIC, Self::ACYCLIC),
        (Self::I_DETERMINISTIC, Self::NON_I_DETERMINISTIC),
        (Self::EPSILONS, Self::NO_EPSILONS),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Both bits of every pair touched by `self`.
    pub fn pair_mask(self) -> Self {
        let mut mask = Self::empty();
        for (yes, no) in Self::PAIRS {
            if self.intersects(yes | no) {
                mask = mask | yes | no;
            }
        }
        mask
    }

    /// True if every pair touched by `mask` is known.
    pub fn knows(self, mask: Self) -> bool {
        Self::PAIRS.iter().all(|&(yes, no)| {
            !mask.intersects(yes | no) || self.intersects(yes | no)
        })
    }

    /// Set `on` and clear its partner bits.
    pub(crate) fn set(self, on: Self) -> Self {
        let mut out = self;
        for (yes, no) in Self::PAIRS {
            if on.intersects(yes) {
                out = (out & !no) | yes;
            }
            if on.intersects(no) {
                out = (out & !yes) | no;
            }
        }
        out
    }

    /// Forget both bits of every pair touched by `mask`.
    pub(crate) fn forget(self, mask: Self) -> Self {
        self & !mask.pair_mask()
    }
}

impl BitOr for Properties {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for Properties {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Properties {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

/// Compute every property from scratch.
pub fn compute_properties<W: Semiring>(fst: &VectorFst<W>) -> Properties {
    let mut acceptor = true;
    let mut weighted = false;
    let mut deterministic = true;
    let mut epsilons = false;

    let mut seen: Vec<fstkit_core::Label> = Vec::new();
    for s in fst.states() {
        let fw = fst.final_weight(s);
        if !fw.is_zero() && !fw.is_one() {
            weighted = true;
        }
        seen.clear();
        for arc in fst.arcs(s) {
            if arc.ilabel != arc.olabel {
                acceptor = false;
            }
            if !arc.weight.is_one() {
                weighted = true;
            }
            if arc.ilabel == EPSILON && arc.olabel == EPSILON {
                epsilons = true;
            }
            if arc.ilabel == EPSILON {
                deterministic = false;
            }
            seen.push(arc.ilabel);
        }
        if deterministic {
            seen.sort_unstable();
            if seen.windows(2).any(|w| w[0] == w[1]) {
                deterministic = false;
            }
        }
    }

    let pick = |flag: bool, yes: Properties, no: Properties| if flag { yes } else { no };
    pick(acceptor, Properties::ACCEPTOR, Properties::NOT_ACCEPTOR)
        | pick(weighted, Properties::WEIGHTED, Properties::UNWEIGHTED)
        | pick(
            crate::connect::has_cycle(fst),
            Properties::CYCLIC,
            Properties::ACYCLIC,
        )
        | pick(
            deterministic,
            Properties::I_DETERMINISTIC,
            Properties::NON_I_DETERMINISTIC,
        )
        | pick(epsilons, Properties::EPSILONS, Properties::NO_EPSILONS)
}
