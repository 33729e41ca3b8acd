// Small combinators for writing rules and grammars.

use fstkit_core::{EPSILON, FstError, Semiring};
use fstkit_fst::{
    ClosureType, ProjectType, VectorFst, closure, compose, concat, difference, project, union,
};
use tracing::debug;

/// Transducer from the empty string to each string of `fst` (its output
/// side).
pub fn insert<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = project(fst, ProjectType::Output);
    out.relabel(|_, o| (EPSILON, o));
    out
}

/// Transducer from each string of `fst` (its input side) to the empty
/// string.
pub fn delete<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = project(fst, ProjectType::Input);
    out.relabel(|i, _| (i, EPSILON));
    out
}

/// `fst` with every path weight multiplied by `weight`.
pub fn add_weight<W: Semiring>(fst: &VectorFst<W>, weight: W) -> VectorFst<W> {
    let mut out = fst.clone();
    out.times_final(weight);
    out
}

/// One or more copies of `fst` separated by `separator`.
pub fn join<W: Semiring>(fst: &VectorFst<W>, separator: &VectorFst<W>) -> VectorFst<W> {
    concat(fst, &closure(&concat(separator, fst), ClosureType::Star))
}

/// `mu`, plus `nu` restricted to inputs outside the domain of `mu`: where
/// both apply, `mu` wins. `sigma_star` bounds the complement and must be
/// an unweighted acceptor.
pub fn priority_union<W: Semiring>(
    mu: &VectorFst<W>,
    nu: &VectorFst<W>,
    sigma_star: &VectorFst<W>,
) -> Result<VectorFst<W>, FstError> {
    let mut domain = project(mu, ProjectType::Input);
    domain.rm_weight();
    let elsewhere = difference(sigma_star, &domain)?;
    Ok(union(mu, &compose(&elsewhere, nu)))
}

/// The rules applied in sequence, composed into one optimized transducer.
pub fn cascade<'a, W: Semiring>(
    rules: impl IntoIterator<Item = &'a VectorFst<W>>,
) -> Result<VectorFst<W>, FstError> {
    let mut rules = rules.into_iter();
    let mut acc = rules.next().ok_or(FstError::EmptyAutomaton)?.clone();
    let mut stages = 1;
    for rule in rules {
        acc = compose(&acc, rule);
        acc.optimize();
        stages += 1;
    }
    if stages == 1 {
        acc.optimize();
    }
    debug!(stages, states = acc.num_states(), "cascade composed");
    Ok(acc)
}
