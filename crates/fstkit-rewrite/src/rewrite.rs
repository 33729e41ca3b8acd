// Applying a compiled rule to an input and reading off the results.

use std::borrow::Cow;

use fstkit_core::{FstError, Semiring};
use fstkit_fst::{
    DeterminizeOptions, PathIterator, ProjectType, ShortestPathOptions, VectorFst, accep,
    compose, determinize_with_options, n_best,
};
use hashbrown::HashSet;

use crate::error::RewriteError;

/// Something a rule can be applied to: text, or an acceptor (possibly a
/// weighted lattice of alternatives).
#[derive(Debug, Clone, Copy)]
pub enum RewriteInput<'a, W: Semiring> {
    Text(&'a str),
    Acceptor(&'a VectorFst<W>),
}

impl<'a, W: Semiring> From<&'a str> for RewriteInput<'a, W> {
    fn from(s: &'a str) -> Self {
        RewriteInput::Text(s)
    }
}

impl<'a, W: Semiring> From<&'a String> for RewriteInput<'a, W> {
    fn from(s: &'a String) -> Self {
        RewriteInput::Text(s)
    }
}

impl<'a, W: Semiring> From<&'a VectorFst<W>> for RewriteInput<'a, W> {
    fn from(fst: &'a VectorFst<W>) -> Self {
        RewriteInput::Acceptor(fst)
    }
}

impl<'a, W: Semiring> RewriteInput<'a, W> {
    pub fn to_acceptor(&self) -> Result<Cow<'a, VectorFst<W>>, FstError> {
        match *self {
            RewriteInput::Text(s) => Ok(Cow::Owned(accep(s, W::one()))),
            RewriteInput::Acceptor(fst) if fst.is_acceptor() => Ok(Cow::Borrowed(fst)),
            RewriteInput::Acceptor(_) => Err(FstError::NotAnAcceptor),
        }
    }
}

/// The output lattice of `rule` on `input`: an optimized acceptor over
/// output strings with path weights.
///
/// Fails with `CompositionFailure` if the rule has no output for the input.
pub fn rewrite_lattice<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
) -> Result<VectorFst<W>, RewriteError> {
    let input = input.into().to_acceptor()?;
    let mut lattice = compose(&input, rule);
    if lattice.is_empty() {
        return Err(RewriteError::CompositionFailure);
    }
    lattice.project(ProjectType::Output);
    lattice.optimize();
    Ok(lattice)
}

fn distinct_outputs<W: Semiring>(lattice: &VectorFst<W>) -> Result<Vec<String>, RewriteError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for s in PathIterator::new(lattice)?.ostrings()? {
        if seen.insert(s.clone()) {
            out.push(s);
        }
    }
    Ok(out)
}

/// Every output string, each once, in path order.
pub fn rewrites<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
) -> Result<Vec<String>, RewriteError> {
    distinct_outputs(&rewrite_lattice(input, rule)?)
}

/// The `n` best distinct outputs, best first. Ties are ordered by the
/// output string.
pub fn top_rewrites<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
    n: usize,
) -> Result<Vec<String>, RewriteError> {
    let lattice = rewrite_lattice(input, rule)?;
    let paths = n_best(&lattice, &ShortestPathOptions::new(n).unique(true))?;
    let outputs = paths
        .iter()
        .map(|p| p.ostring())
        .collect::<Result<Vec<_>, FstError>>()?;
    Ok(outputs)
}

/// The best output. Among equally good outputs the smallest string wins.
pub fn top_rewrite<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
) -> Result<String, RewriteError> {
    top_rewrites(input, rule, 1)?
        .into_iter()
        .next()
        .ok_or(RewriteError::CompositionFailure)
}

/// All outputs whose weight equals the best weight.
pub fn optimal_rewrites<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
) -> Result<Vec<String>, RewriteError> {
    let lattice = rewrite_lattice(input, rule)?;
    let opts = DeterminizeOptions {
        weight_threshold: Some(W::one()),
        ..Default::default()
    };
    let best = determinize_with_options(&lattice, &opts).into_fst();
    distinct_outputs(&best)
}

/// The single best output; `AmbiguousTie` if several outputs share the
/// best weight.
pub fn one_top_rewrite<'a, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    rule: &VectorFst<W>,
) -> Result<String, RewriteError> {
    let mut best = optimal_rewrites(input, rule)?;
    match best.len() {
        0 => Err(RewriteError::CompositionFailure),
        1 => Ok(best.swap_remove(0)),
        count => Err(FstError::AmbiguousTie { count }.into()),
    }
}

/// True if `rule` can map `input` to `output`.
pub fn matches<'a, 'b, W: Semiring>(
    input: impl Into<RewriteInput<'a, W>>,
    output: impl Into<RewriteInput<'b, W>>,
    rule: &VectorFst<W>,
) -> Result<bool, RewriteError> {
    let input = input.into().to_acceptor()?;
    let output = output.into().to_acceptor()?;
    let mapped = compose(&compose(&input, rule), &output);
    Ok(!mapped.is_empty())
}
