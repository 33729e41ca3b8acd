// Compilation of context-dependent rewrite rules into transducers.
//
// A rule τ / λ __ ρ is compiled as a cascade over the input wrapped in
// [BOS] ... [EOS]:
//
//   r        inserts `>` before every occurrence of ρ between the boundaries
//   f        inserts `<1` or `<2` before every occurrence of φ followed by `>`,
//            where φ is the input side of τ
//   replace  applies τ between `<1` and `>` and deletes stray `>`
//   l1       admits `<1` only where λ ends
//   l2       admits `<2` only where λ does not end (obligatory rules)
//
// Left-to-right rules test λ on the output of `replace`; simultaneous rules
// test it on the input, before `replace`. Right-to-left rules are the
// reversal of a left-to-right rule built from the reversed pieces.
//
// r and f are built backwards: a complete DFA for Σ*·rev(β) gets a marker
// inserted after each accepting prefix, and the machine is then reversed.

use fstkit_core::{BOS, EOS, EPSILON, FstError, Label, Semiring};
use fstkit_fst::{
    Arc, ProjectType, VectorFst, accep_labels, compose, concat, determinize, minimize, project,
    reverse,
};
use tracing::debug;

use crate::markers::{
    LEFT_MARKER, LEFT_SKIP_MARKER, RIGHT_MARKER, alphabet, is_marker, sigma_star_labels,
};

/// Order in which rewrite sites are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Direction {
    /// Sites are chosen left to right; the left context is tested on the
    /// already rewritten output.
    #[default]
    LeftToRight,
    /// Mirror image of `LeftToRight`.
    RightToLeft,
    /// Both contexts are tested on the input.
    Simultaneous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Mode {
    /// Every site in context must be rewritten.
    #[default]
    Obligatory,
    /// Each site may be rewritten or left alone.
    Optional,
}

/// Options for [`cdrewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RuleOptions {
    pub direction: Direction,
    pub mode: Mode,
}

impl RuleOptions {
    pub fn new(direction: Direction, mode: Mode) -> Self {
        RuleOptions { direction, mode }
    }
}

/// The four common rule flavours as a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum RewriteMode {
    #[default]
    ObligatoryLeftToRight,
    ObligatoryRightToLeft,
    Simultaneous,
    /// Optional, left to right.
    Optional,
}

impl From<RewriteMode> for RuleOptions {
    fn from(mode: RewriteMode) -> Self {
        match mode {
            RewriteMode::ObligatoryLeftToRight => {
                RuleOptions::new(Direction::LeftToRight, Mode::Obligatory)
            }
            RewriteMode::ObligatoryRightToLeft => {
                RuleOptions::new(Direction::RightToLeft, Mode::Obligatory)
            }
            RewriteMode::Simultaneous => {
                RuleOptions::new(Direction::Simultaneous, Mode::Obligatory)
            }
            RewriteMode::Optional => RuleOptions::new(Direction::LeftToRight, Mode::Optional),
        }
    }
}

/// Compile the rule "rewrite τ in the context λ __ ρ" into a transducer
/// over the alphabet of `sigma_star`.
///
/// `lambda`, `rho` and `sigma_star` must be acceptors; their weights are
/// ignored. `lambda` may begin with [`bos`](crate::markers::bos) and `rho`
/// may end with [`eos`](crate::markers::eos) to anchor a context at a
/// string edge. Weights of `tau` are carried into the rule. The result is
/// optimized. Inputs containing labels outside the alphabet have no output.
pub fn cdrewrite<W: Semiring>(
    tau: &VectorFst<W>,
    lambda: &VectorFst<W>,
    rho: &VectorFst<W>,
    sigma_star: &VectorFst<W>,
    opts: &RuleOptions,
) -> Result<VectorFst<W>, FstError> {
    for acceptor in [lambda, rho, sigma_star] {
        if !acceptor.is_acceptor() {
            return Err(FstError::NotAnAcceptor);
        }
    }
    for piece in [tau, lambda, rho] {
        if accepts_nothing(piece) {
            return Err(FstError::EmptyAutomaton);
        }
    }

    let sigma: Vec<Label> = alphabet(sigma_star)
        .into_iter()
        .filter(|&l| l != BOS && l != EOS && !is_marker(l))
        .collect();
    let compiler = RuleCompiler::new(sigma, opts.mode);
    let lambda = unweighted(lambda);
    let rho = unweighted(rho);

    let core = match opts.direction {
        Direction::LeftToRight => compiler.left_to_right(tau, &lambda, &rho)?,
        Direction::RightToLeft => reverse(&compiler.left_to_right(
            &reverse(tau),
            &reverse(&rho),
            &reverse(&lambda),
        )?),
        Direction::Simultaneous => compiler.simultaneous(tau, &lambda, &rho)?,
    };

    let insert = compiler.boundary_inserter()?;
    let mut delete = insert.clone();
    delete.invert();
    let mut rule = compose(&compose(&insert, &core), &delete);
    rule.optimize();
    debug!(
        direction = ?opts.direction,
        mode = ?opts.mode,
        states = rule.num_states(),
        arcs = rule.total_arcs(),
        "compiled rewrite rule"
    );
    Ok(rule)
}

fn accepts_nothing<W: Semiring>(fst: &VectorFst<W>) -> bool {
    let mut trimmed = fst.clone();
    trimmed.connect();
    trimmed.is_empty()
}

fn unweighted<W: Semiring>(fst: &VectorFst<W>) -> VectorFst<W> {
    let mut out = fst.clone();
    out.rm_weight();
    out
}

/// Copy of `fst` whose start state has no incoming arcs.
fn detached_start<W: Semiring>(fst: &VectorFst<W>) -> Result<VectorFst<W>, FstError> {
    let start = fst.start();
    let reentered = fst
        .states()
        .any(|s| fst.arcs(s).any(|a| a.nextstate == start));
    let mut out = fst.clone();
    if !reentered {
        return Ok(out);
    }
    let fresh = out.add_state();
    for arc in fst.arcs(start) {
        out.add_arc(fresh, *arc)?;
    }
    if fst.is_final(start) {
        out.set_final(fresh, fst.final_weight(start))?;
    }
    out.set_start(fresh)?;
    Ok(out)
}

/// Transducer that copies its input and inserts every marker in `markers`
/// (as alternatives) after each prefix accepted by `dfa`. `dfa` must be
/// deterministic and complete over the labels it will read.
fn insert_markers<W: Semiring>(
    dfa: &VectorFst<W>,
    markers: &[Label],
) -> Result<VectorFst<W>, FstError> {
    let mut out = VectorFst::new();
    if dfa.is_empty() {
        return Ok(out);
    }
    out.add_states(dfa.num_states());
    out.set_start(dfa.start())?;
    for s in dfa.states() {
        let from = if dfa.is_final(s) {
            let twin = out.add_state();
            for &m in markers {
                out.add_arc(s, Arc::new(EPSILON, m, W::one(), twin))?;
            }
            twin
        } else {
            s
        };
        out.set_final(from, W::one())?;
        for arc in dfa.arcs(s) {
            out.add_arc(from, Arc::new(arc.ilabel, arc.ilabel, W::one(), arc.nextstate))?;
        }
    }
    Ok(out)
}

/// Compose the stages left to right, optimizing after each step.
fn chain<W: Semiring>(stages: Vec<VectorFst<W>>) -> VectorFst<W> {
    let mut stages = stages.into_iter();
    let Some(mut acc) = stages.next() else {
        return VectorFst::new();
    };
    for stage in stages {
        acc = compose(&acc, &stage);
        acc.optimize();
    }
    acc
}

struct RuleCompiler {
    /// Σ: the rule alphabet.
    sigma: Vec<Label>,
    /// Σ plus the string boundaries.
    sigma_bounded: Vec<Label>,
    mode: Mode,
}

impl RuleCompiler {
    fn new(sigma: Vec<Label>, mode: Mode) -> Self {
        let mut sigma_bounded = sigma.clone();
        sigma_bounded.extend([BOS, EOS]);
        sigma_bounded.sort_unstable();
        RuleCompiler {
            sigma,
            sigma_bounded,
            mode,
        }
    }

    fn left_to_right<W: Semiring>(
        &self,
        tau: &VectorFst<W>,
        lambda: &VectorFst<W>,
        rho: &VectorFst<W>,
    ) -> Result<VectorFst<W>, FstError> {
        let r = self.right_marker(rho)?;
        let f = self.site_marker(tau)?;
        let replace = self.replace(tau, true)?;
        let l1 = self.context_filter(
            lambda,
            &[(LEFT_SKIP_MARKER, LEFT_SKIP_MARKER)],
            &[(LEFT_MARKER, EPSILON)],
            &[],
        )?;
        let l2 = match self.mode {
            Mode::Obligatory => {
                self.context_filter(lambda, &[], &[], &[(LEFT_SKIP_MARKER, EPSILON)])?
            }
            Mode::Optional => self.passthrough(&[], &[LEFT_SKIP_MARKER])?,
        };
        Ok(chain(vec![r, f, replace, l1, l2]))
    }

    fn simultaneous<W: Semiring>(
        &self,
        tau: &VectorFst<W>,
        lambda: &VectorFst<W>,
        rho: &VectorFst<W>,
    ) -> Result<VectorFst<W>, FstError> {
        let r = self.right_marker(rho)?;
        let f = self.site_marker(tau)?;
        let l1 = self.context_filter(
            lambda,
            &[
                (LEFT_SKIP_MARKER, LEFT_SKIP_MARKER),
                (RIGHT_MARKER, RIGHT_MARKER),
            ],
            &[(LEFT_MARKER, LEFT_MARKER)],
            &[],
        )?;
        let l2 = match self.mode {
            Mode::Obligatory => self.context_filter(
                lambda,
                &[(LEFT_MARKER, LEFT_MARKER), (RIGHT_MARKER, RIGHT_MARKER)],
                &[],
                &[(LEFT_SKIP_MARKER, EPSILON)],
            )?,
            Mode::Optional => {
                self.passthrough(&[LEFT_MARKER, RIGHT_MARKER], &[LEFT_SKIP_MARKER])?
            }
        };
        let replace = self.replace(tau, false)?;
        Ok(chain(vec![r, f, l1, l2, replace]))
    }

    /// Complete DFA for Σ'* · `pattern` over `labels`.
    fn suffix_dfa<W: Semiring>(&self, labels: &[Label], pattern: &VectorFst<W>) -> VectorFst<W> {
        minimize(&determinize(&concat(&sigma_star_labels(labels), pattern)))
    }

    /// r: `>` before every occurrence of ρ.
    fn right_marker<W: Semiring>(&self, rho: &VectorFst<W>) -> Result<VectorFst<W>, FstError> {
        let dfa = self.suffix_dfa(&self.sigma_bounded, &reverse(rho));
        let r = reverse(&insert_markers(&dfa, &[RIGHT_MARKER])?);
        Ok(compose(&r, &self.boundary_guard()?))
    }

    /// f: `<1` or `<2` before every occurrence of φ followed by `>`. Inside
    /// φ, `>` may occur anywhere but at the very beginning.
    fn site_marker<W: Semiring>(&self, tau: &VectorFst<W>) -> Result<VectorFst<W>, FstError> {
        let mut phi = project(tau, ProjectType::Input);
        phi.rm_weight();
        phi.rm_epsilon();
        let mut phi = detached_start(&phi)?;
        let start = phi.start();
        for s in phi.states() {
            if s != start {
                phi.add_arc(s, Arc::new(RIGHT_MARKER, RIGHT_MARKER, W::one(), s))?;
            }
        }

        let mut labels = self.sigma_bounded.clone();
        labels.push(RIGHT_MARKER);
        let pattern = concat(
            &accep_labels(&[RIGHT_MARKER], W::one()),
            &reverse(&phi),
        );
        let dfa = self.suffix_dfa(&labels, &pattern);
        Ok(reverse(&insert_markers(
            &dfa,
            &[LEFT_MARKER, LEFT_SKIP_MARKER],
        )?))
    }

    /// replace: identity on Σ', `>` deleted, and τ applied from each `<1`
    /// up to a closing `>`. Markers inside a rewritten span are deleted.
    /// With `keep_site`, `<1` and `<2` are copied to the output for the
    /// left-context filters downstream.
    fn replace<W: Semiring>(
        &self,
        tau: &VectorFst<W>,
        keep_site: bool,
    ) -> Result<VectorFst<W>, FstError> {
        let mut marked = detached_start(tau)?;
        let start = marked.start();
        for s in marked.states() {
            if s != start {
                for m in [LEFT_MARKER, LEFT_SKIP_MARKER, RIGHT_MARKER] {
                    marked.add_arc(s, Arc::new(m, EPSILON, W::one(), s))?;
                }
            }
        }

        let mut out = self.passthrough(&[], &[RIGHT_MARKER])?;
        let hub = out.start();
        let site = if keep_site {
            out.add_arc(hub, Arc::new(LEFT_SKIP_MARKER, LEFT_SKIP_MARKER, W::one(), hub))?;
            LEFT_MARKER
        } else {
            EPSILON
        };
        let offset = out.add_states(marked.num_states()).start;
        for s in marked.states() {
            for arc in marked.arcs(s) {
                out.add_arc(
                    s + offset,
                    Arc::new(arc.ilabel, arc.olabel, arc.weight, arc.nextstate + offset),
                )?;
            }
            let fw = marked.final_weight(s);
            if !fw.is_zero() {
                out.add_arc(s + offset, Arc::new(RIGHT_MARKER, EPSILON, fw, hub))?;
            }
        }
        out.add_arc(hub, Arc::new(LEFT_MARKER, site, W::one(), start + offset))?;
        Ok(out)
    }

    /// Filter that tracks whether the text read so far ends with λ.
    /// Every state accepts. `everywhere` pairs loop on every state,
    /// `matched` pairs where λ has just ended, `unmatched` elsewhere; loops
    /// do not advance the context.
    fn context_filter<W: Semiring>(
        &self,
        lambda: &VectorFst<W>,
        everywhere: &[(Label, Label)],
        matched: &[(Label, Label)],
        unmatched: &[(Label, Label)],
    ) -> Result<VectorFst<W>, FstError> {
        let dfa = self.suffix_dfa(&self.sigma_bounded, lambda);
        let mut out = VectorFst::new();
        if dfa.is_empty() {
            return Ok(out);
        }
        out.add_states(dfa.num_states());
        out.set_start(dfa.start())?;
        for s in dfa.states() {
            out.set_final(s, W::one())?;
            for arc in dfa.arcs(s) {
                out.add_arc(s, Arc::new(arc.ilabel, arc.olabel, W::one(), arc.nextstate))?;
            }
            let local = if dfa.is_final(s) { matched } else { unmatched };
            for &(i, o) in everywhere.iter().chain(local) {
                out.add_arc(s, Arc::new(i, o, W::one(), s))?;
            }
        }
        Ok(out)
    }

    /// One state copying Σ' and `keep`, deleting `delete`.
    fn passthrough<W: Semiring>(
        &self,
        keep: &[Label],
        delete: &[Label],
    ) -> Result<VectorFst<W>, FstError> {
        let mut labels = self.sigma_bounded.clone();
        labels.extend_from_slice(keep);
        let mut out = sigma_star_labels(&labels);
        let hub = out.start();
        for &m in delete {
            out.add_arc(hub, Arc::new(m, EPSILON, W::one(), hub))?;
        }
        Ok(out)
    }

    /// Copies `b Σ'* b` for a boundary label `b` and deletes every `>`
    /// outside the two boundaries. No rewrite site can lie outside them.
    fn boundary_guard<W: Semiring>(&self) -> Result<VectorFst<W>, FstError> {
        let mut out = VectorFst::new();
        let states = out.add_states(3);
        let (before, inside, after) = (states.start, states.start + 1, states.start + 2);
        out.set_start(before)?;
        out.set_final(after, W::one())?;
        for s in [before, after] {
            out.add_arc(s, Arc::new(RIGHT_MARKER, EPSILON, W::one(), s))?;
        }
        for b in [BOS, EOS] {
            out.add_arc(before, Arc::new(b, b, W::one(), inside))?;
            out.add_arc(inside, Arc::new(b, b, W::one(), after))?;
        }
        for &l in self.sigma.iter().chain(&[RIGHT_MARKER]) {
            out.add_arc(inside, Arc::new(l, l, W::one(), inside))?;
        }
        Ok(out)
    }

    /// ε:[BOS] Σ* ε:[EOS].
    fn boundary_inserter<W: Semiring>(&self) -> Result<VectorFst<W>, FstError> {
        let mut out = VectorFst::new();
        let states = out.add_states(3);
        let (start, body, end) = (states.start, states.start + 1, states.start + 2);
        out.set_start(start)?;
        out.set_final(end, W::one())?;
        out.add_arc(start, Arc::new(EPSILON, BOS, W::one(), body))?;
        for &l in &self.sigma {
            out.add_arc(body, Arc::new(l, l, W::one(), body))?;
        }
        out.add_arc(body, Arc::new(EPSILON, EOS, W::one(), end))?;
        Ok(out)
    }
}
