// Internal marker labels and the boundary/alphabet acceptors that rules are
// written against.
//
// Markers live above the boundary labels in the reserved range, so they can
// never collide with text.

use fstkit_core::{BOS, EOS, EPSILON, Label, RESERVED_LABEL_BASE, Semiring, char_label};
use fstkit_fst::{VectorFst, accep_labels};

pub use fstkit_fst::sigma_star_labels;

/// `<1`: a rewrite site whose left context was satisfied.
pub const LEFT_MARKER: Label = RESERVED_LABEL_BASE + 16;

/// `<2`: a potential site that was left alone.
pub const LEFT_SKIP_MARKER: Label = RESERVED_LABEL_BASE + 17;

/// `>`: the start of a right-context occurrence.
pub const RIGHT_MARKER: Label = RESERVED_LABEL_BASE + 18;

pub fn is_marker(label: Label) -> bool {
    matches!(label, LEFT_MARKER | LEFT_SKIP_MARKER | RIGHT_MARKER)
}

/// Display name of a boundary or marker label.
pub fn marker_name(label: Label) -> Option<&'static str> {
    match label {
        BOS => Some("[BOS]"),
        EOS => Some("[EOS]"),
        LEFT_MARKER => Some("<1"),
        LEFT_SKIP_MARKER => Some("<2"),
        RIGHT_MARKER => Some(">"),
        _ => None,
    }
}

/// Acceptor for the beginning-of-string boundary, for use in a left context.
pub fn bos<W: Semiring>() -> VectorFst<W> {
    accep_labels(&[BOS], W::one())
}

/// Acceptor for the end-of-string boundary, for use in a right context.
pub fn eos<W: Semiring>() -> VectorFst<W> {
    accep_labels(&[EOS], W::one())
}

/// Σ* over the characters of `alphabet`.
pub fn sigma_star<W: Semiring>(alphabet: &str) -> VectorFst<W> {
    let mut labels: Vec<Label> = alphabet.chars().map(char_label).collect();
    labels.sort_unstable();
    labels.dedup();
    sigma_star_labels(&labels)
}

/// Sorted, deduplicated non-epsilon input labels of `fst`.
pub fn alphabet<W: Semiring>(fst: &VectorFst<W>) -> Vec<Label> {
    let mut labels: Vec<Label> = fst
        .states()
        .flat_map(|s| fst.arcs(s).map(|a| a.ilabel))
        .filter(|&l| l != EPSILON)
        .collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}
