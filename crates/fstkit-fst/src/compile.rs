// String compilation: acceptors, string pairs and string maps.

use fstkit_core::{EPSILON, FstError, Label, Semiring, labels_to_string, string_labels};

use crate::fst::{Arc, VectorFst};

/// Linear acceptor over `labels`. The last arc carries `weight`; for the
/// empty sequence the weight becomes the final weight of the single state.
pub fn accep_labels<W: Semiring>(labels: &[Label], weight: W) -> VectorFst<W> {
    let pairs: Vec<(Label, Label)> = labels.iter().map(|&l| (l, l)).collect();
    linear(&pairs, weight)
}

/// Linear acceptor for the characters of `s`.
pub fn accep<W: Semiring>(s: &str, weight: W) -> VectorFst<W> {
    accep_labels(&string_labels(s), weight)
}

/// Linear transducer from `input` to `output`, aligned position by
/// position. The shorter side is padded with epsilons at the end.
pub fn cross_strings<W: Semiring>(input: &str, output: &str, weight: W) -> VectorFst<W> {
    linear(&align(input, output), weight)
}

/// Single-state automaton accepting only the empty string.
pub fn epsilon_machine<W: Semiring>(weight: W) -> VectorFst<W> {
    linear(&[], weight)
}

/// Σ* over `labels`: one state, final, with an identity loop per label.
/// Epsilon is skipped.
pub fn sigma_star_labels<W: Semiring>(labels: &[Label]) -> VectorFst<W> {
    let mut fst = VectorFst::new();
    let s = fst.add_state();
    fst.set_start_unchecked(s);
    fst.put_final(s, W::one());
    for &label in labels.iter().filter(|&&l| l != EPSILON) {
        fst.push_arc(s, Arc::new(label, label, W::one(), s));
    }
    fst
}

fn align(input: &str, output: &str) -> Vec<(Label, Label)> {
    let i = string_labels(input);
    let o = string_labels(output);
    (0..i.len().max(o.len()))
        .map(|k| {
            (
                i.get(k).copied().unwrap_or(EPSILON),
                o.get(k).copied().unwrap_or(EPSILON),
            )
        })
        .collect()
}

fn linear<W: Semiring>(pairs: &[(Label, Label)], weight: W) -> VectorFst<W> {
    let mut fst = VectorFst::new();
    let start = fst.add_state();
    fst.set_start_unchecked(start);
    append_branch(&mut fst, start, pairs, weight);
    fst
}

/// Hang a linear branch for `pairs` off `from`.
fn append_branch<W: Semiring>(
    fst: &mut VectorFst<W>,
    from: fstkit_core::StateId,
    pairs: &[(Label, Label)],
    weight: W,
) {
    let mut prev = from;
    for (k, &(i, o)) in pairs.iter().enumerate() {
        let next = fst.add_state();
        let w = if k + 1 == pairs.len() { weight } else { W::one() };
        fst.push_arc(prev, Arc::new(i, o, w, next));
        prev = next;
    }
    if pairs.is_empty() {
        let fw = fst.final_weight(prev).plus(&weight);
        fst.put_final(prev, fw);
    } else {
        fst.put_final(prev, W::one());
    }
}

/// One entry of a [`string_map`]: an input, an output and a weight.
#[derive(Debug, Clone, PartialEq)]
pub struct StringMapEntry<W> {
    pub input: String,
    pub output: String,
    pub weight: W,
}

impl<W: Semiring> From<&str> for StringMapEntry<W> {
    fn from(s: &str) -> Self {
        StringMapEntry {
            input: s.to_string(),
            output: s.to_string(),
            weight: W::one(),
        }
    }
}

impl<W: Semiring> From<(&str, &str)> for StringMapEntry<W> {
    fn from((input, output): (&str, &str)) -> Self {
        StringMapEntry {
            input: input.to_string(),
            output: output.to_string(),
            weight: W::one(),
        }
    }
}

impl<W: Semiring> From<(&str, &str, W)> for StringMapEntry<W> {
    fn from((input, output, weight): (&str, &str, W)) -> Self {
        StringMapEntry {
            input: input.to_string(),
            output: output.to_string(),
            weight,
        }
    }
}

/// Union of the entries' string pairs, optimized. A bare string maps to
/// itself.
pub fn string_map<W, I>(entries: I) -> VectorFst<W>
where
    W: Semiring,
    I: IntoIterator,
    I::Item: Into<StringMapEntry<W>>,
{
    let mut fst = VectorFst::new();
    let start = fst.add_state();
    fst.set_start_unchecked(start);
    for entry in entries {
        let entry = entry.into();
        append_branch(&mut fst, start, &align(&entry.input, &entry.output), entry.weight);
    }
    fst.optimize();
    fst
}

impl<W: Semiring> VectorFst<W> {
    /// The single path of a linear automaton as (input labels, output
    /// labels, weight). Epsilons are kept.
    pub fn linear_path(&self) -> Result<(Vec<Label>, Vec<Label>, W), FstError> {
        if self.is_empty() {
            return Err(FstError::NotAString);
        }
        let mut ilabels = Vec::new();
        let mut olabels = Vec::new();
        let mut weight = W::one();
        let mut visited = vec![false; self.num_states()];
        let mut s = self.start();
        loop {
            if visited[s] {
                return Err(FstError::NotAString);
            }
            visited[s] = true;
            let mut arcs = self.arcs(s);
            match (arcs.next(), arcs.next(), self.is_final(s)) {
                (None, _, true) => {
                    return Ok((ilabels, olabels, weight.times(&self.final_weight(s))));
                }
                (Some(arc), None, false) => {
                    ilabels.push(arc.ilabel);
                    olabels.push(arc.olabel);
                    weight = weight.times(&arc.weight);
                    s = arc.nextstate;
                }
                _ => return Err(FstError::NotAString),
            }
        }
    }

    /// The string of a linear automaton (output side, epsilons skipped).
    pub fn string(&self) -> Result<String, FstError> {
        let (_, olabels, _) = self.linear_path()?;
        labels_to_string(&olabels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fstkit_core::TropicalWeight;

    type W = TropicalWeight;

    #[test]
    fn accep_puts_weight_on_last_arc() {
        let fst = accep("ab", W::from(2.0));
        assert_eq!(fst.num_states(), 3);
        let weights: Vec<f32> = fst
            .states()
            .flat_map(|s| fst.arcs(s).map(|a| a.weight.value()).collect::<Vec<_>>())
            .collect();
        assert_eq!(weights, vec![0.0, 2.0]);
        assert_eq!(fst.final_weight(2), W::one());
        assert!(fst.is_acceptor());
    }

    #[test]
    fn empty_accep_is_final_start() {
        let fst = accep("", W::from(1.5));
        assert_eq!(fst.num_states(), 1);
        assert_eq!(fst.final_weight(fst.start()).value(), 1.5);
        assert_eq!(fst.string().unwrap(), "");
    }

    #[test]
    fn sigma_star_labels_skips_epsilon() {
        let fst = sigma_star_labels::<W>(&[EPSILON, 'a' as Label, 'b' as Label]);
        assert_eq!(fst.num_states(), 1);
        assert_eq!(fst.num_arcs(0), 2);
        assert!(fst.is_final(0));
        assert!(fst.is_acceptor());
    }

    #[test]
    fn cross_strings_pads_with_epsilon() {
        let fst = cross_strings::<W>("ab", "xyz", W::one());
        let (i, o, _) = fst.linear_path().unwrap();
        assert_eq!(i, vec!['a' as Label, 'b' as Label, EPSILON]);
        assert_eq!(o, string_labels("xyz"));
        assert!(!fst.is_acceptor());
    }

    #[test]
    fn string_of_linear_fst() {
        assert_eq!(accep::<W>("k\u{00e4}si", W::one()).string().unwrap(), "k\u{00e4}si");
        let (_, _, w) = accep("abc", W::from(3.0)).linear_path().unwrap();
        assert_eq!(w.value(), 3.0);
    }

    #[test]
    fn string_rejects_branching() {
        let mut fst = accep::<W>("ab", W::one());
        fst.push_arc(0, Arc::new(99, 99, W::one(), 2));
        assert_eq!(fst.string(), Err(FstError::NotAString));
        assert_eq!(VectorFst::<W>::new().string(), Err(FstError::NotAString));
    }

    #[test]
    fn string_rejects_cycles() {
        let mut fst = accep::<W>("a", W::one());
        fst.put_final(1, W::zero());
        fst.push_arc(1, Arc::new(98, 98, W::one(), 0));
        assert_eq!(fst.string(), Err(FstError::NotAString));
    }

    #[test]
    fn string_map_is_deterministic() {
        let fst = string_map::<W, _>(vec![("AL", "Alabama"), ("AK", "Alaska"), ("AZ", "Arizona")]);
        assert!(fst.verify());
        let start = fst.start();
        assert_eq!(fst.num_arcs(start), 1);
    }

    #[test]
    fn string_map_accepts_bare_strings() {
        let fst = string_map::<W, _>(["deer", "moose"]);
        assert!(fst.is_acceptor());
    }
}
