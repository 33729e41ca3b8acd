//! Property-based tests for the algebra of weighted string sets.
//!
//! Random small lexicons (strings over {a, b, c} with integer weights) are
//! compiled into acceptors and pushed through the algorithms; the results
//! are compared with the same operations computed directly on the sets.

use std::collections::{BTreeMap, BTreeSet};

use fstkit_fst::{
    PathIterator, Semiring, ShortestPathOptions, TropicalWeight, VectorFst, accep, determinize,
    difference, invert, n_best, optimize, union_all,
};
use proptest::prelude::*;

type W = TropicalWeight;

fn arb_lexicon() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::vec(
        (prop::string::string_regex("[abc]{0,4}").unwrap(), 0u8..8),
        1..6,
    )
}

fn compile(lexicon: &[(String, u8)]) -> VectorFst<W> {
    let parts: Vec<VectorFst<W>> = lexicon
        .iter()
        .map(|(s, w)| accep(s, W::from(*w as f32)))
        .collect();
    union_all(parts.iter())
}

fn best_weights(lexicon: &[(String, u8)]) -> BTreeMap<String, f32> {
    let mut best = BTreeMap::new();
    for (s, w) in lexicon {
        let e = best.entry(s.clone()).or_insert(f32::INFINITY);
        *e = e.min(*w as f32);
    }
    best
}

fn paths(fst: &VectorFst<W>) -> Vec<(String, f32)> {
    let mut it = PathIterator::new(fst).unwrap();
    let mut out = Vec::new();
    while !it.done() {
        out.push((it.ostring().unwrap(), it.weight().value()));
        it.next();
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn determinize_keeps_one_best_path_per_string(lexicon in arb_lexicon()) {
        let d = determinize(&compile(&lexicon));
        let got: BTreeMap<String, f32> = paths(&d).into_iter().collect();
        prop_assert_eq!(paths(&d).len(), got.len(), "one path per string");
        prop_assert_eq!(got, best_weights(&lexicon));
    }

    #[test]
    fn optimize_is_idempotent(lexicon in arb_lexicon()) {
        let once = optimize(&compile(&lexicon));
        let twice = optimize(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.verify());
    }

    #[test]
    fn optimize_preserves_best_weights(lexicon in arb_lexicon()) {
        let o = optimize(&compile(&lexicon));
        let mut got: BTreeMap<String, f32> = BTreeMap::new();
        for (s, w) in paths(&o) {
            let e = got.entry(s).or_insert(f32::INFINITY);
            *e = e.min(w);
        }
        prop_assert_eq!(got, best_weights(&lexicon));
    }

    #[test]
    fn difference_matches_set_difference(a in arb_lexicon(), b in arb_lexicon()) {
        let unweighted = |lex: &[(String, u8)]| -> Vec<(String, u8)> {
            lex.iter().map(|(s, _)| (s.clone(), 0)).collect()
        };
        let fa = compile(&unweighted(&a));
        let fb = compile(&unweighted(&b));
        let d = difference(&fa, &fb).unwrap();
        let got: BTreeSet<String> = paths(&d).into_iter().map(|p| p.0).collect();
        let sa: BTreeSet<String> = a.iter().map(|p| p.0.clone()).collect();
        let sb: BTreeSet<String> = b.iter().map(|p| p.0.clone()).collect();
        let expected: BTreeSet<String> = sa.difference(&sb).cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn double_inversion_is_identity(lexicon in arb_lexicon()) {
        let fst = compile(&lexicon);
        prop_assert_eq!(invert(&invert(&fst)), fst);
    }

    #[test]
    fn single_best_has_minimal_weight(lexicon in arb_lexicon()) {
        let best = n_best(&compile(&lexicon), &ShortestPathOptions::default()).unwrap();
        let minimum = lexicon.iter().map(|p| p.1).min().unwrap_or(0) as f32;
        prop_assert_eq!(best.len(), 1);
        prop_assert!(best[0].weight.approx_eq(&W::from(minimum), 1e-6));
        // ties resolve to the smallest string
        let smallest = lexicon
            .iter()
            .filter(|p| p.1 as f32 == minimum)
            .map(|p| p.0.clone())
            .min()
            .unwrap_or_default();
        prop_assert_eq!(best[0].ostring().unwrap(), smallest);
    }
}
