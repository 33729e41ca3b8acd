// End-to-end checks of construction, rational operations and the
// algorithms built on them, driven through the public API only.

use fstkit_fst::{
    ClosureType, FstError, PathIterator, ProjectType, Semiring, ShortestPathOptions,
    TropicalWeight, VectorFst, accep, closure, closure_range, compose, concat, cross,
    cross_strings, determinize, difference, invert, n_best, optimize, project, reverse,
    string_map, union, union_all,
};

type W = TropicalWeight;

fn sorted_outputs(fst: &VectorFst<W>) -> Vec<String> {
    let mut out = PathIterator::new(fst).unwrap().ostrings().unwrap();
    out.sort();
    out
}

fn apply(input: &str, rule: &VectorFst<W>) -> Vec<String> {
    let mut lattice = compose(&accep(input, W::one()), rule);
    lattice.optimize();
    sorted_outputs(&lattice)
}

#[test]
fn accep_optimize_and_string() {
    let f = accep::<W>("Godspeed", W::from(2.0));
    let mut d = determinize(&f);
    d.optimize();
    assert_eq!(d.string().unwrap(), "Godspeed");
    let mut twice = d.clone();
    twice.concat(&d);
    assert_eq!(twice.string().unwrap(), "GodspeedGodspeed");
}

#[test]
fn repetition_counts() {
    let f = accep::<W>("ab", W::one());
    let mut f4 = f.clone();
    f4.repeat(4);
    f4.optimize();
    assert_eq!(f4.string().unwrap(), "abababab");

    let range = optimize(&closure_range(&f, 1, Some(3)));
    assert_eq!(sorted_outputs(&range), vec!["ab", "abab", "ababab"]);

    let at_least_two = closure_range(&f, 2, None);
    let probe = |s: &str| !compose(&accep(s, W::one()), &at_least_two).is_empty();
    assert!(!probe("ab"));
    assert!(probe("abab"));
    assert!(probe("ababababab"));
}

#[test]
fn closures() {
    let f = accep::<W>("x", W::one());
    let accepts = |fst: &VectorFst<W>, s: &str| !compose(&accep(s, W::one()), fst).is_empty();
    let star = closure(&f, ClosureType::Star);
    let plus = closure(&f, ClosureType::Plus);
    let ques = closure(&f, ClosureType::Ques);
    assert!(accepts(&star, "") && accepts(&star, "xxx"));
    assert!(!accepts(&plus, "") && accepts(&plus, "xx"));
    assert!(accepts(&ques, "") && accepts(&ques, "x") && !accepts(&ques, "xx"));
}

#[test]
fn union_of_several() {
    let parts = [accep::<W>("a", W::one()), accep("bc", W::one()), accep("d", W::one())];
    let u = union_all(parts.iter());
    assert_eq!(sorted_outputs(&u), vec!["a", "bc", "d"]);
}

#[test]
fn composition_chains_relations() {
    let ad = cross_strings::<W>("a", "d", W::one());
    let bf_star = closure(&cross_strings("b", "f", W::one()), ClosureType::Star);
    let ae = cross_strings::<W>("a", "e", W::one());
    let mut t1 = union(&concat(&ad, &bf_star), &ae);
    t1.rm_epsilon();

    let di = cross_strings::<W>("d", "i", W::one());
    let fj = cross_strings::<W>("f", "j", W::one());
    let ek = cross_strings::<W>("e", "k", W::one());
    let fl_star = closure(&cross_strings("f", "l", W::one()), ClosureType::Star);
    let mut t2 = concat(&union(&concat(&di, &fj), &ek), &fl_star);
    t2.rm_epsilon();

    let mut t3 = compose(&t1, &t2);
    t3.rm_epsilon();
    assert!(t3.verify());
    assert_eq!(apply("a", &t3), vec!["k"]);
    assert_eq!(apply("ab", &t3), vec!["ij"]);
    assert_eq!(apply("abbb", &t3), vec!["ijll"]);
    assert!(apply("b", &t3).is_empty());
}

#[test]
fn difference_of_languages() {
    let f1 = accep::<W>("Godspeed", W::one());
    let f2 = union(&f1, &accep("You!", W::one()));
    let f3 = difference(&f2, &f1).unwrap();
    assert_eq!(optimize(&f3).string().unwrap(), "You!");
    assert_eq!(
        difference(&accep("a", W::from(1.0)), &f1).unwrap_err(),
        FstError::UnsupportedForWeighted
    );
}

#[test]
fn cross_product_of_acceptors() {
    let a1 = union(&accep::<W>("a", W::one()), &accep("bc", W::one()));
    let a2 = union(&accep::<W>("de", W::one()), &accep("f", W::one()));
    let a3 = cross(&a1, &a2).unwrap();
    let mut pairs = Vec::new();
    let mut it = PathIterator::new(&a3).unwrap();
    while !it.done() {
        pairs.push((it.istring().unwrap(), it.ostring().unwrap()));
        it.next();
    }
    pairs.sort();
    let expected: Vec<(String, String)> = [("a", "de"), ("a", "f"), ("bc", "de"), ("bc", "f")]
        .iter()
        .map(|(i, o)| (i.to_string(), o.to_string()))
        .collect();
    assert_eq!(pairs, expected);
}

#[test]
fn projection_inversion_reversal() {
    let mut t = union(
        &cross_strings::<W>("ac", "b", W::one()),
        &cross_strings("df", "e", W::one()),
    );
    t.rm_epsilon();
    let ip = project(&t, ProjectType::Input);
    let op = project(&t, ProjectType::Output);
    assert_eq!(sorted_outputs(&ip), vec!["ac", "df"]);
    assert_eq!(sorted_outputs(&op), vec!["b", "e"]);

    let inv = invert(&t);
    assert_eq!(sorted_outputs(&inv), vec!["ac", "df"]);
    assert_eq!(invert(&inv), t);

    let a = union(&accep::<W>("de", W::one()), &accep("abc", W::one()));
    assert_eq!(sorted_outputs(&reverse(&a)), vec!["cba", "ed"]);
}

#[test]
fn string_map_lookup() {
    let states = string_map::<W, _>(vec![("AL", "Alabama"), ("AK", "Alaska"), ("AZ", "Arizona")]);
    assert_eq!(apply("AL", &states), vec!["Alabama"]);
    assert_eq!(apply("AZ", &states), vec!["Arizona"]);
    assert!(apply("CA", &states).is_empty());
}

#[test]
fn n_best_over_a_lattice() {
    let lattice = union_all(
        [
            accep::<W>("three", W::from(3.0)),
            accep("one", W::from(1.0)),
            accep("two", W::from(2.0)),
        ]
        .iter(),
    );
    let best = n_best(&lattice, &ShortestPathOptions::new(2)).unwrap();
    let strings: Vec<String> = best.iter().map(|p| p.ostring().unwrap()).collect();
    assert_eq!(strings, vec!["one", "two"]);
    assert!(best[0].weight.approx_eq(&W::from(1.0), 1e-6));
}
