// Text (AT&T) and Graphviz output.

use std::fmt::Write as _;

use fstkit_core::{FstError, Label, Semiring, StateId, SymbolTable};

use crate::fst::VectorFst;

fn render_label(label: Label, table: Option<&SymbolTable>) -> Result<String, FstError> {
    match table {
        Some(t) => t
            .find_symbol(label)
            .map(str::to_string)
            .ok_or(FstError::UnrepresentableLabel(label)),
        None => Ok(label.to_string()),
    }
}

/// Start state first, then every other state in index order.
fn state_order<W: Semiring>(fst: &VectorFst<W>) -> Vec<StateId> {
    if fst.is_empty() {
        return Vec::new();
    }
    let start = fst.start();
    std::iter::once(start)
        .chain(fst.states().filter(|&s| s != start))
        .collect()
}

/// AT&T text form: one `src dst ilabel olabel [weight]` line per arc and
/// one `state [weight]` line per final state, tab separated. Weights equal
/// to `one` are omitted. Labels are numeric unless a symbol table is
/// given, in which case every label must be in it.
pub fn to_text<W: Semiring>(
    fst: &VectorFst<W>,
    isymbols: Option<&SymbolTable>,
    osymbols: Option<&SymbolTable>,
) -> Result<String, FstError> {
    let mut out = String::new();
    for s in state_order(fst) {
        for arc in fst.arcs(s) {
            let _ = write!(
                out,
                "{}\t{}\t{}\t{}",
                s,
                arc.nextstate,
                render_label(arc.ilabel, isymbols)?,
                render_label(arc.olabel, osymbols)?
            );
            if !arc.weight.is_one() {
                let _ = write!(out, "\t{}", arc.weight);
            }
            out.push('\n');
        }
        let fw = fst.final_weight(s);
        if fw.is_zero() {
            continue;
        }
        if fw.is_one() {
            let _ = writeln!(out, "{s}");
        } else {
            let _ = writeln!(out, "{s}\t{fw}");
        }
    }
    Ok(out)
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Graphviz description. Final states are double circles, the start state
/// is bold, arcs are labeled `i:o/w` (`i/w` for acceptors, weight omitted
/// when `one`).
pub fn to_dot<W: Semiring>(
    fst: &VectorFst<W>,
    isymbols: Option<&SymbolTable>,
    osymbols: Option<&SymbolTable>,
) -> Result<String, FstError> {
    let acceptor = fst.is_acceptor();
    let mut out = String::from("digraph FST {\nrankdir = LR;\n");
    for s in state_order(fst) {
        let fw = fst.final_weight(s);
        let label = if fw.is_zero() || fw.is_one() {
            s.to_string()
        } else {
            format!("{s}/{fw}")
        };
        let shape = if fw.is_zero() { "circle" } else { "doublecircle" };
        let style = if s == fst.start() { "bold" } else { "solid" };
        let _ = writeln!(
            out,
            "{s} [label = \"{label}\", shape = {shape}, style = {style}];"
        );
    }
    for s in state_order(fst) {
        for arc in fst.arcs(s) {
            let mut label = render_label(arc.ilabel, isymbols)?;
            if !acceptor {
                label.push(':');
                label.push_str(&render_label(arc.olabel, osymbols)?);
            }
            if !arc.weight.is_one() {
                let _ = write!(label, "/{}", arc.weight);
            }
            let _ = writeln!(
                out,
                "{} -> {} [label = \"{}\"];",
                s,
                arc.nextstate,
                escape(&label)
            );
        }
    }
    out.push_str("}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{accep, cross_strings};
    use crate::fst::Arc;
    use fstkit_core::TropicalWeight;

    type W = TropicalWeight;

    #[test]
    fn att_text_numeric() {
        let fst = cross_strings::<W>("ab", "c", W::from(2.0));
        let text = to_text(&fst, None, None).unwrap();
        assert_eq!(text, "0\t1\t97\t99\n1\t2\t98\t0\t2\n2\n");
    }

    #[test]
    fn start_state_comes_first() {
        let mut fst = VectorFst::<W>::new();
        fst.add_states(2);
        fst.set_start(1).unwrap();
        fst.add_arc(1, Arc::new(1, 1, W::one(), 0)).unwrap();
        fst.set_final(0, W::from(0.5)).unwrap();
        let text = to_text(&fst, None, None).unwrap();
        assert_eq!(text, "1\t0\t1\t1\n0\t0.5\n");
    }

    #[test]
    fn att_text_with_symbols() {
        let mut syms = SymbolTable::from_chars("ab".chars());
        syms.add_symbol_with_label("<eps>", 0);
        let fst = cross_strings::<W>("ab", "a", W::one());
        let text = to_text(&fst, Some(&syms), Some(&syms)).unwrap();
        assert_eq!(text, "0\t1\ta\ta\n1\t2\tb\t<eps>\n2\n");
    }

    #[test]
    fn missing_symbol_is_an_error() {
        let syms = SymbolTable::from_chars("a".chars());
        let fst = accep::<W>("z", W::one());
        assert_eq!(
            to_text(&fst, Some(&syms), None),
            Err(FstError::UnrepresentableLabel('z' as Label))
        );
    }

    #[test]
    fn dot_output() {
        let syms = SymbolTable::from_chars("a\"".chars());
        let fst = accep::<W>("a\"", W::from(1.0));
        let dot = to_dot(&fst, Some(&syms), Some(&syms)).unwrap();
        assert!(dot.starts_with("digraph FST {"));
        assert!(dot.contains("0 [label = \"0\", shape = circle, style = bold];"));
        assert!(dot.contains("2 [label = \"2\", shape = doublecircle, style = solid];"));
        assert!(dot.contains("0 -> 1 [label = \"a\"];"));
        assert!(dot.contains("1 -> 2 [label = \"\\\"/1\"];"));
        assert!(dot.ends_with("}\n"));
    }
}
