mod common;

use std::sync::OnceLock;

use common::{disagreements, formula_text, traces};
use gabbay_rs::convert::convert;
use gabbay_rs::formula::Formula;
use gabbay_rs::lemmas::{lemma_a1, lemma_a2_and, lemma_a2_or, merge_siblings};
use gabbay_rs::matrix::PureMatrix;
use gabbay_rs::rules::normalize_formula;
use gabbay_rs::separator::{Separator, SeparatorConfig};
use gabbay_rs::simplify::simplify_formula;
use proptest::prelude::*;

/// One shape per elimination case, then a few needing the lemmas or conversion.
const FORMULAS: &[&str] = &[
    "(a & (b U c)) S q",
    "(a & !(b U c)) S q",
    "a S (q | (b U c))",
    "a S (q | !(b U c))",
    "(a & (b U c)) S (q | (b U c))",
    "(a & !(b U c)) S (q | (b U c))",
    "(a & (b U c)) S (q | !(b U c))",
    "(a & !(b U c)) S (q | !(b U c))",
    "(a & (b S c)) U q",
    "a U (q | !(b S c))",
    "(a | (b U c)) S q",
    "a S (q & (b U c))",
    "(a & (b | (c U d))) S q",
    "((a U b) S c) U d",
    "G(a -> Y b)",
    "O(a & X b)",
    "(a W b) S q",
    "H(a <-> F b)",
];

fn separator() -> &'static Separator {
    static SEPARATOR: OnceLock<Separator> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Separator::new(SeparatorConfig {
            workers: Some(4),
            ..SeparatorConfig::default()
        })
        .unwrap()
    })
}

/// Each formula of [`FORMULAS`], converted, next to its separated form.
fn separated() -> &'static [(Formula, Formula)] {
    static SEPARATED: OnceLock<Vec<(Formula, Formula)>> = OnceLock::new();
    SEPARATED.get_or_init(|| {
        FORMULAS
            .iter()
            .map(|s| {
                let f: Formula = s.parse().unwrap();
                (convert(&f), separator().separate(&f))
            })
            .collect()
    })
}

fn parse(s: &str) -> Formula {
    s.parse().unwrap()
}

/// Applies `rewrite` to the root of `s` and returns the input and the result.
fn rewritten(s: &str, rewrite: fn(&mut Formula)) -> (Formula, Formula) {
    let f = parse(s);
    let mut g = f.clone();
    rewrite(&mut g);
    assert!(g.is_consistent());
    (f, g)
}

#[test]
fn test_every_shape_is_separated() {
    for ((f, g), text) in separated().iter().zip(FORMULAS) {
        assert!(g.is_separated(g.root()), "{} gives {}", text, g);
        assert!(g.is_consistent());
        assert!(!f.is_separated(f.root()), "{} is already separated", text);
    }
}

#[test]
fn test_separation_is_idempotent() {
    for (_, g) in separated() {
        assert_eq!(&separator().separate(g), g);
    }
}

#[test]
fn test_matrix_of_separated_formulas() {
    for (_, g) in separated() {
        let m = PureMatrix::from_formula(g);
        assert!(!m.is_empty());
        for t in m.rows() {
            let f = m.formula();
            assert!(f.time(t.past).is_pure() && !f.time(t.past).has_future(), "{}", m);
            assert!(!f.time(t.future).has_past(), "{}", m);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn separated_formulas_agree_on_traces(trace in traces()) {
        for ((f, g), text) in separated().iter().zip(FORMULAS) {
            let bad = disagreements(f, g, &trace);
            prop_assert!(bad.is_empty(), "{} and {} differ at {:?} on {:?}", text, g, bad, trace);
        }
    }

    #[test]
    fn lemmas_agree_on_traces(trace in traces()) {
        let cases: [(&str, fn(&mut Formula)); 3] = [
            ("(a | (b U c)) S q", |f| {
                let x = f.root();
                let new = lemma_a2_or(f, x);
                f.replace(x, new);
            }),
            ("a S (q & (b U c))", |f| {
                let x = f.root();
                let new = lemma_a2_and(f, x);
                f.replace(x, new);
            }),
            ("(a S b) & (c S d)", |f| {
                let x = f.root();
                let (f1, f2) = (f.left(x), f.right(x));
                let new = lemma_a1(f, f1, f2);
                f.replace(x, new);
            }),
        ];
        for (text, rewrite) in cases {
            let (f, g) = rewritten(text, rewrite);
            prop_assert!(disagreements(&f, &g, &trace).is_empty(), "{} and {} differ", f, g);
        }
    }

    #[test]
    fn boolean_rewrites_agree_on_traces(trace in traces()) {
        for text in ["!((a S b) | !(c & (d U e)))", "(a | b) & (c | (d S e))", "(a & !a) | (b & b & true)"] {
            let rewrites: [fn(&mut Formula); 3] = [normalize_formula, simplify_formula, merge_siblings];
            for rewrite in rewrites {
                let (f, g) = rewritten(text, rewrite);
                prop_assert!(disagreements(&f, &g, &trace).is_empty(), "{} and {} differ", f, g);
            }
        }
        let (f, g) = rewritten("(a S b) & (a S c) | (d U e) | (r U e)", merge_siblings);
        prop_assert!(disagreements(&f, &g, &trace).is_empty(), "{} and {} differ", f, g);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_formulas_separate(text in formula_text(), traces in prop::collection::vec(traces(), 8)) {
        let f: Formula = text.parse().unwrap();
        let g = separator().separate(&f);
        prop_assert!(g.is_separated(g.root()), "{} gives {}", text, g);
        let f = convert(&f);
        for trace in traces {
            let bad = disagreements(&f, &g, &trace);
            prop_assert!(bad.is_empty(), "{} and {} differ at {:?} on {:?}", f, g, bad, trace);
        }
    }
}
