//! Finite-trace semantics of the core operators.
//!
//! A trace is a sequence of instants; each instant is a bitmask over [`PROPS`].
//! `a S b` holds at `t` iff `a` held at some `s < t` and `b` held at every instant
//! strictly between `s` and `t`; `a U b` is the mirror image.

#![allow(dead_code)]

use gabbay_rs::formula::{Expr, Formula};
use gabbay_rs::operator::Operator;
use gabbay_rs::reference::NodeId;
use proptest::prelude::*;

pub const PROPS: &[&str] = &["a", "b", "c", "d", "e", "q", "r"];

pub fn holds(f: &Formula, id: NodeId, trace: &[u32], t: usize) -> bool {
    match *f.expr(id) {
        Expr::Prop(ref name) => match PROPS.iter().position(|p| p == name) {
            Some(i) => trace[t] & (1 << i) != 0,
            None => panic!("unknown proposition '{}'", name),
        },
        Expr::Const(value) => value,
        Expr::Unary(Operator::Not, c) => !holds(f, c, trace, t),
        Expr::Binary(Operator::And, l, r) => holds(f, l, trace, t) && holds(f, r, trace, t),
        Expr::Binary(Operator::Or, l, r) => holds(f, l, trace, t) || holds(f, r, trace, t),
        Expr::Binary(Operator::Since, l, r) => (0..t)
            .rev()
            .any(|s| holds(f, l, trace, s) && (s + 1..t).all(|k| holds(f, r, trace, k))),
        Expr::Binary(Operator::Until, l, r) => (t + 1..trace.len())
            .any(|s| holds(f, l, trace, s) && (t + 1..s).all(|k| holds(f, r, trace, k))),
        ref e => panic!("derived operator in {:?}, convert first", e),
    }
}

/// Instants of `trace` where `f` and `g` disagree.
pub fn disagreements(f: &Formula, g: &Formula, trace: &[u32]) -> Vec<usize> {
    (0..trace.len())
        .filter(|&t| holds(f, f.root(), trace, t) != holds(g, g.root(), trace, t))
        .collect()
}

pub fn traces() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..(1 << PROPS.len()), 1..7)
}

/// Formulas over `a`, `b`, `c` with at most two levels of temporal nesting.
pub fn formula_text() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![Just("a"), Just("b"), Just("c"), Just("true")].prop_map(String::from);
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|a| format!("!({})", a)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({}) & ({})", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({}) | ({})", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({}) S ({})", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({}) U ({})", a, b)),
            inner.clone().prop_map(|a| format!("Y({})", a)),
            inner.prop_map(|a| format!("F({})", a)),
        ]
    })
}
