//! Rewriting of derived operators.
//!
//! [`convert`] expresses a formula with the core operators `! & | S U` only:
//!
//! | derived   | core                       |
//! |-----------|----------------------------|
//! | `O q`     | `q S true`                 |
//! | `H q`     | `!(!q S true)`             |
//! | `Y q`     | `q S false`                |
//! | `F q`     | `q U true`                 |
//! | `G q`     | `!(!q U true)`             |
//! | `X q`     | `q U false`                |
//! | `p W q`   | `(p U q) \| G p`           |
//! | `a -> b`  | `!a \| b`                  |
//! | `a <-> b` | `(a & b) \| (!a & !b)`     |
//!
//! Double negations are removed on the way. [`back_convert`] recognizes the
//! unary patterns again, for display.

use crate::formula::{Expr, Formula};
use crate::operator::Operator;
use crate::reference::NodeId;

/// Negates a freshly built node, cancelling a double negation.
fn negated(f: &mut Formula, id: NodeId) -> NodeId {
    if f.has_operator(id, Operator::Not) {
        let inner = f.operand(id);
        f.detach(inner);
        inner
    } else {
        f.not(id)
    }
}

/// `q θ value`
fn existential(f: &mut Formula, op: Operator, q: NodeId, value: bool) -> NodeId {
    let c = f.constant(value);
    f.binary(op, q, c)
}

/// `!(!q θ true)`
fn universal(f: &mut Formula, op: Operator, q: NodeId) -> NodeId {
    let nq = negated(f, q);
    let s = existential(f, op, nq, true);
    f.not(s)
}

fn convert_node(src: &Formula, id: NodeId, dst: &mut Formula) -> NodeId {
    match *src.expr(id) {
        Expr::Prop(ref name) => dst.prop(name.as_str()),
        Expr::Const(value) => dst.constant(value),
        Expr::Unary(op, c) => {
            let q = convert_node(src, c, dst);
            match op {
                Operator::Not => negated(dst, q),
                Operator::Once => existential(dst, Operator::Since, q, true),
                Operator::Yest => existential(dst, Operator::Since, q, false),
                Operator::Hist => universal(dst, Operator::Since, q),
                Operator::Fin => existential(dst, Operator::Until, q, true),
                Operator::Next => existential(dst, Operator::Until, q, false),
                Operator::Glob => universal(dst, Operator::Until, q),
                _ => unreachable!("unary operator {}", op),
            }
        }
        Expr::Binary(op, l, r) => {
            let a = convert_node(src, l, dst);
            let b = convert_node(src, r, dst);
            match op {
                Operator::Impl => {
                    let na = negated(dst, a);
                    dst.or(na, b)
                }
                Operator::Equiv => {
                    let (a2, b2) = (dst.deep_copy(a), dst.deep_copy(b));
                    let both = dst.and(a, b);
                    let (na, nb) = (negated(dst, a2), negated(dst, b2));
                    let neither = dst.and(na, nb);
                    dst.or(both, neither)
                }
                Operator::Unless => {
                    let p = dst.deep_copy(a);
                    let until = dst.binary(Operator::Until, a, b);
                    let always = universal(dst, Operator::Until, p);
                    dst.or(until, always)
                }
                _ => dst.binary(op, a, b),
            }
        }
    }
}

/// Returns an equivalent formula over `! & | S U`.
///
/// ```
/// use gabbay_rs::convert::convert;
/// use gabbay_rs::formula::Formula;
///
/// let f: Formula = "G F a".parse().unwrap();
/// assert_eq!(convert(&f).to_string(), "!(!(aUtrue)Utrue)");
/// ```
pub fn convert(f: &Formula) -> Formula {
    let mut res = Formula::new();
    let root = convert_node(f, f.root(), &mut res);
    res.set_root(root);
    res
}

/// Whether `f` only uses the core operators.
pub fn is_converted(f: &Formula) -> bool {
    f.descendants(f.root())
        .into_iter()
        .all(|n| f.operator(n).map_or(true, |op| !op.is_derived()))
}

/// If `id` is `!(!q θ true)`, returns `(θ, q)`.
fn universal_pattern(f: &Formula, id: NodeId) -> Option<(Operator, NodeId)> {
    let inner = match *f.expr(id) {
        Expr::Unary(Operator::Not, c) => c,
        _ => return None,
    };
    match *f.expr(inner) {
        Expr::Binary(op, l, r) if op.is_since_until() && f.is_constant(r, true) => match *f.expr(l) {
            Expr::Unary(Operator::Not, q) => Some((op, q)),
            _ => None,
        },
        _ => None,
    }
}

fn back_convert_node(src: &Formula, id: NodeId, dst: &mut Formula) -> NodeId {
    if let Some((op, q)) = universal_pattern(src, id) {
        let q = back_convert_node(src, q, dst);
        let unary = if op == Operator::Since { Operator::Hist } else { Operator::Glob };
        return dst.unary(unary, q);
    }
    match *src.expr(id) {
        Expr::Prop(ref name) => dst.prop(name.as_str()),
        Expr::Const(value) => dst.constant(value),
        Expr::Unary(op, c) => {
            let c = back_convert_node(src, c, dst);
            dst.unary(op, c)
        }
        Expr::Binary(op, l, r) => {
            let unary = match (op, src.expr(r)) {
                (Operator::Since, Expr::Const(true)) => Some(Operator::Once),
                (Operator::Since, Expr::Const(false)) => Some(Operator::Yest),
                (Operator::Until, Expr::Const(true)) => Some(Operator::Fin),
                (Operator::Until, Expr::Const(false)) => Some(Operator::Next),
                _ => None,
            };
            let a = back_convert_node(src, l, dst);
            match unary {
                Some(u) => dst.unary(u, a),
                None => {
                    let b = back_convert_node(src, r, dst);
                    dst.binary(op, a, b)
                }
            }
        }
    }
}

/// Folds `q S true`, `!(!q S true)`, `q S false` and their future mirrors back into
/// `O q`, `H q`, `Y q`, `F q`, `G q` and `X q`.
///
/// ```
/// use gabbay_rs::convert::back_convert;
/// use gabbay_rs::formula::Formula;
///
/// let f: Formula = "!(!(a U true) U true)".parse().unwrap();
/// assert_eq!(back_convert(&f).to_string(), "GFa");
/// ```
pub fn back_convert(f: &Formula) -> Formula {
    let mut res = Formula::new();
    let root = back_convert_node(f, f.root(), &mut res);
    res.set_root(root);
    res
}
