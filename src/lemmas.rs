//! Lemmas distributing `S`/`U` over `&` and `|`.
//!
//! With `θ ∈ {S, U}` and operands in event-first order:
//!
//! - **A2 (or)**: `(A | B) θ C ≡ (A θ C) | (B θ C)`
//! - **A2 (and)**: `A θ (B & C) ≡ (A θ B) & (A θ C)`
//! - **A1**: `(A θ B) & (C θ D) ≡ ((A & C) θ (B & D)) | ((A & D & (C θ D)) θ (B & D)) | ((C & B & (A θ B)) θ (B & D))`
//!
//! The A2 lemmas split a temporal node whose operand chain has the wrong junction
//! operator, so that each nested mirror occurrence ends up in a chain of the
//! expected shape. Read right to left (*reversed* A2) they merge two siblings
//! sharing an operand, which only shrinks formulas.

use std::collections::VecDeque;

use log::debug;

use crate::formula::{Expr, Formula};
use crate::operator::Operator;
use crate::reference::NodeId;

fn since_until(f: &Formula, x: NodeId) -> Option<(Operator, NodeId, NodeId)> {
    match *f.expr(x) {
        Expr::Binary(op, l, r) if op.is_since_until() => Some((op, l, r)),
        _ => None,
    }
}

fn expect_since_until(f: &Formula, x: NodeId) -> (Operator, NodeId, NodeId) {
    match since_until(f, x) {
        Some(parts) => parts,
        None => panic!("Lemma needs an 'S' or 'U' node, got '{}'", f.display(x)),
    }
}

/// Whether `x` is `(A | B) θ C`.
pub fn needs_a2_or(f: &Formula, x: NodeId) -> bool {
    since_until(f, x).map_or(false, |(_, l, _)| f.has_operator(l, Operator::Or))
}

/// Whether `x` is `A θ (B & C)`.
pub fn needs_a2_and(f: &Formula, x: NodeId) -> bool {
    since_until(f, x).map_or(false, |(_, _, r)| f.has_operator(r, Operator::And))
}

/// `(A | B) θ C` ⇒ `(A θ C) | (B θ C)`.
///
/// # Panics
///
/// Panics if [`needs_a2_or`] does not hold.
pub fn lemma_a2_or(f: &mut Formula, x: NodeId) -> NodeId {
    assert!(needs_a2_or(f, x), "Lemma A2 (or) needs '(A|B) θ C', got '{}'", f.display(x));
    debug!("lemma_a2_or({})", f.display(x));
    let (op, l, c) = expect_since_until(f, x);
    let (a, b) = (f.left(l), f.right(l));
    let c2 = f.deep_copy(c);
    let ac = f.binary(op, a, c);
    let bc = f.binary(op, b, c2);
    f.or(ac, bc)
}

/// `A θ (B & C)` ⇒ `(A θ B) & (A θ C)`.
///
/// # Panics
///
/// Panics if [`needs_a2_and`] does not hold.
pub fn lemma_a2_and(f: &mut Formula, x: NodeId) -> NodeId {
    assert!(needs_a2_and(f, x), "Lemma A2 (and) needs 'A θ (B&C)', got '{}'", f.display(x));
    debug!("lemma_a2_and({})", f.display(x));
    let (op, a, r) = expect_since_until(f, x);
    let (b, c) = (f.left(r), f.right(r));
    let a2 = f.deep_copy(a);
    let ab = f.binary(op, a, b);
    let ac = f.binary(op, a2, c);
    f.and(ab, ac)
}

/// `(A θ B) & (C θ D)` ⇒ `((A&C) θ (B&D)) | ((A&D&(C θ D)) θ (B&D)) | ((C&B&(A θ B)) θ (B&D))`.
///
/// Builds the right-hand side from copies; `f1` and `f2` are left untouched.
///
/// # Panics
///
/// Panics if `f1` and `f2` do not carry the same temporal operator `S` or `U`.
pub fn lemma_a1(f: &mut Formula, f1: NodeId, f2: NodeId) -> NodeId {
    let (op, a, b) = expect_since_until(f, f1);
    let (op2, c, d) = expect_since_until(f, f2);
    assert_eq!(op, op2, "Lemma A1 needs two nodes with the same operator");
    debug!("lemma_a1({}, {})", f.display(f1), f.display(f2));

    let bd = |f: &mut Formula| {
        let (b, d) = (f.deep_copy(b), f.deep_copy(d));
        f.and(b, d)
    };

    // (A&C) θ (B&D)
    let (a1, c1) = (f.deep_copy(a), f.deep_copy(c));
    let ac = f.and(a1, c1);
    let r = bd(f);
    let e1 = f.binary(op, ac, r);

    // (A & D & (C θ D)) θ (B&D)
    let (a2, d2) = (f.deep_copy(a), f.deep_copy(d));
    let cd = f.deep_copy(f2);
    let lhs = f.new_conjunction(&[a2, d2, cd]);
    let r = bd(f);
    let e2 = f.binary(op, lhs, r);

    // (C & B & (A θ B)) θ (B&D)
    let (c3, b3) = (f.deep_copy(c), f.deep_copy(b));
    let ab = f.deep_copy(f1);
    let lhs = f.new_conjunction(&[c3, b3, ab]);
    let r = bd(f);
    let e3 = f.binary(op, lhs, r);

    f.new_disjunction(&[e1, e2, e3])
}

/// Whether `f1 op f2` can be merged by reversed Lemma A2: both carry the same
/// temporal operator and share their left operand (`op` = `&`) or their right
/// operand (`op` = `|`).
pub fn needs_reversed_a2(f: &Formula, op: Operator, f1: NodeId, f2: NodeId) -> bool {
    match (since_until(f, f1), since_until(f, f2)) {
        (Some((o1, l1, r1)), Some((o2, l2, r2))) if o1 == o2 => match op {
            Operator::And => f.equal_to(l1, l2),
            Operator::Or => f.equal_to(r1, r2),
            _ => false,
        },
        _ => false,
    }
}

/// `(A θ B) & (A θ C)` ⇒ `A θ (B & C)`, `(A θ C) | (B θ C)` ⇒ `(A | B) θ C`.
///
/// Reuses the operands of `f1` and `f2`, which must be discarded afterwards.
///
/// # Panics
///
/// Panics if [`needs_reversed_a2`] does not hold.
pub fn reversed_a2(f: &mut Formula, op: Operator, f1: NodeId, f2: NodeId) -> NodeId {
    assert!(
        needs_reversed_a2(f, op, f1, f2),
        "Reversed Lemma A2 cannot merge '{}' {} '{}'",
        f.display(f1),
        op,
        f.display(f2)
    );
    debug!("reversed_a2({} {} {})", f.display(f1), op, f.display(f2));
    let (theta, l1, r1) = expect_since_until(f, f1);
    let (_, l2, r2) = expect_since_until(f, f2);
    if op == Operator::And {
        let rhs = f.and(r1, r2);
        f.binary(theta, l1, rhs)
    } else {
        let lhs = f.or(l1, l2);
        f.binary(theta, lhs, r1)
    }
}

/// Merges the operands of the `&`/`|` chain rooted at `id` pairwise with reversed
/// Lemma A2, and returns the rebuilt chain (or `id` itself when nothing merged).
pub fn merge_chain(f: &mut Formula, id: NodeId) -> NodeId {
    let op = match f.operator(id) {
        Some(op) if op.is_junction() => op,
        _ => return id,
    };
    let mut operands = f.flatten_chain(id);
    let mut merged = false;
    let mut i = 0;
    while i < operands.len() {
        let mut j = i + 1;
        while j < operands.len() {
            if needs_reversed_a2(f, op, operands[i], operands[j]) {
                operands[i] = reversed_a2(f, op, operands[i], operands[j]);
                operands.remove(j);
                merged = true;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    if merged {
        f.new_chain(op, &operands)
    } else {
        id
    }
}

/// Applies [`merge_chain`] to every maximal `&`/`|` chain of the formula.
pub fn merge_siblings(f: &mut Formula) {
    let mut queue = VecDeque::from([f.root()]);
    while let Some(n) = queue.pop_front() {
        let op = f.operator(n);
        let chain_root = op.map_or(false, Operator::is_junction)
            && f.parent(n).map_or(true, |p| f.operator(p) != op);
        let n = if chain_root {
            let new = merge_chain(f, n);
            f.replace(n, new)
        } else {
            n
        };
        queue.extend(f.children(n));
    }
}
