//! Boolean rewriting rules and normalization.
//!
//! Each rule comes as a pair: a predicate `needs_*` telling whether the rule
//! applies to a node, and a constructor building the rewritten subtree. The
//! constructors do not touch the tree around the node; callers install the result
//! with [`Formula::replace`].
//!
//! | rule            | rewrite                                   |
//! |-----------------|-------------------------------------------|
//! | involution      | `!!A` ⇒ `A`                               |
//! | De Morgan       | `!(A & B)` ⇒ `!A \| !B` (and dual)        |
//! | left distrib.   | `A & (B \| C)` ⇒ `(A & B) \| (A & C)`     |
//! | right distrib.  | `(A \| B) & C` ⇒ `(A & C) \| (B & C)`     |
//!
//! The distributive laws hold for `|` over `&` as well.

use log::debug;

use crate::formula::{Expr, Formula};
use crate::operator::Operator;
use crate::reference::NodeId;

/// Whether `id` is a negation of a negation.
pub fn needs_involution(f: &Formula, id: NodeId) -> bool {
    match *f.expr(id) {
        Expr::Unary(Operator::Not, c) => f.has_operator(c, Operator::Not),
        _ => false,
    }
}

/// `!!A` ⇒ `A`.
///
/// Returns the handle of `A`, still attached below the double negation.
///
/// # Panics
///
/// Panics if `id` is not of the form `!!A`.
pub fn involution(f: &Formula, id: NodeId) -> NodeId {
    assert!(needs_involution(f, id), "Involution needs a double negation, got '{}'", f.display(id));
    debug!("involution({})", f.display(id));
    f.operand(f.operand(id))
}

/// Whether `id` is a negation of a conjunction or a disjunction.
pub fn needs_de_morgan(f: &Formula, id: NodeId) -> bool {
    match *f.expr(id) {
        Expr::Unary(Operator::Not, c) => f.operator(c).map_or(false, Operator::is_junction),
        _ => false,
    }
}

/// `!(A & B)` ⇒ `!A | !B`, `!(A | B)` ⇒ `!A & !B`.
///
/// # Panics
///
/// Panics if `id` is not the negation of a `&`/`|` node.
pub fn de_morgan(f: &mut Formula, id: NodeId) -> NodeId {
    assert!(
        needs_de_morgan(f, id),
        "De Morgan's law needs the negation of '&' or '|', got '{}'",
        f.display(id)
    );
    debug!("de_morgan({})", f.display(id));
    let inner = f.operand(id);
    let (op, l, r) = match *f.expr(inner) {
        Expr::Binary(op, l, r) => (op, l, r),
        _ => unreachable!(),
    };
    let nl = f.not(l);
    let nr = f.not(r);
    f.binary(op.mirrored(), nl, nr)
}

/// Whether `id` is a `&`/`|` node with an operand carrying the mirror junction.
pub fn needs_distributive(f: &Formula, id: NodeId) -> bool {
    match *f.expr(id) {
        Expr::Binary(op, l, r) if op.is_junction() => {
            let m = op.mirrored();
            f.has_operator(l, m) || f.has_operator(r, m)
        }
        _ => false,
    }
}

/// Distributes `id`'s operator over the mirror junction found in one of its operands.
///
/// The right operand is tried first (`A & (B | C)`), then the left one
/// (`(A | B) & C`). The shared operand is deep-copied for its second use.
///
/// # Panics
///
/// Panics if [`needs_distributive`] does not hold.
pub fn distributive(f: &mut Formula, id: NodeId) -> NodeId {
    assert!(
        needs_distributive(f, id),
        "Distributive law needs '&' over '|' or '|' over '&', got '{}'",
        f.display(id)
    );
    debug!("distributive({})", f.display(id));
    let (op, l, r) = match *f.expr(id) {
        Expr::Binary(op, l, r) => (op, l, r),
        _ => unreachable!(),
    };
    let m = op.mirrored();
    if f.has_operator(r, m) {
        // A op (B m C) => (A op B) m (A op C)
        let (b, c) = (f.left(r), f.right(r));
        let a2 = f.deep_copy(l);
        let ab = f.binary(op, l, b);
        let ac = f.binary(op, a2, c);
        f.binary(m, ab, ac)
    } else {
        // (A m B) op C => (A op C) m (B op C)
        let (a, b) = (f.left(l), f.right(l));
        let c2 = f.deep_copy(r);
        let ac = f.binary(op, a, r);
        let bc = f.binary(op, b, c2);
        f.binary(m, ac, bc)
    }
}

fn needs_normalization(f: &Formula, id: NodeId) -> bool {
    let mut stack = vec![id];
    while let Some(n) = stack.pop() {
        match f.operator(n) {
            Some(Operator::Not) => {
                if needs_involution(f, n) || needs_de_morgan(f, n) {
                    return true;
                }
            }
            Some(Operator::And) => {
                if needs_distributive(f, n) {
                    return true;
                }
                stack.extend(f.children(n));
            }
            Some(Operator::Or) => stack.extend(f.children(n)),
            _ => {}
        }
    }
    false
}

/// One breadth-first sweep of boolean rewrites over the `!`/`&`/`|` skeleton of `id`.
fn normalize_pass(f: &mut Formula, id: NodeId) {
    let mut queue = std::collections::VecDeque::from([id]);
    while let Some(n) = queue.pop_front() {
        match f.operator(n) {
            Some(Operator::Not) => {
                if needs_involution(f, n) {
                    let new = involution(f, n);
                    queue.push_back(f.replace(n, new));
                } else if needs_de_morgan(f, n) {
                    let new = de_morgan(f, n);
                    queue.push_back(f.replace(n, new));
                }
            }
            Some(Operator::And) => {
                if needs_distributive(f, n) {
                    let new = distributive(f, n);
                    queue.push_back(f.replace(n, new));
                } else {
                    queue.extend(f.children(n));
                }
            }
            Some(Operator::Or) => queue.extend(f.children(n)),
            _ => {}
        }
    }
}

/// Rewrites the subtree at `id` into disjunctive normal form over its temporal and
/// atomic leaves, and returns the handle now standing in its place.
///
/// Temporal operators are opaque: their operands are left untouched.
///
/// # Panics
///
/// Panics if `id` is detached and not the root of `f`.
pub fn normalize(f: &mut Formula, id: NodeId) -> NodeId {
    let parent = f.parent(id);
    let in_left = parent.map(|p| matches!(*f.expr(p), Expr::Binary(_, l, _) if l == id));
    let mut current = id;
    while needs_normalization(f, current) {
        normalize_pass(f, current);
        // The node at `current` may have been replaced: look it up again.
        current = match (parent, in_left) {
            (Some(p), Some(true)) => f.left(p),
            (Some(p), Some(false)) => match *f.expr(p) {
                Expr::Unary(_, c) => c,
                _ => f.right(p),
            },
            _ => f.root(),
        };
    }
    current
}

/// Normalizes the whole formula in place.
pub fn normalize_formula(f: &mut Formula) {
    let root = f.root();
    normalize(f, root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn parse(s: &str) -> Formula {
        s.parse().unwrap()
    }

    #[test]
    fn test_involution() {
        let mut f = parse("!!(a U b)");
        let root = f.root();
        assert!(needs_involution(&f, root));
        let new = involution(&f, root);
        f.replace(root, new);
        assert_eq!(f.to_string(), "aUb");
        assert!(f.is_consistent());
    }

    #[test]
    #[should_panic(expected = "Involution needs a double negation")]
    fn test_involution_panics() {
        let f = parse("!a");
        involution(&f, f.root());
    }

    #[test]
    fn test_de_morgan() {
        let mut f = parse("!(a & (b U c))");
        let root = f.root();
        assert!(needs_de_morgan(&f, root));
        let new = de_morgan(&mut f, root);
        f.replace(root, new);
        assert_eq!(f.to_string(), "!a|!(bUc)");
    }

    #[test]
    #[should_panic(expected = "De Morgan's law needs the negation")]
    fn test_de_morgan_panics() {
        let mut f = parse("!(a S b)");
        let root = f.root();
        de_morgan(&mut f, root);
    }

    #[test]
    fn test_distributive_left() {
        let mut f = parse("a & (b | c)");
        let root = f.root();
        let new = distributive(&mut f, root);
        f.replace(root, new);
        assert_eq!(f.to_string(), "(a&b)|(a&c)");
        assert!(f.is_consistent());
    }

    #[test]
    fn test_distributive_right() {
        let mut f = parse("(a | b) & c");
        let root = f.root();
        let new = distributive(&mut f, root);
        f.replace(root, new);
        assert_eq!(f.to_string(), "(a&c)|(b&c)");

        let mut g = parse("(a & b) | c");
        let root = g.root();
        let new = distributive(&mut g, root);
        g.replace(root, new);
        assert_eq!(g.to_string(), "(a|c)&(b|c)");
    }

    #[test]
    #[should_panic(expected = "Distributive law needs")]
    fn test_distributive_panics() {
        let mut f = parse("a & b");
        let root = f.root();
        distributive(&mut f, root);
    }

    #[test]
    fn test_normalize_to_dnf() {
        let mut f = parse("!(a | !(b & (c S d))) & (e | f)");
        normalize_formula(&mut f);
        assert!(f.is_consistent());
        for conj in f.flatten_chain(f.root()) {
            for lit in f.flatten_chain(conj) {
                assert!(!matches!(f.operator(lit), Some(Operator::And | Operator::Or)));
                if f.has_operator(lit, Operator::Not) {
                    assert!(f.operator(f.operand(lit)).map_or(true, Operator::is_temporal));
                }
            }
        }
        assert_eq!(f.to_string(), "(!a&b&(cSd)&e)|(!a&b&(cSd)&f)");
    }

    #[test]
    fn test_normalize_keeps_temporal_operands() {
        let mut f = parse("(!!a & (b | c)) S q");
        let before = f.to_string();
        normalize_formula(&mut f);
        assert_eq!(f.to_string(), before);
    }

    #[test]
    fn test_normalize_subtree() {
        let mut f = parse("(a & (b | c)) S q");
        let l = f.left(f.root());
        let new = normalize(&mut f, l);
        assert_eq!(f.left(f.root()), new);
        assert_eq!(f.to_string(), "((a&b)|(a&c))Sq");
    }
}
