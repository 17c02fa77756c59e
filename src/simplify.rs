//! Redundancy removal in `&`/`|` chains.
//!
//! For a chain with operator `op`, let `absorbing` be the constant that decides it
//! (`false` for `&`, `true` for `|`) and `identity` the other one. Simplification
//! flattens the chain and then, operand by operand:
//!
//! - `x op x => x` (structural duplicates are dropped);
//! - `x op !x => absorbing`;
//! - `absorbing op x => absorbing`;
//! - `identity op x => x`.
//!
//! [`simplify_subtree`] and [`simplify_formula`] also cancel double negations and
//! fold negated constants (`!true => false`).

use log::debug;

use crate::formula::{Expr, Formula};
use crate::operator::Operator;
use crate::reference::NodeId;
use crate::rules::{involution, needs_involution};

/// Simplifies the chain rooted at `id`.
///
/// Returns the node standing for the simplified chain: `id` itself when nothing
/// changed or `id` is not a `&`/`|` node, otherwise a node to install with
/// [`Formula::replace`] (either a fresh one, or one of the chain's operands).
///
/// ```
/// use gabbay_rs::formula::Formula;
/// use gabbay_rs::simplify::simplify;
///
/// let mut f: Formula = "x & !x & y".parse().unwrap();
/// let root = f.root();
/// let new = simplify(&mut f, root);
/// f.replace(root, new);
/// assert_eq!(f.to_string(), "false");
/// ```
pub fn simplify(f: &mut Formula, id: NodeId) -> NodeId {
    let op = match f.operator(id) {
        Some(op @ (Operator::And | Operator::Or)) => op,
        _ => return id,
    };
    let absorbing = op == Operator::Or;
    let identity = !absorbing;

    let operands = f.flatten_chain(id);
    let mut kept: Vec<NodeId> = Vec::with_capacity(operands.len());
    for &n in operands.iter() {
        if f.is_constant(n, absorbing) {
            debug!("simplify: {} is absorbing", f.display(n));
            return f.constant(absorbing);
        }
        if kept.iter().any(|&k| f.equal_to(k, n)) {
            debug!("simplify: {} is a duplicate", f.display(n));
            continue;
        }
        if let Some(&k) = kept.iter().find(|&&k| f.opposite(k, n)) {
            debug!("simplify: {} {} {} => {}", f.display(k), op, f.display(n), absorbing);
            return f.constant(absorbing);
        }
        kept.push(n);
    }
    if kept.len() > 1 {
        kept.retain(|&k| !f.is_constant(k, identity));
    }

    match kept.as_slice() {
        [] => f.constant(identity),
        &[single] => single,
        _ if kept.len() == operands.len() => id,
        _ => f.new_chain(op, &kept),
    }
}

/// Simplifies every chain below `id` (included), innermost nodes first, and removes
/// double negations and negated constants on the way.
///
/// Rewrites are installed in place; returns the node now standing where `id` was.
///
/// # Panics
///
/// Panics if `id` is detached and not the root of `f`.
pub fn simplify_subtree(f: &mut Formula, id: NodeId) -> NodeId {
    let mut current = id;
    let order = f.descendants(id);
    for &n in order.iter().rev() {
        if n != current && !f.is_ancestor_of(current, n) {
            continue;
        }
        let new = match *f.expr(n) {
            Expr::Unary(Operator::Not, c) => match *f.expr(c) {
                Expr::Const(value) => f.constant(!value),
                _ if needs_involution(f, n) => {
                    let inner = involution(f, n);
                    f.detach(inner);
                    inner
                }
                _ => continue,
            },
            Expr::Binary(op, _, _) if op.is_junction() => {
                let is_chain_root = n == current || !f.parent(n).map_or(false, |p| f.has_operator(p, op));
                if !is_chain_root {
                    continue;
                }
                simplify(f, n)
            }
            _ => continue,
        };
        f.replace(n, new);
        if n == current {
            current = new;
        }
    }
    current
}

/// Simplifies the whole formula with [`simplify_subtree`].
pub fn simplify_formula(f: &mut Formula) {
    let root = f.root();
    simplify_subtree(f, root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn simplified(s: &str) -> String {
        let mut f: Formula = s.parse().unwrap();
        let root = f.root();
        let new = simplify(&mut f, root);
        f.replace(root, new);
        assert!(f.is_consistent());
        f.to_string()
    }

    #[test]
    fn test_opposites_collapse() {
        assert_eq!(simplified("x & !x & y"), "false");
        assert_eq!(simplified("x | !x | y"), "true");
        assert_eq!(simplified("(a S b) & y & !(a S b)"), "false");
    }

    #[test]
    fn test_duplicates_dropped() {
        assert_eq!(simplified("a & b & a"), "a&b");
        assert_eq!(simplified("(a U b) | c | (a U b)"), "(aUb)|c");
        assert_eq!(simplified("a & a"), "a");
    }

    #[test]
    fn test_constants() {
        assert_eq!(simplified("true & a & true"), "a");
        assert_eq!(simplified("false | false"), "false");
        assert_eq!(simplified("a | true"), "true");
        assert_eq!(simplified("a & false & b"), "false");
    }

    #[test]
    fn test_unchanged() {
        let mut f: Formula = "a & b & c".parse().unwrap();
        let root = f.root();
        assert_eq!(simplify(&mut f, root), root);
        let mut g: Formula = "a S b".parse().unwrap();
        let root = g.root();
        assert_eq!(simplify(&mut g, root), root);
    }

    #[test]
    fn test_simplify_formula_innermost_first() {
        let mut f: Formula = "((a & !a) | b) S (c | c)".parse().unwrap();
        simplify_formula(&mut f);
        assert_eq!(f.to_string(), "bSc");
        assert!(f.is_consistent());
    }

    #[test]
    fn test_simplify_formula_double_negations() {
        let mut f: Formula = "!!!!(a S b) & (c | !!(d & !!c))".parse().unwrap();
        simplify_formula(&mut f);
        assert_eq!(f.to_string(), "(aSb)&(c|(d&c))");
        assert!(f.is_consistent());

        let mut g: Formula = "!!a & a".parse().unwrap();
        simplify_formula(&mut g);
        assert_eq!(g.to_string(), "a");
    }

    #[test]
    fn test_negated_constants_folded() {
        let mut f: Formula = "!(!false & !true) | a".parse().unwrap();
        simplify_formula(&mut f);
        assert_eq!(f.to_string(), "true");

        let mut g: Formula = "(!true | b) S !!!false".parse().unwrap();
        simplify_formula(&mut g);
        assert_eq!(g.to_string(), "bStrue");
        assert!(g.is_consistent());
    }

    #[test]
    fn test_simplify_subtree_returns_new_handle() {
        let mut f: Formula = "(!!a & true) S (b | b)".parse().unwrap();
        let left = f.left(f.root());
        let new = simplify_subtree(&mut f, left);
        assert_ne!(new, left);
        assert_eq!(f.left(f.root()), new);
        assert_eq!(f.display(new).to_string(), "a");
        // The right operand is out of reach.
        assert_eq!(f.to_string(), "aS(b|b)");
        assert!(f.is_consistent());
    }
}
