//! Junctions: nested occurrences of a mirror temporal operator.
//!
//! A [`Junction`] pairs a node `x` carrying `S` or `U` with a proper descendant `y`
//! carrying the mirror operator. When `y` lies in the left operand of `x`, the
//! junction is on the [`Left`][Side::Left] side and the elimination rules expect `y`
//! to be a member of an `&`-chain; on the [`Right`][Side::Right] side they expect an
//! `|`-chain:
//!
//! ```text
//!        x: S                     x: S
//!       /    \                   /    \
//!      &      q                 a      |
//!     / \                             / \
//!    a   y: U                        q   y: U
//! ```
//!
//! Before an elimination the path from `x` to `y` must be *arranged* (no boolean
//! rule would rewrite any of its nodes) and form an *operator chain* (every node
//! strictly between `x` and `y` carries the side's junction operator, except
//! possibly a negation right above `y`).
//!
//! Junctions are cheap handles: they are recomputed from the tree whenever needed
//! and become meaningless once the path they describe is rewritten.

use std::collections::HashMap;

use log::debug;

use crate::formula::Formula;
use crate::operator::Operator;
use crate::reference::NodeId;
use crate::rules::{de_morgan, distributive, involution, needs_de_morgan, needs_distributive, needs_involution};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Junction operator of the side: `&` on the left, `|` on the right.
    pub fn operator(self) -> Operator {
        match self {
            Side::Left => Operator::And,
            Side::Right => Operator::Or,
        }
    }

    /// The operand of `x` on this side.
    pub fn child(self, f: &Formula, x: NodeId) -> NodeId {
        match self {
            Side::Left => f.left(x),
            Side::Right => f.right(x),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Junction {
    x: NodeId,
    y: NodeId,
    side: Side,
}

impl Junction {
    /// Creates the junction between `x` and its descendant `y`.
    ///
    /// # Panics
    ///
    /// Panics if `x` is not a proper ancestor of `y`.
    pub fn new(f: &Formula, x: NodeId, y: NodeId) -> Self {
        assert!(
            f.is_ancestor_of(x, y),
            "Junction needs {} to be a proper ancestor of {}",
            x,
            y
        );
        let side = if f.is_in_left_subtree(x, y) {
            Side::Left
        } else {
            Side::Right
        };
        Junction { x, y, side }
    }

    /// All junctions of `x` on the given side, one per outermost mirror occurrence.
    pub fn collect(f: &Formula, x: NodeId, side: Side) -> Vec<Junction> {
        let mirror = match f.operator(x) {
            Some(op) if op.is_since_until() => op.mirrored(),
            _ => panic!("Junctions start from an 'S' or 'U' node, got '{}'", f.display(x)),
        };
        f.search_operators(side.child(f, x), mirror)
            .into_iter()
            .map(|y| Junction { x, y, side })
            .collect()
    }

    pub fn x(&self) -> NodeId {
        self.x
    }

    pub fn y(&self) -> NodeId {
        self.y
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Junction operator expected along the path.
    pub fn operator(&self) -> Operator {
        self.side.operator()
    }

    /// Translates the junction into a copy of the tree made with [`Formula::subtree`].
    ///
    /// # Panics
    ///
    /// Panics if the copy does not contain `x` or `y`.
    pub fn relocate(&self, map: &HashMap<NodeId, NodeId>) -> Junction {
        let lookup = |id: NodeId| match map.get(&id) {
            Some(&new) => new,
            None => panic!("Node {} is not part of the copied tree", id),
        };
        Junction {
            x: lookup(self.x),
            y: lookup(self.y),
            side: self.side,
        }
    }

    /// The child of `z` leading to `y`.
    fn step(&self, f: &Formula, z: NodeId) -> NodeId {
        if f.operator(z).map_or(false, Operator::is_unary) {
            f.operand(z)
        } else if f.is_in_left_subtree(z, self.y) {
            f.left(z)
        } else if f.is_in_right_subtree(z, self.y) {
            f.right(z)
        } else {
            panic!("Node {} is not on the path to {}", z, self.y)
        }
    }

    fn blocks(&self, f: &Formula, z: NodeId) -> bool {
        match f.operator(z) {
            Some(Operator::Not) => needs_involution(f, z) || needs_de_morgan(f, z),
            Some(op) if op == self.operator() => needs_distributive(f, z),
            _ => false,
        }
    }

    /// Whether no boolean rule applies to the nodes on the path from `x` to `y`.
    pub fn is_arranged(&self, f: &Formula) -> bool {
        let mut z = self.x;
        while z != self.y {
            if self.blocks(f, z) {
                return false;
            }
            z = self.step(f, z);
        }
        true
    }

    /// Rewrites the node `z` on the path if a rule applies, and returns the next node to visit.
    fn arrange_node(&mut self, f: &mut Formula, z: NodeId) -> NodeId {
        match f.operator(z) {
            Some(Operator::Not) if needs_involution(f, z) => {
                let new = involution(f, z);
                f.replace(z, new)
            }
            Some(Operator::Not) if needs_de_morgan(f, z) => {
                let new = de_morgan(f, z);
                f.replace(z, new)
            }
            Some(op) if op == self.operator() && needs_distributive(f, z) => {
                let new = distributive(f, z);
                let new = f.replace(z, new);
                let mirror = f.operator(self.x).map(Operator::mirrored);
                self.y = match mirror.and_then(|m| f.next_operator(new, m)) {
                    Some(y) => y,
                    None => panic!("Lost the nested operator while arranging '{}'", f.display(new)),
                };
                debug!("arrange: retargeted y to {}", f.display(self.y));
                new
            }
            _ => self.step(f, z),
        }
    }

    /// Applies boolean rules along the path until it is arranged.
    ///
    /// A distribution may move the nested mirror operator: `y` is then retargeted to
    /// the first mirror occurrence below the rewritten node.
    pub fn arrange(&mut self, f: &mut Formula) {
        debug!("arrange(x = {}, y = {})", f.display(self.x), f.display(self.y));
        while !self.is_arranged(f) {
            let mut z = self.x;
            while z != self.y {
                z = self.arrange_node(f, z);
            }
        }
    }

    /// Whether every node strictly between `x` and `y` carries the junction operator,
    /// a negation right above `y` aside.
    pub fn is_operator_chain(&self, f: &Formula) -> bool {
        let op = self.operator();
        let mut current = f.parent(self.y);
        while let Some(p) = current {
            if p == self.x {
                return true;
            }
            let negation_of_y = f.has_operator(p, Operator::Not) && f.operand(p) == self.y;
            if !f.has_operator(p, op) && !negation_of_y {
                return false;
            }
            current = f.parent(p);
        }
        false
    }

    /// `y`, or its negation when `y` is negated.
    fn literal(&self, f: &Formula) -> NodeId {
        match f.parent(self.y) {
            Some(p) if f.has_operator(p, Operator::Not) => p,
            _ => self.y,
        }
    }

    /// Whether `y` (or its negation) is an operand of `x`.
    pub fn is_immediate_child(&self, f: &Formula) -> bool {
        f.parent(self.literal(f)) == Some(self.x)
    }

    /// Turns an immediate child `c` of `x` into the one-element chain `true & c`
    /// (left side) or `false | c` (right side).
    pub fn rewrite_immediate_child(&self, f: &mut Formula) {
        let c = self.literal(f);
        debug!("rewrite_immediate_child({})", f.display(c));
        let hole = f.detach(c);
        let neutral = f.constant(self.side == Side::Left);
        let chain = f.binary(self.operator(), neutral, c);
        f.replace(hole, chain);
    }

    /// Shape of `y`'s position: 2 if `y` is negated, 1 if it sits in the side's chain, 0 otherwise.
    pub fn case(&self, f: &Formula) -> u8 {
        match f.parent(self.y) {
            Some(p) if f.has_operator(p, Operator::Not) => 2,
            Some(p) if f.has_operator(p, self.operator()) => 1,
            _ => 0,
        }
    }
}

/// [`Junction::case`] of an optional junction, 0 when absent.
pub fn junction_case(f: &Formula, j: Option<&Junction>) -> u8 {
    j.map_or(0, |j| j.case(f))
}
