//! Formula trees.
//!
//! A [`Formula`] is an arena of [`Node`]s addressed by [`NodeId`] handles. Each node
//! holds an [`Expr`] (an atom, or an operator applied to child handles), a non-owning
//! back-reference to its parent, and two cached attributes:
//!
//! - its [`Time`], computed bottom-up with the tables of [`time`][crate::time];
//! - its *separation flag*, true iff no past temporal operator is nested inside the
//!   operand of a future one (or vice versa) anywhere in the subtree.
//!
//! Both attributes are recomputed along the ancestors of every mutated node.
//!
//! # Mutation discipline
//!
//! Every rewrite of the crate works destructively on the arena:
//!
//! - [`replace`][Formula::replace] relinks the parent slot of a node to a new subtree
//!   and keeps the tracked root up to date;
//! - the replaced subtree is left *detached* in the arena (it is unreachable from the
//!   root) and disappears on [`compact`][Formula::compact];
//! - identities that reuse an operand in several places must use
//!   [`deep_copy`][Formula::deep_copy] for every reuse, so that no two live positions
//!   share a node.
//!
//! # Rendering
//!
//! [`Display`] prints a binary node as `L op R` with no spaces. An operand is put in
//! parentheses unless it is atomic, unary, or a `&`/`|` node under the same operator.
//! A unary operator is followed by its operand, parenthesized only if binary:
//!
//! ```
//! use gabbay_rs::formula::Formula;
//!
//! let f: Formula = "(a & (b U c)) S q".parse().unwrap();
//! assert_eq!(f.to_string(), "(a&(bUc))Sq");
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::trace;

use crate::operator::Operator;
use crate::reference::NodeId;
use crate::time::Time;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Expr {
    Prop(String),
    Const(bool),
    Unary(Operator, NodeId),
    Binary(Operator, NodeId, NodeId),
}

impl Expr {
    pub fn operator(&self) -> Option<Operator> {
        match *self {
            Expr::Unary(op, _) | Expr::Binary(op, _, _) => Some(op),
            Expr::Prop(_) | Expr::Const(_) => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Expr::Prop(_) | Expr::Const(_))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let (first, second) = match *self {
            Expr::Unary(_, c) => (Some(c), None),
            Expr::Binary(_, l, r) => (Some(l), Some(r)),
            Expr::Prop(_) | Expr::Const(_) => (None, None),
        };
        first.into_iter().chain(second)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    expr: Expr,
    parent: Option<NodeId>,
    time: Time,
    separated: bool,
}

impl Node {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn time(&self) -> Time {
        self.time
    }

    pub fn is_separated(&self) -> bool {
        self.separated
    }
}

/// Arena holding a formula tree.
#[derive(Debug, Clone, Default)]
pub struct Formula {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

// Construction
impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a formula with `f`, using the returned node as the root.
    ///
    /// ```
    /// use gabbay_rs::formula::Formula;
    /// use gabbay_rs::operator::Operator;
    ///
    /// let f = Formula::build(|f| {
    ///     let a = f.prop("a");
    ///     let b = f.prop("b");
    ///     f.binary(Operator::Until, a, b)
    /// });
    /// assert_eq!(f.to_string(), "aUb");
    /// ```
    pub fn build<F>(f: F) -> Self
    where
        F: FnOnce(&mut Formula) -> NodeId,
    {
        let mut formula = Formula::new();
        let root = f(&mut formula);
        formula.set_root(root);
        formula
    }

    fn alloc(&mut self, expr: Expr) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        let (time, separated) = self.attributes(&expr);
        for c in expr.children() {
            self.nodes[c.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            expr,
            parent: None,
            time,
            separated,
        });
        id
    }

    pub fn prop(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(Expr::Prop(name.into()))
    }

    pub fn constant(&mut self, value: bool) -> NodeId {
        self.alloc(Expr::Const(value))
    }

    /// Creates a unary node over `operand`, adopting it as a child.
    ///
    /// # Panics
    ///
    /// Panics if `op` is not unary.
    pub fn unary(&mut self, op: Operator, operand: NodeId) -> NodeId {
        assert!(op.is_unary(), "Operator '{}' is not unary", op);
        self.alloc(Expr::Unary(op, operand))
    }

    /// Creates a binary node over `lhs` and `rhs`, adopting them as children.
    ///
    /// # Panics
    ///
    /// Panics if `op` is not binary.
    pub fn binary(&mut self, op: Operator, lhs: NodeId, rhs: NodeId) -> NodeId {
        assert!(op.is_binary(), "Operator '{}' is not binary", op);
        assert_ne!(lhs, rhs, "Operands of '{}' must be distinct nodes", op);
        self.alloc(Expr::Binary(op, lhs, rhs))
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        self.unary(Operator::Not, operand)
    }

    pub fn and(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.binary(Operator::And, lhs, rhs)
    }

    pub fn or(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.binary(Operator::Or, lhs, rhs)
    }

    /// Builds the left-nested chain `((x1 op x2) op x3) ...`.
    ///
    /// A single operand is returned as is.
    ///
    /// # Panics
    ///
    /// Panics if `op` is not `&`/`|` or if `operands` is empty.
    pub fn new_chain(&mut self, op: Operator, operands: &[NodeId]) -> NodeId {
        assert!(op.is_junction(), "Chains are built with '&' or '|', not '{}'", op);
        let (&first, rest) = match operands.split_first() {
            Some(split) => split,
            None => panic!("Cannot build a '{}' chain without operands", op),
        };
        rest.iter().fold(first, |acc, &x| self.binary(op, acc, x))
    }

    pub fn new_conjunction(&mut self, operands: &[NodeId]) -> NodeId {
        self.new_chain(Operator::And, operands)
    }

    pub fn new_disjunction(&mut self, operands: &[NodeId]) -> NodeId {
        self.new_chain(Operator::Or, operands)
    }
}

// Accessors
impl Formula {
    /// The tracked root.
    ///
    /// # Panics
    ///
    /// Panics if no root has been set.
    pub fn root(&self) -> NodeId {
        match self.root {
            Some(root) => root,
            None => panic!("Formula has no root"),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` has a parent.
    pub fn set_root(&mut self, id: NodeId) {
        assert!(self.parent(id).is_none(), "Root {} must not have a parent", id);
        self.root = Some(id);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn expr(&self, id: NodeId) -> &Expr {
        &self.node(id).expr
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn time(&self, id: NodeId) -> Time {
        self.node(id).time
    }

    pub fn is_separated(&self, id: NodeId) -> bool {
        self.node(id).separated
    }

    pub fn needs_separation(&self, id: NodeId) -> bool {
        !self.is_separated(id)
    }

    pub fn is_pure(&self, id: NodeId) -> bool {
        self.time(id).is_pure()
    }

    pub fn operator(&self, id: NodeId) -> Option<Operator> {
        self.expr(id).operator()
    }

    pub fn has_operator(&self, id: NodeId, op: Operator) -> bool {
        self.operator(id) == Some(op)
    }

    pub fn is_constant(&self, id: NodeId, value: bool) -> bool {
        *self.expr(id) == Expr::Const(value)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.expr(id).children()
    }

    /// # Panics
    ///
    /// Panics if `id` is not a unary node.
    pub fn operand(&self, id: NodeId) -> NodeId {
        match *self.expr(id) {
            Expr::Unary(_, c) => c,
            _ => panic!("Node {} is not unary", id),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is not a binary node.
    pub fn left(&self, id: NodeId) -> NodeId {
        match *self.expr(id) {
            Expr::Binary(_, l, _) => l,
            _ => panic!("Node {} is not binary", id),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is not a binary node.
    pub fn right(&self, id: NodeId) -> NodeId {
        match *self.expr(id) {
            Expr::Binary(_, _, r) => r,
            _ => panic!("Node {} is not binary", id),
        }
    }

    /// Number of allocated nodes, detached ones included.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes reachable from the root.
    pub fn size(&self) -> usize {
        self.descendants(self.root()).len()
    }

    /// All nodes of the subtree rooted at `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut res = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            res.push(n);
            let children: Vec<_> = self.children(n).collect();
            stack.extend(children.into_iter().rev());
        }
        res
    }
}

fn nests(op: Operator, operand: Time) -> bool {
    match op.time() {
        Time::Past => operand.has_future(),
        Time::Future => operand.has_past(),
        _ => false,
    }
}

// Mutation
impl Formula {
    fn attributes(&self, expr: &Expr) -> (Time, bool) {
        match *expr {
            Expr::Prop(_) | Expr::Const(_) => (Time::Present, true),
            Expr::Unary(op, c) => {
                let t = self.time(c);
                (Time::of_operator(op, t, t), self.is_separated(c) && !nests(op, t))
            }
            Expr::Binary(op, l, r) => {
                let (lt, rt) = (self.time(l), self.time(r));
                let separated =
                    self.is_separated(l) && self.is_separated(r) && !nests(op, lt) && !nests(op, rt);
                (Time::of_operator(op, lt, rt), separated)
            }
        }
    }

    fn refresh_upwards(&mut self, mut id: NodeId) {
        loop {
            let (time, separated) = self.attributes(&self.nodes[id.index()].expr);
            let node = &mut self.nodes[id.index()];
            if node.time == time && node.separated == separated {
                break;
            }
            node.time = time;
            node.separated = separated;
            match node.parent {
                Some(p) => id = p,
                None => break,
            }
        }
    }

    /// Puts `new` in place of `old` and returns `new`.
    ///
    /// The parent slot holding `old` is relinked to `new`; if `old` is the root,
    /// `new` becomes the root. `old` is left detached.
    ///
    /// # Panics
    ///
    /// Panics if `old` has no parent and is not the root.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> NodeId {
        if old == new {
            return new;
        }
        trace!("replace(old = {}, new = {})", old, new);
        match self.parent(old) {
            Some(p) => {
                match &mut self.nodes[p.index()].expr {
                    Expr::Unary(_, c) if *c == old => *c = new,
                    Expr::Binary(_, l, _) if *l == old => *l = new,
                    Expr::Binary(_, _, r) if *r == old => *r = new,
                    _ => panic!("Parent {} does not hold {} as a child", p, old),
                }
                self.nodes[new.index()].parent = Some(p);
                self.nodes[old.index()].parent = None;
                self.refresh_upwards(p);
            }
            None => {
                assert_eq!(
                    self.root,
                    Some(old),
                    "Cannot replace {}: it has no parent and is not the root",
                    old
                );
                self.nodes[new.index()].parent = None;
                self.root = Some(new);
            }
        }
        new
    }

    /// Takes `id` out of the tree, leaving a placeholder in its slot.
    ///
    /// Returns the placeholder, to be [replaced][Formula::replace] by a node that
    /// may now adopt `id` as a child.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        let hole = self.constant(false);
        self.replace(id, hole)
    }

    /// Creates an independent, detached copy of the subtree rooted at `id`.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let expr = match self.expr(id).clone() {
            Expr::Unary(op, c) => Expr::Unary(op, self.deep_copy(c)),
            Expr::Binary(op, l, r) => {
                let l = self.deep_copy(l);
                let r = self.deep_copy(r);
                Expr::Binary(op, l, r)
            }
            atom => atom,
        };
        self.alloc(expr)
    }

    /// Creates `!x` over a fresh copy of `x`.
    pub fn negate(&mut self, id: NodeId) -> NodeId {
        let copy = self.deep_copy(id);
        self.not(copy)
    }

    fn copy_from(&mut self, src: &Formula, id: NodeId, map: &mut HashMap<NodeId, NodeId>) -> NodeId {
        let expr = match src.expr(id) {
            Expr::Prop(name) => Expr::Prop(name.clone()),
            Expr::Const(value) => Expr::Const(*value),
            Expr::Unary(op, c) => Expr::Unary(*op, self.copy_from(src, *c, map)),
            Expr::Binary(op, l, r) => {
                let l = self.copy_from(src, *l, map);
                let r = self.copy_from(src, *r, map);
                Expr::Binary(*op, l, r)
            }
        };
        let new = self.alloc(expr);
        map.insert(id, new);
        new
    }

    /// Copies the subtree rooted at `id` into a fresh arena.
    ///
    /// Returns the new formula (rooted at the copy of `id`) and the mapping from
    /// handles of `self` to handles of the copy.
    pub fn subtree(&self, id: NodeId) -> (Formula, HashMap<NodeId, NodeId>) {
        let mut res = Formula::new();
        let mut map = HashMap::new();
        let root = res.copy_from(self, id, &mut map);
        res.root = Some(root);
        (res, map)
    }

    /// Grafts a detached copy of `other`'s subtree rooted at `id` into this arena.
    pub fn import(&mut self, other: &Formula, id: NodeId) -> NodeId {
        self.copy_from(other, id, &mut HashMap::new())
    }

    /// Returns a copy of the tree without detached nodes.
    pub fn compact(&self) -> Formula {
        self.subtree(self.root()).0
    }
}

// Queries
impl Formula {
    /// Whether `ancestor` is a proper ancestor of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.root();
        id == root || self.is_ancestor_of(root, id)
    }

    /// Whether `id` lies in the left operand of the binary node `x`.
    pub fn is_in_left_subtree(&self, x: NodeId, id: NodeId) -> bool {
        let l = self.left(x);
        id == l || self.is_ancestor_of(l, id)
    }

    /// Whether `id` lies in the right operand of the binary node `x`.
    pub fn is_in_right_subtree(&self, x: NodeId, id: NodeId) -> bool {
        let r = self.right(x);
        id == r || self.is_ancestor_of(r, id)
    }

    /// Operands of the maximal `&`/`|` chain rooted at `id`, left to right.
    ///
    /// For `a&b&(c&d)` this is `[a, b, c, d]`. Any other node is its own only operand.
    pub fn flatten_chain(&self, id: NodeId) -> Vec<NodeId> {
        let op = match *self.expr(id) {
            Expr::Binary(op, _, _) if op.is_junction() => op,
            _ => return vec![id],
        };
        let mut res = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            match *self.expr(n) {
                Expr::Binary(o, l, r) if o == op => {
                    stack.push(r);
                    stack.push(l);
                }
                _ => res.push(n),
            }
        }
        res
    }

    /// Structural equality of two subtrees of this arena.
    pub fn equal_to(&self, a: NodeId, b: NodeId) -> bool {
        a == b || self.equal_across(a, self, b)
    }

    /// Structural equality of a subtree of this arena and a subtree of `other`.
    pub fn equal_across(&self, a: NodeId, other: &Formula, b: NodeId) -> bool {
        match (self.expr(a), other.expr(b)) {
            (Expr::Prop(x), Expr::Prop(y)) => x == y,
            (Expr::Const(x), Expr::Const(y)) => x == y,
            (Expr::Unary(o1, c1), Expr::Unary(o2, c2)) => o1 == o2 && self.equal_across(*c1, other, *c2),
            (Expr::Binary(o1, l1, r1), Expr::Binary(o2, l2, r2)) => {
                o1 == o2 && self.equal_across(*l1, other, *l2) && self.equal_across(*r1, other, *r2)
            }
            _ => false,
        }
    }

    /// Whether one of `a`, `b` is syntactically the negation of the other.
    pub fn opposite(&self, a: NodeId, b: NodeId) -> bool {
        let negates = |x: NodeId, y: NodeId| match *self.expr(x) {
            Expr::Unary(Operator::Not, c) => self.equal_to(c, y),
            _ => false,
        };
        negates(a, b) || negates(b, a)
    }

    /// Breadth-first search of the outermost `op` nodes in the subtree of `id`.
    ///
    /// Matches are not descended into. Other nodes are only descended into when
    /// their time is that of `op` or mixed, so the search never enters a subtree
    /// that cannot contain `op`.
    pub fn search_operators(&self, id: NodeId, op: Operator) -> Vec<NodeId> {
        let mut res = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(n) = queue.pop_front() {
            if self.has_operator(n, op) {
                res.push(n);
                continue;
            }
            let time = self.time(n);
            if time == op.time() || time == Time::Mixed {
                queue.extend(self.children(n));
            }
        }
        res
    }

    /// First `op` node found breadth-first below `id`, without crossing `mirror(op)` nodes.
    pub fn next_operator(&self, id: NodeId, op: Operator) -> Option<NodeId> {
        let stop = op.mirror();
        let mut queue: VecDeque<NodeId> = self.children(id).collect();
        while let Some(n) = queue.pop_front() {
            match self.operator(n) {
                Some(o) if o == op => return Some(n),
                Some(o) if Some(o) != stop => queue.extend(self.children(n)),
                _ => {}
            }
        }
        None
    }

    /// Checks the back-references and cached attributes of every node reachable from the root.
    pub fn is_consistent(&self) -> bool {
        let root = self.root();
        if self.parent(root).is_some() {
            return false;
        }
        self.descendants(root).into_iter().all(|n| {
            self.children(n).all(|c| self.parent(c) == Some(n))
                && self.attributes(self.expr(n)) == (self.time(n), self.is_separated(n))
        })
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.equal_across(self.root(), other, other.root())
    }
}

impl Eq for Formula {}

/// A subtree of a [`Formula`], ready for printing.
pub struct Rendered<'a> {
    formula: &'a Formula,
    id: NodeId,
}

impl Formula {
    pub fn display(&self, id: NodeId) -> Rendered<'_> {
        Rendered { formula: self, id }
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        match *self.expr(id) {
            Expr::Prop(ref name) => write!(f, "{}", name),
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Unary(op, c) => {
                write!(f, "{}", op)?;
                let bare = !matches!(self.expr(c), Expr::Binary(..));
                self.write_operand(f, c, bare)
            }
            Expr::Binary(op, l, r) => {
                let bare = |n: NodeId| match *self.expr(n) {
                    Expr::Binary(o, _, _) => op.is_junction() && o == op,
                    _ => true,
                };
                self.write_operand(f, l, bare(l))?;
                write!(f, "{}", op)?;
                self.write_operand(f, r, bare(r))
            }
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, id: NodeId, bare: bool) -> fmt::Result {
        if bare {
            self.write_node(f, id)
        } else {
            write!(f, "(")?;
            self.write_node(f, id)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formula.write_node(f, self.id)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root())
    }
}
