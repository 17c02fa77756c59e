//! The separation driver.
//!
//! [`Separator::separate`] rewrites a formula until no `S` node has an `U` node
//! nested in its operands and vice versa. It works on a stack of *x candidates*:
//! the `S`/`U` nodes that need separation, deepest first, so that the operands of a
//! candidate are separated by the time it is popped.
//!
//! For each candidate `x` the driver collects the junctions on both sides and
//! either:
//!
//! - *eliminates*: when every junction is arranged and sits in an operator chain,
//!   every pairing of a left and/or right junction that classifies to an
//!   elimination case is tried concurrently, each on its own copy of `x`'s
//!   subtree, and each followed by a recursive separation of the result. The first
//!   pairing to finish wins and replaces `x`; the others are interrupted.
//! - or *prepares*: applies Lemma A2 when the operand on a side with junctions
//!   has the wrong chain operator, or else arranges one junction per side, and
//!   pushes the affected nodes again.
//!
//! ```
//! use gabbay_rs::separator::{Separator, SeparatorConfig};
//!
//! let separator = Separator::new(SeparatorConfig::default()).unwrap();
//! let f = separator.separate_text("a U (b S c)").unwrap();
//! assert!(f.is_separated(f.root()));
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::iproduct;
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::convert::convert;
use crate::eliminate::{classify, eliminate};
use crate::error::{Error, Result};
use crate::formula::{Expr, Formula};
use crate::junction::{Junction, Side};
use crate::lemmas::{lemma_a2_and, lemma_a2_or, merge_siblings, needs_a2_and, needs_a2_or};
use crate::parse::parse;
use crate::reference::NodeId;
use crate::simplify::{simplify_formula, simplify_subtree};

#[derive(Debug, Clone)]
pub struct SeparatorConfig {
    /// Size of the pool racing elimination candidates (`None`: one per core).
    pub workers: Option<usize>,
    /// Simplify the operands of each candidate, and the final result.
    pub simplify: bool,
    /// Merge siblings of the final result with reversed Lemma A2.
    pub merge_siblings: bool,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            workers: None,
            simplify: true,
            merge_siblings: false,
        }
    }
}

/// Cooperative cancellation flag.
///
/// An interrupt is set when its own flag or the flag of any of its ancestors is
/// set. The driver checks it before each step.
#[derive(Debug, Default)]
pub struct Interrupt<'a> {
    flag: AtomicBool,
    parent: Option<&'a Interrupt<'a>>,
}

impl Interrupt<'static> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Interrupt<'_> {
    /// A new interrupt, also set whenever `self` is.
    pub fn child(&self) -> Interrupt<'_> {
        Interrupt {
            flag: AtomicBool::new(false),
            parent: Some(self),
        }
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        let mut current = Some(self);
        while let Some(i) = current {
            if i.flag.load(Ordering::Relaxed) {
                return true;
            }
            current = i.parent;
        }
        false
    }
}

type Candidate = (Option<Junction>, Option<Junction>);

pub struct Separator {
    config: SeparatorConfig,
    pool: rayon::ThreadPool,
}

impl Separator {
    /// Creates a separator with its own worker pool.
    pub fn new(config: SeparatorConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.unwrap_or(0))
            .thread_name(|i| format!("separator-{}", i))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SeparatorConfig {
        &self.config
    }

    /// Returns a separated formula equivalent to `f`.
    pub fn separate(&self, f: &Formula) -> Formula {
        let interrupt = Interrupt::new();
        match self.separate_interruptible(f, &interrupt) {
            Ok(res) => res,
            Err(_) => unreachable!("nobody else holds the interrupt"),
        }
    }

    /// Like [`separate`][Separator::separate], giving up with [`Error::Interrupted`]
    /// once `interrupt` is set.
    pub fn separate_interruptible(&self, f: &Formula, interrupt: &Interrupt<'_>) -> Result<Formula> {
        info!("separate({})", f);
        let mut res = convert(f);
        if !self.run(&mut res, interrupt) {
            info!("separation interrupted");
            return Err(Error::Interrupted);
        }
        if self.config.simplify {
            simplify_formula(&mut res);
        }
        if self.config.merge_siblings {
            merge_siblings(&mut res);
        }
        let res = res.compact();
        check_separated(&res);
        info!("separated: {} (size = {})", res, res.size());
        Ok(res)
    }

    /// Parses and separates `input`.
    pub fn separate_text(&self, input: &str) -> Result<Formula> {
        let f = parse(input)?;
        Ok(self.separate(&f))
    }

    /// The worklist loop. Returns `false` if interrupted.
    fn run(&self, f: &mut Formula, interrupt: &Interrupt<'_>) -> bool {
        let mut xs = x_stack(f, f.root());
        while let Some(x) = xs.pop() {
            if interrupt.is_set() {
                debug!("run: interrupted with {} candidates left", xs.len() + 1);
                return false;
            }
            if !f.is_attached(x) || f.is_separated(x) {
                continue;
            }
            trace!("run: x = {} ({} candidates left)", f.display(x), xs.len());
            if self.config.simplify {
                simplify_children(f, x);
            }
            let op = match f.operator(x) {
                Some(op) => op,
                None => unreachable!(),
            };

            let ljs = Junction::collect(f, x, Side::Left);
            let rjs = Junction::collect(f, x, Side::Right);

            if is_eliminable(f, x, &ljs, &rjs) {
                for js in [&ljs, &rjs] {
                    if let [j] = js.as_slice() {
                        if j.is_immediate_child(f) {
                            j.rewrite_immediate_child(f);
                        }
                    }
                }
                let candidates = candidates(f, &ljs, &rjs);
                if candidates.is_empty() {
                    warn!("No elimination applies to {}", f.display(x));
                    continue;
                }
                match self.race(f, x, &candidates, interrupt) {
                    Some(g) => {
                        let nx = f.import(&g, g.root());
                        f.replace(x, nx);
                        xs.extend(x_stack(f, nx));
                    }
                    None => return false,
                }
            } else if needs_a2_or(f, x) && !ljs.is_empty() {
                let new = lemma_a2_or(f, x);
                xs.extend(f.search_operators(new, op).into_iter().filter(|&n| f.needs_separation(n)));
                f.replace(x, new);
            } else if needs_a2_and(f, x) && !rjs.is_empty() {
                let new = lemma_a2_and(f, x);
                xs.extend(f.search_operators(new, op).into_iter().filter(|&n| f.needs_separation(n)));
                f.replace(x, new);
            } else {
                let mut arranged = false;
                for js in [&ljs, &rjs] {
                    if let Some(mut j) = js.iter().copied().find(|j| !j.is_arranged(f)) {
                        j.arrange(f);
                        arranged = true;
                    }
                }
                if arranged {
                    xs.extend(f.search_operators(x, op).into_iter().filter(|&n| f.needs_separation(n)));
                } else {
                    debug!("run: nothing applies to {}", f.display(x));
                }
            }
        }
        true
    }

    /// Eliminates and separates every candidate concurrently, returning the first
    /// separated replacement of `x`, or `None` if interrupted.
    fn race(&self, f: &Formula, x: NodeId, candidates: &[Candidate], interrupt: &Interrupt<'_>) -> Option<Formula> {
        debug!("race: {} candidates for {}", candidates.len(), f.display(x));
        let race = interrupt.child();
        let winner = self.pool.install(|| {
            candidates.par_iter().find_map_any(|&(lj, rj)| {
                if race.is_set() {
                    return None;
                }
                let (mut g, map) = f.subtree(x);
                let lj = lj.map(|j| j.relocate(&map));
                let rj = rj.map(|j| j.relocate(&map));
                let root = g.root();
                let new = eliminate(&mut g, lj.as_ref(), rj.as_ref());
                g.replace(root, new);
                let mut g = g.compact();
                if self.run(&mut g, &race) {
                    race.set();
                    Some(g)
                } else {
                    None
                }
            })
        });
        match &winner {
            Some(g) => debug!("race: won with {}", g),
            None => debug!("race: interrupted"),
        }
        winner
    }
}

/// `S`/`U` nodes below `id` that need separation, ancestors first.
fn x_stack(f: &Formula, id: NodeId) -> Vec<NodeId> {
    let mut stack = Vec::new();
    let mut queue = VecDeque::from([id]);
    while let Some(n) = queue.pop_front() {
        if f.is_separated(n) {
            continue;
        }
        match *f.expr(n) {
            Expr::Unary(_, c) => queue.push_back(c),
            Expr::Binary(op, l, r) => {
                if op.is_since_until() {
                    stack.push(n);
                }
                queue.push_back(r);
                queue.push_back(l);
            }
            Expr::Prop(_) | Expr::Const(_) => {}
        }
    }
    stack
}

fn simplify_children(f: &mut Formula, x: NodeId) {
    for child in [f.left(x), f.right(x)] {
        if !f.expr(child).is_atomic() {
            simplify_subtree(f, child);
        }
    }
}

fn check_separated(f: &Formula) {
    debug_assert!(f.is_separated(f.root()), "Result '{}' is not separated", f);
}

fn is_eliminable(f: &Formula, x: NodeId, ljs: &[Junction], rjs: &[Junction]) -> bool {
    if ljs.is_empty() && rjs.is_empty() {
        return false;
    }
    if (needs_a2_or(f, x) && !ljs.is_empty()) || (needs_a2_and(f, x) && !rjs.is_empty()) {
        return false;
    }
    ljs.iter()
        .chain(rjs)
        .all(|j| j.is_arranged(f) && j.is_operator_chain(f))
}

/// Pairings of junctions with a nonzero elimination case: both sides first, then
/// each side alone.
fn candidates(f: &Formula, ljs: &[Junction], rjs: &[Junction]) -> Vec<Candidate> {
    let both = iproduct!(ljs.iter(), rjs.iter()).map(|(&l, &r)| (Some(l), Some(r)));
    let left = ljs.iter().map(|&l| (Some(l), None));
    let right = rjs.iter().map(|&r| (None, Some(r)));
    both.chain(left)
        .chain(right)
        .filter(|(l, r)| classify(f, l.as_ref(), r.as_ref()) != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn separator() -> Separator {
        Separator::new(SeparatorConfig {
            workers: Some(2),
            ..SeparatorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_interrupt_chain() {
        let root = Interrupt::new();
        let child = root.child();
        let grandchild = child.child();
        assert!(!grandchild.is_set());
        child.set();
        assert!(grandchild.is_set());
        assert!(child.is_set());
        assert!(!root.is_set());
    }

    #[test]
    fn test_x_stack_order() {
        let f: Formula = "(a S (b U c)) U (d & (e S (f U g)))".parse().unwrap();
        let xs: Vec<String> = x_stack(&f, f.root())
            .into_iter()
            .map(|n| f.display(n).to_string())
            .collect();
        assert_eq!(xs, vec!["(aS(bUc))U(d&(eS(fUg)))", "aS(bUc)", "eS(fUg)"]);
    }

    #[test]
    fn test_separate_case1() {
        let f = separator().separate_text("(a & (b U c)) S q").unwrap();
        assert_eq!(
            f.to_string(),
            "((aSq)&(aSc)&c&(bUc))|(b&(aS(c&q)))|((b&q&(aSc)&(aSq))Sq)"
        );
        assert!(f.is_separated(f.root()));
        assert!(f.is_consistent());
    }

    #[test]
    fn test_separate_every_shape() {
        let s = separator();
        for text in [
            "(a&!(bUc))Sq",
            "aS(q|(bUc))",
            "aS(q|!(bUc))",
            "(a&(bUc))S(q|(bUc))",
            "(a&!(bUc))S(q|(bUc))",
            "(a&(bUc))S(q|!(bUc))",
            "(a&!(bUc))S(q|!(bUc))",
            "aU(bSc)",
            "(a|(bUc))Sq",
            "aS(q&(bUc))",
            "(a&(b|(cUd)))Sq",
        ] {
            let f = s.separate_text(text).unwrap();
            assert!(f.is_separated(f.root()), "{} gives {}", text, f);
            assert!(f.is_consistent());
        }
    }

    #[test]
    fn test_separate_derived_operators() {
        let f = separator().separate_text("G(a -> Y b)").unwrap();
        assert!(f.is_separated(f.root()));
        let g = separator().separate_text("O(a & F b)").unwrap();
        assert!(g.is_separated(g.root()));
    }

    #[test]
    fn test_separated_input_is_kept() {
        let s = separator();
        let f: Formula = "(a S b) & (c U d) | e".parse().unwrap();
        assert_eq!(s.separate(&f), f);
    }

    #[test]
    fn test_separate_is_idempotent() {
        let s = separator();
        let once = s.separate_text("(a & (b U c)) S (q | (d U e))").unwrap();
        let twice = s.separate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_interrupted() {
        let s = separator();
        let f: Formula = "(a & (b U c)) S q".parse().unwrap();
        let interrupt = Interrupt::new();
        interrupt.set();
        assert!(matches!(s.separate_interruptible(&f, &interrupt), Err(Error::Interrupted)));

        let g: Formula = "a S b".parse().unwrap();
        assert!(s.separate_interruptible(&g, &interrupt).is_ok());
    }

    #[test]
    fn test_children_are_simplified() {
        let mut f: Formula = "(a & !!b) S (!false & (q | q))".parse().unwrap();
        let x = f.root();
        simplify_children(&mut f, x);
        assert_eq!(f.to_string(), "(a&b)Sq");
        assert!(f.is_consistent());

        let g = separator().separate_text("(a & !!(b U c)) S (!false & q)").unwrap();
        assert!(g.is_separated(g.root()));
        assert!(!g.to_string().contains("!!"));
        assert!(!g.to_string().contains("!false"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not separated")]
    fn test_check_separated_rejects_nesting() {
        let f: Formula = "a S (b U c)".parse().unwrap();
        check_separated(&f);
    }

    #[test]
    fn test_parse_error() {
        let err = separator().separate_text("a S").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_single_worker() {
        let s = Separator::new(SeparatorConfig {
            workers: Some(1),
            simplify: false,
            merge_siblings: true,
        })
        .unwrap();
        let f = s.separate_text("(a & (b U c)) S (q | (b U c))").unwrap();
        assert!(f.is_separated(f.root()));
        assert!(s.config().merge_siblings);
    }
}
