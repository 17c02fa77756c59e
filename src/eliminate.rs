//! The eight elimination rules.
//!
//! Let `x = L θ R` with `θ ∈ {S, U}` and `θ'` its mirror. Once the junctions of `x`
//! are arranged, every nested `θ'` occurrence sits in an `&`-chain of `L` or an
//! `|`-chain of `R`, possibly negated. Writing `a` for the rest of the left chain,
//! `q` for the rest of the right chain and `A θ' B` for the nested occurrence, the
//! shape of `x` is one of:
//!
//! | case | shape                                |
//! |------|--------------------------------------|
//! | 1    | `(a & (Aθ'B)) θ q`                   |
//! | 2    | `(a & !(Aθ'B)) θ q`                  |
//! | 3    | `a θ (q \| (Aθ'B))`                  |
//! | 4    | `a θ (q \| !(Aθ'B))`                 |
//! | 5    | `(a & (Aθ'B)) θ (q \| (Aθ'B))`       |
//! | 6    | `(a & !(Aθ'B)) θ (q \| (Aθ'B))`      |
//! | 7    | `(a & (Aθ'B)) θ (q \| !(Aθ'B))`      |
//! | 8    | `(a & !(Aθ'B)) θ (q \| !(Aθ'B))`     |
//!
//! Cases 5 to 8 require both occurrences to have structurally equal operands.
//!
//! Each case is replaced by a fixed boolean combination of formulas in which `θ'`
//! only occurs outside of `θ`-operands (or inside them with no further nesting of
//! `θ'` below `θ`). The templates only use `θ`, `θ'`, `&`, `|`, `!` and constants,
//! so one formulation serves `S` and `U` alike.

use log::debug;

use crate::formula::Formula;
use crate::junction::{junction_case, Junction, Side};
use crate::operator::Operator;
use crate::reference::NodeId;

/// The canonical sub-formulas `(a, A, B, q)` of a nesting.
#[derive(Debug, Copy, Clone)]
pub struct Parts {
    pub a: NodeId,
    pub big_a: NodeId,
    pub big_b: NodeId,
    pub q: NodeId,
}

/// Classifies the nesting described by a left and/or right junction of the same `x`.
///
/// Returns the elimination case in `1..=8`, or 0 when no rule applies as is.
///
/// # Panics
///
/// Panics if the junctions do not start from the same `S`/`U` node.
pub fn classify(f: &Formula, lj: Option<&Junction>, rj: Option<&Junction>) -> u8 {
    let x = match (lj, rj) {
        (Some(l), Some(r)) => {
            assert_eq!(l.x(), r.x(), "Junctions of a nesting must share their root");
            l.x()
        }
        (Some(j), None) | (None, Some(j)) => j.x(),
        (None, None) => return 0,
    };
    assert!(
        f.operator(x).map_or(false, Operator::is_since_until),
        "Classification needs an 'S' or 'U' node, got '{}'",
        f.display(x)
    );
    let same_operands = |l: &Junction, r: &Junction| {
        let (ly, ry) = (l.y(), r.y());
        f.equal_to(f.left(ly), f.left(ry)) && f.equal_to(f.right(ly), f.right(ry))
    };
    match (junction_case(f, lj), junction_case(f, rj)) {
        (1, 0) => 1,
        (2, 0) => 2,
        (0, 1) => 3,
        (0, 2) => 4,
        (lc @ 1..=2, rc @ 1..=2) => match (lj, rj) {
            (Some(l), Some(r)) if same_operands(l, r) => match (lc, rc) {
                (1, 1) => 5,
                (2, 1) => 6,
                (1, 2) => 7,
                _ => 8,
            },
            _ => 0,
        },
        _ => 0,
    }
}

/// Classifies `x` using its first left and first right junction.
///
/// ```
/// use gabbay_rs::eliminate::nesting_case;
/// use gabbay_rs::formula::Formula;
///
/// let f: Formula = "(a & (b U c)) S q".parse().unwrap();
/// assert_eq!(nesting_case(&f, f.root()), 1);
/// ```
///
/// # Panics
///
/// Panics if `x` is not an `S`/`U` node.
pub fn nesting_case(f: &Formula, x: NodeId) -> u8 {
    let ljs = Junction::collect(f, x, Side::Left);
    let rjs = Junction::collect(f, x, Side::Right);
    if ljs.is_empty() && rjs.is_empty() {
        assert!(
            f.operator(x).map_or(false, Operator::is_since_until),
            "Classification needs an 'S' or 'U' node, got '{}'",
            f.display(x)
        );
    }
    classify(f, ljs.first(), rjs.first())
}

/// `y`, or its negation.
fn literal(f: &Formula, j: &Junction) -> NodeId {
    match f.parent(j.y()) {
        Some(p) if f.has_operator(p, Operator::Not) => p,
        _ => j.y(),
    }
}

/// Splits the chain on the junction's side of `x` into the rest of the chain and the
/// (possibly negated) nested occurrence, and reinstalls it as `rest op literal`.
fn split_chain(f: &mut Formula, j: &Junction) -> NodeId {
    let x = j.x();
    let chain = j.side().child(f, x);
    let lit = literal(f, j);
    let rest: Vec<NodeId> = f.flatten_chain(chain).into_iter().filter(|&n| n != lit).collect();
    let rest = match rest.as_slice() {
        [] => panic!("Nested operator '{}' is not part of a chain", f.display(lit)),
        [single] => *single,
        _ => f.new_chain(j.operator(), &rest),
    };
    let new = f.binary(j.operator(), rest, lit);
    f.replace(chain, new);
    rest
}

/// Extracts `(a, A, B, q)` from the nesting, reshaping `x` into `(a & y) θ (q | y)`.
pub fn extract(f: &mut Formula, lj: Option<&Junction>, rj: Option<&Junction>) -> Parts {
    let j = match lj.or(rj) {
        Some(j) => *j,
        None => panic!("Extraction needs at least one junction"),
    };
    let x = j.x();
    let a = match lj {
        Some(lj) => split_chain(f, lj),
        None => f.left(x),
    };
    let q = match rj {
        Some(rj) => split_chain(f, rj),
        None => f.right(x),
    };
    Parts {
        a,
        big_a: f.left(j.y()),
        big_b: f.right(j.y()),
        q,
    }
}

/// Classifies, extracts and rewrites the nesting at `x`.
///
/// Returns the detached replacement for `x`; the caller installs it with
/// [`Formula::replace`].
///
/// # Panics
///
/// Panics if the nesting does not classify.
pub fn eliminate(f: &mut Formula, lj: Option<&Junction>, rj: Option<&Junction>) -> NodeId {
    let case = classify(f, lj, rj);
    assert_ne!(case, 0, "Nesting does not match any elimination rule");
    let x = match lj.or(rj) {
        Some(j) => j.x(),
        None => unreachable!(),
    };
    debug!("eliminate(case = {}, x = {})", case, f.display(x));
    let theta = match f.operator(x) {
        Some(op) => op,
        None => unreachable!(),
    };
    let parts = extract(f, lj, rj);
    apply_template(f, case, theta, parts)
}

/// Builds the replacement of elimination `case` for operator `theta` over `parts`.
///
/// Every use of a part is a fresh copy, so `parts` stay untouched.
///
/// # Panics
///
/// Panics if `case` is not in `1..=8` or `theta` is not `S`/`U`.
pub fn apply_template(f: &mut Formula, case: u8, theta: Operator, parts: Parts) -> NodeId {
    assert!(theta.is_since_until(), "Templates are defined for 'S' and 'U', not '{}'", theta);
    let mut t = Template {
        f,
        s: theta,
        u: theta.mirrored(),
        parts,
    };
    match case {
        1 => t.case1(),
        2 => t.case2(),
        3 => t.case3(),
        4 => t.case4(),
        5 => t.case5(),
        6 => t.case6(),
        7 => t.case7(),
        8 => t.case8(),
        _ => panic!("Unknown elimination case {}", case),
    }
}

struct Template<'a> {
    f: &'a mut Formula,
    s: Operator,
    u: Operator,
    parts: Parts,
}

impl Template<'_> {
    fn a(&mut self) -> NodeId {
        self.f.deep_copy(self.parts.a)
    }

    fn q(&mut self) -> NodeId {
        self.f.deep_copy(self.parts.q)
    }

    fn big_a(&mut self) -> NodeId {
        self.f.deep_copy(self.parts.big_a)
    }

    fn big_b(&mut self) -> NodeId {
        self.f.deep_copy(self.parts.big_b)
    }

    fn not_a(&mut self) -> NodeId {
        let a = self.a();
        self.f.not(a)
    }

    fn not_q(&mut self) -> NodeId {
        let q = self.q();
        self.f.not(q)
    }

    fn not_big_a(&mut self) -> NodeId {
        let a = self.big_a();
        self.f.not(a)
    }

    fn not_big_b(&mut self) -> NodeId {
        let b = self.big_b();
        self.f.not(b)
    }

    fn s(&mut self, l: NodeId, r: NodeId) -> NodeId {
        self.f.binary(self.s, l, r)
    }

    /// `a θ r`
    fn sa(&mut self, r: NodeId) -> NodeId {
        let a = self.a();
        self.s(a, r)
    }

    /// `A θ' B`
    fn uab(&mut self) -> NodeId {
        let a = self.big_a();
        let b = self.big_b();
        self.f.binary(self.u, a, b)
    }

    fn not_uab(&mut self) -> NodeId {
        let u = self.uab();
        self.f.not(u)
    }

    fn not(&mut self, x: NodeId) -> NodeId {
        self.f.not(x)
    }

    fn and(&mut self, l: NodeId, r: NodeId) -> NodeId {
        self.f.and(l, r)
    }

    fn or(&mut self, l: NodeId, r: NodeId) -> NodeId {
        self.f.or(l, r)
    }

    fn conj(&mut self, xs: &[NodeId]) -> NodeId {
        self.f.new_conjunction(xs)
    }

    fn disj(&mut self, xs: &[NodeId]) -> NodeId {
        self.f.new_disjunction(xs)
    }

    /// `a θ true`: `a` held at some point (strictly) on the θ side.
    fn once_a(&mut self) -> NodeId {
        let t = self.f.constant(true);
        self.sa(t)
    }

    /// `A | (B & (A θ' B))`
    fn d(&mut self) -> NodeId {
        let a = self.big_a();
        let b = self.big_b();
        let u = self.uab();
        let bu = self.and(b, u);
        self.or(a, bu)
    }

    /// `(a & (Aθ'B)) θ q`
    fn case1(&mut self) -> NodeId {
        // (a θ q) & (a θ B) & B & (A θ' B)
        let q = self.q();
        let saq = self.sa(q);
        let b = self.big_b();
        let sab = self.sa(b);
        let b = self.big_b();
        let u = self.uab();
        let d1 = self.conj(&[saq, sab, b, u]);

        // A & (a θ (B & q))
        let a = self.big_a();
        let (b, q) = (self.big_b(), self.q());
        let bq = self.and(b, q);
        let s = self.sa(bq);
        let d2 = self.and(a, s);

        // (A & q & (a θ B) & (a θ q)) θ q
        let a = self.big_a();
        let q = self.q();
        let b = self.big_b();
        let sab = self.sa(b);
        let q2 = self.q();
        let saq = self.sa(q2);
        let lhs = self.conj(&[a, q, sab, saq]);
        let q = self.q();
        let d3 = self.s(lhs, q);

        self.disj(&[d1, d2, d3])
    }

    /// `a θ (q & !A)`
    fn sa_q_not_a(&mut self) -> NodeId {
        let q = self.q();
        let na = self.not_big_a();
        let r = self.and(q, na);
        self.sa(r)
    }

    /// `(a & !(Aθ'B)) θ q`
    fn case2(&mut self) -> NodeId {
        // (a θ (q & !A)) & !A & !(A θ' B)
        let p = self.sa_q_not_a();
        let na = self.not_big_a();
        let nu = self.not_uab();
        let d1 = self.conj(&[p, na, nu]);

        // !A & !B & (a θ (q & !A))
        let na = self.not_big_a();
        let nb = self.not_big_b();
        let p = self.sa_q_not_a();
        let d2 = self.conj(&[na, nb, p]);

        // (!A & !B & q & (a θ (q & !A))) θ q
        let na = self.not_big_a();
        let nb = self.not_big_b();
        let q = self.q();
        let p = self.sa_q_not_a();
        let lhs = self.conj(&[na, nb, q, p]);
        let q = self.q();
        let d3 = self.s(lhs, q);

        self.disj(&[d1, d2, d3])
    }

    /// `a θ (q | (Aθ'B))`
    fn case3(&mut self) -> NodeId {
        // bad1 = (!q & !a) θ (B & !A & !a)
        let bad1 = |t: &mut Self| {
            let nq = t.not_q();
            let na = t.not_a();
            let l = t.and(nq, na);
            let b = t.big_b();
            let nba = t.not_big_a();
            let na = t.not_a();
            let r = t.conj(&[b, nba, na]);
            t.s(l, r)
        };
        // bad2 = (!a & !A & !B & bad1) θ !a
        let bad2 = |t: &mut Self| {
            let na = t.not_a();
            let nba = t.not_big_a();
            let nbb = t.not_big_b();
            let b1 = bad1(t);
            let l = t.conj(&[na, nba, nbb, b1]);
            let r = t.not_a();
            t.s(l, r)
        };

        // d & (a θ true) & !bad2
        let d = self.d();
        let oa = self.once_a();
        let b2 = bad2(self);
        let nb2 = self.not(b2);
        let d1 = self.conj(&[d, oa, nb2]);

        // (a θ true) & !bad1 & !bad2
        let oa = self.once_a();
        let b1 = bad1(self);
        let nb1 = self.not(b1);
        let b2 = bad2(self);
        let nb2 = self.not(b2);
        let d2 = self.conj(&[oa, nb1, nb2]);

        self.disj(&[d1, d2])
    }

    /// `a θ (q | !(Aθ'B))`
    fn case4(&mut self) -> NodeId {
        // !((!q & (A θ' B) & !a) θ !a) & (a θ true)
        let nq = self.not_q();
        let u = self.uab();
        let na = self.not_a();
        let l = self.conj(&[nq, u, na]);
        let na = self.not_a();
        let s = self.s(l, na);
        let ns = self.not(s);
        let oa = self.once_a();
        self.and(ns, oa)
    }

    /// `!q θ !A`
    fn s_nq_na(&mut self) -> NodeId {
        let nq = self.not_q();
        let na = self.not_big_a();
        self.s(nq, na)
    }

    /// `(A & (a θ B)) θ !(!A & !B & (!q θ !A))`
    fn p10(&mut self) -> NodeId {
        let a = self.big_a();
        let b = self.big_b();
        let sab = self.sa(b);
        let l = self.and(a, sab);
        let na = self.not_big_a();
        let nb = self.not_big_b();
        let s = self.s_nq_na();
        let b0 = self.conj(&[na, nb, s]);
        let r = self.not(b0);
        self.s(l, r)
    }

    /// `(a & (Aθ'B)) θ (q | (Aθ'B))`
    fn case5(&mut self) -> NodeId {
        // (a θ B) & d
        let b = self.big_b();
        let sab = self.sa(b);
        let d = self.d();
        let d1 = self.and(sab, d);

        // p10 & d
        let p = self.p10();
        let d = self.d();
        let d2 = self.and(p, d);

        // p10 & !d & !(!q θ !A)
        let p = self.p10();
        let d = self.d();
        let nd = self.not(d);
        let s = self.s_nq_na();
        let ns = self.not(s);
        let d3 = self.conj(&[p, nd, ns]);

        self.disj(&[d1, d2, d3])
    }

    /// `q | (A θ' B)`
    fn q_or_uab(&mut self) -> NodeId {
        let q = self.q();
        let u = self.uab();
        self.or(q, u)
    }

    /// `(a & !(Aθ'B)) θ (q | (Aθ'B))`
    fn case6(&mut self) -> NodeId {
        // !A & !B & (a θ (q & !A))
        let na = self.not_big_a();
        let nb = self.not_big_b();
        let p = self.sa_q_not_a();
        let d1 = self.conj(&[na, nb, p]);

        // (!A & !B & (a θ (q & !A)) & (q | AθB)) θ (q | AθB)
        let na = self.not_big_a();
        let nb = self.not_big_b();
        let p = self.sa_q_not_a();
        let qu = self.q_or_uab();
        let lhs = self.conj(&[na, nb, p, qu]);
        let qu = self.q_or_uab();
        let d2 = self.s(lhs, qu);

        // (a θ (q & !A)) & !A & !(A θ' B)
        let p = self.sa_q_not_a();
        let na = self.not_big_a();
        let nu = self.not_uab();
        let d3 = self.conj(&[p, na, nu]);

        self.disj(&[d1, d2, d3])
    }

    /// `q | !(A θ' B)`
    fn q_or_not_uab(&mut self) -> NodeId {
        let q = self.q();
        let nu = self.not_uab();
        self.or(q, nu)
    }

    /// `a θ (q & B)`
    fn sa_q_b(&mut self) -> NodeId {
        let q = self.q();
        let b = self.big_b();
        let r = self.and(q, b);
        self.sa(r)
    }

    /// `(a & (Aθ'B)) θ (q | !(Aθ'B))`
    fn case7(&mut self) -> NodeId {
        // (A & (q | !AθB) & (a θ (q & B))) θ (q | !AθB)
        let a = self.big_a();
        let qn = self.q_or_not_uab();
        let p = self.sa_q_b();
        let lhs = self.conj(&[a, qn, p]);
        let qn = self.q_or_not_uab();
        let d1 = self.s(lhs, qn);

        // (a θ (q & B)) & A
        let p = self.sa_q_b();
        let a = self.big_a();
        let d2 = self.and(p, a);

        // (a θ (q & B)) & B & (A θ' B)
        let p = self.sa_q_b();
        let b = self.big_b();
        let u = self.uab();
        let d3 = self.conj(&[p, b, u]);

        self.disj(&[d1, d2, d3])
    }

    /// `!a | (A θ' B)`
    fn not_a_or_uab(&mut self) -> NodeId {
        let na = self.not_a();
        let u = self.uab();
        self.or(na, u)
    }

    /// `(a & !(Aθ'B)) θ (q | !(Aθ'B))`
    fn case8(&mut self) -> NodeId {
        // !(!a | AθB) θ true, negated: the dual "always" of `!a | AθB`
        let p = self.not_a_or_uab();
        let np = self.not(p);
        let t = self.f.constant(true);
        let s = self.s(np, t);
        let d1 = self.not(s);

        // (!q & (A θ' B) & !a) θ (!a | AθB)
        let nq = self.not_q();
        let u = self.uab();
        let na = self.not_a();
        let lhs = self.conj(&[nq, u, na]);
        let p = self.not_a_or_uab();
        let d2 = self.s(lhs, p);

        // (!q & (A θ' B)) θ (!a | AθB)
        let nq = self.not_q();
        let u = self.uab();
        let lhs = self.and(nq, u);
        let p = self.not_a_or_uab();
        let d3 = self.s(lhs, p);

        let d = self.disj(&[d1, d2, d3]);
        self.not(d)
    }
}
