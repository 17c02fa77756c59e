//! Temporal and boolean operators.
//!
//! Every operator carries a fixed set of static attributes: its arity, the
//! [`Time`] it refers to, whether it is *derived* (expressible through the core
//! set `{!, &, |, S, U}`), its textual image, and its *mirror*.
//!
//! The mirror relation pairs each past operator with its future counterpart
//! (and `&` with `|`):
//!
//! | operator | mirror |
//! |----------|--------|
//! | `&`      | `\|`   |
//! | `S`      | `U`    |
//! | `O`      | `F`    |
//! | `H`      | `G`    |
//! | `Y`      | `X`    |
//!
//! All rewriting rules of the crate are written once for a temporal operator
//! `θ ∈ {S, U}` and its mirror, and serve both orientations.

use std::fmt::{Display, Formatter};

use crate::time::Time;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operator {
    Not,
    And,
    Or,
    Impl,
    Equiv,
    Since,
    Until,
    Unless,
    Once,
    Hist,
    Yest,
    Fin,
    Glob,
    Next,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Impl,
        Operator::Equiv,
        Operator::Since,
        Operator::Until,
        Operator::Unless,
        Operator::Once,
        Operator::Hist,
        Operator::Yest,
        Operator::Fin,
        Operator::Glob,
        Operator::Next,
    ];

    /// Number of operands: 1 for unary operators, 2 for binary ones.
    pub const fn arity(self) -> usize {
        match self {
            Operator::Not
            | Operator::Once
            | Operator::Hist
            | Operator::Yest
            | Operator::Fin
            | Operator::Glob
            | Operator::Next => 1,
            Operator::And
            | Operator::Or
            | Operator::Impl
            | Operator::Equiv
            | Operator::Since
            | Operator::Until
            | Operator::Unless => 2,
        }
    }

    pub const fn is_unary(self) -> bool {
        self.arity() == 1
    }

    pub const fn is_binary(self) -> bool {
        self.arity() == 2
    }

    /// The time an operator refers to: boolean connectives are [`Time::Present`].
    pub const fn time(self) -> Time {
        match self {
            Operator::Since | Operator::Once | Operator::Hist | Operator::Yest => Time::Past,
            Operator::Until | Operator::Unless | Operator::Fin | Operator::Glob | Operator::Next => Time::Future,
            Operator::Not | Operator::And | Operator::Or | Operator::Impl | Operator::Equiv => Time::Present,
        }
    }

    pub const fn is_temporal(self) -> bool {
        !matches!(self.time(), Time::Present)
    }

    /// Whether the operator is one of the two junction operators `&`, `|`.
    pub const fn is_junction(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    /// Whether the operator is one of the two binary temporal operators `S`, `U`.
    pub const fn is_since_until(self) -> bool {
        matches!(self, Operator::Since | Operator::Until)
    }

    /// Whether the operator can be rewritten in terms of `{!, &, |, S, U}`.
    pub const fn is_derived(self) -> bool {
        !matches!(
            self,
            Operator::Not | Operator::And | Operator::Or | Operator::Since | Operator::Until
        )
    }

    /// The past/future (or `&`/`|`) counterpart of the operator.
    ///
    /// Returns `None` for operators outside the five mirror pairs.
    pub const fn mirror(self) -> Option<Operator> {
        match self {
            Operator::And => Some(Operator::Or),
            Operator::Or => Some(Operator::And),
            Operator::Since => Some(Operator::Until),
            Operator::Until => Some(Operator::Since),
            Operator::Once => Some(Operator::Fin),
            Operator::Fin => Some(Operator::Once),
            Operator::Hist => Some(Operator::Glob),
            Operator::Glob => Some(Operator::Hist),
            Operator::Yest => Some(Operator::Next),
            Operator::Next => Some(Operator::Yest),
            Operator::Not | Operator::Impl | Operator::Equiv | Operator::Unless => None,
        }
    }

    /// Same as [`mirror`][Operator::mirror], for callers that only deal with mirrored operators.
    ///
    /// # Panics
    ///
    /// Panics if the operator has no mirror.
    pub fn mirrored(self) -> Operator {
        match self.mirror() {
            Some(op) => op,
            None => panic!("Operator '{}' has no mirror operator", self),
        }
    }

    /// Textual image of the operator, as accepted by the parser.
    pub const fn image(self) -> &'static str {
        match self {
            Operator::Not => "!",
            Operator::And => "&",
            Operator::Or => "|",
            Operator::Impl => "->",
            Operator::Equiv => "<->",
            Operator::Since => "S",
            Operator::Until => "U",
            Operator::Unless => "W",
            Operator::Once => "O",
            Operator::Hist => "H",
            Operator::Yest => "Y",
            Operator::Fin => "F",
            Operator::Glob => "G",
            Operator::Next => "X",
        }
    }

    pub fn from_image(image: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.image() == image)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_mirror_is_involutive() {
        for op in Operator::ALL {
            if let Some(m) = op.mirror() {
                assert_eq!(m.mirror(), Some(op), "mirror of {} is not involutive", op);
                assert_eq!(op.arity(), m.arity());
            }
        }
        let paired = Operator::ALL.iter().filter(|op| op.mirror().is_some()).count();
        assert_eq!(paired, 10);
    }

    #[test]
    fn test_mirror_swaps_time() {
        assert_eq!(Operator::Since.mirrored(), Operator::Until);
        assert_eq!(Operator::Hist.mirrored(), Operator::Glob);
        assert_eq!(Operator::Since.time(), Time::Past);
        assert_eq!(Operator::Until.time(), Time::Future);
        assert_eq!(Operator::And.mirrored().time(), Time::Present);
    }

    #[test]
    #[should_panic(expected = "has no mirror operator")]
    fn test_mirrored_panics_on_impl() {
        Operator::Impl.mirrored();
    }

    #[test]
    fn test_derived() {
        let derived: Vec<_> = Operator::ALL.into_iter().filter(|op| op.is_derived()).collect();
        assert_eq!(derived.len(), 9);
        assert!(!Operator::Since.is_derived());
        assert!(Operator::Unless.is_derived());
    }

    #[test]
    fn test_image_roundtrip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_image(op.image()), Some(op));
        }
        assert_eq!(Operator::from_image("?"), None);
    }
}
