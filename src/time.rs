//! Time classes of formulas.
//!
//! Every node of a [`Formula`][crate::formula::Formula] carries a cached [`Time`],
//! computed bottom-up from the times of its operands with the tables in this
//! module.

use std::fmt;

use crate::operator::Operator;

/// The part of a trace a formula refers to.
///
/// # Invariants
///
/// - Atoms and constants are [`Present`][Time::Present].
/// - A formula is *pure* iff its time is not [`Mixed`][Time::Mixed].
/// - A formula is `Mixed` only if it contains both a past and a future operator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Time {
    Past,
    Present,
    Future,
    Mixed,
}

impl Time {
    /// Combines the times of the two operands of a boolean connective.
    ///
    /// | ∘       | Past  | Present | Future | Mixed |
    /// |---------|-------|---------|--------|-------|
    /// | Past    | Past  | Past    | Mixed  | Mixed |
    /// | Present | Past  | Present | Future | Mixed |
    /// | Future  | Mixed | Future  | Future | Mixed |
    /// | Mixed   | Mixed | Mixed   | Mixed  | Mixed |
    pub fn combine(self, other: Time) -> Time {
        match (self, other) {
            (Time::Present, t) | (t, Time::Present) => t,
            (Time::Past, Time::Past) => Time::Past,
            (Time::Future, Time::Future) => Time::Future,
            _ => Time::Mixed,
        }
    }

    /// Time of a past temporal operator applied to operands of the given times.
    pub fn past_case(self, other: Time) -> Time {
        if self.is_past_compatible() && other.is_past_compatible() {
            Time::Past
        } else {
            Time::Mixed
        }
    }

    /// Time of a future temporal operator applied to operands of the given times.
    pub fn future_case(self, other: Time) -> Time {
        if self.is_future_compatible() && other.is_future_compatible() {
            Time::Future
        } else {
            Time::Mixed
        }
    }

    /// Time of a node with operator `op` over operands of the given times.
    ///
    /// For unary operators pass the operand's time in both arguments.
    pub fn of_operator(op: Operator, lhs: Time, rhs: Time) -> Time {
        match op.time() {
            Time::Past => lhs.past_case(rhs),
            Time::Future => lhs.future_case(rhs),
            _ => lhs.combine(rhs),
        }
    }

    pub fn is_pure(self) -> bool {
        self != Time::Mixed
    }

    /// Whether a formula of this time may contain a past operator.
    pub fn has_past(self) -> bool {
        matches!(self, Time::Past | Time::Mixed)
    }

    /// Whether a formula of this time may contain a future operator.
    pub fn has_future(self) -> bool {
        matches!(self, Time::Future | Time::Mixed)
    }

    fn is_past_compatible(self) -> bool {
        matches!(self, Time::Past | Time::Present)
    }

    fn is_future_compatible(self) -> bool {
        matches!(self, Time::Future | Time::Present)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Time::Past => "past",
            Time::Present => "present",
            Time::Future => "future",
            Time::Mixed => "mixed",
        };
        write!(f, "{}", s)
    }
}
