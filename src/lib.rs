//! # gabbay-rs: separation of past/future temporal formulas
//!
//! **`gabbay-rs`** turns a formula of linear temporal logic with past and future
//! operators into an equivalent *separated* formula: a boolean combination of
//! formulas that each speak only about the past, only about the present, or only
//! about the future. That such a formula always exists is Gabbay's Separation Theorem;
//! this crate implements its constructive proof as a rewriting procedure.
//!
//! ## Syntax
//!
//! Propositions are lowercase identifiers; `true` and `false` are the constants.
//!
//! - Boolean: `!`, `&`, `|`, `->`, `<->`
//! - Past: `a S b` (since), `O a` (once), `H a` (historically), `Y a` (yesterday)
//! - Future: `a U b` (until), `F a` (eventually), `G a` (globally), `X a` (next), `a W b` (unless)
//!
//! `S` and `U` are strict and take the *event* first: `a S b` holds now if `a` held at
//! some earlier instant and `b` has held at every instant strictly in between.
//!
//! ## Basic Usage
//!
//! ```rust
//! use gabbay_rs::formula::Formula;
//! use gabbay_rs::matrix::PureMatrix;
//! use gabbay_rs::separator::{Separator, SeparatorConfig};
//!
//! // 1. Parse a formula with a future operator nested under a past one
//! let f: Formula = "(a & (b U c)) S q".parse().unwrap();
//! assert!(!f.is_separated(f.root()));
//!
//! // 2. Separate it
//! let separator = Separator::new(SeparatorConfig::default()).unwrap();
//! let g = separator.separate(&f);
//! assert!(g.is_separated(g.root()));
//!
//! // 3. Read it as a disjunction of (past, present, future) triples
//! let matrix = PureMatrix::from_formula(&g);
//! assert!(!matrix.is_empty());
//! ```
//!
//! ## Core Components
//!
//! - **[`formula`]**: The [`Formula`][crate::formula::Formula] arena, with the cached
//!   time and separation attributes and the destructive rewriting primitives.
//! - **[`rules`]**, **[`simplify`]**: Boolean normalization and simplification.
//! - **[`junction`]**, **[`lemmas`]**, **[`eliminate`]**: The pieces of the proof:
//!   junction analysis, Lemmas A1/A2, and the eight elimination templates.
//! - **[`separator`]**: The driver, racing elimination candidates on a worker pool.
//! - **[`convert`]**, **[`parse`]**, **[`matrix`]**, **[`dot`]**: Input and output.

pub mod convert;
pub mod dot;
pub mod eliminate;
pub mod error;
pub mod formula;
pub mod junction;
pub mod lemmas;
pub mod matrix;
pub mod operator;
pub mod parse;
pub mod reference;
pub mod rules;
pub mod separator;
pub mod simplify;
pub mod time;
