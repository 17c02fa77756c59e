//! Matrix of pure formulas.
//!
//! A separated formula in disjunctive normal form is a disjunction of conjunctions
//! of pure formulas. Grouping each conjunction by time-class gives one
//! `(past, present, future)` triple per disjunct; the formula is the disjunction of
//! `past & present & future` over all triples.

use std::fmt;

use crate::formula::Formula;
use crate::reference::NodeId;
use crate::rules::normalize_formula;
use crate::simplify::simplify_formula;
use crate::time::Time;

/// One row of a [`PureMatrix`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Triple {
    pub past: NodeId,
    pub present: NodeId,
    pub future: NodeId,
}

#[derive(Debug, Clone)]
pub struct PureMatrix {
    formula: Formula,
    rows: Vec<Triple>,
}

impl PureMatrix {
    /// Builds the matrix of a separated formula.
    ///
    /// The formula is copied, normalized to disjunctive normal form and simplified;
    /// `f` is left untouched. Missing components of a row are `true`.
    ///
    /// # Panics
    ///
    /// Panics if a conjunct of the normal form is not pure, i.e. if `f` is not separated.
    pub fn from_formula(f: &Formula) -> Self {
        let mut formula = f.compact();
        normalize_formula(&mut formula);
        simplify_formula(&mut formula);

        let mut rows = Vec::new();
        for disjunct in formula.flatten_chain(formula.root()) {
            let mut buckets: [Vec<NodeId>; 3] = Default::default();
            for conjunct in formula.flatten_chain(disjunct) {
                let i = match formula.time(conjunct) {
                    Time::Past => 0,
                    Time::Present => 1,
                    Time::Future => 2,
                    Time::Mixed => panic!("Conjunct '{}' is not pure", formula.display(conjunct)),
                };
                buckets[i].push(conjunct);
            }
            // Copies keep the rows independent of the normal form's shape.
            let [past, present, future] = buckets.map(|bucket| {
                if bucket.is_empty() {
                    formula.constant(true)
                } else {
                    let copies: Vec<NodeId> = bucket.iter().map(|&n| formula.deep_copy(n)).collect();
                    formula.new_conjunction(&copies)
                }
            });
            rows.push(Triple { past, present, future });
        }
        PureMatrix { formula, rows }
    }

    pub fn rows(&self) -> &[Triple] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The arena holding the components of every row.
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Rows rendered as text, in `(past, present, future)` order.
    pub fn triples(&self) -> Vec<[String; 3]> {
        self.rows
            .iter()
            .map(|t| [t.past, t.present, t.future].map(|n| self.formula.display(n).to_string()))
            .collect()
    }
}

impl fmt::Display for PureMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for (i, [past, present, future]) in self.triples().iter().enumerate() {
            if i > 0 {
                writeln!(f, ",")?;
            }
            write!(f, " [\"{}\", \"{}\", \"{}\"]", past, present, future)?;
        }
        write!(f, "\n]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn triples(s: &str) -> Vec<[String; 3]> {
        let f: Formula = s.parse().unwrap();
        PureMatrix::from_formula(&f).triples()
    }

    fn row(past: &str, present: &str, future: &str) -> [String; 3] {
        [past.to_string(), present.to_string(), future.to_string()]
    }

    #[test]
    fn test_single_pure_formula() {
        assert_eq!(triples("a S b"), vec![row("aSb", "true", "true")]);
        assert_eq!(triples("a"), vec![row("true", "a", "true")]);
        assert_eq!(triples("a U b"), vec![row("true", "true", "aUb")]);
    }

    #[test]
    fn test_buckets_by_time() {
        assert_eq!(
            triples("((a S b) & c & (d U e) & (f S g)) | (h U i)"),
            vec![row("(aSb)&(fSg)", "c", "dUe"), row("true", "true", "hUi")]
        );
    }

    #[test]
    fn test_normalizes_first() {
        assert_eq!(
            triples("(a S b) & (c | (d U e))"),
            vec![row("aSb", "c", "true"), row("aSb", "true", "dUe")]
        );
    }

    #[test]
    fn test_display() {
        let f: Formula = "(a S b) | c".parse().unwrap();
        let m = PureMatrix::from_formula(&f);
        assert_eq!(m.len(), 2);
        assert_eq!(m.to_string(), "[\n [\"aSb\", \"true\", \"true\"],\n [\"true\", \"c\", \"true\"]\n]");
    }

    #[test]
    #[should_panic(expected = "is not pure")]
    fn test_mixed_conjunct_panics() {
        let f: Formula = "(a U b) S c".parse().unwrap();
        PureMatrix::from_formula(&f);
    }
}
