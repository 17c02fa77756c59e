//! Formula to DOT (Graphviz) conversion.
//!
//! The generated graph is the syntax tree of the formula:
//! - **Atoms** (propositions and constants) are boxes on the bottom rank
//! - **Operators** are circles labeled with the operator symbol
//! - **Edges** go from an operator to its operands; the two operands of a binary
//!   node are labeled `L` and `R`
//! - Nodes whose subtree mixes past and future are filled, so the nestings
//!   still to be separated stand out
//!
//! # Examples
//!
//! ```
//! use gabbay_rs::formula::Formula;
//!
//! let f: Formula = "(a & (b U c)) S q".parse().unwrap();
//! let dot = f.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("digraph {"));
//! ```

use std::fmt::Write as _;

use crate::formula::{Expr, Formula};
use crate::time::Time;

/// Configuration options for DOT output generation.
///
/// ```
/// use gabbay_rs::dot::DotConfig;
/// use gabbay_rs::formula::Formula;
///
/// let f: Formula = "a S (b U c)".parse().unwrap();
/// let config = DotConfig {
///     operator_shape: "ellipse",
///     ..DotConfig::default()
/// };
/// let dot = f.to_dot_with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for operator nodes (default: "circle")
    pub operator_shape: &'static str,
    /// Shape for propositions and constants (default: "box")
    pub atom_shape: &'static str,
    /// Fill color of nodes with a mixed time, or `None` to leave them unfilled (default: "lightpink")
    pub mixed_color: Option<&'static str>,
    /// Whether to label the edges of binary nodes with `L`/`R` (default: true)
    pub edge_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            operator_shape: "circle",
            atom_shape: "box",
            mixed_color: Some("lightpink"),
            edge_labels: true,
        }
    }
}

impl Formula {
    /// Converts the formula tree to DOT format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the formula tree to DOT format with custom configuration.
    ///
    /// Node names are the arena indices, so the output of two formulas built the
    /// same way is identical.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.operator_shape)?;

        let nodes = self.descendants(self.root());

        let mut atoms = Vec::new();
        for &id in nodes.iter() {
            let fill = match config.mixed_color {
                Some(color) if self.time(id) == Time::Mixed => format!(", style=filled, fillcolor={}", color),
                _ => String::new(),
            };
            match self.expr(id) {
                Expr::Prop(name) => atoms.push((id, name.clone())),
                Expr::Const(value) => atoms.push((id, value.to_string())),
                Expr::Unary(op, _) | Expr::Binary(op, _, _) => {
                    writeln!(dot, "{} [label=\"{}\"{}];", id.index(), op, fill)?;
                }
            }
        }

        writeln!(dot, "{{ rank=sink")?;
        for (id, label) in atoms {
            writeln!(dot, "{} [shape={}, label=\"{}\"];", id.index(), config.atom_shape, label)?;
        }
        writeln!(dot, "}}")?;

        for &id in nodes.iter() {
            match *self.expr(id) {
                Expr::Unary(_, c) => writeln!(dot, "{} -> {};", id.index(), c.index())?,
                Expr::Binary(_, l, r) if config.edge_labels => {
                    writeln!(dot, "{} -> {} [label=\"L\"];", id.index(), l.index())?;
                    writeln!(dot, "{} -> {} [label=\"R\"];", id.index(), r.index())?;
                }
                Expr::Binary(_, l, r) => {
                    writeln!(dot, "{} -> {};", id.index(), l.index())?;
                    writeln!(dot, "{} -> {};", id.index(), r.index())?;
                }
                Expr::Prop(_) | Expr::Const(_) => {}
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_to_dot_basic() {
        let f: Formula = "a & !b".parse().unwrap();
        let dot = f.to_dot().unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert_eq!(dot.matches(" -> ").count(), 3);
        assert!(dot.contains("label=\"a\""));
        assert!(dot.contains("label=\"!\""));
    }

    #[test]
    fn test_to_dot_marks_mixed_nodes() {
        let f: Formula = "a S (b U c)".parse().unwrap();
        let dot = f.to_dot().unwrap();
        assert_eq!(dot.matches("fillcolor=lightpink").count(), 1);
        assert!(dot.contains("[label=\"L\"]"));

        let g: Formula = "(a S b) & (c U d)".parse().unwrap();
        assert!(!g.to_dot().unwrap().contains("fillcolor"));
    }

    #[test]
    fn test_to_dot_with_config() {
        let f: Formula = "a S (b U c)".parse().unwrap();
        let config = DotConfig {
            mixed_color: None,
            edge_labels: false,
            ..DotConfig::default()
        };
        let dot = f.to_dot_with_config(&config).unwrap();
        assert!(!dot.contains("fillcolor"));
        assert!(!dot.contains("label=\"L\""));
        assert_eq!(dot.matches(" -> ").count(), 4);
    }

    #[test]
    fn test_to_dot_constant() {
        let f: Formula = "true".parse().unwrap();
        let dot = f.to_dot().unwrap();
        assert!(dot.contains("[shape=box, label=\"true\"]"));
        assert!(!dot.contains(" -> "));
    }
}
