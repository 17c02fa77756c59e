use std::fmt::{Display, Formatter};

/// Stable handle of a node inside a [`Formula`][crate::formula::Formula] arena.
///
/// Handles are only meaningful for the arena that issued them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the index of the node in its arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
