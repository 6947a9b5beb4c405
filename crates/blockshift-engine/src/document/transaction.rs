use thiserror::Error;

use crate::document::Node;

/// A single top-level edit
///
/// Positions are interpreted against the document as left by the edits that
/// precede this one in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Insert a block at a boundary position
    Insert { at: usize, node: Node },
    /// Delete the blocks spanning `from..to`; both ends must be boundaries
    Delete { from: usize, to: usize },
}

/// An ordered set of edits committed as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    edits: Vec<Edit>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, at: usize, node: Node) -> Self {
        self.edits.push(Edit::Insert { at, node });
        self
    }

    pub fn delete(mut self, range: std::ops::Range<usize>) -> Self {
        self.edits.push(Edit::Delete {
            from: range.start,
            to: range.end,
        });
        self
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn into_edits(self) -> Vec<Edit> {
        self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Why a transaction was rejected; the document is left unchanged in every case
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction contains no edits")]
    Empty,

    #[error("position {position} is outside the document (size {size})")]
    OutOfBounds { position: usize, size: usize },

    #[error("position {position} is not a block boundary")]
    NotABoundary { position: usize },

    #[error("delete range {from}..{to} is empty or inverted")]
    EmptyRange { from: usize, to: usize },

    #[error("{kind} nodes cannot be placed at the top level")]
    NotABlock { kind: &'static str },

    #[error("transaction rejected by the document view")]
    Rejected,
}
