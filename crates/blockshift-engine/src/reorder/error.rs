use thiserror::Error;

use crate::document::TransactionError;

/// Why a reorder attempt did not change the document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("no block at position {position}; it may have been removed concurrently")]
    StaleSource { position: usize },

    #[error("block at position {position} changed size from {expected} to {actual} during the drag")]
    SourceResized {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cannot drop the block spanning {from}..{to} at {target}, where it already is")]
    DropInsideSource {
        from: usize,
        to: usize,
        target: usize,
    },

    #[error("document rejected the reorder transaction: {0}")]
    Transaction(#[from] TransactionError),
}
