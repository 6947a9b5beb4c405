//! # Document model
//!
//! An ordered tree of [`Node`]s addressed by integer positions. Every node
//! occupies a contiguous extent of the document's linear position space:
//!
//! - text nodes occupy one position per char,
//! - atoms (images, rules) occupy one position,
//! - branch nodes occupy their children plus an opening and a closing position.
//!
//! The root itself has no framing positions, so the document size is the sum
//! of its top-level block sizes and a position `p` is valid iff
//! `0 <= p <= size`. Only top-level blocks are units of reordering, and all
//! structural edits go through [`Transaction`]s that target block boundaries.

pub mod node;
pub mod transaction;

pub use node::{Node, NodeContent, NodeId, NodeKind};
pub use transaction::{Edit, Transaction, TransactionError};

/// One level of a resolved position: the node's index among its siblings and
/// its absolute start position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub index: usize,
    pub start: usize,
}

/// A position resolved to the chain of nodes that contain it, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPos {
    pub position: usize,
    pub path: Vec<PathStep>,
}

impl ResolvedPos {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// The top-level block containing (or starting at) this position
    pub fn top_level(&self) -> Option<PathStep> {
        self.path.first().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    blocks: Vec<Node>,
    /// Incremented once per committed transaction
    version: u64,
}

impl Document {
    pub fn new(blocks: Vec<Node>) -> Self {
        Self { blocks, version: 0 }
    }

    pub fn blocks(&self) -> &[Node] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn size(&self) -> usize {
        total_size(&self.blocks)
    }

    /// Start position of the block at `index`; `index == len` yields the document end
    pub fn block_start(&self, index: usize) -> Option<usize> {
        if index > self.blocks.len() {
            return None;
        }
        Some(total_size(&self.blocks[..index]))
    }

    /// Index of the block starting at `position`, or `len` for the document end
    pub fn boundary_index(&self, position: usize) -> Option<usize> {
        boundary_index(&self.blocks, position)
    }

    pub fn is_boundary(&self, position: usize) -> bool {
        self.boundary_index(position).is_some()
    }

    /// Resolve a position to the chain of nodes containing it
    ///
    /// A position equal to a node's start resolves to that node (the node
    /// "after" the position) without descending into it.
    pub fn resolve(&self, position: usize) -> Option<ResolvedPos> {
        if position > self.size() {
            return None;
        }

        let mut path = Vec::new();
        let mut nodes = self.blocks.as_slice();
        let mut offset = 0;

        'descend: loop {
            let mut start = offset;
            for (index, node) in nodes.iter().enumerate() {
                let end = start + node.size();
                if start <= position && position < end {
                    path.push(PathStep { index, start });
                    match node.content() {
                        NodeContent::Children(children) if position > start => {
                            nodes = children;
                            offset = start + 1;
                            continue 'descend;
                        }
                        _ => break 'descend,
                    }
                }
                start = end;
            }
            break;
        }

        Some(ResolvedPos { position, path })
    }

    /// The node starting exactly at `position`, at whatever depth
    pub fn node_at(&self, position: usize) -> Option<&Node> {
        let resolved = self.resolve(position)?;
        let mut nodes = self.blocks.as_slice();
        for step in &resolved.path {
            let node = nodes.get(step.index)?;
            if step.start == position {
                return Some(node);
            }
            nodes = node.children();
        }
        None
    }

    /// Plain text of each top-level block, in order
    pub fn block_texts(&self) -> Vec<String> {
        self.blocks.iter().map(Node::text_content).collect()
    }

    /// Apply all edits of a transaction atomically
    ///
    /// Edits run against a working copy of the block list which replaces the
    /// current one only when every edit succeeded.
    pub fn apply(&mut self, transaction: Transaction) -> Result<(), TransactionError> {
        if transaction.is_empty() {
            return Err(TransactionError::Empty);
        }

        let mut working = self.blocks.clone();
        for edit in transaction.into_edits() {
            apply_edit(&mut working, edit)?;
        }

        self.blocks = working;
        self.version += 1;
        Ok(())
    }
}

fn total_size(blocks: &[Node]) -> usize {
    blocks.iter().map(Node::size).sum()
}

fn boundary_index(blocks: &[Node], position: usize) -> Option<usize> {
    let mut offset = 0;
    for (index, block) in blocks.iter().enumerate() {
        if offset == position {
            return Some(index);
        }
        if offset > position {
            return None;
        }
        offset += block.size();
    }
    (offset == position).then_some(blocks.len())
}

fn locate_boundary(blocks: &[Node], position: usize) -> Result<usize, TransactionError> {
    let size = total_size(blocks);
    if position > size {
        return Err(TransactionError::OutOfBounds { position, size });
    }
    boundary_index(blocks, position).ok_or(TransactionError::NotABoundary { position })
}

fn apply_edit(blocks: &mut Vec<Node>, edit: Edit) -> Result<(), TransactionError> {
    match edit {
        Edit::Insert { at, node } => {
            if !node.kind().is_reorderable() {
                return Err(TransactionError::NotABlock {
                    kind: node.kind().name(),
                });
            }
            let index = locate_boundary(blocks, at)?;
            blocks.insert(index, node);
        }
        Edit::Delete { from, to } => {
            if from >= to {
                return Err(TransactionError::EmptyRange { from, to });
            }
            let start = locate_boundary(blocks, from)?;
            let end = locate_boundary(blocks, to)?;
            blocks.drain(start..end);
        }
    }
    Ok(())
}
