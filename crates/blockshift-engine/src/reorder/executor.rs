use log::info;

use crate::document::Transaction;
use crate::host::DocumentView;
use crate::reorder::ReorderError;

/// Relocate the block of `source_size` positions at `source_position` to
/// the boundary `target_position`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub source_position: usize,
    pub source_size: usize,
    pub target_position: usize,
}

impl MoveRequest {
    /// Positions occupied by the source block
    pub fn source_range(&self) -> std::ops::Range<usize> {
        self.source_position..self.source_position + self.source_size
    }

    /// Dropping here would leave the document unchanged or split the source
    ///
    /// Both edges of the source count: inserting at either one puts the block
    /// back where it already is.
    pub fn is_self_drop(&self) -> bool {
        let range = self.source_range();
        (range.start..=range.end).contains(&self.target_position)
    }
}

/// A committed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub from: usize,
    /// Position where the moved block now starts
    pub to: usize,
}

/// Apply a block move as a single transaction
///
/// The block is re-inserted as a detached copy so no node identity survives
/// in two places. Edit order depends on direction so each edit's position is
/// still valid against the state the previous edit left behind. On success
/// the moved block is selected, the view refocused and the block scrolled
/// into view; on failure the document is untouched.
pub fn execute<V: DocumentView + ?Sized>(
    view: &mut V,
    request: MoveRequest,
) -> Result<MoveOutcome, ReorderError> {
    let MoveRequest {
        source_position,
        source_size,
        target_position,
    } = request;

    if request.is_self_drop() {
        return Err(ReorderError::DropInsideSource {
            from: source_position,
            to: source_position + source_size,
            target: target_position,
        });
    }

    let node = view
        .node_at(source_position)
        .ok_or(ReorderError::StaleSource {
            position: source_position,
        })?;
    if node.size() != source_size {
        return Err(ReorderError::SourceResized {
            position: source_position,
            expected: source_size,
            actual: node.size(),
        });
    }
    let copy = node.detached_copy();

    let (transaction, landed_at) = if target_position > source_position {
        (
            Transaction::new()
                .insert(target_position, copy)
                .delete(request.source_range()),
            target_position - source_size,
        )
    } else {
        (
            Transaction::new()
                .delete(request.source_range())
                .insert(target_position, copy),
            target_position,
        )
    };

    view.apply_transaction(transaction)?;
    view.set_selection(landed_at);
    view.focus();
    view.scroll_into_view(landed_at);

    info!("moved block from {source_position} to {landed_at}");
    Ok(MoveOutcome {
        from: source_position,
        to: landed_at,
    })
}
