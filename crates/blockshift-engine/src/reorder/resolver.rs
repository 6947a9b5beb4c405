//! Screen coordinate to document position mapping
//!
//! Both operations are pure reads of the document view and the rendered
//! block list.

use crate::document::{NodeId, NodeKind};
use crate::host::{BlockElement, DocumentView, Point, Rect};

/// The top-level block under a probe point
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock {
    /// Boundary position where the block starts
    pub position: usize,
    pub index: usize,
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub size: usize,
}

/// Where a drop at the current pointer would land
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    /// Boundary position the block would be inserted at
    pub position: usize,
    /// Insert before (true) or after the nearest block
    pub insert_before: bool,
    /// Index of the nearest block
    pub index: usize,
    /// Client-space rect of the nearest block
    pub rect: Rect,
}

/// Point probed to find a grip's block
///
/// The grip sits in the gutter, outside the block's content area, so the
/// probe is offset horizontally into the content at the grip's vertical centre.
pub fn probe_point(grip: Rect, offset: f64) -> Point {
    Point::new(grip.right() + offset, grip.mid_y())
}

/// Resolve a client-space point to the enclosing top-level block
pub fn resolve_block_at<V: DocumentView + ?Sized>(view: &V, point: Point) -> Option<ResolvedBlock> {
    let position = view.resolve_coordinate_to_position(point)?;
    let resolved = view.resolve(position)?;
    let top = resolved.top_level()?;
    let node = view.block(top.index)?;

    Some(ResolvedBlock {
        position: top.start,
        index: top.index,
        node_id: node.id(),
        kind: node.kind().clone(),
        size: node.size(),
    })
}

/// Pick the drop target nearest to `pointer_y`
///
/// The nearest block is the one whose vertical midpoint is closest to the
/// pointer; exact ties go to the earliest block. Returns `None` when there
/// are no rendered blocks or the rendered list is out of step with the
/// document.
pub fn resolve_drop_target<V: DocumentView + ?Sized>(
    view: &V,
    pointer_y: f64,
    blocks: &[BlockElement],
) -> Option<DropTarget> {
    let mut nearest: Option<(usize, f64)> = None;
    for (slot, element) in blocks.iter().enumerate() {
        let distance = (element.rect.mid_y() - pointer_y).abs();
        // strict comparison keeps the first of equally distant blocks
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((slot, distance));
        }
    }

    let (slot, _) = nearest?;
    let element = blocks[slot];
    let insert_before = pointer_y < element.rect.mid_y();

    let mut position = 0;
    for index in 0..element.index {
        position += view.block(index)?.size();
    }
    if !insert_before {
        position += view.block(element.index)?.size();
    }

    Some(DropTarget {
        position,
        insert_before,
        index: element.index,
        rect: element.rect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Node};
    use crate::memory::MemoryEditor;
    use rstest::{fixture, rstest};

    /// Three one-line paragraphs of sizes 3, 4 and 5, 20px high with no gaps,
    /// starting at y = 0: midpoints at 10, 30, 50
    #[fixture]
    fn editor() -> MemoryEditor {
        MemoryEditor::new(Document::new(vec![
            Node::paragraph("a"),
            Node::paragraph("bb"),
            Node::paragraph("ccc"),
        ]))
        .with_line_height(20.0)
        .with_block_gap(0.0)
    }

    #[rstest]
    #[case::above_first(0.0, 0, true, 0)]
    #[case::below_first_mid(12.0, 0, false, 3)]
    #[case::above_second_mid(25.0, 1, true, 3)]
    #[case::below_second_mid(35.0, 1, false, 7)]
    #[case::below_last(200.0, 2, false, 12)]
    fn test_resolve_drop_target(
        editor: MemoryEditor,
        #[case] y: f64,
        #[case] index: usize,
        #[case] insert_before: bool,
        #[case] position: usize,
    ) {
        use crate::host::BlockLayout;

        let target = resolve_drop_target(&editor, y, &editor.block_elements()).unwrap();

        assert_eq!(target.index, index);
        assert_eq!(target.insert_before, insert_before);
        assert_eq!(target.position, position);
    }

    #[test]
    fn test_tie_goes_to_earlier_block() {
        let editor = MemoryEditor::new(Document::new(vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
        ]));
        let blocks = [
            BlockElement {
                index: 0,
                rect: Rect::new(0.0, 0.0, 100.0, 20.0),
            },
            BlockElement {
                index: 1,
                rect: Rect::new(0.0, 20.0, 100.0, 20.0),
            },
        ];

        // y = 20 is exactly 10px from both midpoints
        for _ in 0..10 {
            let target = resolve_drop_target(&editor, 20.0, &blocks).unwrap();
            assert_eq!(target.index, 0);
            assert!(!target.insert_before);
            assert_eq!(target.position, 3);
        }
    }

    #[test]
    fn test_no_blocks_yields_no_target() {
        let editor = MemoryEditor::new(Document::default());
        assert!(resolve_drop_target(&editor, 10.0, &[]).is_none());
    }

    #[test]
    fn test_rendered_blocks_out_of_step_yield_no_target() {
        let editor = MemoryEditor::new(Document::new(vec![Node::paragraph("only")]));
        let blocks = [BlockElement {
            index: 3,
            rect: Rect::new(0.0, 0.0, 100.0, 20.0),
        }];

        assert!(resolve_drop_target(&editor, 5.0, &blocks).is_none());
    }

    #[rstest]
    fn test_resolve_block_at_walks_up_to_top_level(editor: MemoryEditor) {
        use crate::host::BlockLayout;

        let second = editor.block_elements()[1].rect;
        let grip = editor.grip_rect(1).unwrap();
        let probe = probe_point(grip, 10.0);
        assert!(second.contains(probe));

        let block = resolve_block_at(&editor, probe).unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(block.position, 3);
        assert_eq!(block.size, 4);
        assert_eq!(block.kind, NodeKind::Paragraph);
    }

    #[rstest]
    fn test_resolve_block_at_outside_content(editor: MemoryEditor) {
        assert!(resolve_block_at(&editor, Point::new(5.0, 500.0)).is_none());
    }
}
