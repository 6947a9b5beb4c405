//! In-memory editor host
//!
//! [`MemoryEditor`] owns a [`Document`] and lays its top-level blocks out as a
//! vertical stack inside a rectangular drag surface:
//!
//! ```text
//!  surface.x
//!  |<-gutter->|<------------- content ------------->|
//!  +----------+-------------------------------------+  block 0
//!  |   grip   |  line 1                             |
//!  |          |  line 2                             |
//!  +----------+-------------------------------------+
//!                         block_gap
//!  +----------+-------------------------------------+  block 1
//! ```
//!
//! Each block is as tall as its markdown rendering has lines. Every
//! interaction the engine has with the host (selection, focus, capture,
//! overlays) is recorded so callers can observe and draw it.

use crate::document::{Document, Node, NodeContent, ResolvedPos, Transaction, TransactionError};
use crate::host::{
    BlockElement, BlockLayout, DocumentView, DragSurface, ElementClone, IndicatorPlacement,
    OverlayLayer, Point, PointerId, PreviewId, PreviewStyle, Rect, SurfaceError,
};
use crate::markdown::block_to_markdown;

/// A preview clone currently mounted on the surface
#[derive(Debug, Clone, PartialEq)]
pub struct MountedPreview {
    pub id: PreviewId,
    pub clone: ElementClone,
    pub style: PreviewStyle,
    pub top_left: Point,
}

#[derive(Debug, Clone)]
pub struct MemoryEditor {
    document: Document,
    surface: Rect,
    scroll: Point,
    gutter_width: f64,
    line_height: f64,
    block_gap: f64,
    selected_class: String,
    selection: Option<usize>,
    focused: bool,
    scrolled_to: Option<usize>,
    captured: Option<PointerId>,
    detached: bool,
    reject_transactions: bool,
    indicator: Option<IndicatorPlacement>,
    previews: Vec<MountedPreview>,
    next_preview_id: u32,
    preview_removals: usize,
    capture_releases: usize,
}

impl MemoryEditor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            surface: Rect::new(0.0, 0.0, 800.0, 600.0),
            scroll: Point::default(),
            gutter_width: 24.0,
            line_height: 20.0,
            block_gap: 8.0,
            selected_class: "is-selected".to_string(),
            selection: None,
            focused: false,
            scrolled_to: None,
            captured: None,
            detached: false,
            reject_transactions: false,
            indicator: None,
            previews: Vec::new(),
            next_preview_id: 1,
            preview_removals: 0,
            capture_releases: 0,
        }
    }

    pub fn with_surface(mut self, surface: Rect) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_block_gap(mut self, block_gap: f64) -> Self {
        self.block_gap = block_gap;
        self
    }

    pub fn with_gutter_width(mut self, gutter_width: f64) -> Self {
        self.gutter_width = gutter_width;
        self
    }

    pub fn with_selected_class(mut self, class: impl Into<String>) -> Self {
        self.selected_class = class.into();
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct access to the document, bypassing the view; models edits made
    /// by other parties (typing, collaborators) while a gesture is running
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn set_surface(&mut self, surface: Rect) {
        self.surface = surface;
    }

    pub fn set_scroll(&mut self, scroll: Point) {
        self.scroll = scroll;
    }

    /// Scroll vertically by `delta`, never above the top of the document
    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll.y = (self.scroll.y + delta).max(0.0);
    }

    /// Simulate the view being torn out of the page: every overlay and
    /// capture call fails from now on
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn set_reject_transactions(&mut self, reject: bool) {
        self.reject_transactions = reject;
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn scrolled_to(&self) -> Option<usize> {
        self.scrolled_to
    }

    pub fn captured_pointer(&self) -> Option<PointerId> {
        self.captured
    }

    pub fn indicator(&self) -> Option<IndicatorPlacement> {
        self.indicator
    }

    pub fn previews(&self) -> &[MountedPreview] {
        &self.previews
    }

    pub fn preview_removals(&self) -> usize {
        self.preview_removals
    }

    pub fn capture_releases(&self) -> usize {
        self.capture_releases
    }

    /// Client-space rect of block `index`'s content area
    pub fn block_rect(&self, index: usize) -> Option<Rect> {
        self.layout().get(index).copied()
    }

    /// Client-space rect of block `index`'s grip: the gutter beside its first line
    pub fn grip_rect(&self, index: usize) -> Option<Rect> {
        let rect = self.block_rect(index)?;
        Some(Rect::new(
            self.surface.x,
            rect.y,
            self.gutter_width,
            self.line_height.min(rect.height),
        ))
    }

    fn block_height(&self, node: &Node) -> f64 {
        let lines = block_to_markdown(node).lines().count().max(1);
        lines as f64 * self.line_height
    }

    fn layout(&self) -> Vec<Rect> {
        let mut y = self.surface.y - self.scroll.y;
        let x = self.surface.x + self.gutter_width;
        let width = (self.surface.width - self.gutter_width).max(0.0);

        self.document
            .blocks()
            .iter()
            .map(|block| {
                let height = self.block_height(block);
                let rect = Rect::new(x, y, width, height);
                y += height + self.block_gap;
                rect
            })
            .collect()
    }

    fn ensure_attached(&self) -> Result<(), SurfaceError> {
        if self.detached {
            Err(SurfaceError::Detached)
        } else {
            Ok(())
        }
    }
}

impl DocumentView for MemoryEditor {
    fn resolve_coordinate_to_position(&self, point: Point) -> Option<usize> {
        let index = self.layout().iter().position(|rect| rect.contains(point))?;
        let start = self.document.block_start(index)?;
        let block = self.document.blocks().get(index)?;

        // land inside the block's content so resolution has to walk up
        match block.content() {
            NodeContent::Children(_) => Some(start + 1),
            _ => Some(start),
        }
    }

    fn resolve(&self, position: usize) -> Option<ResolvedPos> {
        self.document.resolve(position)
    }

    fn node_at(&self, position: usize) -> Option<&Node> {
        self.document.node_at(position)
    }

    fn block_count(&self) -> usize {
        self.document.blocks().len()
    }

    fn block(&self, index: usize) -> Option<&Node> {
        self.document.blocks().get(index)
    }

    fn apply_transaction(&mut self, transaction: Transaction) -> Result<(), TransactionError> {
        if self.reject_transactions {
            return Err(TransactionError::Rejected);
        }
        self.document.apply(transaction)
    }

    fn set_selection(&mut self, position: usize) {
        self.selection = Some(position);
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn scroll_into_view(&mut self, position: usize) {
        self.scrolled_to = Some(position);

        let Some(rect) = self
            .document
            .boundary_index(position)
            .and_then(|index| self.block_rect(index))
        else {
            return;
        };

        if rect.top() < self.surface.top() {
            self.scroll_by(rect.top() - self.surface.top());
        } else if rect.bottom() > self.surface.bottom() {
            let overflow = rect.bottom() - self.surface.bottom();
            // never push the block's top out of view to show its bottom
            let room = rect.top() - self.surface.top();
            self.scroll_by(overflow.min(room));
        }
    }
}

impl BlockLayout for MemoryEditor {
    fn block_elements(&self) -> Vec<BlockElement> {
        self.layout()
            .into_iter()
            .enumerate()
            .map(|(index, rect)| BlockElement { index, rect })
            .collect()
    }
}

impl DragSurface for MemoryEditor {
    fn surface_rect(&self) -> Rect {
        self.surface
    }

    fn scroll_offset(&self) -> Point {
        self.scroll
    }

    fn set_pointer_capture(&mut self, pointer_id: PointerId) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        self.captured = Some(pointer_id);
        Ok(())
    }

    fn release_pointer_capture(&mut self, pointer_id: PointerId) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        if self.captured != Some(pointer_id) {
            return Err(SurfaceError::NotCaptured(pointer_id));
        }
        self.captured = None;
        self.capture_releases += 1;
        Ok(())
    }
}

impl OverlayLayer for MemoryEditor {
    fn show_indicator(&mut self, placement: IndicatorPlacement) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        self.indicator = Some(placement);
        Ok(())
    }

    fn hide_indicator(&mut self) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        self.indicator = None;
        Ok(())
    }

    fn clone_block_element(&self, index: usize) -> Option<ElementClone> {
        if self.detached {
            return None;
        }
        let rect = self.block_rect(index)?;
        let block = self.document.blocks().get(index)?;

        let mut classes = vec!["block".to_string(), block.kind().name().to_string()];
        if self.selection.is_some() && self.selection == self.document.block_start(index) {
            classes.push(self.selected_class.clone());
        }

        Some(ElementClone {
            block_index: index,
            rect,
            classes,
            label: block_to_markdown(block),
        })
    }

    fn mount_preview(
        &mut self,
        clone: ElementClone,
        style: PreviewStyle,
    ) -> Result<PreviewId, SurfaceError> {
        self.ensure_attached()?;
        let id = PreviewId(self.next_preview_id);
        self.next_preview_id += 1;
        let top_left = Point::new(clone.rect.x, clone.rect.y);
        self.previews.push(MountedPreview {
            id,
            clone,
            style,
            top_left,
        });
        Ok(id)
    }

    fn position_preview(&mut self, id: PreviewId, top_left: Point) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let preview = self
            .previews
            .iter_mut()
            .find(|preview| preview.id == id)
            .ok_or(SurfaceError::Detached)?;
        preview.top_left = top_left;
        Ok(())
    }

    fn measure_preview(&self, id: PreviewId) -> Option<Rect> {
        if self.detached {
            return None;
        }
        self.previews
            .iter()
            .find(|preview| preview.id == id)
            .map(|preview| {
                Rect::new(
                    preview.top_left.x,
                    preview.top_left.y,
                    preview.clone.rect.width,
                    preview.clone.rect.height,
                )
            })
    }

    fn remove_preview(&mut self, id: PreviewId) -> Result<(), SurfaceError> {
        self.ensure_attached()?;
        let slot = self
            .previews
            .iter()
            .position(|preview| preview.id == id)
            .ok_or(SurfaceError::Detached)?;
        self.previews.remove(slot);
        self.preview_removals += 1;
        Ok(())
    }
}
