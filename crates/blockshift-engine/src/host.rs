//! Collaborator contracts between the reorder engine and its host
//!
//! The engine never reaches for ambient state: everything it reads or writes
//! goes through these traits, handed to it at construction time. A browser
//! host maps them onto the DOM and pointer events, the terminal frontend and
//! the tests use [`crate::memory::MemoryEditor`].

use thiserror::Error;

use crate::document::{Node, ResolvedPos, Transaction, TransactionError};

/// Identifier of a pointer as reported by the host input system
pub type PointerId = u32;

/// A point in client (viewport) coordinates unless stated otherwise
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Half-open on the far edges so adjacent rects never both contain a point
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }
}

/// Convert a client-space point into drag-surface local coordinates
///
/// Local coordinates include the surface's scroll offset, so overlays placed
/// with them stay attached to content while the surface scrolls.
pub fn surface_local(point: Point, surface: Rect, scroll: Point) -> Point {
    Point::new(
        point.x - surface.x + scroll.x,
        point.y - surface.y + scroll.y,
    )
}

/// A rendered top-level block and its client-space bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockElement {
    pub index: usize,
    pub rect: Rect,
}

/// Where the drop indicator is drawn, in drag-surface local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPlacement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub thickness: f64,
}

/// A visual echo of a rendered block, detached from the document model
#[derive(Debug, Clone, PartialEq)]
pub struct ElementClone {
    pub block_index: usize,
    pub rect: Rect,
    /// Presentation classes copied from the rendered element
    pub classes: Vec<String>,
    /// Text shown by hosts that cannot paint the real subtree
    pub label: String,
}

/// Presentation applied to a mounted preview clone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewStyle {
    pub opacity: f32,
    /// Positioned relative to the viewport rather than the document flow
    pub fixed: bool,
    /// Whether the clone may receive pointer input; always false for previews
    pub intercepts_pointer: bool,
}

/// Handle to a mounted preview clone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(pub u32);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("element is detached from the drag surface")]
    Detached,

    #[error("pointer {0} is not captured by the drag surface")]
    NotCaptured(PointerId),

    #[error("host error: {0}")]
    Host(String),
}

/// Read and mutation surface of the document view
pub trait DocumentView {
    /// Map a client-space coordinate to a document position
    fn resolve_coordinate_to_position(&self, point: Point) -> Option<usize>;

    fn resolve(&self, position: usize) -> Option<ResolvedPos>;

    /// The node starting at `position`
    fn node_at(&self, position: usize) -> Option<&Node>;

    fn block_count(&self) -> usize;

    /// Top-level block by index
    fn block(&self, index: usize) -> Option<&Node>;

    /// Apply all edits as one commit, or none of them
    fn apply_transaction(&mut self, transaction: Transaction) -> Result<(), TransactionError>;

    /// Select the node starting at `position`
    fn set_selection(&mut self, position: usize);

    fn focus(&mut self);

    fn scroll_into_view(&mut self, position: usize);
}

/// Rendered top-level block elements, 1:1 with document blocks
pub trait BlockLayout {
    fn block_elements(&self) -> Vec<BlockElement>;
}

/// The editor's outer container, which owns pointer capture during a gesture
pub trait DragSurface {
    /// Client-space bounding box of the surface
    fn surface_rect(&self) -> Rect;

    fn scroll_offset(&self) -> Point;

    fn set_pointer_capture(&mut self, pointer_id: PointerId) -> Result<(), SurfaceError>;

    fn release_pointer_capture(&mut self, pointer_id: PointerId) -> Result<(), SurfaceError>;
}

/// Visual overlays drawn on top of the document: the insertion marker and the
/// floating drag preview
pub trait OverlayLayer {
    fn show_indicator(&mut self, placement: IndicatorPlacement) -> Result<(), SurfaceError>;

    fn hide_indicator(&mut self) -> Result<(), SurfaceError>;

    /// Clone the rendered subtree of a block
    fn clone_block_element(&self, index: usize) -> Option<ElementClone>;

    fn mount_preview(
        &mut self,
        clone: ElementClone,
        style: PreviewStyle,
    ) -> Result<PreviewId, SurfaceError>;

    /// Move the preview so its top-left corner sits at a client-space point
    fn position_preview(&mut self, id: PreviewId, top_left: Point) -> Result<(), SurfaceError>;

    /// Layout read of the mounted preview
    fn measure_preview(&self, id: PreviewId) -> Option<Rect>;

    fn remove_preview(&mut self, id: PreviewId) -> Result<(), SurfaceError>;
}

/// Everything the gesture controller needs from its host
pub trait EditorHost: DocumentView + BlockLayout + DragSurface + OverlayLayer {}

impl<T: DocumentView + BlockLayout + DragSurface + OverlayLayer> EditorHost for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_local_accounts_for_origin_and_scroll() {
        let surface = Rect::new(100.0, 50.0, 600.0, 400.0);
        let local = surface_local(Point::new(130.0, 90.0), surface, Point::new(0.0, 200.0));

        assert_eq!(local, Point::new(30.0, 240.0));
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);

        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(9.9, 9.9)));
        assert!(!rect.contains(Point::new(10.0, 5.0)));
        assert!(!rect.contains(Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_distance_is_euclidean() {
        assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
    }
}
