use crate::host::{DragSurface, IndicatorPlacement, OverlayLayer, Point, SurfaceError, surface_local};
use crate::reorder::DropTarget;

/// Owns the insertion marker shown while dragging
///
/// The marker sits on the top edge of the target block when inserting before
/// it and on the bottom edge otherwise. Placement is remembered so repeated
/// updates with the same target skip the style write.
#[derive(Debug, Clone)]
pub struct DropIndicatorController {
    thickness: f64,
    placement: Option<IndicatorPlacement>,
}

impl DropIndicatorController {
    pub fn new(thickness: f64) -> Self {
        Self {
            thickness,
            placement: None,
        }
    }

    pub fn placement(&self) -> Option<IndicatorPlacement> {
        self.placement
    }

    /// Placement for a target, in drag-surface local coordinates
    pub fn compute<S: DragSurface + ?Sized>(&self, surface: &S, target: &DropTarget) -> IndicatorPlacement {
        let edge = if target.insert_before {
            target.rect.top()
        } else {
            target.rect.bottom()
        };
        let local = surface_local(
            Point::new(target.rect.left(), edge),
            surface.surface_rect(),
            surface.scroll_offset(),
        );

        IndicatorPlacement {
            top: local.y - self.thickness / 2.0,
            left: local.x,
            width: target.rect.width,
            thickness: self.thickness,
        }
    }

    /// Show the marker for `target`, or hide it when there is none
    pub fn update<H: DragSurface + OverlayLayer + ?Sized>(
        &mut self,
        host: &mut H,
        target: Option<&DropTarget>,
    ) -> Result<(), SurfaceError> {
        let Some(target) = target else {
            return self.hide(host);
        };

        let placement = self.compute(host, target);
        if self.placement == Some(placement) {
            return Ok(());
        }
        host.show_indicator(placement)?;
        self.placement = Some(placement);
        Ok(())
    }

    /// Hide the marker; a no-op when it is not showing
    pub fn hide<H: OverlayLayer + ?Sized>(&mut self, host: &mut H) -> Result<(), SurfaceError> {
        if self.placement.take().is_some() {
            host.hide_indicator()?;
        }
        Ok(())
    }
}
