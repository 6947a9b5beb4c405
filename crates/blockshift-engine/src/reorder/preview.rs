use log::debug;

use crate::host::{OverlayLayer, Point, PreviewId, PreviewStyle, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq)]
struct LivePreview {
    id: PreviewId,
    width: f64,
    height: f64,
    pointer: Point,
}

/// Floating echo of the dragged block
///
/// At most one clone is mounted at a time. The clone never receives pointer
/// input, so hit-testing underneath keeps working while it follows the
/// pointer.
#[derive(Debug, Clone)]
pub struct PreviewController {
    opacity: f32,
    selected_class: String,
    live: Option<LivePreview>,
}

impl PreviewController {
    pub fn new(opacity: f32, selected_class: impl Into<String>) -> Self {
        Self {
            opacity,
            selected_class: selected_class.into(),
            live: None,
        }
    }

    pub fn id(&self) -> Option<PreviewId> {
        self.live.map(|live| live.id)
    }

    pub fn is_mounted(&self) -> bool {
        self.live.is_some()
    }

    /// Clone block `index` and mount it centred on `pointer`
    ///
    /// Any clone left over from an earlier drag is removed first. The size
    /// used for centring comes from the source element until [`settle`]
    /// replaces it with a measurement of the mounted clone.
    ///
    /// [`settle`]: PreviewController::settle
    pub fn start<H: OverlayLayer + ?Sized>(
        &mut self,
        host: &mut H,
        index: usize,
        pointer: Point,
    ) -> Result<PreviewId, SurfaceError> {
        if let Err(err) = self.remove(host) {
            debug!("discarding stale preview failed: {err}");
        }

        let mut clone = host.clone_block_element(index).ok_or(SurfaceError::Detached)?;
        clone.classes.retain(|class| *class != self.selected_class);
        let (width, height) = (clone.rect.width, clone.rect.height);

        let style = PreviewStyle {
            opacity: self.opacity,
            fixed: true,
            intercepts_pointer: false,
        };
        let id = host.mount_preview(clone, style)?;
        self.live = Some(LivePreview {
            id,
            width,
            height,
            pointer,
        });
        self.reposition(host)?;
        Ok(id)
    }

    /// Take the deferred layout read of the mounted clone and re-centre
    pub fn settle<H: OverlayLayer + ?Sized>(&mut self, host: &mut H) -> Result<(), SurfaceError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(());
        };
        let measured = host.measure_preview(live.id).ok_or(SurfaceError::Detached)?;
        live.width = measured.width;
        live.height = measured.height;
        self.reposition(host)
    }

    pub fn move_to<H: OverlayLayer + ?Sized>(
        &mut self,
        host: &mut H,
        pointer: Point,
    ) -> Result<(), SurfaceError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(());
        };
        live.pointer = pointer;
        self.reposition(host)
    }

    /// Unmount the clone; a no-op when nothing is mounted
    ///
    /// The controller forgets the clone even when the host fails to remove it.
    pub fn remove<H: OverlayLayer + ?Sized>(&mut self, host: &mut H) -> Result<(), SurfaceError> {
        match self.live.take() {
            Some(live) => host.remove_preview(live.id),
            None => Ok(()),
        }
    }

    fn reposition<H: OverlayLayer + ?Sized>(&self, host: &mut H) -> Result<(), SurfaceError> {
        let Some(live) = self.live else {
            return Ok(());
        };
        let top_left = Point::new(
            live.pointer.x - live.width / 2.0,
            live.pointer.y - live.height / 2.0,
        );
        host.position_preview(live.id, top_left)
    }
}
