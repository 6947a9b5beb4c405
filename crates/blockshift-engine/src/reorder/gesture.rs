//! Pointer-driven drag gesture for top-level blocks
//!
//! ```text
//!            down on grip             travel > threshold
//!   Idle ----------------> Armed ----------------------> Dragging
//!    ^                       |                              |
//!    |      up / cancel /    |        up (drop) / cancel /  |
//!    +---- capture lost -----+------ capture lost ----------+
//! ```
//!
//! ## Invariants
//!
//! 1. At most one gesture is active per controller. Pointer capture is taken
//!    on the drag surface when a gesture arms and released when it ends.
//! 2. Events carrying a different pointer than the active gesture's are
//!    ignored.
//! 3. The document is mutated at most once per gesture, on release, and only
//!    when the drop target lies outside the source block.
//! 4. Every path back to `Idle` runs the same cleanup, which is idempotent
//!    and never fails.
//!
//! ## Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Grip does not resolve to a block | Layout out of step | Gesture cancelled |
//! | Block is not reorderable | List item, table row | Gesture cancelled |
//! | Dragged block replaced mid-drag | Concurrent edit | Gesture cancelled |
//! | No drop target | Empty layout | Indicator hidden, release is a no-op |
//! | Overlay or capture call fails | View detached | Logged, cleanup continues |
//! | Frame callback after gesture ended | Deferred work outlived its gesture | Ticket is dead, callback ignored |

use std::rc::{Rc, Weak};

use log::{debug, warn};

use crate::config::DragConfig;
use crate::document::NodeId;
use crate::host::{EditorHost, Point, PointerId, Rect};
use crate::reorder::{
    DragActivity, DropIndicatorController, DropTarget, MoveOutcome, MoveRequest,
    PreviewController, ReorderError, execute, probe_point, resolve_block_at, resolve_drop_target,
};

/// What the pointer went down on, as hit-tested by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    /// A block's drag handle, with its client-space rect
    Grip { rect: Rect },
    /// An action control nested in the grip, such as an insert button
    GripAction,
    /// Document content; left to text selection
    Content,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Armed,
    Dragging,
}

/// Why an event did not affect the gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    ActivePointerAlreadyInProgress,
    NotAGrip,
    ActionControl,
    CaptureRefused,
    NoActivePointer,
    PointerMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    PointerCancelled,
    CaptureLost,
    /// The grip did not map to any top-level block
    Unresolved,
    NotReorderable,
    /// The dragged block is no longer at its recorded position
    SourceChanged,
}

/// Result of releasing a dragged block
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Moved(MoveOutcome),
    NoTarget,
    /// Target inside the source block or at either edge; nothing to do
    SelfDrop,
    Failed(ReorderError),
}

/// What a single handler call did
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Armed,
    /// Armed, still within the activation threshold
    Pending,
    /// The drag began; the host must call `on_frame` with this ticket on its
    /// next animation frame
    DragStarted { frame: FrameTicket },
    Tracking,
    /// Pointer released before the drag started, e.g. a click on the grip
    Released,
    Dropped(DropOutcome),
    Cancelled(CancelReason),
    Ignored(IgnoredReason),
}

/// Deferred work scheduled by one gesture
///
/// Holds a weak reference to the gesture's liveness token, so a ticket
/// outliving its gesture is recognisably dead even if a newer gesture is
/// running by the time it fires.
#[derive(Debug, Clone)]
pub struct FrameTicket {
    gesture: Weak<()>,
}

impl FrameTicket {
    pub fn is_live(&self) -> bool {
        self.gesture.strong_count() > 0
    }
}

impl PartialEq for FrameTicket {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.gesture, &other.gesture)
    }
}

#[derive(Debug)]
struct ArmedGesture {
    pointer_id: PointerId,
    start: Point,
    grip: Rect,
    liveness: Rc<()>,
}

/// Transient state of a drag past its activation threshold
#[derive(Debug)]
pub struct DragState {
    pointer_id: PointerId,
    source_position: usize,
    source_size: usize,
    source_id: NodeId,
    target: Option<DropTarget>,
    liveness: Rc<()>,
}

impl DragState {
    pub fn pointer_id(&self) -> PointerId {
        self.pointer_id
    }

    pub fn source_position(&self) -> usize {
        self.source_position
    }

    pub fn source_size(&self) -> usize {
        self.source_size
    }

    pub fn source_id(&self) -> NodeId {
        self.source_id
    }

    pub fn target(&self) -> Option<&DropTarget> {
        self.target.as_ref()
    }

    pub fn target_position(&self) -> Option<usize> {
        self.target.map(|target| target.position)
    }

    pub fn insert_before(&self) -> Option<bool> {
        self.target.map(|target| target.insert_before)
    }
}

#[derive(Debug, Default)]
enum GestureState {
    #[default]
    Idle,
    Armed(ArmedGesture),
    Dragging(DragState),
}

impl GestureState {
    fn pointer_id(&self) -> Option<PointerId> {
        match self {
            GestureState::Idle => None,
            GestureState::Armed(armed) => Some(armed.pointer_id),
            GestureState::Dragging(drag) => Some(drag.pointer_id),
        }
    }
}

/// Drives block drags from raw pointer events
///
/// The controller owns its host. Each `pointer_*` handler returns a
/// [`GestureOutcome`] describing what it did, which is also logged.
pub struct DragGestureController<H: EditorHost> {
    host: H,
    config: DragConfig,
    indicator: DropIndicatorController,
    preview: PreviewController,
    activity: DragActivity,
    state: GestureState,
}

impl<H: EditorHost> DragGestureController<H> {
    pub fn new(host: H, config: DragConfig) -> Self {
        let indicator = DropIndicatorController::new(config.indicator_thickness);
        let preview = PreviewController::new(config.preview_opacity, config.selected_class.clone());
        Self {
            host,
            config,
            indicator,
            preview,
            activity: DragActivity::new(),
            state: GestureState::Idle,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn activity(&self) -> &DragActivity {
        &self.activity
    }

    pub fn activity_mut(&mut self) -> &mut DragActivity {
        &mut self.activity
    }

    pub fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Armed(_) => GesturePhase::Armed,
            GestureState::Dragging(_) => GesturePhase::Dragging,
        }
    }

    pub fn active_pointer(&self) -> Option<PointerId> {
        self.state.pointer_id()
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        match &self.state {
            GestureState::Dragging(drag) => Some(drag),
            _ => None,
        }
    }

    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        position: Point,
        target: PointerTarget,
    ) -> GestureOutcome {
        if !matches!(self.state, GestureState::Idle) {
            return ignored("down", pointer_id, IgnoredReason::ActivePointerAlreadyInProgress);
        }
        let grip = match target {
            PointerTarget::Grip { rect } => rect,
            PointerTarget::GripAction => {
                return ignored("down", pointer_id, IgnoredReason::ActionControl);
            }
            PointerTarget::Content | PointerTarget::Outside => {
                return ignored("down", pointer_id, IgnoredReason::NotAGrip);
            }
        };

        if let Err(err) = self.host.set_pointer_capture(pointer_id) {
            warn!("could not capture pointer {pointer_id}: {err}");
            return ignored("down", pointer_id, IgnoredReason::CaptureRefused);
        }

        debug!("gesture armed by pointer {pointer_id} at ({}, {})", position.x, position.y);
        self.state = GestureState::Armed(ArmedGesture {
            pointer_id,
            start: position,
            grip,
            liveness: Rc::new(()),
        });
        GestureOutcome::Armed
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, position: Point) -> GestureOutcome {
        if let Some(reason) = self.check_pointer(pointer_id) {
            return ignored("move", pointer_id, reason);
        }

        match &self.state {
            GestureState::Armed(armed) => {
                if armed.start.distance_to(position) > self.config.activation_threshold {
                    self.begin_drag(position)
                } else {
                    GestureOutcome::Pending
                }
            }
            GestureState::Dragging(_) => self.track(position),
            GestureState::Idle => ignored("move", pointer_id, IgnoredReason::NoActivePointer),
        }
    }

    pub fn pointer_up(&mut self, pointer_id: PointerId, _position: Point) -> GestureOutcome {
        if let Some(reason) = self.check_pointer(pointer_id) {
            return ignored("up", pointer_id, reason);
        }

        match std::mem::take(&mut self.state) {
            GestureState::Armed(armed) => {
                self.cleanup(Some(armed.pointer_id));
                debug!("pointer {pointer_id} released before the drag started");
                GestureOutcome::Released
            }
            GestureState::Dragging(drag) => {
                self.cleanup(Some(drag.pointer_id));
                if !self.source_intact(&drag) {
                    return self.cancelled(CancelReason::SourceChanged);
                }
                GestureOutcome::Dropped(self.drop_block(&drag))
            }
            GestureState::Idle => ignored("up", pointer_id, IgnoredReason::NoActivePointer),
        }
    }

    pub fn pointer_cancel(&mut self, pointer_id: PointerId) -> GestureOutcome {
        self.abort(pointer_id, "cancel", CancelReason::PointerCancelled)
    }

    pub fn lost_pointer_capture(&mut self, pointer_id: PointerId) -> GestureOutcome {
        self.abort(pointer_id, "lostpointercapture", CancelReason::CaptureLost)
    }

    /// Run deferred work for `ticket`; returns false when its gesture has ended
    pub fn on_frame(&mut self, ticket: &FrameTicket) -> bool {
        let current = match &self.state {
            GestureState::Dragging(drag) => Rc::downgrade(&drag.liveness),
            _ => Weak::new(),
        };
        if !ticket.is_live() || !Weak::ptr_eq(&ticket.gesture, &current) {
            debug!("ignoring frame callback from a finished gesture");
            return false;
        }

        if let Err(err) = self.preview.settle(&mut self.host) {
            warn!("measuring drag preview failed: {err}");
        }
        true
    }

    /// Abandon any gesture in progress; safe to call at any time
    pub fn teardown(&mut self) {
        let pointer_id = std::mem::take(&mut self.state).pointer_id();
        self.cleanup(pointer_id);
    }

    fn check_pointer(&self, pointer_id: PointerId) -> Option<IgnoredReason> {
        match self.state.pointer_id() {
            None => Some(IgnoredReason::NoActivePointer),
            Some(active) if active != pointer_id => Some(IgnoredReason::PointerMismatch),
            Some(_) => None,
        }
    }

    fn abort(&mut self, pointer_id: PointerId, phase: &str, reason: CancelReason) -> GestureOutcome {
        if let Some(ignore) = self.check_pointer(pointer_id) {
            return ignored(phase, pointer_id, ignore);
        }
        self.teardown();
        self.cancelled(reason)
    }

    fn cancelled(&self, reason: CancelReason) -> GestureOutcome {
        debug!("gesture cancelled: {reason:?}");
        GestureOutcome::Cancelled(reason)
    }

    fn begin_drag(&mut self, position: Point) -> GestureOutcome {
        let GestureState::Armed(armed) = std::mem::take(&mut self.state) else {
            return GestureOutcome::Pending;
        };

        let probe = probe_point(armed.grip, self.config.grip_probe_offset);
        let Some(block) = resolve_block_at(&self.host, probe) else {
            self.cleanup(Some(armed.pointer_id));
            return self.cancelled(CancelReason::Unresolved);
        };
        if !block.kind.is_reorderable() {
            self.cleanup(Some(armed.pointer_id));
            return self.cancelled(CancelReason::NotReorderable);
        }

        self.host.set_selection(block.position);
        if let Err(err) = self.preview.start(&mut self.host, block.index, position) {
            warn!("drag preview unavailable: {err}");
        }

        let frame = FrameTicket {
            gesture: Rc::downgrade(&armed.liveness),
        };
        debug!(
            "drag started on {} block {} at position {} (size {})",
            block.kind.name(),
            block.index,
            block.position,
            block.size
        );
        self.state = GestureState::Dragging(DragState {
            pointer_id: armed.pointer_id,
            source_position: block.position,
            source_size: block.size,
            source_id: block.node_id,
            target: None,
            liveness: armed.liveness,
        });
        self.activity.set(true);
        self.retarget(position);

        GestureOutcome::DragStarted { frame }
    }

    fn track(&mut self, position: Point) -> GestureOutcome {
        let intact = match &self.state {
            GestureState::Dragging(drag) => self.source_intact(drag),
            _ => false,
        };
        if !intact {
            self.teardown();
            return self.cancelled(CancelReason::SourceChanged);
        }

        self.retarget(position);
        if let Err(err) = self.preview.move_to(&mut self.host, position) {
            debug!("moving drag preview failed: {err}");
        }
        GestureOutcome::Tracking
    }

    fn retarget(&mut self, position: Point) {
        let GestureState::Dragging(drag) = &mut self.state else {
            return;
        };
        let blocks = self.host.block_elements();
        drag.target = resolve_drop_target(&self.host, position.y, &blocks);
        if let Err(err) = self.indicator.update(&mut self.host, drag.target.as_ref()) {
            debug!("updating drop indicator failed: {err}");
        }
    }

    fn source_intact(&self, drag: &DragState) -> bool {
        self.host
            .node_at(drag.source_position)
            .is_some_and(|node| node.id() == drag.source_id)
    }

    fn drop_block(&mut self, drag: &DragState) -> DropOutcome {
        let Some(target) = drag.target else {
            debug!("released with no drop target");
            return DropOutcome::NoTarget;
        };
        let request = MoveRequest {
            source_position: drag.source_position,
            source_size: drag.source_size,
            target_position: target.position,
        };
        if request.is_self_drop() {
            debug!("released where the block already is");
            return DropOutcome::SelfDrop;
        }

        match execute(&mut self.host, request) {
            Ok(outcome) => DropOutcome::Moved(outcome),
            Err(err) => {
                warn!("block move {request:?} failed: {err}");
                DropOutcome::Failed(err)
            }
        }
    }

    /// Reset visuals, capture and the activity signal
    ///
    /// The gesture state must already have been taken.
    fn cleanup(&mut self, pointer_id: Option<PointerId>) {
        if let Err(err) = self.indicator.hide(&mut self.host) {
            debug!("hiding drop indicator during cleanup failed: {err}");
        }
        if let Err(err) = self.preview.remove(&mut self.host) {
            debug!("removing drag preview during cleanup failed: {err}");
        }
        if let Some(pointer_id) = pointer_id
            && let Err(err) = self.host.release_pointer_capture(pointer_id)
        {
            debug!("releasing pointer {pointer_id} during cleanup failed: {err}");
        }
        self.activity.set(false);
    }
}

impl<H: EditorHost> Drop for DragGestureController<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn ignored(phase: &str, pointer_id: PointerId, reason: IgnoredReason) -> GestureOutcome {
    debug!("pointer {phase} from {pointer_id} ignored: {reason:?}");
    GestureOutcome::Ignored(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Node, NodeKind};
    use crate::memory::MemoryEditor;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;

    /// Paragraphs "A", "B", "C", 20px high with no gaps: rows 0..20, 20..40, 40..60
    fn editor() -> MemoryEditor {
        MemoryEditor::new(Document::new(vec![
            Node::paragraph("A"),
            Node::paragraph("B"),
            Node::paragraph("C"),
        ]))
        .with_block_gap(0.0)
    }

    #[fixture]
    fn controller() -> DragGestureController<MemoryEditor> {
        DragGestureController::new(editor(), DragConfig::default())
    }

    fn grip(controller: &DragGestureController<MemoryEditor>, index: usize) -> (Point, PointerTarget) {
        let rect = controller.host().grip_rect(index).unwrap();
        (
            Point::new(rect.x + 4.0, rect.mid_y()),
            PointerTarget::Grip { rect },
        )
    }

    fn start_drag(controller: &mut DragGestureController<MemoryEditor>, index: usize) -> FrameTicket {
        let (start, target) = grip(controller, index);
        assert_eq!(controller.pointer_down(1, start, target), GestureOutcome::Armed);
        match controller.pointer_move(1, Point::new(start.x, start.y + 9.0)) {
            GestureOutcome::DragStarted { frame } => frame,
            other => panic!("expected drag to start, got {other:?}"),
        }
    }

    #[rstest]
    fn test_down_on_grip_arms_and_captures(mut controller: DragGestureController<MemoryEditor>) {
        let (start, target) = grip(&controller, 0);

        assert_eq!(controller.pointer_down(1, start, target), GestureOutcome::Armed);
        assert_eq!(controller.phase(), GesturePhase::Armed);
        assert_eq!(controller.host().captured_pointer(), Some(1));
        assert_eq!(controller.host().document().version(), 0);
    }

    #[rstest]
    #[case::action(PointerTarget::GripAction, IgnoredReason::ActionControl)]
    #[case::content(PointerTarget::Content, IgnoredReason::NotAGrip)]
    #[case::outside(PointerTarget::Outside, IgnoredReason::NotAGrip)]
    fn test_down_elsewhere_is_ignored(
        mut controller: DragGestureController<MemoryEditor>,
        #[case] target: PointerTarget,
        #[case] reason: IgnoredReason,
    ) {
        assert_eq!(
            controller.pointer_down(1, Point::new(5.0, 5.0), target),
            GestureOutcome::Ignored(reason)
        );
        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert_eq!(controller.host().captured_pointer(), None);
    }

    #[rstest]
    fn test_movement_within_threshold_stays_armed(mut controller: DragGestureController<MemoryEditor>) {
        let (start, target) = grip(&controller, 0);
        controller.pointer_down(1, start, target);

        // exactly 8px away is not beyond the threshold
        let outcome = controller.pointer_move(1, Point::new(start.x, start.y + 8.0));

        assert_eq!(outcome, GestureOutcome::Pending);
        assert!(controller.host().previews().is_empty());
        assert!(controller.host().indicator().is_none());
        assert!(controller.drag_state().is_none());
    }

    #[rstest]
    fn test_threshold_crossing_starts_drag(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 1);

        let drag = controller.drag_state().unwrap();
        assert_eq!(drag.source_position(), 3);
        assert_eq!(drag.source_size(), 3);
        assert_eq!(controller.host().selection(), Some(3));
        assert_eq!(controller.host().previews().len(), 1);
        assert!(controller.activity().is_active());
    }

    #[rstest]
    fn test_second_grip_ignored_while_active(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);
        let (start, target) = grip(&controller, 2);

        assert_eq!(
            controller.pointer_down(2, start, target),
            GestureOutcome::Ignored(IgnoredReason::ActivePointerAlreadyInProgress)
        );
        assert_eq!(
            controller.pointer_move(2, Point::new(0.0, 0.0)),
            GestureOutcome::Ignored(IgnoredReason::PointerMismatch)
        );
        assert_eq!(controller.drag_state().map(DragState::pointer_id), Some(1));
    }

    #[rstest]
    fn test_drag_to_end_moves_block(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);

        assert_eq!(controller.pointer_move(1, Point::new(200.0, 55.0)), GestureOutcome::Tracking);
        assert_eq!(controller.drag_state().and_then(DragState::target_position), Some(9));
        let outcome = controller.pointer_up(1, Point::new(200.0, 55.0));

        assert_eq!(
            outcome,
            GestureOutcome::Dropped(DropOutcome::Moved(MoveOutcome { from: 0, to: 6 }))
        );
        assert_eq!(controller.host().document().block_texts(), ["B", "C", "A"]);
        assert_eq!(controller.host().document().version(), 1);
        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert!(controller.host().previews().is_empty());
        assert!(controller.host().indicator().is_none());
        assert_eq!(controller.host().captured_pointer(), None);
        assert!(!controller.activity().is_active());
    }

    #[rstest]
    fn test_release_over_source_is_a_no_op(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 1);
        controller.pointer_move(1, Point::new(200.0, 25.0));

        let outcome = controller.pointer_up(1, Point::new(200.0, 25.0));

        assert_eq!(outcome, GestureOutcome::Dropped(DropOutcome::SelfDrop));
        assert_eq!(controller.host().document().version(), 0);
    }

    #[rstest]
    fn test_release_just_below_grabbed_block_is_a_no_op(
        mut controller: DragGestureController<MemoryEditor>,
    ) {
        let original = controller.host().document().blocks()[0].id();
        start_drag(&mut controller, 0);
        assert_eq!(controller.drag_state().and_then(DragState::target_position), Some(3));

        let outcome = controller.pointer_up(1, Point::new(4.0, 19.0));

        assert_eq!(outcome, GestureOutcome::Dropped(DropOutcome::SelfDrop));
        assert_eq!(controller.host().document().version(), 0);
        assert_eq!(controller.host().document().block_texts(), ["A", "B", "C"]);
        assert_eq!(controller.host().document().blocks()[0].id(), original);
        assert_eq!(controller.host().selection(), Some(0));
    }

    #[rstest]
    fn test_click_on_grip_releases(mut controller: DragGestureController<MemoryEditor>) {
        let (start, target) = grip(&controller, 0);
        controller.pointer_down(1, start, target);

        assert_eq!(controller.pointer_up(1, start), GestureOutcome::Released);
        assert_eq!(controller.host().captured_pointer(), None);
        assert_eq!(controller.phase(), GesturePhase::Idle);
    }

    #[rstest]
    fn test_cancel_is_idempotent(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);

        assert_eq!(
            controller.pointer_cancel(1),
            GestureOutcome::Cancelled(CancelReason::PointerCancelled)
        );
        assert_eq!(
            controller.pointer_cancel(1),
            GestureOutcome::Ignored(IgnoredReason::NoActivePointer)
        );
        controller.teardown();
        controller.teardown();

        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert_eq!(controller.host().preview_removals(), 1);
        assert_eq!(controller.host().capture_releases(), 1);
        assert_eq!(controller.host().document().version(), 0);
    }

    #[rstest]
    fn test_capture_loss_cancels(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);

        assert_eq!(
            controller.lost_pointer_capture(1),
            GestureOutcome::Cancelled(CancelReason::CaptureLost)
        );
        assert!(controller.host().previews().is_empty());
    }

    #[rstest]
    fn test_teardown_tolerates_detached_view(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);
        controller.host_mut().detach();

        controller.teardown();

        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert!(!controller.activity().is_active());
    }

    #[rstest]
    fn test_stale_frame_ticket_is_rejected(mut controller: DragGestureController<MemoryEditor>) {
        let first = start_drag(&mut controller, 0);
        controller.pointer_cancel(1);
        let second = start_drag(&mut controller, 1);

        assert!(!first.is_live());
        assert!(!controller.on_frame(&first));
        assert!(controller.on_frame(&second));
    }

    #[rstest]
    fn test_unresolvable_grip_cancels(mut controller: DragGestureController<MemoryEditor>) {
        let rect = Rect::new(0.0, 500.0, 24.0, 20.0);
        controller.pointer_down(1, Point::new(4.0, 510.0), PointerTarget::Grip { rect });

        assert_eq!(
            controller.pointer_move(1, Point::new(4.0, 530.0)),
            GestureOutcome::Cancelled(CancelReason::Unresolved)
        );
        assert_eq!(controller.host().captured_pointer(), None);
    }

    #[rstest]
    fn test_concurrent_removal_of_source_aborts(mut controller: DragGestureController<MemoryEditor>) {
        start_drag(&mut controller, 0);
        controller
            .host_mut()
            .document_mut()
            .apply(crate::document::Transaction::new().delete(0..3))
            .unwrap();

        assert_eq!(
            controller.pointer_move(1, Point::new(200.0, 35.0)),
            GestureOutcome::Cancelled(CancelReason::SourceChanged)
        );
        assert_eq!(controller.host().document().block_texts(), ["B", "C"]);
    }

    #[rstest]
    fn test_source_removed_before_release_drops_nothing(
        mut controller: DragGestureController<MemoryEditor>,
    ) {
        start_drag(&mut controller, 0);
        controller.pointer_move(1, Point::new(200.0, 55.0));
        assert_eq!(controller.drag_state().and_then(DragState::target_position), Some(9));
        controller
            .host_mut()
            .document_mut()
            .apply(crate::document::Transaction::new().delete(0..3))
            .unwrap();

        let outcome = controller.pointer_up(1, Point::new(200.0, 55.0));

        assert_eq!(outcome, GestureOutcome::Cancelled(CancelReason::SourceChanged));
        assert_eq!(controller.host().document().block_texts(), ["B", "C"]);
        assert_eq!(controller.host().document().version(), 1);
        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert_eq!(controller.host().captured_pointer(), None);
        assert!(controller.host().previews().is_empty());
        assert!(controller.host().indicator().is_none());
        assert!(!controller.activity().is_active());
    }

    #[test]
    fn test_list_blocks_are_draggable_as_a_whole() {
        let doc = Document::new(vec![
            Node::paragraph("intro"),
            Node::branch(
                NodeKind::BulletList,
                vec![Node::branch(NodeKind::ListItem, vec![Node::paragraph("x")])],
            ),
        ]);
        let mut controller = DragGestureController::new(
            MemoryEditor::new(doc).with_block_gap(0.0),
            DragConfig::default(),
        );

        start_drag(&mut controller, 1);
        controller.pointer_move(1, Point::new(200.0, 2.0));
        controller.pointer_up(1, Point::new(200.0, 2.0));

        let kinds: Vec<_> = controller
            .host()
            .document()
            .blocks()
            .iter()
            .map(|block| block.kind().clone())
            .collect();
        assert_eq!(kinds, [NodeKind::BulletList, NodeKind::Paragraph]);
    }

    #[test]
    fn test_activity_listeners_follow_gesture() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut controller = DragGestureController::new(editor(), DragConfig::default());
        let sink = Rc::clone(&seen);
        controller
            .activity_mut()
            .subscribe(move |active| sink.borrow_mut().push(active));

        start_drag(&mut controller, 0);
        controller.pointer_up(1, Point::default());

        assert_eq!(*seen.borrow(), vec![true, false]);
    }
}
