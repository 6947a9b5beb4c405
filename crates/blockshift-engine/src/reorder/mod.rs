//! # Block reordering
//!
//! Pointer-driven drag and drop of top-level blocks, built from raw pointer
//! events rather than any native drag primitive.
//!
//! Data flows one way:
//!
//! ```text
//! pointer events -> DragGestureController -> resolver, preview, indicator
//!                                         -> (on release) executor -> Document
//! ```
//!
//! Only the executor mutates the document, and it does so with a single
//! transaction. Everything else reads the view or writes overlays.

pub mod error;
pub mod executor;
pub mod gesture;
pub mod indicator;
pub mod preview;
pub mod resolver;
pub mod signal;

pub use error::ReorderError;
pub use executor::{MoveOutcome, MoveRequest, execute};
pub use gesture::{
    CancelReason, DragGestureController, DragState, DropOutcome, FrameTicket, GestureOutcome,
    GesturePhase, IgnoredReason, PointerTarget,
};
pub use indicator::DropIndicatorController;
pub use preview::PreviewController;
pub use resolver::{
    DropTarget, ResolvedBlock, probe_point, resolve_block_at, resolve_drop_target,
};
pub use signal::{DragActivity, SubscriptionId};
