//! Pointer interaction: viewport mapping, click/drag discrimination and the
//! drag state machine that moves and snaps connected groups.

pub mod drag;
pub mod threshold;
pub mod viewport;

pub use drag::{DragController, DragOutcome, DragState, GroupMemberOffset, PointerEvent};
pub use threshold::{DragThreshold, DEFAULT_DRAG_THRESHOLD};
pub use viewport::Viewport;
