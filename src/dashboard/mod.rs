// ============================================================================
// Dashboard State - client-side editing state, free of any rendering layer
// ============================================================================
//
// - ItemEditBoard: per-item custom-size edit state machine
// - StatusEdits:   optimistic customer status changes with rollback
//
// ============================================================================

pub mod item_edits;
pub mod status_edits;

pub use item_edits::{EditError, ItemEditBoard, ItemEditState, ItemKey};
pub use status_edits::StatusEdits;
