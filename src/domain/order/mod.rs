// ============================================================================
// Order Domain - Custom-size reconciliation for order items
// ============================================================================
//
// This module contains the order-item specific code:
// - Value objects (Measurements, CustomSizeDraft)
// - Commands (UpdateCustomSize)
// - Errors (OrderError enum)
// - Reconciler (CustomSizeReconciler: find-or-create, repoint, orphan cleanup)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod reconciler;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use reconciler::*;
