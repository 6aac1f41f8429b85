// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory with:
// - Value objects
// - Commands
// - Errors
// - Command handler / service
//
// Persistence goes through the traits in crate::store.
//
// ============================================================================

pub mod order;
pub mod customer;
