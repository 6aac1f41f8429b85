// ============================================================================
// Customer Domain - Registration and status changes
// ============================================================================
//
// - Value objects (Email, CustomerStatus)
// - Commands (RegisterCustomer, ChangeCustomerStatus)
// - Errors (CustomerError enum)
// - Command Handler (CustomerCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use command_handler::*;
