use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// Customer Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegisterCustomer {
    pub name: String,
    pub email: String,
    /// Defaults to `prospect` when absent.
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangeCustomerStatus {
    pub customer_id: Uuid,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}
