use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::CustomSizeDraft;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Change the custom size bound to one order item.
#[derive(Debug, Clone)]
pub struct UpdateCustomSize {
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub custom_size: CustomSizeDraft,
    /// Client-supplied modification time; the server clock is used when absent.
    pub updated_at: Option<DateTime<Utc>>,
}
