use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::customer::CustomerStatus;

// ============================================================================
// Status Edits - optimistic customer status changes
// ============================================================================
//
// Entries exist only for customers the dashboard currently shows: the page
// calls `forget` for rows that scroll or page out of view.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStatus {
    confirmed: CustomerStatus,
    proposed: CustomerStatus,
}

/// Optimistic customer status changes.
///
/// A proposed status is displayed right away. The server's answer either
/// confirms it (or replaces it with what the server stored) or the change is
/// rolled back to the last confirmed status.
#[derive(Debug, Default)]
pub struct StatusEdits {
    confirmed: HashMap<Uuid, CustomerStatus>,
    pending: HashMap<Uuid, PendingStatus>,
}

impl StatusEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change from `confirmed` to `proposed` that is not yet acknowledged.
    /// A second proposal keeps the original confirmed status.
    pub fn propose(&mut self, customer_id: Uuid, confirmed: CustomerStatus, proposed: CustomerStatus) {
        let confirmed = self
            .pending
            .get(&customer_id)
            .map_or(confirmed, |pending| pending.confirmed);
        self.pending
            .insert(customer_id, PendingStatus { confirmed, proposed });
    }

    pub fn confirm(&mut self, customer_id: Uuid, server_status: CustomerStatus) {
        self.pending.remove(&customer_id);
        self.confirmed.insert(customer_id, server_status);
    }

    /// Abandon the pending change and return the status to display again.
    pub fn rollback(&mut self, customer_id: Uuid) -> Option<CustomerStatus> {
        let pending = self.pending.remove(&customer_id)?;
        self.confirmed.insert(customer_id, pending.confirmed);
        Some(pending.confirmed)
    }

    pub fn displayed(&self, customer_id: Uuid) -> Option<CustomerStatus> {
        self.pending
            .get(&customer_id)
            .map(|pending| pending.proposed)
            .or_else(|| self.confirmed.get(&customer_id).copied())
    }

    pub fn is_pending(&self, customer_id: Uuid) -> bool {
        self.pending.contains_key(&customer_id)
    }

    /// Drop everything known about a customer that is no longer displayed.
    pub fn forget(&mut self, customer_id: Uuid) {
        self.pending.remove(&customer_id);
        self.confirmed.remove(&customer_id);
    }

    /// Number of customers with a known or pending status.
    pub fn tracked(&self) -> usize {
        self.confirmed
            .keys()
            .chain(self.pending.keys().filter(|id| !self.confirmed.contains_key(id)))
            .count()
    }
}
