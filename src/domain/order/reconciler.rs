use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::commands::UpdateCustomSize;
use super::errors::OrderError;
use super::value_objects::Measurements;
use crate::error::CrmError;
use crate::models::{MeasurementRecord, OrderItem};
use crate::store::{CrmStore, MeasurementStore, OrderItemRepository, StoreError};
use crate::utils::KeyedLocks;

// ============================================================================
// Custom-Size Reconciler
// ============================================================================
//
// Rebinds one order item to the measurement record matching a submitted
// triple:
//
//   validate → load item (scoped to its order) → find-or-create record
//            → repoint item → drop the old record if nothing uses it
//
// Locking:
// - item lock: held for the whole reconciliation
// - measurement lock: target held from existence check through repoint,
//   old record held around reference count + conditional delete
// - at most one measurement lock at a time, always taken after the item lock
//
// A record that vanishes before the repoint is re-resolved a bounded number
// of times. An orphan the backend refuses to delete is left in place.
//
// ============================================================================

pub const MAX_TARGET_ATTEMPTS: usize = 3;

/// What happened to the measurement record the item pointed at before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanCleanup {
    /// The item already pointed at the target record.
    Unchanged,
    Deleted(Uuid),
    /// Other items still reference the record.
    Retained { id: Uuid, references: i64 },
    /// The conditional delete found a fresh reference and removed nothing.
    Declined(Uuid),
    /// Counting or deleting failed; the record may have leaked.
    Failed(Uuid),
}

impl OrphanCleanup {
    pub fn label(&self) -> &'static str {
        match self {
            OrphanCleanup::Unchanged => "unchanged",
            OrphanCleanup::Deleted(_) => "deleted",
            OrphanCleanup::Retained { .. } => "retained",
            OrphanCleanup::Declined(_) => "declined",
            OrphanCleanup::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub item: OrderItem,
    pub measurement: MeasurementRecord,
    /// Whether a new measurement record was inserted.
    pub created: bool,
    pub cleanup: OrphanCleanup,
    pub updated_at: DateTime<Utc>,
}

pub struct CustomSizeReconciler {
    store: Arc<dyn CrmStore>,
    item_locks: KeyedLocks<Uuid>,
    measurement_locks: KeyedLocks<Uuid>,
}

impl CustomSizeReconciler {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self {
            store,
            item_locks: KeyedLocks::new(),
            measurement_locks: KeyedLocks::new(),
        }
    }

    pub async fn reconcile(&self, command: UpdateCustomSize) -> Result<ReconcileOutcome, CrmError> {
        let measurements = command.custom_size.validate()?;
        let updated_at = command.updated_at.unwrap_or_else(Utc::now);

        let _item_guard = self.item_locks.lock(command.item_id).await;

        let item = self
            .store
            .get_order_item(command.item_id, command.order_id)
            .await?
            .ok_or(OrderError::ItemNotFound {
                order_id: command.order_id,
                item_id: command.item_id,
            })?;
        let previous = item.measurement_id;

        let (item, measurement, created) = self.bind_target(item.id, &measurements, updated_at).await?;

        let cleanup = if previous == measurement.id {
            OrphanCleanup::Unchanged
        } else {
            self.release(previous).await
        };

        tracing::info!(
            order_id = %item.order_id,
            item_id = %item.id,
            custom_size_id = %measurement.id,
            measurements = %measurements,
            created,
            cleanup = cleanup.label(),
            "✅ Custom size reconciled"
        );

        Ok(ReconcileOutcome {
            item,
            measurement,
            created,
            cleanup,
            updated_at,
        })
    }

    async fn bind_target(
        &self,
        item_id: Uuid,
        measurements: &Measurements,
        updated_at: DateTime<Utc>,
    ) -> Result<(OrderItem, MeasurementRecord, bool), CrmError> {
        for attempt in 1..=MAX_TARGET_ATTEMPTS {
            let (candidate, created) = match self.store.find_by_triple(measurements).await? {
                Some(record) => (record, false),
                None => (self.store.create_measurement(measurements, updated_at).await?, true),
            };

            let _target_guard = self.measurement_locks.lock(candidate.id).await;

            let Some(target) = self.store.get_measurement(candidate.id).await? else {
                tracing::debug!(attempt, custom_size_id = %candidate.id, "Target custom size vanished before repoint");
                continue;
            };

            match self.store.update_measurement_ref(item_id, target.id, updated_at).await {
                Ok(item) => return Ok((item, target, created)),
                Err(StoreError::ForeignKeyViolation(reason)) => {
                    tracing::warn!(
                        attempt,
                        custom_size_id = %target.id,
                        reason = %reason,
                        "Repoint rejected, resolving target again"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OrderError::MeasurementUnavailable {
            attempts: MAX_TARGET_ATTEMPTS,
        }
        .into())
    }

    async fn release(&self, previous: Uuid) -> OrphanCleanup {
        let _old_guard = self.measurement_locks.lock(previous).await;

        let references = match self.store.count_referencing_items(previous).await {
            Ok(references) => references,
            Err(e) => {
                tracing::warn!(custom_size_id = %previous, error = %e, "Could not count custom size references");
                return OrphanCleanup::Failed(previous);
            }
        };
        if references > 0 {
            return OrphanCleanup::Retained {
                id: previous,
                references,
            };
        }

        match self.store.delete_measurement_if_orphaned(previous).await {
            Ok(true) => {
                tracing::debug!(custom_size_id = %previous, "Deleted orphaned custom size");
                OrphanCleanup::Deleted(previous)
            }
            Ok(false) => OrphanCleanup::Declined(previous),
            Err(e) => {
                tracing::warn!(custom_size_id = %previous, error = %e, "Orphan cleanup failed");
                OrphanCleanup::Failed(previous)
            }
        }
    }
}
