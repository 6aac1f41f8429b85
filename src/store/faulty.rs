use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use super::{
    CrmStore, CustomerStore, InMemoryStore, MeasurementStore, OrderItemRepository, OrderReadStore, StoreError,
    StoreResult,
};
use crate::domain::customer::CustomerStatus;
use crate::domain::order::Measurements;
use crate::models::{Customer, CustomerPage, MeasurementRecord, NewCustomer, OrderItem, OrderView};
use crate::query::CustomerQuery;
use crate::seed::Dataset;

// ============================================================================
// Faulty Store - InMemoryStore with switchable failures (tests only)
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// Every repoint fails with a foreign-key violation.
    pub reject_repoint: bool,
    pub fail_reference_count: bool,
    pub fail_orphan_delete: bool,
    /// Point this item at the record right before the conditional delete runs.
    pub reference_before_delete: Option<Uuid>,
}

pub struct FaultyStore {
    inner: Arc<InMemoryStore>,
    faults: Mutex<Faults>,
    repoints: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            repoints: AtomicUsize::new(0),
        }
    }

    pub fn inject(&self, configure: impl FnOnce(&mut Faults)) {
        configure(&mut self.faults.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Repoint calls seen so far, rejected ones included.
    pub fn repoint_calls(&self) -> usize {
        self.repoints.load(Ordering::SeqCst)
    }

    fn faults(&self) -> Faults {
        *self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MeasurementStore for FaultyStore {
    async fn find_by_triple(&self, measurements: &Measurements) -> StoreResult<Option<MeasurementRecord>> {
        self.inner.find_by_triple(measurements).await
    }

    async fn get_measurement(&self, id: Uuid) -> StoreResult<Option<MeasurementRecord>> {
        self.inner.get_measurement(id).await
    }

    async fn create_measurement(
        &self,
        measurements: &Measurements,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<MeasurementRecord> {
        self.inner.create_measurement(measurements, modified_at).await
    }

    async fn delete_measurement(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_measurement(id).await
    }

    async fn delete_measurement_if_orphaned(&self, id: Uuid) -> StoreResult<bool> {
        let faults = self.faults();
        if faults.fail_orphan_delete {
            return Err(StoreError::Backend("connection reset by peer".to_string()));
        }
        if let Some(item_id) = faults.reference_before_delete {
            self.inner.update_measurement_ref(item_id, id, Utc::now()).await?;
        }
        self.inner.delete_measurement_if_orphaned(id).await
    }

    async fn count_referencing_items(&self, id: Uuid) -> StoreResult<i64> {
        if self.faults().fail_reference_count {
            return Err(StoreError::Backend("statement timeout".to_string()));
        }
        self.inner.count_referencing_items(id).await
    }
}

#[async_trait]
impl OrderItemRepository for FaultyStore {
    async fn get_order_item(&self, item_id: Uuid, order_id: Uuid) -> StoreResult<Option<OrderItem>> {
        self.inner.get_order_item(item_id, order_id).await
    }

    async fn update_measurement_ref(
        &self,
        item_id: Uuid,
        measurement_id: Uuid,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<OrderItem> {
        self.repoints.fetch_add(1, Ordering::SeqCst);
        if self.faults().reject_repoint {
            return Err(StoreError::ForeignKeyViolation(format!(
                "custom size {measurement_id} does not exist"
            )));
        }
        self.inner.update_measurement_ref(item_id, measurement_id, modified_at).await
    }
}

#[async_trait]
impl CustomerStore for FaultyStore {
    async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<CustomerPage> {
        self.inner.list_customers(query).await
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        self.inner.get_customer(id).await
    }

    async fn create_customer(&self, customer: NewCustomer, created_at: DateTime<Utc>) -> StoreResult<Customer> {
        self.inner.create_customer(customer, created_at).await
    }

    async fn update_customer_status(
        &self,
        id: Uuid,
        status: CustomerStatus,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<Customer> {
        self.inner.update_customer_status(id, status, modified_at).await
    }
}

#[async_trait]
impl OrderReadStore for FaultyStore {
    async fn list_customer_orders(&self, customer_id: Uuid) -> StoreResult<Vec<OrderView>> {
        self.inner.list_customer_orders(customer_id).await
    }
}

#[async_trait]
impl CrmStore for FaultyStore {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn import_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        self.inner.import_dataset(dataset).await
    }
}
