// ============================================================================
// Store Layer - persistence behind traits
// ============================================================================
//
// The service code only ever sees `Arc<dyn CrmStore>`. Two backends exist:
// - postgres: sqlx + PostgreSQL, referential integrity enforced by the schema
// - memory:   tokio RwLock tables, used for demos and tests
//
// Every trait method is one atomic store call. Multi-step workflows (the
// custom-size reconciliation) compose them and own the ordering.
//
// ============================================================================

pub mod memory;
pub mod postgres;
pub mod schema;

#[cfg(test)]
pub(crate) mod faulty;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::domain::customer::CustomerStatus;
use crate::domain::order::Measurements;
use crate::models::{Customer, CustomerPage, MeasurementRecord, NewCustomer, OrderItem, OrderView};
use crate::query::CustomerQuery;
use crate::seed::Dataset;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Custom-size records, identified by id and reused by value.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Exact-value lookup; the oldest record wins if duplicates exist.
    async fn find_by_triple(&self, measurements: &Measurements) -> StoreResult<Option<MeasurementRecord>>;

    async fn get_measurement(&self, id: Uuid) -> StoreResult<Option<MeasurementRecord>>;

    async fn create_measurement(
        &self,
        measurements: &Measurements,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<MeasurementRecord>;

    /// Delete by id. Reference safety is the caller's business, although the
    /// backend may still refuse with `ForeignKeyViolation`.
    async fn delete_measurement(&self, id: Uuid) -> StoreResult<()>;

    /// Delete only if no order item references the record, as one statement.
    /// Returns whether a row was removed.
    async fn delete_measurement_if_orphaned(&self, id: Uuid) -> StoreResult<bool>;

    async fn count_referencing_items(&self, id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait OrderItemRepository: Send + Sync {
    /// Scoped lookup: the item must belong to `order_id`.
    async fn get_order_item(&self, item_id: Uuid, order_id: Uuid) -> StoreResult<Option<OrderItem>>;

    /// Repoint the item at another measurement record.
    async fn update_measurement_ref(
        &self,
        item_id: Uuid,
        measurement_id: Uuid,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<OrderItem>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<CustomerPage>;

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;

    /// Fails with `UniqueViolation` when the email is taken.
    async fn create_customer(&self, customer: NewCustomer, created_at: DateTime<Utc>) -> StoreResult<Customer>;

    async fn update_customer_status(
        &self,
        id: Uuid,
        status: CustomerStatus,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<Customer>;
}

#[async_trait]
pub trait OrderReadStore: Send + Sync {
    /// Orders newest first, each with its items, categories and custom sizes.
    async fn list_customer_orders(&self, customer_id: Uuid) -> StoreResult<Vec<OrderView>>;
}

#[async_trait]
pub trait CrmStore: MeasurementStore + OrderItemRepository + CustomerStore + OrderReadStore {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;

    /// Bulk-load a generated dataset.
    async fn import_dataset(&self, dataset: &Dataset) -> StoreResult<()>;
}
