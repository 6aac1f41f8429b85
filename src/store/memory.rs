use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CrmStore, CustomerStore, MeasurementStore, OrderItemRepository, OrderReadStore, StoreError, StoreResult,
};
use crate::domain::customer::CustomerStatus;
use crate::domain::order::Measurements;
use crate::models::{
    category_name, Customer, CustomerPage, MeasurementRecord, Money, NewCustomer, Order, OrderItem, OrderItemView,
    OrderView,
};
use crate::query::{CustomerQuery, SortColumn, SortOrder};
use crate::seed::Dataset;

// ============================================================================
// In-Memory Store
// ============================================================================
//
// All tables live behind one RwLock, so every trait method is atomic. The
// same referential rules as the PostgreSQL schema apply: an item can only be
// pointed at an existing measurement record, and a referenced record cannot
// be deleted.
//
// ============================================================================

#[derive(Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    orders: HashMap<Uuid, Order>,
    items: HashMap<Uuid, OrderItem>,
    measurements: HashMap<Uuid, MeasurementRecord>,
}

impl Tables {
    fn references(&self, measurement_id: Uuid) -> i64 {
        self.items
            .values()
            .filter(|item| item.measurement_id == measurement_id)
            .count() as i64
    }

    fn email_taken(&self, customer: &Customer) -> bool {
        self.customers
            .values()
            .any(|existing| existing.id != customer.id && existing.email == customer.email)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn measurement_count(&self) -> usize {
        self.tables.read().await.measurements.len()
    }

    pub async fn all_measurements(&self) -> Vec<MeasurementRecord> {
        self.tables.read().await.measurements.values().cloned().collect()
    }

    pub async fn item(&self, item_id: Uuid) -> Option<OrderItem> {
        self.tables.read().await.items.get(&item_id).cloned()
    }
}

fn compare_customers(a: &Customer, b: &Customer, sort: SortColumn, order: SortOrder) -> Ordering {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };

    let primary = match sort {
        SortColumn::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
        SortColumn::Name => directed(a.name.cmp(&b.name)),
        SortColumn::Email => directed(a.email.as_str().cmp(b.email.as_str())),
        SortColumn::Revenue => directed(a.revenue.cmp(&b.revenue)),
        SortColumn::OrderCount => directed(a.order_count.cmp(&b.order_count)),
        // NULLS LAST in both directions, like the SQL backend
        SortColumn::LastOrderDate => match (a.last_order_date, b.last_order_date) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };

    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl MeasurementStore for InMemoryStore {
    async fn find_by_triple(&self, measurements: &Measurements) -> StoreResult<Option<MeasurementRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .measurements
            .values()
            .filter(|record| record.measurements == *measurements)
            .min_by_key(|record| (record.modified_at, record.id))
            .cloned())
    }

    async fn get_measurement(&self, id: Uuid) -> StoreResult<Option<MeasurementRecord>> {
        Ok(self.tables.read().await.measurements.get(&id).cloned())
    }

    async fn create_measurement(
        &self,
        measurements: &Measurements,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<MeasurementRecord> {
        let record = MeasurementRecord {
            id: Uuid::new_v4(),
            measurements: *measurements,
            modified_at,
        };
        self.tables
            .write()
            .await
            .measurements
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_measurement(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.measurements.contains_key(&id) {
            return Err(StoreError::not_found("custom size", id));
        }
        let references = tables.references(id);
        if references > 0 {
            return Err(StoreError::ForeignKeyViolation(format!(
                "custom size {id} is still referenced by {references} order item(s)"
            )));
        }
        tables.measurements.remove(&id);
        Ok(())
    }

    async fn delete_measurement_if_orphaned(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.references(id) > 0 {
            return Ok(false);
        }
        Ok(tables.measurements.remove(&id).is_some())
    }

    async fn count_referencing_items(&self, id: Uuid) -> StoreResult<i64> {
        Ok(self.tables.read().await.references(id))
    }
}

#[async_trait]
impl OrderItemRepository for InMemoryStore {
    async fn get_order_item(&self, item_id: Uuid, order_id: Uuid) -> StoreResult<Option<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .get(&item_id)
            .filter(|item| item.order_id == order_id)
            .cloned())
    }

    async fn update_measurement_ref(
        &self,
        item_id: Uuid,
        measurement_id: Uuid,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<OrderItem> {
        let mut tables = self.tables.write().await;
        if !tables.measurements.contains_key(&measurement_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "custom size {measurement_id} does not exist"
            )));
        }

        let item = tables
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::not_found("order item", item_id))?;
        item.measurement_id = measurement_id;
        item.modified_at = modified_at;
        Ok(item.clone())
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<CustomerPage> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Customer> = tables
            .customers
            .values()
            .filter(|customer| query.matches(&customer.name, customer.email.as_str()))
            .collect();
        matching.sort_by(|a, b| compare_customers(a, b, query.sort, query.order));

        let total = matching.len() as u64;
        let customers = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(CustomerPage { customers, total })
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn create_customer(&self, customer: NewCustomer, created_at: DateTime<Utc>) -> StoreResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            email: customer.email,
            status: customer.status,
            revenue: Money::ZERO,
            order_count: 0,
            last_order_date: None,
            created_at,
            modified_at: created_at,
        };

        let mut tables = self.tables.write().await;
        if tables.email_taken(&customer) {
            return Err(StoreError::UniqueViolation(format!(
                "email {} is already registered",
                customer.email
            )));
        }
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update_customer_status(
        &self,
        id: Uuid,
        status: CustomerStatus,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<Customer> {
        let mut tables = self.tables.write().await;
        let customer = tables
            .customers
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("customer", id))?;
        customer.status = status;
        customer.modified_at = modified_at;
        Ok(customer.clone())
    }
}

#[async_trait]
impl OrderReadStore for InMemoryStore {
    async fn list_customer_orders(&self, customer_id: Uuid) -> StoreResult<Vec<OrderView>> {
        let tables = self.tables.read().await;

        let mut orders: Vec<&Order> = tables
            .orders
            .values()
            .filter(|order| order.customer_id == customer_id)
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then_with(|| a.id.cmp(&b.id)));

        let views = orders
            .into_iter()
            .map(|order| {
                let mut items: Vec<&OrderItem> = tables
                    .items
                    .values()
                    .filter(|item| item.order_id == order.id)
                    .collect();
                items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

                OrderView {
                    order: order.clone(),
                    items: items
                        .into_iter()
                        .map(|item| OrderItemView {
                            item: item.clone(),
                            category: item.category_id.and_then(category_name).map(String::from),
                            measurement: tables.measurements.get(&item.measurement_id).cloned(),
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(views)
    }
}

#[async_trait]
impl CrmStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn import_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        for record in &dataset.measurements {
            tables.measurements.insert(record.id, record.clone());
        }
        for customer in &dataset.customers {
            if tables.email_taken(customer) {
                return Err(StoreError::UniqueViolation(format!(
                    "email {} is already registered",
                    customer.email
                )));
            }
            tables.customers.insert(customer.id, customer.clone());
        }
        for order in &dataset.orders {
            tables.orders.insert(order.id, order.clone());
        }
        for item in &dataset.items {
            if !tables.measurements.contains_key(&item.measurement_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "order item {} references missing custom size {}",
                    item.id, item.measurement_id
                )));
            }
            tables.items.insert(item.id, item.clone());
        }

        tracing::info!(
            customers = dataset.customers.len(),
            orders = dataset.orders.len(),
            items = dataset.items.len(),
            custom_sizes = dataset.measurements.len(),
            "Imported dataset into memory store"
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::Email;
    use chrono::Duration;

    fn triple(chest: f64, waist: f64, hips: f64) -> Measurements {
        Measurements::new(chest, waist, hips).unwrap()
    }

    async fn store_with_item(m: Measurements) -> (InMemoryStore, OrderItem, MeasurementRecord) {
        let store = InMemoryStore::new();
        let record = store.create_measurement(&m, Utc::now()).await.unwrap();
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            item_name: "Wool Suit".to_string(),
            category_id: Some(3),
            price: Money::from_units(800),
            measurement_id: record.id,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        store.tables.write().await.items.insert(item.id, item.clone());
        (store, item, record)
    }

    fn new_customer(name: &str, email: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: Email::parse(email).unwrap(),
            status: CustomerStatus::Prospect,
        }
    }

    #[tokio::test]
    async fn test_find_by_triple_exact_match() {
        let store = InMemoryStore::new();
        let created = store.create_measurement(&triple(36.0, 30.0, 38.0), Utc::now()).await.unwrap();

        let found = store.find_by_triple(&triple(36.0, 30.0, 38.0)).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(created.id));

        let missing = store.find_by_triple(&triple(36.0, 30.0, 38.5)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_by_triple_prefers_oldest_duplicate() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let older = store.create_measurement(&triple(40.0, 34.0, 42.0), now - Duration::days(1)).await.unwrap();
        store.create_measurement(&triple(40.0, 34.0, 42.0), now).await.unwrap();

        let found = store.find_by_triple(&triple(40.0, 34.0, 42.0)).await.unwrap().unwrap();
        assert_eq!(found.id, older.id);
    }

    #[tokio::test]
    async fn test_scoped_item_lookup() {
        let (store, item, _) = store_with_item(triple(38.0, 32.0, 40.0)).await;

        assert!(store.get_order_item(item.id, item.order_id).await.unwrap().is_some());
        assert!(store.get_order_item(item.id, Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.get_order_item(Uuid::new_v4(), item.order_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repoint_to_missing_measurement_rejected() {
        let (store, item, record) = store_with_item(triple(38.0, 32.0, 40.0)).await;

        let err = store
            .update_measurement_ref(item.id, Uuid::new_v4(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

        let unchanged = store.item(item.id).await.unwrap();
        assert_eq!(unchanged.measurement_id, record.id);
    }

    #[tokio::test]
    async fn test_repoint_unknown_item() {
        let store = InMemoryStore::new();
        let record = store.create_measurement(&triple(38.0, 32.0, 40.0), Utc::now()).await.unwrap();

        let err = store
            .update_measurement_ref(Uuid::new_v4(), record.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_referenced_measurement_cannot_be_deleted() {
        let (store, _, record) = store_with_item(triple(38.0, 32.0, 40.0)).await;

        assert_eq!(store.count_referencing_items(record.id).await.unwrap(), 1);
        assert!(!store.delete_measurement_if_orphaned(record.id).await.unwrap());
        assert!(matches!(
            store.delete_measurement(record.id).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));
        assert_eq!(store.measurement_count().await, 1);
    }

    #[tokio::test]
    async fn test_orphan_delete() {
        let store = InMemoryStore::new();
        let record = store.create_measurement(&triple(38.0, 32.0, 40.0), Utc::now()).await.unwrap();

        assert!(store.delete_measurement_if_orphaned(record.id).await.unwrap());
        assert!(!store.delete_measurement_if_orphaned(record.id).await.unwrap());
        assert!(matches!(
            store.delete_measurement(record.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.create_customer(new_customer("Ada", "ada@example.com"), Utc::now()).await.unwrap();

        let err = store
            .create_customer(new_customer("Other Ada", "ADA@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_list_customers_pages_sorts_and_searches() {
        let store = InMemoryStore::new();
        let base = Utc::now();
        for (i, (name, email)) in [
            ("Ada Lovelace", "ada@example.com"),
            ("Grace Hopper", "grace@example.com"),
            ("Alan Turing", "alan@example.com"),
        ]
        .into_iter()
        .enumerate()
        {
            store
                .create_customer(new_customer(name, email), base + Duration::minutes(i as i64))
                .await
                .unwrap();
        }

        let newest_first = store.list_customers(&CustomerQuery::default()).await.unwrap();
        assert_eq!(newest_first.total, 3);
        assert_eq!(newest_first.customers[0].name, "Alan Turing");

        let by_name = CustomerQuery {
            sort: SortColumn::Name,
            order: SortOrder::Asc,
            limit: 2,
            page: 2,
            ..CustomerQuery::default()
        };
        let page = store.list_customers(&by_name).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.customers.len(), 1);
        assert_eq!(page.customers[0].name, "Grace Hopper");

        let search = CustomerQuery {
            search: Some("GRACE".to_string()),
            ..CustomerQuery::default()
        };
        let found = store.list_customers(&search).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.customers[0].email.as_str(), "grace@example.com");
    }

    #[tokio::test]
    async fn test_last_order_date_nulls_last() {
        let store = InMemoryStore::new();
        let with_order = store.create_customer(new_customer("A", "a@example.com"), Utc::now()).await.unwrap();
        store.create_customer(new_customer("B", "b@example.com"), Utc::now()).await.unwrap();
        store.tables.write().await.customers.get_mut(&with_order.id).unwrap().last_order_date = Some(Utc::now());

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let query = CustomerQuery {
                sort: SortColumn::LastOrderDate,
                order,
                ..CustomerQuery::default()
            };
            let page = store.list_customers(&query).await.unwrap();
            assert_eq!(page.customers[0].id, with_order.id);
            assert!(page.customers[1].last_order_date.is_none());
        }
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryStore::new();
        let customer = store.create_customer(new_customer("Ada", "ada@example.com"), Utc::now()).await.unwrap();

        let updated = store
            .update_customer_status(customer.id, CustomerStatus::Churned, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, CustomerStatus::Churned);

        let missing = store
            .update_customer_status(Uuid::new_v4(), CustomerStatus::Active, Utc::now())
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_customer_orders_resolves_items() {
        let store = InMemoryStore::new();
        let customer = store.create_customer(new_customer("Ada", "ada@example.com"), Utc::now()).await.unwrap();
        let record = store.create_measurement(&triple(36.0, 30.0, 38.0), Utc::now()).await.unwrap();
        let now = Utc::now();

        let older = Order {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            order_date: now - Duration::days(10),
            total_amount: Money::from_units(100),
            created_at: now,
            modified_at: now,
        };
        let newer = Order {
            id: Uuid::new_v4(),
            order_date: now,
            ..older.clone()
        };
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id: older.id,
            item_name: "Silk Dress".to_string(),
            category_id: Some(4),
            price: Money::from_units(100),
            measurement_id: record.id,
            created_at: now,
            modified_at: now,
        };
        {
            let mut tables = store.tables.write().await;
            tables.orders.insert(older.id, older.clone());
            tables.orders.insert(newer.id, newer.clone());
            tables.items.insert(item.id, item.clone());
        }

        let views = store.list_customer_orders(customer.id).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].order.id, newer.id);
        assert!(views[0].items.is_empty());
        assert_eq!(views[1].items[0].category.as_deref(), Some("Dresses"));
        assert_eq!(views[1].items[0].measurement.as_ref().unwrap().id, record.id);

        assert!(store.list_customer_orders(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
