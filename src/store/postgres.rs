use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

use super::{
    CrmStore, CustomerStore, MeasurementStore, OrderItemRepository, OrderReadStore, StoreError, StoreResult,
};
use crate::domain::customer::{CustomerStatus, Email};
use crate::domain::order::Measurements;
use crate::models::{
    Customer, CustomerPage, MeasurementRecord, Money, NewCustomer, Order, OrderItem, OrderItemView, OrderView,
};
use crate::query::CustomerQuery;
use crate::seed::Dataset;

// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Runtime-checked queries (sqlx::query, not sqlx::query!) so building the
// crate never needs a live database. Constraint violations are classified
// by SQLSTATE:
// - 23505 unique_violation      -> StoreError::UniqueViolation
// - 23503 foreign_key_violation -> StoreError::ForeignKeyViolation
//
// ============================================================================

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const MEASUREMENT_COLUMNS: &str = "id, chest, waist, hips, modified_at";
const ITEM_COLUMNS: &str = "id, order_id, item_name, category_id, price_cents, custom_size_id, created_at, modified_at";
const CUSTOMER_SELECT: &str = "SELECT c.id, c.name, c.email, s.name AS status, c.revenue_cents, c.order_count, \
     c.last_order_date, c.created_at, c.modified_at \
     FROM customers c JOIN customer_statuses s ON s.id = c.status_id";

const DELETE_IF_ORPHANED: &str = "DELETE FROM custom_sizes cs \
     WHERE cs.id = $1 \
       AND NOT EXISTS (SELECT 1 FROM order_items oi WHERE oi.custom_size_id = cs.id)";

const ORDERS_WITH_ITEMS: &str = r#"
    SELECT o.id AS order_id, o.customer_id, o.order_date, o.total_amount_cents,
           o.created_at AS order_created_at, o.modified_at AS order_modified_at,
           i.id AS item_id, i.item_name, i.category_id, i.price_cents, i.custom_size_id,
           i.created_at AS item_created_at, i.modified_at AS item_modified_at,
           cat.name AS category_name,
           m.id AS size_id, m.chest, m.waist, m.hips, m.modified_at AS size_modified_at
    FROM orders o
    LEFT JOIN order_items i ON i.order_id = o.id
    LEFT JOIN order_item_categories cat ON cat.id = i.category_id
    LEFT JOIN custom_sizes m ON m.id = i.custom_size_id
    WHERE o.customer_id = $1
    ORDER BY o.order_date DESC, o.id, i.created_at, i.id
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::UniqueViolation(db.message().to_string()),
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::ForeignKeyViolation(db.message().to_string()),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn search_filter(placeholder: usize) -> String {
    format!(" WHERE (c.name ILIKE ${placeholder} ESCAPE '\\' OR c.email ILIKE ${placeholder} ESCAPE '\\')")
}

fn customer_list_sql(query: &CustomerQuery) -> String {
    let filter = if query.search.is_some() { search_filter(3) } else { String::new() };
    format!(
        "{CUSTOMER_SELECT}{filter} ORDER BY c.{} {} NULLS LAST, c.id ASC LIMIT $1 OFFSET $2",
        query.sort.column(),
        query.order.as_sql()
    )
}

fn customer_count_sql(query: &CustomerQuery) -> String {
    let filter = if query.search.is_some() { search_filter(1) } else { String::new() };
    format!("SELECT COUNT(*) FROM customers c{filter}")
}

fn measurements_from_row(row: &PgRow, chest: &str, waist: &str, hips: &str) -> StoreResult<Measurements> {
    Measurements::new(row.try_get(chest)?, row.try_get(waist)?, row.try_get(hips)?)
        .map_err(|e| StoreError::Backend(format!("stored custom size is invalid: {e}")))
}

fn measurement_from_row(row: &PgRow) -> StoreResult<MeasurementRecord> {
    Ok(MeasurementRecord {
        id: row.try_get("id")?,
        measurements: measurements_from_row(row, "chest", "waist", "hips")?,
        modified_at: row.try_get("modified_at")?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        item_name: row.try_get("item_name")?,
        category_id: row.try_get("category_id")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        measurement_id: row.try_get("custom_size_id")?,
        created_at: row.try_get("created_at")?,
        modified_at: row.try_get("modified_at")?,
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<CustomerStatus>()
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: Email::from_stored(row.try_get::<String, _>("email")?),
        status,
        revenue: Money::from_cents(row.try_get("revenue_cents")?),
        order_count: row.try_get("order_count")?,
        last_order_date: row.try_get("last_order_date")?,
        created_at: row.try_get("created_at")?,
        modified_at: row.try_get("modified_at")?,
    })
}

fn order_from_joined_row(row: &PgRow) -> StoreResult<Order> {
    Ok(Order {
        id: row.try_get("order_id")?,
        customer_id: row.try_get("customer_id")?,
        order_date: row.try_get("order_date")?,
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        created_at: row.try_get("order_created_at")?,
        modified_at: row.try_get("order_modified_at")?,
    })
}

fn item_view_from_joined_row(row: &PgRow, item_id: Uuid) -> StoreResult<OrderItemView> {
    let item = OrderItem {
        id: item_id,
        order_id: row.try_get("order_id")?,
        item_name: row.try_get("item_name")?,
        category_id: row.try_get("category_id")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        measurement_id: row.try_get("custom_size_id")?,
        created_at: row.try_get("item_created_at")?,
        modified_at: row.try_get("item_modified_at")?,
    };

    let measurement = match row.try_get::<Option<Uuid>, _>("size_id")? {
        Some(id) => Some(MeasurementRecord {
            id,
            measurements: measurements_from_row(row, "chest", "waist", "hips")?,
            modified_at: row.try_get("size_modified_at")?,
        }),
        None => None,
    };

    Ok(OrderItemView {
        item,
        category: row.try_get("category_name")?,
        measurement,
    })
}

#[async_trait]
impl MeasurementStore for PgStore {
    async fn find_by_triple(&self, measurements: &Measurements) -> StoreResult<Option<MeasurementRecord>> {
        let sql = format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM custom_sizes \
             WHERE chest = $1 AND waist = $2 AND hips = $3 \
             ORDER BY modified_at, id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(measurements.chest())
            .bind(measurements.waist())
            .bind(measurements.hips())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.as_ref().map(measurement_from_row).transpose()
    }

    async fn get_measurement(&self, id: Uuid) -> StoreResult<Option<MeasurementRecord>> {
        let sql = format!("SELECT {MEASUREMENT_COLUMNS} FROM custom_sizes WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.as_ref().map(measurement_from_row).transpose()
    }

    async fn create_measurement(
        &self,
        measurements: &Measurements,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<MeasurementRecord> {
        let sql = format!(
            "INSERT INTO custom_sizes (id, chest, waist, hips, modified_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MEASUREMENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(measurements.chest())
            .bind(measurements.waist())
            .bind(measurements.hips())
            .bind(modified_at)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        measurement_from_row(&row)
    }

    async fn delete_measurement(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM custom_sizes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("custom size", id));
        }
        Ok(())
    }

    async fn delete_measurement_if_orphaned(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(DELETE_IF_ORPHANED)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify);

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            // A concurrent repoint committed a reference first; keep the record.
            Err(StoreError::ForeignKeyViolation(reason)) => {
                tracing::warn!(custom_size_id = %id, reason = %reason, "Orphan delete refused by foreign key");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn count_referencing_items(&self, id: Uuid) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS refs FROM order_items WHERE custom_size_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.try_get("refs")?)
    }
}

#[async_trait]
impl OrderItemRepository for PgStore {
    async fn get_order_item(&self, item_id: Uuid, order_id: Uuid) -> StoreResult<Option<OrderItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE id = $1 AND order_id = $2");
        let row = sqlx::query(&sql)
            .bind(item_id)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn update_measurement_ref(
        &self,
        item_id: Uuid,
        measurement_id: Uuid,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<OrderItem> {
        let sql = format!(
            "UPDATE order_items SET custom_size_id = $2, modified_at = $3 \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(item_id)
            .bind(measurement_id)
            .bind(modified_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(StoreError::not_found("order item", item_id)),
        }
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn list_customers(&self, query: &CustomerQuery) -> StoreResult<CustomerPage> {
        let pattern = query.search.as_deref().map(|term| format!("%{}%", escape_like(term)));

        let list_sql = customer_list_sql(query);
        let mut list = sqlx::query(&list_sql)
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64);
        if let Some(pattern) = &pattern {
            list = list.bind(pattern);
        }
        let rows = list.fetch_all(&self.pool).await.map_err(classify)?;

        let count_sql = customer_count_sql(query);
        let mut count = sqlx::query(&count_sql);
        if let Some(pattern) = &pattern {
            count = count.bind(pattern);
        }
        let total: i64 = count
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?
            .try_get(0)?;

        let customers = rows.iter().map(customer_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(CustomerPage {
            customers,
            total: total.max(0) as u64,
        })
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let sql = format!("{CUSTOMER_SELECT} WHERE c.id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn create_customer(&self, customer: NewCustomer, created_at: DateTime<Utc>) -> StoreResult<Customer> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO customers (id, name, email, status_id, revenue_cents, order_count, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, 0, 0, $5, $5)",
        )
        .bind(id)
        .bind(&customer.name)
        .bind(customer.email.as_str())
        .bind(customer.status.lookup_id())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(Customer {
            id,
            name: customer.name,
            email: customer.email,
            status: customer.status,
            revenue: Money::ZERO,
            order_count: 0,
            last_order_date: None,
            created_at,
            modified_at: created_at,
        })
    }

    async fn update_customer_status(
        &self,
        id: Uuid,
        status: CustomerStatus,
        modified_at: DateTime<Utc>,
    ) -> StoreResult<Customer> {
        let result = sqlx::query("UPDATE customers SET status_id = $2, modified_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.lookup_id())
            .bind(modified_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("customer", id));
        }

        self.get_customer(id)
            .await?
            .ok_or_else(|| StoreError::not_found("customer", id))
    }
}

#[async_trait]
impl OrderReadStore for PgStore {
    async fn list_customer_orders(&self, customer_id: Uuid) -> StoreResult<Vec<OrderView>> {
        let rows = sqlx::query(ORDERS_WITH_ITEMS)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        // Rows arrive grouped by order; fold them into one view per order.
        let mut views: Vec<OrderView> = Vec::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            if views.last().map(|view| view.order.id) != Some(order_id) {
                views.push(OrderView {
                    order: order_from_joined_row(row)?,
                    items: Vec::new(),
                });
            }

            if let Some(item_id) = row.try_get::<Option<Uuid>, _>("item_id")? {
                let item = item_view_from_joined_row(row, item_id)?;
                if let Some(view) = views.last_mut() {
                    view.items.push(item);
                }
            }
        }

        Ok(views)
    }
}

#[async_trait]
impl CrmStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(classify)?;
        Ok(())
    }

    async fn import_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        for record in &dataset.measurements {
            sqlx::query("INSERT INTO custom_sizes (id, chest, waist, hips, modified_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(record.id)
                .bind(record.measurements.chest())
                .bind(record.measurements.waist())
                .bind(record.measurements.hips())
                .bind(record.modified_at)
                .execute(&mut *tx)
                .await
                .map_err(classify)?;
        }

        for customer in &dataset.customers {
            sqlx::query(
                "INSERT INTO customers (id, name, email, status_id, revenue_cents, order_count, \
                 last_order_date, created_at, modified_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(customer.id)
            .bind(&customer.name)
            .bind(customer.email.as_str())
            .bind(customer.status.lookup_id())
            .bind(customer.revenue.cents())
            .bind(customer.order_count)
            .bind(customer.last_order_date)
            .bind(customer.created_at)
            .bind(customer.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        for order in &dataset.orders {
            sqlx::query(
                "INSERT INTO orders (id, customer_id, order_date, total_amount_cents, created_at, modified_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order.id)
            .bind(order.customer_id)
            .bind(order.order_date)
            .bind(order.total_amount.cents())
            .bind(order.created_at)
            .bind(order.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        for item in &dataset.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, item_name, category_id, price_cents, custom_size_id, \
                 created_at, modified_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(&item.item_name)
            .bind(item.category_id)
            .bind(item.price.cents())
            .bind(item.measurement_id)
            .bind(item.created_at)
            .bind(item.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await.map_err(classify)?;

        tracing::info!(
            customers = dataset.customers.len(),
            orders = dataset.orders.len(),
            items = dataset.items.len(),
            custom_sizes = dataset.measurements.len(),
            "✅ Imported dataset into PostgreSQL"
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Statements are checked as text here; running them needs a live database.
//
// ============================================================================
