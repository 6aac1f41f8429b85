use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer::CustomerStatus;
use crate::domain::order::{Measurements, ReconcileOutcome};
use crate::models::{Customer, MeasurementRecord, Money, OrderItemView, OrderView};
use crate::query::{total_pages, CustomerQuery};

// ============================================================================
// Wire Schema - store columns <-> JSON fields
// ============================================================================
//
// Store columns are snake_case, JSON fields are camelCase. Each resource has
// one fixed table of (column, wire) pairs; the response DTOs below are pinned
// to these tables by the unit tests, and sort keys are resolved through them.
//
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct FieldTable {
    entries: &'static [(&'static str, &'static str)],
}

impl FieldTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// First wire field backed by `column`.
    pub fn to_wire(&self, column: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, wire)| *wire)
    }

    pub fn to_column(&self, wire: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, w)| *w == wire)
            .map(|(column, _)| *column)
    }

    pub fn wire_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, wire)| *wire)
    }
}

pub const CUSTOMER_FIELDS: FieldTable = FieldTable::new(&[
    ("id", "id"),
    ("name", "name"),
    ("email", "email"),
    ("status", "status"),
    ("revenue_cents", "revenue"),
    ("order_count", "orderCount"),
    ("last_order_date", "lastOrderDate"),
    ("created_at", "createdAt"),
]);

pub const ORDER_FIELDS: FieldTable = FieldTable::new(&[
    ("id", "id"),
    ("id", "orderId"),
    ("order_date", "orderDate"),
    ("total_amount_cents", "totalAmount"),
    ("order_items", "items"),
]);

pub const ORDER_ITEM_FIELDS: FieldTable = FieldTable::new(&[
    ("id", "id"),
    ("id", "orderItemId"),
    ("item_name", "itemName"),
    ("category_id", "category"),
    ("price_cents", "price"),
    ("custom_size_id", "customSize"),
]);

pub const CUSTOM_SIZE_FIELDS: FieldTable = FieldTable::new(&[
    ("id", "id"),
    ("chest", "chest"),
    ("waist", "waist"),
    ("hips", "hips"),
]);

pub const CUSTOM_SIZE_UPDATE_FIELDS: FieldTable = FieldTable::new(&[
    ("order_id", "orderId"),
    ("id", "itemId"),
    ("item_name", "itemName"),
    ("price_cents", "price"),
    ("custom_size_id", "customSize"),
    ("modified_at", "updatedAt"),
]);

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: CustomerStatus,
    pub revenue: Money,
    pub order_count: i32,
    pub last_order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerDto {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            email: customer.email.as_str().to_string(),
            status: customer.status,
            revenue: customer.revenue,
            order_count: customer.order_count,
            last_order_date: customer.last_order_date,
            created_at: customer.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomSizeDto {
    pub id: Uuid,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
}

impl From<&MeasurementRecord> for CustomSizeDto {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            id: record.id,
            chest: record.measurements.chest(),
            waist: record.measurements.waist(),
            hips: record.measurements.hips(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub item_name: String,
    pub category: String,
    pub price: Money,
    pub custom_size: Option<CustomSizeDto>,
}

impl From<&OrderItemView> for OrderItemDto {
    fn from(view: &OrderItemView) -> Self {
        Self {
            id: view.item.id,
            order_item_id: view.item.id,
            item_name: view.item.item_name.clone(),
            category: view.category.clone().unwrap_or_default(),
            price: view.item.price,
            custom_size: view.measurement.as_ref().map(CustomSizeDto::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: Uuid,
    pub order_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<OrderItemDto>,
}

impl From<&OrderView> for OrderDto {
    fn from(view: &OrderView) -> Self {
        Self {
            id: view.order.id,
            order_id: view.order.id,
            order_date: view.order.order_date,
            total_amount: view.order.total_amount,
            items: view.items.iter().map(OrderItemDto::from).collect(),
        }
    }
}

/// A bare measurement triple, as echoed after an update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementsDto {
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
}

impl From<&Measurements> for MeasurementsDto {
    fn from(m: &Measurements) -> Self {
        Self {
            chest: m.chest(),
            waist: m.waist(),
            hips: m.hips(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSizeUpdateDto {
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub price: Money,
    pub custom_size: MeasurementsDto,
    pub updated_at: DateTime<Utc>,
}

impl From<&ReconcileOutcome> for CustomSizeUpdateDto {
    fn from(outcome: &ReconcileOutcome) -> Self {
        Self {
            order_id: outcome.item.order_id,
            item_id: outcome.item.id,
            item_name: outcome.item.item_name.clone(),
            price: outcome.item.price,
            custom_size: MeasurementsDto::from(&outcome.measurement.measurements),
            updated_at: outcome.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationDto {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub items_per_page: u32,
}

impl PaginationDto {
    pub fn new(total_items: u64, query: &CustomerQuery) -> Self {
        Self {
            total_items,
            total_pages: total_pages(total_items, query.limit),
            current_page: query.page,
            items_per_page: query.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub data: Vec<CustomerDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerStatusRequest {
    pub status: Option<String>,
}

/// `customSize` stays untyped so each measurement can be validated on its own.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomSizeRequest {
    pub custom_size: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Unit Tests
// ============================================================================
