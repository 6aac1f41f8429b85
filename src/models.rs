use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use uuid::Uuid;

use crate::domain::customer::{CustomerStatus, Email};
use crate::domain::order::Measurements;

// ============================================================================
// Domain Models
// ============================================================================

/// Currency amount held as integer cents; serialized as decimal units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_units(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_units())
    }
}

/// Garment categories, kept in the `order_item_categories` lookup table.
pub const ITEM_CATEGORIES: [(i16, &str); 6] = [
    (1, "Shirts"),
    (2, "Trousers"),
    (3, "Suits"),
    (4, "Dresses"),
    (5, "Jackets"),
    (6, "Skirts"),
];

pub fn category_name(id: i16) -> Option<&'static str> {
    ITEM_CATEGORIES
        .iter()
        .find(|(category_id, _)| *category_id == id)
        .map(|(_, name)| *name)
}

/// A stored custom size. Never updated in place: a changed triple gets a new
/// record and the old one is released.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub measurements: Measurements,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_name: String,
    pub category_id: Option<i16>,
    pub price: Money,
    /// Always refers to an existing `MeasurementRecord`.
    pub measurement_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Email,
    pub status: CustomerStatus,
    pub revenue: Money,
    pub order_count: i32,
    pub last_order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A validated customer ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: Email,
    pub status: CustomerStatus,
}

#[derive(Debug, Clone)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub total: u64,
}

/// An order item with its category and custom size resolved.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub item: OrderItem,
    pub category: Option<String>,
    pub measurement: Option<MeasurementRecord>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItemView>,
}

// ============================================================================
// Unit Tests
// ============================================================================
