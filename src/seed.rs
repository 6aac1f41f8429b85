use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::domain::customer::{CustomerStatus, Email};
use crate::domain::order::{Measurements, OrderError};
use crate::models::{Customer, MeasurementRecord, Money, Order, OrderItem, ITEM_CATEGORIES};

// ============================================================================
// Demo Dataset Generator
// ============================================================================
//
// Produces a self-consistent dataset:
// - each customer gets 0..=5 orders dated within the last year
// - each order gets 1..=3 items, every item with its own custom size
// - order totals are the sum of item prices
// - customer revenue / order count / last order date are derived from orders
//
// ============================================================================

pub const MAX_ORDERS_PER_CUSTOMER: usize = 5;
pub const MAX_ITEMS_PER_ORDER: usize = 3;

const FIRST_NAMES: &[&str] = &[
    "Amara", "Bruno", "Chloe", "Dmitri", "Elena", "Farid", "Grace", "Hiro", "Ines", "Jonas", "Kemi", "Liam",
    "Mei", "Nadia", "Omar", "Priya", "Quinn", "Rosa", "Sven", "Tariq",
];
const LAST_NAMES: &[&str] = &[
    "Adeyemi", "Bauer", "Castillo", "Dubois", "Eriksen", "Fischer", "Gupta", "Hansen", "Ito", "Jensen",
    "Kowalski", "Larsen", "Moreau", "Novak", "Okafor", "Petrov", "Rossi", "Sato", "Torres", "Weber",
];
const EMAIL_DOMAINS: &[&str] = &["example.com", "mail.test", "tailor.dev"];
const MATERIALS: &[&str] = &["Linen", "Wool", "Cotton", "Silk", "Tweed", "Denim", "Velvet"];
const STYLES: &[&str] = &["Classic", "Slim", "Tailored", "Relaxed", "Double-Breasted", "Pleated"];

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<MeasurementRecord>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
}

pub struct SeedGenerator {
    rng: StdRng,
    now: DateTime<Utc>,
}

impl SeedGenerator {
    /// A fixed `seed` makes the generated dataset reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, now: Utc::now() }
    }

    pub fn generate(&mut self, customer_count: usize) -> Result<Dataset, OrderError> {
        let mut dataset = Dataset::default();
        for index in 0..customer_count {
            self.customer(index, &mut dataset)?;
        }

        tracing::debug!(
            customers = dataset.customers.len(),
            orders = dataset.orders.len(),
            items = dataset.items.len(),
            "Generated demo dataset"
        );
        Ok(dataset)
    }

    fn customer(&mut self, index: usize, dataset: &mut Dataset) -> Result<(), OrderError> {
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Alex");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Doe");
        let domain = EMAIL_DOMAINS.choose(&mut self.rng).copied().unwrap_or("example.com");
        let status = CustomerStatus::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();
        let created_at = self.days_ago(30, 730);

        let mut customer = Customer {
            id: Uuid::new_v4(),
            name: format!("{first} {last}"),
            // The index keeps generated addresses unique.
            email: Email::from_stored(format!("{first}.{last}{index}@{domain}").to_lowercase()),
            status,
            revenue: Money::ZERO,
            order_count: 0,
            last_order_date: None,
            created_at,
            modified_at: self.now,
        };

        for _ in 0..self.rng.gen_range(0..=MAX_ORDERS_PER_CUSTOMER) {
            let order = self.order(customer.id, dataset)?;
            customer.revenue += order.total_amount;
            customer.order_count += 1;
            if customer.last_order_date.map_or(true, |last| order.order_date > last) {
                customer.last_order_date = Some(order.order_date);
            }
            dataset.orders.push(order);
        }

        dataset.customers.push(customer);
        Ok(())
    }

    fn order(&mut self, customer_id: Uuid, dataset: &mut Dataset) -> Result<Order, OrderError> {
        let order_date = self.days_ago(0, 365);
        let mut order = Order {
            id: Uuid::new_v4(),
            customer_id,
            order_date,
            total_amount: Money::ZERO,
            created_at: order_date,
            modified_at: order_date,
        };

        for _ in 0..self.rng.gen_range(1..=MAX_ITEMS_PER_ORDER) {
            let measurement = self.measurement(order_date)?;
            let (category_id, category) = ITEM_CATEGORIES
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(ITEM_CATEGORIES[0]);
            let material = MATERIALS.choose(&mut self.rng).copied().unwrap_or("Cotton");
            let style = STYLES.choose(&mut self.rng).copied().unwrap_or("Classic");
            let price = Money::from_units(self.rng.gen_range(100..=1000));

            order.total_amount += price;
            dataset.items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                item_name: format!("{style} {material} {}", singular(category)),
                category_id: Some(category_id),
                price,
                measurement_id: measurement.id,
                created_at: order_date,
                modified_at: order_date,
            });
            dataset.measurements.push(measurement);
        }

        Ok(order)
    }

    fn measurement(&mut self, modified_at: DateTime<Utc>) -> Result<MeasurementRecord, OrderError> {
        let chest = self.half_step(30.0, 60.0);
        let waist = self.half_step(25.0, 50.0);
        let hips = self.half_step(30.0, 60.0);
        Ok(MeasurementRecord {
            id: Uuid::new_v4(),
            measurements: Measurements::new(chest, waist, hips)?,
            modified_at,
        })
    }

    /// Uniform value in [min, max] on a 0.5 grid.
    fn half_step(&mut self, min: f64, max: f64) -> f64 {
        let steps = ((max - min) * 2.0) as u32;
        min + f64::from(self.rng.gen_range(0..=steps)) / 2.0
    }

    fn days_ago(&mut self, min_days: i64, max_days: i64) -> DateTime<Utc> {
        let seconds = self.rng.gen_range(min_days * 86_400..=max_days * 86_400);
        self.now - Duration::seconds(seconds)
    }
}

fn singular(category: &str) -> &str {
    match category {
        "Dresses" => "Dress",
        other => other.strip_suffix('s').unwrap_or(other),
    }
}
