// ============================================================================
// HTTP API - actix-web routes over the store and domain services
// ============================================================================
//
// Routes:
// - GET    /customers                         paginated, sortable, searchable list
// - POST   /customers                         register a customer
// - PATCH  /customers/{id}                    change status
// - GET    /customers/{id}/orders             orders with items and custom sizes
// - PATCH  /orders/{order_id}/items/{item_id} reconcile an item's custom size
// - GET    /health                            store reachability
//
// One AppState is shared by every worker so the reconciler's keyed locks
// cover the whole process.
//
// ============================================================================

pub mod customers;
pub mod error;
pub mod health;
pub mod orders;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{from_fn, Next};
use actix_web::{web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Instant;

use crate::domain::customer::CustomerCommandHandler;
use crate::domain::order::CustomSizeReconciler;
use crate::metrics::Metrics;
use crate::store::CrmStore;
use crate::wire::ErrorBody;

pub const SERVICE_NAME: &str = "tailor-crm";

pub struct AppState {
    pub store: Arc<dyn CrmStore>,
    pub reconciler: CustomSizeReconciler,
    pub customers: CustomerCommandHandler,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn CrmStore>, metrics: Arc<Metrics>) -> Self {
        Self {
            reconciler: CustomSizeReconciler::new(store.clone()),
            customers: CustomerCommandHandler::new(store.clone()),
            store,
            metrics,
        }
    }
}

/// Register every route plus the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health))
        .service(
            web::resource("/customers")
                .route(web::get().to(customers::list))
                .route(web::post().to(customers::create)),
        )
        .route("/customers/{id}", web::patch().to(customers::update_status))
        .route("/customers/{id}/orders", web::get().to(customers::orders))
        .route(
            "/orders/{order_id}/items/{item_id}",
            web::patch().to(orders::update_custom_size),
        );
}

pub fn app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(from_fn(record_request))
        .configure(configure)
}

pub async fn run_api_server(state: web::Data<AppState>, host: String, port: u16) -> std::io::Result<()> {
    tracing::info!("🚀 Starting API server on http://{}:{}", host, port);

    HttpServer::new(move || app(state.clone()))
        .bind((host.as_str(), port))?
        .run()
        .await
}

async fn record_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let started = Instant::now();
    let method = req.method().to_string();
    let route = req.match_pattern().unwrap_or_else(|| "unmatched".to_string());
    let metrics = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.metrics.clone());

    let res = next.call(req).await?;

    let status = res.status().as_u16();
    let elapsed = started.elapsed().as_secs_f64();
    if let Some(metrics) = metrics {
        metrics.record_http_request(&method, &route, status, elapsed);
    }
    tracing::debug!(
        method = %method,
        route = %route,
        status,
        elapsed_ms = elapsed * 1000.0,
        "HTTP request handled"
    );
    Ok(res)
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody { error: message })
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid request body: {err}"));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid path parameter: {err}"));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid query string: {err}"));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

/// Shared fixture for route tests: one customer with one order of two items.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::customer::{CustomerStatus, Email};
    use crate::domain::order::Measurements;
    use crate::models::{Customer, MeasurementRecord, Money, Order, OrderItem};
    use crate::seed::Dataset;
    use crate::store::InMemoryStore;

    pub struct Fixture {
        pub store: Arc<InMemoryStore>,
        pub state: web::Data<AppState>,
        pub customer_id: Uuid,
        pub order_id: Uuid,
        /// Bound to (38, 32, 40).
        pub suit_id: Uuid,
        /// Bound to (36, 30, 38).
        pub shirt_id: Uuid,
    }

    pub async fn fixture() -> Fixture {
        let now = Utc::now();
        let suit_size = MeasurementRecord {
            id: Uuid::new_v4(),
            measurements: Measurements::new(38.0, 32.0, 40.0).unwrap(),
            modified_at: now,
        };
        let shirt_size = MeasurementRecord {
            id: Uuid::new_v4(),
            measurements: Measurements::new(36.0, 30.0, 38.0).unwrap(),
            modified_at: now,
        };

        let customer = Customer {
            id: Uuid::new_v4(),
            name: "Grace Hopper".to_string(),
            email: Email::parse("grace@example.com").unwrap(),
            status: CustomerStatus::Active,
            revenue: Money::from_units(950),
            order_count: 1,
            last_order_date: Some(now - Duration::days(3)),
            created_at: now - Duration::days(90),
            modified_at: now,
        };
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            order_date: now - Duration::days(3),
            total_amount: Money::from_units(950),
            created_at: now - Duration::days(3),
            modified_at: now - Duration::days(3),
        };
        let item = |name: &str, category: i16, price: i64, measurement_id: Uuid| OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            item_name: name.to_string(),
            category_id: Some(category),
            price: Money::from_units(price),
            measurement_id,
            created_at: order.created_at,
            modified_at: order.created_at,
        };
        let suit = item("Navy Wool Suit", 3, 800, suit_size.id);
        let shirt = item("White Linen Shirt", 1, 150, shirt_size.id);

        let store = Arc::new(InMemoryStore::new());
        store
            .import_dataset(&Dataset {
                measurements: vec![suit_size, shirt_size],
                customers: vec![customer.clone()],
                orders: vec![order.clone()],
                items: vec![suit.clone(), shirt.clone()],
            })
            .await
            .unwrap();

        let metrics = Arc::new(Metrics::new().unwrap());
        let state = web::Data::new(AppState::new(store.clone(), metrics));

        Fixture {
            store,
            state,
            customer_id: customer.id,
            order_id: order.id,
            suit_id: suit.id,
            shirt_id: shirt.id,
        }
    }
}
