// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::domain::order::{OrphanCleanup, ReconcileOutcome};

// Re-export for public API
pub use server::{render, start_metrics_server};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - HTTP traffic (requests by route and status, latency)
// - Custom-size reconciliations (created vs reused records, failures)
// - Orphan cleanup results
// - Customer writes
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // HTTP Metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration: HistogramVec,

    // Reconciliation Metrics
    pub reconciliations_total: IntCounterVec,
    pub orphan_cleanup_total: IntCounterVec,

    // Customer Metrics
    pub customer_writes_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // HTTP Metrics
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests handled"),
            &["method", "route", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request handling duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["method", "route"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        // Reconciliation Metrics
        let reconciliations_total = IntCounterVec::new(
            Opts::new("custom_size_reconciliations_total", "Custom-size reconciliations by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let orphan_cleanup_total = IntCounterVec::new(
            Opts::new("custom_size_orphan_cleanup_total", "Previous custom-size records by cleanup result"),
            &["result"],
        )?;
        registry.register(Box::new(orphan_cleanup_total.clone()))?;

        // Customer Metrics
        let customer_writes_total = IntCounterVec::new(
            Opts::new("customer_writes_total", "Customer writes by operation"),
            &["operation"],
        )?;
        registry.register(Box::new(customer_writes_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration,
            reconciliations_total,
            orphan_cleanup_total,
            customer_writes_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_http_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        self.http_requests_total
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.http_request_duration
            .with_label_values(&[method, route])
            .observe(duration_secs);
    }

    pub fn record_reconciliation(&self, outcome: &ReconcileOutcome) {
        let label = if outcome.created { "created" } else { "reused" };
        self.reconciliations_total.with_label_values(&[label]).inc();
        if outcome.cleanup != OrphanCleanup::Unchanged {
            self.orphan_cleanup_total
                .with_label_values(&[outcome.cleanup.label()])
                .inc();
        }
    }

    pub fn record_reconciliation_failure(&self, kind: &str) {
        self.reconciliations_total
            .with_label_values(&[&format!("failed_{kind}")])
            .inc();
    }

    pub fn record_customer_write(&self, operation: &str) {
        self.customer_writes_total.with_label_values(&[operation]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Measurements;
    use crate::models::{MeasurementRecord, Money, OrderItem};
    use chrono::Utc;
    use uuid::Uuid;

    fn outcome(created: bool, cleanup: OrphanCleanup) -> ReconcileOutcome {
        let measurement = MeasurementRecord {
            id: Uuid::new_v4(),
            measurements: Measurements::new(38.0, 32.0, 40.0).unwrap(),
            modified_at: Utc::now(),
        };
        ReconcileOutcome {
            item: OrderItem {
                id: Uuid::new_v4(),
                order_id: Uuid::new_v4(),
                item_name: "Linen Shirt".to_string(),
                category_id: Some(1),
                price: Money::from_units(150),
                measurement_id: measurement.id,
                created_at: Utc::now(),
                modified_at: Utc::now(),
            },
            measurement,
            created,
            cleanup,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_customer_write("register");
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_reconciliation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_reconciliation(&outcome(true, OrphanCleanup::Deleted(Uuid::new_v4())));
        metrics.record_reconciliation(&outcome(false, OrphanCleanup::Unchanged));
        metrics.record_reconciliation_failure("not_found");

        let text = render(metrics.registry()).unwrap();
        assert!(text.contains("custom_size_reconciliations_total{outcome=\"created\"} 1"));
        assert!(text.contains("custom_size_reconciliations_total{outcome=\"reused\"} 1"));
        assert!(text.contains("custom_size_reconciliations_total{outcome=\"failed_not_found\"} 1"));
        assert!(text.contains("custom_size_orphan_cleanup_total{result=\"deleted\"} 1"));
        assert!(!text.contains("result=\"unchanged\""));
    }

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new().unwrap();
        metrics.record_http_request("GET", "/customers", 200, 0.004);
        metrics.record_http_request("GET", "/customers", 200, 0.002);

        let text = render(metrics.registry()).unwrap();
        assert!(text.contains("http_requests_total{method=\"GET\",route=\"/customers\",status=\"200\"} 2"));
        assert!(text.contains("http_request_duration_seconds_count{method=\"GET\",route=\"/customers\"} 2"));
    }
}
