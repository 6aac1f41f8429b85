use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AppState, SERVICE_NAME};
use crate::store::CrmStore;

// ============================================================================
// Health Check
// ============================================================================
//
// The service is healthy while its store answers a ping. An unreachable
// store turns the endpoint into a 503 so load balancers stop routing to it.
//
// ============================================================================

/// Health status of a component
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Health information for a component
#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub backend: String,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ComponentHealth> for HealthReport {
    fn from(component: &ComponentHealth) -> Self {
        Self {
            status: component.status.as_str(),
            service: SERVICE_NAME,
            backend: component.name.clone(),
            checked_at: component.last_check,
            error: match &component.status {
                HealthStatus::Healthy => None,
                HealthStatus::Unhealthy(reason) => Some(reason.clone()),
            },
        }
    }
}

pub async fn check_store(store: &dyn CrmStore) -> ComponentHealth {
    let status = match store.ping().await {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "Store health check failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    };
    ComponentHealth::new(store.backend(), status)
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let component = check_store(state.store.as_ref()).await;
    let report = HealthReport::from(&component);

    if component.status.is_healthy() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::fixture;
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn test_health_reports_backend() {
        let fx = fixture().await;
        let app = test::init_service(super::super::app(fx.state.clone())).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["backend"], "memory");
        assert!(body["checkedAt"].is_string());
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn test_unhealthy_report_carries_reason() {
        let component = ComponentHealth::new("postgres", HealthStatus::Unhealthy("pool timed out".into()));
        let report = HealthReport::from(&component);
        assert_eq!(report.status, "unhealthy");
        assert_eq!(report.error.as_deref(), Some("pool timed out"));
    }
}
