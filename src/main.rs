use actix_web::web;
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tailor_crm::api::{self, AppState};
use tailor_crm::config::AppConfig;
use tailor_crm::metrics::{self, Metrics};
use tailor_crm::seed::SeedGenerator;
use tailor_crm::store::{schema, CrmStore, InMemoryStore, PgStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tailor_crm=debug"))
        )
        .init();

    tracing::info!("🚀 Starting Tailor CRM");

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = config.backend_name(),
        port = config.http_port,
        metrics_port = ?config.metrics_port,
        "Configuration loaded"
    );

    // === 1. Store ===
    let store: Arc<dyn CrmStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL...");
            let store = PgStore::connect(url, config.db_max_connections, config.db_acquire_timeout)
                .await
                .context("failed to connect to PostgreSQL")?;
            schema::ensure_schema(store.pool())
                .await
                .context("failed to create database schema")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    // === 2. Demo data ===
    if config.seed_customers > 0 {
        let dataset = SeedGenerator::new(config.seed_rng)
            .generate(config.seed_customers)
            .context("failed to generate demo data")?;
        store
            .import_dataset(&dataset)
            .await
            .context("failed to import demo data")?;
    }

    // === 3. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 4. Servers ===
    let state = web::Data::new(AppState::new(store, metrics.clone()));
    let api_server = api::run_api_server(state, config.http_host.clone(), config.http_port);

    match config.metrics_port {
        Some(port) => {
            let registry = Arc::new(metrics.registry().clone());
            futures_util::try_join!(api_server, metrics::start_metrics_server(registry, port))?;
        }
        None => api_server.await?,
    }

    tracing::info!("👋 Tailor CRM stopped");
    Ok(())
}
