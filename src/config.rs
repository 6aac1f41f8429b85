use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read from environment variables.
///
/// Without `DATABASE_URL` the service runs on the in-memory store and seeds
/// demo data by default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub http_host: String,
    pub http_port: u16,
    /// `None` when the metrics server is disabled (`CRM_METRICS_PORT=0`).
    pub metrics_port: Option<u16>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Number of demo customers generated at startup.
    pub seed_customers: usize,
    pub seed_rng: Option<u64>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let http_host = lookup("CRM_HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let http_port = parse_or(&lookup, "PORT", 8080)?;

        let metrics_port = match parse_or(&lookup, "CRM_METRICS_PORT", 9090u16)? {
            0 => None,
            port => Some(port),
        };

        let db_max_connections = parse_or(&lookup, "CRM_DB_MAX_CONNECTIONS", 5)?;
        if db_max_connections == 0 {
            anyhow::bail!("CRM_DB_MAX_CONNECTIONS must be at least 1");
        }
        let db_acquire_timeout = Duration::from_secs(parse_or(&lookup, "CRM_DB_ACQUIRE_TIMEOUT_SECS", 30)?);

        let default_seed = if database_url.is_some() { 0 } else { 100 };
        let seed_customers = parse_or(&lookup, "CRM_SEED_CUSTOMERS", default_seed)?;
        let seed_rng = lookup("CRM_SEED_RNG")
            .map(|raw| raw.trim().parse::<u64>())
            .transpose()
            .context("CRM_SEED_RNG must be an unsigned integer")?;

        Ok(AppConfig {
            database_url,
            http_host,
            http_port,
            metrics_port,
            db_max_connections,
            db_acquire_timeout,
            seed_customers,
            seed_rng,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        if self.database_url.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}
