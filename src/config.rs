//! Environment-driven configuration for the server, the collection job and the
//! one-shot collector.

use std::env;
use std::time::Duration;

use crate::scrapers::ScraperConfig;
use crate::services::collector::{CollectionConfig, DEFAULT_ADAPTER_TIMEOUT_SECS};

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_BIND_ADDR: &str = "BIND_ADDR";
const ENV_COLLECTION_INTERVAL: &str = "COLLECTION_INTERVAL_SECS";
const ENV_COLLECT_ON_STARTUP: &str = "COLLECT_ON_STARTUP";
const ENV_ADAPTER_TIMEOUT: &str = "ADAPTER_TIMEOUT_SECS";
const ENV_COLLECT_CONCURRENTLY: &str = "COLLECT_CONCURRENTLY";
const ENV_USER_AGENT: &str = "SCRAPER_USER_AGENT";

const DEFAULT_DATABASE_URL: &str = "sqlite://data/discounts.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
/// Once a day
const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 86400;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// `None` disables the scheduled collection job
    pub collection_interval: Option<Duration>,
    pub collect_on_startup: bool,
    pub collection: CollectionConfig,
    pub scraper: ScraperConfig,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup; invalid values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_secs = parse_or(&lookup, ENV_COLLECTION_INTERVAL, DEFAULT_COLLECTION_INTERVAL_SECS);
        let adapter_timeout_secs = parse_or(&lookup, ENV_ADAPTER_TIMEOUT, DEFAULT_ADAPTER_TIMEOUT_SECS);

        let mut scraper = ScraperConfig::default();
        if let Some(user_agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            scraper.user_agent = user_agent;
        }

        Self {
            database_url: lookup(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            collection_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            collect_on_startup: parse_bool_or(&lookup, ENV_COLLECT_ON_STARTUP, true),
            collection: CollectionConfig {
                adapter_timeout: Duration::from_secs(adapter_timeout_secs.max(1)),
                concurrent: parse_bool_or(&lookup, ENV_COLLECT_CONCURRENTLY, false),
            },
            scraper,
        }
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, default = default, "Invalid number, using default");
            default
        }),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => default,
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        Some(v) => {
            tracing::warn!(key = key, value = %v, default = default, "Invalid boolean, using default");
            default
        }
    }
}
