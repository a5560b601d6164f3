pub mod html;
pub mod parser;
pub mod retailers;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Price as found on the source page or feed, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
}

impl From<f64> for RawPrice {
    fn from(value: f64) -> Self {
        RawPrice::Number(value)
    }
}

impl From<&str> for RawPrice {
    fn from(value: &str) -> Self {
        RawPrice::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    At(NaiveDateTime),
    Text(String),
}

/// One unvalidated discount observation produced by an adapter.
///
/// Every field is optional; deciding what is usable is the normalizer's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub original_price: Option<RawPrice>,
    pub discount_price: Option<RawPrice>,
    /// Whatever the source claims; never trusted, always recomputed
    pub discount_percentage: Option<f64>,
    pub valid_from: Option<RawTimestamp>,
    pub valid_until: Option<RawTimestamp>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Capability implemented once per retailer.
///
/// `collect` either returns everything the source currently offers or fails with
/// `SourceUnavailable`. Malformed items must be returned as-is rather than failing
/// the call. `close` releases whatever `collect` acquired and is always called by
/// the coordinator, including after a failed or timed out `collect`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Retailer name stored on every record (e.g., "Albert Heijn")
    fn name(&self) -> &str;

    async fn collect(&self) -> Result<Vec<RawObservation>>;

    async fn close(&self) {}
}

#[derive(Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Adapters for every supported retailer, in collection order
pub fn default_adapters(config: &ScraperConfig) -> Vec<Box<dyn SourceAdapter>> {
    retailers::all(config)
        .into_iter()
        .map(|scraper| Box::new(scraper) as Box<dyn SourceAdapter>)
        .collect()
}
