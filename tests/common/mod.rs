#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use discount_aggregator::error::{AggregatorError, Result};
use discount_aggregator::models::discount::NewDiscount;
use discount_aggregator::scrapers::{RawObservation, RawPrice, SourceAdapter};
use discount_aggregator::services::discount_store::DiscountStore;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fresh in-memory SQLite database with the schema applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> std::result::Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_store() -> DiscountStore {
    DiscountStore::new(setup_test_db().await.expect("Failed to set up test DB"))
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Active discount with sensible defaults
pub fn discount(source: &str, product_name: &str, discount_price: f64) -> NewDiscount {
    NewDiscount {
        source: source.to_string(),
        product_name: product_name.to_string(),
        category: None,
        original_price: None,
        discount_price,
        discount_percentage: None,
        valid_from: None,
        valid_until: Some(now() + Duration::days(7)),
        image_url: None,
        product_url: None,
        description: None,
        is_active: true,
    }
}

pub fn priced(
    source: &str,
    product_name: &str,
    original_price: f64,
    discount_price: f64,
    percentage: f64,
) -> NewDiscount {
    NewDiscount {
        original_price: Some(original_price),
        discount_percentage: Some(percentage),
        ..discount(source, product_name, discount_price)
    }
}

pub fn observation(product_name: &str, original_price: f64, discount_price: f64) -> RawObservation {
    RawObservation {
        product_name: Some(product_name.to_string()),
        original_price: Some(RawPrice::Number(original_price)),
        discount_price: Some(RawPrice::Number(discount_price)),
        ..Default::default()
    }
}

/// What a mock adapter does when collected
#[derive(Clone)]
pub enum Behaviour {
    Returns(Vec<RawObservation>),
    Fails(String),
    Hangs,
}

/// Scripted adapter that counts its `collect` and `close` calls
pub struct MockAdapter {
    pub name: String,
    pub behaviour: Behaviour,
    pub collects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl MockAdapter {
    pub fn new(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            collects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (self.collects.clone(), self.closes.clone())
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> Result<Vec<RawObservation>> {
        self.collects.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Returns(observations) => Ok(observations.clone()),
            Behaviour::Fails(reason) => Err(AggregatorError::source_unavailable(&self.name, reason)),
            Behaviour::Hangs => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
