// src/bin/collect.rs

use std::env;

use discount_aggregator::config::AppConfig;
use discount_aggregator::db::connect_and_migrate;
use discount_aggregator::scrapers::default_adapters;
use discount_aggregator::services::{collector::CollectionCoordinator, discount_store::DiscountStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Usage: cargo run --bin collect -- [SOURCE ...]
    let wanted: Vec<String> = env::args().skip(1).map(|s| s.to_lowercase()).collect();

    let config = AppConfig::from_env();
    let db = connect_and_migrate(&config.database_url).await?;

    let adapters: Vec<_> = default_adapters(&config.scraper)
        .into_iter()
        .filter(|a| wanted.is_empty() || wanted.contains(&a.name().to_lowercase()))
        .collect();
    if adapters.is_empty() {
        eprintln!("No source matches {:?}", wanted);
        std::process::exit(1);
    }

    let coordinator = CollectionCoordinator::new(DiscountStore::new(db), adapters, config.collection);
    let report = coordinator.run().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}
