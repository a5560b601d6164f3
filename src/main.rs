use discount_aggregator::{
    app_router,
    config::AppConfig,
    db::connect_and_migrate,
    jobs::discount_collection::start_discount_collection_job,
    scrapers::default_adapters,
    services::{collector::CollectionCoordinator, discount_store::DiscountStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discount_aggregator=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let db = connect_and_migrate(&config.database_url).await?;
    let store = DiscountStore::new(db);

    let adapters = default_adapters(&config.scraper);
    let coordinator = Arc::new(CollectionCoordinator::new(
        store.clone(),
        adapters,
        config.collection.clone(),
    ));

    match config.collection_interval {
        Some(every) => {
            start_discount_collection_job(coordinator.clone(), every, config.collect_on_startup)
                .await;
        }
        None => tracing::info!("Scheduled collection disabled"),
    }

    let app = app_router(AppState::new(store, coordinator));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down server");
        })
        .await?;

    Ok(())
}
