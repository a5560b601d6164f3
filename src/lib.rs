// src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use services::{
    collector::CollectionCoordinator, discount_query::DiscountQueryService,
    discount_store::DiscountStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: DiscountStore,
    pub discounts: DiscountQueryService,
    pub collector: Arc<CollectionCoordinator>,
}

impl AppState {
    pub fn new(store: DiscountStore, collector: Arc<CollectionCoordinator>) -> Self {
        Self {
            discounts: DiscountQueryService::new(store.clone()),
            store,
            collector,
        }
    }
}

pub mod entities {
    pub mod prelude;
    pub mod discounts;
}

pub mod services {
    pub mod normalizer;
    pub mod discount_store;
    pub mod discount_query;
    pub mod collector;
}

pub mod models {
    pub mod discount;
    pub mod collection;
}

pub mod handlers {
    pub mod discount;
    pub mod facets;
    pub mod collection;
    pub mod health;
}

pub mod jobs {
    pub mod discount_collection;
}

pub mod scrapers;
pub mod config;
pub mod db;
pub mod error;

/// HTTP surface of the aggregator
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/discounts", get(handlers::discount::get_discounts))
        .route("/api/discounts/{id}", get(handlers::discount::get_discount))
        .route(
            "/api/discounts/{id}/deactivate",
            post(handlers::discount::deactivate_discount),
        )
        .route("/api/supermarkets", get(handlers::facets::get_supermarkets))
        .route("/api/categories", get(handlers::facets::get_categories))
        .route("/api/stats", get(handlers::facets::get_stats))
        .route("/api/collect", post(handlers::collection::run_collection))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
