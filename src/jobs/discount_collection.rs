//! Discount collection job
//!
//! Runs the collection coordinator on a fixed interval. Ctrl-C stops the loop
//! and cancels a run in flight between two adapters.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::services::collector::CollectionCoordinator;

/// Start the discount collection job
///
/// # Arguments
///
/// * `coordinator` - Shared coordinator, also used by `POST /api/collect`
/// * `every` - Time between two scheduled runs
/// * `run_on_startup` - Run once immediately instead of waiting a full interval
pub async fn start_discount_collection_job(
    coordinator: Arc<CollectionCoordinator>,
    every: Duration,
    run_on_startup: bool,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, stopping discount collection job");
        } else {
            error!("Failed to listen for shutdown signal");
        }
        let _ = shutdown_tx.send(true);
    });

    tokio::spawn(run_collection_loop(coordinator, every, run_on_startup, shutdown_rx));
}

/// Scheduling loop; returns once `shutdown` turns true
pub async fn run_collection_loop(
    coordinator: Arc<CollectionCoordinator>,
    every: Duration,
    run_on_startup: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        interval_secs = every.as_secs(),
        run_on_startup = run_on_startup,
        sources = ?coordinator.source_names(),
        "Discount collection job started"
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !run_on_startup {
        // First tick completes immediately
        ticker.tick().await;
    }

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                info!("Starting scheduled discount collection");
                let report = coordinator.run_until_shutdown(shutdown.clone()).await;
                if report.cancelled {
                    break;
                }
            }
        }
    }

    info!("Discount collection job stopped");
}
