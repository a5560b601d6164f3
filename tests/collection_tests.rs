mod common;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use discount_aggregator::error::Result;
use discount_aggregator::jobs::discount_collection::run_collection_loop;
use discount_aggregator::models::discount::{DiscountFilter, DiscountSort, NewDiscount};
use discount_aggregator::scrapers::{RawObservation, RawPrice, SourceAdapter};
use discount_aggregator::services::collector::{CollectionConfig, CollectionCoordinator};
use discount_aggregator::services::discount_store::DiscountStore;
use discount_aggregator::services::normalizer::MAX_PRODUCT_NAME_LEN;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::common::{discount, now, observation, setup_store, setup_test_db, Behaviour, MockAdapter};

fn config() -> CollectionConfig {
    CollectionConfig {
        adapter_timeout: Duration::from_millis(200),
        concurrent: false,
    }
}

fn coordinator(store: &DiscountStore, adapters: Vec<Box<dyn SourceAdapter>>) -> CollectionCoordinator {
    CollectionCoordinator::new(store.clone(), adapters, config())
}

async fn active_names(store: &DiscountStore) -> Vec<String> {
    let (page, _) = store
        .query(&DiscountFilter::active(), DiscountSort::Price, 100, 0)
        .await
        .unwrap();
    page.into_iter().map(|d| d.product_name).collect()
}

/// Adapter that asks the run to stop while it is being collected
struct StopAfterCollect {
    shutdown: watch::Sender<bool>,
}

#[async_trait]
impl SourceAdapter for StopAfterCollect {
    fn name(&self) -> &str {
        "Albert Heijn"
    }

    async fn collect(&self) -> Result<Vec<RawObservation>> {
        let _ = self.shutdown.send(true);
        Ok(vec![observation("Appels", 2.99, 1.99)])
    }
}

/// Adapter that removes the discounts table, so everything after collection fails
struct DropsTable {
    db: DatabaseConnection,
}

#[async_trait]
impl SourceAdapter for DropsTable {
    fn name(&self) -> &str {
        "Lidl"
    }

    async fn collect(&self) -> Result<Vec<RawObservation>> {
        self.db
            .execute_unprepared("DROP TABLE discounts")
            .await
            .map_err(|e| discount_aggregator::error::AggregatorError::source_unavailable("Lidl", e))?;
        Ok(Vec::new())
    }
}

/// Adapter whose `close` never returns
struct HangsOnClose;

#[async_trait]
impl SourceAdapter for HangsOnClose {
    fn name(&self) -> &str {
        "Dirk"
    }

    async fn collect(&self) -> Result<Vec<RawObservation>> {
        Ok(vec![observation("Kipfilet", 6.49, 4.99)])
    }

    async fn close(&self) {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

#[tokio::test]
async fn test_rejected_observations_do_not_block_the_rest() {
    let store = setup_store().await;
    let bad = RawObservation {
        product_name: Some("Zonder prijs".to_string()),
        discount_price: Some(RawPrice::Text("gratis".to_string())),
        ..Default::default()
    };
    let adapter = MockAdapter::new(
        "Jumbo",
        Behaviour::Returns(vec![
            observation("Koffie", 5.99, 3.99),
            bad,
            observation("Thee", 2.13, 1.49),
        ]),
    );

    let report = coordinator(&store, vec![Box::new(adapter)]).run().await;

    let jumbo = &report.sources["Jumbo"];
    assert_eq!(jumbo.collected, 2);
    assert_eq!(jumbo.rejected, 1);
    assert!(!jumbo.failed);
    assert_eq!(report.expired, Some(0));
    assert!(!report.cancelled);

    assert_eq!(active_names(&store).await, vec!["Thee", "Koffie"]);

    let (page, _) = store
        .query(&DiscountFilter::active(), DiscountSort::Discount, 1, 0)
        .await
        .unwrap();
    assert_eq!(page[0].discount_percentage, Some(33.39));
    assert_eq!(page[0].source, "Jumbo");
}

#[tokio::test]
async fn test_failing_source_is_isolated_and_closed() {
    let store = setup_store().await;
    let failing = MockAdapter::new("Dirk", Behaviour::Fails("HTTP 503".to_string()));
    let working = MockAdapter::new("Lidl", Behaviour::Returns(vec![observation("Bananen", 1.99, 1.49)]));
    let (_, failing_closes) = failing.counters();
    let (_, working_closes) = working.counters();

    let report = coordinator(&store, vec![Box::new(failing), Box::new(working)])
        .run()
        .await;

    assert_eq!(report.failed_sources(), vec!["Dirk"]);
    let dirk = &report.sources["Dirk"];
    assert_eq!(dirk.collected, 0);
    assert_eq!(
        dirk.error.as_deref(),
        Some("Source unavailable (Dirk): HTTP 503")
    );
    assert_eq!(report.sources["Lidl"].collected, 1);
    assert_eq!(report.total_collected(), 1);

    assert_eq!(failing_closes.load(Ordering::SeqCst), 1);
    assert_eq!(working_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hanging_source_times_out() {
    let store = setup_store().await;
    let hanging = MockAdapter::new("Albert Heijn", Behaviour::Hangs);
    let (_, closes) = hanging.counters();
    let after = MockAdapter::new("Jumbo", Behaviour::Returns(vec![observation("Pasta", 1.49, 0.99)]));

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator(&store, vec![Box::new(hanging), Box::new(after)]).run(),
    )
    .await
    .expect("run should not wait for the hanging adapter");

    let ah = &report.sources["Albert Heijn"];
    assert!(ah.failed);
    assert!(ah.error.as_deref().unwrap_or_default().contains("timed out"));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(report.sources["Jumbo"].collected, 1);
}

#[tokio::test]
async fn test_run_ends_with_expiry_sweep() {
    let store = setup_store().await;
    store
        .insert(NewDiscount {
            valid_until: Some(now() - ChronoDuration::days(1)),
            ..discount("Jumbo", "Verlopen", 1.00)
        })
        .await
        .unwrap();
    let adapter = MockAdapter::new(
        "Jumbo",
        Behaviour::Returns(vec![RawObservation {
            valid_until: Some(discount_aggregator::scrapers::RawTimestamp::Text(
                "2020-01-01".to_string(),
            )),
            ..observation("Ook verlopen", 3.00, 2.00)
        }]),
    );

    let report = coordinator(&store, vec![Box::new(adapter)]).run().await;

    assert_eq!(report.sources["Jumbo"].collected, 1);
    assert_eq!(report.expired, Some(2));
    assert!(active_names(&store).await.is_empty());
}

#[tokio::test]
async fn test_cancelled_run_skips_remaining_sources_and_sweep() {
    let store = setup_store().await;
    let stale = store
        .insert(NewDiscount {
            valid_until: Some(now() - ChronoDuration::days(1)),
            ..discount("Lidl", "Verlopen", 1.00)
        })
        .await
        .unwrap();

    let (tx, rx) = watch::channel(false);
    let never = MockAdapter::new("Lidl", Behaviour::Returns(vec![observation("Kaas", 6.99, 4.99)]));
    let (never_collects, _) = never.counters();

    let report = coordinator(
        &store,
        vec![Box::new(StopAfterCollect { shutdown: tx }), Box::new(never)],
    )
    .run_until_shutdown(rx)
    .await;

    assert!(report.cancelled);
    assert_eq!(report.expired, None);
    assert_eq!(report.sources["Albert Heijn"].collected, 1);
    assert!(!report.sources.contains_key("Lidl"));
    assert_eq!(never_collects.load(Ordering::SeqCst), 0);

    assert!(store.get(stale).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_concurrent_mode_collects_every_source() {
    let store = setup_store().await;
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(MockAdapter::new("Jumbo", Behaviour::Returns(vec![observation("Rijst", 2.49, 1.99)]))),
        Box::new(MockAdapter::new("Dirk", Behaviour::Fails("connection refused".to_string()))),
        Box::new(MockAdapter::new("Lidl", Behaviour::Returns(vec![observation("Melk", 1.19, 0.89)]))),
    ];
    let coordinator = CollectionCoordinator::new(
        store.clone(),
        adapters,
        CollectionConfig {
            concurrent: true,
            ..config()
        },
    );

    let report = coordinator.run().await;

    assert_eq!(report.sources.len(), 3);
    assert_eq!(report.total_collected(), 2);
    assert_eq!(report.failed_sources(), vec!["Dirk"]);
    assert_eq!(active_names(&store).await, vec!["Melk", "Rijst"]);
}

#[tokio::test]
async fn test_collection_loop_runs_on_startup_and_stops() {
    let store = setup_store().await;
    let adapter = MockAdapter::new("Jumbo", Behaviour::Returns(vec![observation("Eieren", 3.29, 2.49)]));
    let (collects, _) = adapter.counters();
    let coordinator = Arc::new(coordinator(&store, vec![Box::new(adapter)]));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_collection_loop(
        coordinator,
        Duration::from_secs(3600),
        true,
        rx,
    ));

    for _ in 0..100 {
        if collects.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(collects.load(Ordering::SeqCst), 1);

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop on shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_collection_loop_waits_when_not_running_on_startup() {
    let store = setup_store().await;
    let adapter = MockAdapter::new("Jumbo", Behaviour::Returns(Vec::new()));
    let (collects, _) = adapter.counters();
    let coordinator = Arc::new(coordinator(&store, vec![Box::new(adapter)]));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(run_collection_loop(
        coordinator,
        Duration::from_secs(3600),
        false,
        rx,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop on shutdown")
        .unwrap();

    assert_eq!(collects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_sweep_is_reported() {
    let db = setup_test_db().await.unwrap();
    let store = DiscountStore::new(db.clone());

    let report = coordinator(&store, vec![Box::new(DropsTable { db })]).run().await;

    assert!(!report.cancelled);
    assert_eq!(report.expired, None);
    let error = report.sweep_error.as_deref().expect("sweep error should be reported");
    assert!(error.starts_with("Storage failure"), "{}", error);
    assert!(!report.is_clean());
    assert!(report.failed_sources().is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["sweep_error"].is_string());
}

#[tokio::test]
async fn test_clean_run_has_no_sweep_error() {
    let store = setup_store().await;
    let adapter = MockAdapter::new("Jumbo", Behaviour::Returns(vec![observation("Kaas", 6.99, 4.99)]));

    let report = coordinator(&store, vec![Box::new(adapter)]).run().await;

    assert_eq!(report.sweep_error, None);
    assert!(report.is_clean());
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("sweep_error").is_none());
}

#[tokio::test]
async fn test_over_long_card_only_rejects_itself() {
    let store = setup_store().await;
    let adapter = MockAdapter::new(
        "Jumbo",
        Behaviour::Returns(vec![
            observation("Koffie", 5.99, 3.99),
            observation(&"Heel lange naam ".repeat(MAX_PRODUCT_NAME_LEN / 8), 2.00, 1.00),
            observation("Thee", 2.13, 1.49),
        ]),
    );

    let report = coordinator(&store, vec![Box::new(adapter)]).run().await;

    let jumbo = &report.sources["Jumbo"];
    assert!(!jumbo.failed);
    assert_eq!(jumbo.collected, 2);
    assert_eq!(jumbo.rejected, 1);
    assert_eq!(active_names(&store).await, vec!["Thee", "Koffie"]);
}

#[tokio::test]
async fn test_hanging_close_does_not_stall_the_run() {
    let store = setup_store().await;
    let after = MockAdapter::new("Lidl", Behaviour::Returns(vec![observation("Melk", 1.19, 0.89)]));

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator(&store, vec![Box::new(HangsOnClose), Box::new(after)]).run(),
    )
    .await
    .expect("run should not wait for a hanging close");

    assert_eq!(report.sources["Dirk"].collected, 1);
    assert_eq!(report.sources["Lidl"].collected, 1);
    assert!(report.is_clean());
}
