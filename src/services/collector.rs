//! Collection coordinator
//!
//! Runs every registered adapter, normalizes what it returns and commits the
//! result, then deactivates expired records once all adapters have been attempted.
//! A failing adapter never stops the run; its failure lands in the report.

use chrono::Utc;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AggregatorError;
use crate::models::collection::{CollectionReport, SourceReport};
use crate::scrapers::{RawObservation, SourceAdapter};
use crate::services::discount_store::DiscountStore;
use crate::services::normalizer::normalize;

/// Default bound on a single adapter's `collect`
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub adapter_timeout: Duration,
    /// Run adapters concurrently (one future per adapter) instead of one after another
    pub concurrent: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            adapter_timeout: Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS),
            concurrent: false,
        }
    }
}

pub struct CollectionCoordinator {
    store: DiscountStore,
    adapters: Vec<Box<dyn SourceAdapter>>,
    config: CollectionConfig,
    // Held for the whole run so a sweep never interleaves with another run's inserts
    run_lock: Mutex<()>,
}

impl CollectionCoordinator {
    pub fn new(
        store: DiscountStore,
        adapters: Vec<Box<dyn SourceAdapter>>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            store,
            adapters,
            config,
            run_lock: Mutex::new(()),
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Run every adapter and the trailing expiry sweep
    pub async fn run(&self) -> CollectionReport {
        let (_tx, rx) = watch::channel(false);
        self.run_until_shutdown(rx).await
    }

    /// Like `run`, but stops between adapters once `shutdown` turns true.
    ///
    /// A cancelled run reports the adapters it did attempt and skips the sweep.
    pub async fn run_until_shutdown(&self, shutdown: watch::Receiver<bool>) -> CollectionReport {
        let _guard = self.run_lock.lock().await;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now().naive_utc();
        info!(
            run_id = %run_id,
            sources = self.adapters.len(),
            concurrent = self.config.concurrent,
            "Starting discount collection run"
        );

        let (sources, cancelled) = if self.config.concurrent {
            self.collect_concurrently(&shutdown).await
        } else {
            self.collect_sequentially(&shutdown).await
        };

        let (expired, sweep_error) = if cancelled {
            warn!(run_id = %run_id, "Collection run cancelled, skipping expiry sweep");
            (None, None)
        } else {
            match self.sweep().await {
                Ok(expired) => (Some(expired), None),
                Err(e) => (None, Some(e.to_string())),
            }
        };

        let report = CollectionReport {
            run_id,
            started_at,
            finished_at: Utc::now().naive_utc(),
            sources,
            expired,
            sweep_error,
            cancelled,
        };

        info!(
            run_id = %run_id,
            collected = report.total_collected(),
            rejected = report.total_rejected(),
            failed_sources = ?report.failed_sources(),
            expired = ?report.expired,
            sweep_error = ?report.sweep_error,
            "Discount collection run finished"
        );

        report
    }

    async fn collect_sequentially(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> (BTreeMap<String, SourceReport>, bool) {
        let mut sources = BTreeMap::new();

        for adapter in &self.adapters {
            if *shutdown.borrow() {
                return (sources, true);
            }
            let report = self.collect_source(adapter.as_ref()).await;
            sources.insert(adapter.name().to_string(), report);
        }

        (sources, *shutdown.borrow())
    }

    async fn collect_concurrently(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> (BTreeMap<String, SourceReport>, bool) {
        if *shutdown.borrow() {
            return (BTreeMap::new(), true);
        }

        let reports = join_all(self.adapters.iter().map(|adapter| async move {
            let report = self.collect_source(adapter.as_ref()).await;
            (adapter.name().to_string(), report)
        }))
        .await;

        (reports.into_iter().collect(), *shutdown.borrow())
    }

    /// Collect, normalize and commit one source. The adapter is closed on every path,
    /// and `close` gets the same time bound as `collect`.
    async fn collect_source(&self, adapter: &dyn SourceAdapter) -> SourceReport {
        let name = adapter.name();
        info!(source = %name, "Collecting discounts");

        let collected = match tokio::time::timeout(self.config.adapter_timeout, adapter.collect()).await {
            Ok(result) => result,
            Err(_) => Err(AggregatorError::source_unavailable(
                name,
                format!("timed out after {}s", self.config.adapter_timeout.as_secs()),
            )),
        };

        let report = match collected {
            Ok(observations) => self.commit(name, observations).await,
            Err(e) => {
                warn!(source = %name, error = %e, "Source unavailable, skipping");
                SourceReport::failed(e)
            }
        };

        if tokio::time::timeout(self.config.adapter_timeout, adapter.close())
            .await
            .is_err()
        {
            warn!(source = %name, "Adapter close timed out");
        }
        report
    }

    async fn commit(&self, name: &str, observations: Vec<RawObservation>) -> SourceReport {
        let total = observations.len();
        let mut records = Vec::with_capacity(total);
        let mut rejected = 0;

        for raw in observations {
            match normalize(raw, name) {
                Ok(record) => records.push(record),
                Err(e) => {
                    rejected += 1;
                    warn!(source = %name, error = %e, "Rejected observation");
                }
            }
        }

        let accepted = records.len();
        match self.store.insert_batch(records).await {
            Ok(_) => {
                info!(
                    source = %name,
                    observed = total,
                    collected = accepted,
                    rejected = rejected,
                    "Committed discounts"
                );
                SourceReport {
                    collected: accepted,
                    rejected,
                    failed: false,
                    error: None,
                }
            }
            Err(e) => {
                error!(source = %name, error = %e, "Failed to commit discounts");
                SourceReport {
                    rejected,
                    ..SourceReport::failed(e)
                }
            }
        }
    }

    async fn sweep(&self) -> Result<u64, AggregatorError> {
        match self.store.expire_stale(Utc::now().naive_utc()).await {
            Ok(expired) => {
                info!(expired = expired, "Marked expired discounts inactive");
                Ok(expired)
            }
            Err(e) => {
                error!(error = %e, "Expiry sweep failed");
                Err(e)
            }
        }
    }
}
