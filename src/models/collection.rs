//! Collection run report models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of one adapter within a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Records committed to the store
    pub collected: usize,
    /// Observations skipped by the normalizer
    pub rejected: usize,
    /// Whether the adapter (or its commit) failed outright
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn failed(error: impl ToString) -> Self {
        Self {
            failed: true,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Summary of a collection run, returned by POST /api/collect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub run_id: Uuid,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub sources: BTreeMap<String, SourceReport>,
    /// Records deactivated by the trailing sweep; absent when the run was cancelled
    /// or the sweep failed
    pub expired: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_error: Option<String>,
    pub cancelled: bool,
}

impl CollectionReport {
    pub fn total_collected(&self) -> usize {
        self.sources.values().map(|s| s.collected).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.sources.values().map(|s| s.rejected).sum()
    }

    /// No source failed and the sweep, if it ran, succeeded
    pub fn is_clean(&self) -> bool {
        self.failed_sources().is_empty() && self.sweep_error.is_none()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|(_, report)| report.failed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
