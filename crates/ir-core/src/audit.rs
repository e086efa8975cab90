//! Structured audit trail for a redaction run.

use chrono::{DateTime, Utc};
use ir_common::{Result, RunId};
use ir_policy::TextAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One applied text redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// 1-based page number as a reviewer would cite it.
    pub page: usize,
    pub category: String,
    pub original: String,
    pub replacement: String,
    pub action: TextAction,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_redactions: usize,
    pub total_visual_elements: usize,
    pub unique_categories: usize,
    pub per_category_counts: BTreeMap<String, usize>,
}

/// The persisted audit artifact: what was redacted, where, into what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLog {
    /// Correlates this artifact with the run's tracing output.
    pub run_id: RunId,
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub redactions: Vec<AuditLogEntry>,
    pub metrics: RunMetrics,
}

impl ProcessingLog {
    pub fn new(input: impl Into<String>) -> Self {
        ProcessingLog {
            run_id: RunId::new(),
            timestamp: Utc::now(),
            input: input.into(),
            redactions: Vec::new(),
            metrics: RunMetrics::default(),
        }
    }

    pub fn push(&mut self, entry: AuditLogEntry) {
        *self
            .metrics
            .per_category_counts
            .entry(entry.category.clone())
            .or_insert(0) += 1;
        self.redactions.push(entry);
    }

    /// Close out the counters once all phases have run.
    pub fn finalize(&mut self, total_visual_elements: usize) {
        self.metrics.total_redactions = self.redactions.len();
        self.metrics.total_visual_elements = total_visual_elements;
        self.metrics.unique_categories = self.metrics.per_category_counts.len();
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
