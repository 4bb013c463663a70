//! Loaded-once, read-only table snapshots and the per-process cache.
//!
//! A `Snapshot` is built by the loader exactly once per data load and is
//! never mutated afterwards. Sessions share snapshots through the cache by
//! cloning the `Arc`; every filtered view and metric computation works on
//! borrowed data.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::types::{BusinessTable, MarketingTable};

/// A single dropped or repaired row, kept for the aggregate warning surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based line number in the source file, header excluded.
    pub line: usize,
    pub message: String,
}

/// Per-file load outcome: how many rows were read and how many dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWarnings {
    pub file: String,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub issues: Vec<RowIssue>,
}

impl FileWarnings {
    pub fn drop_rate(&self) -> f64 {
        if self.rows_read == 0 {
            0.0
        } else {
            self.rows_dropped as f64 / self.rows_read as f64
        }
    }
}

/// Warnings accumulated across the four input files of one load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadWarnings {
    pub files: Vec<FileWarnings>,
}

impl LoadWarnings {
    pub fn total_dropped(&self) -> usize {
        self.files.iter().map(|f| f.rows_dropped).sum()
    }
}

/// The immutable result of one load: both cleaned tables plus warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub marketing: MarketingTable,
    pub business: BusinessTable,
    pub warnings: LoadWarnings,
}

impl Snapshot {
    pub fn new(marketing: MarketingTable, business: BusinessTable, warnings: LoadWarnings) -> Self {
        Self {
            marketing,
            business,
            warnings,
        }
    }
}

/// Process-wide cache of loaded snapshots, keyed by load key (e.g. the
/// joined source paths). Insert-once, read-many; entries are shared as
/// `Arc` so sessions never copy or mutate table data.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: DashMap<String, Arc<Snapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Snapshot>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    /// Insert a snapshot and return the shared handle. An existing entry
    /// for the same key is kept, so concurrent sessions agree on one copy.
    pub fn insert(&self, key: &str, snapshot: Snapshot) -> Arc<Snapshot> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(snapshot));
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
