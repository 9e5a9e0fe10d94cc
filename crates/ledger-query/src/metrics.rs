//! Metrics for query execution
//!
//! Thread-safe counters shared by the facade, the executors it creates and the
//! stream producers that drive them.
//!
//! ## Usage
//!
//! ```ignore
//! let service = LedgerQueryService::new(store);
//! // ... run queries ...
//! let snapshot = service.metrics().snapshot();
//! println!("emitted {} of {} scanned rows", snapshot.rows_emitted, snapshot.rows_scanned);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for query execution.
#[derive(Default, Debug)]
pub struct QueryMetrics {
    /// Queries that reached validation
    pub queries_started: AtomicU64,
    /// Queries rejected for an invalid filter or cursor
    pub queries_rejected: AtomicU64,
    /// Rows read from the store
    pub rows_scanned: AtomicU64,
    /// Rows excluded by residual predicates or offset
    pub rows_filtered: AtomicU64,
    /// Rows delivered to callers
    pub rows_emitted: AtomicU64,
    /// Scans that ended in a storage error
    pub storage_errors: AtomicU64,
    /// Producers stopped by cancellation, deadline or a dropped consumer
    pub cancellations: AtomicU64,
    /// Scans that ran to their limit or to exhaustion
    pub scans_completed: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query_started(&self) {
        self.queries_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_scanned(&self) {
        self.rows_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_filtered(&self) {
        self.rows_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_emitted(&self) {
        self.rows_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_completed(&self) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> QueryMetricsSnapshot {
        QueryMetricsSnapshot {
            queries_started: self.queries_started.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            rows_filtered: self.rows_filtered.load(Ordering::Relaxed),
            rows_emitted: self.rows_emitted.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            scans_completed: self.scans_completed.load(Ordering::Relaxed),
        }
    }

    /// Fraction of scanned rows that were emitted.
    pub fn selectivity(&self) -> f64 {
        let scanned = self.rows_scanned.load(Ordering::Relaxed);
        let emitted = self.rows_emitted.load(Ordering::Relaxed);
        if scanned > 0 {
            emitted as f64 / scanned as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time copy of [`QueryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMetricsSnapshot {
    pub queries_started: u64,
    pub queries_rejected: u64,
    pub rows_scanned: u64,
    pub rows_filtered: u64,
    pub rows_emitted: u64,
    pub storage_errors: u64,
    pub cancellations: u64,
    pub scans_completed: u64,
}
