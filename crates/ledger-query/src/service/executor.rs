//! # Query Executor
//!
//! Drives one scan for one call:
//!
//! ```text
//! open ──► Scanning ──► (Emitting ⇄ Scanning) ──► Done | Failed
//! ```
//!
//! The executor decodes each scanned row, checks it against the scan key,
//! applies residual predicates, offset and limit, and yields row envelopes.
//! Reaching the limit or exhausting the scan moves to `Done`; any storage
//! failure yields exactly one error envelope and moves to `Failed`. In both
//! terminal states the scan is dropped immediately.

use std::sync::Arc;

use crate::adapters::codec::decode_row;
use crate::domain::cursor::{encode_cursor, FilterIdentity};
use crate::domain::entity::QueryEntity;
use crate::domain::errors::StorageError;
use crate::domain::planner::CompiledQuery;
use crate::domain::position::{resume_after, PositionKey};
use crate::domain::predicates::Evaluate;
use crate::metrics::QueryMetrics;
use crate::ports::outbound::{RowScan, RowStore, ScanRequest};

/// One streamed result: a row or the terminal error, with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEnvelope<T> {
    pub position: PositionKey,
    pub result: Result<T, StorageError>,
    identity: FilterIdentity,
}

impl<T> RowEnvelope<T> {
    fn row(position: PositionKey, row: T, identity: FilterIdentity) -> Self {
        Self {
            position,
            result: Ok(row),
            identity,
        }
    }

    fn error(position: PositionKey, error: StorageError, identity: FilterIdentity) -> Self {
        Self {
            position,
            result: Err(error),
            identity,
        }
    }

    /// Token that resumes strictly after this row. `None` for error envelopes.
    pub fn next_token(&self) -> Option<String> {
        self.result
            .as_ref()
            .ok()
            .map(|_| encode_cursor(self.position, self.identity))
    }

    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }

    pub fn payload(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn into_result(self) -> Result<T, StorageError> {
        self.result
    }
}

/// Observable executor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Scanning,
    Done,
    Failed,
}

enum Phase {
    Scanning(RowScan),
    Done,
    Failed,
}

/// Synchronous, single-pass execution of a compiled query.
pub struct ScanExecution<E: QueryEntity> {
    phase: Phase,
    residual: Vec<E::Predicate>,
    projection: E::Projection,
    limit: u64,
    offset_remaining: u64,
    emitted: u64,
    last_scanned: Option<PositionKey>,
    last_emitted: Option<PositionKey>,
    identity: FilterIdentity,
    metrics: Arc<QueryMetrics>,
}

impl<E: QueryEntity> ScanExecution<E> {
    /// Open the scan, resuming strictly after `cursor` when given.
    ///
    /// An empty plan range finishes immediately without touching the store.
    pub fn open<S: RowStore + ?Sized>(
        store: &S,
        compiled: CompiledQuery<E>,
        cursor: Option<PositionKey>,
        metrics: Arc<QueryMetrics>,
    ) -> Result<Self, StorageError> {
        let CompiledQuery {
            mut plan,
            residual,
            projection,
            limit,
            offset,
            identity,
        } = compiled;

        if let Some(cursor) = cursor {
            plan.lower = resume_after(plan.lower, cursor);
        }

        let phase = if plan.is_empty() {
            tracing::debug!(entity = E::LABEL, dimension = %plan.dimension, "empty scan range");
            metrics.record_scan_completed();
            Phase::Done
        } else {
            let request = ScanRequest::ascending(plan.dimension, plan.lower, plan.upper);
            match store.scan(request) {
                Ok(scan) => Phase::Scanning(scan),
                Err(e) => {
                    tracing::warn!(entity = E::LABEL, error = %e, "failed to open scan");
                    metrics.record_storage_error();
                    return Err(e);
                }
            }
        };

        tracing::debug!(
            entity = E::LABEL,
            dimension = %plan.dimension,
            resumed = cursor.is_some(),
            "scan opened"
        );

        Ok(Self {
            phase,
            residual,
            projection,
            limit,
            offset_remaining: offset,
            emitted: 0,
            last_scanned: None,
            last_emitted: None,
            identity,
            metrics,
        })
    }

    pub fn state(&self) -> ExecutionState {
        match self.phase {
            Phase::Scanning(_) => ExecutionState::Scanning,
            Phase::Done => ExecutionState::Done,
            Phase::Failed => ExecutionState::Failed,
        }
    }

    /// Rows emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Token resuming after the last emitted row, if any row was emitted.
    pub fn next_token(&self) -> Option<String> {
        self.last_emitted
            .map(|position| encode_cursor(position, self.identity))
    }

    fn finish(&mut self) {
        // Dropping the phase releases the scan.
        self.phase = Phase::Done;
        self.metrics.record_scan_completed();
        tracing::info!(entity = E::LABEL, emitted = self.emitted, "query completed");
    }

    fn fail(&mut self, error: StorageError) -> RowEnvelope<E::Output> {
        self.phase = Phase::Failed;
        self.metrics.record_storage_error();
        let position = error
            .position()
            .or(self.last_scanned)
            .unwrap_or_else(|| E::KIND.min_key());
        tracing::warn!(
            entity = E::LABEL,
            position = %position,
            emitted = self.emitted,
            error = %error,
            "scan failed"
        );
        RowEnvelope::error(position, error, self.identity)
    }

    fn limit_reached(&self) -> bool {
        self.limit > 0 && self.emitted >= self.limit
    }
}

impl<E: QueryEntity> Iterator for ScanExecution<E> {
    type Item = RowEnvelope<E::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let scan = match &mut self.phase {
                Phase::Scanning(scan) => scan,
                Phase::Done | Phase::Failed => return None,
            };

            let item = match scan.next() {
                Some(Ok(item)) => item,
                Some(Err(e)) => return Some(self.fail(e)),
                None => {
                    self.finish();
                    return None;
                }
            };
            self.metrics.record_row_scanned();

            if item.position.kind() != E::KIND {
                return Some(self.fail(StorageError::KeyKind {
                    expected: E::KIND,
                    actual: item.position.kind(),
                }));
            }
            if let Some(previous) = self.last_scanned {
                if item.position <= previous {
                    return Some(self.fail(StorageError::OutOfOrder {
                        previous,
                        current: item.position,
                    }));
                }
            }
            self.last_scanned = Some(item.position);

            let row: E::Row = match decode_row(item.position, &item.raw) {
                Ok(row) => row,
                Err(e) => return Some(self.fail(e)),
            };
            let row_key = E::position(&row);
            if row_key != item.position {
                return Some(self.fail(StorageError::Inconsistent {
                    scan_key: item.position,
                    row_key,
                }));
            }

            if !self.residual.iter().all(|predicate| predicate.evaluate(&row)) {
                self.metrics.record_row_filtered();
                continue;
            }
            if self.offset_remaining > 0 {
                self.offset_remaining -= 1;
                self.metrics.record_row_filtered();
                continue;
            }

            self.emitted += 1;
            self.last_emitted = Some(item.position);
            self.metrics.record_row_emitted();
            let envelope = RowEnvelope::row(
                item.position,
                E::project(row, &self.projection),
                self.identity,
            );
            if self.limit_reached() {
                self.finish();
            }
            return Some(envelope);
        }
    }
}
