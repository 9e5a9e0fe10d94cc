//! # Result Streams
//!
//! Each query runs its executor as a runtime task, one storage step at a time
//! on the blocking pool, and hands row envelopes to the caller over a bounded
//! channel. The resulting [`RowStream`] is single-pass, lazy and finite. The
//! producer stops, and drops its scan, as soon as the consumer goes away or
//! the [`QueryContext`] is cancelled or past its deadline.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_stream::{Stream, StreamExt};

use crate::domain::entity::QueryEntity;
use crate::domain::errors::{QueryError, ShortResultError, StorageError};
use crate::metrics::QueryMetrics;
use crate::service::executor::{ExecutionState, RowEnvelope, ScanExecution};

/// Cancellation scope for one or more queries.
///
/// Cloning shares the scope. An expired deadline counts as cancellation.
#[derive(Clone, Debug)]
pub struct QueryContext {
    cancelled: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Cancels every [`QueryContext`] created with it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl QueryContext {
    /// A cancellable context and its handle.
    pub fn new() -> (Self, CancelHandle) {
        let (sender, cancelled) = watch::channel(false);
        (
            Self {
                cancelled,
                deadline: None,
            },
            CancelHandle { sender },
        )
    }

    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::new().0
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let mut flag = self.cancelled.clone();
        let signalled = async move {
            loop {
                if *flag.borrow_and_update() {
                    return;
                }
                if flag.changed().await.is_err() {
                    // Handle dropped without cancelling.
                    std::future::pending::<()>().await;
                }
            }
        };
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signalled => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signalled.await,
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::background()
    }
}

/// Start producing `execution` as a runtime task.
///
/// Only the storage step runs on the blocking pool. While the consumer is
/// not reading, the producer is parked on the channel as an ordinary task and
/// holds no blocking thread.
pub(crate) fn spawn_stream<E: QueryEntity>(
    execution: ScanExecution<E>,
    ctx: &QueryContext,
    capacity: usize,
    metrics: Arc<QueryMetrics>,
) -> Result<RowStream<E::Output>, QueryError> {
    let handle = Handle::try_current().map_err(|_| QueryError::RuntimeUnavailable)?;
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    handle.spawn(produce(execution, ctx.clone(), sender, metrics));
    Ok(RowStream::new(receiver))
}

async fn produce<E: QueryEntity>(
    mut execution: ScanExecution<E>,
    ctx: QueryContext,
    sender: mpsc::Sender<RowEnvelope<E::Output>>,
    metrics: Arc<QueryMetrics>,
) {
    loop {
        if execution.state() != ExecutionState::Scanning {
            break;
        }
        if ctx.is_cancelled() || sender.is_closed() {
            stop(&execution, &metrics, "producer stopped");
            break;
        }

        let step = tokio::task::spawn_blocking(move || {
            let envelope = execution.next();
            (execution, envelope)
        });
        let (returned, envelope) = match step.await {
            Ok(stepped) => stepped,
            Err(e) => {
                tracing::warn!(entity = E::LABEL, error = %e, "scan step aborted");
                return;
            }
        };
        execution = returned;
        let Some(envelope) = envelope else {
            break;
        };

        let delivered = tokio::select! {
            biased;
            _ = ctx.cancelled() => false,
            sent = sender.send(envelope) => sent.is_ok(),
        };
        if !delivered {
            stop(&execution, &metrics, "consumer gone");
            break;
        }
    }
}

/// Count a stop as a cancellation only while the scan still had rows to give.
fn stop<E: QueryEntity>(execution: &ScanExecution<E>, metrics: &QueryMetrics, reason: &str) {
    if execution.state() == ExecutionState::Scanning {
        metrics.record_cancellation();
    }
    tracing::debug!(entity = E::LABEL, emitted = execution.emitted(), reason, "producer stopped");
}

/// Single-pass stream of row envelopes.
///
/// An error envelope, when present, is the last item.
pub struct RowStream<T> {
    receiver: mpsc::Receiver<RowEnvelope<T>>,
    last_token: Option<String>,
}

impl<T> RowStream<T> {
    fn new(receiver: mpsc::Receiver<RowEnvelope<T>>) -> Self {
        Self {
            receiver,
            last_token: None,
        }
    }

    /// Token resuming after the last row delivered by this stream.
    pub fn next_token(&self) -> Option<&str> {
        self.last_token.as_deref()
    }

    /// Stop the producer. Rows already buffered can still be read.
    pub fn close(&mut self) {
        self.receiver.close();
    }

    /// Drain the stream into a page, keeping the rows delivered before a
    /// terminal error.
    ///
    /// The page token resumes after the last good row, so a caller can retry
    /// from there once the store recovers.
    pub async fn collect_partial(mut self) -> (Page<T>, Option<StorageError>) {
        let mut rows = Vec::new();
        let mut failure = None;
        while let Some(envelope) = self.next().await {
            match envelope.into_result() {
                Ok(row) => rows.push(row),
                Err(e) => failure = Some(e),
            }
        }
        let page = Page {
            rows,
            next_token: self.last_token,
        };
        (page, failure)
    }

    /// Drain the stream into a page.
    ///
    /// A terminal error envelope is returned as `Err` and the rows before it
    /// are dropped; use [`RowStream::collect_partial`] to keep them.
    pub async fn collect_page(self) -> Result<Page<T>, StorageError> {
        match self.collect_partial().await {
            (page, None) => Ok(page),
            (_, Some(e)) => Err(e),
        }
    }
}

impl<T> Stream for RowStream<T> {
    type Item = RowEnvelope<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(envelope)) => {
                if let Some(token) = envelope.next_token() {
                    this.last_token = Some(token);
                }
                Poll::Ready(Some(envelope))
            }
            other => other,
        }
    }
}

/// Rows of one page and the token for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Resumes after the last row; `None` when the page is empty.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Require at least `expected` rows.
    pub fn expect_full(self, expected: u64) -> Result<Self, ShortResultError> {
        if (self.rows.len() as u64) < expected {
            return Err(ShortResultError {
                expected,
                actual: self.rows.len(),
            });
        }
        Ok(self)
    }
}
