//! # Ledger Query
//!
//! Query layer over an indexed ledger history: transactions, accounts,
//! assets and asset balances, filtered on many dimensions at once and paged
//! with opaque continuation tokens.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `TransactionFilter`, `AccountQueryOptions`, `AssetsQuery`,
//!     `AssetBalanceQuery`: caller-facing options with validation
//!   - `compile_*`: pick the index that drives the scan, keep the rest as
//!     residual predicates
//!   - `CursorToken`: versioned, checksummed resume position bound to the
//!     filter that produced it
//!   - `QueryConfig` / `QueryConfigBuilder`: limits with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `LedgerQueryApi`: Driving port (inbound API)
//!   - `RowStore`: Driven port (ordered range scans over rows and indexes)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ScanExecution`: residual filtering, offset, limit and error envelopes
//!   - `RowStream`: bounded, cancellable delivery to the caller
//!   - `LedgerQueryService`: Implements `LedgerQueryApi`
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `MemoryRowStore`: `BTreeMap`-backed store with secondary indexes
//!
//! ## Guarantees
//!
//! - Rows arrive in strictly increasing primary-key order, whichever index
//!   drives the scan.
//! - Malformed options and tokens are rejected before any scan is opened.
//! - A storage failure ends the stream with exactly one error envelope.
//! - Cancelling the context or dropping the stream stops the producer and
//!   releases the scan.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ledger_query::{LedgerQueryApi, LedgerQueryService, MemoryRowStore, QueryContext, TransactionFilter};
//! use std::sync::Arc;
//!
//! let service = LedgerQueryService::new(Arc::new(MemoryRowStore::new()));
//! let ctx = QueryContext::background();
//!
//! let filter = TransactionFilter::new().with_asset_id(312769).with_limit(100);
//! let page = service.transactions(&ctx, &filter).await?.collect_page().await?;
//!
//! if let Some(token) = page.next_token {
//!     let next = service
//!         .transactions(&ctx, &filter.with_next_token(token))
//!         .await?;
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::MemoryRowStore;
pub use domain::{
    AccessTier, AccountQueryOptions, AssetBalanceQuery, AssetsQuery, ConfigError, CursorError,
    FilterError, KeyKind, PositionKey, QueryConfig, QueryConfigBuilder, QueryError,
    ShortResultError, StorageError, TransactionFilter,
};
pub use metrics::{QueryMetrics, QueryMetricsSnapshot};
pub use ports::{LedgerQueryApi, RowScan, RowStore, ScanDimension, ScanDirection, ScanItem, ScanRequest};
pub use service::{
    CancelHandle, ExecutionState, LedgerQueryService, Page, QueryContext, RowEnvelope, RowStream,
    ScanExecution,
};
