//! # Domain Errors
//!
//! Error types for the ledger query subsystem.
//!
//! - `FilterError` and `CursorError` are raised before any scan is opened.
//! - `StorageError` is delivered in-band as the final row envelope of a stream.
//! - `ShortResultError` is a caller-side check and never raised internally.

use thiserror::Error;

use super::position::{KeyKind, PositionKey};

/// Top-level error returned by the query entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A streaming entry point was called outside a Tokio runtime.
    #[error("No Tokio runtime available to drive the result stream")]
    RuntimeUnavailable,
}

/// Malformed or contradictory filter options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("{field} must be 32 bytes, got {actual}")]
    AddressLength { field: &'static str, actual: usize },

    #[error("AddressRole requires Address")]
    RoleWithoutAddress,

    #[error("MinRound {min} is greater than MaxRound {max}")]
    RoundRange { min: u64, max: u64 },

    #[error("{field}: upper bound {lt} must be greater than lower bound {gt}")]
    EmptyAmountWindow { field: &'static str, gt: u64, lt: u64 },

    #[error("MinAssetAmount {min} is greater than MaxAssetAmount {max}")]
    AssetAmountRange { min: u64, max: u64 },

    #[error("Limit {limit} exceeds maximum {max}")]
    LimitTooLarge { limit: u64, max: u64 },

    #[error("NotePrefix is {len} bytes (max {max})")]
    NotePrefixTooLong { len: usize, max: usize },

    #[error("{field} is {len} bytes (max {max})")]
    TextQueryTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// A continuation token that cannot be resumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("Cursor token is empty")]
    Empty,

    #[error("Cursor token too long: {len} > {max}")]
    TooLong { len: usize, max: usize },

    #[error("Cursor token is not valid hex")]
    Encoding,

    #[error("Cursor token truncated: {actual} bytes, expected {expected}")]
    Truncated { actual: usize, expected: usize },

    #[error("Cursor checksum mismatch")]
    Checksum,

    #[error("Unsupported cursor version {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown cursor key kind {0}")]
    UnknownKind(u8),

    #[error("Cursor addresses {actual} rows, query scans {expected} rows")]
    KindMismatch { expected: KeyKind, actual: KeyKind },

    #[error("Cursor was issued for a different filter")]
    ForeignFilter,
}

/// Failures raised by the row store or detected while consuming a scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Failed to encode row: {0}")]
    Encode(String),

    #[error("Failed to decode row at {position}: {reason}")]
    Decode { position: PositionKey, reason: String },

    #[error("Index {index} references missing row {position}")]
    DanglingIndex {
        index: &'static str,
        position: PositionKey,
    },

    #[error("Scan over {expected} rows received a {actual} key")]
    KeyKind { expected: KeyKind, actual: KeyKind },

    #[error("Scan key {current} does not follow {previous}")]
    OutOfOrder {
        previous: PositionKey,
        current: PositionKey,
    },

    #[error("Row at scan key {scan_key} reports position {row_key}")]
    Inconsistent {
        scan_key: PositionKey,
        row_key: PositionKey,
    },

    #[error("Row already exists at {0}")]
    DuplicateKey(PositionKey),
}

impl StorageError {
    /// The position the failure is attached to, when known.
    pub fn position(&self) -> Option<PositionKey> {
        match self {
            StorageError::Decode { position, .. } | StorageError::DanglingIndex { position, .. } => {
                Some(*position)
            }
            StorageError::OutOfOrder { current, .. } => Some(*current),
            StorageError::Inconsistent { scan_key, .. } => Some(*scan_key),
            StorageError::DuplicateKey(position) => Some(*position),
            StorageError::Io(_) | StorageError::Encode(_) | StorageError::KeyKind { .. } => None,
        }
    }
}

/// A page held fewer rows than the caller required.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected} rows, got {actual}")]
pub struct ShortResultError {
    pub expected: u64,
    pub actual: usize,
}

/// Invalid [`QueryConfig`](super::config::QueryConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("channel_capacity must be at least 1")]
    ZeroChannelCapacity,

    #[error("max_cursor_token_len {len} cannot hold a cursor ({min} chars)")]
    CursorTokenLimitTooSmall { len: usize, min: usize },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
