//! Outbound Ports (Driven Ports)
//!
//! The query layer depends on a row store that can produce ordered, lazy
//! range scans. The store owns durable data; the query layer only reads.

use shared_types::{Address, AssetId};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use crate::domain::errors::StorageError;
use crate::domain::position::{KeyKind, PositionKey};

/// Access path a scan iterates.
///
/// Secondary dimensions carry their index value; all of them yield rows in
/// primary position order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDimension {
    /// All transactions by `(round, intra)`.
    Transactions,
    /// Transactions in which the address plays any role.
    TransactionsByAddress(Address),
    /// Transactions referencing the asset.
    TransactionsByAsset(AssetId),
    Accounts,
    /// Accounts holding the asset.
    AccountsByAsset(AssetId),
    Assets,
    AssetsByCreator(Address),
    /// Holders of the asset, by address.
    AssetBalances(AssetId),
}

impl ScanDimension {
    /// Key kind of the positions this dimension yields.
    pub fn key_kind(&self) -> KeyKind {
        match self {
            ScanDimension::Transactions
            | ScanDimension::TransactionsByAddress(_)
            | ScanDimension::TransactionsByAsset(_) => KeyKind::Txn,
            ScanDimension::Accounts
            | ScanDimension::AccountsByAsset(_)
            | ScanDimension::AssetBalances(_) => KeyKind::Account,
            ScanDimension::Assets | ScanDimension::AssetsByCreator(_) => KeyKind::Asset,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ScanDimension::Transactions => "transactions",
            ScanDimension::TransactionsByAddress(_) => "transactions_by_address",
            ScanDimension::TransactionsByAsset(_) => "transactions_by_asset",
            ScanDimension::Accounts => "accounts",
            ScanDimension::AccountsByAsset(_) => "accounts_by_asset",
            ScanDimension::Assets => "assets",
            ScanDimension::AssetsByCreator(_) => "assets_by_creator",
            ScanDimension::AssetBalances(_) => "asset_balances",
        }
    }
}

impl fmt::Display for ScanDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanDirection {
    #[default]
    Ascending,
    Descending,
}

/// A range scan over one dimension, bounded by position keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub dimension: ScanDimension,
    pub lower: Bound<PositionKey>,
    pub upper: Bound<PositionKey>,
    pub direction: ScanDirection,
}

impl ScanRequest {
    pub fn ascending(
        dimension: ScanDimension,
        lower: Bound<PositionKey>,
        upper: Bound<PositionKey>,
    ) -> Self {
        Self {
            dimension,
            lower,
            upper,
            direction: ScanDirection::Ascending,
        }
    }

    pub fn descending(
        dimension: ScanDimension,
        lower: Bound<PositionKey>,
        upper: Bound<PositionKey>,
    ) -> Self {
        Self {
            dimension,
            lower,
            upper,
            direction: ScanDirection::Descending,
        }
    }

    /// Entire dimension, ascending.
    pub fn full(dimension: ScanDimension) -> Self {
        Self::ascending(dimension, Bound::Unbounded, Bound::Unbounded)
    }
}

/// One scanned row: its position and the encoded row bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanItem {
    pub position: PositionKey,
    pub raw: Vec<u8>,
}

/// A lazy scan. Dropping it releases every resource it holds.
pub type RowScan = Box<dyn Iterator<Item = Result<ScanItem, StorageError>> + Send>;

/// Ordered range scans over ledger history.
///
/// Implementations must yield keys in strictly increasing order (strictly
/// decreasing for descending scans) and must report I/O, decode and index
/// failures as `Err` items rather than panicking.
pub trait RowStore: Send + Sync {
    fn scan(&self, request: ScanRequest) -> Result<RowScan, StorageError>;
}

impl<T: RowStore + ?Sized> RowStore for Arc<T> {
    fn scan(&self, request: ScanRequest) -> Result<RowScan, StorageError> {
        (**self).scan(request)
    }
}
