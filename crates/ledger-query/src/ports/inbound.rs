//! Inbound Ports (Driving Ports)
//!
//! The API callers use to query ledger history.

use async_trait::async_trait;
use shared_types::{AccountSnapshot, AssetBalance, AssetRecord, TransactionRow};

use crate::domain::errors::QueryError;
use crate::domain::filters::{AccountQueryOptions, AssetBalanceQuery, AssetsQuery, TransactionFilter};
use crate::service::stream::{QueryContext, RowStream};

/// Primary ledger query API (Driving Port)
///
/// Every streaming method validates its options, compiles them and decodes
/// the continuation token before any scan is opened; malformed options fail
/// fast with [`QueryError`]. Storage failures during the scan arrive as the
/// final envelope of the stream.
#[async_trait]
pub trait LedgerQueryApi: Send + Sync {
    /// Transactions in `(round, intra)` order.
    async fn transactions(
        &self,
        ctx: &QueryContext,
        filter: &TransactionFilter,
    ) -> Result<RowStream<TransactionRow>, QueryError>;

    /// Accounts in address order.
    async fn accounts(
        &self,
        ctx: &QueryContext,
        options: &AccountQueryOptions,
    ) -> Result<RowStream<AccountSnapshot>, QueryError>;

    /// Assets in id order.
    async fn assets(
        &self,
        ctx: &QueryContext,
        query: &AssetsQuery,
    ) -> Result<RowStream<AssetRecord>, QueryError>;

    /// Holders of one asset in address order.
    async fn asset_balances(
        &self,
        ctx: &QueryContext,
        query: &AssetBalanceQuery,
    ) -> Result<RowStream<AssetBalance>, QueryError>;

    /// A single account with its holdings and created assets.
    async fn account(
        &self,
        ctx: &QueryContext,
        address: &[u8],
    ) -> Result<Option<AccountSnapshot>, QueryError>;
}
