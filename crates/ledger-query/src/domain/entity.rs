//! # Queryable Entities
//!
//! Each queryable entity ties together its stored row type, the payload a
//! stream yields, its residual predicate type and its position key.

use serde::de::DeserializeOwned;
use shared_types::{AccountSnapshot, AssetBalance, AssetRecord, TransactionRow};
use std::fmt::Debug;

use super::position::{KeyKind, PositionKey};
use super::predicates::{AccountPredicate, AssetPredicate, BalancePredicate, Evaluate, TxnPredicate};

/// An entity the executor can scan.
pub trait QueryEntity: Send + 'static {
    /// Row as stored.
    type Row: DeserializeOwned + Send + 'static;
    /// Payload delivered to the caller after projection.
    type Output: Send + 'static;
    type Predicate: Evaluate<Self::Row> + Debug + Clone + Send + 'static;
    type Projection: Debug + Clone + Default + Send + 'static;

    /// Key kind of every position this entity is scanned by.
    const KIND: KeyKind;
    /// Name used in logs and in filter identities.
    const LABEL: &'static str;

    /// Position the row reports for itself.
    fn position(row: &Self::Row) -> PositionKey;

    fn project(row: Self::Row, projection: &Self::Projection) -> Self::Output;
}

/// Transactions in `(round, intra)` order.
#[derive(Debug, Clone, Copy)]
pub struct TransactionEntity;

impl QueryEntity for TransactionEntity {
    type Row = TransactionRow;
    type Output = TransactionRow;
    type Predicate = TxnPredicate;
    type Projection = ();

    const KIND: KeyKind = KeyKind::Txn;
    const LABEL: &'static str = "transactions";

    fn position(row: &TransactionRow) -> PositionKey {
        PositionKey::Txn(row.position())
    }

    fn project(row: TransactionRow, _: &()) -> TransactionRow {
        row
    }
}

/// Which optional account sections a query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountProjection {
    pub include_holdings: bool,
    pub include_params: bool,
}

/// Accounts in address order.
#[derive(Debug, Clone, Copy)]
pub struct AccountEntity;

impl QueryEntity for AccountEntity {
    type Row = AccountSnapshot;
    type Output = AccountSnapshot;
    type Predicate = AccountPredicate;
    type Projection = AccountProjection;

    const KIND: KeyKind = KeyKind::Account;
    const LABEL: &'static str = "accounts";

    fn position(row: &AccountSnapshot) -> PositionKey {
        PositionKey::Account(row.address)
    }

    fn project(mut row: AccountSnapshot, projection: &AccountProjection) -> AccountSnapshot {
        if !projection.include_holdings {
            row.assets.clear();
        }
        if !projection.include_params {
            row.created_assets.clear();
        }
        row
    }
}

/// Assets in id order.
#[derive(Debug, Clone, Copy)]
pub struct AssetEntity;

impl QueryEntity for AssetEntity {
    type Row = AssetRecord;
    type Output = AssetRecord;
    type Predicate = AssetPredicate;
    type Projection = ();

    const KIND: KeyKind = KeyKind::Asset;
    const LABEL: &'static str = "assets";

    fn position(row: &AssetRecord) -> PositionKey {
        PositionKey::Asset(row.asset_id)
    }

    fn project(row: AssetRecord, _: &()) -> AssetRecord {
        row
    }
}

/// Holders of one asset in address order.
#[derive(Debug, Clone, Copy)]
pub struct BalanceEntity;

impl QueryEntity for BalanceEntity {
    type Row = AssetBalance;
    type Output = AssetBalance;
    type Predicate = BalancePredicate;
    type Projection = ();

    const KIND: KeyKind = KeyKind::Account;
    const LABEL: &'static str = "asset_balances";

    fn position(row: &AssetBalance) -> PositionKey {
        PositionKey::Account(row.address)
    }

    fn project(row: AssetBalance, _: &()) -> AssetBalance {
        row
    }
}
