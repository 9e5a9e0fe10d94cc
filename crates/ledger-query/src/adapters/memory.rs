//! # In-Memory Row Store
//!
//! `BTreeMap`-backed implementation of [`RowStore`] for tests, benches and
//! embedding.
//!
//! Secondary indexes are keyed `(index value, primary key)`, so a scan over
//! any index visits rows in primary order. Scans are lazy and hold no lock
//! between rows: each step takes a read lock, finds the first key strictly
//! past the scan's own position, clones the encoded row and releases the lock.

use parking_lot::RwLock;
use shared_types::{
    AccountSnapshot, Address, AssetBalance, AssetId, AssetRecord, TransactionRow, TxnPosition,
    MAX_ADDRESS, MIN_ADDRESS,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use crate::adapters::codec::encode_row;
use crate::domain::errors::StorageError;
use crate::domain::position::{
    bound_kind, range_is_empty, resume_after, typed_bound, KeyKind, PositionKey,
};
use crate::ports::outbound::{RowScan, RowStore, ScanDimension, ScanDirection, ScanItem, ScanRequest};

#[derive(Default)]
struct Tables {
    transactions: BTreeMap<TxnPosition, Vec<u8>>,
    txn_by_address: BTreeSet<(Address, TxnPosition)>,
    txn_by_asset: BTreeSet<(AssetId, TxnPosition)>,
    accounts: BTreeMap<Address, Vec<u8>>,
    /// Encoded `AssetBalance` rows; the key set doubles as the accounts-by-asset index.
    balances: BTreeMap<(AssetId, Address), Vec<u8>>,
    account_assets: HashMap<Address, Vec<AssetId>>,
    assets: BTreeMap<AssetId, Vec<u8>>,
    assets_by_creator: BTreeSet<(Address, AssetId)>,
    asset_creators: HashMap<AssetId, Address>,
}

/// Shared handle to an in-memory ledger history. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryRowStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transaction and index it by every participant and by the
    /// asset it references, including an asset it created.
    pub fn insert_transaction(&self, row: &TransactionRow) -> Result<(), StorageError> {
        let raw = encode_row(row)?;
        self.insert_raw_transaction(
            row.position(),
            raw,
            &row.txn.participants(),
            row.txn.referenced_asset(),
        )
    }

    /// Insert pre-encoded transaction bytes with explicit index entries.
    ///
    /// Nothing checks that `raw` decodes; the executor reports it when scanned.
    pub fn insert_raw_transaction(
        &self,
        position: TxnPosition,
        raw: Vec<u8>,
        participants: &[Address],
        asset_id: Option<AssetId>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        if tables.transactions.contains_key(&position) {
            return Err(StorageError::DuplicateKey(PositionKey::Txn(position)));
        }
        tables.transactions.insert(position, raw);
        for address in participants {
            tables.txn_by_address.insert((*address, position));
        }
        if let Some(asset_id) = asset_id {
            tables.txn_by_asset.insert((asset_id, position));
        }
        Ok(())
    }

    /// Remove a transaction's primary row but keep its index entries.
    ///
    /// Returns whether a row was removed.
    pub fn remove_transaction_row(&self, position: TxnPosition) -> bool {
        self.tables.write().transactions.remove(&position).is_some()
    }

    /// Insert or replace an account snapshot and its asset balances.
    ///
    /// The stored snapshot is normalized, so its holdings agree with the
    /// holders index whatever order the caller supplied.
    pub fn insert_account(&self, account: &AccountSnapshot) -> Result<(), StorageError> {
        let mut account = account.clone();
        account.normalize();
        let raw = encode_row(&account)?;
        let balances = account
            .assets
            .iter()
            .map(|holding| {
                encode_row(&AssetBalance::from_holding(account.address, holding))
                    .map(|encoded| (holding.asset_id, encoded))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self.tables.write();
        if let Some(previous) = tables.account_assets.remove(&account.address) {
            for asset_id in previous {
                tables.balances.remove(&(asset_id, account.address));
            }
        }
        let held: Vec<AssetId> = balances.iter().map(|(asset_id, _)| *asset_id).collect();
        for (asset_id, encoded) in balances {
            tables.balances.insert((asset_id, account.address), encoded);
        }
        tables.account_assets.insert(account.address, held);
        tables.accounts.insert(account.address, raw);
        Ok(())
    }

    /// Insert or replace an asset and its creator index entry.
    pub fn insert_asset(&self, asset: &AssetRecord) -> Result<(), StorageError> {
        let raw = encode_row(asset)?;
        let mut tables = self.tables.write();
        if let Some(previous) = tables.asset_creators.insert(asset.asset_id, asset.creator) {
            tables.assets_by_creator.remove(&(previous, asset.asset_id));
        }
        tables.assets_by_creator.insert((asset.creator, asset.asset_id));
        tables.assets.insert(asset.asset_id, raw);
        Ok(())
    }

    pub fn transaction_count(&self) -> usize {
        self.tables.read().transactions.len()
    }

    pub fn account_count(&self) -> usize {
        self.tables.read().accounts.len()
    }

    pub fn asset_count(&self) -> usize {
        self.tables.read().assets.len()
    }
}

impl RowStore for MemoryRowStore {
    fn scan(&self, request: ScanRequest) -> Result<RowScan, StorageError> {
        // Reject mismatched bound kinds up front rather than on the first step.
        let expected = request.dimension.key_kind();
        for bound in [&request.lower, &request.upper] {
            if let Some(actual) = bound_kind(bound) {
                if actual != expected {
                    return Err(StorageError::KeyKind { expected, actual });
                }
            }
        }

        Ok(Box::new(MemoryScan {
            tables: Arc::clone(&self.tables),
            request,
            last: None,
            finished: false,
        }))
    }
}

struct MemoryScan {
    tables: Arc<RwLock<Tables>>,
    request: ScanRequest,
    last: Option<PositionKey>,
    finished: bool,
}

impl Iterator for MemoryScan {
    type Item = Result<ScanItem, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let (lower, upper) = match (self.request.direction, self.last) {
            (_, None) => (self.request.lower, self.request.upper),
            (ScanDirection::Ascending, Some(last)) => {
                (resume_after(self.request.lower, last), self.request.upper)
            }
            (ScanDirection::Descending, Some(last)) => (self.request.lower, Bound::Excluded(last)),
        };

        let step = self
            .tables
            .read()
            .step(&self.request.dimension, lower, upper, self.request.direction);

        match step {
            Ok(Some(item)) => {
                self.last = Some(item.position);
                Some(Ok(item))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl Tables {
    /// First row of `dimension` inside the bounds, in scan direction.
    fn step(
        &self,
        dimension: &ScanDimension,
        lower: Bound<PositionKey>,
        upper: Bound<PositionKey>,
        direction: ScanDirection,
    ) -> Result<Option<ScanItem>, StorageError> {
        match *dimension {
            ScanDimension::Transactions => {
                let (lo, hi) = typed_bounds(lower, upper, KeyKind::Txn, PositionKey::as_txn)?;
                Ok(first_entry(&self.transactions, lo, hi, direction).map(|(position, raw)| {
                    ScanItem {
                        position: PositionKey::Txn(*position),
                        raw: raw.clone(),
                    }
                }))
            }
            ScanDimension::TransactionsByAddress(address) => {
                let (lo, hi) = typed_bounds(lower, upper, KeyKind::Txn, PositionKey::as_txn)?;
                let lo = composite(address, lo, TxnPosition::MIN);
                let hi = composite(address, hi, TxnPosition::MAX);
                first_key(&self.txn_by_address, lo, hi, direction)
                    .map(|(_, position)| self.txn_row(*position, "txn_by_address"))
                    .transpose()
            }
            ScanDimension::TransactionsByAsset(asset_id) => {
                let (lo, hi) = typed_bounds(lower, upper, KeyKind::Txn, PositionKey::as_txn)?;
                let lo = composite(asset_id, lo, TxnPosition::MIN);
                let hi = composite(asset_id, hi, TxnPosition::MAX);
                first_key(&self.txn_by_asset, lo, hi, direction)
                    .map(|(_, position)| self.txn_row(*position, "txn_by_asset"))
                    .transpose()
            }
            ScanDimension::Accounts => {
                let (lo, hi) =
                    typed_bounds(lower, upper, KeyKind::Account, PositionKey::as_account)?;
                Ok(first_entry(&self.accounts, lo, hi, direction).map(|(address, raw)| {
                    ScanItem {
                        position: PositionKey::Account(*address),
                        raw: raw.clone(),
                    }
                }))
            }
            ScanDimension::AccountsByAsset(asset_id) => {
                let (lo, hi) =
                    typed_bounds(lower, upper, KeyKind::Account, PositionKey::as_account)?;
                let lo = composite(asset_id, lo, MIN_ADDRESS);
                let hi = composite(asset_id, hi, MAX_ADDRESS);
                first_entry(&self.balances, lo, hi, direction)
                    .map(|((_, address), _)| self.account_row(*address, "accounts_by_asset"))
                    .transpose()
            }
            ScanDimension::AssetBalances(asset_id) => {
                let (lo, hi) =
                    typed_bounds(lower, upper, KeyKind::Account, PositionKey::as_account)?;
                let lo = composite(asset_id, lo, MIN_ADDRESS);
                let hi = composite(asset_id, hi, MAX_ADDRESS);
                Ok(first_entry(&self.balances, lo, hi, direction).map(|((_, address), raw)| {
                    ScanItem {
                        position: PositionKey::Account(*address),
                        raw: raw.clone(),
                    }
                }))
            }
            ScanDimension::Assets => {
                let (lo, hi) = typed_bounds(lower, upper, KeyKind::Asset, PositionKey::as_asset)?;
                Ok(first_entry(&self.assets, lo, hi, direction).map(|(asset_id, raw)| ScanItem {
                    position: PositionKey::Asset(*asset_id),
                    raw: raw.clone(),
                }))
            }
            ScanDimension::AssetsByCreator(creator) => {
                let (lo, hi) = typed_bounds(lower, upper, KeyKind::Asset, PositionKey::as_asset)?;
                let lo = composite(creator, lo, 0);
                let hi = composite(creator, hi, u64::MAX);
                first_key(&self.assets_by_creator, lo, hi, direction)
                    .map(|(_, asset_id)| self.asset_row(*asset_id, "assets_by_creator"))
                    .transpose()
            }
        }
    }

    fn txn_row(&self, position: TxnPosition, index: &'static str) -> Result<ScanItem, StorageError> {
        let key = PositionKey::Txn(position);
        self.transactions
            .get(&position)
            .map(|raw| ScanItem {
                position: key,
                raw: raw.clone(),
            })
            .ok_or(StorageError::DanglingIndex {
                index,
                position: key,
            })
    }

    fn account_row(&self, address: Address, index: &'static str) -> Result<ScanItem, StorageError> {
        let key = PositionKey::Account(address);
        self.accounts
            .get(&address)
            .map(|raw| ScanItem {
                position: key,
                raw: raw.clone(),
            })
            .ok_or(StorageError::DanglingIndex {
                index,
                position: key,
            })
    }

    fn asset_row(&self, asset_id: AssetId, index: &'static str) -> Result<ScanItem, StorageError> {
        let key = PositionKey::Asset(asset_id);
        self.assets
            .get(&asset_id)
            .map(|raw| ScanItem {
                position: key,
                raw: raw.clone(),
            })
            .ok_or(StorageError::DanglingIndex {
                index,
                position: key,
            })
    }
}

fn typed_bounds<K>(
    lower: Bound<PositionKey>,
    upper: Bound<PositionKey>,
    expected: KeyKind,
    extract: fn(&PositionKey) -> Option<K>,
) -> Result<(Bound<K>, Bound<K>), StorageError> {
    let convert = |bound: &Bound<PositionKey>| {
        typed_bound(bound, extract).ok_or_else(|| StorageError::KeyKind {
            expected,
            actual: bound_kind(bound).unwrap_or(expected),
        })
    };
    Ok((convert(&lower)?, convert(&upper)?))
}

/// Lift a primary-key bound into an `(index value, primary key)` bound.
fn composite<D: Copy, K: Copy>(value: D, bound: Bound<K>, edge: K) -> Bound<(D, K)> {
    match bound {
        Bound::Included(key) => Bound::Included((value, key)),
        Bound::Excluded(key) => Bound::Excluded((value, key)),
        Bound::Unbounded => Bound::Included((value, edge)),
    }
}

fn first_entry<K: Ord, V>(
    map: &BTreeMap<K, V>,
    lower: Bound<K>,
    upper: Bound<K>,
    direction: ScanDirection,
) -> Option<(&K, &V)> {
    if range_is_empty(&lower, &upper) {
        return None;
    }
    let mut range = map.range((lower, upper));
    match direction {
        ScanDirection::Ascending => range.next(),
        ScanDirection::Descending => range.next_back(),
    }
}

fn first_key<K: Ord>(
    set: &BTreeSet<K>,
    lower: Bound<K>,
    upper: Bound<K>,
    direction: ScanDirection,
) -> Option<&K> {
    if range_is_empty(&lower, &upper) {
        return None;
    }
    let mut range = set.range((lower, upper));
    match direction {
        ScanDirection::Ascending => range.next(),
        ScanDirection::Descending => range.next_back(),
    }
}
