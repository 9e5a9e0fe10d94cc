//! # Ledger Fixtures
//!
//! Deterministic ledgers generated from a seed, loaded into a
//! `MemoryRowStore`, plus a brute-force oracle that answers the same queries
//! by scanning the generated rows directly.

use ledger_query::{
    AccountQueryOptions, AssetBalanceQuery, AssetsQuery, LedgerQueryService, MemoryRowStore,
    QueryConfig, TransactionFilter,
};
use ledger_telemetry::{try_init_telemetry, TelemetryConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared_types::{
    AccountSnapshot, Address, AssetBalance, AssetHolding, AssetId, AssetParams, AssetRecord,
    CreatedAsset, SigType, Transaction, TransactionRow, TxnType,
};
use std::sync::Arc;

/// Asset id the harness scenarios look up.
pub const USDT: AssetId = 312769;

/// Asset ids present in every generated ledger, ascending.
pub const ASSET_IDS: [AssetId; 5] = [1_001, 2_002, 31_337, USDT, 400_000];

/// Asset id that no generated row references.
pub const MISSING_ASSET: AssetId = 999_999;

const UNITS: [&str; 5] = ["GEMS", "gems", "PLNK", "USDt", "ALGX"];
const NAMES: [&str; 5] = ["Gem Token", "Gemstone", "Planet", "Tether USDt", "Algo X"];

/// Note prefixes used by generated transactions and filters.
pub const NOTES: [&[u8]; 4] = [b"", b"hello", b"he", b"swap:"];

/// Every transaction type, in code order.
pub const TXN_TYPES: [TxnType; 5] = [
    TxnType::Payment,
    TxnType::KeyRegistration,
    TxnType::AssetConfig,
    TxnType::AssetTransfer,
    TxnType::AssetFreeze,
];

/// Route `tracing` output of a test binary through `ledger-telemetry`.
pub fn init_logging() {
    let _ = try_init_telemetry(&TelemetryConfig::for_tests());
}

/// A generated ledger and the store it was loaded into.
pub struct LedgerFixture {
    pub store: MemoryRowStore,
    /// In `(round, intra)` order.
    pub transactions: Vec<TransactionRow>,
    /// In address order.
    pub accounts: Vec<AccountSnapshot>,
    /// In id order.
    pub assets: Vec<AssetRecord>,
    /// Every address that appears anywhere, sorted.
    pub addresses: Vec<Address>,
}

impl LedgerFixture {
    /// Generate `rounds` rounds of history over `account_count` accounts.
    ///
    /// Rounds 1 and 3 are never empty and always open with a key
    /// registration.
    pub fn generate(seed: u64, rounds: u64, account_count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut addresses: Vec<Address> = (0..account_count.max(2))
            .map(|_| {
                let mut address = [0u8; 32];
                rng.fill(&mut address[..]);
                address
            })
            .collect();
        addresses.sort_unstable();
        addresses.dedup();

        let assets: Vec<AssetRecord> = ASSET_IDS
            .iter()
            .enumerate()
            .map(|(i, &asset_id)| AssetRecord {
                asset_id,
                creator: *addresses.choose(&mut rng).unwrap_or(&addresses[0]),
                params: AssetParams {
                    total: rng.gen_range(1_000..10_000_000),
                    decimals: rng.gen_range(0..7),
                    unit_name: UNITS[i].to_string(),
                    asset_name: NAMES[i].to_string(),
                    ..AssetParams::default()
                },
            })
            .collect();

        let mut transactions = Vec::new();
        for round in 1..=rounds {
            let per_round = if round == 1 || round == 3 {
                rng.gen_range(1..5u32)
            } else {
                rng.gen_range(0..5u32)
            };
            for intra in 0..per_round {
                let forced_keyreg = intra == 0 && (round == 1 || round == 3);
                let txn_type = if forced_keyreg {
                    TxnType::KeyRegistration
                } else {
                    TXN_TYPES[rng.gen_range(0..TXN_TYPES.len())]
                };
                transactions.push(TransactionRow {
                    round,
                    intra,
                    round_time: 1_600_000_000 + round * 4,
                    txn: random_transaction(&mut rng, txn_type, &addresses),
                });
            }
        }

        let accounts: Vec<AccountSnapshot> = addresses
            .iter()
            .map(|&address| {
                let mut account = AccountSnapshot::new(address, rng.gen_range(0..5_000_000));
                account.round = rounds;
                account.rewards = rng.gen_range(0..1_000);
                for &asset_id in &ASSET_IDS {
                    if rng.gen_bool(0.5) {
                        account.assets.push(AssetHolding {
                            asset_id,
                            amount: rng.gen_range(0..1_000),
                            frozen: rng.gen_bool(0.1),
                        });
                    }
                }
                account.created_assets = assets
                    .iter()
                    .filter(|asset| asset.creator == address)
                    .map(|asset| CreatedAsset {
                        asset_id: asset.asset_id,
                        params: asset.params.clone(),
                    })
                    .collect();
                account
            })
            .collect();

        let store = MemoryRowStore::new();
        for row in &transactions {
            store
                .insert_transaction(row)
                .unwrap_or_else(|e| panic!("fixture transaction {}: {e}", row.position()));
        }
        for account in &accounts {
            store
                .insert_account(account)
                .unwrap_or_else(|e| panic!("fixture account: {e}"));
        }
        for asset in &assets {
            store
                .insert_asset(asset)
                .unwrap_or_else(|e| panic!("fixture asset {}: {e}", asset.asset_id));
        }

        Self {
            store,
            transactions,
            accounts,
            assets,
            addresses,
        }
    }

    /// The default ledger used across suites.
    pub fn standard() -> Self {
        Self::generate(7, 60, 12)
    }

    pub fn service(&self) -> LedgerQueryService<MemoryRowStore> {
        LedgerQueryService::new(Arc::new(self.store.clone()))
    }

    pub fn service_with(&self, config: QueryConfig) -> LedgerQueryService<MemoryRowStore> {
        LedgerQueryService::with_config(Arc::new(self.store.clone()), config)
            .unwrap_or_else(|e| panic!("fixture config: {e}"))
    }

    pub fn account(&self, address: &Address) -> Option<&AccountSnapshot> {
        self.accounts.iter().find(|a| a.address == *address)
    }

    // =========================================================================
    // ORACLE
    // =========================================================================

    /// Every transaction the filter selects, ignoring limit, offset and token.
    pub fn expected_transactions(&self, filter: &TransactionFilter) -> Vec<TransactionRow> {
        self.transactions
            .iter()
            .filter(|row| transaction_matches(filter, row))
            .cloned()
            .collect()
    }

    /// Every account the options select, before projection.
    pub fn expected_accounts(&self, options: &AccountQueryOptions) -> Vec<AccountSnapshot> {
        let address: Option<&[u8]> = options.address.as_deref();
        self.accounts
            .iter()
            .filter(|a| address.map_or(true, |addr| a.address[..] == *addr))
            .filter(|a| {
                options
                    .has_asset_id
                    .map_or(true, |id| a.assets.iter().any(|h| h.asset_id == id))
            })
            .filter(|a| options.algos_greater_than.map_or(true, |n| a.microalgos > n))
            .cloned()
            .collect()
    }

    pub fn expected_assets(&self, query: &AssetsQuery) -> Vec<AssetRecord> {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_ref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        let equals = |value: &str, wanted: &Option<String>| {
            wanted
                .as_ref()
                .map_or(true, |w| value.to_lowercase() == w.to_lowercase())
        };
        self.assets
            .iter()
            .filter(|a| query.asset_id.map_or(true, |id| a.asset_id == id))
            .filter(|a| query.asset_id_greater_than.map_or(true, |id| a.asset_id > id))
            .filter(|a| {
                query
                    .creator
                    .as_deref()
                    .map_or(true, |c| a.creator[..] == *c)
            })
            .filter(|a| equals(&a.params.asset_name, &query.name))
            .filter(|a| equals(&a.params.unit_name, &query.unit))
            .filter(|a| {
                query.query.is_none()
                    || contains(&a.params.asset_name, &query.query)
                    || contains(&a.params.unit_name, &query.query)
            })
            .cloned()
            .collect()
    }

    pub fn expected_balances(&self, query: &AssetBalanceQuery) -> Vec<AssetBalance> {
        self.accounts
            .iter()
            .filter_map(|a| {
                a.assets
                    .iter()
                    .find(|h| h.asset_id == query.asset_id)
                    .map(|h| AssetBalance::from_holding(a.address, h))
            })
            .filter(|b| query.amount_gt.map_or(true, |gt| b.amount > gt))
            .filter(|b| query.amount_lt.map_or(true, |lt| b.amount < lt))
            .collect()
    }
}

/// Direct evaluation of every transaction filter field.
pub fn transaction_matches(filter: &TransactionFilter, row: &TransactionRow) -> bool {
    let txn = &row.txn;
    let effective = txn.amount + txn.closing_amount;

    let address_ok = match filter.address.as_deref() {
        None => true,
        Some(address) => {
            let mut roles = Vec::new();
            let role_fields = [
                Some(txn.sender),
                txn.receiver,
                txn.close_remainder_to,
                txn.asset_sender,
                txn.asset_receiver,
                txn.asset_close_to,
                txn.freeze_target,
            ];
            for (bit, field) in role_fields.iter().enumerate() {
                if field.map_or(false, |f| f[..] == *address) {
                    roles.push(1u8 << bit);
                }
            }
            match filter.address_role {
                Some(wanted) if !wanted.is_empty() => {
                    roles.iter().any(|bit| wanted.bits() & bit != 0)
                }
                _ => !roles.is_empty(),
            }
        }
    };

    filter.min_round.map_or(true, |r| row.round >= r)
        && filter.max_round.map_or(true, |r| row.round <= r)
        && filter.asset_id.map_or(true, |id| txn.referenced_asset() == Some(id))
        && filter
            .asset_id_greater_than
            .map_or(true, |id| txn.referenced_asset().map_or(false, |a| a > id))
        && filter.type_enum.map_or(true, |t| txn.txn_type == t)
        && filter.sig_type.map_or(true, |s| txn.sig_type == s)
        && filter
            .note_prefix
            .as_ref()
            .map_or(true, |p| txn.note.starts_with(p))
        && filter.min_algos.map_or(true, |n| txn.amount >= n)
        && filter.effective_amount_gt.map_or(true, |n| effective > n)
        && filter.effective_amount_lt.map_or(true, |n| effective < n)
        && filter.min_asset_amount.map_or(true, |n| txn.asset_amount >= n)
        && filter.max_asset_amount.map_or(true, |n| txn.asset_amount <= n)
        && address_ok
}

fn random_transaction(rng: &mut StdRng, txn_type: TxnType, addresses: &[Address]) -> Transaction {
    let pick = |rng: &mut StdRng| addresses[rng.gen_range(0..addresses.len())];
    let mut txn = Transaction::new(txn_type, pick(rng));
    txn.fee = rng.gen_range(1_000..2_000);
    txn.first_valid = rng.gen_range(1..1_000);
    txn.last_valid = txn.first_valid + 1_000;
    txn.note = NOTES[rng.gen_range(0..NOTES.len())].to_vec();
    txn.sig_type = match rng.gen_range(0..10) {
        0 => SigType::Msig,
        1 => SigType::Lsig,
        _ => SigType::Sig,
    };

    match txn_type {
        TxnType::Payment => {
            txn.receiver = Some(pick(rng));
            txn.amount = rng.gen_range(0..1_000_000);
            if rng.gen_bool(0.1) {
                txn.close_remainder_to = Some(pick(rng));
                txn.closing_amount = rng.gen_range(0..100_000);
            }
        }
        TxnType::KeyRegistration => {}
        TxnType::AssetConfig => {
            let asset_id = Some(ASSET_IDS[rng.gen_range(0..ASSET_IDS.len())]);
            if rng.gen_bool(0.3) {
                txn.created_asset_id = asset_id;
            } else {
                txn.asset_id = asset_id;
            }
        }
        TxnType::AssetTransfer => {
            txn.asset_id = Some(ASSET_IDS[rng.gen_range(0..ASSET_IDS.len())]);
            txn.asset_receiver = Some(pick(rng));
            txn.asset_amount = rng.gen_range(0..10_000);
            if rng.gen_bool(0.1) {
                txn.asset_sender = Some(pick(rng));
            }
            if rng.gen_bool(0.05) {
                txn.asset_close_to = Some(pick(rng));
            }
        }
        TxnType::AssetFreeze => {
            txn.asset_id = Some(ASSET_IDS[rng.gen_range(0..ASSET_IDS.len())]);
            txn.freeze_target = Some(pick(rng));
        }
    }
    txn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = LedgerFixture::generate(42, 20, 6);
        let b = LedgerFixture::generate(42, 20, 6);
        assert_eq!(a.transactions, b.transactions);
        assert_eq!(a.accounts, b.accounts);
    }

    #[test]
    fn test_store_matches_generated_rows() {
        let fixture = LedgerFixture::standard();
        assert_eq!(fixture.store.transaction_count(), fixture.transactions.len());
        assert_eq!(fixture.store.account_count(), fixture.accounts.len());
        assert_eq!(fixture.store.asset_count(), ASSET_IDS.len());
    }

    #[test]
    fn test_rows_sorted_by_position() {
        let fixture = LedgerFixture::standard();
        assert!(fixture
            .transactions
            .windows(2)
            .all(|w| w[0].position() < w[1].position()));
        assert!(fixture
            .accounts
            .windows(2)
            .all(|w| w[0].address < w[1].address));
    }

    #[test]
    fn test_standard_ledger_has_keyregs() {
        let fixture = LedgerFixture::standard();
        let keyregs = fixture
            .transactions
            .iter()
            .filter(|row| row.txn.txn_type == TxnType::KeyRegistration)
            .count();
        assert!(keyregs >= 2);
    }
}
