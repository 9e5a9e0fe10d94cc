//! # Residual Predicates
//!
//! Filter fields the access path does not consume are evaluated per row.
//! Predicates are conjunctive: a row is emitted only when every residual
//! predicate holds.

use shared_types::{
    AccountSnapshot, Address, AddressRoles, AssetBalance, AssetId, AssetRecord, SigType,
    TransactionRow, TxnType,
};

/// A test applied to one decoded row.
pub trait Evaluate<R> {
    fn evaluate(&self, row: &R) -> bool;
}

/// Per-row transaction predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnPredicate {
    /// Transaction references an asset with a larger id.
    AssetIdGreaterThan(AssetId),
    TypeEnum(TxnType),
    SigType(SigType),
    NotePrefix(Vec<u8>),
    /// Payment amount at least this much.
    MinAlgos(u64),
    EffectiveAmountGt(u64),
    EffectiveAmountLt(u64),
    /// Address plays one of `roles` (any role when empty).
    Address { address: Address, roles: AddressRoles },
    MinAssetAmount(u64),
    MaxAssetAmount(u64),
}

impl Evaluate<TransactionRow> for TxnPredicate {
    fn evaluate(&self, row: &TransactionRow) -> bool {
        let txn = &row.txn;
        match self {
            TxnPredicate::AssetIdGreaterThan(id) => {
                txn.referenced_asset().is_some_and(|a| a > *id)
            }
            TxnPredicate::TypeEnum(txn_type) => txn.txn_type == *txn_type,
            TxnPredicate::SigType(sig_type) => txn.sig_type == *sig_type,
            TxnPredicate::NotePrefix(prefix) => txn.note.starts_with(prefix),
            TxnPredicate::MinAlgos(min) => txn.amount >= *min,
            TxnPredicate::EffectiveAmountGt(gt) => txn.effective_amount() > *gt,
            TxnPredicate::EffectiveAmountLt(lt) => txn.effective_amount() < *lt,
            TxnPredicate::Address { address, roles } => {
                let played = txn.roles_of(address);
                if roles.is_empty() {
                    !played.is_empty()
                } else {
                    played.intersects(*roles)
                }
            }
            TxnPredicate::MinAssetAmount(min) => txn.asset_amount >= *min,
            TxnPredicate::MaxAssetAmount(max) => txn.asset_amount <= *max,
        }
    }
}

/// Per-row account predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountPredicate {
    HasAssetId(AssetId),
    AlgosGreaterThan(u64),
}

impl Evaluate<AccountSnapshot> for AccountPredicate {
    fn evaluate(&self, row: &AccountSnapshot) -> bool {
        match self {
            AccountPredicate::HasAssetId(id) => row.holding(*id).is_some(),
            AccountPredicate::AlgosGreaterThan(n) => row.microalgos > *n,
        }
    }
}

/// Per-row asset predicates. Text needles are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPredicate {
    Creator(Address),
    Name(String),
    Unit(String),
    /// Substring of the asset name or unit name.
    Query(String),
}

impl Evaluate<AssetRecord> for AssetPredicate {
    fn evaluate(&self, row: &AssetRecord) -> bool {
        match self {
            AssetPredicate::Creator(creator) => row.creator == *creator,
            AssetPredicate::Name(name) => row.params.asset_name.to_lowercase() == *name,
            AssetPredicate::Unit(unit) => row.params.unit_name.to_lowercase() == *unit,
            AssetPredicate::Query(needle) => {
                row.params.asset_name.to_lowercase().contains(needle.as_str())
                    || row.params.unit_name.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// Per-row asset balance predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancePredicate {
    AmountGt(u64),
    AmountLt(u64),
}

impl Evaluate<AssetBalance> for BalancePredicate {
    fn evaluate(&self, row: &AssetBalance) -> bool {
        match self {
            BalancePredicate::AmountGt(gt) => row.amount > *gt,
            BalancePredicate::AmountLt(lt) => row.amount < *lt,
        }
    }
}
