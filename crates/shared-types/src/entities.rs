//! # Ledger Entities
//!
//! Defines the entities a ledger-history store exposes to queries.
//!
//! ## Clusters
//!
//! - **Primitives**: `Address`, `Round`, `AssetId`, `TxnPosition`
//! - **Transactions**: `TxnType`, `SigType`, `AddressRoles`, `Transaction`, `TransactionRow`
//! - **Accounts & Assets**: `AccountSnapshot`, `AssetHolding`, `AssetRecord`, `AssetBalance`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::errors::EntityError;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// Length in bytes of an account address.
pub const ADDRESS_LEN: usize = 32;

/// A 32-byte account address (the account's public key).
pub type Address = [u8; ADDRESS_LEN];

/// Ledger round number.
pub type Round = u64;

/// Asset identifier.
pub type AssetId = u64;

/// Amount of the native currency in micro-units.
pub type MicroAlgos = u64;

/// Smallest possible address, used as an open lower edge in index scans.
pub const MIN_ADDRESS: Address = [0x00; ADDRESS_LEN];

/// Largest possible address, used as an open upper edge in index scans.
pub const MAX_ADDRESS: Address = [0xff; ADDRESS_LEN];

/// Parse raw bytes into an [`Address`], enforcing the canonical length.
pub fn address_from_slice(bytes: &[u8]) -> Result<Address, EntityError> {
    Address::try_from(bytes).map_err(|_| EntityError::AddressLength {
        actual: bytes.len(),
        expected: ADDRESS_LEN,
    })
}

/// Short hex rendering of an address for log fields.
pub fn short_address(address: &Address) -> String {
    hex::encode(&address[..4])
}

/// Position of a transaction in the ledger: total order over all transactions.
///
/// Ordered by round first, then by the transaction's index inside the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TxnPosition {
    /// Round that confirmed the transaction.
    pub round: Round,
    /// Index of the transaction within its round.
    pub intra: u32,
}

impl TxnPosition {
    /// First possible position.
    pub const MIN: TxnPosition = TxnPosition { round: 0, intra: 0 };

    /// Last possible position.
    pub const MAX: TxnPosition = TxnPosition {
        round: u64::MAX,
        intra: u32::MAX,
    };

    pub const fn new(round: Round, intra: u32) -> Self {
        Self { round, intra }
    }

    /// First position inside `round`.
    pub const fn round_start(round: Round) -> Self {
        Self { round, intra: 0 }
    }

    /// Last position inside `round`.
    pub const fn round_end(round: Round) -> Self {
        Self {
            round,
            intra: u32::MAX,
        }
    }
}

impl fmt::Display for TxnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.round, self.intra)
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Transaction type, numbered as the store's `TypeEnum` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxnType {
    Payment = 1,
    KeyRegistration = 2,
    AssetConfig = 3,
    AssetTransfer = 4,
    AssetFreeze = 5,
}

impl TxnType {
    /// Short wire label (`pay`, `keyreg`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnType::Payment => "pay",
            TxnType::KeyRegistration => "keyreg",
            TxnType::AssetConfig => "acfg",
            TxnType::AssetTransfer => "axfer",
            TxnType::AssetFreeze => "afrz",
        }
    }

    /// Numeric enum value.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TxnType {
    type Error = EntityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TxnType::Payment),
            2 => Ok(TxnType::KeyRegistration),
            3 => Ok(TxnType::AssetConfig),
            4 => Ok(TxnType::AssetTransfer),
            5 => Ok(TxnType::AssetFreeze),
            other => Err(EntityError::UnknownTxnType(other)),
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transaction was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigType {
    /// Single signature.
    Sig,
    /// Multisignature.
    Msig,
    /// Logic signature.
    Lsig,
}

impl SigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigType::Sig => "sig",
            SigType::Msig => "msig",
            SigType::Lsig => "lsig",
        }
    }
}

impl FromStr for SigType {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sig" => Ok(SigType::Sig),
            "msig" => Ok(SigType::Msig),
            "lsig" => Ok(SigType::Lsig),
            other => Err(EntityError::UnknownSigType(other.to_string())),
        }
    }
}

impl fmt::Display for SigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles an address can play in a transaction.
///
/// An empty set in a filter means "any role".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AddressRoles(u8);

impl AddressRoles {
    pub const NONE: AddressRoles = AddressRoles(0);
    pub const SENDER: AddressRoles = AddressRoles(1 << 0);
    pub const RECEIVER: AddressRoles = AddressRoles(1 << 1);
    pub const CLOSE_TO: AddressRoles = AddressRoles(1 << 2);
    pub const ASSET_SENDER: AddressRoles = AddressRoles(1 << 3);
    pub const ASSET_RECEIVER: AddressRoles = AddressRoles(1 << 4);
    pub const ASSET_CLOSE_TO: AddressRoles = AddressRoles(1 << 5);
    pub const FREEZE_TARGET: AddressRoles = AddressRoles(1 << 6);

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7f)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every role in `other` is also in `self`.
    pub const fn contains(self, other: AddressRoles) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when the two sets share at least one role.
    pub const fn intersects(self, other: AddressRoles) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for AddressRoles {
    type Output = AddressRoles;

    fn bitor(self, rhs: Self) -> Self::Output {
        AddressRoles(self.0 | rhs.0)
    }
}

/// A signed transaction together with the apply data the ledger recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txn_type: TxnType,
    pub sender: Address,
    pub fee: MicroAlgos,
    pub first_valid: Round,
    pub last_valid: Round,
    pub note: Vec<u8>,

    // Payment fields.
    pub receiver: Option<Address>,
    pub amount: MicroAlgos,
    pub close_remainder_to: Option<Address>,

    // Asset fields (transfer, config and freeze).
    pub asset_id: Option<AssetId>,
    pub asset_amount: u64,
    /// Clawback source of an asset transfer.
    pub asset_sender: Option<Address>,
    pub asset_receiver: Option<Address>,
    pub asset_close_to: Option<Address>,
    pub freeze_target: Option<Address>,

    pub sig_type: SigType,

    // Apply data.
    /// Id allocated by an asset creation; `asset_id` is unset on those.
    pub created_asset_id: Option<AssetId>,
    pub closing_amount: MicroAlgos,
    pub sender_rewards: MicroAlgos,
    pub receiver_rewards: MicroAlgos,
    pub close_rewards: MicroAlgos,
}

impl Transaction {
    /// A minimal transaction of the given type sent by `sender`.
    pub fn new(txn_type: TxnType, sender: Address) -> Self {
        Self {
            txn_type,
            sender,
            fee: 1_000,
            first_valid: 0,
            last_valid: 0,
            note: Vec::new(),
            receiver: None,
            amount: 0,
            close_remainder_to: None,
            asset_id: None,
            asset_amount: 0,
            asset_sender: None,
            asset_receiver: None,
            asset_close_to: None,
            freeze_target: None,
            sig_type: SigType::Sig,
            created_asset_id: None,
            closing_amount: 0,
            sender_rewards: 0,
            receiver_rewards: 0,
            close_rewards: 0,
        }
    }

    /// The asset this transaction references, including one it created.
    pub fn referenced_asset(&self) -> Option<AssetId> {
        self.asset_id.or(self.created_asset_id)
    }

    /// Amount moved including the remainder paid out on close.
    pub fn effective_amount(&self) -> u64 {
        self.amount.saturating_add(self.closing_amount)
    }

    /// Roles `address` plays in this transaction.
    pub fn roles_of(&self, address: &Address) -> AddressRoles {
        let mut roles = AddressRoles::NONE;
        let mut mark = |field: Option<&Address>, role: AddressRoles| {
            if field == Some(address) {
                roles = roles | role;
            }
        };
        mark(Some(&self.sender), AddressRoles::SENDER);
        mark(self.receiver.as_ref(), AddressRoles::RECEIVER);
        mark(self.close_remainder_to.as_ref(), AddressRoles::CLOSE_TO);
        mark(self.asset_sender.as_ref(), AddressRoles::ASSET_SENDER);
        mark(self.asset_receiver.as_ref(), AddressRoles::ASSET_RECEIVER);
        mark(self.asset_close_to.as_ref(), AddressRoles::ASSET_CLOSE_TO);
        mark(self.freeze_target.as_ref(), AddressRoles::FREEZE_TARGET);
        roles
    }

    /// Every distinct address that participates in this transaction.
    pub fn participants(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = std::iter::once(self.sender)
            .chain(self.receiver)
            .chain(self.close_remainder_to)
            .chain(self.asset_sender)
            .chain(self.asset_receiver)
            .chain(self.asset_close_to)
            .chain(self.freeze_target)
            .collect();
        addresses.sort_unstable();
        addresses.dedup();
        addresses
    }
}

/// A transaction with the round metadata the store keeps for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub round: Round,
    pub intra: u32,
    /// Unix timestamp (seconds) of the confirming round.
    pub round_time: u64,
    pub txn: Transaction,
}

impl TransactionRow {
    pub fn position(&self) -> TxnPosition {
        TxnPosition::new(self.round, self.intra)
    }
}

// =============================================================================
// CLUSTER C: ACCOUNTS & ASSETS
// =============================================================================

/// Parameters an asset was created (or last reconfigured) with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: String,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

/// An asset and its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_id: AssetId,
    pub creator: Address,
    pub params: AssetParams,
}

/// An account's holding of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_id: AssetId,
    pub amount: u64,
    pub frozen: bool,
}

/// Params of an asset created by the owning account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAsset {
    pub asset_id: AssetId,
    pub params: AssetParams,
}

/// Latest known state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    /// Round the snapshot reflects.
    pub round: Round,
    pub microalgos: MicroAlgos,
    pub rewards: MicroAlgos,
    /// Asset holdings. Stored snapshots are sorted by asset id, see [`AccountSnapshot::normalize`].
    pub assets: Vec<AssetHolding>,
    /// Assets this account created, sorted like `assets` once stored.
    pub created_assets: Vec<CreatedAsset>,
}

impl AccountSnapshot {
    pub fn new(address: Address, microalgos: MicroAlgos) -> Self {
        Self {
            address,
            round: 0,
            microalgos,
            rewards: 0,
            assets: Vec::new(),
            created_assets: Vec::new(),
        }
    }

    /// The holding of `asset_id`, if the account opted in.
    pub fn holding(&self, asset_id: AssetId) -> Option<&AssetHolding> {
        self.assets.iter().find(|h| h.asset_id == asset_id)
    }

    /// Sort holdings and created assets by asset id, keeping the first entry
    /// of any duplicated id.
    pub fn normalize(&mut self) {
        self.assets.sort_by_key(|h| h.asset_id);
        self.assets.dedup_by_key(|h| h.asset_id);
        self.created_assets.sort_by_key(|c| c.asset_id);
        self.created_assets.dedup_by_key(|c| c.asset_id);
    }
}

/// One account's balance of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub address: Address,
    pub asset_id: AssetId,
    pub amount: u64,
    pub frozen: bool,
}

impl AssetBalance {
    pub fn from_holding(address: Address, holding: &AssetHolding) -> Self {
        Self {
            address,
            asset_id: holding.asset_id,
            amount: holding.amount,
            frozen: holding.frozen,
        }
    }
}
