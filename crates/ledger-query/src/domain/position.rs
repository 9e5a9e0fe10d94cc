//! # Position Keys
//!
//! Every row a scan yields carries a position key that totally orders it among
//! rows of the same kind. Scans, cursors and consistency checks all speak in
//! position keys.

use shared_types::{short_address, Address, AssetId, TxnPosition, ADDRESS_LEN, MIN_ADDRESS};
use std::fmt;
use std::ops::Bound;

/// The kind of entity a position key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `(round, intra)` transaction positions.
    Txn,
    /// Account addresses (accounts and asset balances).
    Account,
    /// Asset identifiers.
    Asset,
}

impl KeyKind {
    /// Tag byte used in cursor tokens.
    pub fn tag(self) -> u8 {
        match self {
            KeyKind::Txn => 1,
            KeyKind::Account => 2,
            KeyKind::Asset => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(KeyKind::Txn),
            2 => Some(KeyKind::Account),
            3 => Some(KeyKind::Asset),
            _ => None,
        }
    }

    /// Length of the big-endian key encoding.
    pub fn key_len(self) -> usize {
        match self {
            KeyKind::Txn => 12,
            KeyKind::Account => ADDRESS_LEN,
            KeyKind::Asset => 8,
        }
    }

    /// Smallest key of this kind.
    pub fn min_key(self) -> PositionKey {
        match self {
            KeyKind::Txn => PositionKey::Txn(TxnPosition::MIN),
            KeyKind::Account => PositionKey::Account(MIN_ADDRESS),
            KeyKind::Asset => PositionKey::Asset(0),
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyKind::Txn => "txn",
            KeyKind::Account => "account",
            KeyKind::Asset => "asset",
        })
    }
}

/// Position of a row within its scan.
///
/// Keys of one kind are totally ordered; keys of different kinds are never
/// compared by the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionKey {
    Txn(TxnPosition),
    Account(Address),
    Asset(AssetId),
}

impl PositionKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            PositionKey::Txn(_) => KeyKind::Txn,
            PositionKey::Account(_) => KeyKind::Account,
            PositionKey::Asset(_) => KeyKind::Asset,
        }
    }

    pub fn as_txn(&self) -> Option<TxnPosition> {
        match self {
            PositionKey::Txn(position) => Some(*position),
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<Address> {
        match self {
            PositionKey::Account(address) => Some(*address),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<AssetId> {
        match self {
            PositionKey::Asset(id) => Some(*id),
            _ => None,
        }
    }

    /// Big-endian key bytes, so byte order matches key order.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PositionKey::Txn(position) => {
                let mut bytes = Vec::with_capacity(12);
                bytes.extend_from_slice(&position.round.to_be_bytes());
                bytes.extend_from_slice(&position.intra.to_be_bytes());
                bytes
            }
            PositionKey::Account(address) => address.to_vec(),
            PositionKey::Asset(id) => id.to_be_bytes().to_vec(),
        }
    }

    /// Inverse of [`PositionKey::to_bytes`]. `None` when the length is wrong.
    pub fn from_bytes(kind: KeyKind, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != kind.key_len() {
            return None;
        }
        let key = match kind {
            KeyKind::Txn => {
                let round = u64::from_be_bytes(bytes[..8].try_into().ok()?);
                let intra = u32::from_be_bytes(bytes[8..12].try_into().ok()?);
                PositionKey::Txn(TxnPosition::new(round, intra))
            }
            KeyKind::Account => PositionKey::Account(bytes.try_into().ok()?),
            KeyKind::Asset => PositionKey::Asset(u64::from_be_bytes(bytes.try_into().ok()?)),
        };
        Some(key)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionKey::Txn(position) => write!(f, "txn:{}", position),
            PositionKey::Account(address) => write!(f, "account:{}", short_address(address)),
            PositionKey::Asset(id) => write!(f, "asset:{}", id),
        }
    }
}

/// The more restrictive of two lower bounds.
pub fn tighter_lower<K: Ord>(a: Bound<K>, b: Bound<K>) -> Bound<K> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.max(y)),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.max(y)),
        (Bound::Included(inc), Bound::Excluded(exc))
        | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc > exc {
                Bound::Included(inc)
            } else {
                Bound::Excluded(exc)
            }
        }
    }
}

/// Resume strictly after `cursor`, never widening the plan's own lower bound.
pub fn resume_after(lower: Bound<PositionKey>, cursor: PositionKey) -> Bound<PositionKey> {
    tighter_lower(lower, Bound::Excluded(cursor))
}

/// True when no key can satisfy both bounds.
///
/// `BTreeMap::range` panics on such ranges, so every scan checks first.
pub fn range_is_empty<K: Ord>(lower: &Bound<K>, upper: &Bound<K>) -> bool {
    match (lower, upper) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
    }
}

/// Map a position bound into a typed bound, checking the key kind.
pub fn typed_bound<K>(
    bound: &Bound<PositionKey>,
    extract: impl Fn(&PositionKey) -> Option<K>,
) -> Option<Bound<K>> {
    match bound {
        Bound::Included(key) => extract(key).map(Bound::Included),
        Bound::Excluded(key) => extract(key).map(Bound::Excluded),
        Bound::Unbounded => Some(Bound::Unbounded),
    }
}

/// Kind of the key inside a bound, if any.
pub fn bound_kind(bound: &Bound<PositionKey>) -> Option<KeyKind> {
    match bound {
        Bound::Included(key) | Bound::Excluded(key) => Some(key.kind()),
        Bound::Unbounded => None,
    }
}
