//! # Cursor Codec
//!
//! Continuation tokens are opaque to callers. Internally a token is the
//! lowercase hex encoding of:
//!
//! ```text
//! version (1) | key kind (1) | key bytes (12 / 32 / 8, big endian) | filter identity (8) | crc32 (4)
//! ```
//!
//! A token is only accepted by a query with the same key kind and the same
//! filter identity as the query that issued it. Resumption is always strictly
//! after the decoded key.

use sha2::{Digest, Sha256};
use std::fmt;

use super::errors::CursorError;
use super::position::{KeyKind, PositionKey};

/// Current token layout version.
pub const CURSOR_VERSION: u8 = 1;

const HEADER_LEN: usize = 2;
const IDENTITY_LEN: usize = 8;
const CHECKSUM_LEN: usize = 4;

/// Smallest well-formed token, in bytes.
const MIN_TOKEN_BYTES: usize = HEADER_LEN + 8 + IDENTITY_LEN + CHECKSUM_LEN;

/// Longest token any key kind produces, in hex characters.
pub const MAX_ENCODED_CURSOR_LEN: usize = (HEADER_LEN + 32 + IDENTITY_LEN + CHECKSUM_LEN) * 2;

/// Hash of the structural parts of a filter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterIdentity([u8; IDENTITY_LEN]);

impl FilterIdentity {
    pub fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }
}

impl fmt::Debug for FilterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterIdentity({})", hex::encode(self.0))
    }
}

/// Builds a [`FilterIdentity`] from a canonical field-by-field description.
///
/// Each field is written as `name | presence | length | value`, so an absent
/// field never collides with an empty one and reordering values between
/// fields changes the hash.
pub struct IdentityHasher {
    hasher: Sha256,
}

impl IdentityHasher {
    /// Start a description for the entity named `label`.
    pub fn new(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([CURSOR_VERSION]);
        hasher.update((label.len() as u32).to_be_bytes());
        hasher.update(label.as_bytes());
        Self { hasher }
    }

    pub fn bytes(mut self, name: &str, value: Option<&[u8]>) -> Self {
        self.hasher.update((name.len() as u32).to_be_bytes());
        self.hasher.update(name.as_bytes());
        match value {
            Some(bytes) => {
                self.hasher.update([1u8]);
                self.hasher.update((bytes.len() as u32).to_be_bytes());
                self.hasher.update(bytes);
            }
            None => self.hasher.update([0u8]),
        }
        self
    }

    pub fn u64(self, name: &str, value: Option<u64>) -> Self {
        let encoded = value.map(u64::to_be_bytes);
        self.bytes(name, encoded.as_ref().map(|b| b.as_slice()))
    }

    pub fn str(self, name: &str, value: Option<&str>) -> Self {
        self.bytes(name, value.map(str::as_bytes))
    }

    pub fn flag(self, name: &str, value: bool) -> Self {
        self.bytes(name, Some(&[value as u8][..]))
    }

    pub fn finish(self) -> FilterIdentity {
        let digest = self.hasher.finalize();
        let mut identity = [0u8; IDENTITY_LEN];
        identity.copy_from_slice(&digest[..IDENTITY_LEN]);
        FilterIdentity(identity)
    }
}

/// A decoded continuation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorToken {
    pub position: PositionKey,
    pub identity: FilterIdentity,
}

impl CursorToken {
    pub fn new(position: PositionKey, identity: FilterIdentity) -> Self {
        Self { position, identity }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let key = self.position.to_bytes();
        let mut bytes = Vec::with_capacity(HEADER_LEN + key.len() + IDENTITY_LEN + CHECKSUM_LEN);
        bytes.push(CURSOR_VERSION);
        bytes.push(self.position.kind().tag());
        bytes.extend_from_slice(&key);
        bytes.extend_from_slice(self.identity.as_bytes());
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());
        bytes
    }

    /// Parse raw token bytes without checking them against a query.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CursorError> {
        if bytes.len() < MIN_TOKEN_BYTES {
            return Err(CursorError::Truncated {
                actual: bytes.len(),
                expected: MIN_TOKEN_BYTES,
            });
        }

        let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let mut expected = [0u8; CHECKSUM_LEN];
        expected.copy_from_slice(checksum);
        if crc32fast::hash(body) != u32::from_be_bytes(expected) {
            return Err(CursorError::Checksum);
        }

        if body[0] != CURSOR_VERSION {
            return Err(CursorError::UnsupportedVersion(body[0]));
        }
        let kind = KeyKind::from_tag(body[1]).ok_or(CursorError::UnknownKind(body[1]))?;

        let expected_len = HEADER_LEN + kind.key_len() + IDENTITY_LEN + CHECKSUM_LEN;
        if bytes.len() != expected_len {
            return Err(CursorError::Truncated {
                actual: bytes.len(),
                expected: expected_len,
            });
        }

        let key_end = HEADER_LEN + kind.key_len();
        let position = PositionKey::from_bytes(kind, &body[HEADER_LEN..key_end]).ok_or(
            CursorError::Truncated {
                actual: bytes.len(),
                expected: expected_len,
            },
        )?;
        let mut identity = [0u8; IDENTITY_LEN];
        identity.copy_from_slice(&body[key_end..key_end + IDENTITY_LEN]);

        Ok(Self {
            position,
            identity: FilterIdentity(identity),
        })
    }
}

/// Encode the position of the last emitted row into a continuation token.
pub fn encode_cursor(position: PositionKey, identity: FilterIdentity) -> String {
    hex::encode(CursorToken::new(position, identity).to_bytes())
}

/// Decode a token and check that it belongs to the current query.
///
/// Returns the position to resume strictly after.
pub fn decode_cursor(
    token: &str,
    expected_kind: KeyKind,
    expected_identity: FilterIdentity,
    max_len: usize,
) -> Result<PositionKey, CursorError> {
    if token.is_empty() {
        return Err(CursorError::Empty);
    }
    if token.len() > max_len {
        return Err(CursorError::TooLong {
            len: token.len(),
            max: max_len,
        });
    }

    let bytes = hex::decode(token).map_err(|_| CursorError::Encoding)?;
    let cursor = CursorToken::from_bytes(&bytes)?;

    let actual_kind = cursor.position.kind();
    if actual_kind != expected_kind {
        return Err(CursorError::KindMismatch {
            expected: expected_kind,
            actual: actual_kind,
        });
    }
    if cursor.identity != expected_identity {
        return Err(CursorError::ForeignFilter);
    }

    tracing::debug!(position = %cursor.position, "decoded cursor");
    Ok(cursor.position)
}
