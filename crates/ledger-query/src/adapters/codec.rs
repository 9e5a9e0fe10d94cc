//! Row encoding
//!
//! Rows are stored as `bincode` bytes. Decoding happens in the executor so
//! that a corrupt row surfaces as an in-band storage error for that position.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::StorageError;
use crate::domain::position::PositionKey;

pub fn encode_row<T: Serialize>(row: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(row).map_err(|e| StorageError::Encode(e.to_string()))
}

pub fn decode_row<T: DeserializeOwned>(position: PositionKey, raw: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(raw).map_err(|e| StorageError::Decode {
        position,
        reason: e.to_string(),
    })
}
