//! # Error Types
//!
//! Errors raised while converting external representations into ledger entities.

use thiserror::Error;

/// Errors that can occur when parsing ledger entity fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Address bytes do not have the canonical 32-byte length.
    #[error("Invalid address length: {actual} bytes (expected {expected})")]
    AddressLength { actual: usize, expected: usize },

    /// Numeric transaction type outside the known range.
    #[error("Unknown transaction type: {0}")]
    UnknownTxnType(u8),

    /// Signature type label not recognized.
    #[error("Unknown signature type: {0:?}")]
    UnknownSigType(String),
}
