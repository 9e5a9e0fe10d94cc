//! # Shared Types Crate
//!
//! Ledger entities shared by the query subsystem, the storage adapters and the
//! test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every payload a query can stream is defined here.
//! - **Position-Addressable**: Each entity exposes the key that totally orders it
//!   within a scan (`TxnPosition`, `Address`, `AssetId`).
//! - **Encoding-Agnostic**: Addresses are raw 32-byte keys; text encodings belong
//!   to the API transport, not to this crate.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
