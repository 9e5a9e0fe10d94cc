//! Adapters Layer (Driven Adapters)
//!
//! ## Adapters
//!
//! - `MemoryRowStore` - in-memory ledger history implementing `RowStore`
//! - `codec` - `bincode` row encoding shared by stores and the executor

pub mod codec;
pub mod memory;

pub use codec::{decode_row, encode_row};
pub use memory::MemoryRowStore;
