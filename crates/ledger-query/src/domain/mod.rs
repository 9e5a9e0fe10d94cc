//! Domain layer for ledger queries.
//!
//! Pure logic: filter options, predicates, plans, cursors and configuration.
//! No I/O lives here.

pub mod config;
pub mod cursor;
pub mod entity;
pub mod errors;
pub mod filters;
pub mod planner;
pub mod position;
pub mod predicates;

pub use config::{QueryConfig, QueryConfigBuilder};
pub use cursor::{decode_cursor, encode_cursor, CursorToken, FilterIdentity, IdentityHasher};
pub use entity::{
    AccountEntity, AccountProjection, AssetEntity, BalanceEntity, QueryEntity, TransactionEntity,
};
pub use errors::{ConfigError, CursorError, FilterError, QueryError, ShortResultError, StorageError};
pub use filters::{AccountQueryOptions, AssetBalanceQuery, AssetsQuery, TransactionFilter};
pub use planner::{
    compile_accounts, compile_asset_balances, compile_assets, compile_transactions, AccessTier,
    CompiledQuery, ScanPlan,
};
pub use position::{KeyKind, PositionKey};
pub use predicates::{AccountPredicate, AssetPredicate, BalancePredicate, Evaluate, TxnPredicate};
