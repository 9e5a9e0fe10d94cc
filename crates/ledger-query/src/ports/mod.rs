//! Ports Layer
//!
//! - Driving Port (inbound): `LedgerQueryApi`
//! - Driven Port (outbound): `RowStore`

pub mod inbound;
pub mod outbound;

pub use inbound::LedgerQueryApi;
pub use outbound::{RowScan, RowStore, ScanDimension, ScanDirection, ScanItem, ScanRequest};
