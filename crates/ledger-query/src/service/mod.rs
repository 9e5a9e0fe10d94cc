//! Service Layer
//!
//! Orchestrates the domain layer and the row store: the executor drives one
//! scan, the stream module moves its envelopes to the caller, and the facade
//! wires both behind `LedgerQueryApi`.

pub mod executor;
pub mod facade;
pub mod stream;

pub use executor::{ExecutionState, RowEnvelope, ScanExecution};
pub use facade::LedgerQueryService;
pub use stream::{CancelHandle, Page, QueryContext, RowStream};
