//! Order records
//!
//! - Snapshots: immutable financial record of one vendor checkout
//! - Status: the small Received → {Completed, Failed} lifecycle
//! - Events: status changes published to the queue side and observers
//! - Query: read projections over the ledger (filter, search, sort, stats)

pub mod event;
pub mod query;
pub mod types;

// Re-exports
pub use event::OrderStatusChanged;
pub use query::{OrderQuery, OrderSort, OrderStats};
pub use types::*;
