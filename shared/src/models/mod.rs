//! Data models
//!
//! Read-only catalog data supplied by the stall directory. The engine prices
//! cart lines from these records but never modifies them.

pub mod catalog;

// Re-exports
pub use catalog::*;
