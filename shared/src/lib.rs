//! Shared types for the Hawker engine
//!
//! Plain data records exchanged between the engine and its callers:
//! catalog models, the per-vendor cart, order snapshots and lifecycle events,
//! and per-stall queue tickets. Everything here is serde-serializable and
//! free of I/O.

pub mod cart;
pub mod models;
pub mod order;
pub mod queue;
pub mod util;

// Re-exports
pub use cart::{Cart, CartLine, VendorCartGroup};
pub use models::{MenuAddon, MenuItem, Stall};
pub use order::{
    FailureReason, Order, OrderItem, OrderQuery, OrderSort, OrderStats, OrderStatus,
    OrderStatusChanged, PayMethod,
};
pub use queue::{QueueBook, QueuePosition, StallQueue, Ticket, TicketStatus, TicketStatusChanged};
pub use serde::{Deserialize, Serialize};
