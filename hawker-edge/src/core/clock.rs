//! 时间与 ID 协作者
//!
//! Injected into every component so tests can pin timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

/// Source of `createdAt` / `updatedAt` timestamps (Unix millis)
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

/// Manually driven clock; every read advances by `step` millis
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
    step: i64,
}

impl ManualClock {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            step,
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Opaque, collision-resistant identifiers
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    fn order_id(&self) -> String;
    fn ticket_id(&self) -> String;
}

/// Snowflake order ids (time ordered), UUID v4 ticket ids
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIds;

impl IdGenerator for DefaultIds {
    fn order_id(&self) -> String {
        format!("ORD{}", shared::util::snowflake_id())
    }

    fn ticket_id(&self) -> String {
        shared::util::uuid_string()
    }
}
