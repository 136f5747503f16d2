use std::sync::Arc;

use shared::order::{OrderStatus, OrderStatusChanged};
use shared::queue::{TicketStatus, TicketStatusChanged};

use crate::cart::CartStore;
use crate::checkout::{CheckoutService, PaymentProvider, SimulatedPaymentProvider};
use crate::core::clock::{Clock, DefaultIds, IdGenerator, SystemClock};
use crate::core::{Config, Result};
use crate::events::{EngineEvent, EventBus};
use crate::orders::OrderLedger;
use crate::queue::QueueDispatcher;
use crate::storage::EngineStorage;

/// 引擎状态 - 持有所有组件的共享引用
///
/// 所有组件共享同一个 [`EngineStorage`]，克隆成本极低。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | storage | EngineStorage | redb 文档存储 |
/// | carts | CartStore | 购物车 |
/// | ledger | OrderLedger | 订单账本 |
/// | queue | QueueDispatcher | 叫号队列 |
/// | checkout | CheckoutService | 结账与支付 |
/// | bus | EventBus | 状态事件广播 |
///
/// # 状态联动
///
/// Order and ticket status changes go through this type so both sides stay in
/// step:
///
/// ```text
/// update_order_status ──▶ ledger ──OrderStatusChanged──▶ queue.apply_order_event
/// set_ticket_status ────▶ queue ──TicketStatusChanged──▶ ledger.apply_ticket_event
/// ```
///
/// Terminal states reject further moves, so the follow-up change never
/// bounces back.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub config: Config,
    pub storage: EngineStorage,
    pub carts: CartStore,
    pub ledger: OrderLedger,
    pub queue: QueueDispatcher,
    pub checkout: CheckoutService,
    pub bus: EventBus,
}

impl EngineState {
    /// 初始化引擎状态 (文件数据库)
    ///
    /// 1. 校验配置
    /// 2. 创建工作目录
    /// 3. 打开 redb 数据库
    pub fn initialize(config: &Config) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.work_dir)?;

        let db_path = config.database_path();
        let storage = EngineStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Storage opened");

        let provider = Arc::new(SimulatedPaymentProvider::new(config.payment_delay()));
        Ok(Self::assemble(config.clone(), storage, provider, Arc::new(SystemClock), Arc::new(DefaultIds)))
    }

    /// In-memory engine with the simulated provider (tests, demos)
    pub fn in_memory(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = EngineStorage::open_in_memory()?;
        let provider = Arc::new(SimulatedPaymentProvider::new(config.payment_delay()));
        Ok(Self::assemble(config, storage, provider, Arc::new(SystemClock), Arc::new(DefaultIds)))
    }

    /// Wire every component over one storage
    pub fn assemble(
        config: Config,
        storage: EngineStorage,
        provider: Arc<dyn PaymentProvider>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let bus = EventBus::new(config.event_channel_capacity);
        let carts = CartStore::new(storage.clone());
        let ledger = OrderLedger::new(storage.clone(), clock.clone());
        let queue = QueueDispatcher::new(
            storage.clone(),
            clock.clone(),
            ids.clone(),
            config.service_minutes_per_ticket,
        );
        let checkout = CheckoutService::new(
            storage.clone(),
            carts.clone(),
            ledger.clone(),
            queue.clone(),
            provider,
            bus.clone(),
            clock,
            ids,
            config.payment_timeout(),
        );

        Self {
            config,
            storage,
            carts,
            ledger,
            queue,
            checkout,
            bus,
        }
    }

    // ========== 状态联动 ==========

    /// Move an order and close its ticket accordingly
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Option<OrderStatusChanged> {
        let event = self.ledger.update_status(order_id, status)?;
        self.after_order_change(&event);
        Some(event)
    }

    /// Customer cancel; the ticket (if any) becomes CANCELLED
    pub fn cancel_order(&self, order_id: &str) -> Option<OrderStatusChanged> {
        let event = self.ledger.cancel_order(order_id)?;
        self.after_order_change(&event);
        Some(event)
    }

    /// Move a ticket and settle its order accordingly
    pub fn set_ticket_status(
        &self,
        stall_id: &str,
        ticket_id: &str,
        status: TicketStatus,
    ) -> Option<TicketStatusChanged> {
        let event = self.queue.set_status(stall_id, ticket_id, status)?;
        self.after_ticket_change(&event);
        Some(event)
    }

    /// Vendor calls the next waiting ticket
    pub fn call_next(&self, stall_id: &str) -> Option<TicketStatusChanged> {
        let event = self.queue.call_next(stall_id)?;
        self.after_ticket_change(&event);
        Some(event)
    }

    fn after_order_change(&self, event: &OrderStatusChanged) {
        self.bus.publish(EngineEvent::OrderStatusChanged(event.clone()));
        if let Some(follow) = self.queue.apply_order_event(event) {
            self.bus.publish(EngineEvent::TicketStatusChanged(follow));
        }
    }

    fn after_ticket_change(&self, event: &TicketStatusChanged) {
        self.bus.publish(EngineEvent::TicketStatusChanged(event.clone()));
        if let Some(follow) = self.ledger.apply_ticket_event(event) {
            self.bus.publish(EngineEvent::OrderStatusChanged(follow));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_rejects_invalid_config() {
        let mut config = Config::for_tests("./unused");
        config.service_minutes_per_ticket = 0;
        assert!(EngineState::in_memory(config).is_err());
    }

    #[test]
    fn test_initialize_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("engine");
        let config = Config::for_tests(work_dir.to_string_lossy());

        let state = EngineState::initialize(&config).unwrap();
        assert!(config.database_path().exists());
        assert!(state.carts.cart().is_empty());
    }

    #[test]
    fn test_walk_in_ticket_touches_no_order() {
        let state = EngineState::in_memory(Config::for_tests("./unused")).unwrap();
        let ticket = state.queue.issue_ticket("s1", "Walk-in", None).unwrap();
        let event = state
            .set_ticket_status("s1", &ticket.ticket_id, TicketStatus::Done)
            .unwrap();
        assert_eq!(event.to, TicketStatus::Done);
        assert!(state.ledger.orders().is_empty());
    }
}
