//! Checkout
//!
//! 每次结账尝试的状态机:
//!
//! ```text
//! Idle ──start_payment──▶ Processing ──┬──▶ Success (order Received, cart group cleared, ticket issued)
//!                                      └──▶ Failure (order Failed, cart kept, no ticket)
//! ```
//!
//! The vendor group is re-read and frozen into the order snapshot *before*
//! the payment wait, so cart edits during the wait never change what was
//! charged. On success the ledger append, cart clear and ticket issue commit
//! in one storage transaction.

pub mod provider;

pub use provider::{
    PaymentError, PaymentProvider, PaymentReceipt, PaymentRequest, SimulatedPaymentProvider,
};

use crate::cart::{CartStore, ops as cart_ops};
use crate::core::{Clock, IdGenerator};
use crate::events::{EngineEvent, EventBus};
use crate::money;
use crate::orders::{OrderLedger, ops as order_ops};
use crate::queue::{QueueDispatcher, ops as queue_ops};
use crate::storage::{CART_KEY, EngineStorage, ORDERS_KEY, QUEUE_KEY, StorageResult};
use crate::utils::logger::ORDERS_TARGET;
use shared::cart::{Cart, VendorCartGroup};
use shared::order::{Order, OrderItem, OrderStatus, PayMethod};
use shared::queue::{QueueBook, Ticket};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Phase of one checkout attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Processing,
    Success,
    Failure,
}

/// One customer's checkout of one vendor group
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub vendor_id: String,
    pub vendor_name: String,
    /// Group as last seen (refreshed when payment starts)
    pub group: VendorCartGroup,
    pub phase: CheckoutPhase,
}

impl CheckoutSession {
    pub fn subtotal(&self) -> rust_decimal::Decimal {
        money::vendor_subtotal(&self.group)
    }
}

/// Customer choices for a payment attempt
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub pay_method: PayMethod,
    /// Name shown on the queue ticket
    pub customer_name: String,
    pub force_fail: bool,
}

impl CheckoutRequest {
    pub fn new(pay_method: PayMethod, customer_name: impl Into<String>) -> Self {
        Self {
            pay_method,
            customer_name: customer_name.into(),
            force_fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.force_fail = true;
        self
    }
}

/// Result of a resolved attempt
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    /// Present on success only
    pub ticket: Option<Ticket>,
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        self.order.status != OrderStatus::Failed
    }
}

/// Checkout orchestration over cart, ledger and queue
#[derive(Debug, Clone)]
pub struct CheckoutService {
    storage: EngineStorage,
    carts: CartStore,
    ledger: OrderLedger,
    queue: QueueDispatcher,
    provider: Arc<dyn PaymentProvider>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    payment_timeout: Duration,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: EngineStorage,
        carts: CartStore,
        ledger: OrderLedger,
        queue: QueueDispatcher,
        provider: Arc<dyn PaymentProvider>,
        bus: EventBus,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            carts,
            ledger,
            queue,
            provider,
            bus,
            clock,
            ids,
            payment_timeout,
        }
    }

    /// Start a session over the current vendor group
    pub fn open_checkout(&self, vendor_id: &str) -> Option<CheckoutSession> {
        let Some(group) = self.carts.vendor_group(vendor_id) else {
            tracing::warn!(vendor_id, "Vendor cart not found");
            return None;
        };
        Some(CheckoutSession {
            vendor_id: group.vendor_id.clone(),
            vendor_name: group.vendor_name.clone(),
            group,
            phase: CheckoutPhase::Idle,
        })
    }

    /// Run one payment attempt to completion
    ///
    /// Returns `None` when there is nothing to pay (group gone, session
    /// already paid) or the order could not be written. Every resolved
    /// attempt leaves an order in the ledger.
    pub async fn start_payment(
        &self,
        session: &mut CheckoutSession,
        request: CheckoutRequest,
        cancel: &CancellationToken,
    ) -> Option<CheckoutOutcome> {
        if matches!(session.phase, CheckoutPhase::Processing | CheckoutPhase::Success) {
            tracing::warn!(vendor_id = %session.vendor_id, phase = ?session.phase, "Checkout not payable in current phase");
            return None;
        }
        let Some(group) = self.carts.vendor_group(&session.vendor_id) else {
            tracing::warn!(vendor_id = %session.vendor_id, "Vendor cart not found");
            return None;
        };

        // Snapshot before the wait
        let order = self.snapshot_order(&group, request.pay_method);
        session.group = group;
        session.vendor_name = order.vendor_name.clone();
        session.phase = CheckoutPhase::Processing;

        let payment = PaymentRequest {
            order_id: order.id.clone(),
            vendor_id: order.vendor_id.clone(),
            amount: order.total,
            pay_method: order.pay_method,
            force_fail: request.force_fail,
        };
        tracing::info!(order_id = %order.id, vendor_id = %order.vendor_id, total = %order.total, "Payment started");

        let result =
            match tokio::time::timeout(self.payment_timeout, self.provider.authorize(&payment, cancel)).await {
                Ok(result) => result,
                Err(_) => Err(PaymentError::TimedOut),
            };

        match result {
            Ok(receipt) => {
                tracing::info!(order_id = %order.id, reference = %receipt.reference, "Payment approved");
                let Some(ticket) = self.finalize_success(&order, &request.customer_name) else {
                    session.phase = CheckoutPhase::Failure;
                    return None;
                };
                session.phase = CheckoutPhase::Success;
                Some(CheckoutOutcome {
                    order,
                    ticket: Some(ticket),
                })
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Payment failed");
                session.phase = CheckoutPhase::Failure;
                let failed = order.into_failed(e.failure_reason());
                if !self.ledger.add_order(failed.clone()) {
                    return None;
                }
                self.bus.publish(EngineEvent::OrderRecorded(failed.clone()));
                Some(CheckoutOutcome {
                    order: failed,
                    ticket: None,
                })
            }
        }
    }

    /// Success path: record the order, clear its vendor group, issue its ticket
    ///
    /// Idempotent per order id: a second call records nothing, clears nothing
    /// and returns the ticket issued the first time.
    pub fn finalize_success(&self, order: &Order, customer_name: &str) -> Option<Ticket> {
        if order.status != OrderStatus::Received {
            tracing::warn!(order_id = %order.id, status = ?order.status, "Only received orders can be finalized");
            return None;
        }

        let draft = self.queue.draft(&order.vendor_id, customer_name, Some(&order.id));
        let draft_ticket_id = draft.ticket_id.clone();

        let result: StorageResult<Option<(bool, Ticket)>> = self.storage.transact(|txn| {
            let mut orders: Vec<Order> = txn.load(ORDERS_KEY)?;
            let recorded = order_ops::insert_order(&mut orders, order.clone());
            if recorded {
                txn.save(ORDERS_KEY, &orders)?;

                let mut cart: Cart = txn.load(CART_KEY)?;
                if cart_ops::clear_vendor(&mut cart, &order.vendor_id).is_some() {
                    txn.save(CART_KEY, &cart)?;
                }
            } else if orders
                .iter()
                .any(|o| o.id == order.id && o.status == OrderStatus::Failed)
            {
                // Failed meanwhile: no ticket for it
                return Ok(None);
            }

            let mut book: QueueBook = txn.load(QUEUE_KEY)?;
            let ticket = queue_ops::issue_ticket(&mut book, draft);
            if ticket.ticket_id == draft_ticket_id {
                txn.save(QUEUE_KEY, &book)?;
            }
            Ok(Some((recorded, ticket)))
        });

        match result {
            Ok(Some((recorded, ticket))) => {
                if recorded {
                    tracing::info!(target: ORDERS_TARGET, order_id = %order.id, total = %order.total, ticket_no = ticket.ticket_no, "Order received");
                    self.bus.publish(EngineEvent::OrderRecorded(order.clone()));
                }
                if ticket.ticket_id == draft_ticket_id {
                    self.bus.publish(EngineEvent::TicketIssued(ticket.clone()));
                }
                Some(ticket)
            }
            Ok(None) => {
                tracing::warn!(order_id = %order.id, "Order already failed, not issuing ticket");
                None
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Failed to commit checkout");
                None
            }
        }
    }

    fn snapshot_order(&self, group: &VendorCartGroup, pay_method: PayMethod) -> Order {
        let items: Vec<OrderItem> = group
            .lines()
            .into_iter()
            .map(|line| OrderItem::from_line(line, money::line_total(line)))
            .collect();
        Order::received(
            self.ids.order_id(),
            group,
            items,
            money::vendor_subtotal(group),
            pay_method,
            self.clock.now_millis(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{DefaultIds, ManualClock};
    use rust_decimal::Decimal;
    use shared::models::{MenuAddon, MenuItem, Stall};
    use shared::order::FailureReason;

    fn service(delay_ms: u64, timeout_ms: u64) -> (CheckoutService, CartStore, OrderLedger, QueueDispatcher) {
        let storage = EngineStorage::open_in_memory().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000, 1));
        let ids: Arc<dyn IdGenerator> = Arc::new(DefaultIds);
        let carts = CartStore::new(storage.clone());
        let ledger = OrderLedger::new(storage.clone(), clock.clone());
        let queue = QueueDispatcher::new(storage.clone(), clock.clone(), ids.clone(), 5);
        let svc = CheckoutService::new(
            storage,
            carts.clone(),
            ledger.clone(),
            queue.clone(),
            Arc::new(SimulatedPaymentProvider::new(Duration::from_millis(delay_ms))),
            EventBus::new(16),
            clock,
            ids,
            Duration::from_millis(timeout_ms),
        );
        (svc, carts, ledger, queue)
    }

    fn fill(carts: &CartStore) {
        let stall = Stall::new("s1", "Tian Tian");
        let rice = MenuItem::new("rice", "Chicken Rice", Decimal::new(450, 2));
        let egg = MenuAddon::new("egg", "Egg", Decimal::new(80, 2));
        carts.add_line(&stall, &rice, 2, &[egg]).unwrap();
        carts
            .add_line(&stall, &MenuItem::new("tea", "Iced Tea", Decimal::new(200, 2)), 1, &[])
            .unwrap();
    }

    #[test]
    fn test_open_checkout_missing_vendor() {
        let (svc, _, _, _) = service(1, 1_000);
        assert!(svc.open_checkout("s1").is_none());
    }

    #[tokio::test]
    async fn test_success_path() {
        let (svc, carts, ledger, queue) = service(1, 1_000);
        fill(&carts);
        let mut session = svc.open_checkout("s1").unwrap();
        assert_eq!(session.subtotal(), Decimal::new(1260, 2));

        let outcome = svc
            .start_payment(&mut session, CheckoutRequest::new(PayMethod::PayNow, "Mei"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(session.phase, CheckoutPhase::Success);
        assert_eq!(outcome.order.total, Decimal::new(1260, 2));
        assert_eq!(outcome.order.items.len(), 2);
        let ticket = outcome.ticket.unwrap();
        assert_eq!(ticket.ticket_no, 1);
        assert_eq!(ticket.order_id.as_deref(), Some(outcome.order.id.as_str()));

        assert!(carts.vendor_group("s1").is_none());
        assert_eq!(ledger.orders().len(), 1);
        assert_eq!(queue.find_ticket_for_order(&outcome.order.id).unwrap().ticket_id, ticket.ticket_id);
    }

    #[tokio::test]
    async fn test_order_items_follow_add_order() {
        let (svc, carts, ledger, _) = service(1, 1_000);
        let stall = Stall::new("s1", "Tian Tian");
        carts
            .add_line(&stall, &MenuItem::new("laksa", "Curry Laksa", Decimal::new(650, 2)), 1, &[])
            .unwrap();
        carts
            .add_line(&stall, &MenuItem::new("kopi", "Kopi O", Decimal::new(140, 2)), 1, &[])
            .unwrap();

        let mut session = svc.open_checkout("s1").unwrap();
        let outcome = svc
            .start_payment(&mut session, CheckoutRequest::new(PayMethod::Cash, "Mei"), &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<&str> = outcome.order.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Curry Laksa", "Kopi O"]);
        // Equal quantities: the first item added wins
        assert_eq!(ledger.compute_stats().favorite_item, "Curry Laksa");
    }

    #[tokio::test]
    async fn test_failure_keeps_cart() {
        let (svc, carts, ledger, queue) = service(1, 1_000);
        fill(&carts);
        let mut session = svc.open_checkout("s1").unwrap();

        let outcome = svc
            .start_payment(&mut session, CheckoutRequest::new(PayMethod::Card, "Mei").failing(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert!(outcome.ticket.is_none());
        assert_eq!(outcome.order.failure_reason, Some(FailureReason::PaymentDeclined));
        assert_eq!(session.phase, CheckoutPhase::Failure);
        assert!(carts.vendor_group("s1").is_some());
        assert!(ledger.orders()[0].is_failed());
        assert!(queue.active_tickets("s1").is_empty());

        // Retry after a failure is allowed
        let retry = svc
            .start_payment(&mut session, CheckoutRequest::new(PayMethod::Card, "Mei"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(retry.is_success());
        assert_eq!(ledger.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_fails_order() {
        let (svc, carts, _, _) = service(500, 5);
        fill(&carts);
        let mut session = svc.open_checkout("s1").unwrap();
        let outcome = svc
            .start_payment(&mut session, CheckoutRequest::new(PayMethod::Cash, "Mei"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.order.failure_reason, Some(FailureReason::PaymentTimedOut));
        assert!(carts.vendor_group("s1").is_some());
    }

    #[tokio::test]
    async fn test_paid_session_is_not_payable_again() {
        let (svc, carts, ledger, _) = service(1, 1_000);
        fill(&carts);
        let mut session = svc.open_checkout("s1").unwrap();
        let request = CheckoutRequest::new(PayMethod::PayNow, "Mei");
        svc.start_payment(&mut session, request.clone(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(svc
            .start_payment(&mut session, request, &CancellationToken::new())
            .await
            .is_none());
        assert_eq!(ledger.orders().len(), 1);
    }

    #[test]
    fn test_finalize_success_is_idempotent() {
        let (svc, carts, ledger, queue) = service(1, 1_000);
        fill(&carts);
        let group = carts.vendor_group("s1").unwrap();
        let order = svc.snapshot_order(&group, PayMethod::Cash);

        let first = svc.finalize_success(&order, "Mei").unwrap();
        // Customer starts a new cart at the same stall
        fill(&carts);
        let second = svc.finalize_success(&order, "Mei").unwrap();

        assert_eq!(first.ticket_id, second.ticket_id);
        assert_eq!(queue.queue("s1").tickets.len(), 1);
        assert_eq!(ledger.orders().len(), 1);
        assert!(carts.vendor_group("s1").is_some());
    }

    #[test]
    fn test_finalize_rejects_failed_orders() {
        let (svc, carts, ledger, queue) = service(1, 1_000);
        fill(&carts);
        let group = carts.vendor_group("s1").unwrap();
        let order = svc.snapshot_order(&group, PayMethod::Cash);

        assert!(svc
            .finalize_success(&order.clone().into_failed(FailureReason::PaymentDeclined), "Mei")
            .is_none());

        svc.finalize_success(&order, "Mei").unwrap();
        ledger.cancel_order(&order.id).unwrap();
        queue.apply_order_event(&ledger_event(&order.id));
        assert!(svc.finalize_success(&order, "Mei").is_none());
    }

    fn ledger_event(order_id: &str) -> shared::order::OrderStatusChanged {
        shared::order::OrderStatusChanged {
            order_id: order_id.to_string(),
            vendor_id: "s1".to_string(),
            from: OrderStatus::Received,
            to: OrderStatus::Failed,
            reason: Some(FailureReason::CustomerCancelled),
            at: 0,
        }
    }
}
