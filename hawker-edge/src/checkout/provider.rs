//! 支付提供方
//!
//! The only suspension point of the engine. A provider resolves one
//! authorization per checkout attempt; the caller can abort it through the
//! [`CancellationToken`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::order::{FailureReason, PayMethod};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// What the provider is asked to charge
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub order_id: String,
    pub vendor_id: String,
    pub amount: Decimal,
    pub pay_method: PayMethod,
    /// Demo hook: decline regardless of amount
    pub force_fail: bool,
}

/// Proof of a successful authorization
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub reference: String,
    pub authorized_at: i64,
}

/// Payment failures; each one ends as a Failed order
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment cancelled")]
    Cancelled,

    #[error("Payment timed out")]
    TimedOut,
}

impl PaymentError {
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            PaymentError::Declined(_) => FailureReason::PaymentDeclined,
            PaymentError::Cancelled => FailureReason::PaymentCancelled,
            PaymentError::TimedOut => FailureReason::PaymentTimedOut,
        }
    }
}

/// Pluggable payment backend
#[async_trait]
pub trait PaymentProvider: Send + Sync + std::fmt::Debug {
    async fn authorize(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Waits a fixed delay, then approves unless `force_fail` is set
#[derive(Debug, Clone)]
pub struct SimulatedPaymentProvider {
    delay: Duration,
}

impl SimulatedPaymentProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedPaymentProvider {
    async fn authorize(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentReceipt, PaymentError> {
        tracing::debug!(order_id = %request.order_id, amount = %request.amount, "Simulating payment");

        tokio::select! {
            _ = cancel.cancelled() => return Err(PaymentError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }

        if request.force_fail {
            return Err(PaymentError::Declined("simulated decline".to_string()));
        }

        Ok(PaymentReceipt {
            reference: shared::util::uuid_string(),
            authorized_at: shared::util::now_millis(),
        })
    }
}
