//! Order status notifier port.
//!
//! The order domain keeps its own payment-status column in sync with this
//! engine. Notification is best-effort: handlers log failures and keep going,
//! because the published domain events are the authoritative feed.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, TenantId};

/// Payment status as the order domain models it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPaymentStatus {
    Paid,
    PaymentFailed,
    Refunded,
}

impl OrderPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Paid => "paid",
            OrderPaymentStatus::PaymentFailed => "payment_failed",
            OrderPaymentStatus::Refunded => "refunded",
        }
    }
}

/// Port for pushing payment status to the order domain.
#[async_trait]
pub trait OrderStatusNotifier: Send + Sync {
    /// Update the payment status on an order.
    async fn notify_payment_status(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), DomainError>;
}
