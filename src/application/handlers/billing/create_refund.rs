//! CreateRefundHandler - reverses part or all of a succeeded payment.
//!
//! The remaining balance is computed from completed refunds only, so a
//! declined attempt never eats into what can still be refunded. A gateway
//! decline persists a `Failed` refund row for audit; a transport error
//! persists nothing, because the provider-side outcome is unknown.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::billing::{BillingError, Refund, RefundIssued};
use crate::domain::foundation::{
    ActorId, Currency, Money, OrderId, PaymentId, SerializableDomainEvent, TenantId,
};
use crate::ports::{
    EventPublisher, OrderPaymentStatus, OrderStatusNotifier, PaymentGateway, PaymentRepository,
    RefundRepository, RefundRequest,
};

/// Command to refund a payment.
#[derive(Debug, Clone)]
pub struct CreateRefundCommand {
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub created_by: ActorId,
}

/// Result of a refund attempt that reached the gateway.
#[derive(Debug, Clone)]
pub enum CreateRefundResult {
    /// The gateway confirmed the refund.
    Issued {
        refund_id: String,
        refund_number: String,
        provider_refund_ref: String,
    },

    /// The gateway declined; a failed refund row was persisted.
    Declined {
        refund_id: String,
        failure_reason: String,
    },
}

/// Handler for issuing refunds.
pub struct CreateRefundHandler {
    payments: Arc<dyn PaymentRepository>,
    refunds: Arc<dyn RefundRepository>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
    order_notifier: Arc<dyn OrderStatusNotifier>,
}

impl CreateRefundHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        refunds: Arc<dyn RefundRepository>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
        order_notifier: Arc<dyn OrderStatusNotifier>,
    ) -> Self {
        Self {
            payments,
            refunds,
            gateway,
            publisher,
            order_notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateRefundCommand,
    ) -> Result<CreateRefundResult, BillingError> {
        let payment = self
            .payments
            .find_by_id(cmd.tenant_id, cmd.payment_id)
            .await?
            .ok_or_else(|| BillingError::payment_not_found(cmd.payment_id))?;

        if !payment.is_refundable() {
            return Err(BillingError::not_refundable(payment.id, payment.status));
        }

        let currency = Currency::new(cmd.currency.clone())?;
        let money = Money::new(cmd.amount, currency)?;
        if !money.same_currency(&payment.money) {
            return Err(BillingError::validation(
                "currency",
                format!("payment is denominated in {}", payment.money.currency()),
            ));
        }

        let already_refunded = self
            .refunds
            .completed_total(cmd.tenant_id, payment.id)
            .await?;
        let available = payment.money.amount() - already_refunded;
        if money.amount() > available {
            return Err(BillingError::refund_exceeds_balance(
                payment.id,
                money.amount().to_string(),
                available.to_string(),
            ));
        }

        // Transport errors abort here: the provider-side state is unknown,
        // so no local row is written.
        let outcome = self
            .gateway
            .refund(RefundRequest {
                tenant_id: cmd.tenant_id,
                intent_ref: payment.intent_ref.clone(),
                money: money.clone(),
                reason: cmd.reason.clone(),
            })
            .await
            .map_err(|e| BillingError::gateway_failed(e.to_string()))?;

        if !outcome.success {
            let failure_reason = outcome
                .failure_reason
                .unwrap_or_else(|| "refund declined by provider".to_string());
            let refund = Refund::failed(
                cmd.tenant_id,
                payment.id,
                payment.order_id,
                money,
                cmd.reason,
                failure_reason.clone(),
                cmd.created_by,
            );
            self.refunds.create(&refund).await?;
            tracing::warn!(
                tenant_id = %cmd.tenant_id,
                payment_id = %payment.id,
                refund_id = %refund.id,
                reason = %failure_reason,
                "refund declined"
            );
            return Ok(CreateRefundResult::Declined {
                refund_id: refund.id.to_string(),
                failure_reason,
            });
        }

        let provider_refund_ref = outcome
            .refund_ref
            .unwrap_or_else(|| "unknown".to_string());
        let refund = Refund::completed(
            cmd.tenant_id,
            payment.id,
            payment.order_id,
            money.clone(),
            cmd.reason,
            provider_refund_ref.clone(),
            cmd.created_by,
        );
        self.refunds.create(&refund).await?;

        let event = RefundIssued::from_refund(&refund)
            .to_envelope()
            .with_tenant_id(cmd.tenant_id.to_string());
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(refund_id = %refund.id, error = %e, "event publication failed");
        }

        // Fully refunded payments flip the order's payment status.
        if already_refunded + money.amount() >= payment.money.amount() {
            self.notify_refunded(cmd.tenant_id, payment.order_id).await;
        }

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            payment_id = %payment.id,
            refund_id = %refund.id,
            refund_number = %refund.refund_number,
            "refund issued"
        );

        Ok(CreateRefundResult::Issued {
            refund_id: refund.id.to_string(),
            refund_number: refund.refund_number,
            provider_refund_ref,
        })
    }

    async fn notify_refunded(&self, tenant_id: TenantId, order_id: OrderId) {
        if let Err(e) = self
            .order_notifier
            .notify_payment_status(tenant_id, order_id, OrderPaymentStatus::Refunded)
            .await
        {
            tracing::warn!(order_id = %order_id, error = %e, "order notification failed");
        }
    }
}
