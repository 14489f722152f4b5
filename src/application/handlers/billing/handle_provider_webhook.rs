//! HandleProviderWebhookHandler - reconciles ledger state from provider
//! webhooks.
//!
//! Webhooks arrive at-least-once and out of order. Every transition goes
//! through a compare-and-swap, so of N identical deliveries exactly one
//! mutates state and publishes events; the rest resolve to `AlreadyProcessed`
//! without re-firing anything downstream. A delivery that contradicts an
//! existing terminal status is an error, never an overwrite.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, EscrowHeld, HoldStatus, Payment, PaymentFailed, PaymentSucceeded,
};
use crate::domain::foundation::{EventEnvelope, SerializableDomainEvent, Timestamp};
use crate::ports::{
    EventPublisher, EscrowHoldRepository, OrderPaymentStatus, OrderStatusNotifier,
    PaymentGateway, PaymentRepository, TransitionOutcome, WebhookKind,
};

/// Command to process a provider webhook.
#[derive(Debug, Clone)]
pub struct HandleProviderWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// Webhook signature header.
    pub signature: String,
}

/// Result of webhook reconciliation.
#[derive(Debug, Clone)]
pub enum HandleProviderWebhookResult {
    /// Payment confirmed; escrow hold (if any) is now held.
    PaymentSucceeded { payment_id: String },
    /// Payment declined.
    PaymentFailed { payment_id: String },
    /// Duplicate delivery of an already-applied event.
    AlreadyProcessed { payment_id: String },
    /// Recognized signature, unhandled event type.
    Ignored,
}

/// Handler for provider webhook reconciliation.
pub struct HandleProviderWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentRepository>,
    holds: Arc<dyn EscrowHoldRepository>,
    publisher: Arc<dyn EventPublisher>,
    order_notifier: Arc<dyn OrderStatusNotifier>,
}

impl HandleProviderWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentRepository>,
        holds: Arc<dyn EscrowHoldRepository>,
        publisher: Arc<dyn EventPublisher>,
        order_notifier: Arc<dyn OrderStatusNotifier>,
    ) -> Self {
        Self {
            gateway,
            payments,
            holds,
            publisher,
            order_notifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleProviderWebhookCommand,
    ) -> Result<HandleProviderWebhookResult, BillingError> {
        let event = self
            .gateway
            .verify_webhook(&cmd.payload, &cmd.signature)
            .map_err(|_| BillingError::invalid_webhook_signature())?;

        match event.kind {
            WebhookKind::PaymentSucceeded => {
                let payment = self.find_payment(&event.intent_ref).await?;
                self.apply_succeeded(payment).await
            }
            WebhookKind::PaymentFailed { reason } => {
                let payment = self.find_payment(&event.intent_ref).await?;
                self.apply_failed(payment, reason).await
            }
            WebhookKind::Other { event_type } => {
                tracing::debug!(event_type, "ignoring unhandled webhook kind");
                Ok(HandleProviderWebhookResult::Ignored)
            }
        }
    }

    /// Never auto-create: an unknown intent_ref is a configuration fault or a
    /// cross-environment webhook, not a new payment.
    async fn find_payment(&self, intent_ref: &str) -> Result<Payment, BillingError> {
        self.payments
            .find_by_intent_ref(intent_ref)
            .await?
            .ok_or_else(|| BillingError::payment_not_found_by_intent_ref(intent_ref))
    }

    async fn apply_succeeded(
        &self,
        payment: Payment,
    ) -> Result<HandleProviderWebhookResult, BillingError> {
        use crate::domain::billing::PaymentStatus;

        let paid_at = Timestamp::now();
        match self
            .payments
            .mark_succeeded(payment.tenant_id, payment.id, paid_at)
            .await?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::Stale(PaymentStatus::Succeeded) => {
                tracing::info!(payment_id = %payment.id, "duplicate succeeded webhook");
                return Ok(HandleProviderWebhookResult::AlreadyProcessed {
                    payment_id: payment.id.to_string(),
                });
            }
            TransitionOutcome::Stale(current) => {
                return Err(BillingError::state_conflict(
                    current.to_string(),
                    "succeeded",
                ));
            }
        }

        self.notify_order(&payment, OrderPaymentStatus::Paid).await;

        let mut events: Vec<EventEnvelope> = Vec::new();
        if payment.is_escrow() {
            if let Some(hold) = self
                .holds
                .find_by_payment_id(payment.tenant_id, payment.id)
                .await?
            {
                match self
                    .holds
                    .transition(
                        payment.tenant_id,
                        hold.id,
                        HoldStatus::Pending,
                        HoldStatus::Held,
                    )
                    .await?
                {
                    TransitionOutcome::Applied => {
                        events.push(
                            EscrowHeld::from_hold(&hold)
                                .to_envelope()
                                .with_tenant_id(payment.tenant_id.to_string()),
                        );
                    }
                    TransitionOutcome::Stale(current) => {
                        tracing::warn!(
                            hold_id = %hold.id,
                            current = %current,
                            "hold not pending while applying succeeded webhook"
                        );
                    }
                }
            } else {
                tracing::warn!(payment_id = %payment.id, "escrow payment has no hold");
            }
        }

        let mut updated = payment.clone();
        updated.paid_at = Some(paid_at);
        events.push(
            PaymentSucceeded::from_payment(&updated)
                .to_envelope()
                .with_tenant_id(payment.tenant_id.to_string()),
        );
        self.publish_best_effort(events).await;

        Ok(HandleProviderWebhookResult::PaymentSucceeded {
            payment_id: payment.id.to_string(),
        })
    }

    async fn apply_failed(
        &self,
        payment: Payment,
        reason: String,
    ) -> Result<HandleProviderWebhookResult, BillingError> {
        use crate::domain::billing::PaymentStatus;

        match self
            .payments
            .mark_failed(payment.tenant_id, payment.id, &reason)
            .await?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::Stale(PaymentStatus::Failed) => {
                tracing::info!(payment_id = %payment.id, "duplicate failed webhook");
                return Ok(HandleProviderWebhookResult::AlreadyProcessed {
                    payment_id: payment.id.to_string(),
                });
            }
            TransitionOutcome::Stale(current) => {
                return Err(BillingError::state_conflict(current.to_string(), "failed"));
            }
        }

        self.notify_order(&payment, OrderPaymentStatus::PaymentFailed)
            .await;

        self.publish_best_effort(vec![PaymentFailed::from_payment(&payment, reason)
            .to_envelope()
            .with_tenant_id(payment.tenant_id.to_string())])
            .await;

        Ok(HandleProviderWebhookResult::PaymentFailed {
            payment_id: payment.id.to_string(),
        })
    }

    async fn notify_order(&self, payment: &Payment, status: OrderPaymentStatus) {
        if let Err(e) = self
            .order_notifier
            .notify_payment_status(payment.tenant_id, payment.order_id, status)
            .await
        {
            tracing::warn!(
                order_id = %payment.order_id,
                status = status.as_str(),
                error = %e,
                "order status notification failed"
            );
        }
    }

    async fn publish_best_effort(&self, events: Vec<EventEnvelope>) {
        if let Err(e) = self.publisher.publish_all(events).await {
            tracing::warn!(error = %e, "event publication failed");
        }
    }
}
