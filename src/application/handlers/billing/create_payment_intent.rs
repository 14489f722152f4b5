//! CreatePaymentIntentHandler - issues a provider intent and opens the ledger
//! records for it.
//!
//! The provider call happens first, so a local failure afterwards leaves a
//! dangling intent at the provider. Compensation: cancel the intent
//! best-effort, and for a failed hold write also cancel the already-persisted
//! payment. A buyer can never be charged against a payment this service does
//! not know about.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::billing::{BillingError, EscrowHold, Payment, PaymentMode};
use crate::domain::foundation::{Currency, Money, OrderId, SupplierId, TenantId};
use crate::ports::{
    CreateIntentRequest, EscrowHoldRepository, PaymentGateway, PaymentRepository,
};

/// Command to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: String,
    pub mode: PaymentMode,

    /// Required for escrow mode; ignored for direct.
    pub supplier_id: Option<SupplierId>,

    pub idempotency_key: Option<String>,
}

/// Result of intent creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentResult {
    pub payment_id: String,
    pub intent_ref: String,
    pub client_secret: String,
    pub amount: Decimal,
    pub currency: String,
    pub hold_id: Option<String>,
}

/// Handler for creating payment intents.
pub struct CreatePaymentIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentRepository>,
    holds: Arc<dyn EscrowHoldRepository>,

    /// Grace period stamped on new escrow holds.
    auto_release_days: u32,
}

impl CreatePaymentIntentHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentRepository>,
        holds: Arc<dyn EscrowHoldRepository>,
        auto_release_days: u32,
    ) -> Self {
        Self {
            gateway,
            payments,
            holds,
            auto_release_days,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, BillingError> {
        // Validation happens before any side effect.
        let currency = Currency::new(cmd.currency.clone())?;
        let money = Money::new(cmd.amount, currency)?;
        let supplier_id = match cmd.mode {
            PaymentMode::Escrow => Some(cmd.supplier_id.ok_or_else(|| {
                BillingError::validation("supplier_id", "required for escrow payments")
            })?),
            PaymentMode::Direct => cmd.supplier_id,
        };

        let intent = self
            .gateway
            .create_intent(CreateIntentRequest {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                money: money.clone(),
                idempotency_key: cmd.idempotency_key,
            })
            .await
            .map_err(|e| BillingError::gateway_failed(e.to_string()))?;

        let payment = Payment::new_pending(
            cmd.tenant_id,
            cmd.order_id,
            intent.intent_ref.clone(),
            self.gateway.provider_name(),
            money.clone(),
            cmd.mode,
            intent.metadata,
        );

        if let Err(e) = self.payments.create(&payment).await {
            self.cancel_intent_best_effort(&intent.intent_ref).await;
            return Err(e.into());
        }

        let mut hold_id = None;
        if let (PaymentMode::Escrow, Some(supplier_id)) = (cmd.mode, supplier_id) {
            let hold = EscrowHold::new_pending(
                cmd.tenant_id,
                payment.id,
                cmd.order_id,
                supplier_id,
                money.clone(),
                self.auto_release_days,
            );
            if let Err(e) = self.holds.create(&hold).await {
                self.cancel_intent_best_effort(&intent.intent_ref).await;
                if let Err(cancel_err) = self
                    .payments
                    .mark_cancelled(cmd.tenant_id, payment.id)
                    .await
                {
                    tracing::warn!(
                        payment_id = %payment.id,
                        error = %cancel_err,
                        "failed to cancel payment after hold persist failure"
                    );
                }
                return Err(e.into());
            }
            hold_id = Some(hold.id.to_string());
        }

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            payment_id = %payment.id,
            intent_ref = %payment.intent_ref,
            mode = payment.mode.as_str(),
            "payment intent created"
        );

        Ok(CreatePaymentIntentResult {
            payment_id: payment.id.to_string(),
            intent_ref: intent.intent_ref,
            client_secret: intent.client_secret,
            amount: money.amount(),
            currency: money.currency().to_string(),
            hold_id,
        })
    }

    async fn cancel_intent_best_effort(&self, intent_ref: &str) {
        if let Err(e) = self.gateway.cancel_intent(intent_ref).await {
            tracing::warn!(
                intent_ref,
                error = %e,
                "failed to cancel provider intent during compensation"
            );
        }
    }
}
