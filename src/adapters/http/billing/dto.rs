//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! These types define the JSON request/response structure for the billing API.
//! They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::{
    CreatePaymentIntentResult, CreateRefundResult, HandleProviderWebhookResult,
    ReleaseEscrowResult, SweepReport, UpdateDisputeStatusResult,
};
use crate::domain::billing::{EscrowHold, Payment, PaymentMode, Refund, Settlement};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// The order this payment collects on.
    pub order_id: uuid::Uuid,
    /// Payment amount in major units.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment mode: "direct" or "escrow".
    pub mode: PaymentMode,
    /// Supplier receiving the funds. Required for escrow mode.
    #[serde(default)]
    pub supplier_id: Option<uuid::Uuid>,
    /// Client-supplied key for safe retries.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Request to release an escrow hold.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEscrowRequest {
    /// Reason recorded on the hold.
    pub reason: String,
}

/// Request to set or clear dispute status on an order's holds.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDisputeStatusRequest {
    pub order_id: uuid::Uuid,
    pub has_dispute: bool,
}

/// Request to refund a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRefundRequest {
    pub payment_id: uuid::Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
}

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Filter parameters for listing payments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPaymentsParams {
    #[serde(default)]
    pub order_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Filter parameters for listing escrow holds.
#[derive(Debug, Clone, Deserialize)]
pub struct ListHoldsParams {
    pub supplier_id: uuid::Uuid,
}

/// Filter parameters for listing refunds.
#[derive(Debug, Clone, Deserialize)]
pub struct ListRefundsParams {
    pub payment_id: uuid::Uuid,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for intent creation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentResponse {
    pub payment_id: String,
    pub intent_ref: String,
    /// Secret the buyer-facing app uses to confirm the payment.
    pub client_secret: String,
    pub amount: Decimal,
    pub currency: String,
    /// Escrow hold opened alongside the payment, if mode was escrow.
    pub hold_id: Option<String>,
}

impl From<CreatePaymentIntentResult> for PaymentIntentResponse {
    fn from(result: CreatePaymentIntentResult) -> Self {
        Self {
            payment_id: result.payment_id,
            intent_ref: result.intent_ref,
            client_secret: result.client_secret,
            amount: result.amount,
            currency: result.currency,
            hold_id: result.hold_id,
        }
    }
}

/// Payment details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub intent_ref: String,
    pub provider: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub mode: String,
    pub failure_reason: Option<String>,
    /// When the provider confirmed capture (ISO 8601).
    pub paid_at: Option<String>,
    pub created_at: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            order_id: payment.order_id.to_string(),
            intent_ref: payment.intent_ref,
            provider: payment.provider,
            amount: payment.money.amount(),
            currency: payment.money.currency().as_str().to_string(),
            status: payment.status.as_str().to_string(),
            mode: payment.mode.as_str().to_string(),
            failure_reason: payment.failure_reason,
            paid_at: payment.paid_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: payment.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Escrow hold details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowHoldResponse {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub supplier_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub auto_release_date: Option<String>,
    pub released_at: Option<String>,
    pub released_by: Option<String>,
    pub release_reason: Option<String>,
    pub blocked_by_dispute: bool,
    pub created_at: String,
}

impl From<EscrowHold> for EscrowHoldResponse {
    fn from(hold: EscrowHold) -> Self {
        Self {
            id: hold.id.to_string(),
            payment_id: hold.payment_id.to_string(),
            order_id: hold.order_id.to_string(),
            supplier_id: hold.supplier_id.to_string(),
            amount: hold.money.amount(),
            currency: hold.money.currency().as_str().to_string(),
            status: hold.status.as_str().to_string(),
            auto_release_date: hold
                .auto_release_date
                .map(|t| t.as_datetime().to_rfc3339()),
            released_at: hold.released_at.map(|t| t.as_datetime().to_rfc3339()),
            released_by: hold.released_by.map(|a| a.to_string()),
            release_reason: hold.release_reason,
            blocked_by_dispute: hold.blocked_by_dispute,
            created_at: hold.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Settlement details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResponse {
    pub id: String,
    pub escrow_hold_id: String,
    pub supplier_id: String,
    pub payout_account_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub provider_payout_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub settled_at: Option<String>,
    pub created_at: String,
}

impl From<Settlement> for SettlementResponse {
    fn from(settlement: Settlement) -> Self {
        Self {
            id: settlement.id.to_string(),
            escrow_hold_id: settlement.escrow_hold_id.to_string(),
            supplier_id: settlement.supplier_id.to_string(),
            payout_account_id: settlement.payout_account_id.to_string(),
            amount: settlement.money.amount(),
            currency: settlement.money.currency().as_str().to_string(),
            status: settlement.status.as_str().to_string(),
            provider_payout_ref: settlement.provider_payout_ref,
            failure_reason: settlement.failure_reason,
            settled_at: settlement.settled_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: settlement.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Refund details for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct RefundResponse {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub refund_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub status: String,
    pub provider_refund_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub refunded_at: Option<String>,
    pub created_at: String,
}

impl From<Refund> for RefundResponse {
    fn from(refund: Refund) -> Self {
        Self {
            id: refund.id.to_string(),
            payment_id: refund.payment_id.to_string(),
            order_id: refund.order_id.to_string(),
            refund_number: refund.refund_number,
            amount: refund.money.amount(),
            currency: refund.money.currency().as_str().to_string(),
            reason: refund.reason,
            status: refund.status.as_str().to_string(),
            provider_refund_ref: refund.provider_refund_ref,
            failure_reason: refund.failure_reason,
            refunded_at: refund.refunded_at.map(|t| t.as_datetime().to_rfc3339()),
            created_at: refund.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for an escrow release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseEscrowResponse {
    pub hold_id: String,
    pub settlement_id: String,
    pub provider_payout_ref: String,
}

impl From<ReleaseEscrowResult> for ReleaseEscrowResponse {
    fn from(result: ReleaseEscrowResult) -> Self {
        Self {
            hold_id: result.hold_id,
            settlement_id: result.settlement_id,
            provider_payout_ref: result.provider_payout_ref,
        }
    }
}

/// Response for a refund request. Declines are a 200 with `issued: false`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRefundResponse {
    pub refund_id: String,
    pub issued: bool,
    pub refund_number: Option<String>,
    pub provider_refund_ref: Option<String>,
    pub failure_reason: Option<String>,
}

impl From<CreateRefundResult> for CreateRefundResponse {
    fn from(result: CreateRefundResult) -> Self {
        match result {
            CreateRefundResult::Issued {
                refund_id,
                refund_number,
                provider_refund_ref,
            } => Self {
                refund_id,
                issued: true,
                refund_number: Some(refund_number),
                provider_refund_ref: Some(provider_refund_ref),
                failure_reason: None,
            },
            CreateRefundResult::Declined {
                refund_id,
                failure_reason,
            } => Self {
                refund_id,
                issued: false,
                refund_number: None,
                provider_refund_ref: None,
                failure_reason: Some(failure_reason),
            },
        }
    }
}

/// Response for dispute status propagation.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateDisputeStatusResponse {
    pub holds_updated: u32,
}

impl From<UpdateDisputeStatusResult> for UpdateDisputeStatusResponse {
    fn from(result: UpdateDisputeStatusResult) -> Self {
        Self {
            holds_updated: result.holds_updated,
        }
    }
}

/// Response for webhook acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub outcome: String,
}

impl From<HandleProviderWebhookResult> for WebhookAckResponse {
    fn from(result: HandleProviderWebhookResult) -> Self {
        let outcome = match result {
            HandleProviderWebhookResult::PaymentSucceeded { .. } => "payment_succeeded",
            HandleProviderWebhookResult::PaymentFailed { .. } => "payment_failed",
            HandleProviderWebhookResult::AlreadyProcessed { .. } => "already_processed",
            HandleProviderWebhookResult::Ignored => "ignored",
        };
        Self {
            outcome: outcome.to_string(),
        }
    }
}

/// Response for the manual sweep trigger.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub released: u32,
    pub blocked: u32,
    pub failed: u32,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            released: report.released,
            blocked: report.blocked,
            failed: report.failed,
        }
    }
}

/// Standard error response structure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail with machine-readable code and human message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_structure() {
        let response = ErrorResponse::new("PAYMENT_NOT_FOUND", "Payment not found");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], "PAYMENT_NOT_FOUND");
        assert_eq!(json["error"]["message"], "Payment not found");
    }

    #[test]
    fn declined_refund_response_sets_issued_false() {
        let response = CreateRefundResponse::from(CreateRefundResult::Declined {
            refund_id: "r1".to_string(),
            failure_reason: "refund window closed".to_string(),
        });
        assert!(!response.issued);
        assert_eq!(
            response.failure_reason.as_deref(),
            Some("refund window closed")
        );
        assert!(response.provider_refund_ref.is_none());
    }

    #[test]
    fn webhook_ack_outcome_names() {
        let ack = WebhookAckResponse::from(HandleProviderWebhookResult::Ignored);
        assert_eq!(ack.outcome, "ignored");
    }
}
