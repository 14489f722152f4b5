//! Payment gateway port for external payment processing.
//!
//! Defines the contract for provider integrations (mock, Stripe-style HTTP).
//! Implementations handle intent issuance, payouts, refunds, and webhook
//! signature verification.
//!
//! # Design
//!
//! - **Gateway agnostic**: the engine never sees provider wire formats
//! - **Idempotent**: operations carry provider references safe to retry
//! - **Closed event set**: webhook kinds the engine reacts to are enumerated;
//!   everything else surfaces as `Other` and is acknowledged without effect

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, TenantId};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the provider name stored on payments ("mock", "stripe", ...).
    fn provider_name(&self) -> &'static str;

    /// Create a payment intent with the provider.
    ///
    /// Returns the provider's intent reference and the client secret the
    /// buyer-facing app needs to confirm the payment.
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Cancel a previously created intent.
    ///
    /// Used as saga compensation when local persistence fails after the
    /// intent was issued. Must be safe to call on already-cancelled intents.
    async fn cancel_intent(&self, intent_ref: &str) -> Result<(), GatewayError>;

    /// Transfer funds to a supplier's payout account.
    async fn payout(&self, request: PayoutRequest) -> Result<PayoutOutcome, GatewayError>;

    /// Refund part or all of a captured payment.
    ///
    /// A declined refund is a successful call with `success == false`; an
    /// `Err` means the call itself failed and may be retried.
    async fn refund(&self, request: RefundRequest) -> Result<RefundOutcome, GatewayError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Returns the parsed event if the signature is valid and fresh.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub money: Money,

    /// Key for provider-side deduplication of retried creates.
    pub idempotency_key: Option<String>,
}

/// Intent issued by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Provider's intent reference ("pi_...").
    pub intent_ref: String,

    /// Secret the buyer-facing app uses to confirm the payment.
    pub client_secret: String,

    /// Provider-specific data worth persisting alongside the payment.
    pub metadata: serde_json::Value,
}

/// Request to pay out to a supplier account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub tenant_id: TenantId,

    /// Provider-side destination account reference.
    pub destination_account_ref: String,

    pub money: Money,

    /// Free-form description carried to the provider statement.
    pub description: String,
}

/// Result of a payout call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutOutcome {
    /// Provider's payout/transfer reference ("txn_...").
    pub payout_ref: String,
}

/// Request to refund a captured payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub tenant_id: TenantId,

    /// Intent reference of the payment being reversed.
    pub intent_ref: String,

    pub money: Money,
    pub reason: String,
}

/// Result of a refund call. Declines come back as a value, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub success: bool,

    /// Provider's refund reference ("re_..."), set on success.
    pub refund_ref: Option<String>,

    /// Provider's decline reason, set on failure.
    pub failure_reason: Option<String>,
}

/// Parsed, signature-verified webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayWebhookEvent {
    /// Provider's event ID.
    pub event_ref: String,

    /// Intent the event concerns.
    pub intent_ref: String,

    pub kind: WebhookKind,

    /// Provider timestamp (Unix seconds).
    pub created_at: i64,
}

/// The webhook kinds the engine reacts to.
///
/// Closed on purpose: dispatch is a match, not a string table, so adding a
/// handled kind forces every match site to be revisited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookKind {
    /// Provider confirmed capture of the payment.
    PaymentSucceeded,

    /// Provider declined the payment.
    PaymentFailed { reason: String },

    /// Recognized signature, unhandled type. Acknowledged without effect.
    Other { event_type: String },
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,

    /// Provider's error code, when one was returned.
    pub provider_code: Option<String>,

    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Declined, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidWebhook, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = match err.code {
            GatewayErrorCode::InvalidWebhook => ErrorCode::InvalidWebhookSignature,
            _ => ErrorCode::GatewayError,
        };
        DomainError::new(code, err.message)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Provider declined the operation.
    Declined,

    /// Referenced object does not exist at the provider.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Invalid webhook signature or stale timestamp.
    InvalidWebhook,

    /// Provider API error.
    ProviderError,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::Declined => "declined",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::InvalidWebhook => "invalid_webhook",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

/// Unpacks an amount into the integer minor units most providers speak.
///
/// Half-cents round away from zero, so a 10.505 charge becomes 1051 minor
/// units, never 1050.
pub fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::new(100, 0))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn gateway_error_retryable() {
        assert!(GatewayErrorCode::NetworkError.is_retryable());
        assert!(GatewayErrorCode::RateLimitExceeded.is_retryable());
        assert!(!GatewayErrorCode::Declined.is_retryable());
        assert!(!GatewayErrorCode::InvalidWebhook.is_retryable());
    }

    #[test]
    fn invalid_webhook_maps_to_signature_error_code() {
        let err: DomainError = GatewayError::invalid_webhook("bad signature").into();
        assert_eq!(err.code, ErrorCode::InvalidWebhookSignature);

        let err: DomainError = GatewayError::network("timeout").into();
        assert_eq!(err.code, ErrorCode::GatewayError);
    }

    #[test]
    fn minor_units_rounds_half_cents() {
        assert_eq!(to_minor_units(Decimal::new(2500, 0)), 250_000);
        assert_eq!(to_minor_units("10.505".parse().unwrap()), 1051);
        assert_eq!(to_minor_units("10.515".parse().unwrap()), 1052);
        assert_eq!(to_minor_units("10.504".parse().unwrap()), 1050);
    }

    #[test]
    fn webhook_kind_serializes_with_type_tag() {
        let kind = WebhookKind::PaymentFailed {
            reason: "card declined".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "payment_failed");
        assert_eq!(json["reason"], "card declined");
    }
}
