//! Stripe-style HTTP payment gateway.
//!
//! Implements the `PaymentGateway` port against a Stripe-compatible REST API:
//! form-encoded requests, basic-auth with the secret key, and HMAC-SHA256
//! webhook signatures with a replay window.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::{
    to_minor_units, CreateIntentRequest, GatewayError, GatewayIntent, GatewayWebhookEvent,
    PaymentGateway, PayoutOutcome, PayoutRequest, RefundOutcome, RefundRequest, WebhookKind,
};

use super::webhook_types::{
    ProviderPaymentIntent, ProviderRefund, ProviderTransfer, ProviderWebhookEvent, SignatureHeader,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook timestamp before it is rejected as a replay.
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Tolerance for clock skew on future-dated timestamps.
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Configuration for the Stripe-style gateway.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// Secret API key (sk_test_... or sk_live_...).
    pub api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    pub webhook_secret: SecretString,

    /// API base URL. Overridable for tests against a local stub.
    pub api_base_url: String,

    /// Reject webhook events with livemode=false. Enable in production.
    pub require_livemode: bool,

    /// Per-request timeout for calls to the provider.
    pub timeout: Duration,
}

impl StripeGatewayConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe-style gateway backed by reqwest.
pub struct StripeGateway {
    config: StripeGatewayConfig,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeGatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Verify the HMAC-SHA256 signature over `"{timestamp}.{payload}"`.
    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), GatewayError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            return Err(GatewayError::invalid_webhook(format!(
                "Webhook timestamp too old: {} seconds",
                age
            )));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            return Err(GatewayError::invalid_webhook(
                "Webhook timestamp is in the future",
            ));
        }

        let mut mac = HmacSha256::new_from_slice(
            self.config.webhook_secret.expose_secret().as_bytes(),
        )
        .map_err(|_| GatewayError::invalid_webhook("Invalid webhook secret"))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if expected.ct_eq(header.v1_signature.as_slice()).into() {
            Ok(())
        } else {
            Err(GatewayError::invalid_webhook("Signature mismatch"))
        }
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = self
            .client
            .post(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), None::<&str>)
            .form(params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        request
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("Request to {} failed: {}", path, e)))
    }

    /// Map a non-2xx provider response to a gateway error.
    async fn error_from_response(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let provider_code = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")?
                    .get("code")
                    .and_then(|c| c.as_str())
                    .map(String::from)
            });

        let err = match status.as_u16() {
            401 | 403 => GatewayError::authentication("Provider rejected API credentials"),
            402 => GatewayError::declined("Provider declined the operation"),
            404 => GatewayError::not_found("Provider object"),
            429 => GatewayError::new(
                crate::ports::GatewayErrorCode::RateLimitExceeded,
                "Provider rate limit exceeded",
            ),
            _ => GatewayError::provider(format!("Provider returned {}", status)),
        };

        match provider_code {
            Some(code) => err.with_provider_code(code),
            None => err,
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::provider(format!("Failed to parse provider response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider_name(&self) -> &'static str {
        "stripe"
    }

    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<GatewayIntent, GatewayError> {
        let params = vec![
            ("amount", to_minor_units(request.money.amount()).to_string()),
            (
                "currency",
                request.money.currency().as_str().to_lowercase(),
            ),
            ("metadata[tenant_id]", request.tenant_id.to_string()),
            ("metadata[order_id]", request.order_id.to_string()),
        ];

        let response = self
            .post_form(
                "/v1/payment_intents",
                &params,
                request.idempotency_key.as_deref(),
            )
            .await?;
        let intent: ProviderPaymentIntent = Self::decode(response).await?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| GatewayError::provider("Provider returned intent without client_secret"))?;

        Ok(GatewayIntent {
            intent_ref: intent.id,
            client_secret,
            metadata: serde_json::json!({
                "provider": "stripe",
                "status": intent.status,
            }),
        })
    }

    async fn cancel_intent(&self, intent_ref: &str) -> Result<(), GatewayError> {
        let path = format!("/v1/payment_intents/{}/cancel", intent_ref);
        let response = self.post_form(&path, &[], None).await?;
        let _: ProviderPaymentIntent = Self::decode(response).await?;
        Ok(())
    }

    async fn payout(&self, request: PayoutRequest) -> Result<PayoutOutcome, GatewayError> {
        let params = vec![
            ("amount", to_minor_units(request.money.amount()).to_string()),
            (
                "currency",
                request.money.currency().as_str().to_lowercase(),
            ),
            ("destination", request.destination_account_ref.clone()),
            ("description", request.description.clone()),
        ];

        let response = self.post_form("/v1/transfers", &params, None).await?;
        let transfer: ProviderTransfer = Self::decode(response).await?;

        Ok(PayoutOutcome {
            payout_ref: transfer.id,
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundOutcome, GatewayError> {
        let params = vec![
            ("payment_intent", request.intent_ref.clone()),
            ("amount", to_minor_units(request.money.amount()).to_string()),
        ];

        let response = self.post_form("/v1/refunds", &params, None).await?;

        // A declined refund comes back as a refund object in state "failed",
        // not as an HTTP error.
        let refund: ProviderRefund = Self::decode(response).await?;
        if refund.status == "failed" {
            return Ok(RefundOutcome {
                success: false,
                refund_ref: Some(refund.id),
                failure_reason: refund
                    .failure_reason
                    .or_else(|| Some("refund failed at provider".to_string())),
            });
        }

        Ok(RefundOutcome {
            success: true,
            refund_ref: Some(refund.id),
            failure_reason: None,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError> {
        let header = SignatureHeader::parse(signature)
            .map_err(|e| GatewayError::invalid_webhook(e.to_string()))?;
        self.verify_signature(payload, &header)?;

        let event: ProviderWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::invalid_webhook(format!("Malformed event payload: {}", e)))?;

        if self.config.require_livemode && !event.livemode {
            return Err(GatewayError::invalid_webhook(
                "Test-mode event rejected in live configuration",
            ));
        }

        let intent: ProviderPaymentIntent = serde_json::from_value(event.data.object)
            .map_err(|e| GatewayError::invalid_webhook(format!("Malformed event object: {}", e)))?;

        let kind = match event.event_type.as_str() {
            "payment_intent.succeeded" => WebhookKind::PaymentSucceeded,
            "payment_intent.payment_failed" => WebhookKind::PaymentFailed {
                reason: intent
                    .last_payment_error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "payment failed".to_string()),
            },
            other => WebhookKind::Other {
                event_type: other.to_string(),
            },
        };

        Ok(GatewayWebhookEvent {
            event_ref: event.id,
            intent_ref: intent.id,
            kind,
            created_at: event.created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::webhook_types::hex_encode;
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_key";

    fn test_gateway() -> StripeGateway {
        StripeGateway::new(StripeGatewayConfig::new("sk_test_123", TEST_SECRET))
    }

    /// Builds a valid `t=...,v1=...` header for a payload at a given timestamp.
    fn create_test_signature(payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let signature = hex_encode(&mac.finalize().into_bytes());
        format!("t={},v1={}", timestamp, signature)
    }

    fn succeeded_event_payload() -> Vec<u8> {
        serde_json::json!({
            "id": "evt_test_1",
            "type": "payment_intent.succeeded",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "pi_test_1",
                    "status": "succeeded"
                }
            },
            "livemode": false
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn valid_signature_parses_succeeded_event() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();
        let signature = create_test_signature(&payload, chrono::Utc::now().timestamp());

        let event = gateway.verify_webhook(&payload, &signature).unwrap();
        assert_eq!(event.event_ref, "evt_test_1");
        assert_eq!(event.intent_ref, "pi_test_1");
        assert_eq!(event.kind, WebhookKind::PaymentSucceeded);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();
        let signature = create_test_signature(&payload, chrono::Utc::now().timestamp());

        let mut tampered = payload.clone();
        tampered.extend_from_slice(b" ");
        let err = gateway.verify_webhook(&tampered, &signature).unwrap_err();
        assert_eq!(err.code, crate::ports::GatewayErrorCode::InvalidWebhook);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();

        let mut mac = HmacSha256::new_from_slice(b"whsec_wrong_secret").unwrap();
        let timestamp = chrono::Utc::now().timestamp();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(&payload);
        let signature = format!("t={},v1={}", timestamp, hex_encode(&mac.finalize().into_bytes()));

        assert!(gateway.verify_webhook(&payload, &signature).is_err());
    }

    #[test]
    fn expired_timestamp_is_rejected() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();
        let stale = chrono::Utc::now().timestamp() - MAX_TIMESTAMP_AGE_SECS - 10;
        let signature = create_test_signature(&payload, stale);

        let err = gateway.verify_webhook(&payload, &signature).unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn future_timestamp_beyond_tolerance_is_rejected() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();
        let future = chrono::Utc::now().timestamp() + MAX_FUTURE_TOLERANCE_SECS + 30;
        let signature = create_test_signature(&payload, future);

        assert!(gateway.verify_webhook(&payload, &signature).is_err());
    }

    #[test]
    fn slightly_future_timestamp_is_tolerated() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();
        let near_future = chrono::Utc::now().timestamp() + 30;
        let signature = create_test_signature(&payload, near_future);

        assert!(gateway.verify_webhook(&payload, &signature).is_ok());
    }

    #[test]
    fn garbage_header_is_rejected() {
        let gateway = test_gateway();
        let payload = succeeded_event_payload();

        assert!(gateway.verify_webhook(&payload, "").is_err());
        assert!(gateway.verify_webhook(&payload, "not-a-header").is_err());
    }

    #[test]
    fn failed_event_carries_decline_reason() {
        let gateway = test_gateway();
        let payload = serde_json::json!({
            "id": "evt_test_2",
            "type": "payment_intent.payment_failed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "pi_test_2",
                    "status": "requires_payment_method",
                    "last_payment_error": {
                        "code": "card_declined",
                        "message": "Your card was declined."
                    }
                }
            },
            "livemode": false
        })
        .to_string()
        .into_bytes();
        let signature = create_test_signature(&payload, chrono::Utc::now().timestamp());

        let event = gateway.verify_webhook(&payload, &signature).unwrap();
        assert_eq!(
            event.kind,
            WebhookKind::PaymentFailed {
                reason: "Your card was declined.".to_string()
            }
        );
    }

    #[test]
    fn unhandled_event_type_maps_to_other() {
        let gateway = test_gateway();
        let payload = serde_json::json!({
            "id": "evt_test_3",
            "type": "payment_intent.created",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": { "id": "pi_test_3", "status": "requires_payment_method" }
            },
            "livemode": false
        })
        .to_string()
        .into_bytes();
        let signature = create_test_signature(&payload, chrono::Utc::now().timestamp());

        let event = gateway.verify_webhook(&payload, &signature).unwrap();
        assert_eq!(
            event.kind,
            WebhookKind::Other {
                event_type: "payment_intent.created".to_string()
            }
        );
    }

    #[test]
    fn test_mode_event_rejected_when_livemode_required() {
        let config = StripeGatewayConfig::new("sk_live_123", TEST_SECRET)
            .with_require_livemode(true);
        let gateway = StripeGateway::new(config);
        let payload = succeeded_event_payload();
        let signature = create_test_signature(&payload, chrono::Utc::now().timestamp());

        let err = gateway.verify_webhook(&payload, &signature).unwrap_err();
        assert!(err.message.contains("Test-mode"));
    }

    #[test]
    fn base_url_override() {
        let config = StripeGatewayConfig::new("sk_test_123", TEST_SECRET)
            .with_base_url("http://localhost:12111");
        let gateway = StripeGateway::new(config);
        assert_eq!(
            gateway.url("/v1/payment_intents"),
            "http://localhost:12111/v1/payment_intents"
        );
    }
}
