//! Mock payment gateway for tests and local development.
//!
//! Issues `pi_mock_` intents, `txn_` payouts, and `re_` refunds without
//! touching any external service. Failure modes are injectable so handler
//! tests can drive the unhappy paths.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::ports::{
    CreateIntentRequest, GatewayError, GatewayIntent, GatewayWebhookEvent, PaymentGateway,
    PayoutOutcome, PayoutRequest, RefundOutcome, RefundRequest,
};

/// Signature the mock accepts on webhooks.
pub const MOCK_SIGNATURE: &str = "mock-signature";

/// Mock gateway. Every call succeeds unless told otherwise.
#[derive(Default)]
pub struct MockGateway {
    cancelled_intents: RwLock<Vec<String>>,
    payout_requests: RwLock<Vec<PayoutRequest>>,
    refund_requests: RwLock<Vec<RefundRequest>>,

    fail_payouts: AtomicBool,
    decline_refunds: AtomicBool,
    fail_refund_transport: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // === Failure Injection ===

    /// Makes every payout call fail.
    pub fn set_fail_payouts(&self, fail: bool) {
        self.fail_payouts.store(fail, Ordering::SeqCst);
    }

    /// Makes every refund come back declined (call succeeds, refund does not).
    pub fn set_decline_refunds(&self, decline: bool) {
        self.decline_refunds.store(decline, Ordering::SeqCst);
    }

    /// Makes every refund call fail at the transport level.
    pub fn set_fail_refund_transport(&self, fail: bool) {
        self.fail_refund_transport.store(fail, Ordering::SeqCst);
    }

    // === Test Observability ===

    /// Intent refs passed to `cancel_intent` (saga compensation checks).
    pub fn cancelled_intents(&self) -> Vec<String> {
        self.cancelled_intents
            .read()
            .expect("MockGateway: cancelled_intents lock poisoned")
            .clone()
    }

    /// Payout requests received.
    pub fn payout_requests(&self) -> Vec<PayoutRequest> {
        self.payout_requests
            .read()
            .expect("MockGateway: payout_requests lock poisoned")
            .clone()
    }

    /// Refund requests received.
    pub fn refund_requests(&self) -> Vec<RefundRequest> {
        self.refund_requests
            .read()
            .expect("MockGateway: refund_requests lock poisoned")
            .clone()
    }

    /// Builds a webhook payload the mock's `verify_webhook` accepts.
    pub fn webhook_payload(event: &GatewayWebhookEvent) -> Vec<u8> {
        serde_json::to_vec(event).expect("webhook event serialization")
    }

    fn short_ref() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<GatewayIntent, GatewayError> {
        let suffix = Self::short_ref();
        Ok(GatewayIntent {
            intent_ref: format!("pi_mock_{}", suffix),
            client_secret: format!("pi_mock_{}_secret_{}", suffix, Self::short_ref()),
            metadata: serde_json::json!({
                "provider": "mock",
                "order_id": request.order_id.to_string(),
            }),
        })
    }

    async fn cancel_intent(&self, intent_ref: &str) -> Result<(), GatewayError> {
        self.cancelled_intents
            .write()
            .expect("MockGateway: cancelled_intents lock poisoned")
            .push(intent_ref.to_string());
        Ok(())
    }

    async fn payout(&self, request: PayoutRequest) -> Result<PayoutOutcome, GatewayError> {
        self.payout_requests
            .write()
            .expect("MockGateway: payout_requests lock poisoned")
            .push(request);
        if self.fail_payouts.load(Ordering::SeqCst) {
            return Err(GatewayError::provider("injected payout failure"));
        }
        Ok(PayoutOutcome {
            payout_ref: format!("txn_{}", Self::short_ref()),
        })
    }

    async fn refund(&self, request: RefundRequest) -> Result<RefundOutcome, GatewayError> {
        if self.fail_refund_transport.load(Ordering::SeqCst) {
            return Err(GatewayError::network("injected refund transport failure"));
        }
        self.refund_requests
            .write()
            .expect("MockGateway: refund_requests lock poisoned")
            .push(request);
        if self.decline_refunds.load(Ordering::SeqCst) {
            return Ok(RefundOutcome {
                success: false,
                refund_ref: None,
                failure_reason: Some("refund window closed".to_string()),
            });
        }
        Ok(RefundOutcome {
            success: true,
            refund_ref: Some(format!("re_{}", Self::short_ref())),
            failure_reason: None,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayWebhookEvent, GatewayError> {
        if signature != MOCK_SIGNATURE {
            return Err(GatewayError::invalid_webhook("invalid mock signature"));
        }
        serde_json::from_slice(payload)
            .map_err(|e| GatewayError::invalid_webhook(format!("invalid payload: {}", e)))
    }
}
