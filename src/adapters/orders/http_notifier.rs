//! HTTP implementation of OrderStatusNotifier.
//!
//! Pushes payment-status changes to the order service's internal API.
//! Failures surface as errors; callers decide whether they are fatal
//! (they are not, in the billing handlers).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, TenantId};
use crate::ports::{OrderPaymentStatus, OrderStatusNotifier};

/// HTTP client for the order service's payment-status endpoint.
pub struct HttpOrderNotifier {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct PaymentStatusBody<'a> {
    status: &'a str,
}

impl HttpOrderNotifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderStatusNotifier for HttpOrderNotifier {
    async fn notify_payment_status(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), DomainError> {
        let url = format!(
            "{}/api/v1/purchase-orders/{}/payment-status",
            self.base_url, order_id
        );

        let response = self
            .client
            .put(&url)
            .header("X-Tenant-Id", tenant_id.to_string())
            .json(&PaymentStatusBody {
                status: status.as_str(),
            })
            .send()
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Order service unreachable: {}", e),
                )
            })?;

        if !response.status().is_success() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!(
                    "Order service rejected status update: HTTP {}",
                    response.status()
                ),
            ));
        }

        tracing::debug!(
            order_id = %order_id,
            status = status.as_str(),
            "Notified order service of payment status"
        );

        Ok(())
    }
}
