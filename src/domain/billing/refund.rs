//! Refund entity - partial or full reversal of a succeeded payment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ActorId, Money, OrderId, PaymentId, RefundId, TenantId, Timestamp,
};

/// Lifecycle of a refund. The terminal status is set synchronously from the
/// gateway result; both outcomes persist a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Completed,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Partial or full reversal of a succeeded payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,

    /// Human-facing number, unique per tenant, time-derived.
    pub refund_number: String,

    pub money: Money,
    pub reason: String,
    pub status: RefundStatus,

    /// Provider-side refund reference, set on completion.
    pub provider_refund_ref: Option<String>,

    /// Provider-supplied reason, set iff status is `Failed`.
    pub failure_reason: Option<String>,

    pub refunded_at: Option<Timestamp>,
    pub created_by: ActorId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Refund {
    /// Builds a completed refund from a confirmed gateway result.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        tenant_id: TenantId,
        payment_id: PaymentId,
        order_id: OrderId,
        money: Money,
        reason: impl Into<String>,
        provider_refund_ref: impl Into<String>,
        created_by: ActorId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: RefundId::new(),
            tenant_id,
            payment_id,
            order_id,
            refund_number: Self::generate_number(now),
            money,
            reason: reason.into(),
            status: RefundStatus::Completed,
            provider_refund_ref: Some(provider_refund_ref.into()),
            failure_reason: None,
            refunded_at: Some(now),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a failed refund from a declined gateway result. The row is
    /// still persisted so the decline is auditable.
    #[allow(clippy::too_many_arguments)]
    pub fn failed(
        tenant_id: TenantId,
        payment_id: PaymentId,
        order_id: OrderId,
        money: Money,
        reason: impl Into<String>,
        failure_reason: impl Into<String>,
        created_by: ActorId,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: RefundId::new(),
            tenant_id,
            payment_id,
            order_id,
            refund_number: Self::generate_number(now),
            money,
            reason: reason.into(),
            status: RefundStatus::Failed,
            provider_refund_ref: None,
            failure_reason: Some(failure_reason.into()),
            refunded_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Tenant-scoped, time-derived refund number. The random suffix keeps
    /// two refunds created in the same second distinct.
    fn generate_number(now: Timestamp) -> String {
        let suffix = &RefundId::new().to_string()[..8];
        format!("REF-{}-{}", now.as_unix_secs(), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use rust_decimal::Decimal;

    fn money(n: i64) -> Money {
        Money::new(Decimal::new(n, 0), Currency::usd()).unwrap()
    }

    #[test]
    fn completed_refund_carries_provider_ref_and_time() {
        let r = Refund::completed(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            money(500),
            "customer request",
            "re_abc123",
            ActorId::new(),
        );
        assert_eq!(r.status, RefundStatus::Completed);
        assert_eq!(r.provider_refund_ref.as_deref(), Some("re_abc123"));
        assert!(r.refunded_at.is_some());
        assert!(r.failure_reason.is_none());
    }

    #[test]
    fn failed_refund_persists_failure_reason() {
        let r = Refund::failed(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            money(500),
            "customer request",
            "refund window closed",
            ActorId::new(),
        );
        assert_eq!(r.status, RefundStatus::Failed);
        assert_eq!(r.failure_reason.as_deref(), Some("refund window closed"));
        assert!(r.refunded_at.is_none());
        assert!(r.provider_refund_ref.is_none());
    }

    #[test]
    fn refund_numbers_are_distinct_and_prefixed() {
        let a = Refund::completed(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            money(1),
            "r",
            "re_1",
            ActorId::new(),
        );
        let b = Refund::completed(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            money(1),
            "r",
            "re_2",
            ActorId::new(),
        );
        assert!(a.refund_number.starts_with("REF-"));
        assert_ne!(a.refund_number, b.refund_number);
    }
}
