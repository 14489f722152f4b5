//! Payment entity - one attempt to collect funds for one order.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, OrderId, PaymentId, TenantId, Timestamp};

/// How collected funds are routed.
///
/// Mode is fixed at intent creation and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Funds go straight through to the supplier.
    Direct,

    /// Funds are withheld in an escrow hold until a release condition is met.
    Escrow,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Direct => "DIRECT",
            PaymentMode::Escrow => "ESCROW",
        }
    }
}

/// Lifecycle of a payment attempt.
///
/// `Pending` is the only non-terminal status; webhook reconciliation advances
/// it exactly once. Status never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempt to collect funds for one order.
///
/// Created at intent-creation time with status `Pending`; mutated exactly
/// once by webhook reconciliation; never deleted (corrections are appended
/// as refunds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,

    /// Provider-side intent reference, globally unique.
    pub intent_ref: String,

    /// Name of the provider that issued the intent ("mock", "stripe", ...).
    pub provider: String,

    pub money: Money,
    pub status: PaymentStatus,
    pub mode: PaymentMode,

    /// Provider-specific data echoed back from intent creation.
    pub metadata: serde_json::Value,

    /// Provider-supplied reason, set iff status is `Failed`.
    pub failure_reason: Option<String>,

    /// Set iff status is `Succeeded`.
    pub paid_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a pending payment for a freshly issued provider intent.
    pub fn new_pending(
        tenant_id: TenantId,
        order_id: OrderId,
        intent_ref: impl Into<String>,
        provider: impl Into<String>,
        money: Money,
        mode: PaymentMode,
        metadata: serde_json::Value,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PaymentId::new(),
            tenant_id,
            order_id,
            intent_ref: intent_ref.into(),
            provider: provider.into(),
            money,
            status: PaymentStatus::Pending,
            mode,
            metadata,
            failure_reason: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this payment routes through escrow.
    pub fn is_escrow(&self) -> bool {
        self.mode == PaymentMode::Escrow
    }

    /// Whether a refund may be issued against this payment.
    pub fn is_refundable(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }
}
