//! Settlement entity - record of funds transferred out of escrow.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    EscrowHoldId, Money, PayoutAccountId, SettlementId, SupplierId, TenantId, Timestamp,
};

/// Lifecycle of a settlement.
///
/// `Pending` on creation, `Processing` while the payout call is in flight,
/// then `Completed` or `Failed`. Completed and failed settlements are
/// immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Processing => "processing",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of funds transferred from an escrow hold to a supplier's payout
/// account. Always created before the owning hold is marked released, so a
/// crash mid-release leaves an auditable pending settlement rather than a
/// silently lost transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub tenant_id: TenantId,
    pub escrow_hold_id: EscrowHoldId,
    pub supplier_id: SupplierId,
    pub payout_account_id: PayoutAccountId,

    /// Always equals the source hold's amount; partial settlement is not
    /// modeled.
    pub money: Money,

    pub status: SettlementStatus,

    /// Provider-side payout reference, set on completion.
    pub provider_payout_ref: Option<String>,

    /// Provider-supplied reason, set iff status is `Failed`.
    pub failure_reason: Option<String>,

    pub settled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Settlement {
    /// Creates a pending settlement for the full hold amount.
    pub fn new_pending(
        tenant_id: TenantId,
        escrow_hold_id: EscrowHoldId,
        supplier_id: SupplierId,
        payout_account_id: PayoutAccountId,
        money: Money,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SettlementId::new(),
            tenant_id,
            escrow_hold_id,
            supplier_id,
            payout_account_id,
            money,
            status: SettlementStatus::Pending,
            provider_payout_ref: None,
            failure_reason: None,
            settled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the payout call in flight.
    pub fn mark_processing(&mut self) {
        self.status = SettlementStatus::Processing;
        self.updated_at = Timestamp::now();
    }

    /// Records a confirmed payout.
    pub fn mark_completed(&mut self, provider_payout_ref: impl Into<String>) {
        let now = Timestamp::now();
        self.status = SettlementStatus::Completed;
        self.provider_payout_ref = Some(provider_payout_ref.into());
        self.settled_at = Some(now);
        self.updated_at = now;
    }

    /// Records a failed payout; the settlement stays on the books.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = SettlementStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use rust_decimal::Decimal;

    fn test_settlement() -> Settlement {
        Settlement::new_pending(
            TenantId::new(),
            EscrowHoldId::new(),
            SupplierId::new(),
            PayoutAccountId::new(),
            Money::new(Decimal::new(2500, 0), Currency::usd()).unwrap(),
        )
    }

    #[test]
    fn new_settlement_is_pending() {
        let s = test_settlement();
        assert_eq!(s.status, SettlementStatus::Pending);
        assert!(s.provider_payout_ref.is_none());
        assert!(s.settled_at.is_none());
    }

    #[test]
    fn completion_records_ref_and_time() {
        let mut s = test_settlement();
        s.mark_processing();
        assert_eq!(s.status, SettlementStatus::Processing);

        s.mark_completed("po_abc123");
        assert_eq!(s.status, SettlementStatus::Completed);
        assert_eq!(s.provider_payout_ref.as_deref(), Some("po_abc123"));
        assert!(s.settled_at.is_some());
    }

    #[test]
    fn failure_records_reason_without_settled_at() {
        let mut s = test_settlement();
        s.mark_processing();
        s.mark_failed("destination account closed");
        assert_eq!(s.status, SettlementStatus::Failed);
        assert_eq!(
            s.failure_reason.as_deref(),
            Some("destination account closed")
        );
        assert!(s.settled_at.is_none());
    }
}
