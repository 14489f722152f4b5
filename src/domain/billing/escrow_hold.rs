//! EscrowHold entity - funds held against one escrow-mode payment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ActorId, EscrowHoldId, Money, OrderId, PaymentId, SupplierId, TenantId, Timestamp,
};

use super::errors::BillingError;

/// Lifecycle of an escrow hold.
///
/// ```text
/// Pending ──(payment succeeded)──> Held ──(release claimed)──> ReleasePending
///                                    │                              │
///                                    └──> Refunded                  └──(payout confirmed)──> Released
/// ```
///
/// `ReleasePending` marks a hold claimed by exactly one releaser while the
/// payout is in flight; if the payout fails the hold stays there, visible to
/// operators, instead of lying as `Released`. `Released` and `Refunded` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Pending,
    Held,
    ReleasePending,
    Released,
    Refunded,
}

impl HoldStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldStatus::Pending => "pending",
            HoldStatus::Held => "held",
            HoldStatus::ReleasePending => "release_pending",
            HoldStatus::Released => "released",
            HoldStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HoldStatus::Released | HoldStatus::Refunded)
    }
}

impl std::fmt::Display for HoldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Funds withheld from a supplier until a release condition is met.
///
/// Paired 1:1 with an escrow-mode payment; the hold amount always equals the
/// owning payment's amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowHold {
    pub id: EscrowHoldId,
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub money: Money,
    pub status: HoldStatus,

    /// Grace period after which the sweep releases the hold.
    pub auto_release_days: u32,

    /// When the hold becomes eligible for automatic release. `None` means
    /// eligible immediately once held.
    pub auto_release_date: Option<Timestamp>,

    pub released_at: Option<Timestamp>,

    /// `None` when released by the auto-release sweep.
    pub released_by: Option<ActorId>,
    pub release_reason: Option<String>,

    /// Set by the dispute domain; release is illegal while true.
    pub blocked_by_dispute: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EscrowHold {
    /// Creates a pending hold paired with a freshly created escrow payment.
    pub fn new_pending(
        tenant_id: TenantId,
        payment_id: PaymentId,
        order_id: OrderId,
        supplier_id: SupplierId,
        money: Money,
        auto_release_days: u32,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: EscrowHoldId::new(),
            tenant_id,
            payment_id,
            order_id,
            supplier_id,
            money,
            status: HoldStatus::Pending,
            auto_release_days,
            auto_release_date: Some(now.add_days(i64::from(auto_release_days))),
            released_at: None,
            released_by: None,
            release_reason: None,
            blocked_by_dispute: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the release preconditions without mutating anything.
    ///
    /// Dispute blocking and wrong-status each produce a distinct error so
    /// callers can tell "already processed" apart from "blocked".
    pub fn check_releasable(&self) -> Result<(), BillingError> {
        if self.blocked_by_dispute {
            return Err(BillingError::blocked_by_dispute(self.id));
        }
        if self.status != HoldStatus::Held {
            return Err(BillingError::not_releasable(self.id, self.status));
        }
        Ok(())
    }

    /// Whether the auto-release sweep may pick this hold up at `now`.
    pub fn is_due_for_auto_release(&self, now: Timestamp) -> bool {
        self.status == HoldStatus::Held
            && !self.blocked_by_dispute
            && self
                .auto_release_date
                .map(|due| due <= now)
                .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use rust_decimal::Decimal;

    fn test_hold() -> EscrowHold {
        EscrowHold::new_pending(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            SupplierId::new(),
            Money::new(Decimal::new(2500, 0), Currency::usd()).unwrap(),
            30,
        )
    }

    #[test]
    fn new_pending_sets_auto_release_date() {
        let hold = test_hold();
        assert_eq!(hold.status, HoldStatus::Pending);
        let due = hold.auto_release_date.unwrap();
        assert!(due.is_after(&Timestamp::now().add_days(29)));
        assert!(due.is_before(&Timestamp::now().add_days(31)));
    }

    #[test]
    fn pending_hold_is_not_releasable() {
        let hold = test_hold();
        let err = hold.check_releasable().unwrap_err();
        assert!(matches!(err, BillingError::NotReleasable { .. }));
    }

    #[test]
    fn held_hold_is_releasable() {
        let mut hold = test_hold();
        hold.status = HoldStatus::Held;
        assert!(hold.check_releasable().is_ok());
    }

    #[test]
    fn dispute_block_wins_over_status() {
        let mut hold = test_hold();
        hold.status = HoldStatus::Held;
        hold.blocked_by_dispute = true;
        let err = hold.check_releasable().unwrap_err();
        assert!(matches!(err, BillingError::BlockedByDispute(_)));
    }

    #[test]
    fn released_hold_reports_not_releasable_with_current_status() {
        let mut hold = test_hold();
        hold.status = HoldStatus::Released;
        match hold.check_releasable().unwrap_err() {
            BillingError::NotReleasable { current, .. } => {
                assert_eq!(current, HoldStatus::Released)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn due_check_requires_held_undisputed_and_past_date() {
        let mut hold = test_hold();
        hold.status = HoldStatus::Held;
        hold.auto_release_date = Some(Timestamp::now().add_days(-1));
        assert!(hold.is_due_for_auto_release(Timestamp::now()));

        hold.blocked_by_dispute = true;
        assert!(!hold.is_due_for_auto_release(Timestamp::now()));

        hold.blocked_by_dispute = false;
        hold.auto_release_date = Some(Timestamp::now().add_days(5));
        assert!(!hold.is_due_for_auto_release(Timestamp::now()));
    }

    #[test]
    fn hold_without_date_is_due_once_held() {
        let mut hold = test_hold();
        hold.status = HoldStatus::Held;
        hold.auto_release_date = None;
        assert!(hold.is_due_for_auto_release(Timestamp::now()));
    }

    #[test]
    fn terminal_statuses() {
        assert!(HoldStatus::Released.is_terminal());
        assert!(HoldStatus::Refunded.is_terminal());
        assert!(!HoldStatus::Held.is_terminal());
        assert!(!HoldStatus::ReleasePending.is_terminal());
    }
}
