//! Escrow hold repository port (write side).
//!
//! Hold status moves through compare-and-swap transitions so that exactly one
//! of any set of concurrent releasers claims a hold. The store applies a
//! transition only when the row still carries the expected status.

use async_trait::async_trait;

use crate::domain::billing::{EscrowHold, HoldStatus};
use crate::domain::foundation::{
    ActorId, DomainError, EscrowHoldId, OrderId, PaymentId, SupplierId, TenantId, Timestamp,
};

use super::payment_repository::TransitionOutcome;

/// Outcome of attempting to claim a hold for release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller now owns the release; the hold is `ReleasePending`.
    Claimed,

    /// A dispute block is set on the hold; nothing was changed.
    Blocked,

    /// The hold no longer carries `Held`; reports the status actually found.
    Stale(HoldStatus),
}

/// Repository port for EscrowHold persistence.
#[async_trait]
pub trait EscrowHoldRepository: Send + Sync {
    /// Persist a new hold.
    async fn create(&self, hold: &EscrowHold) -> Result<(), DomainError>;

    /// Find a hold by ID within a tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<Option<EscrowHold>, DomainError>;

    /// Find the hold paired with a payment. At most one exists.
    async fn find_by_payment_id(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<EscrowHold>, DomainError>;

    /// List holds for an order, newest first.
    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<EscrowHold>, DomainError>;

    /// List holds for a supplier, newest first.
    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<EscrowHold>, DomainError>;

    /// List holds eligible for automatic release at `now`:
    /// status == Held, not dispute-blocked, and auto_release_date absent or
    /// past.
    async fn list_due_for_release(
        &self,
        tenant_id: TenantId,
        now: Timestamp,
    ) -> Result<Vec<EscrowHold>, DomainError>;

    /// Tenants that currently have at least one due hold.
    ///
    /// Lets the sweep discover work without configuration listing every
    /// tenant.
    async fn tenants_with_due_holds(&self, now: Timestamp) -> Result<Vec<TenantId>, DomainError>;

    /// Compare-and-swap the hold status.
    ///
    /// Applies `from -> to` only when the row still carries `from`; a stale
    /// result reports the status actually found.
    async fn transition(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        from: HoldStatus,
        to: HoldStatus,
    ) -> Result<TransitionOutcome<HoldStatus>, DomainError>;

    /// Claim a hold for release: `Held -> ReleasePending`, applied only while
    /// `blocked_by_dispute` is clear.
    ///
    /// The dispute check happens inside the same conditional write as the
    /// status swap, so a dispute raised after the caller's precondition read
    /// still refuses the claim.
    async fn claim_for_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<ClaimOutcome, DomainError>;

    /// Record the release audit fields on a hold already claimed by the
    /// caller (status `ReleasePending`), moving it to `Released`.
    async fn record_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        released_at: Timestamp,
        released_by: Option<ActorId>,
        reason: &str,
    ) -> Result<(), DomainError>;

    /// Set or clear the dispute block flag.
    async fn set_dispute_block(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        blocked: bool,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_hold_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn EscrowHoldRepository) {}
    }
}
