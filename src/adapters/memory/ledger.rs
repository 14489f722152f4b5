//! In-memory ledger implementing every store port.
//!
//! Backs unit tests and local development. State lives in `RwLock`ed vectors;
//! compare-and-swap transitions take the write lock for the whole check-and-set
//! so they are atomic exactly like the conditional UPDATEs in the Postgres
//! adapter.
//!
//! # Panics
//!
//! Lock poisoning panics. Test-only code, same policy as the in-memory event
//! bus.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::billing::{
    EscrowHold, HoldStatus, Payment, PaymentStatus, PayoutAccount, Refund, RefundStatus,
    Settlement,
};
use crate::domain::foundation::{
    ActorId, DomainError, ErrorCode, EscrowHoldId, OrderId, PaymentId, RefundId, SettlementId,
    SupplierId, TenantId, Timestamp,
};
use crate::ports::{
    ClaimOutcome, EscrowHoldRepository, PaymentRepository, PayoutAccountReader, RefundRepository,
    SettlementRepository, TransitionOutcome,
};

/// In-memory ledger implementing all store ports.
#[derive(Default)]
pub struct InMemoryLedger {
    payments: RwLock<Vec<Payment>>,
    holds: RwLock<Vec<EscrowHold>>,
    settlements: RwLock<Vec<Settlement>>,
    refunds: RwLock<Vec<Refund>>,
    payout_accounts: RwLock<Vec<PayoutAccount>>,

    fail_next_payment_create: AtomicBool,
    fail_next_hold_create: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes the next `PaymentRepository::create` fail (saga tests).
    pub fn fail_next_payment_create(&self) {
        self.fail_next_payment_create.store(true, Ordering::SeqCst);
    }

    /// Makes the next `EscrowHoldRepository::create` fail (saga tests).
    pub fn fail_next_hold_create(&self) {
        self.fail_next_hold_create.store(true, Ordering::SeqCst);
    }

    /// Seeds a payout account.
    pub fn insert_payout_account(&self, account: PayoutAccount) {
        self.payout_accounts
            .write()
            .expect("InMemoryLedger: payout_accounts lock poisoned")
            .push(account);
    }

    /// Seeds a payment directly, bypassing create-side checks.
    pub fn insert_payment(&self, payment: Payment) {
        self.payments
            .write()
            .expect("InMemoryLedger: payments lock poisoned")
            .push(payment);
    }

    /// Seeds a hold directly, bypassing create-side checks.
    pub fn insert_hold(&self, hold: EscrowHold) {
        self.holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned")
            .push(hold);
    }

    /// Snapshot of all payments (for test assertions).
    pub fn payments(&self) -> Vec<Payment> {
        self.payments
            .read()
            .expect("InMemoryLedger: payments lock poisoned")
            .clone()
    }

    /// Snapshot of all holds.
    pub fn holds(&self) -> Vec<EscrowHold> {
        self.holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned")
            .clone()
    }

    /// Snapshot of all settlements.
    pub fn settlements(&self) -> Vec<Settlement> {
        self.settlements
            .read()
            .expect("InMemoryLedger: settlements lock poisoned")
            .clone()
    }

    /// Snapshot of all refunds.
    pub fn refunds(&self) -> Vec<Refund> {
        self.refunds
            .read()
            .expect("InMemoryLedger: refunds lock poisoned")
            .clone()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryLedger {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        if self.fail_next_payment_create.swap(false, Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "injected payment create failure",
            ));
        }
        let mut payments = self
            .payments
            .write()
            .expect("InMemoryLedger: payments lock poisoned");
        if payments.iter().any(|p| p.intent_ref == payment.intent_ref) {
            return Err(DomainError::new(
                ErrorCode::DuplicateIntentRef,
                format!("intent reference already stored: {}", payment.intent_ref),
            ));
        }
        payments.push(payment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        let payments = self
            .payments
            .read()
            .expect("InMemoryLedger: payments lock poisoned");
        Ok(payments
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.id == id)
            .cloned())
    }

    async fn find_by_intent_ref(&self, intent_ref: &str) -> Result<Option<Payment>, DomainError> {
        let payments = self
            .payments
            .read()
            .expect("InMemoryLedger: payments lock poisoned");
        Ok(payments.iter().find(|p| p.intent_ref == intent_ref).cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let payments = self
            .payments
            .read()
            .expect("InMemoryLedger: payments lock poisoned");
        let mut matched: Vec<Payment> = payments
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, DomainError> {
        let payments = self
            .payments
            .read()
            .expect("InMemoryLedger: payments lock poisoned");
        let mut matched: Vec<Payment> = payments
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.order_id == order_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn mark_succeeded(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        paid_at: Timestamp,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let mut payments = self
            .payments
            .write()
            .expect("InMemoryLedger: payments lock poisoned");
        let payment = payments
            .iter_mut()
            .find(|p| p.tenant_id == tenant_id && p.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "payment not found"))?;
        if payment.status != PaymentStatus::Pending {
            return Ok(TransitionOutcome::Stale(payment.status));
        }
        payment.status = PaymentStatus::Succeeded;
        payment.paid_at = Some(paid_at);
        payment.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }

    async fn mark_failed(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        reason: &str,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let mut payments = self
            .payments
            .write()
            .expect("InMemoryLedger: payments lock poisoned");
        let payment = payments
            .iter_mut()
            .find(|p| p.tenant_id == tenant_id && p.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "payment not found"))?;
        if payment.status != PaymentStatus::Pending {
            return Ok(TransitionOutcome::Stale(payment.status));
        }
        payment.status = PaymentStatus::Failed;
        payment.failure_reason = Some(reason.to_string());
        payment.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }

    async fn mark_cancelled(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let mut payments = self
            .payments
            .write()
            .expect("InMemoryLedger: payments lock poisoned");
        let payment = payments
            .iter_mut()
            .find(|p| p.tenant_id == tenant_id && p.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "payment not found"))?;
        if payment.status != PaymentStatus::Pending {
            return Ok(TransitionOutcome::Stale(payment.status));
        }
        payment.status = PaymentStatus::Cancelled;
        payment.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }
}

#[async_trait]
impl EscrowHoldRepository for InMemoryLedger {
    async fn create(&self, hold: &EscrowHold) -> Result<(), DomainError> {
        if self.fail_next_hold_create.swap(false, Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "injected hold create failure",
            ));
        }
        self.holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned")
            .push(hold.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<Option<EscrowHold>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        Ok(holds
            .iter()
            .find(|h| h.tenant_id == tenant_id && h.id == id)
            .cloned())
    }

    async fn find_by_payment_id(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<EscrowHold>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        Ok(holds
            .iter()
            .find(|h| h.tenant_id == tenant_id && h.payment_id == payment_id)
            .cloned())
    }

    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        let mut matched: Vec<EscrowHold> = holds
            .iter()
            .filter(|h| h.tenant_id == tenant_id && h.order_id == order_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        let mut matched: Vec<EscrowHold> = holds
            .iter()
            .filter(|h| h.tenant_id == tenant_id && h.supplier_id == supplier_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn list_due_for_release(
        &self,
        tenant_id: TenantId,
        now: Timestamp,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        Ok(holds
            .iter()
            .filter(|h| h.tenant_id == tenant_id && h.is_due_for_auto_release(now))
            .cloned()
            .collect())
    }

    async fn tenants_with_due_holds(&self, now: Timestamp) -> Result<Vec<TenantId>, DomainError> {
        let holds = self
            .holds
            .read()
            .expect("InMemoryLedger: holds lock poisoned");
        let mut tenants: Vec<TenantId> = holds
            .iter()
            .filter(|h| h.is_due_for_auto_release(now))
            .map(|h| h.tenant_id)
            .collect();
        tenants.sort_by_key(|t| *t.as_uuid());
        tenants.dedup();
        Ok(tenants)
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        from: HoldStatus,
        to: HoldStatus,
    ) -> Result<TransitionOutcome<HoldStatus>, DomainError> {
        let mut holds = self
            .holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned");
        let hold = holds
            .iter_mut()
            .find(|h| h.tenant_id == tenant_id && h.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::EscrowHoldNotFound, "escrow hold not found")
            })?;
        if hold.status != from {
            return Ok(TransitionOutcome::Stale(hold.status));
        }
        hold.status = to;
        hold.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }

    async fn claim_for_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<ClaimOutcome, DomainError> {
        let mut holds = self
            .holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned");
        let hold = holds
            .iter_mut()
            .find(|h| h.tenant_id == tenant_id && h.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::EscrowHoldNotFound, "escrow hold not found")
            })?;
        if hold.status != HoldStatus::Held {
            return Ok(ClaimOutcome::Stale(hold.status));
        }
        if hold.blocked_by_dispute {
            return Ok(ClaimOutcome::Blocked);
        }
        hold.status = HoldStatus::ReleasePending;
        hold.updated_at = Timestamp::now();
        Ok(ClaimOutcome::Claimed)
    }

    async fn record_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        released_at: Timestamp,
        released_by: Option<ActorId>,
        reason: &str,
    ) -> Result<(), DomainError> {
        let mut holds = self
            .holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned");
        let hold = holds
            .iter_mut()
            .find(|h| h.tenant_id == tenant_id && h.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::EscrowHoldNotFound, "escrow hold not found")
            })?;
        hold.status = HoldStatus::Released;
        hold.released_at = Some(released_at);
        hold.released_by = released_by;
        hold.release_reason = Some(reason.to_string());
        hold.updated_at = Timestamp::now();
        Ok(())
    }

    async fn set_dispute_block(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        blocked: bool,
    ) -> Result<(), DomainError> {
        let mut holds = self
            .holds
            .write()
            .expect("InMemoryLedger: holds lock poisoned");
        let hold = holds
            .iter_mut()
            .find(|h| h.tenant_id == tenant_id && h.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::EscrowHoldNotFound, "escrow hold not found")
            })?;
        hold.blocked_by_dispute = blocked;
        hold.updated_at = Timestamp::now();
        Ok(())
    }
}

#[async_trait]
impl SettlementRepository for InMemoryLedger {
    async fn create(&self, settlement: &Settlement) -> Result<(), DomainError> {
        self.settlements
            .write()
            .expect("InMemoryLedger: settlements lock poisoned")
            .push(settlement.clone());
        Ok(())
    }

    async fn update(&self, settlement: &Settlement) -> Result<(), DomainError> {
        let mut settlements = self
            .settlements
            .write()
            .expect("InMemoryLedger: settlements lock poisoned");
        let existing = settlements
            .iter_mut()
            .find(|s| s.id == settlement.id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::SettlementNotFound, "settlement not found")
            })?;
        *existing = settlement.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: SettlementId,
    ) -> Result<Option<Settlement>, DomainError> {
        let settlements = self
            .settlements
            .read()
            .expect("InMemoryLedger: settlements lock poisoned");
        Ok(settlements
            .iter()
            .find(|s| s.tenant_id == tenant_id && s.id == id)
            .cloned())
    }

    async fn find_by_hold_id(
        &self,
        tenant_id: TenantId,
        hold_id: EscrowHoldId,
    ) -> Result<Option<Settlement>, DomainError> {
        let settlements = self
            .settlements
            .read()
            .expect("InMemoryLedger: settlements lock poisoned");
        Ok(settlements
            .iter()
            .find(|s| s.tenant_id == tenant_id && s.escrow_hold_id == hold_id)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Settlement>, DomainError> {
        let settlements = self
            .settlements
            .read()
            .expect("InMemoryLedger: settlements lock poisoned");
        let mut matched: Vec<Settlement> = settlements
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<Settlement>, DomainError> {
        let settlements = self
            .settlements
            .read()
            .expect("InMemoryLedger: settlements lock poisoned");
        let mut matched: Vec<Settlement> = settlements
            .iter()
            .filter(|s| s.tenant_id == tenant_id && s.supplier_id == supplier_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}

#[async_trait]
impl RefundRepository for InMemoryLedger {
    async fn create(&self, refund: &Refund) -> Result<(), DomainError> {
        self.refunds
            .write()
            .expect("InMemoryLedger: refunds lock poisoned")
            .push(refund.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: RefundId,
    ) -> Result<Option<Refund>, DomainError> {
        let refunds = self
            .refunds
            .read()
            .expect("InMemoryLedger: refunds lock poisoned");
        Ok(refunds
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.id == id)
            .cloned())
    }

    async fn list_by_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Vec<Refund>, DomainError> {
        let refunds = self
            .refunds
            .read()
            .expect("InMemoryLedger: refunds lock poisoned");
        let mut matched: Vec<Refund> = refunds
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.payment_id == payment_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn completed_total(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Decimal, DomainError> {
        let refunds = self
            .refunds
            .read()
            .expect("InMemoryLedger: refunds lock poisoned");
        Ok(refunds
            .iter()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.payment_id == payment_id
                    && r.status == RefundStatus::Completed
            })
            .map(|r| r.money.amount())
            .sum())
    }
}

#[async_trait]
impl PayoutAccountReader for InMemoryLedger {
    async fn find_default_for_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<PayoutAccount>, DomainError> {
        let accounts = self
            .payout_accounts
            .read()
            .expect("InMemoryLedger: payout_accounts lock poisoned");
        Ok(accounts
            .iter()
            .find(|a| {
                a.tenant_id == tenant_id
                    && a.supplier_id == supplier_id
                    && a.is_default
                    && a.is_active()
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PaymentMode;
    use crate::domain::foundation::{Currency, Money};

    fn money(n: i64) -> Money {
        Money::new(Decimal::new(n, 0), Currency::usd()).unwrap()
    }

    fn pending_payment(tenant_id: TenantId) -> Payment {
        Payment::new_pending(
            tenant_id,
            OrderId::new(),
            format!("pi_mock_{}", PaymentId::new()),
            "mock",
            money(2500),
            PaymentMode::Escrow,
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn payment_cas_applies_once() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let payment = pending_payment(tenant);
        PaymentRepository::create(&ledger, &payment).await.unwrap();

        let first = ledger
            .mark_succeeded(tenant, payment.id, Timestamp::now())
            .await
            .unwrap();
        assert!(first.is_applied());

        let second = ledger
            .mark_succeeded(tenant, payment.id, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(second, TransitionOutcome::Stale(PaymentStatus::Succeeded));
    }

    #[tokio::test]
    async fn duplicate_intent_ref_is_rejected() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let payment = pending_payment(tenant);
        PaymentRepository::create(&ledger, &payment).await.unwrap();

        let mut duplicate = pending_payment(tenant);
        duplicate.intent_ref = payment.intent_ref.clone();
        let err = PaymentRepository::create(&ledger, &duplicate)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateIntentRef);
    }

    #[tokio::test]
    async fn payments_are_tenant_scoped() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let payment = pending_payment(tenant);
        PaymentRepository::create(&ledger, &payment).await.unwrap();

        let found = PaymentRepository::find_by_id(&ledger, TenantId::new(), payment.id)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn hold_transition_reports_stale_status() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let mut hold = EscrowHold::new_pending(
            tenant,
            PaymentId::new(),
            OrderId::new(),
            SupplierId::new(),
            money(2500),
            30,
        );
        hold.status = HoldStatus::Held;
        ledger.insert_hold(hold.clone());

        let won = ledger
            .transition(tenant, hold.id, HoldStatus::Held, HoldStatus::ReleasePending)
            .await
            .unwrap();
        assert!(won.is_applied());

        let lost = ledger
            .transition(tenant, hold.id, HoldStatus::Held, HoldStatus::ReleasePending)
            .await
            .unwrap();
        assert_eq!(lost, TransitionOutcome::Stale(HoldStatus::ReleasePending));
    }

    #[tokio::test]
    async fn claim_refuses_a_dispute_blocked_hold() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let mut hold = EscrowHold::new_pending(
            tenant,
            PaymentId::new(),
            OrderId::new(),
            SupplierId::new(),
            money(2500),
            30,
        );
        hold.status = HoldStatus::Held;
        hold.blocked_by_dispute = true;
        ledger.insert_hold(hold.clone());

        let outcome = ledger.claim_for_release(tenant, hold.id).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Blocked);

        // Untouched: still Held, still blocked.
        let stored = ledger.holds().into_iter().find(|h| h.id == hold.id).unwrap();
        assert_eq!(stored.status, HoldStatus::Held);

        ledger.set_dispute_block(tenant, hold.id, false).await.unwrap();
        let outcome = ledger.claim_for_release(tenant, hold.id).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);

        let outcome = ledger.claim_for_release(tenant, hold.id).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Stale(HoldStatus::ReleasePending));
    }

    #[tokio::test]
    async fn due_holds_surface_their_tenants() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let mut hold = EscrowHold::new_pending(
            tenant,
            PaymentId::new(),
            OrderId::new(),
            SupplierId::new(),
            money(100),
            30,
        );
        hold.status = HoldStatus::Held;
        hold.auto_release_date = Some(Timestamp::now().add_days(-1));
        ledger.insert_hold(hold);

        let tenants = ledger.tenants_with_due_holds(Timestamp::now()).await.unwrap();
        assert_eq!(tenants, vec![tenant]);

        let due = ledger
            .list_due_for_release(tenant, Timestamp::now())
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn completed_total_ignores_failed_refunds() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let payment_id = PaymentId::new();
        let order_id = OrderId::new();

        let completed = Refund::completed(
            tenant,
            payment_id,
            order_id,
            money(300),
            "r",
            "re_1",
            ActorId::new(),
        );
        let failed = Refund::failed(
            tenant,
            payment_id,
            order_id,
            money(900),
            "r",
            "declined",
            ActorId::new(),
        );
        RefundRepository::create(&ledger, &completed).await.unwrap();
        RefundRepository::create(&ledger, &failed).await.unwrap();

        let total = ledger.completed_total(tenant, payment_id).await.unwrap();
        assert_eq!(total, Decimal::new(300, 0));
    }
}
