//! Read-side queries over the billing stores.
//!
//! Thin pass-throughs: tenant scoping and pagination defaults live here so
//! the HTTP layer stays free of store details.

use std::sync::Arc;

use crate::domain::billing::{BillingError, EscrowHold, Payment, Refund, Settlement};
use crate::domain::foundation::{
    EscrowHoldId, OrderId, PaymentId, SettlementId, SupplierId, TenantId,
};
use crate::ports::{
    EscrowHoldRepository, PaymentRepository, RefundRepository, SettlementRepository,
};

const DEFAULT_PAGE_SIZE: u32 = 50;

/// Pagination window for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: offset.unwrap_or(0),
        }
    }
}

/// Read-side facade over the billing stores.
pub struct BillingQueries {
    payments: Arc<dyn PaymentRepository>,
    holds: Arc<dyn EscrowHoldRepository>,
    settlements: Arc<dyn SettlementRepository>,
    refunds: Arc<dyn RefundRepository>,
}

impl BillingQueries {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        holds: Arc<dyn EscrowHoldRepository>,
        settlements: Arc<dyn SettlementRepository>,
        refunds: Arc<dyn RefundRepository>,
    ) -> Self {
        Self {
            payments,
            holds,
            settlements,
            refunds,
        }
    }

    pub async fn get_payment(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Payment, BillingError> {
        self.payments
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| BillingError::payment_not_found(id))
    }

    pub async fn list_payments(
        &self,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<Payment>, BillingError> {
        Ok(self.payments.list(tenant_id, page.limit, page.offset).await?)
    }

    pub async fn list_payments_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, BillingError> {
        Ok(self.payments.list_by_order(tenant_id, order_id).await?)
    }

    pub async fn get_hold(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<EscrowHold, BillingError> {
        self.holds
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| BillingError::hold_not_found(id))
    }

    pub async fn list_holds_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<EscrowHold>, BillingError> {
        Ok(self.holds.list_by_supplier(tenant_id, supplier_id).await?)
    }

    pub async fn get_settlement(
        &self,
        tenant_id: TenantId,
        id: SettlementId,
    ) -> Result<Settlement, BillingError> {
        self.settlements
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| BillingError::settlement_not_found(id))
    }

    pub async fn list_settlements(
        &self,
        tenant_id: TenantId,
        page: Page,
    ) -> Result<Vec<Settlement>, BillingError> {
        Ok(self
            .settlements
            .list(tenant_id, page.limit, page.offset)
            .await?)
    }

    pub async fn list_refunds_by_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Vec<Refund>, BillingError> {
        Ok(self.refunds.list_by_payment(tenant_id, payment_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::domain::billing::{Payment, PaymentMode};
    use crate::domain::foundation::{Currency, Money};
    use rust_decimal::Decimal;

    fn queries(ledger: Arc<InMemoryLedger>) -> BillingQueries {
        BillingQueries::new(ledger.clone(), ledger.clone(), ledger.clone(), ledger)
    }

    fn seed_payment(ledger: &InMemoryLedger, tenant: TenantId) -> Payment {
        let payment = Payment::new_pending(
            tenant,
            OrderId::new(),
            format!("pi_mock_{}", PaymentId::new()),
            "mock",
            Money::new(Decimal::new(100, 0), Currency::usd()).unwrap(),
            PaymentMode::Direct,
            serde_json::json!({}),
        );
        ledger.insert_payment(payment.clone());
        payment
    }

    #[tokio::test]
    async fn get_payment_is_tenant_scoped() {
        let ledger = Arc::new(InMemoryLedger::new());
        let q = queries(ledger.clone());
        let payment = seed_payment(&ledger, TenantId::new());

        let found = q.get_payment(payment.tenant_id, payment.id).await.unwrap();
        assert_eq!(found.id, payment.id);

        let err = q.get_payment(TenantId::new(), payment.id).await.unwrap_err();
        assert!(matches!(err, BillingError::PaymentNotFound(_)));
    }

    #[tokio::test]
    async fn list_payments_paginates() {
        let ledger = Arc::new(InMemoryLedger::new());
        let q = queries(ledger.clone());
        let tenant = TenantId::new();
        for _ in 0..3 {
            seed_payment(&ledger, tenant);
        }

        let all = q.list_payments(tenant, Page::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let window = q
            .list_payments(tenant, Page::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn page_defaults() {
        let page = Page::new(None, None);
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 0);
    }
}
