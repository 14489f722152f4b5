//! Refund repository port (write side).

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::billing::Refund;
use crate::domain::foundation::{DomainError, PaymentId, RefundId, TenantId};

/// Repository port for Refund persistence.
#[async_trait]
pub trait RefundRepository: Send + Sync {
    /// Persist a new refund (completed or failed).
    async fn create(&self, refund: &Refund) -> Result<(), DomainError>;

    /// Find a refund by ID within a tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: RefundId,
    ) -> Result<Option<Refund>, DomainError>;

    /// List refunds against a payment, newest first.
    async fn list_by_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Vec<Refund>, DomainError>;

    /// Sum of completed refund amounts against a payment.
    ///
    /// Failed refunds never count toward the total.
    async fn completed_total(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Decimal, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn RefundRepository) {}
    }
}
