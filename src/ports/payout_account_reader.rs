//! Payout account reader port.
//!
//! Accounts are provisioned by the onboarding flow; the engine only needs to
//! resolve where settled funds go.

use async_trait::async_trait;

use crate::domain::billing::PayoutAccount;
use crate::domain::foundation::{DomainError, SupplierId, TenantId};

/// Read-side port for supplier payout accounts.
#[async_trait]
pub trait PayoutAccountReader: Send + Sync {
    /// Find the supplier's default active payout account.
    ///
    /// Returns `None` when the supplier has no usable default; release
    /// handlers turn that into `NoDefaultPayoutAccount`.
    async fn find_default_for_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<PayoutAccount>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_account_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn PayoutAccountReader) {}
    }
}
