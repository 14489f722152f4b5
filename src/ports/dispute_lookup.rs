//! Dispute lookup port.
//!
//! The dispute domain pushes block/unblock updates in, but the auto-release
//! sweep re-checks just before releasing so a dispute opened between sweeps
//! still blocks the payout.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId, TenantId};

/// Read-side port into the dispute domain.
#[async_trait]
pub trait DisputeLookup: Send + Sync {
    /// Whether the order currently has an open dispute.
    async fn has_open_dispute(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispute_lookup_is_object_safe() {
        fn _accepts_dyn(_lookup: &dyn DisputeLookup) {}
    }
}
