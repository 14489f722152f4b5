//! Settlement repository port (write side).

use async_trait::async_trait;

use crate::domain::billing::Settlement;
use crate::domain::foundation::{DomainError, EscrowHoldId, SettlementId, SupplierId, TenantId};

/// Repository port for Settlement persistence.
#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Persist a new settlement.
    async fn create(&self, settlement: &Settlement) -> Result<(), DomainError>;

    /// Overwrite an existing settlement (status and provider fields).
    async fn update(&self, settlement: &Settlement) -> Result<(), DomainError>;

    /// Find a settlement by ID within a tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: SettlementId,
    ) -> Result<Option<Settlement>, DomainError>;

    /// Find the settlement created for a hold, if any.
    async fn find_by_hold_id(
        &self,
        tenant_id: TenantId,
        hold_id: EscrowHoldId,
    ) -> Result<Option<Settlement>, DomainError>;

    /// List a tenant's settlements, newest first, with pagination.
    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Settlement>, DomainError>;

    /// List settlements for a supplier, newest first.
    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<Settlement>, DomainError>;
}
