//! Payment repository port (write side).
//!
//! All lookups are tenant-scoped; a payment created under one tenant is
//! invisible to every other tenant. Status transitions are compare-and-swap:
//! the store applies them only if the row is still `Pending`, and reports the
//! current status otherwise so callers can tell a benign duplicate from a
//! real conflict.

use async_trait::async_trait;

use crate::domain::billing::{Payment, PaymentStatus};
use crate::domain::foundation::{DomainError, OrderId, PaymentId, TenantId, Timestamp};

/// Result of a compare-and-swap transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome<S> {
    /// This caller won the transition.
    Applied,

    /// Another writer got there first; carries the status found.
    Stale(S),
}

impl<S> TransitionOutcome<S> {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied)
    }
}

/// Repository port for Payment persistence.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persist a new payment.
    ///
    /// # Errors
    ///
    /// - `DuplicateIntentRef` if the intent reference is already stored
    /// - `DatabaseError` on persistence failure
    async fn create(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Find a payment by ID within a tenant.
    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, DomainError>;

    /// Find a payment by its provider intent reference.
    ///
    /// Intent references are globally unique, so this lookup is not
    /// tenant-scoped; webhooks carry no tenant context.
    async fn find_by_intent_ref(&self, intent_ref: &str) -> Result<Option<Payment>, DomainError>;

    /// List a tenant's payments, newest first, with pagination.
    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Payment>, DomainError>;

    /// List payments for an order, newest first.
    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, DomainError>;

    /// Move a pending payment to `Succeeded`, recording `paid_at`.
    ///
    /// Compare-and-swap: applies only if the row is still `Pending`.
    async fn mark_succeeded(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        paid_at: Timestamp,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError>;

    /// Move a pending payment to `Failed`, recording the provider reason.
    async fn mark_failed(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        reason: &str,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError>;

    /// Move a pending payment to `Cancelled`.
    ///
    /// Used by saga compensation after a failed hold persist.
    async fn mark_cancelled(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError>;
}
