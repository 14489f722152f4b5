//! In-memory collaborator stubs for tests and local development.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, TenantId};
use crate::ports::{DisputeLookup, OrderPaymentStatus, OrderStatusNotifier};

/// Order notifier that records every notification.
#[derive(Default)]
pub struct RecordingOrderNotifier {
    notifications: RwLock<Vec<(TenantId, OrderId, OrderPaymentStatus)>>,
    fail: RwLock<bool>,
}

impl RecordingOrderNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every notification fail (best-effort path tests).
    pub fn set_failing(&self, fail: bool) {
        *self
            .fail
            .write()
            .expect("RecordingOrderNotifier: fail lock poisoned") = fail;
    }

    pub fn notifications(&self) -> Vec<(TenantId, OrderId, OrderPaymentStatus)> {
        self.notifications
            .read()
            .expect("RecordingOrderNotifier: notifications lock poisoned")
            .clone()
    }
}

#[async_trait]
impl OrderStatusNotifier for RecordingOrderNotifier {
    async fn notify_payment_status(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), DomainError> {
        if *self
            .fail
            .read()
            .expect("RecordingOrderNotifier: fail lock poisoned")
        {
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                "injected notifier failure",
            ));
        }
        self.notifications
            .write()
            .expect("RecordingOrderNotifier: notifications lock poisoned")
            .push((tenant_id, order_id, status));
        Ok(())
    }
}

/// Dispute lookup backed by an explicit set of disputed orders.
#[derive(Default)]
pub struct StaticDisputeLookup {
    disputed: RwLock<HashSet<(TenantId, OrderId)>>,
}

impl StaticDisputeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_dispute(&self, tenant_id: TenantId, order_id: OrderId) {
        self.disputed
            .write()
            .expect("StaticDisputeLookup: disputed lock poisoned")
            .insert((tenant_id, order_id));
    }

    pub fn close_dispute(&self, tenant_id: TenantId, order_id: OrderId) {
        self.disputed
            .write()
            .expect("StaticDisputeLookup: disputed lock poisoned")
            .remove(&(tenant_id, order_id));
    }
}

#[async_trait]
impl DisputeLookup for StaticDisputeLookup {
    async fn has_open_dispute(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .disputed
            .read()
            .expect("StaticDisputeLookup: disputed lock poisoned")
            .contains(&(tenant_id, order_id)))
    }
}
