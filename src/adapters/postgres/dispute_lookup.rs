//! PostgreSQL implementation of DisputeLookup.
//!
//! Reads the `order_disputes` table, a replicated view maintained by the
//! dispute domain. A row with status 'open' blocks release.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, OrderId, TenantId};
use crate::ports::DisputeLookup;

use super::payment_repository::db_err;

/// PostgreSQL implementation of the DisputeLookup port.
pub struct PostgresDisputeLookup {
    pool: PgPool,
}

impl PostgresDisputeLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DisputeLookup for PostgresDisputeLookup {
    async fn has_open_dispute(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM order_disputes
                WHERE tenant_id = $1 AND order_id = $2 AND status = 'open'
            )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to check dispute status"))?;

        Ok(exists)
    }
}
