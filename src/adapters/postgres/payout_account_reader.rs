//! PostgreSQL implementation of PayoutAccountReader.
//!
//! Read-only; payout accounts are provisioned by the onboarding service and
//! this table is a replicated view of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PayoutAccount, PayoutAccountStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, PayoutAccountId, SupplierId, TenantId, Timestamp,
};
use crate::ports::PayoutAccountReader;

use super::payment_repository::db_err;

/// PostgreSQL implementation of the PayoutAccountReader port.
pub struct PostgresPayoutAccountReader {
    pool: PgPool,
}

impl PostgresPayoutAccountReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payout account.
#[derive(Debug, sqlx::FromRow)]
struct PayoutAccountRow {
    id: Uuid,
    tenant_id: Uuid,
    supplier_id: Uuid,
    provider_account_ref: String,
    status: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PayoutAccountRow> for PayoutAccount {
    type Error = DomainError;

    fn try_from(row: PayoutAccountRow) -> Result<Self, Self::Error> {
        Ok(PayoutAccount {
            id: PayoutAccountId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            supplier_id: SupplierId::from_uuid(row.supplier_id),
            provider_account_ref: row.provider_account_ref,
            status: parse_status(&row.status)?,
            is_default: row.is_default,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<PayoutAccountStatus, DomainError> {
    match s {
        "active" => Ok(PayoutAccountStatus::Active),
        "suspended" => Ok(PayoutAccountStatus::Suspended),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payout account status value: {}", s),
        )),
    }
}

#[async_trait]
impl PayoutAccountReader for PostgresPayoutAccountReader {
    async fn find_default_for_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Option<PayoutAccount>, DomainError> {
        let row: Option<PayoutAccountRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, supplier_id, provider_account_ref, status,
                   is_default, created_at, updated_at
            FROM payout_accounts
            WHERE tenant_id = $1 AND supplier_id = $2
              AND is_default = TRUE AND status = 'active'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(supplier_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find payout account"))?;

        row.map(PayoutAccount::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_status_conversion() {
        for status in [PayoutAccountStatus::Active, PayoutAccountStatus::Suspended] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("closed").is_err());
    }
}
