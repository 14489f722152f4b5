//! PostgreSQL implementation of SettlementRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Settlement, SettlementStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, EscrowHoldId, PayoutAccountId, SettlementId, SupplierId, TenantId,
    Timestamp,
};
use crate::ports::SettlementRepository;

use super::payment_repository::{db_err, parse_money};

/// PostgreSQL implementation of the SettlementRepository port.
pub struct PostgresSettlementRepository {
    pool: PgPool,
}

impl PostgresSettlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a settlement.
#[derive(Debug, sqlx::FromRow)]
struct SettlementRow {
    id: Uuid,
    tenant_id: Uuid,
    escrow_hold_id: Uuid,
    supplier_id: Uuid,
    payout_account_id: Uuid,
    amount: Decimal,
    currency: String,
    status: String,
    provider_payout_ref: Option<String>,
    failure_reason: Option<String>,
    settled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettlementRow> for Settlement {
    type Error = DomainError;

    fn try_from(row: SettlementRow) -> Result<Self, Self::Error> {
        Ok(Settlement {
            id: SettlementId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            escrow_hold_id: EscrowHoldId::from_uuid(row.escrow_hold_id),
            supplier_id: SupplierId::from_uuid(row.supplier_id),
            payout_account_id: PayoutAccountId::from_uuid(row.payout_account_id),
            money: parse_money(row.amount, &row.currency)?,
            status: parse_status(&row.status)?,
            provider_payout_ref: row.provider_payout_ref,
            failure_reason: row.failure_reason,
            settled_at: row.settled_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SettlementStatus, DomainError> {
    match s {
        "pending" => Ok(SettlementStatus::Pending),
        "processing" => Ok(SettlementStatus::Processing),
        "completed" => Ok(SettlementStatus::Completed),
        "failed" => Ok(SettlementStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid settlement status value: {}", s),
        )),
    }
}

const SETTLEMENT_COLUMNS: &str = "id, tenant_id, escrow_hold_id, supplier_id, payout_account_id, \
     amount, currency, status, provider_payout_ref, failure_reason, settled_at, created_at, \
     updated_at";

#[async_trait]
impl SettlementRepository for PostgresSettlementRepository {
    async fn create(&self, settlement: &Settlement) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO settlements (
                id, tenant_id, escrow_hold_id, supplier_id, payout_account_id,
                amount, currency, status, provider_payout_ref, failure_reason,
                settled_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(settlement.id.as_uuid())
        .bind(settlement.tenant_id.as_uuid())
        .bind(settlement.escrow_hold_id.as_uuid())
        .bind(settlement.supplier_id.as_uuid())
        .bind(settlement.payout_account_id.as_uuid())
        .bind(settlement.money.amount())
        .bind(settlement.money.currency().as_str())
        .bind(settlement.status.as_str())
        .bind(&settlement.provider_payout_ref)
        .bind(&settlement.failure_reason)
        .bind(settlement.settled_at.as_ref().map(|t| *t.as_datetime()))
        .bind(settlement.created_at.as_datetime())
        .bind(settlement.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to save settlement"))?;

        Ok(())
    }

    async fn update(&self, settlement: &Settlement) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE settlements
            SET status = $3, provider_payout_ref = $4, failure_reason = $5,
                settled_at = $6, updated_at = $7
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(settlement.tenant_id.as_uuid())
        .bind(settlement.id.as_uuid())
        .bind(settlement.status.as_str())
        .bind(&settlement.provider_payout_ref)
        .bind(&settlement.failure_reason)
        .bind(settlement.settled_at.as_ref().map(|t| *t.as_datetime()))
        .bind(settlement.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to update settlement"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SettlementNotFound,
                "Settlement not found",
            ));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: SettlementId,
    ) -> Result<Option<Settlement>, DomainError> {
        let row: Option<SettlementRow> = sqlx::query_as(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find settlement"))?;

        row.map(Settlement::try_from).transpose()
    }

    async fn find_by_hold_id(
        &self,
        tenant_id: TenantId,
        hold_id: EscrowHoldId,
    ) -> Result<Option<Settlement>, DomainError> {
        let row: Option<SettlementRow> = sqlx::query_as(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements \
             WHERE tenant_id = $1 AND escrow_hold_id = $2 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(tenant_id.as_uuid())
        .bind(hold_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find settlement"))?;

        row.map(Settlement::try_from).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Settlement>, DomainError> {
        let rows: Vec<SettlementRow> = sqlx::query_as(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE tenant_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id.as_uuid())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list settlements"))?;

        rows.into_iter().map(Settlement::try_from).collect()
    }

    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<Settlement>, DomainError> {
        let rows: Vec<SettlementRow> = sqlx::query_as(&format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements \
             WHERE tenant_id = $1 AND supplier_id = $2 ORDER BY created_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(supplier_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list settlements"))?;

        rows.into_iter().map(Settlement::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            SettlementStatus::Pending,
            SettlementStatus::Processing,
            SettlementStatus::Completed,
            SettlementStatus::Failed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("done").is_err());
        assert!(parse_status("").is_err());
    }
}
