//! PostgreSQL implementation of RefundRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Refund, RefundStatus};
use crate::domain::foundation::{
    ActorId, DomainError, ErrorCode, OrderId, PaymentId, RefundId, TenantId, Timestamp,
};
use crate::ports::RefundRepository;

use super::payment_repository::{db_err, parse_money};

/// PostgreSQL implementation of the RefundRepository port.
pub struct PostgresRefundRepository {
    pool: PgPool,
}

impl PostgresRefundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a refund.
#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: Uuid,
    tenant_id: Uuid,
    payment_id: Uuid,
    order_id: Uuid,
    refund_number: String,
    amount: Decimal,
    currency: String,
    reason: String,
    status: String,
    provider_refund_ref: Option<String>,
    failure_reason: Option<String>,
    refunded_at: Option<DateTime<Utc>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RefundRow> for Refund {
    type Error = DomainError;

    fn try_from(row: RefundRow) -> Result<Self, Self::Error> {
        Ok(Refund {
            id: RefundId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            payment_id: PaymentId::from_uuid(row.payment_id),
            order_id: OrderId::from_uuid(row.order_id),
            refund_number: row.refund_number,
            money: parse_money(row.amount, &row.currency)?,
            reason: row.reason,
            status: parse_status(&row.status)?,
            provider_refund_ref: row.provider_refund_ref,
            failure_reason: row.failure_reason,
            refunded_at: row.refunded_at.map(Timestamp::from_datetime),
            created_by: ActorId::from_uuid(row.created_by),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<RefundStatus, DomainError> {
    match s {
        "pending" => Ok(RefundStatus::Pending),
        "completed" => Ok(RefundStatus::Completed),
        "failed" => Ok(RefundStatus::Failed),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid refund status value: {}", s),
        )),
    }
}

const REFUND_COLUMNS: &str = "id, tenant_id, payment_id, order_id, refund_number, amount, \
     currency, reason, status, provider_refund_ref, failure_reason, refunded_at, created_by, \
     created_at, updated_at";

#[async_trait]
impl RefundRepository for PostgresRefundRepository {
    async fn create(&self, refund: &Refund) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, tenant_id, payment_id, order_id, refund_number, amount, currency,
                reason, status, provider_refund_ref, failure_reason, refunded_at,
                created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(refund.id.as_uuid())
        .bind(refund.tenant_id.as_uuid())
        .bind(refund.payment_id.as_uuid())
        .bind(refund.order_id.as_uuid())
        .bind(&refund.refund_number)
        .bind(refund.money.amount())
        .bind(refund.money.currency().as_str())
        .bind(&refund.reason)
        .bind(refund.status.as_str())
        .bind(&refund.provider_refund_ref)
        .bind(&refund.failure_reason)
        .bind(refund.refunded_at.as_ref().map(|t| *t.as_datetime()))
        .bind(refund.created_by.as_uuid())
        .bind(refund.created_at.as_datetime())
        .bind(refund.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to save refund"))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: RefundId,
    ) -> Result<Option<Refund>, DomainError> {
        let row: Option<RefundRow> = sqlx::query_as(&format!(
            "SELECT {REFUND_COLUMNS} FROM refunds WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find refund"))?;

        row.map(Refund::try_from).transpose()
    }

    async fn list_by_payment(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Vec<Refund>, DomainError> {
        let rows: Vec<RefundRow> = sqlx::query_as(&format!(
            "SELECT {REFUND_COLUMNS} FROM refunds WHERE tenant_id = $1 AND payment_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(payment_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list refunds"))?;

        rows.into_iter().map(Refund::try_from).collect()
    }

    async fn completed_total(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Decimal, DomainError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount) FROM refunds
            WHERE tenant_id = $1 AND payment_id = $2 AND status = 'completed'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(payment_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to sum refunds"))?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            RefundStatus::Pending,
            RefundStatus::Completed,
            RefundStatus::Failed,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("declined").is_err());
        assert!(parse_status("").is_err());
    }
}
