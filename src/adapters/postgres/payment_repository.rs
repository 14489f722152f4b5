//! PostgreSQL implementation of PaymentRepository.
//!
//! Status transitions are conditional UPDATEs: the expected current status
//! is part of the WHERE clause, so concurrent writers race on the database
//! row instead of on application state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Payment, PaymentMode, PaymentStatus};
use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, OrderId, PaymentId, TenantId, Timestamp,
};
use crate::ports::{PaymentRepository, TransitionOutcome};

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<PaymentStatus, DomainError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM payments WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id.as_uuid())
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("Failed to read payment status"))?;
        match status {
            Some(s) => parse_status(&s),
            None => Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                "Payment not found",
            )),
        }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    tenant_id: Uuid,
    order_id: Uuid,
    intent_ref: String,
    provider: String,
    amount: Decimal,
    currency: String,
    status: String,
    mode: String,
    metadata: serde_json::Value,
    failure_reason: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            order_id: OrderId::from_uuid(row.order_id),
            intent_ref: row.intent_ref,
            provider: row.provider,
            money: parse_money(row.amount, &row.currency)?,
            status: parse_status(&row.status)?,
            mode: parse_mode(&row.mode)?,
            metadata: row.metadata,
            failure_reason: row.failure_reason,
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

pub(super) fn parse_money(amount: Decimal, currency: &str) -> Result<Money, DomainError> {
    let currency = Currency::new(currency)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid currency: {}", e)))?;
    Money::new(amount, currency)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid amount: {}", e)))
}

pub(super) fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "succeeded" => Ok(PaymentStatus::Succeeded),
        "failed" => Ok(PaymentStatus::Failed),
        "cancelled" => Ok(PaymentStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

fn parse_mode(s: &str) -> Result<PaymentMode, DomainError> {
    match s {
        "DIRECT" => Ok(PaymentMode::Direct),
        "ESCROW" => Ok(PaymentMode::Escrow),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment mode value: {}", s),
        )),
    }
}

const PAYMENT_COLUMNS: &str = "id, tenant_id, order_id, intent_ref, provider, amount, currency, \
     status, mode, metadata, failure_reason, paid_at, created_at, updated_at";

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, tenant_id, order_id, intent_ref, provider, amount, currency,
                status, mode, metadata, failure_reason, paid_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.tenant_id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(&payment.intent_ref)
        .bind(&payment.provider)
        .bind(payment.money.amount())
        .bind(payment.money.currency().as_str())
        .bind(payment.status.as_str())
        .bind(payment.mode.as_str())
        .bind(&payment.metadata)
        .bind(&payment.failure_reason)
        .bind(payment.paid_at.as_ref().map(|t| *t.as_datetime()))
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_intent_ref_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateIntentRef,
                        format!("Intent reference already stored: {}", payment.intent_ref),
                    );
                }
            }
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save payment: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_intent_ref(&self, intent_ref: &str) -> Result<Option<Payment>, DomainError> {
        // Deliberately not tenant-scoped: webhooks carry no tenant header and
        // intent_ref is globally unique.
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE intent_ref = $1"
        ))
        .bind(intent_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id.as_uuid())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list payments"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE tenant_id = $1 AND order_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list payments"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn mark_succeeded(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        paid_at: Timestamp,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'succeeded', paid_at = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .bind(paid_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark payment succeeded"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::Stale(
            self.current_status(tenant_id, id).await?,
        ))
    }

    async fn mark_failed(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
        reason: &str,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', failure_reason = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark payment failed"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::Stale(
            self.current_status(tenant_id, id).await?,
        ))
    }

    async fn mark_cancelled(
        &self,
        tenant_id: TenantId,
        id: PaymentId,
    ) -> Result<TransitionOutcome<PaymentStatus>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'cancelled', updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark payment cancelled"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::Stale(
            self.current_status(tenant_id, id).await?,
        ))
    }
}
