//! PostgreSQL implementation of EscrowHoldRepository.
//!
//! The `transition` operation is a conditional UPDATE keyed on the expected
//! current status; losing a race returns the winner's status instead of an
//! error so callers can report it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{EscrowHold, HoldStatus};
use crate::domain::foundation::{
    ActorId, DomainError, ErrorCode, EscrowHoldId, OrderId, PaymentId, SupplierId, TenantId,
    Timestamp,
};
use crate::ports::{ClaimOutcome, EscrowHoldRepository, TransitionOutcome};

use super::payment_repository::{db_err, parse_money};

/// PostgreSQL implementation of the EscrowHoldRepository port.
pub struct PostgresEscrowHoldRepository {
    pool: PgPool,
}

impl PostgresEscrowHoldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<HoldStatus, DomainError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM escrow_holds WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id.as_uuid())
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err("Failed to read hold status"))?;
        match status {
            Some(s) => parse_status(&s),
            None => Err(DomainError::new(
                ErrorCode::EscrowHoldNotFound,
                "Escrow hold not found",
            )),
        }
    }
}

/// Database row representation of an escrow hold.
#[derive(Debug, sqlx::FromRow)]
struct EscrowHoldRow {
    id: Uuid,
    tenant_id: Uuid,
    payment_id: Uuid,
    order_id: Uuid,
    supplier_id: Uuid,
    amount: Decimal,
    currency: String,
    status: String,
    auto_release_days: i32,
    auto_release_date: Option<DateTime<Utc>>,
    released_at: Option<DateTime<Utc>>,
    released_by: Option<Uuid>,
    release_reason: Option<String>,
    blocked_by_dispute: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EscrowHoldRow> for EscrowHold {
    type Error = DomainError;

    fn try_from(row: EscrowHoldRow) -> Result<Self, Self::Error> {
        Ok(EscrowHold {
            id: EscrowHoldId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            payment_id: PaymentId::from_uuid(row.payment_id),
            order_id: OrderId::from_uuid(row.order_id),
            supplier_id: SupplierId::from_uuid(row.supplier_id),
            money: parse_money(row.amount, &row.currency)?,
            status: parse_status(&row.status)?,
            auto_release_days: u32::try_from(row.auto_release_days).map_err(|_| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid auto_release_days value: {}", row.auto_release_days),
                )
            })?,
            auto_release_date: row.auto_release_date.map(Timestamp::from_datetime),
            released_at: row.released_at.map(Timestamp::from_datetime),
            released_by: row.released_by.map(ActorId::from_uuid),
            release_reason: row.release_reason,
            blocked_by_dispute: row.blocked_by_dispute,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<HoldStatus, DomainError> {
    match s {
        "pending" => Ok(HoldStatus::Pending),
        "held" => Ok(HoldStatus::Held),
        "release_pending" => Ok(HoldStatus::ReleasePending),
        "released" => Ok(HoldStatus::Released),
        "refunded" => Ok(HoldStatus::Refunded),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid hold status value: {}", s),
        )),
    }
}

const HOLD_COLUMNS: &str = "id, tenant_id, payment_id, order_id, supplier_id, amount, currency, \
     status, auto_release_days, auto_release_date, released_at, released_by, release_reason, \
     blocked_by_dispute, created_at, updated_at";

#[async_trait]
impl EscrowHoldRepository for PostgresEscrowHoldRepository {
    async fn create(&self, hold: &EscrowHold) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO escrow_holds (
                id, tenant_id, payment_id, order_id, supplier_id, amount, currency,
                status, auto_release_days, auto_release_date, released_at, released_by,
                release_reason, blocked_by_dispute, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(hold.id.as_uuid())
        .bind(hold.tenant_id.as_uuid())
        .bind(hold.payment_id.as_uuid())
        .bind(hold.order_id.as_uuid())
        .bind(hold.supplier_id.as_uuid())
        .bind(hold.money.amount())
        .bind(hold.money.currency().as_str())
        .bind(hold.status.as_str())
        .bind(i32::try_from(hold.auto_release_days).unwrap_or(i32::MAX))
        .bind(hold.auto_release_date.as_ref().map(|t| *t.as_datetime()))
        .bind(hold.released_at.as_ref().map(|t| *t.as_datetime()))
        .bind(hold.released_by.as_ref().map(|a| *a.as_uuid()))
        .bind(&hold.release_reason)
        .bind(hold.blocked_by_dispute)
        .bind(hold.created_at.as_datetime())
        .bind(hold.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to save escrow hold"))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<Option<EscrowHold>, DomainError> {
        let row: Option<EscrowHoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM escrow_holds WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find escrow hold"))?;

        row.map(EscrowHold::try_from).transpose()
    }

    async fn find_by_payment_id(
        &self,
        tenant_id: TenantId,
        payment_id: PaymentId,
    ) -> Result<Option<EscrowHold>, DomainError> {
        let row: Option<EscrowHoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM escrow_holds WHERE tenant_id = $1 AND payment_id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(payment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find escrow hold"))?;

        row.map(EscrowHold::try_from).transpose()
    }

    async fn list_by_order(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let rows: Vec<EscrowHoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM escrow_holds WHERE tenant_id = $1 AND order_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list escrow holds"))?;

        rows.into_iter().map(EscrowHold::try_from).collect()
    }

    async fn list_by_supplier(
        &self,
        tenant_id: TenantId,
        supplier_id: SupplierId,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let rows: Vec<EscrowHoldRow> = sqlx::query_as(&format!(
            "SELECT {HOLD_COLUMNS} FROM escrow_holds WHERE tenant_id = $1 AND supplier_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id.as_uuid())
        .bind(supplier_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list escrow holds"))?;

        rows.into_iter().map(EscrowHold::try_from).collect()
    }

    async fn list_due_for_release(
        &self,
        tenant_id: TenantId,
        now: Timestamp,
    ) -> Result<Vec<EscrowHold>, DomainError> {
        let rows: Vec<EscrowHoldRow> = sqlx::query_as(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM escrow_holds
            WHERE tenant_id = $1
              AND status = 'held'
              AND blocked_by_dispute = FALSE
              AND (auto_release_date IS NULL OR auto_release_date <= $2)
            ORDER BY auto_release_date ASC NULLS FIRST
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list due escrow holds"))?;

        rows.into_iter().map(EscrowHold::try_from).collect()
    }

    async fn tenants_with_due_holds(&self, now: Timestamp) -> Result<Vec<TenantId>, DomainError> {
        let tenant_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT tenant_id FROM escrow_holds
            WHERE status = 'held'
              AND blocked_by_dispute = FALSE
              AND (auto_release_date IS NULL OR auto_release_date <= $1)
            ORDER BY tenant_id
            "#,
        )
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list tenants with due holds"))?;

        Ok(tenant_ids.into_iter().map(TenantId::from_uuid).collect())
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        from: HoldStatus,
        to: HoldStatus,
    ) -> Result<TransitionOutcome<HoldStatus>, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE escrow_holds
            SET status = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to transition escrow hold"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::Stale(
            self.current_status(tenant_id, id).await?,
        ))
    }

    async fn claim_for_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
    ) -> Result<ClaimOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE escrow_holds
            SET status = 'release_pending', updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
              AND status = 'held'
              AND blocked_by_dispute = FALSE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to claim escrow hold"))?;

        if result.rows_affected() == 1 {
            return Ok(ClaimOutcome::Claimed);
        }

        let row: Option<(String, bool)> = sqlx::query_as(
            "SELECT status, blocked_by_dispute FROM escrow_holds \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to read hold after claim attempt"))?;

        match row {
            Some((status, blocked)) => {
                let status = parse_status(&status)?;
                if blocked && status == HoldStatus::Held {
                    Ok(ClaimOutcome::Blocked)
                } else {
                    Ok(ClaimOutcome::Stale(status))
                }
            }
            None => Err(DomainError::new(
                ErrorCode::EscrowHoldNotFound,
                "Escrow hold not found",
            )),
        }
    }

    async fn record_release(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        released_at: Timestamp,
        released_by: Option<ActorId>,
        reason: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE escrow_holds
            SET status = 'released', released_at = $3, released_by = $4,
                release_reason = $5, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .bind(released_at.as_datetime())
        .bind(released_by.as_ref().map(|a| *a.as_uuid()))
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to record escrow release"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::EscrowHoldNotFound,
                "Escrow hold not found",
            ));
        }
        Ok(())
    }

    async fn set_dispute_block(
        &self,
        tenant_id: TenantId,
        id: EscrowHoldId,
        blocked: bool,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE escrow_holds
            SET blocked_by_dispute = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(id.as_uuid())
        .bind(blocked)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to set dispute block"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::EscrowHoldNotFound,
                "Escrow hold not found",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("pending").unwrap(), HoldStatus::Pending);
        assert_eq!(parse_status("held").unwrap(), HoldStatus::Held);
        assert_eq!(
            parse_status("release_pending").unwrap(),
            HoldStatus::ReleasePending
        );
        assert_eq!(parse_status("released").unwrap(), HoldStatus::Released);
        assert_eq!(parse_status("refunded").unwrap(), HoldStatus::Refunded);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("invalid").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            HoldStatus::Pending,
            HoldStatus::Held,
            HoldStatus::ReleasePending,
            HoldStatus::Released,
            HoldStatus::Refunded,
        ] {
            assert_eq!(parse_status(status.as_str()).unwrap(), status);
        }
    }
}
