//! UpdateDisputeStatusHandler - propagates dispute state onto escrow holds.
//!
//! Called when the dispute domain opens or resolves a dispute on an order.
//! Orders with no holds are a no-op; a dispute can exist before any payment
//! was collected.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{OrderId, TenantId};
use crate::ports::EscrowHoldRepository;

/// Command to set or clear the dispute block on an order's holds.
#[derive(Debug, Clone)]
pub struct UpdateDisputeStatusCommand {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub has_dispute: bool,
}

/// Result of a dispute status update.
#[derive(Debug, Clone)]
pub struct UpdateDisputeStatusResult {
    /// Holds whose block flag was changed. Zero when the order has no holds.
    pub holds_updated: u32,
}

/// Handler for dispute status changes.
pub struct UpdateDisputeStatusHandler {
    holds: Arc<dyn EscrowHoldRepository>,
}

impl UpdateDisputeStatusHandler {
    pub fn new(holds: Arc<dyn EscrowHoldRepository>) -> Self {
        Self { holds }
    }

    pub async fn handle(
        &self,
        cmd: UpdateDisputeStatusCommand,
    ) -> Result<UpdateDisputeStatusResult, BillingError> {
        let holds = self.holds.list_by_order(cmd.tenant_id, cmd.order_id).await?;

        let mut holds_updated = 0;
        for hold in holds {
            // Terminal holds no longer carry releasable funds.
            if hold.status.is_terminal() {
                continue;
            }
            self.holds
                .set_dispute_block(cmd.tenant_id, hold.id, cmd.has_dispute)
                .await?;
            holds_updated += 1;
        }

        tracing::info!(
            tenant_id = %cmd.tenant_id,
            order_id = %cmd.order_id,
            has_dispute = cmd.has_dispute,
            holds_updated,
            "dispute status applied to holds"
        );
        Ok(UpdateDisputeStatusResult { holds_updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::domain::billing::{EscrowHold, HoldStatus};
    use crate::domain::foundation::{Currency, Money, PaymentId, SupplierId};
    use rust_decimal::Decimal;

    fn seed_hold(ledger: &InMemoryLedger, tenant: TenantId, order: OrderId, status: HoldStatus) {
        let mut hold = EscrowHold::new_pending(
            tenant,
            PaymentId::new(),
            order,
            SupplierId::new(),
            Money::new(Decimal::new(800, 0), Currency::usd()).unwrap(),
            30,
        );
        hold.status = status;
        ledger.insert_hold(hold);
    }

    #[tokio::test]
    async fn dispute_blocks_active_holds_and_skips_terminal_ones() {
        let ledger = Arc::new(InMemoryLedger::new());
        let handler = UpdateDisputeStatusHandler::new(ledger.clone());
        let tenant = TenantId::new();
        let order = OrderId::new();
        seed_hold(&ledger, tenant, order, HoldStatus::Held);
        seed_hold(&ledger, tenant, order, HoldStatus::Released);

        let result = handler
            .handle(UpdateDisputeStatusCommand {
                tenant_id: tenant,
                order_id: order,
                has_dispute: true,
            })
            .await
            .unwrap();
        assert_eq!(result.holds_updated, 1);

        let holds = ledger.holds();
        let held = holds.iter().find(|h| h.status == HoldStatus::Held).unwrap();
        assert!(held.blocked_by_dispute);
        let released = holds
            .iter()
            .find(|h| h.status == HoldStatus::Released)
            .unwrap();
        assert!(!released.blocked_by_dispute);
    }

    #[tokio::test]
    async fn resolving_a_dispute_clears_the_block() {
        let ledger = Arc::new(InMemoryLedger::new());
        let handler = UpdateDisputeStatusHandler::new(ledger.clone());
        let tenant = TenantId::new();
        let order = OrderId::new();
        seed_hold(&ledger, tenant, order, HoldStatus::Held);

        for has_dispute in [true, false] {
            handler
                .handle(UpdateDisputeStatusCommand {
                    tenant_id: tenant,
                    order_id: order,
                    has_dispute,
                })
                .await
                .unwrap();
        }

        assert!(!ledger.holds()[0].blocked_by_dispute);
    }

    #[tokio::test]
    async fn order_without_holds_is_a_no_op() {
        let ledger = Arc::new(InMemoryLedger::new());
        let handler = UpdateDisputeStatusHandler::new(ledger);

        let result = handler
            .handle(UpdateDisputeStatusCommand {
                tenant_id: TenantId::new(),
                order_id: OrderId::new(),
                has_dispute: true,
            })
            .await
            .unwrap();
        assert_eq!(result.holds_updated, 0);
    }
}
