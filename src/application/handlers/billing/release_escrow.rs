//! ReleaseEscrowHandler - pays held funds out to the supplier.
//!
//! Claiming works in two steps. The hold is first compare-and-swapped from
//! `Held` to `ReleasePending`, which admits exactly one releaser per hold no
//! matter how many admins and sweep ticks race; the settlement row is created
//! under that claim, and the hold only flips to `Released` after the payout
//! is confirmed. A failed payout leaves a `Failed` settlement and a hold
//! parked in `ReleasePending` for operators to inspect.

use std::sync::Arc;

use crate::domain::billing::{BillingError, EscrowHold, HoldStatus, Settlement, SettlementReleased};
use crate::domain::foundation::{ActorId, EscrowHoldId, SerializableDomainEvent, TenantId, Timestamp};
use crate::ports::{
    ClaimOutcome, EscrowHoldRepository, EventPublisher, PaymentGateway, PayoutAccountReader,
    PayoutRequest, SettlementRepository,
};

/// Command to release a hold.
#[derive(Debug, Clone)]
pub struct ReleaseEscrowCommand {
    pub tenant_id: TenantId,
    pub hold_id: EscrowHoldId,

    /// `None` when the auto-release sweep is the caller.
    pub released_by: Option<ActorId>,

    pub reason: String,
}

/// Result of a successful release.
#[derive(Debug, Clone)]
pub struct ReleaseEscrowResult {
    pub hold_id: String,
    pub settlement_id: String,
    pub provider_payout_ref: String,
}

/// Handler for releasing escrowed funds.
pub struct ReleaseEscrowHandler {
    holds: Arc<dyn EscrowHoldRepository>,
    settlements: Arc<dyn SettlementRepository>,
    payout_accounts: Arc<dyn PayoutAccountReader>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
}

impl ReleaseEscrowHandler {
    pub fn new(
        holds: Arc<dyn EscrowHoldRepository>,
        settlements: Arc<dyn SettlementRepository>,
        payout_accounts: Arc<dyn PayoutAccountReader>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            holds,
            settlements,
            payout_accounts,
            gateway,
            publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReleaseEscrowCommand,
    ) -> Result<ReleaseEscrowResult, BillingError> {
        let hold = self
            .holds
            .find_by_id(cmd.tenant_id, cmd.hold_id)
            .await?
            .ok_or_else(|| BillingError::hold_not_found(cmd.hold_id))?;

        hold.check_releasable()?;

        let account = self
            .payout_accounts
            .find_default_for_supplier(cmd.tenant_id, hold.supplier_id)
            .await?
            .ok_or_else(|| BillingError::no_default_payout_account(hold.supplier_id))?;

        // Claim the hold. The claim re-checks the dispute flag atomically, so
        // a dispute raised since the read above still stops the payout; the
        // loser of a release race lands here with the winner's status and
        // reports it instead of double-paying.
        match self.holds.claim_for_release(cmd.tenant_id, hold.id).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::Blocked => {
                return Err(BillingError::blocked_by_dispute(hold.id));
            }
            ClaimOutcome::Stale(current) => {
                return Err(BillingError::not_releasable(hold.id, current));
            }
        }

        let mut settlement = Settlement::new_pending(
            cmd.tenant_id,
            hold.id,
            hold.supplier_id,
            account.id,
            hold.money.clone(),
        );
        if let Err(e) = self.settlements.create(&settlement).await {
            self.unclaim_best_effort(&hold).await;
            return Err(e.into());
        }

        settlement.mark_processing();
        self.settlements.update(&settlement).await?;

        let payout = self
            .gateway
            .payout(PayoutRequest {
                tenant_id: cmd.tenant_id,
                destination_account_ref: account.provider_account_ref.clone(),
                money: hold.money.clone(),
                description: format!("Escrow release for order {}", hold.order_id),
            })
            .await;

        match payout {
            Ok(outcome) => {
                settlement.mark_completed(outcome.payout_ref.clone());
                self.settlements.update(&settlement).await?;

                self.holds
                    .record_release(
                        cmd.tenant_id,
                        hold.id,
                        Timestamp::now(),
                        cmd.released_by,
                        &cmd.reason,
                    )
                    .await?;

                let trigger = if cmd.released_by.is_some() {
                    "manual"
                } else {
                    "auto"
                };
                let event = SettlementReleased::from_settlement(&settlement, hold.order_id, trigger)
                    .to_envelope()
                    .with_tenant_id(cmd.tenant_id.to_string());
                if let Err(e) = self.publisher.publish(event).await {
                    tracing::warn!(settlement_id = %settlement.id, error = %e, "event publication failed");
                }

                tracing::info!(
                    tenant_id = %cmd.tenant_id,
                    hold_id = %hold.id,
                    settlement_id = %settlement.id,
                    trigger,
                    "escrow released"
                );

                Ok(ReleaseEscrowResult {
                    hold_id: hold.id.to_string(),
                    settlement_id: settlement.id.to_string(),
                    provider_payout_ref: outcome.payout_ref,
                })
            }
            Err(e) => {
                settlement.mark_failed(e.to_string());
                if let Err(update_err) = self.settlements.update(&settlement).await {
                    tracing::error!(
                        settlement_id = %settlement.id,
                        error = %update_err,
                        "failed to record settlement failure"
                    );
                }
                tracing::warn!(
                    hold_id = %hold.id,
                    settlement_id = %settlement.id,
                    error = %e,
                    "payout failed; hold parked in release_pending"
                );
                Err(BillingError::gateway_failed(e.to_string()))
            }
        }
    }

    /// Returns a claimed hold to `Held` after a settlement write failure.
    async fn unclaim_best_effort(&self, hold: &EscrowHold) {
        if let Err(e) = self
            .holds
            .transition(
                hold.tenant_id,
                hold.id,
                HoldStatus::ReleasePending,
                HoldStatus::Held,
            )
            .await
        {
            tracing::error!(hold_id = %hold.id, error = %e, "failed to unclaim hold");
        }
    }
}
