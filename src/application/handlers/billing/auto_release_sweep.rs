//! AutoReleaseSweepHandler - releases holds whose grace period has lapsed.
//!
//! One sweep walks every tenant with due holds and delegates each release to
//! `ReleaseEscrowHandler` with no actor, so the claim semantics are identical
//! to a manual release. The dispute check is repeated per candidate right
//! before release; a dispute opened after the hold was listed still blocks it.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::Timestamp;
use crate::ports::{DisputeLookup, EscrowHoldRepository};

use super::release_escrow::{ReleaseEscrowCommand, ReleaseEscrowHandler};

const AUTO_RELEASE_REASON: &str = "Auto-released after grace period";

/// Tally of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub released: u32,
    pub blocked: u32,
    pub failed: u32,
}

/// Handler for the periodic auto-release sweep.
pub struct AutoReleaseSweepHandler {
    holds: Arc<dyn EscrowHoldRepository>,
    disputes: Arc<dyn DisputeLookup>,
    releaser: Arc<ReleaseEscrowHandler>,
}

impl AutoReleaseSweepHandler {
    pub fn new(
        holds: Arc<dyn EscrowHoldRepository>,
        disputes: Arc<dyn DisputeLookup>,
        releaser: Arc<ReleaseEscrowHandler>,
    ) -> Self {
        Self {
            holds,
            disputes,
            releaser,
        }
    }

    pub async fn handle(&self) -> Result<SweepReport, BillingError> {
        let now = Timestamp::now();
        let mut report = SweepReport::default();

        for tenant_id in self.holds.tenants_with_due_holds(now).await? {
            // One tenant's failures never starve the others.
            let due = match self.holds.list_due_for_release(tenant_id, now).await {
                Ok(due) => due,
                Err(e) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        error = %e,
                        "failed to list due holds; tenant skipped this pass"
                    );
                    continue;
                }
            };
            for hold in due {
                match self.disputes.has_open_dispute(tenant_id, hold.order_id).await {
                    Ok(true) => {
                        if let Err(e) =
                            self.holds.set_dispute_block(tenant_id, hold.id, true).await
                        {
                            tracing::warn!(
                                tenant_id = %tenant_id,
                                hold_id = %hold.id,
                                error = %e,
                                "failed to record dispute block"
                            );
                            report.failed += 1;
                            continue;
                        }
                        tracing::info!(
                            tenant_id = %tenant_id,
                            hold_id = %hold.id,
                            order_id = %hold.order_id,
                            "auto-release skipped; dispute opened since listing"
                        );
                        report.blocked += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(
                            tenant_id = %tenant_id,
                            hold_id = %hold.id,
                            error = %e,
                            "dispute check failed; hold skipped this pass"
                        );
                        report.failed += 1;
                        continue;
                    }
                }

                let cmd = ReleaseEscrowCommand {
                    tenant_id,
                    hold_id: hold.id,
                    released_by: None,
                    reason: AUTO_RELEASE_REASON.to_string(),
                };
                match self.releaser.handle(cmd).await {
                    Ok(_) => report.released += 1,
                    Err(e) => {
                        tracing::warn!(
                            tenant_id = %tenant_id,
                            hold_id = %hold.id,
                            error = %e,
                            "auto-release failed"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            released = report.released,
            blocked = report.blocked,
            failed = report.failed,
            "auto-release sweep finished"
        );
        Ok(report)
    }
}
