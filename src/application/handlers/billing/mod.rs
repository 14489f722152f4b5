//! Billing handlers.
//!
//! Command and query handlers for the payment and escrow lifecycle:
//!
//! ## Commands
//! - Creating payment intents (direct and escrow mode)
//! - Reconciling provider webhooks
//! - Releasing escrowed funds to suppliers
//! - The periodic auto-release sweep
//! - Issuing refunds
//! - Propagating dispute status onto holds
//!
//! ## Queries
//! - Payments, holds, settlements, and refunds, tenant-scoped

mod auto_release_sweep;
mod create_payment_intent;
mod create_refund;
mod handle_provider_webhook;
mod queries;
mod release_escrow;
mod update_dispute_status;

// Commands
pub use auto_release_sweep::{AutoReleaseSweepHandler, SweepReport};
pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
};
pub use create_refund::{CreateRefundCommand, CreateRefundHandler, CreateRefundResult};
pub use handle_provider_webhook::{
    HandleProviderWebhookCommand, HandleProviderWebhookHandler, HandleProviderWebhookResult,
};
pub use release_escrow::{ReleaseEscrowCommand, ReleaseEscrowHandler, ReleaseEscrowResult};
pub use update_dispute_status::{
    UpdateDisputeStatusCommand, UpdateDisputeStatusHandler, UpdateDisputeStatusResult,
};

// Queries
pub use queries::{BillingQueries, Page};
