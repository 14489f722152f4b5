//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::billing::{
    // Commands
    AutoReleaseSweepHandler, SweepReport,
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    CreateRefundCommand, CreateRefundHandler, CreateRefundResult,
    HandleProviderWebhookCommand, HandleProviderWebhookHandler, HandleProviderWebhookResult,
    ReleaseEscrowCommand, ReleaseEscrowHandler, ReleaseEscrowResult,
    UpdateDisputeStatusCommand, UpdateDisputeStatusHandler, UpdateDisputeStatusResult,
    // Queries
    BillingQueries, Page,
};
