//! Ports - async traits at the seams between the engine and the world.
//!
//! Handlers depend only on these traits; adapters under `crate::adapters`
//! provide the concrete implementations.

mod dispute_lookup;
mod escrow_hold_repository;
mod event_publisher;
mod order_status_notifier;
mod payment_gateway;
mod payment_repository;
mod payout_account_reader;
mod refund_repository;
mod settlement_repository;

pub use dispute_lookup::DisputeLookup;
pub use escrow_hold_repository::{ClaimOutcome, EscrowHoldRepository};
pub use event_publisher::EventPublisher;
pub use order_status_notifier::{OrderPaymentStatus, OrderStatusNotifier};
pub use payment_gateway::{
    to_minor_units, CreateIntentRequest, GatewayError, GatewayErrorCode, GatewayIntent,
    GatewayWebhookEvent, PaymentGateway, PayoutOutcome, PayoutRequest, RefundOutcome,
    RefundRequest, WebhookKind,
};
pub use payment_repository::{PaymentRepository, TransitionOutcome};
pub use payout_account_reader::PayoutAccountReader;
pub use refund_repository::RefundRepository;
pub use settlement_repository::SettlementRepository;
