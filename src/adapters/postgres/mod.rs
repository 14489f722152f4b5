//! PostgreSQL adapters.
//!
//! sqlx-backed implementations of the store ports. Each repository owns a
//! clone of the shared `PgPool`.

mod dispute_lookup;
mod escrow_hold_repository;
mod payment_repository;
mod payout_account_reader;
mod refund_repository;
mod settlement_repository;

pub use dispute_lookup::PostgresDisputeLookup;
pub use escrow_hold_repository::PostgresEscrowHoldRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use payout_account_reader::PostgresPayoutAccountReader;
pub use refund_repository::PostgresRefundRepository;
pub use settlement_repository::PostgresSettlementRepository;
