//! Billing domain: payments, escrow holds, settlements, and refunds.

mod errors;
mod escrow_hold;
mod events;
mod payment;
mod payout_account;
mod refund;
mod settlement;

pub use errors::BillingError;
pub use escrow_hold::{EscrowHold, HoldStatus};
pub use events::{EscrowHeld, PaymentFailed, PaymentSucceeded, RefundIssued, SettlementReleased};
pub use payment::{Payment, PaymentMode, PaymentStatus};
pub use payout_account::{PayoutAccount, PayoutAccountStatus};
pub use refund::{Refund, RefundStatus};
pub use settlement::{Settlement, SettlementStatus};
