//! Payment gateway adapters.
//!
//! `MockGateway` for tests and local development, `StripeGateway` for the
//! Stripe-compatible HTTP provider.

mod mock_gateway;
mod stripe_gateway;
mod webhook_types;

pub use mock_gateway::{MockGateway, MOCK_SIGNATURE};
pub use stripe_gateway::{StripeGateway, StripeGatewayConfig};
pub use webhook_types::{SignatureHeader, SignatureParseError};
