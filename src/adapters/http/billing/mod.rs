//! HTTP adapter for the billing module.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AuthenticatedActor, BillingAppState, TenantContext};
pub use routes::{billing_router, billing_routes, webhook_routes};
