//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_payment_intent, create_refund, get_hold, get_payment, get_settlement,
    handle_gateway_webhook, list_holds, list_payments, list_refunds, list_settlements,
    release_escrow, run_sweep, update_dispute_status, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## Payments
/// - `POST /payments/intent` - Create a payment intent
/// - `GET /payments` - List payments (filter: order_id, pagination)
/// - `GET /payments/:id` - Get a payment
///
/// ## Escrow
/// - `POST /escrow/:id/release` - Release a hold to its supplier
/// - `POST /escrow/sweep` - Run the auto-release sweep now
/// - `PUT /escrow/dispute` - Propagate dispute status onto an order's holds
/// - `GET /escrow` - List holds for a supplier
/// - `GET /escrow/:id` - Get a hold
///
/// ## Settlements and Refunds
/// - `GET /settlements` - List settlements
/// - `GET /settlements/:id` - Get a settlement
/// - `POST /refunds` - Refund part or all of a payment
/// - `GET /refunds` - List refunds for a payment
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/payments/intent", post(create_payment_intent))
        .route("/payments", get(list_payments))
        .route("/payments/:id", get(get_payment))
        .route("/escrow", get(list_holds))
        .route("/escrow/sweep", post(run_sweep))
        .route("/escrow/dispute", put(update_dispute_status))
        .route("/escrow/:id", get(get_hold))
        .route("/escrow/:id/release", post(release_escrow))
        .route("/settlements", get(list_settlements))
        .route("/settlements/:id", get(get_settlement))
        .route("/refunds", post(create_refund).get(list_refunds))
}

/// Create the gateway webhook router.
///
/// Separate from the main billing routes because webhooks carry no tenant
/// or user headers; they are authenticated by signature alone.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/gateway", post(handle_gateway_webhook))
}

/// Create the complete billing module router, suitable for mounting at
/// `/api/v1`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .merge(billing_routes())
        .nest("/webhooks", webhook_routes())
}
