//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. Tenancy is carried on every request via the `X-Tenant-Id`
//! header; the acting user via `X-User-Id`.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::{
    AutoReleaseSweepHandler, BillingQueries, CreatePaymentIntentCommand,
    CreatePaymentIntentHandler, CreateRefundCommand, CreateRefundHandler,
    HandleProviderWebhookCommand, HandleProviderWebhookHandler, Page, ReleaseEscrowCommand,
    ReleaseEscrowHandler, UpdateDisputeStatusCommand, UpdateDisputeStatusHandler,
};
use crate::domain::billing::BillingError;
use crate::domain::foundation::{ActorId, EscrowHoldId, OrderId, PaymentId, SettlementId, SupplierId, TenantId};
use crate::ports::{
    DisputeLookup, EscrowHoldRepository, EventPublisher, OrderStatusNotifier, PaymentGateway,
    PaymentRepository, PayoutAccountReader, RefundRepository, SettlementRepository,
};

use super::dto::{
    CreatePaymentIntentRequest, CreateRefundRequest, CreateRefundResponse, ErrorResponse,
    EscrowHoldResponse, ListHoldsParams, ListPaymentsParams, ListRefundsParams, PageParams,
    PaymentIntentResponse, PaymentResponse, RefundResponse, ReleaseEscrowRequest,
    ReleaseEscrowResponse, SettlementResponse, SweepResponse, UpdateDisputeStatusRequest,
    UpdateDisputeStatusResponse, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct BillingAppState {
    pub payments: Arc<dyn PaymentRepository>,
    pub holds: Arc<dyn EscrowHoldRepository>,
    pub settlements: Arc<dyn SettlementRepository>,
    pub refunds: Arc<dyn RefundRepository>,
    pub payout_accounts: Arc<dyn PayoutAccountReader>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub order_notifier: Arc<dyn OrderStatusNotifier>,
    pub disputes: Arc<dyn DisputeLookup>,

    /// Grace period stamped on new escrow holds.
    pub auto_release_days: u32,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_intent_handler(&self) -> CreatePaymentIntentHandler {
        CreatePaymentIntentHandler::new(
            self.gateway.clone(),
            self.payments.clone(),
            self.holds.clone(),
            self.auto_release_days,
        )
    }

    pub fn webhook_handler(&self) -> HandleProviderWebhookHandler {
        HandleProviderWebhookHandler::new(
            self.gateway.clone(),
            self.payments.clone(),
            self.holds.clone(),
            self.event_publisher.clone(),
            self.order_notifier.clone(),
        )
    }

    pub fn release_handler(&self) -> ReleaseEscrowHandler {
        ReleaseEscrowHandler::new(
            self.holds.clone(),
            self.settlements.clone(),
            self.payout_accounts.clone(),
            self.gateway.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn sweep_handler(&self) -> AutoReleaseSweepHandler {
        AutoReleaseSweepHandler::new(
            self.holds.clone(),
            self.disputes.clone(),
            Arc::new(self.release_handler()),
        )
    }

    pub fn refund_handler(&self) -> CreateRefundHandler {
        CreateRefundHandler::new(
            self.payments.clone(),
            self.refunds.clone(),
            self.gateway.clone(),
            self.event_publisher.clone(),
            self.order_notifier.clone(),
        )
    }

    pub fn dispute_handler(&self) -> UpdateDisputeStatusHandler {
        UpdateDisputeStatusHandler::new(self.holds.clone())
    }

    pub fn queries(&self) -> BillingQueries {
        BillingQueries::new(
            self.payments.clone(),
            self.holds.clone(),
            self.settlements.clone(),
            self.refunds.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Context Extractors
// ════════════════════════════════════════════════════════════════════════════════

/// Tenant context extracted from the `X-Tenant-Id` header.
///
/// In production this comes from the API gateway after tenant resolution;
/// a request without it never reaches a tenant-scoped table.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: TenantId,
}

/// Rejection type for TenantContext extraction.
pub struct TenantRequired;

impl IntoResponse for TenantRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("TENANT_REQUIRED", "Missing or invalid X-Tenant-Id header");
        (StatusCode::BAD_REQUEST, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = TenantRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let tenant_id = parts
                .headers
                .get("X-Tenant-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(TenantId::from_uuid)
                .ok_or(TenantRequired)?;

            Ok(TenantContext { tenant_id })
        })
    }
}

/// Acting user extracted from the `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor {
    pub actor_id: ActorId,
}

/// Rejection type for AuthenticatedActor extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let actor_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(ActorId::from_uuid)
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedActor { actor_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST/PUT endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/payments/intent - Create a payment intent
pub async fn create_payment_intent(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.create_intent_handler();
    let cmd = CreatePaymentIntentCommand {
        tenant_id: tenant.tenant_id,
        order_id: OrderId::from_uuid(request.order_id),
        amount: request.amount,
        currency: request.currency,
        mode: request.mode,
        supplier_id: request.supplier_id.map(SupplierId::from_uuid),
        idempotency_key: request.idempotency_key,
    };

    let result = handler.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentIntentResponse::from(result)),
    ))
}

/// POST /api/v1/webhooks/gateway - Handle provider webhook events
pub async fn handle_gateway_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let signature = headers
        .get("Gateway-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            BillingError::validation("Gateway-Signature", "Missing Gateway-Signature header")
        })?;

    let handler = state.webhook_handler();
    let cmd = HandleProviderWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(WebhookAckResponse::from(result)))
}

/// POST /api/v1/escrow/:id/release - Release an escrow hold to its supplier
pub async fn release_escrow(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    actor: AuthenticatedActor,
    Path(hold_id): Path<Uuid>,
    Json(request): Json<ReleaseEscrowRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.release_handler();
    let cmd = ReleaseEscrowCommand {
        tenant_id: tenant.tenant_id,
        hold_id: EscrowHoldId::from_uuid(hold_id),
        released_by: Some(actor.actor_id),
        reason: request.reason,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ReleaseEscrowResponse::from(result)))
}

/// PUT /api/v1/escrow/dispute - Propagate dispute status onto an order's holds
pub async fn update_dispute_status(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Json(request): Json<UpdateDisputeStatusRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.dispute_handler();
    let cmd = UpdateDisputeStatusCommand {
        tenant_id: tenant.tenant_id,
        order_id: OrderId::from_uuid(request.order_id),
        has_dispute: request.has_dispute,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(UpdateDisputeStatusResponse::from(result)))
}

/// POST /api/v1/escrow/sweep - Run the auto-release sweep immediately
///
/// The scheduler drives this periodically; the endpoint exists for
/// operational use.
pub async fn run_sweep(
    State(state): State<BillingAppState>,
    _tenant: TenantContext,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.sweep_handler();
    let report = handler.handle().await?;
    Ok(Json(SweepResponse::from(report)))
}

/// POST /api/v1/refunds - Refund part or all of a payment
pub async fn create_refund(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    actor: AuthenticatedActor,
    Json(request): Json<CreateRefundRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.refund_handler();
    let cmd = CreateRefundCommand {
        tenant_id: tenant.tenant_id,
        payment_id: PaymentId::from_uuid(request.payment_id),
        amount: request.amount,
        currency: request.currency,
        reason: request.reason,
        created_by: actor.actor_id,
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreateRefundResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/v1/payments - List payments, optionally filtered by order
pub async fn list_payments(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Query(params): Query<ListPaymentsParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let queries = state.queries();

    let payments = match params.order_id {
        Some(order_id) => {
            queries
                .list_payments_by_order(tenant.tenant_id, OrderId::from_uuid(order_id))
                .await?
        }
        None => {
            let page = Page::new(params.limit, params.offset);
            queries.list_payments(tenant.tenant_id, page).await?
        }
    };

    let response: Vec<PaymentResponse> = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/v1/payments/:id - Get a payment
pub async fn get_payment(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, BillingApiError> {
    let payment = state
        .queries()
        .get_payment(tenant.tenant_id, PaymentId::from_uuid(payment_id))
        .await?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// GET /api/v1/escrow - List escrow holds for a supplier
pub async fn list_holds(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Query(params): Query<ListHoldsParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let holds = state
        .queries()
        .list_holds_by_supplier(tenant.tenant_id, SupplierId::from_uuid(params.supplier_id))
        .await?;

    let response: Vec<EscrowHoldResponse> =
        holds.into_iter().map(EscrowHoldResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/v1/escrow/:id - Get an escrow hold
pub async fn get_hold(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Path(hold_id): Path<Uuid>,
) -> Result<impl IntoResponse, BillingApiError> {
    let hold = state
        .queries()
        .get_hold(tenant.tenant_id, EscrowHoldId::from_uuid(hold_id))
        .await?;

    Ok(Json(EscrowHoldResponse::from(hold)))
}

/// GET /api/v1/settlements - List settlements
pub async fn list_settlements(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let page = Page::new(params.limit, params.offset);
    let settlements = state
        .queries()
        .list_settlements(tenant.tenant_id, page)
        .await?;

    let response: Vec<SettlementResponse> = settlements
        .into_iter()
        .map(SettlementResponse::from)
        .collect();
    Ok(Json(response))
}

/// GET /api/v1/settlements/:id - Get a settlement
pub async fn get_settlement(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Path(settlement_id): Path<Uuid>,
) -> Result<impl IntoResponse, BillingApiError> {
    let settlement = state
        .queries()
        .get_settlement(tenant.tenant_id, SettlementId::from_uuid(settlement_id))
        .await?;

    Ok(Json(SettlementResponse::from(settlement)))
}

/// GET /api/v1/refunds - List refunds for a payment
pub async fn list_refunds(
    State(state): State<BillingAppState>,
    tenant: TenantContext,
    Query(params): Query<ListRefundsParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let refunds = state
        .queries()
        .list_refunds_by_payment(tenant.tenant_id, PaymentId::from_uuid(params.payment_id))
        .await?;

    let response: Vec<RefundResponse> = refunds.into_iter().map(RefundResponse::from).collect();
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::DomainError> for BillingApiError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BillingError::PaymentNotFound(_)
            | BillingError::PaymentNotFoundByIntentRef(_)
            | BillingError::HoldNotFound(_)
            | BillingError::SettlementNotFound(_) => StatusCode::NOT_FOUND,
            BillingError::BlockedByDispute(_)
            | BillingError::NotReleasable { .. }
            | BillingError::NotRefundable { .. }
            | BillingError::StateConflict { .. } => StatusCode::CONFLICT,
            BillingError::RefundExceedsBalance { .. }
            | BillingError::NoDefaultPayoutAccount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::GatewayFailed { .. } => StatusCode::BAD_GATEWAY,
            BillingError::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
            BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            BillingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{InMemoryLedger, RecordingOrderNotifier, StaticDisputeLookup};
    use crate::domain::billing::{HoldStatus, PaymentMode};
    use rust_decimal::Decimal;

    fn test_state() -> BillingAppState {
        let ledger = Arc::new(InMemoryLedger::new());
        BillingAppState {
            payments: ledger.clone(),
            holds: ledger.clone(),
            settlements: ledger.clone(),
            refunds: ledger.clone(),
            payout_accounts: ledger,
            gateway: Arc::new(MockGateway::new()),
            event_publisher: Arc::new(InMemoryEventBus::new()),
            order_notifier: Arc::new(RecordingOrderNotifier::new()),
            disputes: Arc::new(StaticDisputeLookup::new()),
            auto_release_days: 30,
        }
    }

    #[tokio::test]
    async fn create_intent_returns_created() {
        let state = test_state();
        let tenant = TenantContext {
            tenant_id: TenantId::new(),
        };
        let request = CreatePaymentIntentRequest {
            order_id: Uuid::new_v4(),
            amount: Decimal::new(2500, 0),
            currency: "USD".to_string(),
            mode: PaymentMode::Direct,
            supplier_id: None,
            idempotency_key: None,
        };

        let result = create_payment_intent(State(state), tenant, Json(request)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_payment_maps_to_404() {
        let state = test_state();
        let tenant = TenantContext {
            tenant_id: TenantId::new(),
        };

        let result = get_payment(State(state), tenant, Path(Uuid::new_v4())).await;
        let response = result.err().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_validation_to_400() {
        let err = BillingApiError(BillingError::validation("amount", "must be positive"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_gateway_failure_to_502() {
        let err = BillingApiError(BillingError::gateway_failed("connection reset"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn api_error_maps_not_releasable_to_409() {
        let err = BillingApiError(BillingError::not_releasable(
            EscrowHoldId::new(),
            HoldStatus::Released,
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn api_error_maps_refund_exceeds_balance_to_422() {
        let err = BillingApiError(BillingError::refund_exceeds_balance(
            PaymentId::new(),
            "150.00",
            "100.00",
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn api_error_maps_invalid_webhook_signature_to_401() {
        let err = BillingApiError(BillingError::invalid_webhook_signature());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_error_maps_infrastructure_to_500() {
        let err = BillingApiError(BillingError::infrastructure("database down"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
