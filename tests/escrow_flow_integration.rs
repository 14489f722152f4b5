//! Integration tests for the escrow payment lifecycle.
//!
//! These tests wire the application exactly like production — through
//! `BillingAppState` — but on in-memory adapters, and walk whole journeys:
//! 1. Intent creation opens the payment and its pending hold
//! 2. The provider webhook confirms the payment and holds the escrow
//! 3. Release (manual or sweep) settles the funds to the supplier
//! 4. Refunds reverse succeeded payments against their remaining balance
//!
//! Each step is asserted on ledger state, published events, and order
//! notifications, so a regression anywhere in the chain surfaces here.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use marketpay::adapters::events::InMemoryEventBus;
use marketpay::adapters::gateway::{MockGateway, MOCK_SIGNATURE};
use marketpay::adapters::http::BillingAppState;
use marketpay::adapters::memory::{InMemoryLedger, RecordingOrderNotifier, StaticDisputeLookup};
use marketpay::application::{
    CreatePaymentIntentCommand, CreatePaymentIntentResult, CreateRefundCommand,
    CreateRefundResult, HandleProviderWebhookCommand, HandleProviderWebhookResult,
    ReleaseEscrowCommand, SweepReport, UpdateDisputeStatusCommand,
};
use marketpay::domain::billing::{
    BillingError, HoldStatus, PaymentMode, PaymentStatus, PayoutAccount, PayoutAccountStatus,
    RefundStatus, SettlementStatus,
};
use marketpay::domain::foundation::{
    ActorId, EscrowHoldId, OrderId, PayoutAccountId, SupplierId, TenantId, Timestamp,
};
use marketpay::ports::{GatewayWebhookEvent, OrderPaymentStatus, WebhookKind};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct App {
    state: BillingAppState,
    ledger: Arc<InMemoryLedger>,
    gateway: Arc<MockGateway>,
    bus: Arc<InMemoryEventBus>,
    notifier: Arc<RecordingOrderNotifier>,
    disputes: Arc<StaticDisputeLookup>,
}

fn app() -> App {
    let ledger = Arc::new(InMemoryLedger::new());
    let gateway = Arc::new(MockGateway::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let notifier = Arc::new(RecordingOrderNotifier::new());
    let disputes = Arc::new(StaticDisputeLookup::new());
    let state = BillingAppState {
        payments: ledger.clone(),
        holds: ledger.clone(),
        settlements: ledger.clone(),
        refunds: ledger.clone(),
        payout_accounts: ledger.clone(),
        gateway: gateway.clone(),
        event_publisher: bus.clone(),
        order_notifier: notifier.clone(),
        disputes: disputes.clone(),
        auto_release_days: 30,
    };
    App {
        state,
        ledger,
        gateway,
        bus,
        notifier,
        disputes,
    }
}

impl App {
    async fn create_escrow_intent(
        &self,
        tenant: TenantId,
        order: OrderId,
        supplier: SupplierId,
        amount: i64,
    ) -> CreatePaymentIntentResult {
        self.state
            .create_intent_handler()
            .handle(CreatePaymentIntentCommand {
                tenant_id: tenant,
                order_id: order,
                amount: Decimal::new(amount, 0),
                currency: "USD".to_string(),
                mode: PaymentMode::Escrow,
                supplier_id: Some(supplier),
                idempotency_key: None,
            })
            .await
            .expect("intent creation")
    }

    async fn deliver_webhook(
        &self,
        event_ref: &str,
        intent_ref: &str,
        kind: WebhookKind,
    ) -> Result<HandleProviderWebhookResult, BillingError> {
        let event = GatewayWebhookEvent {
            event_ref: event_ref.to_string(),
            intent_ref: intent_ref.to_string(),
            kind,
            created_at: 1_700_000_000,
        };
        self.state
            .webhook_handler()
            .handle(HandleProviderWebhookCommand {
                payload: MockGateway::webhook_payload(&event),
                signature: MOCK_SIGNATURE.to_string(),
            })
            .await
    }

    fn seed_payout_account(&self, tenant: TenantId, supplier: SupplierId) {
        self.ledger.insert_payout_account(PayoutAccount {
            id: PayoutAccountId::new(),
            tenant_id: tenant,
            supplier_id: supplier,
            provider_account_ref: "acct_mock_integration".to_string(),
            status: PayoutAccountStatus::Active,
            is_default: true,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        });
    }

    fn hold_status(&self, id: EscrowHoldId) -> HoldStatus {
        self.ledger
            .holds()
            .into_iter()
            .find(|h| h.id == id)
            .expect("hold present")
            .status
    }
}

// =============================================================================
// Full Lifecycle
// =============================================================================

#[tokio::test]
async fn escrow_lifecycle_intent_webhook_release() {
    let app = app();
    let tenant = TenantId::new();
    let order = OrderId::new();
    let supplier = SupplierId::new();
    app.seed_payout_account(tenant, supplier);

    // 1. Intent: a pending payment and a pending hold exist.
    let intent = app.create_escrow_intent(tenant, order, supplier, 5000).await;
    let hold_id: EscrowHoldId = intent.hold_id.as_deref().unwrap().parse().unwrap();
    assert_eq!(app.ledger.payments()[0].status, PaymentStatus::Pending);
    assert_eq!(app.hold_status(hold_id), HoldStatus::Pending);

    // 2. Provider confirms: payment succeeded, hold moves to held, order told.
    let result = app
        .deliver_webhook("evt_1", &intent.intent_ref, WebhookKind::PaymentSucceeded)
        .await
        .unwrap();
    assert!(matches!(
        result,
        HandleProviderWebhookResult::PaymentSucceeded { .. }
    ));
    assert_eq!(app.hold_status(hold_id), HoldStatus::Held);
    assert!(app.bus.has_event("payment.succeeded.v1"));
    assert!(app.bus.has_event("escrow.held.v1"));
    assert_eq!(app.notifier.notifications()[0].2, OrderPaymentStatus::Paid);

    // 3. Manual release: settlement completes, hold is terminal.
    let release = app
        .state
        .release_handler()
        .handle(ReleaseEscrowCommand {
            tenant_id: tenant,
            hold_id,
            released_by: Some(ActorId::new()),
            reason: "Order delivered".to_string(),
        })
        .await
        .unwrap();
    assert!(release.provider_payout_ref.starts_with("txn_"));
    assert_eq!(app.hold_status(hold_id), HoldStatus::Released);

    let settlements = app.ledger.settlements();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].status, SettlementStatus::Completed);
    assert_eq!(settlements[0].supplier_id, supplier);
    assert_eq!(settlements[0].money.amount(), Decimal::new(5000, 0));

    let released = app.bus.events_of_type("settlement.released.v1");
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].payload["trigger"], "manual");
}

#[tokio::test]
async fn duplicate_webhook_does_not_replay_side_effects() {
    let app = app();
    let tenant = TenantId::new();
    let supplier = SupplierId::new();
    let intent = app
        .create_escrow_intent(tenant, OrderId::new(), supplier, 1000)
        .await;

    app.deliver_webhook("evt_1", &intent.intent_ref, WebhookKind::PaymentSucceeded)
        .await
        .unwrap();
    let events_after_first = app.bus.event_count();
    let notifications_after_first = app.notifier.notifications().len();

    let result = app
        .deliver_webhook("evt_1", &intent.intent_ref, WebhookKind::PaymentSucceeded)
        .await
        .unwrap();
    assert!(matches!(
        result,
        HandleProviderWebhookResult::AlreadyProcessed { .. }
    ));
    assert_eq!(app.bus.event_count(), events_after_first);
    assert_eq!(app.notifier.notifications().len(), notifications_after_first);
}

#[tokio::test]
async fn declined_payment_leaves_hold_pending_and_unreleasable() {
    let app = app();
    let tenant = TenantId::new();
    let supplier = SupplierId::new();
    app.seed_payout_account(tenant, supplier);
    let intent = app
        .create_escrow_intent(tenant, OrderId::new(), supplier, 1000)
        .await;
    let hold_id: EscrowHoldId = intent.hold_id.as_deref().unwrap().parse().unwrap();

    app.deliver_webhook(
        "evt_1",
        &intent.intent_ref,
        WebhookKind::PaymentFailed {
            reason: "insufficient funds".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(app.ledger.payments()[0].status, PaymentStatus::Failed);
    assert_eq!(app.hold_status(hold_id), HoldStatus::Pending);
    assert_eq!(
        app.notifier.notifications()[0].2,
        OrderPaymentStatus::PaymentFailed
    );

    // Funds were never captured, so the hold cannot be paid out.
    let err = app
        .state
        .release_handler()
        .handle(ReleaseEscrowCommand {
            tenant_id: tenant,
            hold_id,
            released_by: Some(ActorId::new()),
            reason: "premature".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::NotReleasable { .. }));
    assert!(app.ledger.settlements().is_empty());
}

// =============================================================================
// Disputes
// =============================================================================

#[tokio::test]
async fn dispute_blocks_release_until_resolved() {
    let app = app();
    let tenant = TenantId::new();
    let order = OrderId::new();
    let supplier = SupplierId::new();
    app.seed_payout_account(tenant, supplier);
    let intent = app.create_escrow_intent(tenant, order, supplier, 2000).await;
    let hold_id: EscrowHoldId = intent.hold_id.as_deref().unwrap().parse().unwrap();
    app.deliver_webhook("evt_1", &intent.intent_ref, WebhookKind::PaymentSucceeded)
        .await
        .unwrap();

    // Dispute opens on the order.
    let result = app
        .state
        .dispute_handler()
        .handle(UpdateDisputeStatusCommand {
            tenant_id: tenant,
            order_id: order,
            has_dispute: true,
        })
        .await
        .unwrap();
    assert_eq!(result.holds_updated, 1);

    let release_cmd = ReleaseEscrowCommand {
        tenant_id: tenant,
        hold_id,
        released_by: Some(ActorId::new()),
        reason: "Order delivered".to_string(),
    };
    let err = app
        .state
        .release_handler()
        .handle(release_cmd.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::BlockedByDispute(_)));
    assert!(app.ledger.settlements().is_empty());

    // Dispute resolves; the same release now goes through.
    app.state
        .dispute_handler()
        .handle(UpdateDisputeStatusCommand {
            tenant_id: tenant,
            order_id: order,
            has_dispute: false,
        })
        .await
        .unwrap();

    app.state.release_handler().handle(release_cmd).await.unwrap();
    assert_eq!(app.hold_status(hold_id), HoldStatus::Released);
}

// =============================================================================
// Auto-Release Sweep
// =============================================================================

/// Seeds a held hold whose grace period has already lapsed.
fn seed_due_hold(app: &App, tenant: TenantId) -> marketpay::domain::billing::EscrowHold {
    use marketpay::domain::billing::EscrowHold;
    use marketpay::domain::foundation::{Currency, Money, PaymentId};

    let supplier = SupplierId::new();
    let mut hold = EscrowHold::new_pending(
        tenant,
        PaymentId::new(),
        OrderId::new(),
        supplier,
        Money::new(Decimal::new(1500, 0), Currency::usd()).unwrap(),
        30,
    );
    hold.status = HoldStatus::Held;
    hold.auto_release_date = Some(Timestamp::now().add_days(-2));
    app.ledger.insert_hold(hold.clone());
    app.seed_payout_account(tenant, supplier);
    hold
}

#[tokio::test]
async fn sweep_releases_due_holds_and_blocks_late_disputes() {
    let app = app();
    let due = seed_due_hold(&app, TenantId::new());
    let disputed = seed_due_hold(&app, TenantId::new());
    app.disputes.open_dispute(disputed.tenant_id, disputed.order_id);

    let report = app.state.sweep_handler().handle().await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            released: 1,
            blocked: 1,
            failed: 0
        }
    );

    assert_eq!(app.hold_status(due.id), HoldStatus::Released);
    let released = app
        .ledger
        .holds()
        .into_iter()
        .find(|h| h.id == due.id)
        .unwrap();
    assert!(released.released_by.is_none());

    let blocked = app
        .ledger
        .holds()
        .into_iter()
        .find(|h| h.id == disputed.id)
        .unwrap();
    assert_eq!(blocked.status, HoldStatus::Held);
    assert!(blocked.blocked_by_dispute);

    let events = app.bus.events_of_type("settlement.released.v1");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["trigger"], "auto");
}

#[tokio::test]
async fn sweep_payout_failure_leaves_hold_recoverable() {
    let app = app();
    let due = seed_due_hold(&app, TenantId::new());
    app.gateway.set_fail_payouts(true);

    let report = app.state.sweep_handler().handle().await.unwrap();
    assert_eq!(report.failed, 1);

    // Parked for operators; the failed settlement row carries the reason.
    assert_eq!(app.hold_status(due.id), HoldStatus::ReleasePending);
    let settlements = app.ledger.settlements();
    assert_eq!(settlements[0].status, SettlementStatus::Failed);
    assert!(settlements[0].failure_reason.is_some());
}

// =============================================================================
// Refunds
// =============================================================================

async fn succeeded_direct_payment(app: &App, tenant: TenantId, amount: i64) -> String {
    let result = app
        .state
        .create_intent_handler()
        .handle(CreatePaymentIntentCommand {
            tenant_id: tenant,
            order_id: OrderId::new(),
            amount: Decimal::new(amount, 0),
            currency: "USD".to_string(),
            mode: PaymentMode::Direct,
            supplier_id: None,
            idempotency_key: None,
        })
        .await
        .unwrap();
    app.deliver_webhook("evt_pay", &result.intent_ref, WebhookKind::PaymentSucceeded)
        .await
        .unwrap();
    result.payment_id
}

#[tokio::test]
async fn refunds_exhaust_the_balance_then_reject() {
    let app = app();
    let tenant = TenantId::new();
    let payment_id = succeeded_direct_payment(&app, tenant, 1000).await;
    let payment_id = payment_id.parse().unwrap();
    let refund = |amount: i64| CreateRefundCommand {
        tenant_id: tenant,
        payment_id,
        amount: Decimal::new(amount, 0),
        currency: "USD".to_string(),
        reason: "customer request".to_string(),
        created_by: ActorId::new(),
    };

    let first = app.state.refund_handler().handle(refund(600)).await.unwrap();
    assert!(matches!(first, CreateRefundResult::Issued { .. }));

    let second = app.state.refund_handler().handle(refund(400)).await.unwrap();
    assert!(matches!(second, CreateRefundResult::Issued { .. }));

    // Fully refunded: the order service was told exactly once.
    let refunded: Vec<_> = app
        .notifier
        .notifications()
        .into_iter()
        .filter(|(_, _, s)| *s == OrderPaymentStatus::Refunded)
        .collect();
    assert_eq!(refunded.len(), 1);

    let err = app
        .state
        .refund_handler()
        .handle(refund(1))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::RefundExceedsBalance { .. }));
    assert_eq!(app.ledger.refunds().len(), 2);
}

#[tokio::test]
async fn declined_refund_is_audited_but_keeps_the_balance() {
    let app = app();
    let tenant = TenantId::new();
    let payment_id: marketpay::domain::foundation::PaymentId =
        succeeded_direct_payment(&app, tenant, 1000)
            .await
            .parse()
            .unwrap();
    let refund = |amount: i64| CreateRefundCommand {
        tenant_id: tenant,
        payment_id,
        amount: Decimal::new(amount, 0),
        currency: "USD".to_string(),
        reason: "customer request".to_string(),
        created_by: ActorId::new(),
    };

    app.gateway.set_decline_refunds(true);
    let declined = app
        .state
        .refund_handler()
        .handle(refund(1000))
        .await
        .unwrap();
    assert!(matches!(declined, CreateRefundResult::Declined { .. }));
    assert_eq!(app.ledger.refunds()[0].status, RefundStatus::Failed);

    // The declined attempt did not consume the balance.
    app.gateway.set_decline_refunds(false);
    let issued = app
        .state
        .refund_handler()
        .handle(refund(1000))
        .await
        .unwrap();
    assert!(matches!(issued, CreateRefundResult::Issued { .. }));
}

// =============================================================================
// Refund Balance Property
// =============================================================================

proptest! {
    /// No sequence of refund attempts can push the completed total past the
    /// payment amount, regardless of how the gateway answers each attempt.
    #[test]
    fn completed_refunds_never_exceed_payment(
        attempts in prop::collection::vec((1i64..=1500, any::<bool>()), 1..8)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let app = app();
            let tenant = TenantId::new();
            let payment_id: marketpay::domain::foundation::PaymentId =
                succeeded_direct_payment(&app, tenant, 1000)
                    .await
                    .parse()
                    .unwrap();

            for (amount, decline) in attempts {
                app.gateway.set_decline_refunds(decline);
                let _ = app
                    .state
                    .refund_handler()
                    .handle(CreateRefundCommand {
                        tenant_id: tenant,
                        payment_id,
                        amount: Decimal::new(amount, 0),
                        currency: "USD".to_string(),
                        reason: "property check".to_string(),
                        created_by: ActorId::new(),
                    })
                    .await;
            }

            let completed: Decimal = app
                .ledger
                .refunds()
                .into_iter()
                .filter(|r| r.status == RefundStatus::Completed)
                .map(|r| r.money.amount())
                .sum();
            prop_assert!(completed <= Decimal::new(1000, 0));
            Ok(())
        })?;
    }
}
