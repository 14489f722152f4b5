//! Domain events emitted by the billing module.
//!
//! Every event type carries a version suffix so consumers can evolve
//! independently. Events are published after the owning state change is
//! durably persisted; publication is at-least-once, so payloads carry an
//! `event_id` for consumer-side deduplication.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain_event;

use crate::domain::foundation::{
    EscrowHoldId, EventId, OrderId, PaymentId, RefundId, SettlementId, SupplierId, TenantId,
    Timestamp,
};

use super::escrow_hold::EscrowHold;
use super::payment::Payment;
use super::refund::Refund;
use super::settlement::Settlement;

/// A pending payment was confirmed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSucceeded {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub currency: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    PaymentSucceeded,
    event_type = "payment.succeeded.v1",
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = occurred_at,
    event_id = event_id
);

impl PaymentSucceeded {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            tenant_id: payment.tenant_id,
            order_id: payment.order_id,
            amount: payment.money.amount(),
            currency: payment.money.currency().to_string(),
            occurred_at: Timestamp::now(),
        }
    }
}

/// A pending payment was declined by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailed {
    pub event_id: EventId,
    pub payment_id: PaymentId,
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub reason: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    PaymentFailed,
    event_type = "payment.failed.v1",
    aggregate_id = payment_id,
    aggregate_type = "Payment",
    occurred_at = occurred_at,
    event_id = event_id
);

impl PaymentFailed {
    pub fn from_payment(payment: &Payment, reason: impl Into<String>) -> Self {
        Self {
            event_id: EventId::new(),
            payment_id: payment.id,
            tenant_id: payment.tenant_id,
            order_id: payment.order_id,
            reason: reason.into(),
            occurred_at: Timestamp::now(),
        }
    }
}

/// An escrow hold moved to held after its payment succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowHeld {
    pub event_id: EventId,
    pub hold_id: EscrowHoldId,
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub amount: Decimal,
    pub currency: String,
    pub auto_release_date: Option<Timestamp>,
    pub occurred_at: Timestamp,
}

domain_event!(
    EscrowHeld,
    event_type = "escrow.held.v1",
    aggregate_id = hold_id,
    aggregate_type = "EscrowHold",
    occurred_at = occurred_at,
    event_id = event_id
);

impl EscrowHeld {
    pub fn from_hold(hold: &EscrowHold) -> Self {
        Self {
            event_id: EventId::new(),
            hold_id: hold.id,
            tenant_id: hold.tenant_id,
            payment_id: hold.payment_id,
            order_id: hold.order_id,
            supplier_id: hold.supplier_id,
            amount: hold.money.amount(),
            currency: hold.money.currency().to_string(),
            auto_release_date: hold.auto_release_date,
            occurred_at: Timestamp::now(),
        }
    }
}

/// Escrowed funds were released to the supplier's payout account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReleased {
    pub event_id: EventId,
    pub settlement_id: SettlementId,
    pub tenant_id: TenantId,
    pub hold_id: EscrowHoldId,
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub amount: Decimal,
    pub currency: String,

    /// "manual" or "auto", for downstream reporting.
    pub trigger: String,

    pub occurred_at: Timestamp,
}

domain_event!(
    SettlementReleased,
    event_type = "settlement.released.v1",
    aggregate_id = settlement_id,
    aggregate_type = "Settlement",
    occurred_at = occurred_at,
    event_id = event_id
);

impl SettlementReleased {
    pub fn from_settlement(
        settlement: &Settlement,
        order_id: OrderId,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            settlement_id: settlement.id,
            tenant_id: settlement.tenant_id,
            hold_id: settlement.escrow_hold_id,
            order_id,
            supplier_id: settlement.supplier_id,
            amount: settlement.money.amount(),
            currency: settlement.money.currency().to_string(),
            trigger: trigger.into(),
            occurred_at: Timestamp::now(),
        }
    }
}

/// A refund completed against a succeeded payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundIssued {
    pub event_id: EventId,
    pub refund_id: RefundId,
    pub tenant_id: TenantId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub refund_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    RefundIssued,
    event_type = "refund.issued.v1",
    aggregate_id = refund_id,
    aggregate_type = "Refund",
    occurred_at = occurred_at,
    event_id = event_id
);

impl RefundIssued {
    pub fn from_refund(refund: &Refund) -> Self {
        Self {
            event_id: EventId::new(),
            refund_id: refund.id,
            tenant_id: refund.tenant_id,
            payment_id: refund.payment_id,
            order_id: refund.order_id,
            refund_number: refund.refund_number.clone(),
            amount: refund.money.amount(),
            currency: refund.money.currency().to_string(),
            reason: refund.reason.clone(),
            occurred_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::payment::PaymentMode;
    use crate::domain::foundation::{ActorId, Currency, DomainEvent, Money};
    use crate::domain::foundation::SerializableDomainEvent;

    fn test_payment() -> Payment {
        Payment::new_pending(
            TenantId::new(),
            OrderId::new(),
            "pi_test_1",
            "mock",
            Money::new(Decimal::new(2500, 0), Currency::usd()).unwrap(),
            PaymentMode::Escrow,
            serde_json::json!({}),
        )
    }

    #[test]
    fn payment_succeeded_envelope_targets_payment_aggregate() {
        let payment = test_payment();
        let event = PaymentSucceeded::from_payment(&payment);
        let envelope = event.to_envelope();

        assert_eq!(envelope.event_type, "payment.succeeded.v1");
        assert_eq!(envelope.aggregate_type, "Payment");
        assert_eq!(envelope.aggregate_id, payment.id.to_string());
        assert_eq!(envelope.payload["currency"], "USD");
    }

    #[test]
    fn payment_failed_carries_reason() {
        let payment = test_payment();
        let event = PaymentFailed::from_payment(&payment, "card declined");
        assert_eq!(event.reason, "card declined");
        assert_eq!(event.event_type(), "payment.failed.v1");
    }

    #[test]
    fn escrow_held_copies_hold_fields() {
        let payment = test_payment();
        let hold = EscrowHold::new_pending(
            payment.tenant_id,
            payment.id,
            payment.order_id,
            SupplierId::new(),
            payment.money.clone(),
            14,
        );
        let event = EscrowHeld::from_hold(&hold);
        assert_eq!(event.hold_id, hold.id);
        assert_eq!(event.amount, Decimal::new(2500, 0));
        assert!(event.auto_release_date.is_some());
    }

    #[test]
    fn settlement_released_records_trigger() {
        let settlement = Settlement::new_pending(
            TenantId::new(),
            EscrowHoldId::new(),
            SupplierId::new(),
            crate::domain::foundation::PayoutAccountId::new(),
            Money::new(Decimal::new(100, 0), Currency::usd()).unwrap(),
        );
        let event = SettlementReleased::from_settlement(&settlement, OrderId::new(), "auto");
        assert_eq!(event.trigger, "auto");
        assert_eq!(event.event_type(), "settlement.released.v1");
    }

    #[test]
    fn refund_issued_copies_refund_number() {
        let refund = Refund::completed(
            TenantId::new(),
            PaymentId::new(),
            OrderId::new(),
            Money::new(Decimal::new(50, 0), Currency::usd()).unwrap(),
            "duplicate charge",
            "re_1",
            ActorId::new(),
        );
        let event = RefundIssued::from_refund(&refund);
        assert_eq!(event.refund_number, refund.refund_number);
        assert_eq!(event.event_type(), "refund.issued.v1");
    }
}
