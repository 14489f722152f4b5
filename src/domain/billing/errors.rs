//! Billing-specific error types.
//!
//! Errors related to payment collection, escrow release, and refunds.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | PaymentNotFound | 404 |
//! | HoldNotFound | 404 |
//! | BlockedByDispute | 409 |
//! | NotReleasable | 409 |
//! | NotRefundable | 409 |
//! | RefundExceedsBalance | 422 |
//! | StateConflict | 409 |
//! | NoDefaultPayoutAccount | 422 |
//! | GatewayFailed | 502 |
//! | InvalidWebhookSignature | 401 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, EscrowHoldId, PaymentId, SettlementId, SupplierId, ValidationError,
};

use super::escrow_hold::HoldStatus;
use super::payment::PaymentStatus;

/// Billing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Payment was not found in this tenant.
    PaymentNotFound(PaymentId),

    /// No payment carries this provider intent reference.
    PaymentNotFoundByIntentRef(String),

    /// Escrow hold was not found in this tenant.
    HoldNotFound(EscrowHoldId),

    /// Settlement was not found in this tenant.
    SettlementNotFound(SettlementId),

    /// Release is illegal while a dispute blocks the hold.
    BlockedByDispute(EscrowHoldId),

    /// Hold is not in a releasable status.
    NotReleasable {
        hold_id: EscrowHoldId,
        current: HoldStatus,
    },

    /// Refunds only apply to succeeded payments.
    NotRefundable {
        payment_id: PaymentId,
        current: PaymentStatus,
    },

    /// Requested refund would push the refunded total past the paid amount.
    RefundExceedsBalance {
        payment_id: PaymentId,
        requested: String,
        available: String,
    },

    /// A concurrent writer moved the record to a conflicting state first.
    StateConflict {
        current: String,
        attempted: String,
    },

    /// Supplier has no default payout account; settlement cannot proceed.
    NoDefaultPayoutAccount(SupplierId),

    /// Payment gateway call failed.
    GatewayFailed {
        reason: String,
    },

    /// Webhook signature verification failed.
    InvalidWebhookSignature,

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn payment_not_found(id: PaymentId) -> Self {
        BillingError::PaymentNotFound(id)
    }

    pub fn payment_not_found_by_intent_ref(intent_ref: impl Into<String>) -> Self {
        BillingError::PaymentNotFoundByIntentRef(intent_ref.into())
    }

    pub fn hold_not_found(id: EscrowHoldId) -> Self {
        BillingError::HoldNotFound(id)
    }

    pub fn settlement_not_found(id: SettlementId) -> Self {
        BillingError::SettlementNotFound(id)
    }

    pub fn blocked_by_dispute(id: EscrowHoldId) -> Self {
        BillingError::BlockedByDispute(id)
    }

    pub fn not_releasable(hold_id: EscrowHoldId, current: HoldStatus) -> Self {
        BillingError::NotReleasable { hold_id, current }
    }

    pub fn not_refundable(payment_id: PaymentId, current: PaymentStatus) -> Self {
        BillingError::NotRefundable {
            payment_id,
            current,
        }
    }

    pub fn refund_exceeds_balance(
        payment_id: PaymentId,
        requested: impl Into<String>,
        available: impl Into<String>,
    ) -> Self {
        BillingError::RefundExceedsBalance {
            payment_id,
            requested: requested.into(),
            available: available.into(),
        }
    }

    pub fn state_conflict(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        BillingError::StateConflict {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn no_default_payout_account(supplier_id: SupplierId) -> Self {
        BillingError::NoDefaultPayoutAccount(supplier_id)
    }

    pub fn gateway_failed(reason: impl Into<String>) -> Self {
        BillingError::GatewayFailed {
            reason: reason.into(),
        }
    }

    pub fn invalid_webhook_signature() -> Self {
        BillingError::InvalidWebhookSignature
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::PaymentNotFound(_) | BillingError::PaymentNotFoundByIntentRef(_) => {
                ErrorCode::PaymentNotFound
            }
            BillingError::HoldNotFound(_) => ErrorCode::EscrowHoldNotFound,
            BillingError::SettlementNotFound(_) => ErrorCode::SettlementNotFound,
            BillingError::BlockedByDispute(_) => ErrorCode::EscrowBlockedByDispute,
            BillingError::NotReleasable { .. } => ErrorCode::EscrowNotReleasable,
            BillingError::NotRefundable { .. } => ErrorCode::PaymentNotRefundable,
            BillingError::RefundExceedsBalance { .. } => ErrorCode::RefundExceedsBalance,
            BillingError::StateConflict { .. } => ErrorCode::InvalidStateTransition,
            BillingError::NoDefaultPayoutAccount(_) => ErrorCode::PayoutAccountNotFound,
            BillingError::GatewayFailed { .. } => ErrorCode::GatewayError,
            BillingError::InvalidWebhookSignature => ErrorCode::InvalidWebhookSignature,
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::PaymentNotFound(id) => format!("Payment not found: {}", id),
            BillingError::PaymentNotFoundByIntentRef(intent_ref) => {
                format!("No payment found for intent reference: {}", intent_ref)
            }
            BillingError::HoldNotFound(id) => format!("Escrow hold not found: {}", id),
            BillingError::SettlementNotFound(id) => format!("Settlement not found: {}", id),
            BillingError::BlockedByDispute(id) => {
                format!("Escrow hold {} is blocked by an open dispute", id)
            }
            BillingError::NotReleasable { hold_id, current } => {
                format!(
                    "Escrow hold {} cannot be released from status '{}'",
                    hold_id, current
                )
            }
            BillingError::NotRefundable {
                payment_id,
                current,
            } => format!(
                "Payment {} cannot be refunded in status '{}'",
                payment_id, current
            ),
            BillingError::RefundExceedsBalance {
                payment_id,
                requested,
                available,
            } => format!(
                "Refund of {} exceeds remaining balance {} on payment {}",
                requested, available, payment_id
            ),
            BillingError::StateConflict { current, attempted } => {
                format!(
                    "Cannot apply '{}': record already moved to '{}'",
                    attempted, current
                )
            }
            BillingError::NoDefaultPayoutAccount(supplier_id) => {
                format!("Supplier {} has no default payout account", supplier_id)
            }
            BillingError::GatewayFailed { reason } => {
                format!("Payment gateway call failed: {}", reason)
            }
            BillingError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::Infrastructure(_) | BillingError::GatewayFailed { .. }
        )
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => BillingError::ValidationFailed {
                field,
                message: "cannot be empty".to_string(),
            },
            ValidationError::InvalidFormat { field, reason } => BillingError::ValidationFailed {
                field,
                message: reason,
            },
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                BillingError::ValidationFailed {
                    field: err
                        .details
                        .get("field")
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            ErrorCode::GatewayError => BillingError::GatewayFailed {
                reason: err.message,
            },
            ErrorCode::InvalidWebhookSignature => BillingError::InvalidWebhookSignature,
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_by_dispute_creates_correctly() {
        let id = EscrowHoldId::new();
        let err = BillingError::blocked_by_dispute(id);
        assert!(matches!(err, BillingError::BlockedByDispute(i) if i == id));
        assert_eq!(err.code(), ErrorCode::EscrowBlockedByDispute);
    }

    #[test]
    fn not_releasable_carries_current_status() {
        let id = EscrowHoldId::new();
        let err = BillingError::not_releasable(id, HoldStatus::Released);
        assert!(matches!(
            err,
            BillingError::NotReleasable { current: HoldStatus::Released, .. }
        ));
        assert_eq!(err.code(), ErrorCode::EscrowNotReleasable);
    }

    #[test]
    fn refund_exceeds_balance_message_includes_amounts() {
        let err =
            BillingError::refund_exceeds_balance(PaymentId::new(), "150.00", "100.00");
        let msg = err.message();
        assert!(msg.contains("150.00"));
        assert!(msg.contains("100.00"));
        assert_eq!(err.code(), ErrorCode::RefundExceedsBalance);
    }

    #[test]
    fn state_conflict_message_names_both_states() {
        let err = BillingError::state_conflict("failed", "succeeded");
        let msg = err.message();
        assert!(msg.contains("failed"));
        assert!(msg.contains("succeeded"));
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn infrastructure_and_gateway_errors_are_retryable() {
        assert!(BillingError::infrastructure("timeout").is_retryable());
        assert!(BillingError::gateway_failed("connection reset").is_retryable());
        assert!(!BillingError::invalid_webhook_signature().is_retryable());
        assert!(!BillingError::hold_not_found(EscrowHoldId::new()).is_retryable());
    }

    #[test]
    fn display_matches_message() {
        let err = BillingError::payment_not_found(PaymentId::new());
        assert_eq!(format!("{}", err), err.message());
    }

    #[test]
    fn converts_to_domain_error() {
        let err = BillingError::no_default_payout_account(SupplierId::new());
        let domain_err: DomainError = err.clone().into();
        assert_eq!(domain_err.code, err.code());
    }

    #[test]
    fn validation_domain_error_converts_with_field_detail() {
        let domain_err = DomainError::validation("amount", "must be positive");
        let err: BillingError = domain_err.into();
        assert!(matches!(
            err,
            BillingError::ValidationFailed { ref field, .. } if field == "amount"
        ));
    }
}
