//! Foundation value objects shared across the billing domain.

mod errors;
mod events;
mod ids;
mod money;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{
    ActorId, EscrowHoldId, OrderId, PaymentId, PayoutAccountId, RefundId, SettlementId,
    SupplierId, TenantId,
};
pub use money::{Currency, Money};
pub use timestamp::Timestamp;
