//! Strongly-typed identifier value objects.
//!
//! Every entity in the ledger is addressed by its own id newtype so that a
//! payment id can never be passed where an escrow hold id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifier of the tenant that owns a ledger entity. Every query is
    /// scoped by this id; cross-tenant access is unrepresentable.
    TenantId
);

define_id!(
    /// Unique identifier for a payment attempt.
    PaymentId
);

define_id!(
    /// Unique identifier for an escrow hold.
    EscrowHoldId
);

define_id!(
    /// Unique identifier for a settlement.
    SettlementId
);

define_id!(
    /// Unique identifier for a refund.
    RefundId
);

define_id!(
    /// Identifier of the purchase order a payment collects funds for.
    /// Owned by the procurement service; opaque here.
    OrderId
);

define_id!(
    /// Identifier of the supplier whose funds are held in escrow.
    SupplierId
);

define_id!(
    /// Identifier of a supplier payout destination.
    PayoutAccountId
);

define_id!(
    /// Identifier of the user who triggered an operation (release, refund).
    ActorId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(PaymentId::new(), PaymentId::new());
        assert_ne!(TenantId::new(), TenantId::new());
    }

    #[test]
    fn id_round_trips_through_string() {
        let id = EscrowHoldId::new();
        let parsed: EscrowHoldId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn id_rejects_malformed_string() {
        assert!("not-a-uuid".parse::<RefundId>().is_err());
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = SupplierId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = OrderId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }
}
