//! PayoutAccount - destination for settled and direct funds.
//!
//! Accounts are provisioned by an onboarding flow outside this service; the
//! billing domain only reads them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PayoutAccountId, SupplierId, TenantId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutAccountStatus {
    Active,
    Suspended,
}

impl PayoutAccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutAccountStatus::Active => "active",
            PayoutAccountStatus::Suspended => "suspended",
        }
    }
}

/// A supplier's registered destination for payouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub id: PayoutAccountId,
    pub tenant_id: TenantId,
    pub supplier_id: SupplierId,

    /// Provider-side account reference ("acct_..." for Stripe).
    pub provider_account_ref: String,

    pub status: PayoutAccountStatus,

    /// At most one default account per supplier; settlements target it.
    pub is_default: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PayoutAccount {
    pub fn is_active(&self) -> bool {
        self.status == PayoutAccountStatus::Active
    }
}
