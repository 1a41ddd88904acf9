//! Local, synchronous feature-access decisions.
//!
//! [`evaluate`] never calls the network and never consumes usage — it exists
//! so UI can gate affordances instantly from the cached snapshot, without
//! waiting on a round trip.

use crate::types::Customer;

/// Outcome of a local access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// The deny reason, if access was denied.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed => None,
            Self::Denied { reason } => Some(reason),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }
}

/// Decide feature access from a cached snapshot.
///
/// Total: every combination of snapshot state and inputs yields exactly one
/// decision and never panics. A missing snapshot (not yet fetched, or no
/// billing record) denies; an unlimited or not-yet-computed balance allows.
pub fn evaluate(
    customer: Option<&Customer>,
    feature_id: &str,
    required_balance: i64,
) -> AccessDecision {
    let customer = match customer {
        Some(customer) => customer,
        None => return AccessDecision::deny("No customer data"),
    };

    let feature = match customer.features.get(feature_id) {
        Some(feature) => feature,
        None => return AccessDecision::deny(format!("Feature {} not found", feature_id)),
    };

    if feature.unlimited {
        return AccessDecision::Allowed;
    }

    match feature.balance {
        Some(balance) if balance < required_balance => AccessDecision::deny(format!(
            "Insufficient balance: {} < {}",
            balance, required_balance
        )),
        _ => AccessDecision::Allowed,
    }
}
