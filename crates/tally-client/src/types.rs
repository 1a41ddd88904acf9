//! Request and response types for the billing operations.
//!
//! Wire names are camelCase to match the provider's API. Every request and
//! most responses carry a flattened `extra` map so provider-specific fields
//! survive round trips without being blended into the typed fields.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Customer snapshot ──────────────────────────────────────────────

/// Usage type of a billable feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    #[default]
    Continuous,
    SingleUse,
}

/// A named billable capability's current consumption state.
///
/// `balance: None` means the balance is unlimited or not yet computed —
/// deliberately distinct from a numeric zero. The `unlimited` flag is the
/// provider's explicit signal; either form satisfies any access check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFeature {
    pub id: String,
    #[serde(rename = "type", default)]
    pub usage_type: FeatureType,
    pub balance: Option<i64>,
    #[serde(default)]
    pub unlimited: bool,
    pub included_usage: Option<i64>,
    /// Renewal interval, e.g. `"month"`.
    pub interval: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A product attached to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProduct {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A sub-account scope for multi-tenant billing (e.g. a workspace).
///
/// Entities are created explicitly and fetched on demand by identifier;
/// they are not cached centrally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: Option<String>,
    pub customer_id: Option<String>,
    #[serde(default)]
    pub features: HashMap<String, CustomerFeature>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The authenticated party's billing state as last known to the client.
///
/// Replaced wholesale on every successful refresh, never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub products: Vec<CustomerProduct>,
    #[serde(default)]
    pub features: HashMap<String, CustomerFeature>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Provider-specific account identifier.
    pub processor_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Parameters for the customer fetch operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFetchRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expand: Vec<String>,
}

/// Payload of the customer fetch operation.
///
/// `customer: None` is the explicit "no billing record" signal — distinct
/// from an empty envelope, which is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer: Option<Customer>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

// ─── Refresh policy ─────────────────────────────────────────────────

/// Per-call policy controlling whether a cache refresh is triggered after
/// a mutating operation completes successfully. Defaults to refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOptions {
    pub refetch: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self { refetch: true }
    }
}

impl RefreshOptions {
    /// Suppress the post-mutation refresh.
    pub fn no_refetch() -> Self {
        Self { refetch: false }
    }
}

// ─── Operation requests and responses ───────────────────────────────

/// Request body for the feature-access check operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_balance: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CheckRequest {
    /// Check access to a feature by identifier.
    pub fn feature(feature_id: impl Into<String>) -> Self {
        Self {
            feature_id: Some(feature_id.into()),
            ..Default::default()
        }
    }

    /// Check access to a product by identifier.
    pub fn product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Default::default()
        }
    }
}

/// Result of the server-side access check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub allowed: bool,
    pub feature_id: Option<String>,
    pub balance: Option<i64>,
    /// Opaque upgrade/paywall preview payload, when the provider returns one.
    pub preview: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the usage tracking operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub feature_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TrackRequest {
    /// Track `value` units of usage against a feature.
    pub fn new(feature_id: impl Into<String>, value: i64) -> Self {
        Self {
            feature_id: feature_id.into(),
            value: Some(value),
            entity_id: None,
            event_name: None,
            extra: HashMap::new(),
        }
    }
}

/// Result of the usage tracking operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResult {
    pub id: Option<String>,
    pub feature_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the checkout operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CheckoutRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            entity_id: None,
            success_url: None,
            extra: HashMap::new(),
        }
    }
}

/// Result of the checkout operation. `url` is present when the provider
/// requires a hosted payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub url: Option<String>,
    pub customer_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the product attach operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_checkout: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl AttachRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            entity_id: None,
            force_checkout: None,
            extra: HashMap::new(),
        }
    }
}

/// Result of the attach operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachResult {
    pub checkout_url: Option<String>,
    pub message: Option<String>,
    /// Opaque preview payload, when the provider returns one.
    pub preview: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the cancel operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_immediately: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CancelRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            entity_id: None,
            cancel_immediately: None,
            extra: HashMap::new(),
        }
    }
}

/// Result of the cancel operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    pub success: Option<bool>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the billing portal operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPortalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Result of the billing portal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPortalResult {
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for the entity creation operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CreateEntityRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            feature_id: None,
            extra: HashMap::new(),
        }
    }
}

/// Request body for the payment setup operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Result of the payment setup operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupPaymentResult {
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for referral code creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReferralCodeRequest {
    pub program_id: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A referral code issued to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCode {
    pub code: String,
    pub customer_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Request body for referral code redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemReferralCodeRequest {
    pub code: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Result of referral code redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResult {
    pub id: Option<String>,
    pub customer_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A purchasable product definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// List payload returned by the product listing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub list: Vec<Product>,
}

/// Request body for the absolute usage-set operation.
///
/// Unlike [`TrackRequest`], `value` here is an absolute balance write, not a
/// delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRequest {
    pub feature_id: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UsageRequest {
    pub fn new(feature_id: impl Into<String>, value: i64) -> Self {
        Self {
            feature_id: feature_id.into(),
            value,
            entity_id: None,
            extra: HashMap::new(),
        }
    }
}

/// Request body for the analytics query operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Result of the analytics query operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub list: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
