//! Stateless typed client for the billing operations.
//!
//! `BillingClient` owns an [`ActionInvoker`] and exposes one method per
//! remote operation. Every call goes through the same path: serialize the
//! request, invoke, deserialize the envelope, unwrap. State synchronization
//! lives one layer up, in [`crate::sync::CustomerSync`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::OperationEnvelope;
use crate::error::BillingError;
use crate::invoker::{ops, ActionInvoker, HttpActionInvoker, InvokerOptions};
use crate::types::*;

/// Typed async client for the billing backend.
#[derive(Clone)]
pub struct BillingClient {
    invoker: Arc<dyn ActionInvoker>,
}

impl BillingClient {
    /// Create a client over an arbitrary invoker.
    pub fn new(invoker: Arc<dyn ActionInvoker>) -> Self {
        Self { invoker }
    }

    /// Create a client over the default HTTP invoker.
    pub fn http(options: InvokerOptions) -> Self {
        Self::new(Arc::new(HttpActionInvoker::new(options)))
    }

    /// Get the underlying invoker.
    pub fn invoker(&self) -> &Arc<dyn ActionInvoker> {
        &self.invoker
    }

    /// Invoke an operation and unwrap its envelope.
    async fn call<B, T>(&self, operation: &str, body: &B) -> Result<T, BillingError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let args = serde_json::to_value(body)
            .map_err(|e| BillingError::Deserialization(format!("invalid request: {}", e)))?;
        let raw = self.invoker.invoke(operation, args).await?;
        let envelope: OperationEnvelope<T> = serde_json::from_value(raw)
            .map_err(|e| BillingError::Deserialization(format!("invalid envelope: {}", e)))?;
        envelope.into_result()
    }

    // ─── Customer ───────────────────────────────────────────────────

    /// Fetch (or create on first contact) the authenticated customer.
    ///
    /// `Ok(None)` is the explicit "no billing record" result, distinct from
    /// an error.
    pub async fn fetch_customer(&self) -> Result<Option<Customer>, BillingError> {
        self.fetch_customer_with(&CustomerFetchRequest::default())
            .await
    }

    /// Fetch the customer with explicit parameters (e.g. expansions).
    pub async fn fetch_customer_with(
        &self,
        request: &CustomerFetchRequest,
    ) -> Result<Option<Customer>, BillingError> {
        let resp: CustomerResponse = self.call(ops::CUSTOMERS_CREATE, request).await?;
        Ok(resp.customer)
    }

    // ─── Access and usage ───────────────────────────────────────────

    /// Server-side feature or product access check.
    pub async fn check(&self, request: CheckRequest) -> Result<CheckResult, BillingError> {
        self.call(ops::CHECK, &request).await
    }

    /// Track a usage delta against a feature.
    pub async fn track(&self, request: TrackRequest) -> Result<TrackResult, BillingError> {
        self.call(ops::TRACK, &request).await
    }

    /// Set a feature's usage to an absolute value.
    pub async fn usage(&self, request: UsageRequest) -> Result<serde_json::Value, BillingError> {
        self.call(ops::USAGE, &request).await
    }

    /// Run an analytics query over usage events.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResult, BillingError> {
        self.call(ops::QUERY, &request).await
    }

    // ─── Purchases ──────────────────────────────────────────────────

    /// Start a checkout for a product.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, BillingError> {
        self.call(ops::CHECKOUT, &request).await
    }

    /// Attach a product to the customer.
    pub async fn attach(&self, request: AttachRequest) -> Result<AttachResult, BillingError> {
        self.call(ops::ATTACH, &request).await
    }

    /// Cancel an attached product.
    pub async fn cancel(&self, request: CancelRequest) -> Result<CancelResult, BillingError> {
        self.call(ops::CANCEL, &request).await
    }

    /// Get a billing portal URL for the customer.
    pub async fn billing_portal(
        &self,
        request: BillingPortalRequest,
    ) -> Result<BillingPortalResult, BillingError> {
        self.call(ops::BILLING_PORTAL, &request).await
    }

    /// Start a payment-method setup flow.
    pub async fn setup_payment(
        &self,
        request: SetupPaymentRequest,
    ) -> Result<SetupPaymentResult, BillingError> {
        self.call(ops::SETUP_PAYMENT, &request).await
    }

    /// List the products available for purchase.
    pub async fn list_products(&self) -> Result<ProductList, BillingError> {
        self.call(ops::PRODUCTS_LIST, &serde_json::json!({})).await
    }

    // ─── Entities ───────────────────────────────────────────────────

    /// Create a sub-account entity.
    pub async fn create_entity(
        &self,
        request: CreateEntityRequest,
    ) -> Result<Entity, BillingError> {
        self.call(ops::ENTITIES_CREATE, &request).await
    }

    /// Fetch an entity by identifier.
    pub async fn get_entity(&self, entity_id: &str) -> Result<Entity, BillingError> {
        self.call(ops::ENTITIES_GET, &serde_json::json!({ "entityId": entity_id }))
            .await
    }

    // ─── Referrals ──────────────────────────────────────────────────

    /// Create a referral code for the customer.
    pub async fn create_referral_code(
        &self,
        request: CreateReferralCodeRequest,
    ) -> Result<ReferralCode, BillingError> {
        self.call(ops::REFERRALS_CREATE_CODE, &request).await
    }

    /// Redeem a referral code.
    pub async fn redeem_referral_code(
        &self,
        request: RedeemReferralCodeRequest,
    ) -> Result<RedeemResult, BillingError> {
        self.call(ops::REFERRALS_REDEEM_CODE, &request).await
    }
}

impl std::fmt::Debug for BillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingClient").finish()
    }
}
