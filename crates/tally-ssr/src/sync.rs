//! Externally-driven customer synchronization.
//!
//! [`ServerCustomerSync`] never fetches the customer itself. It mirrors
//! state produced by the host's server-side load step: the host calls
//! [`ServerCustomerSync::resync`] with the current server state before each
//! render pass, and mutations ask the host to rerun the load step through
//! the [`Invalidator`] instead of refetching.
//!
//! There is no loading or error surface here: the cache is populated from
//! data computed before first render, so the only client-observable latency
//! is post-mutation, which callers handle per operation.

use std::sync::{Arc, PoisonError, RwLock};

use tally_client::access::{self, AccessDecision};
use tally_client::{
    AttachRequest, AttachResult, BillingClient, BillingError, BillingPortalRequest,
    BillingPortalResult, CancelRequest, CancelResult, CheckRequest, CheckResult, CheckoutRequest,
    CheckoutResult, CreateEntityRequest, CreateReferralCodeRequest, Customer, Entity, ProductList,
    QueryRequest, QueryResult, RedeemReferralCodeRequest, RedeemResult, ReferralCode,
    RefreshOptions, SetupPaymentRequest, SetupPaymentResult, SyncOptions, TrackRequest,
    TrackResult, UsageRequest,
};

use crate::invalidate::{Invalidator, CUSTOMER_DEP_KEY};

/// Customer synchronizer mirroring externally supplied server state.
#[derive(Clone)]
pub struct ServerCustomerSync {
    client: BillingClient,
    invalidator: Arc<dyn Invalidator>,
    customer: Arc<RwLock<Option<Customer>>>,
    options: SyncOptions,
}

impl ServerCustomerSync {
    /// Create a synchronizer seeded from pre-fetched server state.
    pub fn new(
        client: BillingClient,
        invalidator: Arc<dyn Invalidator>,
        initial: Option<Customer>,
    ) -> Self {
        Self::with_options(client, invalidator, initial, SyncOptions::default())
    }

    pub fn with_options(
        client: BillingClient,
        invalidator: Arc<dyn Invalidator>,
        initial: Option<Customer>,
        options: SyncOptions,
    ) -> Self {
        Self {
            client,
            invalidator,
            customer: Arc::new(RwLock::new(initial)),
            options,
        }
    }

    /// The underlying stateless client.
    pub fn client(&self) -> &BillingClient {
        &self.client
    }

    fn slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Customer>> {
        self.customer.read().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── State mirroring ────────────────────────────────────────────

    /// Replace the cached value with the host's current server state.
    ///
    /// Call this before using the cache in a render pass; the cache is a
    /// pure mirror and goes stale the moment the server load step reruns.
    pub fn resync(&self, server_state: Option<Customer>) {
        *self
            .customer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = server_state;
    }

    /// The mirrored snapshot, if the server state held one.
    pub fn customer(&self) -> Option<Customer> {
        self.slot().clone()
    }

    /// Ask the host to rerun the server load step.
    pub fn refresh(&self) {
        self.invalidator.invalidate(CUSTOMER_DEP_KEY);
    }

    fn maybe_invalidate(&self, options: Option<RefreshOptions>) {
        if options.unwrap_or_default().refetch {
            self.refresh();
        }
    }

    // ─── Local access check ─────────────────────────────────────────

    /// Synchronous, network-free access decision over the mirrored
    /// snapshot. `required_balance` defaults to 1.
    pub fn allowed(&self, feature_id: &str, required_balance: Option<i64>) -> AccessDecision {
        access::evaluate(
            self.slot().as_ref(),
            feature_id,
            required_balance.unwrap_or(1),
        )
    }

    // ─── Mutating operations ────────────────────────────────────────
    //
    // Same call shapes as the client-driven synchronizer, but success
    // signals the invalidator rather than fetching; the cache updates
    // asynchronously once the host reruns the load step and resyncs.

    pub async fn check(
        &self,
        request: CheckRequest,
        options: Option<RefreshOptions>,
    ) -> Result<CheckResult, BillingError> {
        let result = self.client.check(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn track(
        &self,
        request: TrackRequest,
        options: Option<RefreshOptions>,
    ) -> Result<TrackResult, BillingError> {
        let result = self.client.track(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        options: Option<RefreshOptions>,
    ) -> Result<CheckoutResult, BillingError> {
        let result = self.client.checkout(request).await?;
        if let (Some(url), Some(callback)) =
            (result.url.as_deref(), self.options.on_checkout_url.as_ref())
        {
            callback(url);
        }
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn attach(
        &self,
        request: AttachRequest,
        options: Option<RefreshOptions>,
    ) -> Result<AttachResult, BillingError> {
        let result = self.client.attach(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn cancel(
        &self,
        request: CancelRequest,
        options: Option<RefreshOptions>,
    ) -> Result<CancelResult, BillingError> {
        let result = self.client.cancel(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn create_entity(
        &self,
        request: CreateEntityRequest,
        options: Option<RefreshOptions>,
    ) -> Result<Entity, BillingError> {
        let result = self.client.create_entity(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn setup_payment(
        &self,
        request: SetupPaymentRequest,
        options: Option<RefreshOptions>,
    ) -> Result<SetupPaymentResult, BillingError> {
        let result = self.client.setup_payment(request).await?;
        if let (Some(url), Some(opener)) = (result.url.as_deref(), self.options.opener.as_ref()) {
            opener.navigate(url);
        }
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn create_referral_code(
        &self,
        request: CreateReferralCodeRequest,
        options: Option<RefreshOptions>,
    ) -> Result<ReferralCode, BillingError> {
        let result = self.client.create_referral_code(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    pub async fn redeem_referral_code(
        &self,
        request: RedeemReferralCodeRequest,
        options: Option<RefreshOptions>,
    ) -> Result<RedeemResult, BillingError> {
        let result = self.client.redeem_referral_code(request).await?;
        self.maybe_invalidate(options);
        Ok(result)
    }

    // ─── Read-only operations ───────────────────────────────────────

    /// Open the billing portal. Never invalidates.
    pub async fn billing_portal(
        &self,
        request: BillingPortalRequest,
    ) -> Result<BillingPortalResult, BillingError> {
        let result = self.client.billing_portal(request).await?;
        if let (Some(url), Some(opener)) = (result.url.as_deref(), self.options.opener.as_ref()) {
            opener.open_new(url);
        }
        Ok(result)
    }

    /// Fetch an entity by identifier. Never invalidates.
    pub async fn get_entity(&self, entity_id: &str) -> Result<Entity, BillingError> {
        self.client.get_entity(entity_id).await
    }

    /// List available products. Never invalidates.
    pub async fn list_products(&self) -> Result<ProductList, BillingError> {
        self.client.list_products().await
    }

    /// Set a feature's usage to an absolute value.
    ///
    /// Takes no refresh option: like the client-driven variant, this
    /// admin-style write never invalidates, so the mirror is stale until
    /// the host reruns the load step.
    pub async fn usage(&self, request: UsageRequest) -> Result<serde_json::Value, BillingError> {
        self.client.usage(request).await
    }

    /// Run an analytics query. Never invalidates.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResult, BillingError> {
        self.client.query(request).await
    }
}

impl std::fmt::Debug for ServerCustomerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCustomerSync")
            .field("has_customer", &self.slot().is_some())
            .finish()
    }
}
