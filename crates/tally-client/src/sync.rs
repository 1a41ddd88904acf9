//! Client-driven customer state synchronization.
//!
//! [`CustomerSync`] owns the single cached customer snapshot, exposes a
//! fetch/refresh primitive, and wraps each mutating billing operation so a
//! successful mutation is followed (by default) by one full refresh. The
//! cache is the only shared mutable state in the SDK; the synchronizer is
//! its sole writer, and all reads go through accessor methods returning
//! cloned snapshots.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

use crate::access::{self, AccessDecision};
use crate::client::BillingClient;
use crate::error::BillingError;
use crate::logger::BillingLogger;
use crate::types::*;

/// The cached customer snapshot.
///
/// Three states that must never be conflated: `Unknown` (no fetch has
/// completed yet), `Absent` (the backend explicitly reported no customer),
/// and `Present` (a snapshot was fetched).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CustomerData {
    #[default]
    Unknown,
    Absent,
    Present(Customer),
}

impl CustomerData {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The snapshot, if one is present.
    pub fn customer(&self) -> Option<&Customer> {
        match self {
            Self::Present(customer) => Some(customer),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CustomerState {
    data: CustomerData,
    is_loading: bool,
    error: Option<BillingError>,
}

/// Notification channel bumped whenever the cached snapshot is replaced.
///
/// Reactive consumers can await changes instead of polling the accessors.
#[derive(Clone)]
pub struct SyncBroadcast {
    sender: Arc<watch::Sender<u64>>,
    receiver: watch::Receiver<u64>,
}

impl SyncBroadcast {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(0u64);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    fn notify(&self) {
        let current = *self.sender.borrow();
        let _ = self.sender.send(current.wrapping_add(1));
    }

    /// Wait for the next snapshot update.
    pub async fn wait_for_update(&mut self) {
        let _ = self.receiver.changed().await;
    }

    /// Get a new receiver for this channel.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }
}

impl Default for SyncBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBroadcast")
            .field("version", &*self.sender.borrow())
            .finish()
    }
}

/// Host hook for browser-style navigation side effects.
///
/// Presence of an opener on [`SyncOptions`] is the "interactive client"
/// predicate: without one, URL-producing operations return their URL but
/// perform no navigation, which keeps them safe in server contexts.
pub trait UrlOpener: Send + Sync {
    /// Navigate the current context to `url`.
    fn navigate(&self, url: &str);

    /// Open `url` in a new browsing context.
    fn open_new(&self, url: &str);
}

/// Configuration for a synchronizer instance.
#[derive(Clone, Default)]
pub struct SyncOptions {
    /// Navigation hook; `None` means a non-interactive context.
    pub opener: Option<Arc<dyn UrlOpener>>,
    /// Invoked with the checkout URL when a checkout returns one.
    pub on_checkout_url: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    pub logger: BillingLogger,
}

impl std::fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOptions")
            .field("interactive", &self.opener.is_some())
            .field("logger", &self.logger)
            .finish()
    }
}

/// Client-driven customer synchronizer.
///
/// Construction leaves the cache `Unknown` with `is_loading == true`; call
/// [`CustomerSync::initialize`] to run the first fetch. Concurrent refreshes
/// are not serialized or de-duplicated — the cache reflects whichever fetch
/// completes last.
#[derive(Clone)]
pub struct CustomerSync {
    client: BillingClient,
    state: Arc<RwLock<CustomerState>>,
    broadcast: SyncBroadcast,
    options: SyncOptions,
}

impl CustomerSync {
    pub fn new(client: BillingClient) -> Self {
        Self::with_options(client, SyncOptions::default())
    }

    pub fn with_options(client: BillingClient, options: SyncOptions) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(CustomerState {
                data: CustomerData::Unknown,
                is_loading: true,
                error: None,
            })),
            broadcast: SyncBroadcast::new(),
            options,
        }
    }

    /// The underlying stateless client.
    pub fn client(&self) -> &BillingClient {
        &self.client
    }

    /// Get a reference to the snapshot broadcast channel.
    pub fn broadcast(&self) -> &SyncBroadcast {
        &self.broadcast
    }

    fn read(&self) -> RwLockReadGuard<'_, CustomerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CustomerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// The cached snapshot, if present.
    pub fn customer(&self) -> Option<Customer> {
        self.read().data.customer().cloned()
    }

    /// The full tri-state cache value.
    pub fn customer_data(&self) -> CustomerData {
        self.read().data.clone()
    }

    /// Whether a fetch is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    /// The error from the last failed fetch, if any.
    pub fn error(&self) -> Option<BillingError> {
        self.read().error.clone()
    }

    // ─── Fetch / refresh ────────────────────────────────────────────

    /// Run the initial fetch. Not retried automatically on failure; the
    /// error is stored in the cache state rather than returned.
    pub async fn initialize(&self) {
        self.refresh().await;
    }

    /// Re-fetch the customer snapshot and replace the cache wholesale.
    ///
    /// Callable at any time, including while another refresh is in flight;
    /// the last completion wins. A failed fetch leaves the cache `Absent`
    /// with the error stored, so the state is well-defined after failure.
    pub async fn refresh(&self) {
        {
            let mut state = self.write();
            state.is_loading = true;
        }

        let outcome = self.client.fetch_customer().await;

        {
            let mut state = self.write();
            match outcome {
                Ok(Some(customer)) => {
                    state.data = CustomerData::Present(customer);
                    state.error = None;
                }
                Ok(None) => {
                    state.data = CustomerData::Absent;
                    state.error = None;
                }
                Err(err) => {
                    self.options
                        .logger
                        .error(&format!("customer fetch failed: {}", err));
                    state.data = CustomerData::Absent;
                    state.error = Some(err);
                }
            }
            state.is_loading = false;
        }

        self.broadcast.notify();
    }

    async fn maybe_refresh(&self, options: Option<RefreshOptions>) {
        if options.unwrap_or_default().refetch {
            self.refresh().await;
        }
    }

    // ─── Local access check ─────────────────────────────────────────

    /// Synchronous, network-free access decision over the cached snapshot.
    ///
    /// `required_balance` defaults to 1. Never consumes usage.
    pub fn allowed(&self, feature_id: &str, required_balance: Option<i64>) -> AccessDecision {
        let state = self.read();
        access::evaluate(
            state.data.customer(),
            feature_id,
            required_balance.unwrap_or(1),
        )
    }

    // ─── Mutating operations ────────────────────────────────────────
    //
    // Shared shape: invoke, unwrap, then (unless suppressed) await one full
    // refresh before returning. A failed invoke propagates and skips the
    // refresh.

    /// Server-side access check. Mutating: may start a trial or consume a
    /// preview on the backend, so it refreshes by default.
    pub async fn check(
        &self,
        request: CheckRequest,
        options: Option<RefreshOptions>,
    ) -> Result<CheckResult, BillingError> {
        let result = self.client.check(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Track a usage delta.
    pub async fn track(
        &self,
        request: TrackRequest,
        options: Option<RefreshOptions>,
    ) -> Result<TrackResult, BillingError> {
        let result = self.client.track(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Start a checkout. If the provider returns a hosted payment URL and an
    /// `on_checkout_url` callback is configured, the callback is invoked
    /// with it before the refresh.
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
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Attach a product.
    pub async fn attach(
        &self,
        request: AttachRequest,
        options: Option<RefreshOptions>,
    ) -> Result<AttachResult, BillingError> {
        let result = self.client.attach(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Cancel an attached product.
    pub async fn cancel(
        &self,
        request: CancelRequest,
        options: Option<RefreshOptions>,
    ) -> Result<CancelResult, BillingError> {
        let result = self.client.cancel(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Create a sub-account entity.
    pub async fn create_entity(
        &self,
        request: CreateEntityRequest,
        options: Option<RefreshOptions>,
    ) -> Result<Entity, BillingError> {
        let result = self.client.create_entity(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Start a payment-method setup flow. In an interactive context the
    /// returned URL is navigated to.
    pub async fn setup_payment(
        &self,
        request: SetupPaymentRequest,
        options: Option<RefreshOptions>,
    ) -> Result<SetupPaymentResult, BillingError> {
        let result = self.client.setup_payment(request).await?;
        if let (Some(url), Some(opener)) = (result.url.as_deref(), self.options.opener.as_ref()) {
            opener.navigate(url);
        }
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Create a referral code.
    pub async fn create_referral_code(
        &self,
        request: CreateReferralCodeRequest,
        options: Option<RefreshOptions>,
    ) -> Result<ReferralCode, BillingError> {
        let result = self.client.create_referral_code(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    /// Redeem a referral code.
    pub async fn redeem_referral_code(
        &self,
        request: RedeemReferralCodeRequest,
        options: Option<RefreshOptions>,
    ) -> Result<RedeemResult, BillingError> {
        let result = self.client.redeem_referral_code(request).await?;
        self.maybe_refresh(options).await;
        Ok(result)
    }

    // ─── Read-only operations ───────────────────────────────────────

    /// Open the billing portal. In an interactive context the returned URL
    /// is opened in a new browsing context. Never refreshes.
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

    /// Fetch an entity by identifier. Never refreshes.
    pub async fn get_entity(&self, entity_id: &str) -> Result<Entity, BillingError> {
        self.client.get_entity(entity_id).await
    }

    /// List available products. Never refreshes.
    pub async fn list_products(&self) -> Result<ProductList, BillingError> {
        self.client.list_products().await
    }

    /// Set a feature's usage to an absolute value.
    ///
    /// Takes no refresh option: unlike [`CustomerSync::track`], this
    /// admin-style write never refetches the cached customer, so the cache
    /// is stale until [`CustomerSync::refresh`] is called explicitly.
    pub async fn usage(&self, request: UsageRequest) -> Result<serde_json::Value, BillingError> {
        self.client.usage(request).await
    }

    /// Run an analytics query. Never refreshes.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResult, BillingError> {
        self.client.query(request).await
    }
}

impl std::fmt::Debug for CustomerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("CustomerSync")
            .field("data", &state.data)
            .field("is_loading", &state.is_loading)
            .field("has_error", &state.error.is_some())
            .finish()
    }
}
