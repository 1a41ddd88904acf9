//! The remote action invoker boundary.
//!
//! [`ActionInvoker`] is the seam between the SDK and whatever executes the
//! named billing operations. It must not fail for business-level errors —
//! those arrive in the error arm of the returned envelope — and may only
//! fail for transport-level problems.
//!
//! [`HttpActionInvoker`] is the default implementation, posting JSON to
//! `{base_url}{base_path}/{operation}`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BillingError;

/// Operation references understood by the billing backend.
///
/// Exposed so invoker test doubles and custom backends can key on them.
pub mod ops {
    pub const CUSTOMERS_CREATE: &str = "customers/create";
    pub const CHECK: &str = "check";
    pub const TRACK: &str = "track";
    pub const CHECKOUT: &str = "checkout";
    pub const ATTACH: &str = "attach";
    pub const CANCEL: &str = "cancel";
    pub const USAGE: &str = "usage";
    pub const QUERY: &str = "query";
    pub const BILLING_PORTAL: &str = "customers/billing-portal";
    pub const ENTITIES_CREATE: &str = "entities/create";
    pub const ENTITIES_GET: &str = "entities/get";
    pub const PRODUCTS_LIST: &str = "products/list";
    pub const SETUP_PAYMENT: &str = "setup-payment";
    pub const REFERRALS_CREATE_CODE: &str = "referrals/create-code";
    pub const REFERRALS_REDEEM_CODE: &str = "referrals/redeem-code";
}

/// Executes a named remote billing operation.
///
/// The `Ok` value is the raw operation envelope as JSON; callers unwrap it
/// through [`crate::envelope::OperationEnvelope`]. `Err` is reserved for
/// transport failures.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(
        &self,
        operation: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, BillingError>;
}

/// Configuration for the default HTTP invoker.
#[derive(Debug, Clone)]
pub struct InvokerOptions {
    /// Base URL of the billing backend (e.g. `https://my-app.com`).
    pub base_url: String,

    /// Base path for billing endpoints (default: `/api/billing`).
    pub base_path: String,

    /// Optional static Bearer token sent on every request.
    pub auth_token: Option<String>,

    /// HTTP request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Default for InvokerOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            base_path: "/api/billing".to_string(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

/// Default [`ActionInvoker`] posting JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpActionInvoker {
    http: reqwest::Client,
    base_url: String,
}

impl HttpActionInvoker {
    /// Create an invoker with the given options.
    pub fn new(options: InvokerOptions) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = options.auth_token {
            if let Ok(val) = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let base_url = format!(
            "{}{}",
            options.base_url.trim_end_matches('/'),
            options.base_path
        );

        Self { http, base_url }
    }

    /// Wrap the invoker for use by the client.
    pub fn shared(options: InvokerOptions) -> Arc<dyn ActionInvoker> {
        Arc::new(Self::new(options))
    }

    /// Get the full base URL (base_url + base_path).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }
}

#[async_trait]
impl ActionInvoker for HttpActionInvoker {
    async fn invoke(
        &self,
        operation: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, BillingError> {
        let resp = self
            .http
            .post(self.url(operation))
            .json(&args)
            .send()
            .await
            .map_err(BillingError::transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(BillingError::transport)?;

        // An empty body unwraps downstream as the NO_DATA error.
        if body.trim().is_empty() || body == "null" {
            return Ok(serde_json::json!({}));
        }

        match serde_json::from_str::<serde_json::Value>(&body) {
            // Business failures come back envelope-shaped even on non-2xx
            // statuses; hand the envelope through unchanged.
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(BillingError::Api {
                code: status_label(status.as_u16()).to_string(),
                message: body,
                status: Some(status.as_u16()),
            }),
            Err(e) => Err(BillingError::Deserialization(format!(
                "invalid response body: {}",
                e
            ))),
        }
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        400 => "BAD_REQUEST",
        401 => "UNAUTHORIZED",
        403 => "FORBIDDEN",
        404 => "NOT_FOUND",
        429 => "RATE_LIMITED",
        _ => "INTERNAL_SERVER_ERROR",
    }
}
