//! Server-side customer loading.
//!
//! The load step that runs before first render. "No session" is an
//! expected condition here, not an exceptional one: the backend reports it
//! as a business error with a recognizable message, and this helper
//! converts it to `None` instead of propagating. Genuine backend failures
//! are logged and also surfaced as `None`, so a render pass always has a
//! well-defined (possibly absent) customer.

use tally_client::{BillingClient, BillingError, BillingLogger, Customer};

/// Message fragment the backend uses when the identity resolver reports no
/// session.
pub const NO_IDENTITY_MARKER: &str = "no customer identifier found";

/// Returns `true` if the error is the backend's "unauthenticated" signal.
pub fn is_unauthenticated(err: &BillingError) -> bool {
    err.is_api() && err.message().to_lowercase().contains(NO_IDENTITY_MARKER)
}

/// Fetch the customer for the current request, for embedding in server
/// state.
///
/// Never fails: unauthenticated and error cases both yield `None`, with
/// only the latter logged as an error.
pub async fn load_customer(client: &BillingClient, logger: &BillingLogger) -> Option<Customer> {
    match client.fetch_customer().await {
        Ok(customer) => customer,
        Err(err) if is_unauthenticated(&err) => {
            logger.debug("no session; rendering without a billing customer");
            None
        }
        Err(err) => {
            logger.error(&format!("failed to load billing customer: {}", err));
            None
        }
    }
}
