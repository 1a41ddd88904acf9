//! # tally-ssr
//!
//! Server-side-rendering integration for the Tally billing SDK.
//!
//! In an SSR host, the customer snapshot is fetched on the server before
//! first render ([`load_customer`]) and embedded in server state. On the
//! client, [`ServerCustomerSync`] mirrors that state — the host calls
//! [`ServerCustomerSync::resync`] whenever the load step reruns — and
//! mutating operations trigger the rerun through an [`Invalidator`] keyed
//! on [`CUSTOMER_DEP_KEY`], instead of fetching themselves.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // Server: before first render.
//! let customer = tally_ssr::load_customer(&client, &logger).await;
//!
//! // Client: mirror the server state and bind mutations to the host's
//! // invalidation mechanism.
//! let sync = ServerCustomerSync::new(client, invalidator, customer);
//!
//! // Each render pass: pull the current server state.
//! sync.resync(server_state.customer.clone());
//!
//! // Mutations invalidate instead of fetching.
//! sync.track(TrackRequest::new("messages", 1), None).await?;
//! ```

mod invalidate;
mod server;
mod sync;

pub use invalidate::*;
pub use server::*;
pub use sync::*;
