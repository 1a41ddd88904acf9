//! # Tally Client SDK
//!
//! Headless Rust client for the Tally billing service. Exposes the remote
//! billing operations (customer retrieval, feature-access checks, usage
//! tracking, checkout, entity management) as typed async methods, and keeps
//! a locally cached customer snapshot in sync after mutations.
//!
//! Two layers:
//!
//! - [`BillingClient`] — stateless, one typed method per remote operation,
//!   with business failures surfaced as [`BillingError`].
//! - [`CustomerSync`] — owns the cached [`CustomerData`] snapshot, refreshes
//!   it after successful mutations (per-call [`RefreshOptions`]), and
//!   answers synchronous [`CustomerSync::allowed`] checks from the cache.
//!
//! The synchronizer is built for explicit sharing: construct one instance
//! at the application root and hand clones (cheap, `Arc`-backed) to
//! consumers, rather than relying on ambient lookup.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tally_client::{BillingClient, CustomerSync, InvokerOptions, TrackRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BillingClient::http(InvokerOptions {
//!         base_url: "https://my-app.com".into(),
//!         ..Default::default()
//!     });
//!
//!     let sync = CustomerSync::new(client);
//!     sync.initialize().await;
//!
//!     if sync.allowed("messages", None).is_allowed() {
//!         sync.track(TrackRequest::new("messages", 1), None).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! Callers needing atomicity across multiple billing side effects must not
//! rely on the per-call refresh: perform the sequence as a single
//! server-side operation, then call [`CustomerSync::refresh`] once.

pub mod access;
mod client;
mod envelope;
mod error;
pub mod invoker;
pub mod logger;
mod sync;
mod types;

pub use access::AccessDecision;
pub use client::*;
pub use envelope::*;
pub use error::*;
pub use invoker::{ActionInvoker, HttpActionInvoker, InvokerOptions};
pub use logger::{BillingLogger, LogHandler, LogLevel, LoggerConfig};
pub use sync::*;
pub use types::*;
