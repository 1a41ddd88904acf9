//! The external invalidation boundary.
//!
//! In an SSR host, the customer snapshot is produced by a server-side load
//! step. Instead of fetching, the SSR synchronizer asks the host to rerun
//! that step by invalidating a named dependency key; the fresh value flows
//! back in through [`crate::ServerCustomerSync::resync`].

/// Dependency key under which the host's customer load step registers.
pub const CUSTOMER_DEP_KEY: &str = "tally:customer";

/// Host hook that reruns the server load step for a dependency key.
pub trait Invalidator: Send + Sync {
    fn invalidate(&self, key: &str);
}
