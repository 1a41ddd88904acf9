//! SSR synchronizer integration tests.
//!
//! Verifies the pull-based mirror, the invalidation-instead-of-fetch
//! mutation contract, and the server-side load helper's unauthenticated
//! handling.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tally_client::invoker::ops;
use tally_client::{
    ActionInvoker, BillingClient, BillingError, BillingLogger, Customer, LoggerConfig,
    RefreshOptions, TrackRequest, UsageRequest,
};
use tally_ssr::*;

// ── Doubles ─────────────────────────────────────────────────────

#[derive(Default)]
struct MockInvoker {
    calls: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
}

impl MockInvoker {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn respond(&self, operation: &str, envelope: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(envelope);
    }

    fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.as_str() == operation)
            .count()
    }
}

#[async_trait]
impl ActionInvoker for MockInvoker {
    async fn invoke(&self, operation: &str, _args: Value) -> Result<Value, BillingError> {
        self.calls.lock().unwrap().push(operation.to_string());
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(operation).ok_or_else(|| {
            BillingError::Transport(format!("no scripted response for {}", operation))
        })?;
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| BillingError::Transport(format!("queue drained for {}", operation)))
        }
    }
}

#[derive(Default)]
struct RecordingInvalidator {
    keys: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    fn count(&self) -> usize {
        self.keys.lock().unwrap().len()
    }
}

impl Invalidator for RecordingInvalidator {
    fn invalidate(&self, key: &str) {
        self.keys.lock().unwrap().push(key.to_string());
    }
}

fn customer(balance: i64) -> Customer {
    serde_json::from_value(json!({
        "id": "cus_1",
        "name": "Ada",
        "features": {
            "messages": {
                "id": "messages",
                "type": "continuous",
                "balance": balance,
                "includedUsage": 10,
                "interval": "month"
            }
        }
    }))
    .unwrap()
}

fn quiet_logger() -> BillingLogger {
    BillingLogger::new(LoggerConfig {
        disabled: true,
        ..Default::default()
    })
}

fn sync_with(
    invoker: &Arc<MockInvoker>,
    invalidator: &Arc<RecordingInvalidator>,
    initial: Option<Customer>,
) -> ServerCustomerSync {
    ServerCustomerSync::new(
        BillingClient::new(invoker.clone()),
        invalidator.clone(),
        initial,
    )
}

// ── Mirror semantics ────────────────────────────────────────────

#[test]
fn resync_mirrors_server_state() {
    let invoker = MockInvoker::new();
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, Some(customer(10)));

    assert_eq!(sync.customer().unwrap().id, "cus_1");
    assert!(sync.allowed("messages", None).is_allowed());

    // Server state went away; the mirror follows.
    sync.resync(None);
    assert!(sync.customer().is_none());
    assert_eq!(
        sync.allowed("messages", None).reason(),
        Some("No customer data")
    );

    sync.resync(Some(customer(3)));
    let denied = sync.allowed("messages", Some(4));
    assert_eq!(denied.reason(), Some("Insufficient balance: 3 < 4"));
}

#[test]
fn refresh_delegates_to_invalidator() {
    let invoker = MockInvoker::new();
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, None);

    sync.refresh();

    assert_eq!(
        invalidator.keys.lock().unwrap().as_slice(),
        [CUSTOMER_DEP_KEY]
    );
    // Never fetches on its own.
    assert_eq!(invoker.count(ops::CUSTOMERS_CREATE), 0);
}

// ── Mutations invalidate instead of fetching ────────────────────

#[tokio::test]
async fn track_invalidates_by_default() {
    let invoker = MockInvoker::new();
    invoker.respond(ops::TRACK, json!({"data": {"id": "evt_1"}}));
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, Some(customer(10)));

    sync.track(TrackRequest::new("messages", 1), None)
        .await
        .unwrap();

    assert_eq!(invalidator.count(), 1);
    assert_eq!(invoker.count(ops::CUSTOMERS_CREATE), 0);
    // The mirror only moves once the host resyncs.
    assert_eq!(
        sync.customer().unwrap().features["messages"].balance,
        Some(10)
    );
    sync.resync(Some(customer(9)));
    assert_eq!(
        sync.customer().unwrap().features["messages"].balance,
        Some(9)
    );
}

#[tokio::test]
async fn refetch_false_suppresses_invalidation() {
    let invoker = MockInvoker::new();
    invoker.respond(ops::TRACK, json!({"data": {"id": "evt_1"}}));
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, Some(customer(10)));

    sync.track(
        TrackRequest::new("messages", 1),
        Some(RefreshOptions::no_refetch()),
    )
    .await
    .unwrap();

    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn failed_mutation_skips_invalidation() {
    let invoker = MockInvoker::new();
    invoker.respond(
        ops::TRACK,
        json!({"error": {"code": "FEATURE_NOT_FOUND", "message": "nope"}}),
    );
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, Some(customer(10)));

    let err = sync
        .track(TrackRequest::new("gadgets", 1), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("FEATURE_NOT_FOUND"));
    assert_eq!(invalidator.count(), 0);
}

#[tokio::test]
async fn usage_never_invalidates() {
    let invoker = MockInvoker::new();
    invoker.respond(ops::USAGE, json!({"data": {"code": "ok"}}));
    let invalidator = Arc::new(RecordingInvalidator::default());
    let sync = sync_with(&invoker, &invalidator, Some(customer(10)));

    sync.usage(UsageRequest::new("messages", 0)).await.unwrap();

    assert_eq!(invalidator.count(), 0);
}

// ── Server-side load helper ─────────────────────────────────────

#[tokio::test]
async fn load_customer_returns_snapshot() {
    let invoker = MockInvoker::new();
    invoker.respond(
        ops::CUSTOMERS_CREATE,
        json!({"data": {"customer": {"id": "cus_1", "name": "Ada"}}}),
    );
    let client = BillingClient::new(invoker.clone());

    let loaded = load_customer(&client, &quiet_logger()).await;
    assert_eq!(loaded.unwrap().id, "cus_1");
}

#[tokio::test]
async fn load_customer_unauthenticated_is_none_not_error() {
    let invoker = MockInvoker::new();
    invoker.respond(
        ops::CUSTOMERS_CREATE,
        json!({"error": {
            "code": "UNAUTHORIZED",
            "message": "No customer identifier found in request",
            "statusCode": 401
        }}),
    );
    let client = BillingClient::new(invoker.clone());

    assert!(load_customer(&client, &quiet_logger()).await.is_none());
}

#[tokio::test]
async fn load_customer_swallows_backend_errors() {
    let invoker = MockInvoker::new();
    invoker.respond(
        ops::CUSTOMERS_CREATE,
        json!({"error": {"code": "INTERNAL_SERVER_ERROR", "message": "boom"}}),
    );
    let client = BillingClient::new(invoker.clone());

    assert!(load_customer(&client, &quiet_logger()).await.is_none());
}
