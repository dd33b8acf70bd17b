//! Integration tests for the worker module

use super::*;
use crate::error::{ErrorKind, SinkError};
use crate::request::{RequestId, RequestParams};
use crate::response::{AttemptOutcome, OutcomeStatus, RecommendationItem};
use crate::traits::{OutcomeSink, TargetClient};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

// ============================================================================
// Mock TargetClient
// ============================================================================

struct MockClient {
    delay: Option<Duration>,
    panic_on: Option<String>,
    calls: AtomicUsize,
}

impl MockClient {
    fn new() -> Self {
        Self {
            delay: None,
            panic_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_panic_on(mut self, address: &str) -> Self {
        self.panic_on = Some(address.to_string());
        self
    }
}

#[async_trait]
impl TargetClient for MockClient {
    fn endpoint(&self) -> &str {
        "mock://recommendations"
    }

    async fn execute(&self, request_id: RequestId, params: &RequestParams) -> AttemptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panic_on.as_deref() == Some(params.address.as_str()) {
            panic!("mock client exploded");
        }

        let items = vec![RecommendationItem {
            category: "Ramen".to_string(),
            ..Default::default()
        }];
        AttemptOutcome::success(request_id, params.clone(), &items, 1, 1, Some(200))
    }
}

// ============================================================================
// Mock OutcomeSink
// ============================================================================

#[derive(Default)]
struct MemorySink {
    rows: Mutex<Vec<AttemptOutcome>>,
    fail: bool,
}

impl MemorySink {
    fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn len(&self) -> usize {
        self.rows.lock().len()
    }
}

impl OutcomeSink for MemorySink {
    fn write_outcome(&self, outcome: &AttemptOutcome) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Io(std::io::Error::other("disk full")));
        }
        self.rows.lock().push(outcome.clone());
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

struct Harness {
    client: Arc<MockClient>,
    sink: Arc<MemorySink>,
    limiter: Arc<RequestRateLimiter>,
    gate: Arc<ConcurrencyGate>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Harness {
    fn new(client: MockClient, sink: MemorySink) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            client: Arc::new(client),
            sink: Arc::new(sink),
            limiter: Arc::new(RequestRateLimiter::new(10, 600)),
            gate: Arc::new(ConcurrencyGate::new(2)),
            shutdown_tx,
        }
    }

    fn unit(&self, index: usize, address: &str) -> WorkUnit {
        WorkUnit::new(
            index,
            RequestParams::new(address, "en-US"),
            Arc::clone(&self.client) as Arc<dyn TargetClient>,
            Arc::clone(&self.sink) as Arc<dyn OutcomeSink>,
            Arc::clone(&self.limiter),
            Arc::clone(&self.gate),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_unit_records_outcome() {
    let harness = Harness::new(MockClient::new(), MemorySink::default());
    let unit = harness.unit(0, "Kyoto Station, Kyoto, Japan");
    assert_eq!(unit.state(), UnitState::Pending);

    let outcome = unit.run(harness.shutdown_tx.subscribe()).await.unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.params.address, "Kyoto Station, Kyoto, Japan");
    assert_eq!(harness.sink.len(), 1);
    assert_eq!(harness.client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.gate.available_permits(), 2);
}

#[tokio::test]
async fn test_unit_consumes_one_token() {
    let harness = Harness::new(MockClient::new(), MemorySink::default());
    let before = harness.limiter.state().current_tokens;

    harness
        .unit(0, "Kyoto")
        .run(harness.shutdown_tx.subscribe())
        .await
        .unwrap();

    let after = harness.limiter.state().current_tokens;
    assert!(after < before);
    assert!(before - after <= 1.0 + 1e-6);
}

#[tokio::test]
async fn test_client_panic_becomes_internal_error() {
    let harness = Harness::new(
        MockClient::new().with_panic_on("Nowhere"),
        MemorySink::default(),
    );

    let outcome = harness
        .unit(0, "Nowhere")
        .run(harness.shutdown_tx.subscribe())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Error);
    assert_eq!(outcome.error_kind, Some(ErrorKind::Internal));
    assert!(outcome.error.unwrap().contains("mock client exploded"));
    assert_eq!(harness.sink.len(), 1);
    assert_eq!(harness.gate.available_permits(), 2);
}

#[tokio::test]
async fn test_sink_failure_is_reported() {
    let harness = Harness::new(MockClient::new(), MemorySink::failing());

    let result = harness
        .unit(0, "Kyoto")
        .run(harness.shutdown_tx.subscribe())
        .await;

    assert!(matches!(result, Err(UnitError::Sink(_))));
    assert_eq!(harness.gate.available_permits(), 2);
}

#[tokio::test]
async fn test_shutdown_before_admission_cancels() {
    let harness = Harness::new(MockClient::new(), MemorySink::default());
    let _held = (
        harness.gate.acquire().await.unwrap(),
        harness.gate.acquire().await.unwrap(),
    );

    let shutdown_rx = harness.shutdown_tx.subscribe();
    let unit = harness.unit(0, "Kyoto");
    let handle = tokio::spawn(unit.run(shutdown_rx));
    tokio::task::yield_now().await;

    harness.shutdown_tx.send(()).unwrap();
    let result = handle.await.unwrap();

    assert!(matches!(result, Err(UnitError::Cancelled)));
    assert_eq!(harness.client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.sink.len(), 0);
}

#[tokio::test]
async fn test_closed_gate_cancels() {
    let harness = Harness::new(MockClient::new(), MemorySink::default());
    harness.gate.close();

    let result = harness
        .unit(0, "Kyoto")
        .run(harness.shutdown_tx.subscribe())
        .await;

    assert!(matches!(result, Err(UnitError::Cancelled)));
    assert_eq!(harness.client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_does_not_interrupt_execution() {
    let harness = Harness::new(
        MockClient::new().with_delay(Duration::from_millis(50)),
        MemorySink::default(),
    );

    let shutdown_rx = harness.shutdown_tx.subscribe();
    let handle = tokio::spawn(harness.unit(0, "Kyoto").run(shutdown_rx));

    // Give the unit time to pass both gates and start executing
    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.shutdown_tx.send(()).unwrap();

    let outcome = handle.await.unwrap().unwrap();
    assert!(outcome.is_success());
    assert_eq!(harness.sink.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_units_respect_gate() {
    let harness = Harness::new(
        MockClient::new().with_delay(Duration::from_millis(20)),
        MemorySink::default(),
    );

    let mut handles = Vec::new();
    for i in 0..6 {
        let unit = harness.unit(i, &format!("Address {i}"));
        handles.push(tokio::spawn(unit.run(harness.shutdown_tx.subscribe())));
    }

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(harness.gate.in_flight() <= 2);

    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(harness.sink.len(), 6);
    assert_eq!(harness.gate.available_permits(), 2);
}
