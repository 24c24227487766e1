//! Tests for the ingestion handler

use super::*;
use crate::queue::Message;
use crate::stats::Stats;
use crate::store::{ListStore, MemoryListStore, StoreError};
use crate::template::{EvaluationError, TemplateSyntaxError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct Fixture {
    handler: ListHandler,
    store: Arc<MemoryListStore>,
    stats: Arc<Stats>,
    shutdown: broadcast::Sender<()>,
}

impl Fixture {
    fn new(format: &str, size: i64) -> Self {
        Self::with_store(format, size, MemoryListStore::new())
    }

    fn with_store(format: &str, size: i64, store: MemoryListStore) -> Self {
        let store = Arc::new(store);
        let stats = Arc::new(Stats::with_counters(&COUNTERS));
        let options = ListOptions {
            format: format.to_string(),
            size,
        };
        let handler = ListHandler::new(
            &options,
            store.clone() as Arc<dyn ListStore>,
            stats.clone(),
        )
        .unwrap();
        let (shutdown, _) = broadcast::channel(1);

        Self {
            handler,
            store,
            stats,
            shutdown,
        }
    }

    async fn process(&self, id: &str, body: &str) -> IngestResult<Outcome> {
        let message = Message::new(id, body.as_bytes().to_vec());
        self.handler
            .process(&message, self.shutdown.subscribe())
            .await
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.store
            .list(key)
            .into_iter()
            .map(|p| String::from_utf8(p).unwrap())
            .collect()
    }
}

#[tokio::test]
async fn test_capped_list_per_user_scenario() {
    let fixture = Fixture::new("events:{{user_id}}", 3);
    let bodies: Vec<String> = (1..=4)
        .map(|n| format!(r#"{{"user_id": "u1", "type": "click", "n": {}}}"#, n))
        .collect();

    for (n, body) in bodies.iter().take(3).enumerate() {
        let outcome = fixture.process(&format!("m{}", n + 1), body).await.unwrap();
        assert!(matches!(outcome, Outcome::Completed { ref key } if key == "events:u1"));
    }

    assert_eq!(
        fixture.list("events:u1"),
        vec![bodies[2].clone(), bodies[1].clone(), bodies[0].clone()]
    );

    fixture.process("m4", &bodies[3]).await.unwrap();
    assert_eq!(
        fixture.list("events:u1"),
        vec![bodies[3].clone(), bodies[2].clone(), bodies[1].clone()]
    );
    assert_eq!(fixture.stats.get(PUSHED), 4);
}

#[tokio::test]
async fn test_raw_payload_is_written_unchanged() {
    let fixture = Fixture::new("k:{{id}}", 10);
    let body = "{ \"id\" : 7,\n  \"extra\": [1, 2] }";

    fixture.process("m1", body).await.unwrap();
    assert_eq!(fixture.list("k:7"), vec![body.to_string()]);
}

#[tokio::test]
async fn test_missing_field_is_skipped_without_write() {
    let fixture = Fixture::new("events:{{user_id}}", 3);

    let outcome = fixture
        .process("m1", r#"{"type": "click"}"#)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::Evaluate(EvaluationError::MissingField { .. }))
    ));
    assert_eq!(fixture.store.attempts(), 0);
    assert_eq!(fixture.stats.get(PUSHED), 0);
    assert_eq!(fixture.stats.get(SKIPPED), 1);
}

#[tokio::test]
async fn test_malformed_payload_is_skipped_without_write() {
    let fixture = Fixture::new("events:{{user_id}}", 3);

    for body in [r#"{"user_id": "u1""#, "not json", ""] {
        let outcome = fixture.process("bad", body).await.unwrap();
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::Decode(_))));
    }

    assert_eq!(fixture.store.attempts(), 0);
    assert_eq!(fixture.stats.get(SKIPPED), 3);
    assert_eq!(fixture.stats.get(PUSHED), 0);
}

#[tokio::test]
async fn test_store_failure_is_returned_for_redelivery() {
    let fixture = Fixture::new("events:{{user_id}}", 3);
    fixture.store.fail_next(1);

    let err = fixture
        .process("m1", r#"{"user_id": "u1"}"#)
        .await
        .unwrap_err();

    assert!(matches!(err.store_error(), StoreError::Unavailable { .. }));
    assert!(err.to_string().contains("pushing m1 to events:u1"));
    assert_eq!(fixture.stats.get(PUSHED), 0);
    assert_eq!(fixture.stats.get(FAILED), 1);
    assert!(fixture.list("events:u1").is_empty());

    // Redelivery succeeds once the store is back
    let outcome = fixture
        .process("m1", r#"{"user_id": "u1"}"#)
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(fixture.stats.get(PUSHED), 1);
}

#[tokio::test]
async fn test_size_zero_and_one_boundaries() {
    let empty = Fixture::new("k", 0);
    for n in 0..3 {
        empty.process("m", &format!("{{\"n\":{}}}", n)).await.unwrap();
    }
    assert!(empty.list("k").is_empty());
    assert_eq!(empty.stats.get(PUSHED), 3);

    let latest = Fixture::new("k", 1);
    for n in 0..3 {
        latest.process("m", &format!("{{\"n\":{}}}", n)).await.unwrap();
    }
    assert_eq!(latest.list("k"), vec![r#"{"n":2}"#.to_string()]);
}

#[tokio::test]
async fn test_keys_are_derived_per_message() {
    let fixture = Fixture::new("{{kind}}:{{user.id}}", 5);

    fixture.process("1", r#"{"kind":"a","user":{"id":1}}"#).await.unwrap();
    fixture.process("2", r#"{"kind":"b","user":{"id":1}}"#).await.unwrap();
    fixture.process("3", r#"{"kind":"a","user":{"id":2}}"#).await.unwrap();

    assert_eq!(fixture.store.keys(), vec!["a:1", "a:2", "b:1"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_write() {
    let fixture = Fixture::with_store(
        "k:{{id}}",
        3,
        MemoryListStore::with_latency(Duration::from_secs(60)),
    );
    let message = Message::new("slow", br#"{"id": 1}"#.to_vec());
    let shutdown = fixture.shutdown.subscribe();

    let sender = fixture.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = sender.send(());
    });

    let err = fixture
        .handler
        .process(&message, shutdown)
        .await
        .unwrap_err();

    assert!(matches!(err.store_error(), StoreError::Cancelled));
    assert_eq!(fixture.stats.get(PUSHED), 0);
    assert!(fixture.list("k:1").is_empty());
}

#[test]
fn test_invalid_format_rejected_at_construction() {
    let options = ListOptions {
        format: "events:{{user_id".to_string(),
        size: 3,
    };
    let result = ListHandler::new(
        &options,
        Arc::new(MemoryListStore::new()),
        Arc::new(Stats::new()),
    );

    assert!(matches!(
        result,
        Err(TemplateSyntaxError::Unterminated { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_messages_count_exactly() {
    let fixture = Arc::new(Fixture::new("user:{{u}}", 1000));

    let tasks: Vec<_> = (0..50)
        .map(|n| {
            let fixture = Arc::clone(&fixture);
            tokio::spawn(async move {
                fixture
                    .process(&n.to_string(), &format!("{{\"u\": {}}}", n % 5))
                    .await
                    .unwrap();
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(fixture.stats.get(PUSHED), 50);
    for u in 0..5 {
        assert_eq!(fixture.list(&format!("user:{}", u)).len(), 10);
    }
}
