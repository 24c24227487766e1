//! In-process capped lists
//!
//! Mirrors the Redis semantics exactly: newest element at index 0, tail
//! evicted past the cap, non-positive caps leave the list empty (and, like
//! Redis, an empty list is the same as an absent key).

use super::{ListStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Capped lists kept in process memory
#[derive(Debug, Default)]
pub struct MemoryListStore {
    lists: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    /// Number of upcoming writes that will fail with `Unavailable`
    failures_pending: AtomicUsize,
    /// Write attempts, successful or not
    attempts: AtomicU64,
    latency: Option<Duration>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `latency` before applying it
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make the next `count` writes fail as if the store were unreachable
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Number of write attempts seen so far
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Copy of the list at `key`, newest first
    pub fn list(&self, key: &str) -> Vec<Vec<u8>> {
        self.lists
            .lock()
            .map(|lists| {
                lists
                    .get(key)
                    .map(|list| list.iter().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Length of the list at `key`
    pub fn len(&self, key: &str) -> usize {
        self.lists
            .lock()
            .map(|lists| lists.get(key).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    /// Keys of all non-empty lists, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lists
            .lock()
            .map(|lists| lists.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn take_failure(&self) -> bool {
        self.failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn push_capped(&self, key: &str, payload: &[u8], max_size: i64) -> StoreResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_failure() {
            return Err(StoreError::Unavailable {
                message: "injected failure".to_string(),
            });
        }

        let mut lists = self.lists.lock().map_err(|_| StoreError::Unavailable {
            message: "memory store lock poisoned".to_string(),
        })?;

        let list = lists.entry(key.to_string()).or_default();
        list.push_front(payload.to_vec());
        list.truncate(max_size.max(0) as usize);

        if list.is_empty() {
            lists.remove(key);
        }

        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
