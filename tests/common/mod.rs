//! Shared fixtures for integration tests
//!
//! `Pipeline` wires the real queue, consumer and handler to the in-memory
//! list store. `CaptureLogger` records log lines per thread so tests running
//! in parallel only see their own output.

#![allow(dead_code)]

use caplist::ingest::{ListHandler, ListOptions, COUNTERS};
use caplist::queue::{ConsumerConfig, ConsumerSummary, MemoryQueue, QueueConsumer, RequeuePolicy};
use caplist::stats::Stats;
use caplist::store::{ListStore, MemoryListStore};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::ThreadId;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct Pipeline {
    pub queue: MemoryQueue,
    pub store: Arc<MemoryListStore>,
    pub stats: Arc<Stats>,
    pub handler: Arc<ListHandler>,
    pub shutdown: broadcast::Sender<()>,
}

impl Pipeline {
    pub fn new(format: &str, size: i64) -> Self {
        Self::with_store(format, size, MemoryListStore::new())
    }

    pub fn with_store(format: &str, size: i64, store: MemoryListStore) -> Self {
        let store = Arc::new(store);
        let stats = Arc::new(Stats::with_counters(&COUNTERS));
        let options = ListOptions {
            format: format.to_string(),
            size,
        };
        let handler = ListHandler::new(
            &options,
            Arc::clone(&store) as Arc<dyn ListStore>,
            Arc::clone(&stats),
        )
        .unwrap();
        let (shutdown, _) = broadcast::channel(1);

        Self {
            queue: MemoryQueue::new("test"),
            store,
            stats,
            handler: Arc::new(handler),
            shutdown,
        }
    }

    pub fn publish(&self, body: &str) -> String {
        self.queue.publish(body.as_bytes().to_vec()).unwrap()
    }

    /// Close the queue and consume until everything is drained
    pub async fn drain(&self, concurrency: usize, max_attempts: u16) -> ConsumerSummary {
        self.queue.close();
        let config = ConsumerConfig {
            concurrency,
            requeue: RequeuePolicy {
                max_attempts,
                delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
        };
        let consumer = QueueConsumer::new(
            Arc::new(self.queue.clone()),
            Arc::clone(&self.handler),
            config,
        );
        consumer.run(self.shutdown.subscribe()).await
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.store
            .list(key)
            .into_iter()
            .map(|payload| String::from_utf8(payload).unwrap())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub level: log::Level,
    pub target: String,
    pub message: String,
}

pub struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, CapturedRecord)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let captured = CapturedRecord {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        if let Ok(mut records) = self.records.lock() {
            records.push((std::thread::current().id(), captured));
        }
    }

    fn flush(&self) {}
}

impl CaptureLogger {
    /// Install the capturing logger for this test binary
    pub fn install() -> &'static CaptureLogger {
        static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();
        LOGGER.get_or_init(|| {
            let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
                records: Mutex::new(Vec::new()),
            }));
            log::set_logger(logger).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
            logger
        })
    }

    /// Drop everything recorded so far on the current thread
    pub fn reset(&self) {
        let me = std::thread::current().id();
        self.records.lock().unwrap().retain(|(thread, _)| *thread != me);
    }

    /// Records from this crate emitted on the current thread
    pub fn own_records(&self) -> Vec<CapturedRecord> {
        let me = std::thread::current().id();
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(thread, record)| *thread == me && record.target.starts_with("caplist"))
            .map(|(_, record)| record.clone())
            .collect()
    }
}
