//! Metrics Reporter
//!
//! Named, monotonically increasing counters shared by every in-flight message
//! handler, plus a background ticker that emits a snapshot on a fixed
//! interval. Counters are never reset while the process runs; each tick also
//! carries the per-interval deltas so rates can be read straight from logs.
//!
//! # Example
//!
//! ```rust,no_run
//! use caplist::stats::{LogSink, Stats};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//! let stats = Arc::new(Stats::with_counters(&["pushed"]));
//! let ticker = stats.tick_every(Duration::from_secs(10), Arc::new(LogSink), shutdown_rx);
//!
//! stats.incr("pushed");
//!
//! let _ = shutdown_tx.send(());
//! let _ = ticker.await;
//! # }
//! ```

mod sink;

pub use sink::{LogSink, SnapshotSink};

use crate::core::shutdown::wait_for_shutdown;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Default interval between two emitted snapshots
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Point-in-time copy of every counter
pub type StatsSnapshot = BTreeMap<String, u64>;

/// Shared counter registry
#[derive(Debug, Default)]
pub struct Stats {
    counters: RwLock<BTreeMap<String, Arc<AtomicU64>>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with counters pre-registered at zero, so they
    /// appear in snapshots before their first increment
    pub fn with_counters(names: &[&str]) -> Self {
        let stats = Self::new();
        for name in names {
            stats.counter(name);
        }
        stats
    }

    /// Increment `name` by one
    pub fn incr(&self, name: &str) {
        self.incr_by(name, 1);
    }

    /// Increment `name` by `amount`
    pub fn incr_by(&self, name: &str, amount: u64) {
        self.counter(name).fetch_add(amount, Ordering::Relaxed);
    }

    /// Current value of `name` (zero if it was never touched)
    pub fn get(&self, name: &str) -> u64 {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Copy every counter value
    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        counters
            .iter()
            .map(|(name, counter)| (name.clone(), counter.load(Ordering::Relaxed)))
            .collect()
    }

    /// Spawn the periodic reporter
    ///
    /// The first snapshot is emitted one full `interval` after the call, then
    /// once per `interval`, whether or not any counter moved. The task exits
    /// when `shutdown` fires.
    pub fn tick_every(
        self: &Arc<Self>,
        interval: Duration,
        sink: Arc<dyn SnapshotSink>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let stats = Arc::clone(self);
        let start = Instant::now() + interval;
        let mut previous = stats.snapshot();

        tokio::spawn(async move {
            let mut ticker = interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let current = stats.snapshot();
                        sink.emit(&Tick::between(&previous, current.clone(), interval));
                        previous = current;
                    }
                    _ = wait_for_shutdown(&mut shutdown) => {
                        log::debug!("Stats ticker stopping");
                        break;
                    }
                }
            }
        })
    }

    fn counter(&self, name: &str) -> Arc<AtomicU64> {
        {
            let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(counter) = counters.get(name) {
                return Arc::clone(counter);
            }
        }

        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(counters.entry(name.to_string()).or_default())
    }
}

/// One emitted report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Cumulative totals since process start
    pub totals: StatsSnapshot,
    /// Increase of each counter since the previous tick
    pub deltas: StatsSnapshot,
    pub interval: Duration,
}

impl Tick {
    fn between(previous: &StatsSnapshot, totals: StatsSnapshot, interval: Duration) -> Self {
        let deltas = totals
            .iter()
            .map(|(name, value)| {
                let before = previous.get(name).copied().unwrap_or(0);
                (name.clone(), value.saturating_sub(before))
            })
            .collect();

        Self {
            totals,
            deltas,
            interval,
        }
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.totals.is_empty() {
            return write!(f, "no counters");
        }

        let mut first = true;
        for (name, total) in &self.totals {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            let delta = self.deltas.get(name).copied().unwrap_or(0);
            write!(f, "{}={} (+{})", name, total, delta)?;
        }
        Ok(())
    }
}
