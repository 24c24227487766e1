//! Snapshot sinks

use super::Tick;

/// Destination for periodic snapshots
pub trait SnapshotSink: Send + Sync {
    fn emit(&self, tick: &Tick);
}

/// Writes each snapshot as a single info-level log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn emit(&self, tick: &Tick) {
        log::info!("stats every {:?}: {}", tick.interval, tick);
    }
}
