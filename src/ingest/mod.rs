//! Ingestion Handler
//!
//! Per-message pipeline: decode the payload as JSON, evaluate the key
//! template against it, then push the original bytes onto the capped list.
//!
//! ```text
//! Received ──decode──▶ Decoded ──evaluate──▶ Keyed ──push+trim──▶ Completed
//!    │                    │                    │
//!    └──── invalid ───────┴──── Skipped        └──── store error ──▶ Failed
//! ```
//!
//! Skipped messages are acknowledged: their content will never succeed on
//! redelivery. Failed messages are returned as errors so the queue
//! redelivers them once the store is reachable again.

mod error;
mod handler;

pub use error::{DecodeError, IngestError, IngestResult, SkipReason};
pub use handler::{ListHandler, ListOptions, Outcome};

/// Counter incremented once per message written to its list
pub const PUSHED: &str = "pushed";
/// Counter incremented once per message dropped for its content
pub const SKIPPED: &str = "skipped";
/// Counter incremented once per failed store write
pub const FAILED: &str = "failed";

/// Every counter the handler maintains
pub const COUNTERS: [&str; 3] = [PUSHED, SKIPPED, FAILED];

#[cfg(test)]
mod tests;
