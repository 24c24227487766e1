//! Capped List Writer
//!
//! Writes raw message payloads into bounded, newest-first lists held by a
//! shared store. Every write is a single atomic unit made of a prepend and a
//! trim, so a list never stays above its configured maximum length.
//!
//! Two implementations are provided:
//!
//! - [`RedisListStore`]: `LPUSH` + `LTRIM` inside a `MULTI`/`EXEC` pipeline
//! - [`MemoryListStore`]: in-process lists with identical semantics, used for
//!   dry runs and tests

mod error;
mod memory;
mod redis_store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryListStore;
pub use redis_store::{mask_url, RedisListStore};

use async_trait::async_trait;

/// A shared store that can hold capped lists
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Prepend `payload` to the list at `key`, then keep at most `max_size` elements
    ///
    /// A `max_size` of zero or less leaves the list empty after every write.
    /// On error the write must be treated as not applied.
    async fn push_capped(&self, key: &str, payload: &[u8], max_size: i64) -> StoreResult<()>;

    /// Short human readable description used in startup logs
    fn describe(&self) -> String;
}

/// Inclusive `LTRIM` range that keeps the first `max_size` elements
///
/// Non-positive sizes map to an empty range (`start > stop`) rather than
/// `0..-1`, which Redis would read as "keep everything".
pub fn trim_range(max_size: i64) -> (isize, isize) {
    if max_size <= 0 {
        (1, 0)
    } else {
        (0, (max_size - 1).min(isize::MAX as i64) as isize)
    }
}
