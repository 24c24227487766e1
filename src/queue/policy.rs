//! Redelivery policy for failed messages

use std::time::Duration;

/// How failed messages are handed back to the queue
///
/// The delay grows linearly with the number of attempts and is capped at
/// `max_delay`. A `max_attempts` of zero never gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequeuePolicy {
    pub max_attempts: u16,
    pub delay: Duration,
    pub max_delay: Duration,
}

impl Default for RequeuePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RequeuePolicy {
    /// Delay before redelivering a message that has failed `attempts` times
    pub fn delay_for(&self, attempts: u16) -> Duration {
        self.delay
            .saturating_mul(u32::from(attempts.max(1)))
            .min(self.max_delay)
    }

    /// True once a message with `attempts` deliveries should not be retried
    pub fn is_exhausted(&self, attempts: u16) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}
