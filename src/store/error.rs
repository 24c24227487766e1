//! Store Error Types

/// Failure to complete an atomic push+trim
///
/// Every variant is treated as transient: the message that triggered the
/// write is handed back to the queue for redelivery.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("store operation cancelled by shutdown")]
    Cancelled,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
