//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue is closed: {queue_id}")]
    Closed { queue_id: String },

    #[error("Reading input failed: {0}")]
    Input(#[from] std::io::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
