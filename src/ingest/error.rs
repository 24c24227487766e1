//! Ingestion Error Types

use crate::store::StoreError;
use crate::template::EvaluationError;

/// Payload that is not a valid JSON document
#[derive(Debug, thiserror::Error)]
#[error("parsing json: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Why a message was consumed without being written
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("evaluating template: {0}")]
    Evaluate(#[from] EvaluationError),
}

/// Failure that should lead to redelivery of the message
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("pushing {id} to {key}: {source}")]
    Store {
        id: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// The underlying store failure
    pub fn store_error(&self) -> &StoreError {
        match self {
            IngestError::Store { source, .. } => source,
        }
    }
}

/// Result type for message ingestion
pub type IngestResult<T> = Result<T, IngestError>;
