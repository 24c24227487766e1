//! Message-to-list handler

use crate::core::shutdown::wait_for_shutdown;
use crate::ingest::{DecodeError, IngestError, IngestResult, SkipReason, FAILED, PUSHED, SKIPPED};
use crate::queue::{Message, MessageHandler};
use crate::stats::Stats;
use crate::store::{ListStore, StoreError};
use crate::template::{KeyTemplate, TemplateSyntaxError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Handler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Key format, e.g. `events:{{user_id}}`
    pub format: String,
    /// Maximum list length kept after each write
    pub size: i64,
}

/// Terminal state of a message that did not need redelivery
#[derive(Debug)]
pub enum Outcome {
    /// Written to the list at `key`
    Completed { key: String },
    /// Consumed without a write; retrying could not help
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

/// Writes JSON messages to capped lists keyed by their own content
///
/// The handler is shared by every concurrent delivery: the compiled template
/// is read-only and the stats registry uses atomic counters.
pub struct ListHandler {
    template: KeyTemplate,
    size: i64,
    store: Arc<dyn ListStore>,
    stats: Arc<Stats>,
}

impl ListHandler {
    /// Compile the key format and build a handler
    pub fn new(
        options: &ListOptions,
        store: Arc<dyn ListStore>,
        stats: Arc<Stats>,
    ) -> Result<Self, TemplateSyntaxError> {
        let template = KeyTemplate::compile(&options.format)?;

        Ok(Self {
            template,
            size: options.size,
            store,
            stats,
        })
    }

    pub fn template(&self) -> &KeyTemplate {
        &self.template
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn stats(&self) -> &Arc<Stats> {
        &self.stats
    }

    /// Decode, derive the key and write one message
    ///
    /// Content problems (invalid JSON, fields the template cannot resolve)
    /// are logged and reported as [`Outcome::Skipped`]. Only a failed store
    /// write, or one abandoned because `shutdown` fired, returns `Err`.
    pub async fn process(
        &self,
        message: &Message,
        mut shutdown: broadcast::Receiver<()>,
    ) -> IngestResult<Outcome> {
        let document = match serde_json::from_slice::<Value>(message.body()) {
            Ok(document) => document,
            Err(e) => return Ok(self.skip(message, DecodeError(e).into())),
        };

        let key = match self.template.evaluate(&document) {
            Ok(key) => key,
            Err(e) => return Ok(self.skip(message, e.into())),
        };

        log::info!("pushing {} to {}", message.id(), key);
        log::debug!("contents {} {}", message.id(), message.body_lossy());

        let write = self.store.push_capped(&key, message.body(), self.size);
        let result = tokio::select! {
            biased;
            result = write => result,
            _ = wait_for_shutdown(&mut shutdown) => Err(StoreError::Cancelled),
        };

        match result {
            Ok(()) => {
                self.stats.incr(PUSHED);
                Ok(Outcome::Completed { key })
            }
            Err(e) => {
                log::error!("pushing: {}", e);
                self.stats.incr(FAILED);
                Err(IngestError::Store {
                    id: message.id().to_string(),
                    key,
                    source: e,
                })
            }
        }
    }

    fn skip(&self, message: &Message, reason: SkipReason) -> Outcome {
        log::error!("{} (message {})", reason, message.id());
        self.stats.incr(SKIPPED);
        Outcome::Skipped(reason)
    }
}

#[async_trait]
impl MessageHandler for ListHandler {
    type Error = IngestError;

    async fn handle_message(
        &self,
        message: &Message,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        self.process(message, shutdown).await.map(|_| ())
    }
}
