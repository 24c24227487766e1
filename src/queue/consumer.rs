//! Queue consumer driving a message handler
//!
//! The consumer pulls messages from a [`MessageSource`] and runs up to
//! `concurrency` handler invocations at once. A handler `Ok` finishes the
//! message; an `Err` requeues it according to the [`RequeuePolicy`], until
//! the policy's attempt limit is reached and the message is given up.
//! Failures that happen once shutdown has fired are always requeued.

use crate::core::shutdown::wait_for_shutdown;
use crate::queue::{Message, MessageHandler, MessageSource, RequeuePolicy};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Consumer tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Maximum number of messages handled at the same time
    pub concurrency: usize,
    pub requeue: RequeuePolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            requeue: RequeuePolicy::default(),
        }
    }
}

/// What happened to a single delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Finished,
    Requeued,
    GivenUp,
}

/// Totals for one consumer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerSummary {
    pub delivered: u64,
    pub finished: u64,
    pub requeued: u64,
    pub given_up: u64,
}

impl ConsumerSummary {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Finished => self.finished += 1,
            Disposition::Requeued => self.requeued += 1,
            Disposition::GivenUp => self.given_up += 1,
        }
    }
}

enum Event {
    Shutdown,
    Delivered(Option<Message>),
    Completed(Option<Disposition>),
}

/// Pulls messages from a source and feeds them to a handler
pub struct QueueConsumer<S, H> {
    source: Arc<S>,
    handler: Arc<H>,
    config: ConsumerConfig,
}

impl<S, H> QueueConsumer<S, H>
where
    S: MessageSource,
    H: MessageHandler,
{
    pub fn new(source: Arc<S>, handler: Arc<H>, config: ConsumerConfig) -> Self {
        Self {
            source,
            handler,
            config,
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Consume until the source is exhausted or `shutdown` fires
    ///
    /// On shutdown no new messages are taken; handlers already running are
    /// awaited (they receive the same shutdown signal) before returning.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ConsumerSummary {
        let concurrency = self.config.concurrency.max(1);
        let mut in_flight = FuturesUnordered::new();
        let mut summary = ConsumerSummary::default();
        let mut accepting = true;

        loop {
            let event = if accepting && in_flight.len() < concurrency {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => Event::Shutdown,
                    outcome = in_flight.next(), if !in_flight.is_empty() => Event::Completed(outcome),
                    message = MessageSource::next(self.source.as_ref()) => Event::Delivered(message),
                }
            } else {
                Event::Completed(in_flight.next().await)
            };

            match event {
                Event::Shutdown => {
                    log::info!(
                        "Shutdown requested, waiting for {} in-flight messages",
                        in_flight.len()
                    );
                    accepting = false;
                }
                Event::Delivered(Some(message)) => {
                    summary.delivered += 1;
                    in_flight.push(self.process(message, shutdown.resubscribe()));
                }
                Event::Delivered(None) => {
                    log::debug!("Message source exhausted");
                    accepting = false;
                }
                Event::Completed(Some(disposition)) => summary.record(disposition),
                Event::Completed(None) => {
                    if !accepting {
                        break;
                    }
                }
            }
        }

        log::debug!("Consumer stopped: {:?}", summary);
        summary
    }

    async fn process(&self, message: Message, shutdown: broadcast::Receiver<()>) -> Disposition {
        let mut stopping = shutdown.resubscribe();
        match self.handler.handle_message(&message, shutdown).await {
            Ok(()) => {
                self.source.finish(&message);
                Disposition::Finished
            }
            Err(e) => {
                let attempts = message.attempts();
                // A failure during shutdown may just be the abandoned write;
                // it goes back to the queue whatever the attempt count
                let shutting_down = matches!(
                    stopping.try_recv(),
                    Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_))
                );
                if !shutting_down && self.config.requeue.is_exhausted(attempts) {
                    log::warn!(
                        "giving up on {} after {} attempts: {}",
                        message.id(),
                        attempts,
                        e
                    );
                    self.source.finish(&message);
                    Disposition::GivenUp
                } else {
                    let delay = self.config.requeue.delay_for(attempts);
                    log::debug!(
                        "requeueing {} (attempt {}) in {:?}",
                        message.id(),
                        attempts,
                        delay
                    );
                    self.source.requeue(message, delay);
                    Disposition::Requeued
                }
            }
        }
    }
}
