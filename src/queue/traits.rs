//! Seams between the consumer loop, message sources and handlers

use crate::queue::Message;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

/// A queue that delivers messages and accepts their final disposition
///
/// Every message returned by [`next`](MessageSource::next) must later be
/// passed to exactly one of [`finish`](MessageSource::finish) or
/// [`requeue`](MessageSource::requeue).
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next message; `None` once the source is exhausted
    ///
    /// Must be cancel-safe: dropping the future never loses a message.
    async fn next(&self) -> Option<Message>;

    /// Acknowledge a message as consumed
    fn finish(&self, message: &Message);

    /// Hand a message back for redelivery after `delay`
    fn requeue(&self, message: Message, delay: Duration);
}

/// Processes one delivered message
///
/// `Ok` acknowledges the message. `Err` asks for redelivery, so it must only
/// be returned for failures that a later attempt could fix.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    type Error: std::fmt::Display + Send;

    async fn handle_message(
        &self,
        message: &Message,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), Self::Error>;
}
