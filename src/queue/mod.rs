//! Inbound Message Queue
//!
//! The consumer side of the message queue: the message type, the seams to a
//! queue client ([`MessageSource`]) and to the code that processes messages
//! ([`MessageHandler`]), and a consumer loop that connects the two.
//!
//! # Delivery contract
//!
//! - A handler `Ok` finishes (acknowledges) the message
//! - A handler `Err` requeues it for redelivery with backoff
//! - After `max_attempts` deliveries a failing message is given up and finished
//!
//! Handlers therefore decide the retry policy through their return value
//! alone: permanent problems must be reported as `Ok` after logging them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  publish   ┌──────────────┐  next / finish / requeue
//! │ stdin lines  │ ─────────▶ │ MemoryQueue  │ ◀──────────────────────┐
//! └──────────────┘            └──────────────┘                        │
//!                                                              ┌──────┴───────┐
//!                                                              │QueueConsumer │
//!                                                              └──────┬───────┘
//!                                                   up to N at once   │
//!                                                              ┌──────▼───────┐
//!                                                              │MessageHandler│
//!                                                              └──────────────┘
//! ```

mod consumer;
mod error;
mod lines;
mod memory;
mod message;
mod policy;
mod traits;

pub use consumer::{ConsumerConfig, ConsumerSummary, Disposition, QueueConsumer};
pub use error::{QueueError, QueueResult};
pub use lines::feed_lines;
pub use memory::{MemoryQueue, QueueStats};
pub use message::{Message, MessageHeader};
pub use policy::RequeuePolicy;
pub use traits::{MessageHandler, MessageSource};
