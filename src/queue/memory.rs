//! In-process message queue
//!
//! FIFO queue with the delivery contract of a real broker: each delivery is
//! tracked as in flight until it is finished or requeued, requeued messages
//! come back after their delay with an incremented attempt count, and the
//! queue only reports exhaustion once it is closed and nothing is pending.

use crate::queue::{Message, MessageSource, QueueError, QueueResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

/// Counters describing the queue's current state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages waiting for delivery
    pub ready: usize,
    /// Messages delivered but not yet finished or requeued
    pub in_flight: usize,
    /// Requeued messages waiting out their delay
    pub deferred: usize,
    /// Messages acknowledged as consumed
    pub finished: u64,
    /// Requeue operations performed
    pub requeued: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<Message>,
    in_flight: usize,
    deferred: usize,
    closed: bool,
    finished: u64,
    requeued: u64,
}

#[derive(Debug)]
struct Inner {
    queue_id: String,
    next_id: AtomicU64,
    state: Mutex<QueueState>,
    changed: Notify,
}

/// Cloneable handle to a shared in-process queue
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    inner: Arc<Inner>,
}

impl MemoryQueue {
    pub fn new(queue_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue_id: queue_id.into(),
                next_id: AtomicU64::new(1),
                state: Mutex::new(QueueState::default()),
                changed: Notify::new(),
            }),
        }
    }

    pub fn queue_id(&self) -> &str {
        &self.inner.queue_id
    }

    /// Enqueue a payload and return the identifier assigned to it
    pub fn publish(&self, body: Vec<u8>) -> QueueResult<String> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueError::Closed {
                queue_id: self.inner.queue_id.clone(),
            });
        }

        let sequence = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("{:016x}", sequence);
        state.ready.push_back(Message::new(id.clone(), body));
        drop(state);

        self.inner.changed.notify_waiters();
        Ok(id)
    }

    /// Refuse further publishes; pending and in-flight messages still drain
    pub fn close(&self) {
        self.lock().closed = true;
        self.inner.changed.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            ready: state.ready.len(),
            in_flight: state.in_flight,
            deferred: state.deferred,
            finished: state.finished,
            requeued: state.requeued,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MessageSource for MemoryQueue {
    async fn next(&self) -> Option<Message> {
        loop {
            // Registered before inspecting the state so no wakeup is missed
            let changed = self.inner.changed.notified();

            {
                let mut state = self.lock();
                if let Some(mut message) = state.ready.pop_front() {
                    state.in_flight += 1;
                    message.mark_delivered();
                    return Some(message);
                }
                if state.closed && state.in_flight == 0 && state.deferred == 0 {
                    return None;
                }
            }

            changed.await;
        }
    }

    fn finish(&self, _message: &Message) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.finished += 1;
        }
        self.inner.changed.notify_waiters();
    }

    fn requeue(&self, message: Message, delay: Duration) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.requeued += 1;
            if delay.is_zero() {
                state.ready.push_back(message);
                drop(state);
                self.inner.changed.notify_waiters();
                return;
            }
            state.deferred += 1;
        }

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = queue.lock();
                state.deferred -= 1;
                state.ready.push_back(message);
            }
            queue.inner.changed.notify_waiters();
        });
    }
}
