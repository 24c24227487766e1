//! Newline-delimited message input
//!
//! Feeds a [`MemoryQueue`] from any async reader, one message per non-blank
//! line. Used by the binary to take messages on stdin.

use crate::queue::{MemoryQueue, QueueResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Publish every non-blank line of `reader` to `queue`, then close the queue
///
/// Returns the number of messages published. The queue is closed even when
/// reading fails, so consumers always drain and stop.
pub async fn feed_lines<R>(reader: R, queue: &MemoryQueue) -> QueueResult<u64>
where
    R: AsyncBufRead + Unpin,
{
    let result = publish_lines(reader, queue).await;
    queue.close();

    match &result {
        Ok(count) => log::debug!("Input finished after {} messages", count),
        Err(e) => log::error!("reading input: {}", e),
    }

    result
}

async fn publish_lines<R>(reader: R, queue: &MemoryQueue) -> QueueResult<u64>
where
    R: AsyncBufRead + Unpin,
{
    // Raw bytes: a line that is not UTF-8 is still a message, and the
    // handler skips it when it fails to decode
    let mut lines = reader.split(b'\n');
    let mut published = 0;

    while let Some(mut line) = lines.next_segment().await? {
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let len = line.len();
        let id = queue.publish(line)?;
        log::trace!("Queued {} ({} bytes)", id, len);
        published += 1;
    }

    Ok(published)
}
