//! Notification delivery.
//!
//! A [`MessageSink`] transmits one already-sized message. The [`Notifier`]
//! sits in front of it, splits oversized text with
//! [`split_message`](crate::chunk::split_message), bounds every send with a
//! deadline, and swallows delivery failures after logging them so the run
//! always continues.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::chunk::split_message;

/// Default maximum message length, kept under Telegram's 4096 limit.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4000;

/// Default deadline for delivering one message.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors reported by a [`MessageSink`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The sink did not finish within the send deadline.
    #[error("send timed out after {0}ms")]
    Timeout(u128),

    /// The messaging endpoint answered with a non-success status.
    #[error("message rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Transport that delivers a single message.
pub trait MessageSink {
    /// Send `text` as one message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the message was not accepted.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Chunking, failure-tolerant front end to a [`MessageSink`].
pub struct Notifier<S> {
    sink: S,
    max_len: usize,
    send_timeout: Duration,
}

impl<S: MessageSink> Notifier<S> {
    /// Wrap `sink`, splitting messages longer than `max_len` characters.
    ///
    /// Each send is bounded by [`DEFAULT_SEND_TIMEOUT`].
    pub const fn new(sink: S, max_len: usize) -> Self {
        Self {
            sink,
            max_len,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Replace the per-message send deadline.
    #[must_use]
    pub const fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Borrow the underlying sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Deliver one message, logging instead of returning failures.
    ///
    /// A send still pending after the deadline counts as failed. Returns
    /// whether the sink accepted the message.
    pub async fn deliver(&self, text: &str) -> bool {
        let result = match timeout(self.send_timeout, self.sink.send(text)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(NotifyError::Timeout(self.send_timeout.as_millis())),
        };
        match result {
            Ok(()) => {
                info!(chars = text.chars().count(), "notification sent");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to send notification");
                false
            }
        }
    }

    /// Split `text` into chunks of at most `max_len` characters and deliver
    /// each in order.
    ///
    /// Whitespace-only chunks are skipped. Returns the number of chunks the
    /// sink accepted.
    pub async fn split_and_send(&self, text: &str, max_len: usize) -> usize {
        let chunks = split_message(text, max_len);
        if chunks.len() > 1 {
            debug!(chunks = chunks.len(), max_len, "message split");
        }

        let mut delivered = 0usize;
        for chunk in &chunks {
            if chunk.trim().is_empty() {
                debug!("skipping empty chunk");
                continue;
            }
            if self.deliver(chunk).await {
                delivered = delivered.saturating_add(1);
            }
        }
        delivered
    }

    /// [`split_and_send`](Self::split_and_send) with the configured limit.
    pub async fn notify(&self, text: &str) -> usize {
        self.split_and_send(text, self.max_len).await
    }
}
