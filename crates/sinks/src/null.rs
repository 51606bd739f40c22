//! Null sink - counts and discards
//!
//! Used for benchmarking the pipeline without any I/O overhead and as
//! a drop target in tests: it records how many events and bytes it was
//! handed and throws them away.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use silo_pipeline::{DecodedMessage, Sink, SinkError};

/// Sink that discards every event it receives
#[derive(Debug, Default)]
pub struct NullSink {
    messages: AtomicU64,
    bytes: AtomicU64,
}

impl NullSink {
    /// Create a new null sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    #[inline]
    pub fn messages_received(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// Payload bytes received so far
    #[inline]
    pub fn bytes_received(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Sink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    async fn emit(&self, message: &DecodedMessage) -> Result<(), SinkError> {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.bytes
            .fetch_add(message.payload.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(body: &str) -> DecodedMessage {
        let event = silo_syslog::parse(body.as_bytes(), Utc::now(), "192.0.2.1").unwrap();
        DecodedMessage::new(event, body.as_bytes())
    }

    #[tokio::test]
    async fn test_counts_and_discards() {
        let sink = NullSink::new();

        sink.emit(&message("<13>one")).await.unwrap();
        sink.emit(&message("<13>three")).await.unwrap();

        assert_eq!(sink.messages_received(), 2);
        assert_eq!(sink.bytes_received(), ("<13>one".len() + "<13>three".len()) as u64);
    }
}
