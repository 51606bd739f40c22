//! Sink trait and event dispatch
//!
//! The decode worker hands each [`DecodedMessage`] to the dispatcher,
//! which invokes every registered sink in registration order. A sink
//! fault is logged and suppressed so one failing sink can never stall
//! or destabilize delivery to the others.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use silo_syslog::DecodedMessage;

/// Errors a sink may return from [`Sink::emit`]
///
/// All of them are per-event: the dispatcher logs the fault and moves
/// on.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error while writing the event
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Write failed for a sink-specific reason
    #[error("write failed: {0}")]
    Write(String),

    /// The emit exceeded the dispatcher's per-sink timeout
    #[error("emit timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The sink is no longer accepting events
    #[error("sink closed")]
    Closed,
}

/// A destination for decoded syslog events
///
/// Implementations must not block; an emit should complete or yield
/// promptly. The message is borrowed for the duration of the call -
/// sinks that need it longer clone it (it owns its payload copy).
#[async_trait]
pub trait Sink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Deliver one decoded message
    async fn emit(&self, message: &DecodedMessage) -> Result<(), SinkError>;
}

/// Outcome of dispatching one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Sinks that accepted the message
    pub delivered: usize,
    /// Sinks that faulted (or timed out)
    pub faults: usize,
}

/// Invokes registered sinks sequentially, suppressing their faults
pub struct Dispatcher {
    sinks: Vec<Arc<dyn Sink>>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with no sinks and no per-sink timeout
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            timeout: None,
        }
    }

    /// Bound every emit by `timeout`; an overrun counts as a fault
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Register a sink; sinks run in registration order
    pub fn register(&mut self, sink: Arc<dyn Sink>) {
        tracing::debug!(sink = %sink.name(), "registered sink");
        self.sinks.push(sink);
    }

    /// Number of registered sinks
    #[inline]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `message` to every sink in order
    ///
    /// Faults are logged at warn level and never propagate.
    pub async fn dispatch(&self, message: &DecodedMessage) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            delivered: 0,
            faults: 0,
        };

        for sink in &self.sinks {
            let result = match self.timeout {
                Some(timeout) => match tokio::time::timeout(timeout, sink.emit(message)).await {
                    Ok(result) => result,
                    Err(_) => Err(SinkError::Timeout { timeout }),
                },
                None => sink.emit(message).await,
            };

            match result {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.faults += 1;
                    tracing::warn!(
                        sink = %sink.name(),
                        source_ip = %message.event.source_ip,
                        error = %e,
                        "sink emit failed, continuing"
                    );
                }
            }
        }

        outcome
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use silo_syslog::parse;

    fn message(body: &str) -> DecodedMessage {
        let event = parse(body.as_bytes(), Utc::now(), "192.0.2.1").unwrap();
        DecodedMessage::new(event, body.as_bytes())
    }

    /// Sink that records delivered messages and can be told to fail
    struct RecordingSink {
        name: String,
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn emit(&self, message: &DecodedMessage) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Write("induced".into()));
            }
            self.seen.lock().push(message.event.message.clone());
            Ok(())
        }
    }

    /// Sink that never completes within any reasonable timeout
    struct StuckSink;

    #[async_trait]
    impl Sink for StuckSink {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn emit(&self, _message: &DecodedMessage) -> Result<(), SinkError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_in_registration_order() {
        let first = RecordingSink::new("first", false);
        let second = RecordingSink::new("second", false);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(first.clone());
        dispatcher.register(second.clone());
        assert_eq!(dispatcher.sink_count(), 2);

        let outcome = dispatcher.dispatch(&message("<13>one")).await;
        assert_eq!(outcome, DispatchOutcome { delivered: 2, faults: 0 });
        assert_eq!(first.seen.lock().as_slice(), ["one"]);
        assert_eq!(second.seen.lock().as_slice(), ["one"]);
    }

    #[tokio::test]
    async fn test_fault_does_not_stop_later_sinks() {
        let failing = RecordingSink::new("failing", true);
        let healthy = RecordingSink::new("healthy", false);

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(failing);
        dispatcher.register(healthy.clone());

        let outcome = dispatcher.dispatch(&message("<13>still delivered")).await;
        assert_eq!(outcome, DispatchOutcome { delivered: 1, faults: 1 });
        assert_eq!(healthy.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_no_sinks_is_harmless() {
        let dispatcher = Dispatcher::new();
        let outcome = dispatcher.dispatch(&message("<13>void")).await;
        assert_eq!(outcome, DispatchOutcome { delivered: 0, faults: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces_as_fault() {
        let healthy = RecordingSink::new("healthy", false);

        let mut dispatcher = Dispatcher::new();
        dispatcher.set_timeout(Duration::from_millis(50));
        dispatcher.register(Arc::new(StuckSink));
        dispatcher.register(healthy.clone());

        let outcome = dispatcher.dispatch(&message("<13>timed")).await;
        assert_eq!(outcome, DispatchOutcome { delivered: 1, faults: 1 });
        assert_eq!(healthy.seen.lock().len(), 1);
    }
}
