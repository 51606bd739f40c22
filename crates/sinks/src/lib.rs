//! Silo Sinks
//!
//! Concrete destinations for decoded syslog events. Sinks implement
//! [`silo_pipeline::Sink`] and are registered with the collector before
//! start; the decode worker invokes them in registration order.

pub mod null;
pub mod stdout;

pub use null::NullSink;
pub use stdout::{StdoutConfig, StdoutSink};
