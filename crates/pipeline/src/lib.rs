//! Silo Pipeline
//!
//! The async pipeline that connects the wire to the sinks.
//!
//! # Architecture
//!
//! ```text
//! [Receiver]                                  [Decode Worker]          [Sinks]
//!  raw socket ──┐  lease                                                ┌──→ stdout
//!  N receive    ├──────→ bounded channel ──→ IP → UDP → syslog ──→ Sink ┤
//!  operations ──┘  buffer  (ReceivedFrame)         │                    └──→ ...
//!                     ↑                            │ release
//!                     └────────── BufferPool ←─────┘
//! ```
//!
//! # Key Design
//!
//! - **Hot receive loop**: N concurrent receive operations share the
//!   socket; each holds exactly one pooled buffer and does no parsing.
//! - **Back-pressure**: the frame channel is bounded; receive operations
//!   suspend when it is full and never drop or reorder.
//! - **Single decode worker**: decoding is CPU-light next to the I/O, and
//!   one consumer preserves channel order all the way to the sinks.
//! - **Fault isolation**: per-datagram parse failures are counted and
//!   dropped; sink faults are logged and suppressed; only bind failures
//!   are fatal.
//! - **Cancellation**: one root token; receive tasks watch it at every
//!   suspend point, and the worker drains the channel once the receive
//!   tasks drop their senders.

mod collector;
mod decode;
mod dispatch;
mod error;
mod metrics;
mod receiver;

pub use collector::{Collector, CollectorConfig, State};
pub use decode::{decode_datagram, DecodeFilter, DecodeWorker, Rejection};
pub use dispatch::{DispatchOutcome, Dispatcher, Sink, SinkError};
pub use error::{PipelineError, Result};
pub use metrics::{PipelineMetrics, PipelineSnapshot};
pub use receiver::{ReceivedFrame, Receiver, ReceiverConfig, SocketMode};

// Re-export the event types sinks consume
pub use silo_syslog::{DecodedMessage, SyslogEvent};

/// Default number of concurrent receive operations
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default frame channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default number of pre-allocated receive buffers
pub const DEFAULT_POOL_SIZE: usize = 16;
