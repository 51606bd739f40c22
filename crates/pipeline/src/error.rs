//! Pipeline error types
//!
//! Only startup failures surface here; per-datagram decode failures are
//! counted in the metrics and never abort the pipeline.

use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Socket creation or bind failed - fatal at startup
    ///
    /// Raw sockets need elevated privileges (CAP_NET_RAW) on most
    /// platforms; the message says so when that is the likely cause.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame channel closed unexpectedly
    #[error("frame channel closed")]
    ChannelClosed,
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
