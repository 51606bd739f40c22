//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the settings file
    #[error("failed to access settings file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse JSON
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Validation error - bind address does not parse
    #[error("invalid ip_address '{value}': not an IPv4 or IPv6 address")]
    InvalidAddress {
        /// The offending value
        value: String,
    },

    /// Validation error - port must be non-zero
    #[error("invalid settings: {field} must be non-zero")]
    InvalidPort {
        /// Name of the offending field
        field: &'static str,
    },
}
