//! Syslog parsing error types

use thiserror::Error;

/// Errors produced by the baseline syslog parse
///
/// Grammar-capture failures are not errors; only a missing or broken
/// `<PRI>` prefix rejects a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyslogError {
    /// The input has no bytes at all
    #[error("empty syslog message")]
    EmptyInput,

    /// The input does not start with a `<PRI>` prefix
    #[error("missing <PRI> prefix")]
    InvalidFormat,

    /// The priority between `<` and `>` is not a number
    #[error("invalid priority '{text}'")]
    InvalidPriority {
        /// What stood where digits were expected
        text: String,
    },
}
