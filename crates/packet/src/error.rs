//! Packet decoding error types

use thiserror::Error;

/// Errors produced by the IP and UDP decoders
///
/// Every variant is a per-datagram failure: the offending datagram is
/// dropped and counted, and the pipeline keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// The version nibble is neither 4 nor 6
    #[error("unsupported IP version {version}")]
    UnsupportedVersion { version: u8 },

    /// A header is too short or internally inconsistent
    #[error("malformed {layer} header: {reason}")]
    MalformedHeader {
        /// Which layer failed ("ipv4", "ipv6", "udp")
        layer: &'static str,
        /// What was wrong
        reason: &'static str,
    },

    /// The input ends before the length fields say it should
    #[error("truncated payload: need {expected} bytes, have {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
}
