//! Silo Syslog Parsing
//!
//! Turns a UDP payload into a [`SyslogEvent`].
//!
//! # Protocol Support
//!
//! - **RFC 3164** (BSD syslog) - Legacy format, still widely used
//! - **RFC 5424** (IETF syslog) - Structured data support
//!
//! The baseline parse is always applied: the `<PRI>` prefix is required
//! and yields severity and facility, and the rest of the input is the
//! message body. Grammar capture on top of that is best-effort - a body
//! matching RFC 5424 (tried first) or RFC 3164 additionally fills the
//! event's capture map with the named message components, and a body
//! matching neither is not an error.

mod capture;
mod error;
mod event;
mod parser;

pub use capture::CaptureFormat;
pub use error::SyslogError;
pub use event::{facility_name, severity_name, CaptureMap, DecodedMessage, SyslogEvent};
pub use parser::{parse, trim_trailing_newline};
