//! Baseline syslog parse
//!
//! Extracts the mandatory `<PRI>` prefix and derives severity and
//! facility from it; everything after the closing `>` is the message
//! body. Grammar capture (RFC 5424 / RFC 3164) runs on top of the body
//! and never fails the parse.

use chrono::{DateTime, Utc};

use crate::capture;
use crate::error::SyslogError;
use crate::event::{CaptureMap, SyslogEvent};

/// Parse one syslog message
///
/// `input` is the raw UDP payload; a trailing newline (LF or CRLF) is
/// tolerated. Byte 0 must be `<` followed by a numeric priority and `>`
/// - severity is `priority & 0x7` and facility is `priority >> 3`. The
/// body is decoded as UTF-8 (lossily) with leading whitespace trimmed.
pub fn parse(
    input: &[u8],
    received_at: DateTime<Utc>,
    source_ip: &str,
) -> Result<SyslogEvent, SyslogError> {
    let input = trim_trailing_newline(input);

    if input.is_empty() {
        return Err(SyslogError::EmptyInput);
    }
    if input[0] != b'<' {
        return Err(SyslogError::InvalidFormat);
    }

    let close = input
        .iter()
        .position(|&b| b == b'>')
        .ok_or(SyslogError::InvalidFormat)?;

    let digits = &input[1..close];
    let priority = std::str::from_utf8(digits)
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| SyslogError::InvalidPriority {
            text: String::from_utf8_lossy(digits).into_owned(),
        })?;

    let body = trim_leading_whitespace(&input[close + 1..]);
    let message = String::from_utf8_lossy(body).into_owned();

    let mut event = SyslogEvent {
        received_at,
        source_ip: source_ip.to_owned(),
        severity: (priority & 0x7) as u8,
        facility: priority >> 3,
        message,
        captures: CaptureMap::new(),
    };

    // Best-effort: an unrecognized body leaves the captures empty
    capture::apply(&mut event);

    Ok(event)
}

/// Trim trailing newline from a message (LF or CRLF)
#[inline]
pub fn trim_trailing_newline(data: &[u8]) -> &[u8] {
    let mut end = data.len();

    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && data[end - 1] == b'\r' {
            end -= 1;
        }
    }

    &data[..end]
}

#[inline]
fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[start..]
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod parser_test;
