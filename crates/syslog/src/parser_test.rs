//! Tests for the baseline syslog parse

use chrono::Utc;

use crate::error::SyslogError;
use crate::event::DecodedMessage;
use crate::parser::{parse, trim_trailing_newline};

fn parse_str(input: &str) -> Result<crate::SyslogEvent, SyslogError> {
    parse(input.as_bytes(), Utc::now(), "192.0.2.1")
}

#[test]
fn test_baseline_priority_split() {
    // <13> = facility 1 (user), severity 5 (Notice)
    let event = parse_str("<13>Hello").unwrap();

    assert_eq!(event.severity, 5);
    assert_eq!(event.facility, 1);
    assert_eq!(event.severity_name(), "Notice");
    assert_eq!(event.facility_name(), "user");
    assert_eq!(event.message, "Hello");
    assert_eq!(event.source_ip, "192.0.2.1");
}

#[test]
fn test_priority_arithmetic() {
    for (pri, severity, facility) in [(0u16, 0u8, 0u16), (7, 7, 0), (34, 2, 4), (165, 5, 20), (191, 7, 23)] {
        let event = parse_str(&format!("<{pri}>x")).unwrap();
        assert_eq!(event.severity, severity, "pri {pri}");
        assert_eq!(event.facility, facility, "pri {pri}");
    }
}

#[test]
fn test_leading_whitespace_in_body_trimmed() {
    let event = parse_str("<13>   padded body").unwrap();
    assert_eq!(event.message, "padded body");
}

#[test]
fn test_trailing_newline_tolerated() {
    let event = parse_str("<13>line\n").unwrap();
    assert_eq!(event.message, "line");

    let event = parse_str("<13>line\r\n").unwrap();
    assert_eq!(event.message, "line");
}

#[test]
fn test_empty_input() {
    assert_eq!(parse_str("").unwrap_err(), SyslogError::EmptyInput);
    assert_eq!(parse_str("\n").unwrap_err(), SyslogError::EmptyInput);
}

#[test]
fn test_missing_pri_prefix() {
    assert_eq!(parse_str("no-pri-here").unwrap_err(), SyslogError::InvalidFormat);
    // Strict: byte 0 must be '<'
    assert_eq!(parse_str(" <13>late").unwrap_err(), SyslogError::InvalidFormat);
    // Opening bracket but no closing one
    assert_eq!(parse_str("<13 no close").unwrap_err(), SyslogError::InvalidFormat);
}

#[test]
fn test_invalid_priority() {
    assert_eq!(
        parse_str("<abc>x").unwrap_err(),
        SyslogError::InvalidPriority { text: "abc".into() }
    );
    assert_eq!(
        parse_str("<>x").unwrap_err(),
        SyslogError::InvalidPriority { text: "".into() }
    );
    assert_eq!(
        parse_str("<1 3>x").unwrap_err(),
        SyslogError::InvalidPriority { text: "1 3".into() }
    );
    // Numeric but absurd: overflows the priority field
    assert!(matches!(
        parse_str("<999999>x").unwrap_err(),
        SyslogError::InvalidPriority { .. }
    ));
}

#[test]
fn test_parse_is_idempotent() {
    let received_at = Utc::now();
    let input = b"<165>Aug 24 05:34:00 host1 app: msg";

    let first = parse(input, received_at, "10.0.0.1").unwrap();
    let second = parse(input, received_at, "10.0.0.1").unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_non_utf8_body_is_lossy() {
    let event = parse(b"<13>caf\xC3\xA9 \xFF", Utc::now(), "::1").unwrap();
    assert!(event.message.starts_with("café"));
    assert!(event.message.contains('\u{FFFD}'));
}

#[test]
fn test_decoded_message_copies_payload() {
    let payload = b"<13>Hello";
    let event = parse(payload, Utc::now(), "192.0.2.1").unwrap();
    let message = DecodedMessage::new(event, payload);

    assert_eq!(message.payload, payload);
    assert_eq!(message.occurred_at, message.received_at);
}

#[test]
fn test_decoded_message_occurrence_from_5424_timestamp() {
    let payload = b"<34>1 2003-10-11T22:14:15.003Z host app - ID47 - hi";
    let event = parse(payload, Utc::now(), "192.0.2.1").unwrap();
    let message = DecodedMessage::new(event, payload);

    assert_ne!(message.occurred_at, message.received_at);
    assert_eq!(
        message.occurred_at.to_rfc3339(),
        "2003-10-11T22:14:15.003+00:00"
    );
}

#[test]
fn test_trim_trailing_newline() {
    assert_eq!(trim_trailing_newline(b"hello\n"), b"hello");
    assert_eq!(trim_trailing_newline(b"hello\r\n"), b"hello");
    assert_eq!(trim_trailing_newline(b"hello"), b"hello");
    assert_eq!(trim_trailing_newline(b"\n"), b"");
    assert_eq!(trim_trailing_newline(b"\r\n"), b"");
    assert_eq!(trim_trailing_newline(b""), b"");
    assert_eq!(trim_trailing_newline(b"line1\nline2\n"), b"line1\nline2");
}
