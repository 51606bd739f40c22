//! Decoded syslog event types

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Named components captured from a recognized message grammar
///
/// Keys are case-insensitive; inserting an existing key overwrites its
/// value (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMap {
    entries: HashMap<String, String>,
}

impl CaptureMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, overwriting any previous value for the key
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_ascii_uppercase(), value.into());
    }

    /// Look up a component by case-insensitive key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Number of captured components
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether anything was captured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (key, value) pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One decoded syslog message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogEvent {
    /// Wall-clock instant the datagram carrying this message arrived
    pub received_at: DateTime<Utc>,

    /// Sender address in string form
    pub source_ip: String,

    /// Severity 0 (Emergency) through 7 (Debug): `priority & 0x7`
    pub severity: u8,

    /// Facility code: `priority >> 3`
    pub facility: u16,

    /// Message body after the `<PRI>` prefix, leading whitespace trimmed
    pub message: String,

    /// Components captured from a recognized grammar, possibly empty
    pub captures: CaptureMap,
}

impl SyslogEvent {
    /// Human-readable severity name
    #[inline]
    pub fn severity_name(&self) -> &'static str {
        severity_name(self.severity)
    }

    /// Human-readable facility name
    #[inline]
    pub fn facility_name(&self) -> &'static str {
        facility_name(self.facility)
    }
}

/// A fully decoded message ready for sink dispatch
///
/// Owns a copy of the original UDP payload so the receive buffer can be
/// returned to the pool; sinks may retain a `DecodedMessage` across
/// calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// When the message happened, per its own timestamp when one was
    /// captured and parses; otherwise the reception instant
    pub occurred_at: DateTime<Utc>,

    /// Wall-clock instant the datagram arrived
    pub received_at: DateTime<Utc>,

    /// Owned copy of the original payload bytes
    pub payload: Vec<u8>,

    /// The decoded event
    pub event: SyslogEvent,
}

impl DecodedMessage {
    /// Build a message from an event, copying `payload`
    ///
    /// The occurrence time is the captured RFC 5424 timestamp when it
    /// parses as RFC 3339; RFC 3164 timestamps carry no year and stay
    /// in the capture map as text.
    pub fn new(event: SyslogEvent, payload: &[u8]) -> Self {
        let occurred_at = event
            .captures
            .get("TIMESTAMP")
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(event.received_at);

        Self {
            occurred_at,
            received_at: event.received_at,
            payload: payload.to_vec(),
            event,
        }
    }
}

/// Severity name per RFC 5424 numbering
pub fn severity_name(severity: u8) -> &'static str {
    match severity {
        0 => "Emergency",
        1 => "Alert",
        2 => "Critical",
        3 => "Error",
        4 => "Warning",
        5 => "Notice",
        6 => "Informational",
        7 => "Debug",
        _ => "Unknown",
    }
}

/// Facility name per RFC 5424 numbering
pub fn facility_name(facility: u16) -> &'static str {
    match facility {
        0 => "kern",
        1 => "user",
        2 => "mail",
        3 => "daemon",
        4 => "auth",
        5 => "syslog",
        6 => "lpr",
        7 => "news",
        8 => "uucp",
        9 => "cron",
        10 => "authpriv",
        11 => "ftp",
        12 => "ntp",
        13 => "audit",
        14 => "alert",
        15 => "clock",
        16 => "local0",
        17 => "local1",
        18 => "local2",
        19 => "local3",
        20 => "local4",
        21 => "local5",
        22 => "local6",
        23 => "local7",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_map_case_insensitive() {
        let mut map = CaptureMap::new();
        map.insert("Hostname", "host1");

        assert_eq!(map.get("HOSTNAME"), Some("host1"));
        assert_eq!(map.get("hostname"), Some("host1"));
        assert_eq!(map.get("HostName"), Some("host1"));
        assert_eq!(map.get("appname"), None);
    }

    #[test]
    fn test_capture_map_last_write_wins() {
        let mut map = CaptureMap::new();
        map.insert("msgid", "first");
        map.insert("MSGID", "second");

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("MsgId"), Some("second"));
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(severity_name(0), "Emergency");
        assert_eq!(severity_name(5), "Notice");
        assert_eq!(severity_name(7), "Debug");
        assert_eq!(severity_name(8), "Unknown");
    }

    #[test]
    fn test_facility_names() {
        assert_eq!(facility_name(1), "user");
        assert_eq!(facility_name(4), "auth");
        assert_eq!(facility_name(20), "local4");
        assert_eq!(facility_name(99), "unknown");
    }
}
