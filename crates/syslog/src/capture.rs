//! Grammar capture for recognized message bodies
//!
//! RFC 5424 is tried first, then RFC 3164. A match fills the event's
//! capture map with the named message components; no match leaves the
//! event untouched. Fields transmitted as `-` (RFC 5424 nil) are
//! absent from the map.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::event::SyslogEvent;

/// Which grammar matched a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    /// RFC 5424: `VER TIMESTAMP HOSTNAME APP-NAME PROCID MSGID SD MSG`
    Rfc5424,
    /// RFC 3164: `Mmm DD HH:MM:SS HOSTNAME MSG`
    Rfc3164,
}

/// RFC 5424 header: version, RFC 3339 timestamp, then the five
/// `-`-or-value fields and the structured-data block
static RFC5424: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<ver>[1-9]\d{0,2}) (?P<timestamp>-|\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d{1,6})?(?:Z|[+-]\d{2}:\d{2})) (?P<hostname>-|\S{1,255}) (?P<appname>-|\S{1,48}) (?P<procid>-|\S{1,128}) (?P<msgid>-|\S{1,32}) (?P<sd>-|(?:\[[^\]]*\])+)(?: (?P<msg>.*))?$",
    )
    .expect("RFC 5424 pattern compiles")
});

/// RFC 3164 header: `Mmm DD HH:MM:SS` (single-digit days space-padded)
/// followed by the hostname
static RFC3164: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<timestamp>(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) (?: \d|\d{2}) \d{2}:\d{2}:\d{2}) (?P<hostname>\S+) (?P<msg>.*)$",
    )
    .expect("RFC 3164 pattern compiles")
});

/// Capture the components of `event.message` if a grammar matches
///
/// Returns the matching grammar, or `None` when the body matches
/// neither (which is not an error - the baseline fields stand alone).
pub fn apply(event: &mut SyslogEvent) -> Option<CaptureFormat> {
    if let Some(caps) = RFC5424.captures(&event.message) {
        let mut map = std::mem::take(&mut event.captures);
        for name in ["ver", "timestamp", "hostname", "appname", "procid", "msgid", "sd", "msg"] {
            if let Some(value) = caps.name(name).map(|m| m.as_str()) {
                if value != "-" {
                    map.insert(name, value);
                }
            }
        }
        event.captures = map;
        return Some(CaptureFormat::Rfc5424);
    }

    if let Some(caps) = RFC3164.captures(&event.message) {
        let mut map = std::mem::take(&mut event.captures);
        for name in ["timestamp", "hostname", "msg"] {
            if let Some(value) = caps.name(name).map(|m| m.as_str()) {
                map.insert(name, value);
            }
        }
        event.captures = map;
        return Some(CaptureFormat::Rfc3164);
    }

    None
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;
