//! Pipeline metrics
//!
//! Atomic counters for the receive and decode path. All operations use
//! relaxed ordering; values are eventually consistent, not real-time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for the whole pipeline
///
/// Shared between the receive tasks, the decode worker, and the
/// collector; all methods are safe to call concurrently.
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Datagrams received from the socket
    datagrams_received: AtomicU64,

    /// Bytes received from the socket
    bytes_received: AtomicU64,

    /// Datagrams rejected at the IP layer (including opaque fragments
    /// and extension chains)
    parse_errors_ip: AtomicU64,

    /// Datagrams rejected at the UDP layer
    parse_errors_udp: AtomicU64,

    /// Payloads rejected by the syslog parser
    parse_errors_syslog: AtomicU64,

    /// Messages handed to the sink dispatcher
    dispatched: AtomicU64,

    /// Individual sink emits that failed or timed out
    sink_faults: AtomicU64,

    /// When the pipeline came up
    started: Instant,
}

impl PipelineMetrics {
    /// Create a new instance with all counters at zero
    pub fn new() -> Self {
        Self {
            datagrams_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            parse_errors_ip: AtomicU64::new(0),
            parse_errors_udp: AtomicU64::new(0),
            parse_errors_syslog: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            sink_faults: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record one received datagram of `bytes` bytes
    #[inline]
    pub fn record_datagram(&self, bytes: u64) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an IP-layer rejection
    #[inline]
    pub fn record_ip_error(&self) {
        self.parse_errors_ip.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a UDP-layer rejection
    #[inline]
    pub fn record_udp_error(&self) {
        self.parse_errors_udp.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a syslog rejection
    #[inline]
    pub fn record_syslog_error(&self) {
        self.parse_errors_syslog.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message handed to the dispatcher
    #[inline]
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` failed sink emits
    #[inline]
    pub fn record_sink_faults(&self, count: u64) {
        if count > 0 {
            self.sink_faults.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Datagrams received so far
    #[inline]
    pub fn datagrams_received(&self) -> u64 {
        self.datagrams_received.load(Ordering::Relaxed)
    }

    /// Messages dispatched so far
    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            parse_errors_ip: self.parse_errors_ip.load(Ordering::Relaxed),
            parse_errors_udp: self.parse_errors_udp.load(Ordering::Relaxed),
            parse_errors_syslog: self.parse_errors_syslog.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            sink_faults: self.sink_faults.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSnapshot {
    /// Datagrams received from the socket
    pub datagrams_received: u64,
    /// Bytes received from the socket
    pub bytes_received: u64,
    /// IP-layer rejections (including opaque fragments and chains)
    pub parse_errors_ip: u64,
    /// UDP-layer rejections
    pub parse_errors_udp: u64,
    /// Syslog rejections
    pub parse_errors_syslog: u64,
    /// Messages handed to the dispatcher
    pub dispatched: u64,
    /// Failed sink emits
    pub sink_faults: u64,
    /// Time since the pipeline came up
    pub elapsed: Duration,
}

impl PipelineSnapshot {
    /// Total rejections across all parse layers
    #[inline]
    pub fn parse_errors_total(&self) -> u64 {
        self.parse_errors_ip + self.parse_errors_udp + self.parse_errors_syslog
    }
}
