//! Decode worker
//!
//! A single task that consumes frames from the channel in FIFO order
//! and chains the IP → UDP → syslog parsers. One consumer keeps the
//! sink-observed order identical to channel order.
//!
//! Every rejection is local: the frame is counted, logged at debug, and
//! dropped; the pipeline keeps running. The leased buffer is released
//! on every path.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crossfire::AsyncRx;

use silo_packet::{protocol, BufferPool, IpPacket, PacketError, UdpDatagram};
use silo_syslog::{DecodedMessage, SyslogError};

use crate::dispatch::Dispatcher;
use crate::metrics::PipelineMetrics;
use crate::receiver::ReceivedFrame;

/// Destination filter applied to raw-socket frames
///
/// A raw socket sees every UDP datagram addressed to the host; only
/// those aimed at the collector's bind address and port become events.
#[derive(Debug, Clone, Copy)]
pub struct DecodeFilter {
    /// Configured bind address; unspecified accepts any destination
    pub bind_address: IpAddr,
    /// Configured syslog port
    pub port: u16,
}

impl DecodeFilter {
    fn accepts(&self, destination: IpAddr, port: u16) -> bool {
        if port != self.port {
            return false;
        }
        self.bind_address.is_unspecified() || destination == self.bind_address
    }
}

/// Why a frame produced no event
#[derive(Debug)]
pub enum Rejection {
    /// IP header decode failed
    Ip(PacketError),
    /// Transport protocol is not UDP
    NonUdp(u8),
    /// IPv4 fragment or IPv6 extension chain: payload stays opaque
    Opaque,
    /// UDP header decode failed
    Udp(PacketError),
    /// Destination address or port is not ours
    Filtered,
    /// Syslog parse failed
    Syslog(SyslogError),
}

/// Decode one raw IP datagram into a dispatchable message
///
/// This is the whole per-frame pipeline in order: IP parse, protocol
/// check, fragment/extension opacity, UDP parse, destination filter,
/// syslog parse, and the mandatory payload copy into the owned message.
pub fn decode_datagram(
    data: &[u8],
    received_at: DateTime<Utc>,
    filter: &DecodeFilter,
) -> Result<DecodedMessage, Rejection> {
    let packet = IpPacket::parse(data, received_at).map_err(Rejection::Ip)?;

    if packet.protocol() != protocol::UDP {
        return Err(Rejection::NonUdp(packet.protocol()));
    }

    // No reassembly: fragmented payloads and extension chains stay opaque
    if packet.is_fragment() || packet.has_extensions() {
        return Err(Rejection::Opaque);
    }

    let udp = UdpDatagram::parse(packet.payload()).map_err(Rejection::Udp)?;

    if !filter.accepts(packet.destination(), udp.destination_port) {
        return Err(Rejection::Filtered);
    }

    let event = silo_syslog::parse(
        udp.payload,
        received_at,
        &packet.source().to_string(),
    )
    .map_err(Rejection::Syslog)?;

    Ok(DecodedMessage::new(event, udp.payload))
}

/// Decode a kernel-demultiplexed frame: the buffer is already the UDP
/// payload and the kernel has done the filtering
fn decode_payload(
    data: &[u8],
    received_at: DateTime<Utc>,
    peer: SocketAddr,
) -> Result<DecodedMessage, Rejection> {
    let event = silo_syslog::parse(data, received_at, &peer.ip().to_string())
        .map_err(Rejection::Syslog)?;
    Ok(DecodedMessage::new(event, data))
}

/// The single decoding task
pub struct DecodeWorker {
    rx: AsyncRx<ReceivedFrame>,
    pool: Arc<BufferPool>,
    dispatcher: Dispatcher,
    metrics: Arc<PipelineMetrics>,
    filter: DecodeFilter,
}

impl DecodeWorker {
    /// Create a worker consuming `rx`
    pub fn new(
        rx: AsyncRx<ReceivedFrame>,
        pool: Arc<BufferPool>,
        dispatcher: Dispatcher,
        metrics: Arc<PipelineMetrics>,
        filter: DecodeFilter,
    ) -> Self {
        Self {
            rx,
            pool,
            dispatcher,
            metrics,
            filter,
        }
    }

    /// Consume frames until the channel closes
    ///
    /// Cancellation reaches this task indirectly: the receive
    /// operations drop their senders, and this loop drains whatever is
    /// still queued before the channel reports closure.
    pub async fn run(self) {
        let DecodeWorker {
            rx,
            pool,
            dispatcher,
            metrics,
            filter,
        } = self;

        tracing::debug!(sinks = dispatcher.sink_count(), "decode worker started");

        while let Ok(frame) = rx.recv().await {
            handle(frame, &pool, &dispatcher, &metrics, &filter).await;
        }

        tracing::debug!("decode worker stopped");
    }
}

async fn handle(
    frame: ReceivedFrame,
    pool: &Arc<BufferPool>,
    dispatcher: &Dispatcher,
    metrics: &Arc<PipelineMetrics>,
    filter: &DecodeFilter,
) {
    let ReceivedFrame {
        buffer,
        len,
        received_at,
        peer,
    } = frame;
    let data = &buffer[..len];

    let decoded = match peer {
        Some(peer) => decode_payload(data, received_at, peer),
        None => decode_datagram(data, received_at, filter),
    };

    match decoded {
        Ok(message) => {
            let outcome = dispatcher.dispatch(&message).await;
            metrics.record_dispatched();
            metrics.record_sink_faults(outcome.faults as u64);
        }
        Err(rejection) => record_rejection(metrics, rejection),
    }

    pool.release(buffer);
}

fn record_rejection(metrics: &Arc<PipelineMetrics>, rejection: Rejection) {
    match rejection {
        Rejection::Ip(e) => {
            metrics.record_ip_error();
            tracing::debug!(error = %e, "dropped datagram: IP parse failed");
        }
        Rejection::Opaque => {
            metrics.record_ip_error();
            tracing::debug!("dropped datagram: fragmented or extended, payload opaque");
        }
        Rejection::NonUdp(proto) => {
            tracing::trace!(protocol = proto, "ignored non-UDP datagram");
        }
        Rejection::Udp(e) => {
            metrics.record_udp_error();
            tracing::debug!(error = %e, "dropped datagram: UDP parse failed");
        }
        Rejection::Filtered => {
            tracing::trace!("ignored datagram for another destination");
        }
        Rejection::Syslog(e) => {
            metrics.record_syslog_error();
            tracing::debug!(error = %e, "dropped payload: syslog parse failed");
        }
    }
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
