//! Datagram receiver
//!
//! Owns the ingest socket and drives a fixed set of concurrent receive
//! operations. Each operation leases one pooled buffer, waits for a
//! datagram, stamps it, and enqueues the frame into the bounded channel
//! before leasing the next buffer. The loop performs no parsing and no
//! allocation beyond pool interaction.
//!
//! # Socket Modes
//!
//! - [`SocketMode::Raw`] (default): a raw IP socket; every receive
//!   yields a whole IP datagram starting at the IP header, and the
//!   decode worker walks IP → UDP → syslog. Needs CAP_NET_RAW.
//! - [`SocketMode::Udp`]: a kernel-demultiplexed datagram socket bound
//!   to the syslog port; receives yield only the UDP payload, frames
//!   carry the peer address, and the decode worker goes straight to the
//!   syslog parser. Useful where raw sockets are unavailable.
//!
//! # Ordering
//!
//! No ordering is guaranteed across the concurrent receive operations;
//! the channel preserves insertion order and the single decode worker
//! preserves that order to the sinks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use crossfire::MAsyncTx;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use silo_packet::BufferPool;

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::DEFAULT_CONCURRENCY;

/// Socket receive buffer hint (SO_RCVBUF), sized for datagram bursts
const RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// How the ingest socket is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketMode {
    /// Raw IP socket: receives carry the full IP datagram
    #[default]
    Raw,
    /// Datagram socket: the kernel demultiplexes, receives carry only
    /// the UDP payload
    Udp,
}

/// Receiver configuration
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Address to bind
    pub bind_address: IpAddr,

    /// Listen port (used by the socket only in [`SocketMode::Udp`];
    /// raw sockets see every UDP datagram and the decode worker
    /// filters)
    pub port: u16,

    /// Socket mode
    pub mode: SocketMode,

    /// Number of concurrent receive operations
    pub concurrency: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 514,
            mode: SocketMode::Raw,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// One received datagram
///
/// Owns its leased buffer from reception until the decode worker
/// releases it; the pool reclaims the buffer only after the frame is
/// fully consumed.
#[derive(Debug)]
pub struct ReceivedFrame {
    /// Leased receive buffer, truncated to the datagram
    pub buffer: BytesMut,

    /// Datagram length in bytes
    pub len: usize,

    /// Wall-clock instant of reception
    pub received_at: DateTime<Utc>,

    /// Peer address; present only in [`SocketMode::Udp`], where the
    /// buffer holds a bare UDP payload instead of an IP datagram
    pub peer: Option<SocketAddr>,
}

impl ReceivedFrame {
    /// The datagram bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

/// The ingest socket plus its receive-task factory
pub struct Receiver {
    socket: Arc<UdpSocket>,
    config: ReceiverConfig,
    metrics: Arc<PipelineMetrics>,
}

impl Receiver {
    /// Open and bind the ingest socket
    ///
    /// Must be called from within a tokio runtime. Bind failures are
    /// fatal; for raw sockets a permission error almost always means
    /// the process lacks CAP_NET_RAW.
    pub fn bind(config: ReceiverConfig, metrics: Arc<PipelineMetrics>) -> Result<Self> {
        let (socket, described) = match config.mode {
            SocketMode::Raw => (
                raw_socket(config.bind_address),
                format!("raw:{}", config.bind_address),
            ),
            SocketMode::Udp => {
                let addr = SocketAddr::new(config.bind_address, config.port);
                (udp_socket(addr), format!("udp:{addr}"))
            }
        };

        let std_socket = socket.map_err(|e| PipelineError::Bind {
            address: described.clone(),
            source: e,
        })?;

        let socket = UdpSocket::from_std(std_socket).map_err(|e| PipelineError::Bind {
            address: described.clone(),
            source: e,
        })?;

        tracing::info!(
            address = %described,
            concurrency = config.concurrency,
            "receiver socket bound"
        );

        Ok(Self {
            socket: Arc::new(socket),
            config,
            metrics,
        })
    }

    /// Local address of the bound socket (meaningful in Udp mode)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawn the configured number of receive operations
    ///
    /// Each task owns one clone of the frame sender; the channel closes
    /// once every task has exited and dropped its sender, which is what
    /// lets the decode worker finish its drain.
    pub fn spawn(
        self,
        pool: Arc<BufferPool>,
        tx: MAsyncTx<ReceivedFrame>,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        (0..self.config.concurrency)
            .map(|id| {
                let op = ReceiveOp {
                    id,
                    socket: Arc::clone(&self.socket),
                    mode: self.config.mode,
                    pool: Arc::clone(&pool),
                    tx: tx.clone(),
                    cancel: cancel.clone(),
                    metrics: Arc::clone(&self.metrics),
                };
                tokio::spawn(op.run())
            })
            .collect()
    }
}

/// One of the N concurrent receive operations
struct ReceiveOp {
    id: usize,
    socket: Arc<UdpSocket>,
    mode: SocketMode,
    pool: Arc<BufferPool>,
    tx: MAsyncTx<ReceivedFrame>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
}

impl ReceiveOp {
    async fn run(self) {
        tracing::debug!(op = self.id, "receive operation started");

        loop {
            let mut buf = self.pool.lease();
            buf.resize(self.pool.buffer_capacity(), 0);

            // None means cancellation won the race; the recv future and
            // its borrow of the buffer are gone once the select returns
            let received = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => None,
                recv = self.socket.recv_from(&mut buf) => Some(recv),
            };

            match received {
                None => {
                    self.pool.release(buf);
                    break;
                }
                Some(Ok((len, peer))) => {
                    let received_at = Utc::now();
                    self.metrics.record_datagram(len as u64);
                    buf.truncate(len);

                    let frame = ReceivedFrame {
                        buffer: buf,
                        len,
                        received_at,
                        peer: (self.mode == SocketMode::Udp).then_some(peer),
                    };

                    // Suspends while the channel is full: back-pressure,
                    // never a drop. The worker keeps draining until the
                    // senders are gone, so this completes even during
                    // shutdown.
                    if let Err(e) = self.tx.send(frame).await {
                        self.pool.release(e.0.buffer);
                        break;
                    }
                }
                Some(Err(e)) => {
                    self.pool.release(buf);
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    tracing::debug!(op = self.id, error = %e, "recv error");
                }
            }
        }

        tracing::debug!(op = self.id, "receive operation stopped");
    }
}

/// Raw IP socket: `socket(AF_INET, SOCK_RAW, IPPROTO_UDP)`
///
/// Receives every UDP datagram addressed to the host, IP header
/// included.
fn raw_socket(addr: IpAddr) -> std::io::Result<std::net::UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::RAW, Some(Protocol::UDP))?;
    set_recv_buffer(&socket);
    socket.bind(&SocketAddr::new(addr, 0).into())?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

/// Kernel-demultiplexed datagram socket bound to the syslog port
fn udp_socket(addr: SocketAddr) -> std::io::Result<std::net::UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    set_recv_buffer(&socket);
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

fn set_recv_buffer(socket: &Socket) {
    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
        tracing::warn!(
            error = %e,
            requested_size = RECV_BUFFER_SIZE,
            "failed to set SO_RCVBUF"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReceiverConfig::default();

        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 514);
        assert_eq!(config.mode, SocketMode::Raw);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_frame_data_respects_len() {
        let mut buffer = BytesMut::with_capacity(32);
        buffer.extend_from_slice(b"payload");

        let frame = ReceivedFrame {
            buffer,
            len: 7,
            received_at: Utc::now(),
            peer: None,
        };

        assert_eq!(frame.data(), b"payload");
    }

    #[tokio::test]
    async fn test_udp_mode_binds_ephemeral_port() {
        let config = ReceiverConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            mode: SocketMode::Udp,
            concurrency: 1,
        };

        let receiver = Receiver::bind(config, Arc::new(PipelineMetrics::new())).unwrap();
        let addr = receiver.local_addr().unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(addr.port(), 0);
    }
}
