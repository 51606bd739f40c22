//! Collector lifecycle
//!
//! The supervisor that owns the pipeline: it binds the socket, spawns
//! the receive operations and the decode worker, and joins them on
//! shutdown.
//!
//! # States
//!
//! ```text
//! Created ──start──→ Running ──stop──→ Stopping ──join──→ Stopped
//! ```
//!
//! `start` from `Running` and `stop` from `Created` are no-ops (the
//! former with a warning). `stop` is idempotent. Cancellation is
//! hierarchical: one root token feeds a child token shared by every
//! receive operation; the decode worker learns of shutdown by the
//! channel closing and drains what remains.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use silo_packet::{BufferPool, MAX_DATAGRAM_SIZE};

use crate::decode::{DecodeFilter, DecodeWorker};
use crate::dispatch::{Dispatcher, Sink};
use crate::error::Result;
use crate::metrics::{PipelineMetrics, PipelineSnapshot};
use crate::receiver::{Receiver, ReceiverConfig, SocketMode};
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_CONCURRENCY, DEFAULT_POOL_SIZE};

/// Collector lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Built but not started
    Created,
    /// Pipeline tasks are up
    Running,
    /// Cancellation signalled, tasks winding down
    Stopping,
    /// All tasks joined, channel drained
    Stopped,
}

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Address to bind
    pub bind_address: IpAddr,

    /// Syslog port: the destination-port filter in raw mode, the bound
    /// port in udp mode
    pub port: u16,

    /// Socket mode
    pub mode: SocketMode,

    /// Number of concurrent receive operations
    pub concurrency: usize,

    /// Frame channel capacity; receive operations suspend when full
    pub channel_capacity: usize,

    /// Pre-allocated receive buffers
    pub pool_size: usize,

    /// Size of each receive buffer
    pub buffer_size: usize,

    /// Optional per-sink emit timeout
    pub sink_timeout: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 514,
            mode: SocketMode::Raw,
            concurrency: DEFAULT_CONCURRENCY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            pool_size: DEFAULT_POOL_SIZE,
            buffer_size: MAX_DATAGRAM_SIZE,
            sink_timeout: None,
        }
    }
}

/// The pipeline supervisor
///
/// Register sinks first, then `start`. All methods take `&self`; the
/// collector is meant to live in an `Arc` shared with a signal handler.
pub struct Collector {
    config: CollectorConfig,
    state: Mutex<State>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
    pool: Arc<BufferPool>,
    dispatcher: Mutex<Dispatcher>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Collector {
    /// Create a collector in the `Created` state
    pub fn new(config: CollectorConfig) -> Self {
        let pool = Arc::new(BufferPool::new(config.pool_size, config.buffer_size));

        Self {
            config,
            state: Mutex::new(State::Created),
            cancel: CancellationToken::new(),
            metrics: Arc::new(PipelineMetrics::new()),
            pool,
            dispatcher: Mutex::new(Dispatcher::new()),
            tasks: Mutex::new(Vec::new()),
            local_addr: Mutex::new(None),
        }
    }

    /// Register a sink; must happen before `start`
    pub fn register_sink(&self, sink: Arc<dyn Sink>) {
        self.dispatcher.lock().register(sink);
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Pipeline metrics
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// The receive buffer pool
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Bound socket address, once started (meaningful in udp mode)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Bind the socket and spawn the pipeline tasks
    ///
    /// Must be called from within a tokio runtime. Bind failures leave
    /// the collector in `Created`. Starting a running collector is a
    /// no-op with a warning.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            State::Created => {}
            State::Running => {
                tracing::warn!("collector already running, start ignored");
                return Ok(());
            }
            current => {
                tracing::warn!(state = ?current, "collector cannot start from this state");
                return Ok(());
            }
        }

        let receiver = Receiver::bind(
            ReceiverConfig {
                bind_address: self.config.bind_address,
                port: self.config.port,
                mode: self.config.mode,
                concurrency: self.config.concurrency,
            },
            Arc::clone(&self.metrics),
        )?;

        if let Ok(addr) = receiver.local_addr() {
            *self.local_addr.lock() = Some(addr);
        }

        let (tx, rx) = crossfire::mpsc::bounded_async(self.config.channel_capacity);

        let mut dispatcher = std::mem::take(&mut *self.dispatcher.lock());
        if let Some(timeout) = self.config.sink_timeout {
            dispatcher.set_timeout(timeout);
        }

        let worker = DecodeWorker::new(
            rx,
            Arc::clone(&self.pool),
            dispatcher,
            Arc::clone(&self.metrics),
            DecodeFilter {
                bind_address: self.config.bind_address,
                port: self.config.port,
            },
        );

        // One child token shared by all receive operations; the worker
        // shuts down via channel closure instead, so it can drain
        let mut tasks = receiver.spawn(
            Arc::clone(&self.pool),
            tx,
            self.cancel.child_token(),
        );
        tasks.push(tokio::spawn(worker.run()));
        *self.tasks.lock() = tasks;

        *state = State::Running;
        tracing::info!(
            bind = %self.config.bind_address,
            port = self.config.port,
            mode = ?self.config.mode,
            concurrency = self.config.concurrency,
            channel_capacity = self.config.channel_capacity,
            "collector started"
        );

        Ok(())
    }

    /// Signal shutdown
    ///
    /// Idempotent; before `start` it is a no-op.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match *state {
            State::Running => {
                *state = State::Stopping;
                tracing::info!("collector stopping");
                self.cancel.cancel();
            }
            State::Created => {
                tracing::debug!("stop before start is a no-op");
            }
            State::Stopping | State::Stopped => {}
        }
    }

    /// Wait for every pipeline task to finish and return the final
    /// metrics snapshot
    ///
    /// Completes once all receive operations have exited, the channel
    /// has drained, and the last sink dispatch has returned.
    pub async fn join(&self) -> PipelineSnapshot {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }

        *self.state.lock() = State::Stopped;

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            datagrams_received = snapshot.datagrams_received,
            bytes_received = snapshot.bytes_received,
            dispatched = snapshot.dispatched,
            parse_errors = snapshot.parse_errors_total(),
            sink_faults = snapshot.sink_faults,
            elapsed = ?snapshot.elapsed,
            "collector stopped"
        );

        snapshot
    }
}
