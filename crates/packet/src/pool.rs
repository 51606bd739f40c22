//! Lock-free pool of receive buffers
//!
//! Pre-allocates fixed-size `BytesMut` buffers so the receive loop never
//! allocates in the hot path. Uses a lock-free queue for O(1) lease and
//! release.
//!
//! Every receive operation leases exactly one buffer and holds it until
//! the frame has been decoded; the decode worker releases it. When the
//! free list is empty a fresh buffer is allocated (recorded as a miss)
//! and joins the pool on release.
//!
//! # Example
//!
//! ```ignore
//! let pool = BufferPool::new(16, MAX_DATAGRAM_SIZE);
//!
//! let mut buf = pool.lease();
//! buf.resize(pool.buffer_capacity(), 0);
//! let len = socket.recv(&mut buf).await?;
//!
//! // ... decode &buf[..len] ...
//! pool.release(buf);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// Lock-free pool of reusable receive buffers
///
/// All buffers have the same capacity. The pool hands out at most one
/// tenant per buffer; a leased buffer is owned by its holder until it is
/// released back.
pub struct BufferPool {
    /// Free list
    queue: ArrayQueue<BytesMut>,

    /// Capacity of every buffer
    buffer_capacity: usize,

    /// Lease/release accounting
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
    leased: AtomicU64,
}

impl BufferPool {
    /// Create a pool with `pool_size` pre-allocated buffers of
    /// `buffer_capacity` bytes each
    pub fn new(pool_size: usize, buffer_capacity: usize) -> Self {
        let queue = ArrayQueue::new(pool_size);

        for _ in 0..pool_size {
            // Filling an empty queue cannot fail
            let _ = queue.push(BytesMut::with_capacity(buffer_capacity));
        }

        Self {
            queue,
            buffer_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
            leased: AtomicU64::new(0),
        }
    }

    /// Lease a buffer
    ///
    /// Returns a pooled buffer when one is free, otherwise allocates a
    /// fresh one. The buffer has zero length; callers resize it before
    /// reading into it.
    #[inline]
    pub fn lease(&self) -> BytesMut {
        self.leased.fetch_add(1, Ordering::Relaxed);

        match self.queue.pop() {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Release a buffer back to the pool
    ///
    /// The buffer is cleared; its contents are overwritten by the next
    /// tenant. A full free list drops the buffer instead.
    #[inline]
    pub fn release(&self, mut buf: BytesMut) {
        self.leased.fetch_sub(1, Ordering::Relaxed);
        buf.clear();

        // Buffers that lost capacity (e.g. to a split) are not worth pooling
        if buf.capacity() >= self.buffer_capacity {
            match self.queue.push(buf) {
                Ok(()) => {
                    self.returns.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    self.drops.fetch_add(1, Ordering::Relaxed);
                }
            }
        } else {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of buffers currently leased out
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.leased.load(Ordering::Relaxed)
    }

    /// Number of buffers currently free
    #[inline]
    pub fn available(&self) -> usize {
        self.queue.len()
    }

    /// Maximum number of pooled buffers
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Capacity of each buffer in bytes
    #[inline]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Point-in-time accounting snapshot
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
            in_flight: self.leased.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("available", &self.available())
            .field("capacity", &self.capacity())
            .field("buffer_capacity", &self.buffer_capacity)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Point-in-time snapshot of pool accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Leases satisfied from the free list
    pub hits: u64,
    /// Leases that had to allocate
    pub misses: u64,
    /// Buffers returned to the free list
    pub returns: u64,
    /// Buffers dropped on release (free list full or undersized)
    pub drops: u64,
    /// Buffers leased out right now
    pub in_flight: u64,
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
