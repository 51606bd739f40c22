//! Tests for the receive buffer pool

use crate::pool::BufferPool;

#[test]
fn test_prealloc_and_capacity() {
    let pool = BufferPool::new(4, 1024);

    assert_eq!(pool.available(), 4);
    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.buffer_capacity(), 1024);
    assert_eq!(pool.in_flight(), 0);
}

#[test]
fn test_lease_hits_free_list() {
    let pool = BufferPool::new(2, 64);

    let a = pool.lease();
    let b = pool.lease();
    assert_eq!(pool.available(), 0);
    assert_eq!(pool.in_flight(), 2);

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.hits, 2);
    assert_eq!(snapshot.misses, 0);

    pool.release(a);
    pool.release(b);
    assert_eq!(pool.available(), 2);
    assert_eq!(pool.in_flight(), 0);
}

#[test]
fn test_lease_allocates_on_empty() {
    let pool = BufferPool::new(1, 64);

    let a = pool.lease();
    let b = pool.lease(); // free list empty, allocates

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.misses, 1);

    pool.release(a);
    pool.release(b); // free list full, dropped

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.returns, 1);
    assert_eq!(snapshot.drops, 1);
    assert_eq!(snapshot.in_flight, 0);
}

#[test]
fn test_release_clears_contents() {
    let pool = BufferPool::new(1, 64);

    let mut buf = pool.lease();
    buf.extend_from_slice(b"leftover");
    pool.release(buf);

    let buf = pool.lease();
    assert!(buf.is_empty());
    assert!(buf.capacity() >= 64);
}

#[test]
fn test_in_flight_balances_under_threads() {
    use std::sync::Arc;
    use std::thread;

    let pool = Arc::new(BufferPool::new(8, 256));
    let mut handles = vec![];

    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                let buf = pool.lease();
                pool.release(buf);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.in_flight(), 0);
    let snapshot = pool.snapshot();
    assert_eq!(snapshot.hits + snapshot.misses, 4000);
    assert_eq!(snapshot.returns + snapshot.drops, 4000);
}
