// tests/stress_tests.rs

use bounded_buffer::buffer::BoundedBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Drains the buffer with timed gets until a timeout, returning the number
/// of items consumed and their sum.
fn drain_until_timeout(buf: &BoundedBuffer<u64>, timeout: Duration) -> (u64, u64) {
    let mut count = 0u64;
    let mut sum = 0u64;
    loop {
        match buf.timed_get(timeout) {
            Ok(value) => {
                count += 1;
                sum += value;
            }
            Err(err) => {
                assert!(err.is_timeout(), "only timeouts are expected while draining");
                return (count, sum);
            }
        }
    }
}

#[test]
fn test_spsc_preserves_fifo_order() {
    const ITEMS: u64 = 50_000;

    let buf = Arc::new(BoundedBuffer::new(64).unwrap());

    let producer_buf = Arc::clone(&buf);
    let producer = thread::spawn(move || {
        for value in 0..ITEMS {
            producer_buf.put(value).unwrap();
        }
    });

    let consumer_buf = Arc::clone(&buf);
    let consumer = thread::spawn(move || {
        for expected in 0..ITEMS {
            assert_eq!(
                consumer_buf.get().unwrap(),
                expected,
                "single-producer/single-consumer pairing must be FIFO"
            );
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
    assert!(buf.is_empty());
}

#[test]
fn test_mpmc_conservation() {
    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 3;
    const ITEMS_PER_PRODUCER: u64 = 10_000;

    let buf = Arc::new(BoundedBuffer::new(8).unwrap());
    let consumed_count = Arc::new(AtomicU64::new(0));
    let consumed_sum = Arc::new(AtomicU64::new(0));

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let buf = Arc::clone(&buf);
        producers.push(thread::spawn(move || {
            // Disjoint value ranges per producer.
            let base = p * ITEMS_PER_PRODUCER;
            for value in base..base + ITEMS_PER_PRODUCER {
                buf.put(value).unwrap();
            }
        }));
    }

    let mut consumers = Vec::new();
    for _ in 0..CONSUMERS {
        let buf = Arc::clone(&buf);
        let count = Arc::clone(&consumed_count);
        let sum = Arc::clone(&consumed_sum);
        consumers.push(thread::spawn(move || {
            let (c, s) = drain_until_timeout(&buf, Duration::from_millis(500));
            count.fetch_add(c, Ordering::SeqCst);
            sum.fetch_add(s, Ordering::SeqCst);
        }));
    }

    for producer in producers {
        producer.join().unwrap();
    }
    for consumer in consumers {
        consumer.join().unwrap();
    }

    let produced = PRODUCERS * ITEMS_PER_PRODUCER;
    let expected_sum = produced * (produced - 1) / 2;
    assert_eq!(buf.len(), 0, "everything produced must have been drained");
    assert_eq!(consumed_count.load(Ordering::SeqCst), produced, "no loss, no duplication");
    assert_eq!(consumed_sum.load(Ordering::SeqCst), expected_sum, "value conservation");
}

#[test]
fn test_two_producers_one_timed_consumer() {
    const ITEMS_PER_PRODUCER: u64 = 100_000;

    let buf = Arc::new(BoundedBuffer::new(64).unwrap());

    let mut producers = Vec::new();
    for p in 0..2u64 {
        let buf = Arc::clone(&buf);
        producers.push(thread::spawn(move || {
            let base = p * ITEMS_PER_PRODUCER;
            for value in base..base + ITEMS_PER_PRODUCER {
                buf.put(value).unwrap();
            }
        }));
    }

    let consumer_buf = Arc::clone(&buf);
    let consumer =
        thread::spawn(move || drain_until_timeout(&consumer_buf, Duration::from_millis(500)));

    for producer in producers {
        producer.join().unwrap();
    }
    let (count, sum) = consumer.join().unwrap();

    let produced = 2 * ITEMS_PER_PRODUCER;
    assert_eq!(count, produced);
    assert_eq!(sum, produced * (produced - 1) / 2);
}
