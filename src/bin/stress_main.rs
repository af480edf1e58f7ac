// src/bin/stress_main.rs

use bounded_buffer::buffer::BoundedBuffer;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const NUM_PRODUCER_THREADS: u64 = 10;
const NUM_CONSUMER_THREADS: usize = 10;
const PUTS_PER_PRODUCER: u64 = 1_000_000;
const BUFFER_CAPACITY: usize = 64;

// --- Producer Task Function ---
fn producer_task(
    buf: Arc<BoundedBuffer<u64>>,
    producer_id: u64,
    produced_count: Arc<AtomicU64>,
    produced_sum: Arc<AtomicU64>,
) {
    let base = producer_id * PUTS_PER_PRODUCER;
    let mut checksum = 0u64;

    for i in 0..PUTS_PER_PRODUCER {
        let value = base + i;
        loop {
            match buf.timed_put(value, Duration::from_millis(1000)) {
                Ok(()) => break,
                Err(err) if err.is_timeout() => {
                    // Back off briefly and retry the same value.
                    thread::sleep(Duration::from_micros(100));
                }
                Err(err) => panic!("producer {producer_id} hit a primitive failure: {err}"),
            }
        }
        checksum += value;
    }

    produced_count.fetch_add(PUTS_PER_PRODUCER, Ordering::SeqCst);
    produced_sum.fetch_add(checksum, Ordering::SeqCst);
    println!("[Stress Producer {producer_id}] Exiting.");
}

// --- Consumer Task Function ---
fn consumer_task(
    buf: Arc<BoundedBuffer<u64>>,
    consumer_id: usize,
    consumed_count: Arc<AtomicU64>,
    consumed_sum: Arc<AtomicU64>,
) {
    let mut count = 0u64;
    let mut checksum = 0u64;

    loop {
        match buf.timed_get(Duration::from_millis(500)) {
            Ok(value) => {
                count += 1;
                checksum += value;
            }
            Err(err) if err.is_timeout() => break,
            Err(err) => panic!("consumer {consumer_id} hit a primitive failure: {err}"),
        }
    }

    consumed_count.fetch_add(count, Ordering::SeqCst);
    consumed_sum.fetch_add(checksum, Ordering::SeqCst);
    println!("[Stress Consumer {consumer_id}] Consumed {count} items. Exiting.");
}

fn main() {
    println!(
        "--- Bounded buffer stress driver: {NUM_PRODUCER_THREADS} producers x \
         {NUM_CONSUMER_THREADS} consumers over {BUFFER_CAPACITY} slots ---"
    );

    let buf = Arc::new(BoundedBuffer::new(BUFFER_CAPACITY).expect("buffer construction failed"));
    println!("Full: {} / Empty: {}", buf.is_full(), buf.is_empty());

    let produced_count = Arc::new(AtomicU64::new(0));
    let produced_sum = Arc::new(AtomicU64::new(0));
    let consumed_count = Arc::new(AtomicU64::new(0));
    let consumed_sum = Arc::new(AtomicU64::new(0));

    let start = Instant::now();

    let mut producer_handles = Vec::new();
    for producer_id in 0..NUM_PRODUCER_THREADS {
        let buf = Arc::clone(&buf);
        let count = Arc::clone(&produced_count);
        let sum = Arc::clone(&produced_sum);
        producer_handles.push(thread::spawn(move || {
            producer_task(buf, producer_id, count, sum);
        }));
    }

    let mut consumer_handles = Vec::new();
    for consumer_id in 0..NUM_CONSUMER_THREADS {
        let buf = Arc::clone(&buf);
        let count = Arc::clone(&consumed_count);
        let sum = Arc::clone(&consumed_sum);
        consumer_handles.push(thread::spawn(move || {
            consumer_task(buf, consumer_id, count, sum);
        }));
    }

    println!("Joining producers ...");
    for handle in producer_handles {
        handle.join().expect("producer thread panicked");
    }

    println!("Joining consumers ...");
    for handle in consumer_handles {
        handle.join().expect("consumer thread panicked");
    }

    let elapsed = start.elapsed();
    let produced = produced_count.load(Ordering::SeqCst);
    let consumed = consumed_count.load(Ordering::SeqCst);

    println!("Producer operations count: {produced}");
    println!("Consumer operations count: {consumed}");
    if elapsed.as_secs_f64() > 0.0 {
        println!("Speed: {:.0} op/s", produced as f64 / elapsed.as_secs_f64());
    }
    println!("Producer operations sum: {}", produced_sum.load(Ordering::SeqCst));
    println!("Consumer operations sum: {}", consumed_sum.load(Ordering::SeqCst));

    assert_eq!(produced, NUM_PRODUCER_THREADS * PUTS_PER_PRODUCER);
    assert_eq!(produced, consumed, "every produced item must be consumed exactly once");
    assert_eq!(
        produced_sum.load(Ordering::SeqCst),
        consumed_sum.load(Ordering::SeqCst),
        "produced and consumed checksums must match"
    );
    println!("Conservation checks passed.");
}
