//! Stress tests for delivery under load
//!
//! These tests verify:
//! - No line is lost when the queue is much smaller than the burst
//! - Concurrent producers keep per-thread ordering
//! - Level registration is safe alongside rendering

use formatted_logger::prelude::*;
use formatted_logger::{level_value, register_level};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Clone, Default)]
struct SlowBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
    delay: Duration,
}

impl io::Write for SlowBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SlowBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes.lock())
            .lines()
            .map(String::from)
            .collect()
    }
}

/// A slow sink and a tiny queue force producers to block, never drop
#[test]
fn test_backpressure_loses_nothing() {
    let buffer = SlowBuffer {
        delay: Duration::from_micros(200),
        ..SlowBuffer::default()
    };
    let logger = Logger::builder()
        .level(Level::DEBUG)
        .format("%s\nmessage")
        .sink(WriterSink::new("slow", buffer.clone()))
        .delivery(
            DeliveryConfig::default()
                .with_queue_capacity(4)
                .with_batch_size(2),
        )
        .build()
        .unwrap();

    for i in 0..2000 {
        logger.info(format!("line-{}", i));
    }
    logger.destroy().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2000);
    assert_eq!(lines[0], "line-0");
    assert_eq!(lines[1999], "line-1999");
    assert!(logger.metrics().queue_full_events() > 0);
    assert_eq!(logger.metrics().write_failures(), 0);
}

/// Lines from each producer arrive in that producer's order
#[test]
fn test_concurrent_producers() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1000;

    let buffer = SlowBuffer::default();
    let logger = Arc::new(
        Logger::builder()
            .level(Level::DEBUG)
            .format("%s\nmessage")
            .sink(WriterSink::new("shared", buffer.clone()))
            .delivery(DeliveryConfig::default().with_queue_capacity(64))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("{}:{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.destroy().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut next: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        let (t, i) = line.split_once(':').unwrap();
        let (t, i): (usize, usize) = (t.parse().unwrap(), i.parse().unwrap());
        let expected = next.entry(t).or_insert(0);
        assert_eq!(i, *expected, "thread {} out of order", t);
        *expected += 1;
    }
}

/// Sequence ids are unique and gapless across threads
#[test]
fn test_concurrent_seqids_unique() {
    let buffer = SlowBuffer::default();
    let logger = Arc::new(
        Logger::builder()
            .level(Level::DEBUG)
            .format("%d\nseqid")
            .sink(WriterSink::new("seq", buffer.clone()))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for _ in 0..500 {
                    logger.info("x");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.destroy().unwrap();

    let mut ids: Vec<u64> = buffer.lines().iter().map(|l| l.parse().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=2000).collect::<Vec<u64>>());
}

/// Registering levels while other threads render never blocks or corrupts names
#[test]
fn test_registration_during_logging() {
    let buffer = SlowBuffer::default();
    let logger = Arc::new(
        Logger::builder()
            .level(Level::new(1))
            .format("%s\nlevelname")
            .sink(WriterSink::new("levels", buffer.clone()))
            .build()
            .unwrap(),
    );

    let writer = {
        let logger = Arc::clone(&logger);
        thread::spawn(move || {
            for _ in 0..1000 {
                logger.log(Level::new(7001), "x");
            }
        })
    };
    let registrar = thread::spawn(|| {
        for i in 0..50 {
            register_level(&format!("STRESS_{}", i), 8000 + i);
        }
        register_level("STRESS_FINAL", 7001);
    });

    writer.join().unwrap();
    registrar.join().unwrap();
    logger.log(Level::new(7001), "x");
    logger.destroy().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1001);
    assert!(lines.iter().all(|l| l.is_empty() || l == "STRESS_FINAL"));
    assert_eq!(lines[1000], "STRESS_FINAL");
    assert_eq!(level_value("STRESS_49"), 8049);
}
