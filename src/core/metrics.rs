//! Logger metrics for observability
//!
//! Counters for lines written, sink failures, worker batches and
//! backpressure on the asynchronous queue.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use formatted_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written(3);
/// metrics.record_write_failure(1);
///
/// assert_eq!(metrics.total_written(), 3);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines accepted by the sink
    total_written: AtomicU64,

    /// Lines lost to sink errors, sink panics or a destroyed logger
    write_failures: AtomicU64,

    /// Times a log call found the async queue full and had to wait
    queue_full_events: AtomicU64,

    /// Buffer writes performed by the async worker
    batches_written: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.total_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_written(&self) -> u64 {
        self.batches_written.load(Ordering::Relaxed)
    }

    /// Record lines written; returns the previous total
    #[inline]
    pub fn record_written(&self, lines: u64) -> u64 {
        self.total_written.fetch_add(lines, Ordering::Relaxed)
    }

    /// Record lines lost; returns the previous count
    #[inline]
    pub fn record_write_failure(&self, lines: u64) -> u64 {
        self.write_failures.fetch_add(lines, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_batch(&self) -> u64 {
        self.batches_written.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0) of lines that reached delivery
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.total_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.batches_written.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_written: AtomicU64::new(self.total_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            batches_written: AtomicU64::new(self.batches_written()),
        }
    }
}
