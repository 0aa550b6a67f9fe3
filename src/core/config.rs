//! Delivery configuration for asynchronous loggers

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default capacity of the queue between log calls and the background worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default number of lines the worker buffers before writing to the sink
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default upper bound on how long a partial batch waits before being written
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning for the asynchronous delivery path
///
/// When the queue is full, log calls block until the worker makes room;
/// lines are never dropped.
///
/// # Example
///
/// ```
/// use formatted_logger::DeliveryConfig;
/// use std::time::Duration;
///
/// let config = DeliveryConfig::default()
///     .with_batch_size(64)
///     .with_flush_interval(Duration::from_millis(20));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl DeliveryConfig {
    #[must_use = "builder methods return a new value"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LoggerError::config(
                "DeliveryConfig",
                "queue_capacity must be positive",
            ));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config(
                "DeliveryConfig",
                "batch_size must be positive",
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config(
                "DeliveryConfig",
                "flush_interval must be positive",
            ));
        }
        Ok(())
    }
}
