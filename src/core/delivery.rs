//! Delivery engine: gets rendered lines from log calls to the sink
//!
//! In synchronous mode every line is written under a mutex held for one
//! write. In asynchronous mode lines go through a bounded queue to a single
//! background worker that owns the sink, batches lines in memory and writes
//! them out on a count threshold, a periodic tick, an explicit flush request
//! or shutdown. Stopping the worker always drains the queue first and hands
//! the sink back, so switching modes or destroying the logger loses nothing.

use super::config::DeliveryConfig;
use super::error::{LoggerError, Result};
use super::metrics::LoggerMetrics;
use super::sink::Sink;
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Externally visible delivery state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Lines are written by the calling thread
    Sync,
    /// Lines are queued for the background worker
    Async,
    /// The engine was destroyed; lines are rejected
    Stopped,
}

enum Control {
    Flush,
    Quit,
}

enum Delivery {
    Sync(Mutex<Box<dyn Sink>>),
    Async(AsyncWorker),
    Stopped,
}

struct AsyncWorker {
    lines: Sender<String>,
    control: Sender<Control>,
    handle: JoinHandle<Box<dyn Sink>>,
}

impl AsyncWorker {
    fn spawn(
        name: &str,
        sink: Box<dyn Sink>,
        config: &DeliveryConfig,
        metrics: &Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let (lines, line_receiver) = bounded(config.queue_capacity);
        let (control, control_receiver) = unbounded();
        let worker = Worker {
            sink,
            buffer: Vec::new(),
            pending: 0,
            batch_size: config.batch_size,
            metrics: Arc::clone(metrics),
        };
        let flush_interval = config.flush_interval;

        let handle = thread::Builder::new()
            .name(format!("{}-log-writer", name))
            .spawn(move || worker.run(&line_receiver, &control_receiver, flush_interval))?;

        Ok(Self {
            lines,
            control,
            handle,
        })
    }

    /// Signal quit, wait for the worker to drain, and take the sink back
    fn stop(self) -> Option<Box<dyn Sink>> {
        let _ = self.control.send(Control::Quit);
        drop(self.lines);

        match self.handle.join() {
            Ok(sink) => Some(sink),
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER ERROR] Async writer thread panicked during shutdown: {}",
                    panic_message(panic_info.as_ref())
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    /// Waiting for the next line, tick, flush or quit
    Collecting,
    /// Writing the buffer to the sink, then back to collecting
    Writing,
    /// Pulling everything still queued into the buffer, then a final write
    Draining,
    Stopped,
}

struct Worker {
    sink: Box<dyn Sink>,
    buffer: Vec<u8>,
    pending: u64,
    batch_size: usize,
    metrics: Arc<LoggerMetrics>,
}

impl Worker {
    fn run(
        mut self,
        lines: &Receiver<String>,
        control: &Receiver<Control>,
        flush_interval: std::time::Duration,
    ) -> Box<dyn Sink> {
        let ticker = tick(flush_interval);
        let mut state = WorkerState::Collecting;

        while state != WorkerState::Stopped {
            state = match state {
                WorkerState::Collecting => select! {
                    recv(lines) -> line => match line {
                        Ok(line) => {
                            self.push(line);
                            if self.pending >= self.batch_size as u64 {
                                WorkerState::Writing
                            } else {
                                WorkerState::Collecting
                            }
                        }
                        Err(_) => WorkerState::Draining,
                    },
                    recv(ticker) -> _ => WorkerState::Writing,
                    recv(control) -> signal => match signal {
                        Ok(Control::Flush) => WorkerState::Writing,
                        Ok(Control::Quit) | Err(_) => WorkerState::Draining,
                    },
                },
                WorkerState::Writing => {
                    self.write_buffer();
                    WorkerState::Collecting
                }
                WorkerState::Draining => {
                    while let Ok(line) = lines.try_recv() {
                        self.push(line);
                    }
                    self.write_buffer();
                    WorkerState::Stopped
                }
                WorkerState::Stopped => WorkerState::Stopped,
            };
        }

        self.sink
    }

    fn push(&mut self, line: String) {
        self.buffer.extend_from_slice(line.as_bytes());
        self.buffer.push(b'\n');
        self.pending += 1;
    }

    fn write_buffer(&mut self) {
        if self.pending == 0 {
            return;
        }
        // A failed write is counted and reported by write_lines; the worker keeps going.
        let _ = write_lines(&mut *self.sink, &self.buffer, self.pending, &self.metrics);
        self.metrics.record_batch();
        self.buffer.clear();
        self.pending = 0;
    }
}

/// Write `bytes` holding `lines` lines and flush, isolating sink panics
fn write_lines(
    sink: &mut dyn Sink,
    bytes: &[u8],
    lines: u64,
    metrics: &LoggerMetrics,
) -> Result<()> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        sink.write_all(bytes)?;
        sink.flush()
    }));

    let result = match result {
        Ok(result) => result,
        Err(panic_info) => Err(LoggerError::SinkPanic {
            sink: sink.name().to_string(),
            message: panic_message(panic_info.as_ref()),
        }),
    };

    match result {
        Ok(()) => {
            metrics.record_written(lines);
            Ok(())
        }
        Err(e) => {
            record_failure(metrics, &e, lines);
            Err(e)
        }
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Failures between two stderr reports after the first one
const FAILURE_REPORT_INTERVAL: u64 = 1000;

/// Whether losing `lines` more lines after `previous` should be reported:
/// the first loss, then whenever the total crosses a multiple of the interval
fn should_report(previous: u64, lines: u64) -> bool {
    previous == 0
        || previous / FAILURE_REPORT_INTERVAL
            != previous.saturating_add(lines) / FAILURE_REPORT_INTERVAL
}

/// Count `lines` lost lines and report on stderr when due
fn record_failure(metrics: &LoggerMetrics, error: &LoggerError, lines: u64) {
    let previous = metrics.record_write_failure(lines);
    if should_report(previous, lines) {
        eprintln!(
            "[LOGGER ERROR] Delivery failed ({} line(s) lost so far): {}",
            previous.saturating_add(lines),
            error
        );
    }
}

/// Synchronous or batched-asynchronous delivery of rendered lines to one sink
pub struct DeliveryEngine {
    name: String,
    state: RwLock<Delivery>,
    config: DeliveryConfig,
    metrics: Arc<LoggerMetrics>,
}

impl DeliveryEngine {
    /// Create an engine; `sync == false` starts the background worker
    pub fn new(
        name: impl Into<String>,
        sink: Box<dyn Sink>,
        sync: bool,
        config: DeliveryConfig,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        config.validate()?;
        let name = name.into();
        let state = if sync {
            Delivery::Sync(Mutex::new(sink))
        } else {
            Delivery::Async(AsyncWorker::spawn(&name, sink, &config, &metrics)?)
        };

        Ok(Self {
            name,
            state: RwLock::new(state),
            config,
            metrics,
        })
    }

    pub fn mode(&self) -> DeliveryMode {
        match &*self.state.read() {
            Delivery::Sync(_) => DeliveryMode::Sync,
            Delivery::Async(_) => DeliveryMode::Async,
            Delivery::Stopped => DeliveryMode::Stopped,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Hand one rendered line (without trailing newline) to the sink
    ///
    /// Synchronous mode returns the sink's error, if any. Asynchronous mode
    /// only fails when the worker is gone; when the queue is full the call
    /// blocks until the worker makes room.
    pub fn deliver(&self, line: String) -> Result<()> {
        let state = self.state.read();
        match &*state {
            Delivery::Sync(sink) => {
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                let mut sink = sink.lock();
                write_lines(&mut **sink, &bytes, 1, &self.metrics)
            }
            Delivery::Async(worker) => match worker.lines.try_send(line) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(line)) => {
                    self.metrics.record_queue_full();
                    worker.lines.send(line).map_err(|_| self.rejected())
                }
                Err(TrySendError::Disconnected(_)) => Err(self.rejected()),
            },
            Delivery::Stopped => Err(self.rejected()),
        }
    }

    fn rejected(&self) -> LoggerError {
        let error = LoggerError::LoggerStopped;
        record_failure(&self.metrics, &error, 1);
        error
    }

    /// Ask the worker to write out its buffer; does not wait for the write
    ///
    /// A no-op in synchronous mode, where every line is already written.
    pub fn flush(&self) {
        if let Delivery::Async(worker) = &*self.state.read() {
            let _ = worker.control.send(Control::Flush);
        }
    }

    /// Switch between synchronous and asynchronous delivery
    ///
    /// Leaving asynchronous mode drains the worker completely before the
    /// first synchronous write.
    pub fn set_sync(&self, sync: bool) -> Result<()> {
        let mut state = self.state.write();
        match (&*state, sync) {
            (Delivery::Sync(_), true) | (Delivery::Async(_), false) => return Ok(()),
            (Delivery::Stopped, _) => return Err(LoggerError::LoggerStopped),
            _ => {}
        }

        let sink = Self::take_sink(&mut state).ok_or(LoggerError::LoggerStopped)?;
        *state = self.resume(sink, sync)?;
        Ok(())
    }

    /// Replace the sink by applying `f` to the current one, keeping the mode
    pub fn replace_sink<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Box<dyn Sink>) -> Box<dyn Sink>,
    {
        let mut state = self.state.write();
        let sync = match &*state {
            Delivery::Sync(_) => true,
            Delivery::Async(_) => false,
            Delivery::Stopped => return Err(LoggerError::LoggerStopped),
        };

        let sink = Self::take_sink(&mut state).ok_or(LoggerError::LoggerStopped)?;
        *state = self.resume(f(sink), sync)?;
        Ok(())
    }

    /// Drain everything pending into the sink, flush and release it
    ///
    /// Blocks until the worker has written every queued line. Calling it
    /// again afterwards does nothing.
    pub fn destroy(&self) -> Result<()> {
        let mut state = self.state.write();
        match Self::take_sink(&mut state) {
            Some(mut sink) => sink.flush(),
            None => Ok(()),
        }
    }

    /// Leave `state` stopped and return the sink it held, draining any worker
    fn take_sink(state: &mut Delivery) -> Option<Box<dyn Sink>> {
        match std::mem::replace(state, Delivery::Stopped) {
            Delivery::Sync(sink) => Some(sink.into_inner()),
            Delivery::Async(worker) => worker.stop(),
            Delivery::Stopped => None,
        }
    }

    fn resume(&self, sink: Box<dyn Sink>, sync: bool) -> Result<Delivery> {
        if sync {
            Ok(Delivery::Sync(Mutex::new(sink)))
        } else {
            Ok(Delivery::Async(AsyncWorker::spawn(
                &self.name,
                sink,
                &self.config,
                &self.metrics,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedSink {
        bytes: Arc<Mutex<Vec<u8>>>,
        writes: Arc<Mutex<usize>>,
    }

    impl SharedSink {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.bytes.lock())
                .lines()
                .map(String::from)
                .collect()
        }
    }

    impl Sink for SharedSink {
        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            self.bytes.lock().extend_from_slice(bytes);
            *self.writes.lock() += 1;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "shared"
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn write_all(&mut self, _bytes: &[u8]) -> Result<()> {
            Err(LoggerError::sink_write(
                "failing",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingSink;

    impl Sink for PanickingSink {
        fn write_all(&mut self, _bytes: &[u8]) -> Result<()> {
            panic!("sink exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn engine(sink: impl Sink + 'static, sync: bool, config: DeliveryConfig) -> DeliveryEngine {
        DeliveryEngine::new(
            "test",
            Box::new(sink),
            sync,
            config,
            Arc::new(LoggerMetrics::new()),
        )
        .expect("engine")
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn test_sync_writes_immediately() {
        let sink = SharedSink::default();
        let engine = engine(sink.clone(), true, DeliveryConfig::default());

        engine.deliver("hello".to_string()).unwrap();
        assert_eq!(sink.lines(), vec!["hello"]);
        assert_eq!(engine.mode(), DeliveryMode::Sync);
    }

    #[test]
    fn test_async_drain_preserves_order() {
        let batch = 8;
        for n in [0, 1, batch, batch + 1, 5000] {
            let sink = SharedSink::default();
            let config = DeliveryConfig::default()
                .with_batch_size(batch)
                .with_queue_capacity(16);
            let engine = engine(sink.clone(), false, config);

            for line in numbered(n) {
                engine.deliver(line).unwrap();
            }
            engine.destroy().unwrap();

            assert_eq!(sink.lines(), numbered(n), "n = {}", n);
        }
    }

    #[test]
    fn test_batch_threshold_writes_without_tick() {
        let sink = SharedSink::default();
        let config = DeliveryConfig::default()
            .with_batch_size(4)
            .with_flush_interval(Duration::from_secs(3600));
        let engine = engine(sink.clone(), false, config);

        for line in numbered(4) {
            engine.deliver(line).unwrap();
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sink.lines().len() < 4 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.lines(), numbered(4));
        engine.destroy().unwrap();
    }

    #[test]
    fn test_tick_writes_partial_batch() {
        let sink = SharedSink::default();
        let config = DeliveryConfig::default().with_flush_interval(Duration::from_millis(10));
        let engine = engine(sink.clone(), false, config);

        engine.deliver("partial".to_string()).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sink.lines().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.lines(), vec!["partial"]);
        engine.destroy().unwrap();
    }

    #[test]
    fn test_flush_signal_writes_buffer() {
        let sink = SharedSink::default();
        let config = DeliveryConfig::default().with_flush_interval(Duration::from_secs(3600));
        let engine = engine(sink.clone(), false, config);

        engine.deliver("flushed".to_string()).unwrap();
        engine.flush();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sink.lines().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.lines(), vec!["flushed"]);
        engine.destroy().unwrap();
    }

    #[test]
    fn test_switch_to_sync_drains_first() {
        let sink = SharedSink::default();
        let config = DeliveryConfig::default().with_flush_interval(Duration::from_secs(3600));
        let engine = engine(sink.clone(), false, config);

        for line in numbered(10) {
            engine.deliver(line).unwrap();
        }
        engine.set_sync(true).unwrap();
        assert_eq!(engine.mode(), DeliveryMode::Sync);
        assert_eq!(sink.lines(), numbered(10));

        engine.deliver("after".to_string()).unwrap();
        assert_eq!(sink.lines().last().map(String::as_str), Some("after"));

        engine.set_sync(false).unwrap();
        assert_eq!(engine.mode(), DeliveryMode::Async);
        engine.deliver("async again".to_string()).unwrap();
        engine.destroy().unwrap();
        assert_eq!(sink.lines().len(), 12);
    }

    #[test]
    fn test_destroy_idempotent_and_final() {
        let sink = SharedSink::default();
        let engine = engine(sink.clone(), false, DeliveryConfig::default());
        engine.deliver("one".to_string()).unwrap();

        engine.destroy().unwrap();
        let writes = *sink.writes.lock();
        engine.destroy().unwrap();

        assert_eq!(engine.mode(), DeliveryMode::Stopped);
        assert!(matches!(
            engine.deliver("late".to_string()),
            Err(LoggerError::LoggerStopped)
        ));
        assert!(engine.set_sync(true).is_err());
        thread::sleep(Duration::from_millis(50));
        assert_eq!(*sink.writes.lock(), writes);
        assert_eq!(sink.lines(), vec!["one"]);
    }

    #[test]
    fn test_sync_error_surfaced_and_counted() {
        let metrics = Arc::new(LoggerMetrics::new());
        let engine = DeliveryEngine::new(
            "test",
            Box::new(FailingSink),
            true,
            DeliveryConfig::default(),
            Arc::clone(&metrics),
        )
        .unwrap();

        assert!(matches!(
            engine.deliver("x".to_string()),
            Err(LoggerError::SinkWrite { .. })
        ));
        assert_eq!(metrics.write_failures(), 1);
    }

    #[test]
    fn test_async_worker_survives_sink_failures() {
        let metrics = Arc::new(LoggerMetrics::new());
        let engine = DeliveryEngine::new(
            "test",
            Box::new(PanickingSink),
            false,
            DeliveryConfig::default().with_batch_size(1),
            Arc::clone(&metrics),
        )
        .unwrap();

        for line in numbered(3) {
            engine.deliver(line).unwrap();
        }
        engine.destroy().unwrap();
        assert_eq!(metrics.write_failures(), 3);
        assert_eq!(metrics.total_written(), 0);
    }

    #[test]
    fn test_async_worker_absorbs_write_errors() {
        let metrics = Arc::new(LoggerMetrics::new());
        let engine = DeliveryEngine::new(
            "test",
            Box::new(FailingSink),
            false,
            DeliveryConfig::default().with_batch_size(2),
            Arc::clone(&metrics),
        )
        .unwrap();

        for line in numbered(5) {
            engine.deliver(line).unwrap();
        }
        assert_eq!(engine.mode(), DeliveryMode::Async);
        engine.destroy().unwrap();

        assert_eq!(metrics.write_failures(), 5);
        assert_eq!(metrics.total_written(), 0);
        assert!(metrics.batches_written() >= 1);
    }

    #[test]
    fn test_failure_report_schedule() {
        // first loss is reported even when a whole batch fails at once
        assert!(should_report(0, 1));
        assert!(should_report(0, 3));
        assert!(!should_report(3, 3));
        assert!(!should_report(1, 998));
        // crossing a multiple of the interval triggers a report
        assert!(should_report(998, 3));
        assert!(should_report(999, 1));
        assert!(!should_report(1000, 1));
        assert!(should_report(1500, 600));
    }

    #[test]
    fn test_replace_sink_keeps_mode() {
        let first = SharedSink::default();
        let second = SharedSink::default();
        let engine = engine(first.clone(), false, DeliveryConfig::default());

        engine.deliver("to first".to_string()).unwrap();
        let replacement = second.clone();
        engine
            .replace_sink(move |_old| Box::new(replacement))
            .unwrap();
        engine.deliver("to second".to_string()).unwrap();
        engine.destroy().unwrap();

        assert_eq!(first.lines(), vec!["to first"]);
        assert_eq!(second.lines(), vec!["to second"]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = DeliveryEngine::new(
            "test",
            Box::new(SharedSink::default()),
            false,
            DeliveryConfig::default().with_queue_capacity(0),
            Arc::new(LoggerMetrics::new()),
        );
        assert!(result.is_err());
    }
}
