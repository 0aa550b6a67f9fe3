//! Main logger implementation

use super::{
    config::DeliveryConfig,
    context::{ContextProvider, StdContextProvider},
    delivery::{DeliveryEngine, DeliveryMode},
    error::Result,
    field::RenderContext,
    level_registry::LevelRegistry,
    log_level::Level,
    metrics::LoggerMetrics,
    record::{CallSite, Record},
    sink::Sink,
    template::{Template, BASIC_FORMAT},
    timestamp::TimestampFormat,
};
use crate::sinks::{ConsoleSink, FanoutSink, FileSink};
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

/// A named, leveled logger rendering records through a compiled format
///
/// Shared by reference (typically behind an `Arc`) between every call site
/// that uses it; all setters take `&self`.
///
/// # Example
///
/// ```
/// use formatted_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .name("app")
///     .level(Level::INFO)
///     .format("%s [%s] %s\nname, levelname, message")
///     .sync_mode()
///     .build()
///     .unwrap();
///
/// logger.debug("filtered out");
/// logger.error("written");
/// logger.destroy().unwrap();
/// ```
pub struct Logger {
    name: RwLock<Arc<str>>,
    level: AtomicI32,
    template: RwLock<Arc<Template>>,
    time_format: RwLock<Arc<TimestampFormat>>,
    start_time: DateTime<Local>,
    sequence: AtomicU64,
    provider: Arc<dyn ContextProvider>,
    engine: DeliveryEngine,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Create a logger from its core construction parameters
    pub fn new(
        name: impl Into<String>,
        level: Level,
        format: &str,
        sink: impl Sink + 'static,
        sync: bool,
    ) -> Result<Self> {
        Self::builder()
            .name(name)
            .level(level)
            .format(format)
            .sink(sink)
            .sync(sync)
            .build()
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn name(&self) -> String {
        self.name.read().to_string()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = Arc::from(name.into());
    }

    pub fn level(&self) -> Level {
        Level::new(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level.value(), Ordering::Relaxed);
    }

    /// Registered name of the current threshold, empty when unnamed
    pub fn level_name(&self) -> String {
        self.level().name()
    }

    /// Set the threshold by registered name; unknown names are ignored
    pub fn set_level_name(&self, name: &str) -> bool {
        match LevelRegistry::global().get_value(name) {
            Some(value) => {
                self.level.store(value, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Whether a record at `level` would be emitted
    #[inline]
    pub fn is_enabled_for(&self, level: Level) -> bool {
        level.value() >= self.level.load(Ordering::Relaxed)
    }

    /// The active format spec
    pub fn format(&self) -> String {
        self.template.read().source().to_string()
    }

    /// Field names of the active format, in placeholder order
    pub fn fields(&self) -> Vec<&'static str> {
        self.template.read().field_names()
    }

    pub fn template(&self) -> Arc<Template> {
        Arc::clone(&self.template.read())
    }

    /// Compile and install a new format
    ///
    /// On error the previous format stays active.
    pub fn set_format(&self, format: &str) -> Result<()> {
        let template = Template::compile(format)?;
        *self.template.write() = Arc::new(template);
        Ok(())
    }

    pub fn time_format(&self) -> TimestampFormat {
        TimestampFormat::clone(&self.time_format.read())
    }

    pub fn set_time_format(&self, format: impl Into<TimestampFormat>) {
        *self.time_format.write() = Arc::new(format.into());
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn is_sync(&self) -> bool {
        self.engine.mode() == DeliveryMode::Sync
    }

    pub fn mode(&self) -> DeliveryMode {
        self.engine.mode()
    }

    /// Switch delivery mode; leaving async mode drains the worker first
    pub fn set_sync(&self, sync: bool) -> Result<()> {
        self.engine.set_sync(sync)
    }

    /// Replace the output sink
    pub fn set_sink(&self, sink: impl Sink + 'static) -> Result<()> {
        self.engine.replace_sink(move |_previous| Box::new(sink))
    }

    /// Write to `sink` in addition to the current sink(s)
    pub fn add_sink(&self, sink: impl Sink + 'static) -> Result<()> {
        let added: Box<dyn Sink> = Box::new(sink);
        self.engine
            .replace_sink(move |previous| Box::new(FanoutSink::new(vec![previous, added])))
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Ask the background worker to write what it has buffered
    ///
    /// Returns without waiting; use [`Logger::destroy`] or
    /// [`Logger::set_sync`] for a blocking drain.
    pub fn flush(&self) {
        self.engine.flush();
    }

    /// Drain all pending output to the sink and release it
    ///
    /// Safe to call more than once; later log calls are discarded.
    pub fn destroy(&self) -> Result<()> {
        self.engine.destroy()
    }

    /// Render `record` with the active format
    pub fn render(&self, record: &mut Record) -> String {
        let template = Arc::clone(&self.template.read());
        let name = Arc::clone(&self.name.read());
        let time_format = Arc::clone(&self.time_format.read());

        let ctx = RenderContext {
            name: &name,
            start_time: self.start_time,
            sequence: &self.sequence,
            time_format: &time_format,
            provider: self.provider.as_ref(),
            levels: LevelRegistry::global(),
        };
        template.render(&ctx, record)
    }

    /// Log from an explicit call site, surfacing synchronous sink errors
    pub fn try_log_at(
        &self,
        level: Level,
        call_site: CallSite,
        message: impl Into<String>,
    ) -> Result<()> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }

        let mut record = Record::new(level, message, call_site);
        let line = self.render(&mut record);
        self.engine.deliver(line)
    }

    /// Log from an explicit call site; delivery failures are reported, not returned
    pub fn log_at(&self, level: Level, call_site: CallSite, message: impl Into<String>) {
        // Failures are already counted in metrics and reported on stderr.
        let _ = self.try_log_at(level, call_site, message);
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_at(level, CallSite::caller(), message);
    }

    /// Log preformatted arguments, e.g. `logger.log_fmt(level, format_args!(..))`
    #[track_caller]
    pub fn log_fmt(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.is_enabled_for(level) {
            self.log_at(level, CallSite::caller(), args.to_string());
        }
    }

    #[track_caller]
    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log_at(Level::CRITICAL, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log_at(Level::CRITICAL, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log_at(Level::ERROR, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn warning(&self, message: impl Into<String>) {
        self.log_at(Level::WARNING, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_at(Level::WARNING, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log_at(Level::INFO, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_at(Level::DEBUG, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn notset(&self, message: impl Into<String>) {
        self.log_at(Level::NOTSET, CallSite::caller(), message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("format", &self.format())
            .field("mode", &self.mode())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.engine.destroy() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let failures = self.metrics.write_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' shutting down with {} undelivered lines (failure rate: {:.2}%)",
                self.name(),
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// Defaults: name `"root"`, threshold WARNING, [`BASIC_FORMAT`], stdout,
/// asynchronous delivery with [`DeliveryConfig::default`].
///
/// # Example
/// ```
/// use formatted_logger::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .name("worker")
///     .level(Level::DEBUG)
///     .format(RICH_FORMAT)
///     .sink(ConsoleSink::stderr())
///     .delivery(DeliveryConfig::default().with_flush_interval(Duration::from_millis(20)))
///     .build()
///     .unwrap();
/// # logger.destroy().unwrap();
/// ```
pub struct LoggerBuilder {
    name: String,
    level: Level,
    format: String,
    sinks: Vec<Box<dyn Sink>>,
    files: Vec<PathBuf>,
    sync: bool,
    delivery: DeliveryConfig,
    time_format: TimestampFormat,
    provider: Arc<dyn ContextProvider>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: "root".to_string(),
            level: Level::WARNING,
            format: BASIC_FORMAT.to_string(),
            sinks: Vec::new(),
            files: Vec::new(),
            sync: false,
            delivery: DeliveryConfig::default(),
            time_format: TimestampFormat::default(),
            provider: Arc::new(StdContextProvider),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Format spec, compiled by [`build`](Self::build)
    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Add an output sink; more than one fans out to all of them
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn stdout(self) -> Self {
        self.sink(ConsoleSink::stdout())
    }

    #[must_use = "builder methods return a new value"]
    pub fn stderr(self) -> Self {
        self.sink(ConsoleSink::stderr())
    }

    /// Append to the file at `path`, opened by [`build`](Self::build)
    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Write on the calling thread
    #[must_use = "builder methods return a new value"]
    pub fn sync_mode(self) -> Self {
        self.sync(true)
    }

    /// Write through the batching background worker
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(self) -> Self {
        self.sync(false)
    }

    #[must_use = "builder methods return a new value"]
    pub fn delivery(mut self, config: DeliveryConfig) -> Self {
        self.delivery = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_format(mut self, format: impl Into<TimestampFormat>) -> Self {
        self.time_format = format.into();
        self
    }

    /// Source of thread and process identity for the `thread`,
    /// `threadName` and `process` fields
    #[must_use = "builder methods return a new value"]
    pub fn context_provider<P: ContextProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    /// Build the Logger, failing on an invalid format, an invalid delivery
    /// config or a file that cannot be opened
    pub fn build(self) -> Result<Logger> {
        let template = Template::compile(&self.format)?;

        let mut sinks = self.sinks;
        for path in self.files {
            sinks.push(Box::new(FileSink::append(path)?));
        }
        let sink: Box<dyn Sink> = match sinks.len() {
            0 => Box::new(ConsoleSink::stdout()),
            1 => sinks.remove(0),
            _ => Box::new(FanoutSink::new(sinks)),
        };

        let metrics = Arc::new(LoggerMetrics::new());
        let engine = DeliveryEngine::new(
            self.name.clone(),
            sink,
            self.sync,
            self.delivery,
            Arc::clone(&metrics),
        )?;

        Ok(Logger {
            name: RwLock::new(Arc::from(self.name)),
            level: AtomicI32::new(self.level.value()),
            template: RwLock::new(Arc::new(template)),
            time_format: RwLock::new(Arc::new(self.time_format)),
            start_time: Local::now(),
            sequence: AtomicU64::new(0),
            provider: self.provider,
            engine,
            metrics,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
