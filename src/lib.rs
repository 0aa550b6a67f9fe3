//! # Formatted Logger
//!
//! A leveled logging core that renders each record through a compiled
//! printf-style format and delivers the resulting line to a sink, either
//! synchronously or through a batching background worker.
//!
//! ## Features
//!
//! - **Format Compiler**: `"%s [%6s] %s\nname, levelname, message"` style specs, validated up front
//! - **Level Registry**: process-wide, extensible name/value table for levels
//! - **Sync or Async Delivery**: switchable at runtime without losing lines
//! - **Sinks**: console, file, any `io::Write`, and fan-out
//!
//! ```
//! use formatted_logger::prelude::*;
//! use formatted_logger::error;
//!
//! let logger = Logger::builder()
//!     .name("service")
//!     .level(Level::INFO)
//!     .format(RICH_FORMAT)
//!     .sink(ConsoleSink::stderr())
//!     .build()
//!     .unwrap();
//!
//! error!(logger, "request failed after {} retries", 3);
//! logger.destroy().unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        CallSite, DeliveryConfig, DeliveryMode, Level, LevelRegistry, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, Result, Sink, Template, TimestampFormat, BASIC_FORMAT,
        RICH_FORMAT,
    };
    pub use crate::sinks::{ConsoleSink, FanoutSink, FileSink, WriterSink};
}

pub use crate::core::{
    level_name, level_value, register_level, CallSite, ContextProvider, DeliveryConfig,
    DeliveryEngine, DeliveryMode, Field, FieldValue, Level, LevelRegistry, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, Record, RenderContext, Result, Sink, SourceLocation,
    StdContextProvider, Template, TimestampFormat, BASIC_FORMAT, RICH_FORMAT, UNKNOWN_FIELD,
};
pub use sinks::{ConsoleSink, FanoutSink, FileSink, WriterSink};
