//! Core logger types and traits

pub mod config;
pub mod context;
pub mod delivery;
pub mod error;
pub mod field;
pub mod level_registry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod template;
pub mod timestamp;

pub use config::{
    DeliveryConfig, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_CAPACITY,
};
pub use context::{ContextProvider, StdContextProvider};
pub use delivery::{DeliveryEngine, DeliveryMode};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue, RenderContext};
pub use level_registry::{
    level_name, level_value, register_level, LevelRegistry, REGISTRATION_QUEUE_SIZE,
};
pub use log_level::Level;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use record::{CallSite, Record, SourceLocation, UNKNOWN_FIELD};
pub use sink::Sink;
pub use template::{Template, BASIC_FORMAT, RICH_FORMAT};
pub use timestamp::TimestampFormat;
