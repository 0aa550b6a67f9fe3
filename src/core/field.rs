//! Named fields that a format can reference, and how each is resolved

use super::context::ContextProvider;
use super::level_registry::LevelRegistry;
use super::record::Record;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Local, Timelike};
use std::fmt;
use std::sync::atomic::AtomicU64;

/// Value produced by a field resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    UInt(u64),
}

impl FieldValue {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldValue::String(_))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::UInt(u)
    }
}

/// Logger-side state that field resolvers read
pub struct RenderContext<'a> {
    pub name: &'a str,
    pub start_time: DateTime<Local>,
    pub sequence: &'a AtomicU64,
    pub time_format: &'a TimestampFormat,
    pub provider: &'a dyn ContextProvider,
    pub levels: &'a LevelRegistry,
}

/// Every field a format may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    SeqId,
    LevelNo,
    LevelName,
    PathName,
    FileName,
    Module,
    LineNo,
    FuncName,
    Created,
    AscTime,
    Msecs,
    RelativeCreated,
    Thread,
    ThreadName,
    Process,
    Message,
    Timestamp,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::Name,
        Field::SeqId,
        Field::LevelNo,
        Field::LevelName,
        Field::PathName,
        Field::FileName,
        Field::Module,
        Field::LineNo,
        Field::FuncName,
        Field::Created,
        Field::AscTime,
        Field::Msecs,
        Field::RelativeCreated,
        Field::Thread,
        Field::ThreadName,
        Field::Process,
        Field::Message,
        Field::Timestamp,
    ];

    /// Name used in format specs
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::SeqId => "seqid",
            Field::LevelNo => "levelno",
            Field::LevelName => "levelname",
            Field::PathName => "pathname",
            Field::FileName => "filename",
            Field::Module => "module",
            Field::LineNo => "lineno",
            Field::FuncName => "funcname",
            Field::Created => "created",
            Field::AscTime => "asctime",
            Field::Msecs => "msecs",
            Field::RelativeCreated => "relativeCreated",
            Field::Thread => "thread",
            Field::ThreadName => "threadName",
            Field::Process => "process",
            Field::Message => "message",
            Field::Timestamp => "timestamp",
        }
    }

    /// Look a field up by its format name (exact, case-sensitive)
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|field| field.as_str() == name)
    }

    /// Compute the field for `record`, caching derived values on the record
    ///
    /// Never fails: anything that cannot be determined renders as a sentinel.
    pub fn resolve(self, ctx: &RenderContext<'_>, record: &mut Record) -> FieldValue {
        match self {
            Field::Name => ctx.name.into(),
            Field::SeqId => record.seqid(ctx.sequence).into(),
            Field::LevelNo => i64::from(record.level().value()).into(),
            Field::LevelName => ctx.levels.lookup_name(record.level().value()).into(),
            Field::PathName => record.location().pathname.as_str().into(),
            Field::FileName => record.location().filename.as_str().into(),
            Field::Module => record.location().module.as_str().into(),
            Field::LineNo => record.location().lineno.into(),
            Field::FuncName => record.funcname().into(),
            Field::Created => unix_nanos(&ctx.start_time).into(),
            Field::AscTime => ctx.time_format.format(&record.time()).into(),
            Field::Msecs => i64::from(ctx.start_time.nanosecond() % 1_000_000_000).into(),
            Field::RelativeCreated => record
                .time()
                .signed_duration_since(ctx.start_time)
                .num_nanoseconds()
                .unwrap_or(i64::MAX)
                .into(),
            Field::Thread => record.thread(ctx.provider).into(),
            Field::ThreadName => record.thread_name(ctx.provider).into(),
            Field::Process => u64::from(record.process(ctx.provider)).into(),
            Field::Message => record.message().into(),
            Field::Timestamp => unix_nanos(&record.time()).into(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unix_nanos(datetime: &DateTime<Local>) -> i64 {
    datetime.timestamp_nanos_opt().unwrap_or(i64::MAX)
}
