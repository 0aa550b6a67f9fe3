//! Timestamp formatting for the `asctime` field
//!
//! Supports a classic `YYYY-MM-DD HH:MM:SS.fraction` rendering, ISO 8601,
//! RFC 3339, Unix timestamps and custom strftime formats.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format options for rendered records
///
/// # Examples
///
/// ```
/// use formatted_logger::TimestampFormat;
/// use chrono::Local;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Local::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local time with trailing-zero-trimmed nanoseconds: `2025-01-08 10:30:45.123456`
    #[default]
    Classic,

    /// ISO 8601 in UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// ISO 8601 in UTC with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 with the local offset: `2025-01-08T10:30:45.123456+01:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format applied to local time
    ///
    /// ```
    /// use formatted_logger::TimestampFormat;
    ///
    /// let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    /// Format a local datetime according to this format
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Classic => Self::format_classic(datetime),
            TimestampFormat::Iso8601 => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            TimestampFormat::Iso8601Micros => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                .to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    fn format_classic(datetime: &DateTime<Local>) -> String {
        let mut out = datetime.format("%Y-%m-%d %H:%M:%S").to_string();
        let fraction = format!("{:09}", datetime.nanosecond() % 1_000_000_000);
        let fraction = fraction.trim_end_matches('0');
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        out
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

impl From<&str> for TimestampFormat {
    fn from(format_str: &str) -> Self {
        TimestampFormat::Custom(format_str.to_string())
    }
}
