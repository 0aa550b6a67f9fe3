//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Malformed format spec or a reference to an unknown field
    #[error("Format error: {message}")]
    Format { message: String },

    /// A sink rejected a write
    #[error("Sink '{sink}' write failed: {source}")]
    SinkWrite {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Logger already destroyed
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Level name or number that cannot be resolved
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Sink panicked while writing
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanic { sink: String, message: String },
}

impl LoggerError {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        LoggerError::Format {
            message: message.into(),
        }
    }

    /// Create a format error naming the field that failed to resolve
    pub fn unknown_field(field: &str) -> Self {
        LoggerError::Format {
            message: format!("unknown field '{}'", field),
        }
    }

    /// Create a sink write error
    pub fn sink_write(sink: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkWrite {
            sink: sink.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from format compilation
    pub fn is_format(&self) -> bool {
        matches!(self, LoggerError::Format { .. })
    }
}
