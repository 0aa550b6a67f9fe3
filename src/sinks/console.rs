//! Console sink implementation

use crate::core::{LoggerError, Result, Sink};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Writes rendered lines to standard output or standard error
///
/// Every write locks the stream once, so a batch of lines is never
/// interleaved with output from other threads.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: Stream,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    pub fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let result = match self.stream {
            Stream::Stdout => std::io::stdout().lock().write_all(bytes),
            Stream::Stderr => std::io::stderr().lock().write_all(bytes),
        };
        result.map_err(|e| LoggerError::sink_write(self.name(), e))
    }

    fn flush(&mut self) -> Result<()> {
        let result = match self.stream {
            Stream::Stdout => std::io::stdout().flush(),
            Stream::Stderr => std::io::stderr().flush(),
        };
        result.map_err(|e| LoggerError::sink_write(self.name(), e))
    }

    fn name(&self) -> &str {
        match self.stream {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_names() {
        assert_eq!(ConsoleSink::stdout().name(), "stdout");
        assert_eq!(ConsoleSink::stderr().name(), "stderr");
        assert_eq!(ConsoleSink::default().name(), "stdout");
    }

    #[test]
    fn test_console_write() {
        let mut sink = ConsoleSink::stderr();
        assert!(sink.write_all(b"console sink test line\n").is_ok());
        assert!(sink.flush().is_ok());
    }
}
