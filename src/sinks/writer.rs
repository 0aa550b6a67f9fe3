//! Sink over any `std::io::Write`

use crate::core::{LoggerError, Result, Sink};
use std::io::Write;

/// Writes rendered lines to an arbitrary writer
///
/// # Example
///
/// ```
/// use formatted_logger::{Sink, WriterSink};
///
/// let mut sink = WriterSink::new("memory", Vec::new());
/// sink.write_all(b"hello\n").unwrap();
/// assert_eq!(sink.into_inner(), b"hello\n");
/// ```
pub struct WriterSink<W: Write + Send> {
    name: String,
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| LoggerError::sink_write(self.name.as_str(), e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LoggerError::sink_write(self.name.as_str(), e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_bytes_through() {
        let mut sink = WriterSink::new("vec", Vec::new());
        sink.write_all(b"a\n").unwrap();
        sink.write_all(b"b\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.get_ref().as_slice(), b"a\nb\n");
        assert_eq!(sink.name(), "vec");
    }

    #[test]
    fn test_write_error_names_sink() {
        let mut sink = WriterSink::new("pipe", BrokenPipe);
        let err = sink.write_all(b"x\n").unwrap_err();
        assert!(matches!(err, LoggerError::SinkWrite { ref sink, .. } if sink == "pipe"));
    }
}
