//! Sink trait for rendered-line output destinations

use super::error::Result;

/// Destination for rendered log lines
///
/// `write_all` receives whole lines, each terminated by `\n`; a batch of
/// lines may arrive in one call. Implementations report failures as
/// [`LoggerError::SinkWrite`](super::error::LoggerError::SinkWrite).
pub trait Sink: Send {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
