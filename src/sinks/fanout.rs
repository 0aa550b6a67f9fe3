//! Fan-out over several sinks

use crate::core::{Result, Sink};

/// Writes every batch to each inner sink in order
///
/// A failing sink does not stop the others; the first error is returned.
pub struct FanoutSink {
    sinks: Vec<Box<dyn Sink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn Sink) -> Result<()>,
    {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = f(sink.as_mut()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Sink for FanoutSink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.each(|sink| sink.write_all(bytes))
    }

    fn flush(&mut self) -> Result<()> {
        self.each(|sink| sink.flush())
    }

    fn name(&self) -> &str {
        "fanout"
    }
}
