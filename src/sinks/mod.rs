//! Sink implementations

pub mod console;
pub mod fanout;
pub mod file;
pub mod writer;

pub use console::ConsoleSink;
pub use fanout::FanoutSink;
pub use file::FileSink;
pub use writer::WriterSink;

pub use crate::core::Sink;
