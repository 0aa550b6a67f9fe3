//! Property-based tests for formatted_logger using proptest

use formatted_logger::prelude::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::io;
use std::sync::Arc;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn sync_logger(format: &str, level: Level) -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let logger = Logger::builder()
        .level(level)
        .format(format)
        .sink(WriterSink::new("buffer", buffer.clone()))
        .sync_mode()
        .build()
        .expect("logger");
    (logger, buffer)
}

// ============================================================================
// Level Registry Tests
// ============================================================================

proptest! {
    /// The last registration wins and both directions agree
    #[test]
    fn test_registry_round_trip(name in "[A-Z]{3,12}", value in 1000i32..100_000) {
        let registry = LevelRegistry::new();
        registry.register(&name, value);

        prop_assert_eq!(registry.lookup_name(value), name.clone());
        prop_assert_eq!(registry.lookup_value(&name), value);
    }

    /// Rebinding a name to a new value drops the old reverse entry
    #[test]
    fn test_registry_rebind(name in "[A-Z]{3,12}", first in 1000i32..50_000, second in 50_000i32..100_000) {
        let registry = LevelRegistry::new();
        registry.register(&name, first);
        registry.register(&name, second);

        prop_assert_eq!(registry.lookup_value(&name), second);
        prop_assert_eq!(registry.lookup_name(second), name);
        prop_assert_eq!(registry.lookup_name(first), String::new());
    }
}

// ============================================================================
// Threshold Tests
// ============================================================================

proptest! {
    /// A record is delivered exactly when its level is at or above the threshold
    #[test]
    fn test_threshold_filtering(threshold in -100i32..100, level in -100i32..100) {
        let (logger, buffer) = sync_logger("%s\nmessage", Level::new(threshold));
        logger.log(Level::new(level), "m");

        let delivered = !buffer.0.lock().is_empty();
        prop_assert_eq!(delivered, level >= threshold);
    }

    /// Level ordering follows the numeric value
    #[test]
    fn test_level_ordering(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(Level::new(a) < Level::new(b), a < b);
        prop_assert_eq!(Level::new(a) == Level::new(b), a == b);
    }
}

// ============================================================================
// Rendering Tests
// ============================================================================

proptest! {
    /// Any message renders as exactly one line
    #[test]
    fn test_messages_stay_on_one_line(message in "\\PC*[\n\r\t]?\\PC*") {
        let (logger, buffer) = sync_logger("%s\nmessage", Level::DEBUG);
        logger.info(message.clone());

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        prop_assert!(output.ends_with('\n'));
        prop_assert_eq!(output.matches('\n').count(), 1);
        prop_assert!(!output.contains('\r'));
        prop_assert_eq!(
            output.matches('\t').count(),
            message.matches('\t').count()
        );
    }

    /// Width pads to at least the requested size without truncating
    #[test]
    fn test_width_padding(message in "[a-z]{0,40}", width in 0usize..32) {
        let format = format!("%{}s\nmessage", width);
        let (logger, buffer) = sync_logger(&format, Level::DEBUG);
        logger.info(message.clone());

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        let line = output.trim_end_matches('\n');
        prop_assert_eq!(line.len(), message.len().max(width));
        prop_assert!(line.ends_with(message.as_str()));
    }

    /// Compiling a format with an unknown field always fails
    #[test]
    fn test_unknown_field_rejected(name in "[a-z]{1,10}_x") {
        let spec = format!("%s\n{}", name);
        let err = Template::compile(&spec).unwrap_err();
        prop_assert!(err.is_format());
    }
}
