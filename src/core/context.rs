//! Caller-context identity: thread id, thread name and process id

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches so repeated records on one thread skip the lookups
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<u64>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Supplies the identity of the thread that issued a log call
///
/// Only the `thread`, `threadName` and `process` fields consult it, and only
/// when the active format references them.
pub trait ContextProvider: Send + Sync {
    /// Small, process-unique identifier of the calling thread
    fn thread_id(&self) -> u64;

    /// Display name of the calling thread
    fn thread_name(&self) -> String;

    /// OS process id
    fn process_id(&self) -> u32 {
        std::process::id()
    }
}

/// Default provider backed by `std::thread` and `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdContextProvider;

impl ContextProvider for StdContextProvider {
    fn thread_id(&self) -> u64 {
        THREAD_ID_CACHE.with(|cache| {
            *cache
                .borrow_mut()
                .get_or_insert_with(|| NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
        })
    }

    fn thread_name(&self) -> String {
        let id = self.thread_id();
        THREAD_NAME_CACHE.with(|cache| {
            cache
                .borrow_mut()
                .get_or_insert_with(|| match std::thread::current().name() {
                    Some(name) => name.to_string(),
                    None => format!("Thread-{}", id),
                })
                .clone()
        })
    }
}
