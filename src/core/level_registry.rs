//! Process-wide level name/value registry
//!
//! The two lookup tables live behind one lock so a reader always sees a
//! name/value pair updated together. All writes funnel through a single
//! updater thread that drains a bounded request queue, which serializes
//! concurrent registrations without ever blocking readers for longer than
//! one table swap.

use crossbeam_channel::{bounded, Receiver, Sender};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

/// Maximum number of registrations waiting for the updater thread
pub const REGISTRATION_QUEUE_SIZE: usize = 10;

static GLOBAL_REGISTRY: Lazy<LevelRegistry> = Lazy::new(LevelRegistry::new);

const BUILTIN_LEVELS: [(&str, i32); 6] = [
    ("CRITICAL", 50),
    ("ERROR", 40),
    ("WARNING", 30),
    ("INFO", 20),
    ("DEBUG", 10),
    ("NOTSET", 0),
];

fn is_builtin(name: &str) -> bool {
    BUILTIN_LEVELS.iter().any(|(builtin, _)| *builtin == name)
}

#[derive(Debug, Default)]
struct LevelTables {
    names: HashMap<i32, String>,
    values: HashMap<String, i32>,
}

impl LevelTables {
    fn with_builtins() -> Self {
        let mut tables = Self::default();
        for (name, value) in BUILTIN_LEVELS {
            tables.bind(name, value);
        }
        tables
    }

    /// Bind `name` to `value`, unbinding stale entries either side pointed
    /// at before. Built-in names always keep resolving to their value.
    fn bind(&mut self, name: &str, value: i32) {
        if let Some(old_value) = self.values.get(name).copied() {
            if old_value != value && self.names.get(&old_value).map(String::as_str) == Some(name)
            {
                self.names.remove(&old_value);
            }
        }
        if let Some(old_name) = self.names.get(&value).cloned() {
            if old_name != name
                && !is_builtin(&old_name)
                && self.values.get(&old_name) == Some(&value)
            {
                self.values.remove(&old_name);
            }
        }
        self.names.insert(value, name.to_string());
        self.values.insert(name.to_string(), value);
    }
}

struct Registration {
    name: String,
    value: i32,
    applied: Sender<()>,
}

/// Mapping between level names and numeric severities
///
/// # Example
///
/// ```
/// use formatted_logger::LevelRegistry;
///
/// let registry = LevelRegistry::new();
/// registry.register("TRACE", 5);
///
/// assert_eq!(registry.lookup_value("TRACE"), 5);
/// assert_eq!(registry.lookup_name(5), "TRACE");
/// assert_eq!(registry.lookup_name(41), "");
/// ```
pub struct LevelRegistry {
    tables: Arc<RwLock<LevelTables>>,
    updates: Sender<Registration>,
}

impl LevelRegistry {
    /// Create a registry holding the built-in levels, with its own updater thread
    #[must_use]
    pub fn new() -> Self {
        let tables = Arc::new(RwLock::new(LevelTables::with_builtins()));
        let (updates, receiver) = bounded(REGISTRATION_QUEUE_SIZE);

        let worker_tables = Arc::clone(&tables);
        let spawned = thread::Builder::new()
            .name("level-registry".to_string())
            .spawn(move || Self::apply_updates(&worker_tables, &receiver));
        if let Err(e) = spawned {
            // Registrations fall back to applying inline when nobody drains the queue.
            eprintln!("[LOGGER WARNING] Failed to start level registry updater: {}", e);
        }

        Self { tables, updates }
    }

    /// The registry shared by every logger in the process
    pub fn global() -> &'static LevelRegistry {
        &GLOBAL_REGISTRY
    }

    fn apply_updates(tables: &RwLock<LevelTables>, receiver: &Receiver<Registration>) {
        for registration in receiver.iter() {
            tables
                .write()
                .bind(&registration.name, registration.value);
            let _ = registration.applied.send(());
        }
    }

    /// Install or rebind `name` <-> `value`
    ///
    /// Returns once the updater thread has applied the pair, so the caller
    /// observes its own registration immediately. Other threads may still be
    /// rendering with the previous binding while the update is in flight.
    pub fn register(&self, name: &str, value: i32) {
        let (applied, done) = bounded(1);
        let request = Registration {
            name: name.to_string(),
            value,
            applied,
        };

        match self.updates.send(request) {
            Ok(()) => {
                if done.recv().is_err() {
                    self.tables.write().bind(name, value);
                }
            }
            Err(_) => self.tables.write().bind(name, value),
        }
    }

    /// Name bound to `value`, or an empty string when none is
    pub fn lookup_name(&self, value: i32) -> String {
        self.get_name(value).unwrap_or_default()
    }

    /// Value bound to `name`, or `0` when none is
    pub fn lookup_value(&self, name: &str) -> i32 {
        self.get_value(name).unwrap_or(0)
    }

    pub fn get_name(&self, value: i32) -> Option<String> {
        self.tables.read().names.get(&value).cloned()
    }

    pub fn get_value(&self, name: &str) -> Option<i32> {
        self.tables.read().values.get(name).copied()
    }

    /// Snapshot of all bindings, sorted by value
    pub fn levels(&self) -> Vec<(String, i32)> {
        let tables = self.tables.read();
        let mut levels: Vec<(String, i32)> = tables
            .values
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        levels.sort_by_key(|(_, value)| *value);
        levels
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register a custom level in the global registry
pub fn register_level(name: &str, value: i32) {
    LevelRegistry::global().register(name, value);
}

/// Look up a level name in the global registry (empty when unknown)
pub fn level_name(value: i32) -> String {
    LevelRegistry::global().lookup_name(value)
}

/// Look up a level value in the global registry (`0` when unknown)
pub fn level_value(name: &str) -> i32 {
    LevelRegistry::global().lookup_value(name)
}
