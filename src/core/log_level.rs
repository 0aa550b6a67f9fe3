//! Log level definitions

use super::error::LoggerError;
use super::level_registry::LevelRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric severity; levels compare by value only
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(i32);

impl Level {
    pub const CRITICAL: Level = Level(50);
    pub const FATAL: Level = Level::CRITICAL;
    pub const ERROR: Level = Level(40);
    pub const WARNING: Level = Level(30);
    pub const WARN: Level = Level::WARNING;
    pub const INFO: Level = Level(20);
    pub const DEBUG: Level = Level(10);
    pub const NOTSET: Level = Level(0);

    #[must_use]
    pub const fn new(value: i32) -> Self {
        Level(value)
    }

    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Display name from the global registry, empty when unnamed
    pub fn name(self) -> String {
        LevelRegistry::global().lookup_name(self.0)
    }

    /// Register `name` for `value` in the global registry and return the level
    pub fn register(name: &str, value: i32) -> Self {
        LevelRegistry::global().register(name, value);
        Level(value)
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match LevelRegistry::global().get_name(self.0) {
            Some(name) => f.write_str(&name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Ok(Level(value));
        }

        let upper = trimmed.to_uppercase();
        let canonical = match upper.as_str() {
            "WARN" => "WARNING",
            "FATAL" => "CRITICAL",
            other => other,
        };

        let registry = LevelRegistry::global();
        registry
            .get_value(canonical)
            .or_else(|| registry.get_value(trimmed))
            .map(Level)
            .ok_or_else(|| LoggerError::InvalidLevel(s.to_string()))
    }
}
