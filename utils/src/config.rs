use std::{path::PathBuf, time::Duration};

use getset::Getters;
use serde::Deserialize;

/// Default interval between expiry-loop ticks.
const DEFAULT_TICK_MILLIS: u64 = 500;
/// Default capacity of the expired-lease outbound queue.
const DEFAULT_QUEUE_CAPACITY: usize = 16;
/// Default lower bound on any granted lease's effective lifetime.
const DEFAULT_MIN_LEASE_TERM_SECS: u64 = 5;

/// Errors that can occur while loading a [`LessorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file contents are not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration for a lessor instance.
///
/// Deserializable from TOML; every field has a sensible default, so a
/// partially-specified file is valid.
#[derive(Debug, Clone, Getters, Deserialize)]
#[getset(get = "pub")]
#[serde(default)]
pub struct LessorConfig {
    /// Replica tag folded into the high bits of every generated lease ID.
    replica_tag: i8,
    /// Interval, in milliseconds, between expiry-loop ticks.
    tick_millis: u64,
    /// Capacity of the bounded expired-lease outbound queue.
    expired_queue_capacity: usize,
    /// Lower bound, in seconds, on any granted lease's effective lifetime.
    min_lease_term_secs: u64,
    /// Directory backing the persistent store.
    storage_path: PathBuf,
}

impl Default for LessorConfig {
    fn default() -> Self {
        Self {
            replica_tag: 0,
            tick_millis: DEFAULT_TICK_MILLIS,
            expired_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            min_lease_term_secs: DEFAULT_MIN_LEASE_TERM_SECS,
            storage_path: PathBuf::from("./lessor-data"),
        }
    }
}

impl LessorConfig {
    /// Load a config from a TOML file on disk, falling back to defaults for
    /// any field the file omits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Build a config directly, bypassing the TOML file. Intended for
    /// callers constructing a lessor in-process (tests, embedding code)
    /// where a config file is unnecessary ceremony.
    #[must_use]
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Self::default()
        }
    }

    /// Override the replica tag.
    #[must_use]
    pub fn with_replica_tag(mut self, replica_tag: i8) -> Self {
        self.replica_tag = replica_tag;
        self
    }

    /// Override the expiry-loop tick interval, in milliseconds.
    #[must_use]
    pub fn with_tick_millis(mut self, tick_millis: u64) -> Self {
        self.tick_millis = tick_millis;
        self
    }

    /// Override the expired-lease outbound queue capacity.
    #[must_use]
    pub fn with_expired_queue_capacity(mut self, capacity: usize) -> Self {
        self.expired_queue_capacity = capacity;
        self
    }

    /// The tick interval as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// The minimum lease term as a [`Duration`].
    #[must_use]
    pub fn min_lease_term(&self) -> Duration {
        Duration::from_secs(self.min_lease_term_secs)
    }
}
