use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::ValueKind;

/// Default configuration namespace prefix.
pub const DEFAULT_PREFIX: &str = "FUZZER_";

/// Default name of the global enable switch, resolved under the prefix.
pub const DEFAULT_ENABLE_FLAG: &str = "ENABLED";

/// Gate configuration.
///
/// All fields have serde defaults so embedders can load a partial document
/// from their own config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateOptions {
    /// Prefix applied to every configuration-source name
    pub config_prefix: String,

    /// Name of the global enable switch
    pub enable_flag: String,

    /// Enable state assumed when the switch is absent from the source
    pub enable_by_default: bool,

    /// Whether to echo input/output when SHOW_IO is absent from the source
    pub show_io_by_default: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        GateOptions {
            config_prefix: DEFAULT_PREFIX.to_string(),
            enable_flag: DEFAULT_ENABLE_FLAG.to_string(),
            enable_by_default: false,
            show_io_by_default: false,
        }
    }
}

/// Errors that can occur while decoding configuration values.
///
/// A missing entry is not an error (lookups return `Ok(None)`); only a
/// present value that cannot be decoded as its declared type fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected {expected} for configuration key {key} (value: {value})")]
    TypeMismatch {
        key: String,
        value: String,
        expected: ValueKind,
    },
}

/// Named key/value lookup backing a [`ConfigResolver`].
///
/// Keys arrive fully namespaced and uppercased; implementations only answer
/// whether an entry exists and what its literal value is.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Configuration source backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl EnvSource {
    pub fn new() -> Self {
        EnvSource
    }
}

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Shared in-memory configuration source.
///
/// Clones share the same map, so a test harness can hold one handle and
/// mutate entries between evaluations while the gate owns another. Nothing
/// is cached downstream, so changes take effect on the next lookup.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Insert or replace an entry.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Remove an entry, making subsequent lookups absent.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl ConfigSource for MemorySource {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

/// Typed lookup of named configuration values.
///
/// Names are uppercased and namespaced with the resolver's prefix before the
/// backing source is consulted. Every call re-reads the source; values may
/// change between calls.
#[derive(Debug)]
pub struct ConfigResolver<S> {
    source: S,
    prefix: String,
}

impl<S: ConfigSource> ConfigResolver<S> {
    pub fn new(source: S, prefix: &str) -> Self {
        ConfigResolver {
            source,
            prefix: prefix.to_uppercase(),
        }
    }

    /// Replace the namespace prefix applied to all subsequent lookups.
    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_uppercase();
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_uppercase())
    }

    /// String lookup, returned verbatim.
    pub fn string(&self, name: &str) -> Option<String> {
        self.source.get(&self.qualified(name))
    }

    /// Boolean lookup. Accepts `0`/`1`/`true`/`false`, case-insensitively.
    pub fn boolean(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let key = self.qualified(name);
        let Some(raw) = self.source.get(&key) else {
            return Ok(None);
        };
        match raw.to_lowercase().as_str() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(ConfigError::TypeMismatch {
                key,
                value: raw,
                expected: ValueKind::Boolean,
            }),
        }
    }

    /// Integer lookup.
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        let key = self.qualified(name);
        let Some(raw) = self.source.get(&key) else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(ConfigError::TypeMismatch {
                key,
                value: raw,
                expected: ValueKind::Integer,
            }),
        }
    }
}
