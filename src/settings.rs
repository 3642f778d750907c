//! Site settings collaborator.
//!
//! The admin panel keeps a key/value settings table (upload limit, contact
//! number, feature toggles). The pipeline only reads from it, through the
//! [`SettingsStore`] trait, once per request when building
//! [`PipelineOptions`](crate::upload::PipelineOptions). There is no global
//! settings cache.

use crate::config::{MAX_UPLOAD_MB, MIN_UPLOAD_MB};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const MAX_UPLOAD_SIZE_KEY: &str = "max_upload_size";

const MIB: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("settings file must be a flat table, {0:?} is nested")]
    Nested(String),
}

/// Read-only view of the settings table.
pub trait SettingsStore {
    /// The stored value for `key`, or `default` when unset.
    fn get(&self, key: &str, default: &str) -> String;
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

/// Settings exported to a flat TOML file, e.g.
///
/// ```toml
/// max_upload_size = 12
/// whatsapp_number = "+447700900123"
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlFileSettings {
    inner: MemorySettings,
}

impl TomlFileSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut inner = MemorySettings::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Table(_) | toml::Value::Array(_) => {
                    return Err(SettingsError::Nested(key));
                }
                other => other.to_string(),
            };
            inner.set(&key, &text);
        }
        Ok(Self { inner })
    }
}

impl SettingsStore for TomlFileSettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.inner.get(key, default)
    }
}

/// Interpret a `max_upload_size` setting as a byte limit.
///
/// The admin form stores megabytes; older rows may hold raw bytes. Values up
/// to 50 are read as MiB, larger ones as bytes. Returns `None` when the
/// value is unparsable or the result falls outside 1-50 MiB.
pub fn parse_max_upload_size(raw: &str) -> Option<u64> {
    let value: u64 = raw.trim().parse().ok()?;
    let bytes = if value <= u64::from(MAX_UPLOAD_MB) {
        value * MIB
    } else {
        value
    };
    let range = u64::from(MIN_UPLOAD_MB) * MIB..=u64::from(MAX_UPLOAD_MB) * MIB;
    range.contains(&bytes).then_some(bytes)
}

pub fn mib(megabytes: u32) -> u64 {
    u64::from(megabytes) * MIB
}
