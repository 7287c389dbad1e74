//! Configuration management
//!
//! Alert playback reads its volume through the `ConfigStore` trait, backed
//! by the system configuration service, a TOML file or memory.

mod store;

pub use store::{TomlConfigStore, WatchedConfigStore};

use crate::error::{AlertError, AlertResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Well-known key holding the system alert volume (0 = mute, 1 = half, 2 = full)
pub const SYSTEM_ALERT_VOLUME_KEY: &str = "/apps/osso/sound/system_alert_volume";

/// Default cap on the size of a sample file accepted into the cache
pub const DEFAULT_MAX_SAMPLE_BYTES: u64 = 4 * 1024 * 1024;

/// A typed value stored under a configuration key
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Integer value
    Integer(i64),
    /// Boolean value
    Boolean(bool),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Tables, arrays and datetimes, by type name
    Other(&'static str),
}

impl ConfigValue {
    /// Human readable type name, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Other(name) => *name,
        }
    }
}

impl From<&toml::Value> for ConfigValue {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::Integer(v) => ConfigValue::Integer(*v),
            toml::Value::Boolean(v) => ConfigValue::Boolean(*v),
            toml::Value::Float(v) => ConfigValue::Float(*v),
            toml::Value::String(v) => ConfigValue::String(v.clone()),
            other => ConfigValue::Other(other.type_str()),
        }
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

/// Read-only access to a key/value configuration service
pub trait ConfigStore {
    /// Look up the value stored at `key`
    ///
    /// Returns `AlertError::ConfigUnavailable` when the key is absent or the
    /// store cannot be read.
    fn get(&self, key: &str) -> AlertResult<ConfigValue>;

    /// Look up an integer value
    ///
    /// A value of any other type yields `AlertError::ConfigTypeMismatch`.
    fn get_int(&self, key: &str) -> AlertResult<i64> {
        match self.get(key)? {
            ConfigValue::Integer(value) => Ok(value),
            other => Err(AlertError::ConfigTypeMismatch {
                key: key.to_string(),
                found: other.type_name(),
            }),
        }
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        (**self).get(key)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for Box<T> {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        (**self).get(key)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for Arc<T> {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        (**self).get(key)
    }
}

/// Strip surrounding slashes so "/a/b" and "a/b/" name the same key
pub(crate) fn normalize_key(key: &str) -> &str {
    key.trim_matches('/')
}

/// In-memory configuration store
///
/// Values can be changed through a shared reference, which lets tests adjust
/// the volume between plays of the same player.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single system alert volume
    pub fn with_volume(volume: i64) -> Self {
        let store = Self::new();
        store.set(SYSTEM_ALERT_VOLUME_KEY, volume);
        store
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&self, key: &str, value: impl Into<ConfigValue>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(normalize_key(key).to_string(), value.into());
    }

    /// Remove `key`, returning the value it held
    pub fn remove(&self, key: &str) -> Option<ConfigValue> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(normalize_key(key))
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values
            .get(normalize_key(key))
            .cloned()
            .ok_or_else(|| AlertError::ConfigUnavailable {
                key: key.to_string(),
            })
    }
}

/// Player settings, read from the `[player]` table of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Owner tag attached to cached samples; the process name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    /// Largest sample file, in bytes, the cache accepts
    #[serde(default = "default_max_sample_bytes")]
    pub max_sample_bytes: u64,
}

fn default_max_sample_bytes() -> u64 {
    DEFAULT_MAX_SAMPLE_BYTES
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            owner_name: None,
            max_sample_bytes: DEFAULT_MAX_SAMPLE_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lookup() {
        let store = MemoryConfigStore::with_volume(1);
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 1);
        assert_eq!(
            store.get("apps/osso/sound/system_alert_volume/").unwrap(),
            ConfigValue::Integer(1)
        );
    }

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryConfigStore::new();
        let err = store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap_err();
        assert!(matches!(err, AlertError::ConfigUnavailable { .. }));
    }

    #[test]
    fn test_get_int_type_mismatch() {
        let store = MemoryConfigStore::new();
        store.set(SYSTEM_ALERT_VOLUME_KEY, "loud");
        let err = store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap_err();
        assert_eq!(
            err,
            AlertError::ConfigTypeMismatch {
                key: SYSTEM_ALERT_VOLUME_KEY.to_string(),
                found: "string",
            }
        );
    }

    #[test]
    fn test_memory_store_set_and_remove() {
        let store = MemoryConfigStore::with_volume(2);
        store.set(SYSTEM_ALERT_VOLUME_KEY, 0_i64);
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 0);
        assert_eq!(
            store.remove(SYSTEM_ALERT_VOLUME_KEY),
            Some(ConfigValue::Integer(0))
        );
        assert!(store.get(SYSTEM_ALERT_VOLUME_KEY).is_err());
    }

    #[test]
    fn test_store_through_arc() {
        let store = Arc::new(MemoryConfigStore::with_volume(1));
        let shared: Arc<dyn ConfigStore> = store.clone();
        store.set(SYSTEM_ALERT_VOLUME_KEY, 2_i64);
        assert_eq!(shared.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 2);
    }

    #[test]
    fn test_player_settings_defaults() {
        let settings: PlayerSettings = toml::from_str("").unwrap();
        assert_eq!(settings, PlayerSettings::default());
        assert_eq!(settings.max_sample_bytes, DEFAULT_MAX_SAMPLE_BYTES);
        assert!(settings.owner_name.is_none());
    }
}
