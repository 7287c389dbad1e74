// File-backed configuration stores

use super::{normalize_key, ConfigStore, ConfigValue, PlayerSettings, SYSTEM_ALERT_VOLUME_KEY};
use crate::config_watcher::ConfigWatcher;
use crate::error::{AlertError, AlertResult, ConfigError, ConfigResult};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Configuration store backed by a TOML document
///
/// Slash-separated keys walk nested tables, so
/// `/apps/osso/sound/system_alert_volume` is read from
///
/// ```toml
/// [apps.osso.sound]
/// system_alert_volume = 2
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: Option<PathBuf>,
    table: toml::Table,
}

impl TomlConfigStore {
    /// Load a store from a TOML file
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let table = read_table(&path)?;
        debug!(path = %path.display(), "Loaded alert sound configuration");
        Ok(Self {
            path: Some(path),
            table,
        })
    }

    /// Load the user's configuration file, writing a default one if missing
    pub fn open_default() -> ConfigResult<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            Self::write_default(&path)?;
        }
        Self::open(path)
    }

    /// Get the path to the user's configuration file
    pub fn default_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("system-alert-sound").join("config.toml"))
    }

    /// Write a configuration file holding full volume and default settings
    pub fn write_default(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut table = toml::Table::new();
        insert_path(
            &mut table,
            SYSTEM_ALERT_VOLUME_KEY,
            toml::Value::Integer(2),
        );
        table.insert(
            "player".to_string(),
            toml::Value::try_from(PlayerSettings::default())?,
        );

        let content = toml::to_string_pretty(&table)?;
        std::fs::write(path, content)?;

        debug!(path = %path.display(), "Wrote default alert sound configuration");
        Ok(())
    }

    /// Path of the backing file, if the store was loaded from one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file
    ///
    /// On failure the previously loaded contents are kept.
    pub fn reload(&mut self) -> ConfigResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.table = read_table(path)?;
        Ok(())
    }

    /// Player settings from the `[player]` table
    pub fn settings(&self) -> ConfigResult<PlayerSettings> {
        match self.table.get("player") {
            Some(value) => Ok(value.clone().try_into()?),
            None => Ok(PlayerSettings::default()),
        }
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut segments = normalize_key(key).split('/');
        let mut value = self.table.get(segments.next()?)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }
        Some(value)
    }
}

impl FromStr for TomlConfigStore {
    type Err = ConfigError;

    fn from_str(content: &str) -> ConfigResult<Self> {
        Ok(Self {
            path: None,
            table: toml::from_str(content)?,
        })
    }
}

impl ConfigStore for TomlConfigStore {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        self.lookup(key)
            .map(ConfigValue::from)
            .ok_or_else(|| AlertError::ConfigUnavailable {
                key: key.to_string(),
            })
    }
}

fn read_table(path: &Path) -> ConfigResult<toml::Table> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

/// Insert `value` at a slash-separated key, creating intermediate tables
fn insert_path(table: &mut toml::Table, key: &str, value: toml::Value) {
    let segments: Vec<&str> = normalize_key(key).split('/').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            *entry = toml::Value::Table(toml::Table::new());
        }
        current = match entry {
            toml::Value::Table(inner) => inner,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

/// TOML store that reloads itself when its file changes on disk
pub struct WatchedConfigStore {
    store: RwLock<TomlConfigStore>,
    watcher: ConfigWatcher,
}

impl WatchedConfigStore {
    /// Open `path` and start watching it for changes
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let store = TomlConfigStore::open(&path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        let watcher = ConfigWatcher::new(path)?;

        Ok(Self {
            store: RwLock::new(store),
            watcher,
        })
    }

    /// Watch the user's configuration file, writing a default one if missing
    pub fn open_default() -> anyhow::Result<Self> {
        let path = TomlConfigStore::default_path()?;
        if !path.exists() {
            TomlConfigStore::write_default(&path)?;
        }
        Self::new(path)
    }

    /// Player settings from the current contents of the file
    pub fn settings(&self) -> ConfigResult<PlayerSettings> {
        self.refresh();
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.settings()
    }

    /// Apply any pending reload events
    fn refresh(&self) {
        let mut pending = false;
        while self.watcher.try_recv().is_some() {
            pending = true;
        }
        if !pending {
            return;
        }

        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        match store.reload() {
            Ok(()) => debug!("Alert sound configuration reloaded"),
            Err(e) => warn!(error = %e, "Config reload failed, keeping previous values"),
        }
    }
}

impl ConfigStore for WatchedConfigStore {
    fn get(&self, key: &str) -> AlertResult<ConfigValue> {
        self.refresh();
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[apps.osso.sound]
system_alert_volume = 1

[player]
owner_name = "clock-applet"
max_sample_bytes = 1024
"#;

    #[test]
    fn test_nested_key_lookup() {
        let store: TomlConfigStore = SAMPLE_CONFIG.parse().unwrap();
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 1);
        assert_eq!(store.get("apps/osso").unwrap(), ConfigValue::Other("table"));
    }

    #[test]
    fn test_missing_and_partial_keys() {
        let store: TomlConfigStore = SAMPLE_CONFIG.parse().unwrap();
        assert!(matches!(
            store.get("/apps/osso/sound/missing"),
            Err(AlertError::ConfigUnavailable { .. })
        ));
        // Walking through a non-table value
        assert!(store
            .get("/apps/osso/sound/system_alert_volume/deeper")
            .is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_wrong_type() {
        let store: TomlConfigStore = "[apps.osso.sound]\nsystem_alert_volume = \"high\"\n"
            .parse()
            .unwrap();
        assert!(matches!(
            store.get_int(SYSTEM_ALERT_VOLUME_KEY),
            Err(AlertError::ConfigTypeMismatch { found: "string", .. })
        ));
    }

    #[test]
    fn test_settings_from_player_table() {
        let store: TomlConfigStore = SAMPLE_CONFIG.parse().unwrap();
        let settings = store.settings().unwrap();
        assert_eq!(settings.owner_name.as_deref(), Some("clock-applet"));
        assert_eq!(settings.max_sample_bytes, 1024);

        let empty: TomlConfigStore = "".parse().unwrap();
        assert_eq!(empty.settings().unwrap(), PlayerSettings::default());
    }

    #[test]
    fn test_parse_error() {
        let result = "[apps.osso".parse::<TomlConfigStore>();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_write_default_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        TomlConfigStore::write_default(&path).unwrap();
        let store = TomlConfigStore::open(&path).unwrap();

        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 2);
        assert_eq!(store.settings().unwrap(), PlayerSettings::default());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = TomlConfigStore::open(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_reload_keeps_previous_contents_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE_CONFIG).unwrap();

        let mut store = TomlConfigStore::open(&path).unwrap();
        std::fs::write(&path, "[apps.osso.sound]\nsystem_alert_volume = 0\n").unwrap();
        store.reload().unwrap();
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 0);

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.get_int(SYSTEM_ALERT_VOLUME_KEY).unwrap(), 0);
    }

    #[test]
    fn test_insert_path_replaces_scalars() {
        let mut table = toml::Table::new();
        table.insert("apps".to_string(), toml::Value::Integer(5));
        insert_path(&mut table, "/apps/osso/value", toml::Value::Boolean(true));

        let store = TomlConfigStore { path: None, table };
        assert_eq!(store.get("apps/osso/value").unwrap(), ConfigValue::Boolean(true));
    }
}
