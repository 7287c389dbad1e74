//! System Alert Sound Library
//!
//! Best-effort playback of short alert samples at the system alert volume.
//! The volume is read from an injected configuration store and the sample
//! is played through an injected audio output, so both can be replaced by
//! fakes in tests.

#![warn(missing_docs)]

pub mod audio;
pub mod config;
pub mod config_watcher;
pub mod error;
pub mod player;

// Re-export commonly used types
pub use audio::{AudioCall, AudioOutput, AudioSession, RecordingOutput, RodioOutput};
pub use config::{
    ConfigStore, ConfigValue, MemoryConfigStore, PlayerSettings, TomlConfigStore,
    WatchedConfigStore, SYSTEM_ALERT_VOLUME_KEY,
};
pub use config_watcher::{ConfigReloadEvent, ConfigWatcher};
pub use error::{AlertError, ConfigError};
pub use player::{read_volume_setting, AlertSoundPlayer, PlayOutcome, VolumeScale};
