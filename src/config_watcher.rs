//! Configuration file watcher with hot-reload capability

use anyhow::{Context, Result};
use notify::{
    event::{CreateKind, EventKind, ModifyKind},
    Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

/// Configuration reload event
#[derive(Debug, Clone)]
pub struct ConfigReloadEvent {
    /// Timestamp when the event was generated
    pub timestamp: Instant,
}

/// Configuration file watcher
///
/// Watches the directory holding the config file, so editors that save by
/// writing a new file and renaming it over the old one are still picked up.
/// Events for other files in the directory are ignored. Every relevant event
/// is forwarded; consumers collapse a burst by draining the channel before
/// reloading, so the last write of a burst is never lost.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<ConfigReloadEvent>,
}

impl ConfigWatcher {
    /// Create a new config watcher for `config_path`
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let file_name: OsString = config_path
            .file_name()
            .map(|name| name.to_os_string())
            .with_context(|| format!("Config path has no file name: {}", config_path.display()))?;
        let watch_dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let relevant_kind = matches!(
                        event.kind,
                        EventKind::Modify(ModifyKind::Data(_))
                            | EventKind::Modify(ModifyKind::Any)
                            | EventKind::Modify(ModifyKind::Name(_))
                            | EventKind::Create(CreateKind::File)
                            | EventKind::Create(CreateKind::Any)
                    );
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|path| path.file_name() == Some(file_name.as_os_str()));

                    if !relevant_kind || !touches_config {
                        tracing::trace!(kind = ?event.kind, "Ignoring file event");
                        return;
                    }

                    tracing::debug!("Config file changed, triggering reload");
                    let reload_event = ConfigReloadEvent {
                        timestamp: Instant::now(),
                    };
                    if let Err(e) = tx.send(reload_event) {
                        tracing::debug!(error = %e, "Config watcher receiver dropped");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "File watcher error");
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", watch_dir.display()))?;

        tracing::info!(
            path = %config_path.display(),
            "Config file watcher initialized"
        );

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Try to receive a reload event (non-blocking)
    ///
    /// Returns Some(event) if a reload is pending, None otherwise.
    pub fn try_recv(&self) -> Option<ConfigReloadEvent> {
        self.receiver.try_recv().ok()
    }
}
