//! Stub implementation when audio feature is disabled

use super::{AudioOutput, AudioSession};
use crate::config::PlayerSettings;
use crate::error::{AlertError, AlertResult};
use tracing::debug;

/// Stub audio output; sessions never open, so alerts are silently skipped
#[derive(Debug, Default)]
pub struct RodioOutput;

impl RodioOutput {
    /// Create an audio output stub
    pub fn new() -> Self {
        debug!("Audio feature not enabled, using stub output");
        Self
    }

    /// Create an audio output stub (settings are ignored)
    pub fn from_settings(_settings: &PlayerSettings) -> Self {
        Self::new()
    }

    /// Set cache limit (no-op)
    pub fn with_max_sample_bytes(self, _max_sample_bytes: u64) -> Self {
        self
    }

    /// Number of samples still playing (always zero)
    pub fn active_sounds(&self) -> usize {
        0
    }

    /// Wait for playback (no-op)
    pub fn wait_until_idle(&self) {}
}

/// Session type of the stub output; it can never be constructed
#[derive(Debug)]
pub enum StubSession {}

impl AudioOutput for RodioOutput {
    type Session = StubSession;

    fn open(&self) -> AlertResult<StubSession> {
        Err(AlertError::AudioServiceUnavailable(
            "audio feature not enabled".to_string(),
        ))
    }
}

impl AudioSession for StubSession {
    type Sample = ();

    fn cache_sample(&mut self, _owner: &str, _sample_id: &str) -> AlertResult<()> {
        match *self {}
    }

    fn set_gain(&mut self, _sample: &(), _left: u8, _right: u8) {
        match *self {}
    }

    fn play(&mut self, _sample: &()) {
        match *self {}
    }

    fn release_sample(&mut self, _sample: ()) {
        match *self {}
    }

    fn close(self) {
        match self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_never_opens() {
        let output = RodioOutput::new();
        assert!(matches!(
            output.open(),
            Err(AlertError::AudioServiceUnavailable(_))
        ));
        assert_eq!(output.active_sounds(), 0);
    }
}
