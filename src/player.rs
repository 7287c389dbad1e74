//! Volume-aware alert sound playback
//!
//! [`AlertSoundPlayer`] reads the system alert volume from a
//! [`ConfigStore`], maps it to a gain and plays a sample through an
//! [`AudioOutput`]. Playback is best effort: [`AlertSoundPlayer::play`]
//! never reports failure, it simply stays silent.
//!
//! | Setting            | Scale  | Gain      |
//! |--------------------|--------|-----------|
//! | 0                  | mute   | no output |
//! | 1                  | half   | 128/255   |
//! | 2, anything else   | full   | 255/255   |
//!
//! An unreadable or non-integer setting counts as full volume.

use crate::audio::{AudioOutput, AudioSession, UNITY_GAIN};
use crate::config::{ConfigStore, PlayerSettings, SYSTEM_ALERT_VOLUME_KEY};
use crate::error::AlertResult;
use std::fmt;
use std::path::Path;
use tracing::{debug, trace};

/// Gain applied at half volume
pub const HALF_GAIN: u8 = 128;

/// Highest volume setting; used when the setting cannot be read
pub const MAX_VOLUME_SETTING: i64 = 2;

/// Volume level derived from the system alert volume setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeScale {
    /// No sound; no audio session is opened
    Mute,
    /// Half gain on both channels
    Half,
    /// Unity gain on both channels
    Full,
}

impl VolumeScale {
    /// Map a raw setting to a scale; unexpected values play at full volume
    pub fn from_setting(setting: i64) -> Self {
        match setting {
            0 => VolumeScale::Mute,
            1 => VolumeScale::Half,
            _ => VolumeScale::Full,
        }
    }

    /// Per-channel gain, or `None` when muted
    pub fn gain(self) -> Option<u8> {
        match self {
            VolumeScale::Mute => None,
            VolumeScale::Half => Some(HALF_GAIN),
            VolumeScale::Full => Some(UNITY_GAIN),
        }
    }
}

impl fmt::Display for VolumeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeScale::Mute => write!(f, "mute"),
            VolumeScale::Half => write!(f, "half"),
            VolumeScale::Full => write!(f, "full"),
        }
    }
}

/// Read the alert volume setting, falling back to the maximum on any error
pub fn read_volume_setting<C: ConfigStore + ?Sized>(config: &C) -> i64 {
    match config.get_int(SYSTEM_ALERT_VOLUME_KEY) {
        Ok(setting) => setting,
        Err(e) => {
            debug!(error = %e, "Alert volume unreadable, using full volume");
            MAX_VOLUME_SETTING
        }
    }
}

/// What a completed [`AlertSoundPlayer::try_play`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Volume is muted; no audio session was opened
    Muted,
    /// The sample was triggered at `gain` on both channels
    Played {
        /// Gain applied, 255 being unity
        gain: u8,
    },
}

/// Plays alert samples at the system alert volume
pub struct AlertSoundPlayer<C, A> {
    config: C,
    output: A,
    owner_name: String,
}

impl<C: ConfigStore, A: AudioOutput> AlertSoundPlayer<C, A> {
    /// Create a player that tags samples with the current process name
    pub fn new(config: C, output: A) -> Self {
        Self {
            config,
            output,
            owner_name: process_name(),
        }
    }

    /// Override the owner tag attached to cached samples
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = owner_name.into();
        self
    }

    /// Apply player settings loaded from the config file
    pub fn with_settings(self, settings: &PlayerSettings) -> Self {
        match &settings.owner_name {
            Some(name) => self.with_owner_name(name.clone()),
            None => self,
        }
    }

    /// Owner tag attached to cached samples
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// The configuration store volume is read from
    pub fn config(&self) -> &C {
        &self.config
    }

    /// The audio output samples are played on
    pub fn output(&self) -> &A {
        &self.output
    }

    /// Scale the next [`play`](Self::play) would use
    pub fn volume_scale(&self) -> VolumeScale {
        VolumeScale::from_setting(read_volume_setting(&self.config))
    }

    /// Play `sample_id` at the system alert volume
    ///
    /// Failures are swallowed: a missing audio service or sample results in
    /// silence, never an error or a panic.
    pub fn play(&self, sample_id: &str) {
        if let Err(e) = self.try_play(sample_id) {
            debug!(sample = %sample_id, error = %e, "Alert sound skipped");
        }
    }

    /// Play `sample_id`, reporting what happened
    ///
    /// An opened session is closed exactly once on every path; a cached
    /// sample is released only after it was played.
    pub fn try_play(&self, sample_id: &str) -> AlertResult<PlayOutcome> {
        let scale = self.volume_scale();
        let Some(gain) = scale.gain() else {
            trace!(sample = %sample_id, "Alert volume muted");
            return Ok(PlayOutcome::Muted);
        };

        let mut session = self.output.open()?;
        let result = self.play_in_session(&mut session, sample_id, gain);
        session.close();

        result?;
        trace!(sample = %sample_id, %scale, gain, "Alert sound triggered");
        Ok(PlayOutcome::Played { gain })
    }

    fn play_in_session(
        &self,
        session: &mut A::Session,
        sample_id: &str,
        gain: u8,
    ) -> AlertResult<()> {
        let sample = session.cache_sample(&self.owner_name, sample_id)?;
        session.set_gain(&sample, gain, gain);
        session.play(&sample);
        session.release_sample(sample);
        Ok(())
    }
}

/// Name of the running program, used to tag cached samples
pub fn process_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCall, RecordingOutput};
    use crate::config::MemoryConfigStore;

    fn gains(output: &RecordingOutput) -> Vec<(u8, u8)> {
        output
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                AudioCall::SetGain { left, right, .. } => Some((left, right)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_volume_scale_table() {
        assert_eq!(VolumeScale::from_setting(0), VolumeScale::Mute);
        assert_eq!(VolumeScale::from_setting(1), VolumeScale::Half);
        assert_eq!(VolumeScale::from_setting(2), VolumeScale::Full);
        assert_eq!(VolumeScale::from_setting(3), VolumeScale::Full);
        assert_eq!(VolumeScale::from_setting(-1), VolumeScale::Full);
        assert_eq!(VolumeScale::Mute.gain(), None);
        assert_eq!(VolumeScale::Half.gain(), Some(128));
        assert_eq!(VolumeScale::Full.gain(), Some(255));
    }

    #[test]
    fn test_muted_opens_no_session() {
        let output = RecordingOutput::new();
        let player = AlertSoundPlayer::new(MemoryConfigStore::with_volume(0), &output);

        assert_eq!(player.try_play("alert.wav").unwrap(), PlayOutcome::Muted);
        assert!(output.calls().is_empty());
        assert_eq!(output.sessions_opened(), 0);
    }

    #[test]
    fn test_half_volume_gain() {
        let output = RecordingOutput::new();
        let player = AlertSoundPlayer::new(MemoryConfigStore::with_volume(1), &output);

        player.play("alert.wav");
        assert_eq!(gains(&output), vec![(128, 128)]);
    }

    #[test]
    fn test_missing_setting_fails_open() {
        let output = RecordingOutput::new();
        let player = AlertSoundPlayer::new(MemoryConfigStore::new(), &output);

        assert_eq!(player.volume_scale(), VolumeScale::Full);
        assert_eq!(
            player.try_play("alert.wav").unwrap(),
            PlayOutcome::Played { gain: 255 }
        );
        assert_eq!(gains(&output), vec![(255, 255)]);
    }

    #[test]
    fn test_owner_name_from_settings() {
        let output = RecordingOutput::new();
        let settings = PlayerSettings {
            owner_name: Some("calendar".to_string()),
            ..PlayerSettings::default()
        };
        let player =
            AlertSoundPlayer::new(MemoryConfigStore::with_volume(2), &output).with_settings(&settings);
        assert_eq!(player.owner_name(), "calendar");

        player.play("alert.wav");
        assert!(output.calls().contains(&AudioCall::CacheSample {
            session: 0,
            owner: "calendar".to_string(),
            sample_id: "alert.wav".to_string(),
        }));
    }

    #[test]
    fn test_default_owner_is_process_name() {
        let player = AlertSoundPlayer::new(MemoryConfigStore::new(), RecordingOutput::new());
        assert_eq!(player.owner_name(), process_name());
        assert!(!player.owner_name().is_empty());
    }

    #[test]
    fn test_volume_scale_display() {
        assert_eq!(VolumeScale::Mute.to_string(), "mute");
        assert_eq!(VolumeScale::Half.to_string(), "half");
        assert_eq!(VolumeScale::Full.to_string(), "full");
    }
}
