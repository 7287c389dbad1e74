//! Audio output for alert samples
//!
//! An alert is played through a short-lived [`AudioSession`] opened on an
//! [`AudioOutput`]: the sample is cached in the session, given a gain,
//! triggered, released, and the session is closed again. Both the sample
//! handle and the session are consumed when released, so neither can be
//! released twice.

#[cfg(feature = "audio")]
mod device;

#[cfg(feature = "audio")]
pub use device::{RodioOutput, RodioSample, RodioSession};

#[cfg(not(feature = "audio"))]
mod stub;

#[cfg(not(feature = "audio"))]
pub use stub::{RodioOutput, StubSession};

mod recording;

pub use recording::{AudioCall, RecordedSample, RecordingOutput, RecordingSession};

use crate::error::AlertResult;
use std::sync::Arc;

/// Gain that leaves a sample at its recorded level
pub const UNITY_GAIN: u8 = 255;

/// Convert a `0..=255` gain into a linear amplitude factor
pub fn gain_to_amplitude(gain: u8) -> f32 {
    f32::from(gain) / f32::from(UNITY_GAIN)
}

/// A connection point to an audio output service
pub trait AudioOutput {
    /// Session type handed out by [`AudioOutput::open`]
    type Session: AudioSession;

    /// Open a new session
    ///
    /// Fails with `AlertError::AudioServiceUnavailable` when no output can
    /// be reached.
    fn open(&self) -> AlertResult<Self::Session>;
}

/// An open session with the audio output service
pub trait AudioSession {
    /// Handle to a sample held in this session's cache
    type Sample;

    /// Upload `sample_id` into the session's cache, tagged with `owner`
    fn cache_sample(&mut self, owner: &str, sample_id: &str) -> AlertResult<Self::Sample>;

    /// Set the per-channel gain used when `sample` is played
    fn set_gain(&mut self, sample: &Self::Sample, left: u8, right: u8);

    /// Start playing `sample` without waiting for it to finish
    fn play(&mut self, sample: &Self::Sample);

    /// Drop `sample` from the cache
    fn release_sample(&mut self, sample: Self::Sample);

    /// Close the session
    fn close(self);
}

impl<T: AudioOutput + ?Sized> AudioOutput for &T {
    type Session = T::Session;

    fn open(&self) -> AlertResult<Self::Session> {
        (**self).open()
    }
}

impl<T: AudioOutput + ?Sized> AudioOutput for Arc<T> {
    type Session = T::Session;

    fn open(&self) -> AlertResult<Self::Session> {
        (**self).open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_to_amplitude() {
        assert_eq!(gain_to_amplitude(UNITY_GAIN), 1.0);
        assert_eq!(gain_to_amplitude(0), 0.0);
        let half = gain_to_amplitude(128);
        assert!(half > 0.5 && half < 0.51);
    }
}
