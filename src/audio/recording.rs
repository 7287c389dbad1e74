//! Recording audio output for tests and benchmarks
//!
//! Plays nothing; every call made against it is appended to a shared log
//! that can be inspected afterwards.

use super::{AudioOutput, AudioSession};
use crate::error::{AlertError, AlertResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call made against a [`RecordingOutput`] or one of its sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    /// A session open attempt, recorded whether or not it succeeded
    Open,
    /// A sample registration attempt
    CacheSample {
        /// Session the call was made on
        session: u64,
        /// Owner tag passed by the player
        owner: String,
        /// Sample identifier passed by the player
        sample_id: String,
    },
    /// Gain set on a cached sample
    SetGain {
        /// Session the call was made on
        session: u64,
        /// Sample the gain applies to
        sample: u64,
        /// Left channel gain
        left: u8,
        /// Right channel gain
        right: u8,
    },
    /// Playback triggered
    Play {
        /// Session the call was made on
        session: u64,
        /// Sample that was played
        sample: u64,
    },
    /// A cached sample released
    ReleaseSample {
        /// Session the call was made on
        session: u64,
        /// Sample that was released
        sample: u64,
    },
    /// A session closed
    Close {
        /// Session that was closed
        session: u64,
    },
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<AudioCall>,
    next_session: u64,
    next_sample: u64,
    sessions_opened: usize,
    sessions_closed: usize,
}

/// Fake audio output that records calls instead of playing sound
///
/// Clones share the same log, so one clone can be handed to a player while
/// another is kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    recorder: Arc<Mutex<Recorder>>,
    fail_open: bool,
    fail_cache: bool,
    missing_samples: Arc<HashSet<String>>,
}

impl RecordingOutput {
    /// Create an output on which every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `open` fail as if the audio service were down
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make every `cache_sample` fail
    pub fn failing_cache(mut self) -> Self {
        self.fail_cache = true;
        self
    }

    /// Make `cache_sample` fail for one sample id
    pub fn with_missing_sample(mut self, sample_id: impl Into<String>) -> Self {
        let mut missing = (*self.missing_samples).clone();
        missing.insert(sample_id.into());
        self.missing_samples = Arc::new(missing);
        self
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<AudioCall> {
        self.recorder().calls.clone()
    }

    /// Number of sessions successfully opened
    pub fn sessions_opened(&self) -> usize {
        self.recorder().sessions_opened
    }

    /// Number of sessions closed
    pub fn sessions_closed(&self) -> usize {
        self.recorder().sessions_closed
    }

    /// Forget all recorded calls and counts
    pub fn clear(&self) {
        *self.recorder() = Recorder::default();
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        lock(&self.recorder)
    }
}

fn lock(recorder: &Mutex<Recorder>) -> MutexGuard<'_, Recorder> {
    recorder.lock().unwrap_or_else(|e| e.into_inner())
}

impl AudioOutput for RecordingOutput {
    type Session = RecordingSession;

    fn open(&self) -> AlertResult<RecordingSession> {
        let mut recorder = self.recorder();
        recorder.calls.push(AudioCall::Open);

        if self.fail_open {
            return Err(AlertError::AudioServiceUnavailable(
                "recording output configured to fail".to_string(),
            ));
        }

        let id = recorder.next_session;
        recorder.next_session += 1;
        recorder.sessions_opened += 1;

        Ok(RecordingSession {
            id,
            output: self.clone(),
        })
    }
}

/// Handle to a sample cached in a [`RecordingSession`]
#[derive(Debug, PartialEq, Eq)]
pub struct RecordedSample {
    id: u64,
}

impl RecordedSample {
    /// Identifier assigned when the sample was cached
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A session on a [`RecordingOutput`]
#[derive(Debug)]
pub struct RecordingSession {
    id: u64,
    output: RecordingOutput,
}

impl RecordingSession {
    /// Identifier assigned when the session was opened
    pub fn id(&self) -> u64 {
        self.id
    }

    fn record(&self, call: AudioCall) {
        self.output.recorder().calls.push(call);
    }
}

impl AudioSession for RecordingSession {
    type Sample = RecordedSample;

    fn cache_sample(&mut self, owner: &str, sample_id: &str) -> AlertResult<RecordedSample> {
        let mut recorder = self.output.recorder();
        recorder.calls.push(AudioCall::CacheSample {
            session: self.id,
            owner: owner.to_string(),
            sample_id: sample_id.to_string(),
        });

        if self.output.fail_cache || self.output.missing_samples.contains(sample_id) {
            return Err(AlertError::registration(sample_id, "sample not found"));
        }

        let id = recorder.next_sample;
        recorder.next_sample += 1;
        Ok(RecordedSample { id })
    }

    fn set_gain(&mut self, sample: &RecordedSample, left: u8, right: u8) {
        self.record(AudioCall::SetGain {
            session: self.id,
            sample: sample.id,
            left,
            right,
        });
    }

    fn play(&mut self, sample: &RecordedSample) {
        self.record(AudioCall::Play {
            session: self.id,
            sample: sample.id,
        });
    }

    fn release_sample(&mut self, sample: RecordedSample) {
        self.record(AudioCall::ReleaseSample {
            session: self.id,
            sample: sample.id,
        });
    }

    fn close(self) {
        let mut recorder = self.output.recorder();
        recorder.calls.push(AudioCall::Close { session: self.id });
        recorder.sessions_closed += 1;
    }
}
