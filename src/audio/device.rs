//! Audio output on the default sound device using rodio

use super::{gain_to_amplitude, AudioOutput, AudioSession, UNITY_GAIN};
use crate::config::{PlayerSettings, DEFAULT_MAX_SAMPLE_BYTES};
use crate::error::{AlertError, AlertResult};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sample, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace};

type Sinks = Arc<Mutex<Vec<Sink>>>;

fn lock_sinks(sinks: &Mutex<Vec<Sink>>) -> MutexGuard<'_, Vec<Sink>> {
    sinks.lock().unwrap_or_else(|e| e.into_inner())
}

// The rodio stream cannot leave the thread that opened it, so it lives on a
// parked thread until `_stop` is dropped.
struct Device {
    handle: OutputStreamHandle,
    _stop: mpsc::Sender<()>,
}

fn spawn_device() -> AlertResult<Device> {
    let (ready_tx, ready_rx) = mpsc::channel();
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    thread::Builder::new()
        .name("alert-audio".to_string())
        .spawn(move || match OutputStream::try_default() {
            Ok((_stream, handle)) => {
                if ready_tx.send(Ok(handle)).is_ok() {
                    // Returns once the owning output is dropped
                    let _ = stop_rx.recv();
                }
                debug!("Audio output device closed");
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
            }
        })
        .map_err(|e| AlertError::AudioServiceUnavailable(e.to_string()))?;

    let handle = ready_rx
        .recv()
        .map_err(|_| {
            AlertError::AudioServiceUnavailable("audio device thread exited".to_string())
        })?
        .map_err(AlertError::AudioServiceUnavailable)?;

    Ok(Device {
        handle,
        _stop: stop_tx,
    })
}

/// Audio output on the system's default device
///
/// The device is opened on the first [`AudioOutput::open`] and kept for the
/// life of this value, so samples keep playing after their session closes.
/// One output can be shared between threads.
pub struct RodioOutput {
    device: Mutex<Option<Device>>,
    sinks: Sinks,
    max_sample_bytes: u64,
}

impl RodioOutput {
    /// Create an output; the device is not touched until a session opens
    pub fn new() -> Self {
        Self {
            device: Mutex::new(None),
            sinks: Arc::new(Mutex::new(Vec::new())),
            max_sample_bytes: DEFAULT_MAX_SAMPLE_BYTES,
        }
    }

    /// Create an output using the cache limit from `settings`
    pub fn from_settings(settings: &PlayerSettings) -> Self {
        Self::new().with_max_sample_bytes(settings.max_sample_bytes)
    }

    /// Set the largest sample file accepted into a session cache
    pub fn with_max_sample_bytes(mut self, max_sample_bytes: u64) -> Self {
        self.max_sample_bytes = max_sample_bytes;
        self
    }

    /// Number of samples still playing
    pub fn active_sounds(&self) -> usize {
        let mut sinks = lock_sinks(&self.sinks);
        sinks.retain(|sink| !sink.empty());
        sinks.len()
    }

    /// Block until every triggered sample has finished playing
    pub fn wait_until_idle(&self) {
        let sinks: Vec<Sink> = lock_sinks(&self.sinks).drain(..).collect();
        for sink in sinks {
            sink.sleep_until_end();
        }
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for RodioOutput {
    type Session = RodioSession;

    fn open(&self) -> AlertResult<RodioSession> {
        let mut device = self.device.lock().unwrap_or_else(|e| e.into_inner());

        let handle = match device.as_ref() {
            Some(device) => device.handle.clone(),
            None => {
                let opened = spawn_device()?;
                info!("Audio output device opened");
                let handle = opened.handle.clone();
                *device = Some(opened);
                handle
            }
        };

        Ok(RodioSession::new(
            Some(handle),
            Arc::clone(&self.sinks),
            self.max_sample_bytes,
        ))
    }
}

/// Source adapter applying a separate gain to the left and right channel
///
/// Mono input gets the mean of both gains, as do channels past the second.
struct ChannelGain<I> {
    input: I,
    gains: [f32; 2],
    channel: u16,
}

impl<I> ChannelGain<I>
where
    I: Source,
    I::Item: Sample,
{
    fn new(input: I, left: u8, right: u8) -> Self {
        Self {
            input,
            gains: [gain_to_amplitude(left), gain_to_amplitude(right)],
            channel: 0,
        }
    }

    fn current_gain(&self) -> f32 {
        let [left, right] = self.gains;
        match (self.input.channels(), self.channel) {
            (channels, 0) if channels >= 2 => left,
            (channels, 1) if channels >= 2 => right,
            _ => (left + right) / 2.0,
        }
    }
}

impl<I> Iterator for ChannelGain<I>
where
    I: Source,
    I::Item: Sample,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let gain = self.current_gain();
        let channels = self.input.channels().max(1);
        let sample = self.input.next()?;
        self.channel = (self.channel + 1) % channels;
        Some(sample.amplify(gain))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}

impl<I> Source for ChannelGain<I>
where
    I: Source,
    I::Item: Sample,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.input.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.input.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.input.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }
}

/// Handle to a sample cached in a [`RodioSession`]
#[derive(Debug)]
pub struct RodioSample {
    id: u64,
}

struct CachedSample {
    data: Arc<[u8]>,
    owner: String,
    gains: (u8, u8),
}

/// A session on a [`RodioOutput`]
pub struct RodioSession {
    handle: Option<OutputStreamHandle>,
    sinks: Sinks,
    max_sample_bytes: u64,
    cache: HashMap<u64, CachedSample>,
    next_id: u64,
}

impl RodioSession {
    fn new(
        handle: Option<OutputStreamHandle>,
        sinks: Sinks,
        max_sample_bytes: u64,
    ) -> Self {
        Self {
            handle,
            sinks,
            max_sample_bytes,
            cache: HashMap::new(),
            next_id: 0,
        }
    }

    fn load(&self, sample_id: &str) -> AlertResult<Arc<[u8]>> {
        let path = Path::new(sample_id);
        let metadata =
            std::fs::metadata(path).map_err(|e| AlertError::registration(sample_id, e))?;

        if !metadata.is_file() {
            return Err(AlertError::registration(sample_id, "not a regular file"));
        }
        if metadata.len() > self.max_sample_bytes {
            return Err(AlertError::registration(
                sample_id,
                format!(
                    "sample is {} bytes, cache limit is {} bytes",
                    metadata.len(),
                    self.max_sample_bytes
                ),
            ));
        }

        let data: Arc<[u8]> = std::fs::read(path)
            .map_err(|e| AlertError::registration(sample_id, e))?
            .into();

        Decoder::new(Cursor::new(Arc::clone(&data)))
            .map_err(|e| AlertError::registration(sample_id, e))?;

        Ok(data)
    }
}

impl AudioSession for RodioSession {
    type Sample = RodioSample;

    fn cache_sample(&mut self, owner: &str, sample_id: &str) -> AlertResult<RodioSample> {
        let data = self.load(sample_id)?;

        let id = self.next_id;
        self.next_id += 1;

        debug!(sample = %sample_id, owner = %owner, bytes = data.len(), "Sample cached");
        self.cache.insert(
            id,
            CachedSample {
                data,
                owner: owner.to_string(),
                gains: (UNITY_GAIN, UNITY_GAIN),
            },
        );

        Ok(RodioSample { id })
    }

    fn set_gain(&mut self, sample: &RodioSample, left: u8, right: u8) {
        if let Some(entry) = self.cache.get_mut(&sample.id) {
            entry.gains = (left, right);
        }
    }

    fn play(&mut self, sample: &RodioSample) {
        let Some(entry) = self.cache.get(&sample.id) else {
            debug!(id = sample.id, "Play requested for unknown sample");
            return;
        };
        let Some(handle) = self.handle.as_ref() else {
            return;
        };

        let source = match Decoder::new(Cursor::new(Arc::clone(&entry.data))) {
            Ok(source) => source,
            Err(e) => {
                debug!(error = %e, "Failed to decode cached sample");
                return;
            }
        };

        let sink = match Sink::try_new(handle) {
            Ok(sink) => sink,
            Err(e) => {
                debug!(error = %e, "Failed to create audio sink");
                return;
            }
        };

        let (left, right) = entry.gains;
        if left == right {
            sink.set_volume(gain_to_amplitude(left));
            sink.append(source);
        } else {
            sink.append(ChannelGain::new(source, left, right));
        }

        trace!(owner = %entry.owner, left, right, "Sample triggered");

        let mut sinks = lock_sinks(&self.sinks);
        sinks.retain(|sink| !sink.empty());
        sinks.push(sink);
    }

    fn release_sample(&mut self, sample: RodioSample) {
        self.cache.remove(&sample.id);
    }

    fn close(self) {
        if !self.cache.is_empty() {
            debug!(
                samples = self.cache.len(),
                "Closing audio session with samples still cached"
            );
        }
    }
}
