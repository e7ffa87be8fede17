//! Audio engine - handles cpal audio output
//!
//! Owns the output stream and the playing-state. The clip is converted
//! once to the device's rate and channel layout when it loads, then the
//! audio thread walks it frame by frame and clears the playing flag at
//! the end. A stream error also clears it and forces a reopen.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::clip::AudioClip;
use super::traits::Playback;

/// Errors from opening or driving the output device
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No output device found")]
    NoDevice,

    #[error("Failed to get output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("Clip is already playing")]
    AlreadyPlaying,
}

/// Audio engine configuration
pub struct AudioConfig {
    /// Output gain (0.0 to 1.0)
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

/// Write one device buffer from the prepared clip
///
/// `pcm` is already in the device layout (`channels` interleaved).
/// Writes silence when idle or past the end, and clears `is_playing`
/// once the last frame has been written.
fn write_audio_samples<T: Sample + FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    pcm: &[f32],
    is_playing: &AtomicBool,
    cursor: &AtomicUsize,
    gain: f32,
) {
    if !is_playing.load(Ordering::Acquire) {
        for sample in data.iter_mut() {
            *sample = T::EQUILIBRIUM;
        }
        return;
    }

    let total_frames = pcm.len() / channels;
    let mut frame_idx = cursor.load(Ordering::Relaxed);

    for frame in data.chunks_mut(channels) {
        if frame_idx >= total_frames {
            for sample in frame.iter_mut() {
                *sample = T::EQUILIBRIUM;
            }
            continue;
        }

        let src = &pcm[frame_idx * channels..(frame_idx + 1) * channels];
        for (out, &s) in frame.iter_mut().zip(src) {
            *out = T::from_sample(s * gain);
        }
        frame_idx += 1;
    }

    cursor.store(frame_idx.min(total_frames), Ordering::Relaxed);

    if frame_idx >= total_frames {
        is_playing.store(false, Ordering::Release);
    }
}

/// Stream error callback: mark the stream dead and drop back to idle
///
/// A failed stream no longer runs its data callback, so nothing else
/// would ever clear `is_playing`.
fn handle_stream_error(err: &cpal::StreamError, is_playing: &AtomicBool, failed: &AtomicBool) {
    log::error!("Audio stream error: {}", err);
    failed.store(true, Ordering::Release);
    is_playing.store(false, Ordering::Release);
}

/// Whether a stream prepared for `prepared` can play `clip` right now
fn stream_ready(prepared: Option<&Arc<AudioClip>>, clip: &Arc<AudioClip>, failed: &AtomicBool) -> bool {
    !failed.load(Ordering::Acquire) && prepared.is_some_and(|p| Arc::ptr_eq(p, clip))
}

/// Output stream plus the clip it was built for
struct ActiveStream {
    /// Kept alive to keep the callback running
    _stream: cpal::Stream,
    clip: Arc<AudioClip>,
}

/// High-level audio output engine
///
/// The stream is opened in `prepare()` as soon as the clip is loaded and
/// then kept running; between plays the callback just writes silence.
/// A press only rewinds the cursor and raises the playing flag.
pub struct AudioEngine {
    is_playing: Arc<AtomicBool>,
    cursor: Arc<AtomicUsize>,
    /// Set by the stream error callback; forces a reopen on the next play
    stream_failed: Arc<AtomicBool>,
    stream: Option<ActiveStream>,
    pub config: AudioConfig,
}

impl AudioEngine {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            is_playing: Arc::new(AtomicBool::new(false)),
            cursor: Arc::new(AtomicUsize::new(0)),
            stream_failed: Arc::new(AtomicBool::new(false)),
            stream: None,
            config,
        }
    }

    fn is_ready(&self, clip: &Arc<AudioClip>) -> bool {
        stream_ready(self.stream.as_ref().map(|s| &s.clip), clip, &self.stream_failed)
    }

    /// Open the default output device and build a stream for `clip`
    fn open_stream(&self, clip: &Arc<AudioClip>) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using output device: {}", device_name);

        let supported = device.default_output_config()?;
        log::info!("Audio config: {:?}", supported);

        let sample_format = supported.sample_format();
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;

        let pcm: Arc<[f32]> = clip.convert(sample_rate, channels).into();
        log::debug!(
            "Prepared {} frames for {} ch @ {} Hz",
            pcm.len() / channels.max(1),
            channels,
            sample_rate
        );

        let config: cpal::StreamConfig = supported.into();
        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config, channels, pcm)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config, channels, pcm)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config, channels, pcm)?,
            format => return Err(AudioError::UnsupportedFormat(format)),
        };

        stream.play()?;
        Ok(stream)
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        channels: usize,
        pcm: Arc<[f32]>,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: cpal::SizedSample + FromSample<f32>,
    {
        let is_playing = Arc::clone(&self.is_playing);
        let cursor = Arc::clone(&self.cursor);
        let gain = self.config.volume.clamp(0.0, 1.0);

        let err_playing = Arc::clone(&self.is_playing);
        let err_failed = Arc::clone(&self.stream_failed);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                write_audio_samples(data, channels, &pcm, &is_playing, &cursor, gain);
            },
            move |err| handle_stream_error(&err, &err_playing, &err_failed),
            None,
        )?;
        Ok(stream)
    }
}

impl Playback for AudioEngine {
    fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Acquire)
    }

    fn prepare(&mut self, clip: &Arc<AudioClip>) -> Result<(), AudioError> {
        // Drop the old stream first so only one callback is live
        self.stream = None;
        self.is_playing.store(false, Ordering::Release);
        self.stream_failed.store(false, Ordering::Release);

        log::info!("Starting audio engine...");
        let stream = self.open_stream(clip)?;
        self.stream = Some(ActiveStream {
            _stream: stream,
            clip: Arc::clone(clip),
        });
        Ok(())
    }

    fn play(&mut self, clip: &Arc<AudioClip>) -> Result<(), AudioError> {
        if self.is_playing() {
            return Err(AudioError::AlreadyPlaying);
        }

        // Only after a failed prepare or a dead device
        if !self.is_ready(clip) {
            log::warn!("Output stream not ready, reopening");
            self.prepare(clip)?;
        }

        self.cursor.store(0, Ordering::Relaxed);
        self.is_playing.store(true, Ordering::Release);
        log::info!("Playing clip ({:.2}s)", clip.duration_secs());
        Ok(())
    }
}
