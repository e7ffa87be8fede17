//! Decoded audio clip
//!
//! Holds the whole clip as interleaved `f32` PCM. The clip is short
//! (a few seconds), so it is decoded up front and kept in memory for
//! the lifetime of the process.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while decoding fetched bytes
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode audio: {0}")]
    Symphonia(#[from] SymphoniaError),

    #[error("No audio track found")]
    NoTrack,

    #[error("Audio track has no channels")]
    NoChannels,

    #[error("Audio track decoded to zero frames")]
    Empty,

    #[error("Invalid sample rate: {0}")]
    InvalidRate(u32),
}

/// A fully decoded audio clip
#[derive(Clone, Debug)]
pub struct AudioClip {
    /// Interleaved samples in [-1, 1]
    samples: Vec<f32>,
    sample_rate: u32,
    channels: usize,
}

impl AudioClip {
    /// Build a clip from interleaved samples
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Result<Self, DecodeError> {
        if channels == 0 {
            return Err(DecodeError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(DecodeError::InvalidRate(sample_rate));
        }
        if samples.len() < channels {
            return Err(DecodeError::Empty);
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Decode an in-memory encoded file (MP3, WAV, OGG, FLAC)
    ///
    /// `extension` is only a probing hint; the container is detected
    /// from the bytes themselves.
    pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());

                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::warn!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let channels = channels.ok_or(DecodeError::NoChannels)?;
        let sample_rate = sample_rate.unwrap_or(44_100);

        log::debug!(
            "Decoded {} samples ({} ch @ {} Hz)",
            samples.len(),
            channels,
            sample_rate
        );

        Self::new(samples, sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Convert to another rate and channel layout
    ///
    /// Rate conversion is linear interpolation. Channel mapping:
    /// - mono source: copied to every output channel
    /// - mono output: average of all source channels
    /// - otherwise channel N maps to channel N, extra outputs are silent
    pub fn convert(&self, target_rate: u32, target_channels: usize) -> Vec<f32> {
        if target_channels == 0 || target_rate == 0 {
            return Vec::new();
        }

        let src_frames = self.frames();
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_frames = (src_frames as u64 * target_rate as u64).div_ceil(self.sample_rate as u64)
            as usize;

        let mut out = Vec::with_capacity(out_frames * target_channels);
        for i in 0..out_frames {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(src_frames - 1);
            let next = (idx + 1).min(src_frames - 1);
            let frac = (pos - idx as f64) as f32;

            for ch in 0..target_channels {
                let a = self.channel_value(idx, ch, target_channels);
                let b = self.channel_value(next, ch, target_channels);
                out.push(a + (b - a) * frac);
            }
        }
        out
    }

    fn channel_value(&self, frame: usize, out_ch: usize, out_channels: usize) -> f32 {
        let base = frame * self.channels;
        let src = &self.samples[base..base + self.channels];

        if self.channels == 1 {
            src[0]
        } else if out_channels == 1 {
            src.iter().sum::<f32>() / self.channels as f32
        } else if out_ch < self.channels {
            src[out_ch]
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                for ch in 0..channels {
                    let v = if ch == 0 { (i % 100) as i16 * 100 } else { -1000 };
                    writer.write_sample(v).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav() {
        let bytes = wav_bytes(2, 22_050, 4410);
        let clip = AudioClip::decode(bytes, Some("wav")).unwrap();

        assert_eq!(clip.sample_rate(), 22_050);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.frames(), 4410);
        assert!((clip.duration_secs() - 0.2).abs() < 0.001);

        // Right channel was constant -1000
        let right = clip.convert(22_050, 2)[1];
        assert!((right - (-1000.0 / 32768.0)).abs() < 0.001);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let bytes = vec![0x42; 512];
        assert!(AudioClip::decode(bytes, Some("mp3")).is_err());
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(AudioClip::new(vec![], 44_100, 2), Err(DecodeError::Empty)));
        assert!(matches!(AudioClip::new(vec![0.0], 44_100, 0), Err(DecodeError::NoChannels)));
    }

    #[test]
    fn test_convert_same_format_is_identity() {
        let clip = AudioClip::new(vec![0.1, 0.2, 0.3, 0.4], 48_000, 2).unwrap();
        assert_eq!(clip.convert(48_000, 2), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_convert_upsample_keeps_duration() {
        let clip = AudioClip::new(vec![0.0; 44_100], 44_100, 1).unwrap();
        let out = clip.convert(48_000, 1);
        assert_eq!(out.len(), 48_000);
    }

    #[test]
    fn test_convert_interpolates() {
        let clip = AudioClip::new(vec![0.0, 1.0], 1, 1).unwrap();
        let out = clip.convert(2, 1);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 0.001);
        assert!((out[2] - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_convert_channel_mapping() {
        let mono = AudioClip::new(vec![0.5, -0.5], 100, 1).unwrap();
        assert_eq!(mono.convert(100, 2), vec![0.5, 0.5, -0.5, -0.5]);

        let stereo = AudioClip::new(vec![0.2, 0.4], 100, 2).unwrap();
        let down = stereo.convert(100, 1);
        assert!((down[0] - 0.3).abs() < 0.001);

        // Surround device: extra channels stay silent
        assert_eq!(stereo.convert(100, 4), vec![0.2, 0.4, 0.0, 0.0]);
    }
}
