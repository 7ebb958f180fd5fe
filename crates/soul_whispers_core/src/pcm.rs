//! crates/soul_whispers_core/src/pcm.rs
//!
//! Decoding of narration payloads: base64 text to raw bytes, then signed 16-bit
//! little-endian PCM to normalized floating-point frames.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Sample rate of the speech service's output.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;
pub const NARRATION_CHANNELS: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PcmError {
    #[error("Audio payload is not valid base64: {0}")]
    Base64(String),
    #[error("Audio data is empty")]
    Empty,
    #[error("Audio data has an odd number of bytes ({0})")]
    OddLength(usize),
    #[error("Channel count must be at least 1")]
    NoChannels,
}

/// Planar, normalized samples ready for an output sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Builds a buffer from per-channel samples. Channels are truncated to the
    /// shortest one so every channel has the same frame count.
    pub fn from_planar(sample_rate: u32, mut channels: Vec<Vec<f32>>) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Converts back to interleaved 16-bit samples for encoders that need them.
    pub fn to_interleaved_i16(&self) -> Vec<i16> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                let scaled = (channel[i] * 32768.0).round().clamp(-32768.0, 32767.0);
                out.push(scaled as i16);
            }
        }
        out
    }
}

pub fn decode_base64(payload: &str) -> Result<Vec<u8>, PcmError> {
    STANDARD
        .decode(payload.trim())
        .map_err(|e| PcmError::Base64(e.to_string()))
}

/// Interprets `bytes` as interleaved signed 16-bit little-endian samples.
///
/// Each sample is divided by 32768. A trailing partial frame is dropped.
pub fn decode_pcm16(bytes: &[u8], channels: u16, sample_rate: u32) -> Result<SampleBuffer, PcmError> {
    if channels == 0 {
        return Err(PcmError::NoChannels);
    }
    if bytes.is_empty() {
        return Err(PcmError::Empty);
    }
    if bytes.len() % 2 != 0 {
        return Err(PcmError::OddLength(bytes.len()));
    }

    let channel_count = usize::from(channels);
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let frame_count = samples.len() / channel_count;
    if frame_count == 0 {
        return Err(PcmError::Empty);
    }

    let mut planar = vec![Vec::with_capacity(frame_count); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, sample) in planar.iter_mut().zip(frame) {
            channel.push(f32::from(*sample) / 32768.0);
        }
    }

    Ok(SampleBuffer {
        sample_rate,
        channels: planar,
    })
}

/// Decodes a speech-service payload using the fixed narration format.
pub fn decode_narration(payload: &str) -> Result<SampleBuffer, PcmError> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, NARRATION_CHANNELS, NARRATION_SAMPLE_RATE)
}
