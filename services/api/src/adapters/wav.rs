//! services/api/src/adapters/wav.rs
//!
//! Encodes decoded narration buffers as 16-bit PCM WAV files for the browser.

use hound::{SampleFormat, WavSpec, WavWriter};
use soul_whispers_core::pcm::SampleBuffer;

pub const WAV_CONTENT_TYPE: &str = "audio/wav";

/// Writes `buffer` as an interleaved 16-bit WAV at its own sample rate.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let spec = WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for sample in buffer.to_interleaved_i16() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}
