//! WAV file writer.
//!
//! Every tool writes 16-bit PCM at the buffer's sample rate and channel count.

use std::path::Path;

use crate::audio::AudioBuffer;
use crate::error::{AudiogenError, AudiogenResult};

/// Bit depth of written files
pub const BITS_PER_SAMPLE: u16 = 16;

/// WAV format for a buffer
#[must_use]
pub const fn spec_for(buffer: &AudioBuffer) -> hound::WavSpec {
    hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Convert a float sample to 16-bit PCM, clamping to [-1.0, 1.0]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (clamped * f32::from(i16::MAX)) as i16
}

/// Write a buffer as a 16-bit PCM WAV file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the buffer is empty or malformed, or the file cannot
/// be written.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> AudiogenResult<()> {
    if buffer.is_empty() {
        return Err(AudiogenError::EmptyOutput);
    }
    if buffer.channels == 0 || buffer.sample_rate == 0 {
        return Err(AudiogenError::audio_processing(format!(
            "invalid format: {} channels at {} Hz",
            buffer.channels, buffer.sample_rate
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = hound::WavWriter::create(path, spec_for(buffer)).map_err(|e| {
        AudiogenError::file(format!("Failed to create WAV file {}: {e}", path.display()))
    })?;
    for &sample in &buffer.samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;

    tracing::debug!(
        "Wrote {} frames ({} ch, {} Hz) to {}",
        buffer.frames(),
        buffer.channels,
        buffer.sample_rate,
        path.display()
    );
    Ok(())
}
