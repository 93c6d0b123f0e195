//! Request → model → WAV file.

use std::path::{Path, PathBuf};

use crate::audio::AudioBuffer;
use crate::error::{AudiogenError, AudiogenResult};
use crate::music::{MusicModel, MusicRequest};
use crate::speech::{SpeechModel, SpeechRequest};
use crate::wav_writer::write_wav;

/// What was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenAudio {
    /// Output file
    pub path: PathBuf,
    /// Frames written
    pub frames: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
}

impl WrittenAudio {
    fn from_buffer(path: &Path, buffer: &AudioBuffer) -> Self {
        Self {
            path: path.to_path_buf(),
            frames: buffer.frames(),
            sample_rate: buffer.sample_rate,
            channels: buffer.channels,
        }
    }
}

/// Validate, synthesize and write a mono WAV at the model's sample rate.
///
/// # Errors
///
/// Returns the validation or model error, [`AudiogenError::EmptyOutput`] if
/// no samples were produced, or a file error.
pub fn synthesize_to_wav(
    model: &mut dyn SpeechModel,
    request: &SpeechRequest,
    output: &Path,
) -> AudiogenResult<WrittenAudio> {
    request.validate()?;
    tracing::debug!(
        "Generating speech with {} (seed {:?}, temperature {})",
        model.model_id(),
        request.seed,
        request.temperature
    );

    let chunks = model.generate(request)?;
    if chunks.iter().all(Vec::is_empty) {
        return Err(AudiogenError::EmptyOutput);
    }

    let buffer = AudioBuffer::concat_mono(chunks, model.sample_rate());
    write_wav(output, &buffer)?;
    tracing::info!(
        "Wrote {:.2}s of speech to {}",
        buffer.duration_secs(),
        output.display()
    );
    Ok(WrittenAudio::from_buffer(output, &buffer))
}

/// Validate, generate and write the first track as an interleaved WAV.
///
/// # Errors
///
/// Returns the validation or model error, [`AudiogenError::EmptyOutput`] if
/// no track or no samples were produced, or an audio/file error.
pub fn compose_to_wav(
    model: &mut dyn MusicModel,
    request: &MusicRequest,
    output: &Path,
) -> AudiogenResult<WrittenAudio> {
    request.validate()?;
    let tracks = model.generate(request)?;
    let Some(track) = tracks.into_iter().next() else {
        return Err(AudiogenError::EmptyOutput);
    };
    if track.channels.iter().all(Vec::is_empty) {
        return Err(AudiogenError::EmptyOutput);
    }

    let sample_rate = track.sample_rate.unwrap_or(crate::MUSIC_SAMPLE_RATE);
    let buffer = AudioBuffer::from_planar(&track.channels, sample_rate)?;
    write_wav(output, &buffer)?;
    tracing::info!(
        "Wrote {:.2}s of music ({} ch) to {}",
        buffer.duration_secs(),
        buffer.channels,
        output.display()
    );
    Ok(WrittenAudio::from_buffer(output, &buffer))
}
