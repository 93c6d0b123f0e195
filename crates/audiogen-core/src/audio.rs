//! In-memory audio produced by a backend.

use crate::error::{AudiogenError, AudiogenResult};

/// Peak level applied by [`AudioBuffer::normalize`] callers by default
pub const DEFAULT_PEAK: f32 = 0.95;

/// Interleaved f32 samples plus format
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl AudioBuffer {
    /// Mono buffer
    #[must_use]
    pub const fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Concatenate mono chunks into one buffer
    #[must_use]
    pub fn concat_mono(chunks: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let total = chunks.iter().map(Vec::len).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in chunks {
            samples.extend(chunk);
        }
        Self::mono(samples, sample_rate)
    }

    /// Build an interleaved buffer from planar `[channel][sample]` data.
    ///
    /// # Errors
    ///
    /// Returns an audio error if there are no channels, more than
    /// `u16::MAX` channels, or the channels differ in length.
    pub fn from_planar(planar: &[Vec<f32>], sample_rate: u32) -> AudiogenResult<Self> {
        let channels = u16::try_from(planar.len())
            .map_err(|_| AudiogenError::audio_processing("too many channels"))?;
        let Some(first) = planar.first() else {
            return Err(AudiogenError::audio_processing("audio has no channels"));
        };
        let frames = first.len();
        if planar.iter().any(|c| c.len() != frames) {
            return Err(AudiogenError::audio_processing(
                "channels have different lengths",
            ));
        }

        let mut samples = Vec::with_capacity(frames * planar.len());
        for frame in 0..frames {
            for channel in planar {
                samples.push(channel[frame]);
            }
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Check whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    /// Duration in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Boost quiet audio so its absolute peak reaches `peak`. Silent buffers
    /// and buffers already at or above `peak` are untouched.
    pub fn normalize(&mut self, peak: f32) {
        let max = self.samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        if max > 0.0 && max < peak {
            let gain = peak / max;
            for sample in &mut self.samples {
                *sample *= gain;
            }
        }
    }

    /// Drop the last `frames` frames; clears the buffer if it is shorter
    pub fn trim_tail(&mut self, frames: usize) {
        let drop = frames * usize::from(self.channels);
        let keep = self.samples.len().saturating_sub(drop);
        self.samples.truncate(keep);
    }
}
