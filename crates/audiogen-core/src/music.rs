//! Text-to-music.

use std::path::Path;

use crate::error::{AudiogenError, AudiogenResult};
use crate::model::{ModelId, ModelManager};

/// Default track length in seconds
pub const DEFAULT_DURATION_SECS: u32 = 60;
/// Accepted track lengths in seconds
pub const DURATION_RANGE: std::ops::RangeInclusive<u32> = 10..=600;
/// Lyrics used when none are given
pub const INSTRUMENTAL: &str = "[Instrumental]";
/// Diffusion steps for the turbo model
pub const DEFAULT_INFERENCE_STEPS: u32 = 8;
/// Classifier-free guidance scale
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.0;

/// One music generation request
#[derive(Debug, Clone, PartialEq)]
pub struct MusicRequest {
    /// Style description, e.g. a genre
    pub caption: String,
    /// Track length in seconds
    pub duration_secs: u32,
    /// Lyrics, or [`INSTRUMENTAL`]
    pub lyrics: String,
    /// Diffusion steps
    pub inference_steps: u32,
    /// Guidance scale
    pub guidance_scale: f32,
    /// Sampling seed
    pub seed: Option<u64>,
}

impl MusicRequest {
    /// Instrumental request with default length and sampler settings
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            duration_secs: DEFAULT_DURATION_SECS,
            lyrics: INSTRUMENTAL.to_string(),
            inference_steps: DEFAULT_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: None,
        }
    }

    /// Set the duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Set the seed
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Check caption, duration and sampler settings.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error describing the first bad field.
    pub fn validate(&self) -> AudiogenResult<()> {
        if self.caption.trim().is_empty() {
            return Err(AudiogenError::invalid_input("Genre cannot be empty"));
        }
        if !DURATION_RANGE.contains(&self.duration_secs) {
            return Err(AudiogenError::invalid_input(format!(
                "Duration must be between {} and {} seconds, got {}",
                DURATION_RANGE.start(),
                DURATION_RANGE.end(),
                self.duration_secs
            )));
        }
        if self.inference_steps == 0 {
            return Err(AudiogenError::invalid_input("Inference steps must be positive"));
        }
        if !(self.guidance_scale.is_finite() && self.guidance_scale > 0.0) {
            return Err(AudiogenError::invalid_input(format!(
                "Guidance scale must be positive, got {}",
                self.guidance_scale
            )));
        }
        Ok(())
    }
}

/// Planar audio produced by a music backend
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTrack {
    /// `[channel][sample]`
    pub channels: Vec<Vec<f32>>,
    /// Sample rate, if the backend reports one
    pub sample_rate: Option<u32>,
}

/// A loaded music backend
#[cfg_attr(test, mockall::automock)]
pub trait MusicModel {
    /// Generate one or more tracks.
    ///
    /// # Errors
    ///
    /// Returns a synthesis error if generation fails.
    fn generate(&mut self, request: &MusicRequest) -> AudiogenResult<Vec<GeneratedTrack>>;
}

/// Check the checkpoints directory and load the music backend.
///
/// # Errors
///
/// Returns [`AudiogenError::ModelNotInstalled`] if the checkpoints are
/// missing, otherwise [`AudiogenError::Unsupported`]: the diffusion pipeline
/// has no in-process runtime.
pub fn load_music_model(checkpoints: &Path) -> AudiogenResult<Box<dyn MusicModel>> {
    let manager = ModelManager::new(ModelId::AceStep, checkpoints);
    manager.ensure_installed()?;
    tracing::info!("ACE-Step checkpoints found in {}", checkpoints.display());
    Err(AudiogenError::unsupported(
        "ACE-Step 1.5 requires the PyTorch diffusion runtime, which is not available to this build",
    ))
}
