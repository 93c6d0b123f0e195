//! Text-to-speech.
//!
//! [`load_speech_model`] turns a [`ModelId`] into a ready [`SpeechModel`]
//! after checking that its files are in the cache.

pub mod kitten;
pub mod kokoro;
pub mod onnx;
pub mod phonemize;
pub mod text;
pub mod tokens;
pub mod voices;

use std::path::Path;

use crate::config::AudiogenConfig;
use crate::error::{AudiogenError, AudiogenResult};
use crate::model::{ModelId, ModelKind, ModelManager};
use crate::ort_runtime;

pub use kitten::KittenSpeech;
pub use kokoro::KokoroSpeech;
pub use phonemize::{EspeakPhonemizer, FallbackPhonemizer, MisakiPhonemizer, Phonemizer};

/// Default speed multiplier
pub const DEFAULT_SPEED: f32 = 1.0;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Accepted speed range
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;
/// Upper bound of the temperature range (the lower bound is exclusive 0)
pub const MAX_TEMPERATURE: f32 = 2.0;

/// One speech generation request
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,
    /// Voice name or alias
    pub voice: String,
    /// Speed multiplier
    pub speed: f32,
    /// Sampling seed, for backends that sample
    pub seed: Option<u64>,
    /// Sampling temperature, for backends that sample
    pub temperature: f32,
}

impl SpeechRequest {
    /// Request with default speed and temperature
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            speed: DEFAULT_SPEED,
            seed: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Set the speed
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the seed
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Check text, speed and temperature.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error describing the first bad field.
    pub fn validate(&self) -> AudiogenResult<()> {
        if self.text.trim().is_empty() {
            return Err(AudiogenError::invalid_input("Text cannot be empty"));
        }
        let length = self.text.chars().count();
        if length > text::MAX_TEXT_LENGTH {
            return Err(AudiogenError::invalid_input(format!(
                "Text too long: {length} characters (max {})",
                text::MAX_TEXT_LENGTH
            )));
        }
        if self.voice.trim().is_empty() {
            return Err(AudiogenError::invalid_input("Voice cannot be empty"));
        }
        if !SPEED_RANGE.contains(&self.speed) {
            return Err(AudiogenError::invalid_input(format!(
                "Speed must be between {} and {}, got {}",
                SPEED_RANGE.start(),
                SPEED_RANGE.end(),
                self.speed
            )));
        }
        if !(self.temperature > 0.0 && self.temperature <= MAX_TEMPERATURE) {
            return Err(AudiogenError::invalid_input(format!(
                "Temperature must be in (0, {MAX_TEMPERATURE}], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// A loaded speech backend
#[cfg_attr(test, mockall::automock)]
pub trait SpeechModel {
    /// Backend identifier
    fn model_id(&self) -> ModelId;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Voices this backend accepts
    fn voices(&self) -> Vec<String>;

    /// Synthesize mono audio, one buffer per chunk.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown voices, phonemizer failures or inference
    /// failures.
    fn generate(&mut self, request: &SpeechRequest) -> AudiogenResult<Vec<Vec<f32>>>;
}

/// Check the cache and load a speech backend.
///
/// # Errors
///
/// Returns [`AudiogenError::ModelNotInstalled`] if the model's files are not
/// cached, [`AudiogenError::Unsupported`] for backends without an in-process
/// runtime, or a model error if loading fails.
pub fn load_speech_model(
    model: ModelId,
    hf_home: &Path,
    config: &AudiogenConfig,
) -> AudiogenResult<Box<dyn SpeechModel>> {
    let manager = ModelManager::new(model, hf_home);
    if manager.info().kind != ModelKind::Speech {
        return Err(AudiogenError::invalid_input(format!(
            "'{model}' is not a speech model"
        )));
    }
    manager.ensure_installed()?;

    let snapshot = || {
        let repo = &manager.info().artifacts[0].repo_id;
        manager
            .hub_cache()
            .snapshot_dir(repo)
            .ok_or_else(|| AudiogenError::not_installed(model.as_str(), manager.info().download_hint()))
    };
    let espeak = || Box::new(EspeakPhonemizer::new(&config.espeak)) as Box<dyn Phonemizer>;

    match model {
        ModelId::Kokoro => {
            ort_runtime::init(config, hf_home)?;
            let phonemizer = FallbackPhonemizer::new(
                Box::new(MisakiPhonemizer::new(&config.espeak.language)),
                espeak(),
            );
            Ok(Box::new(KokoroSpeech::load(&snapshot()?, Box::new(phonemizer))?))
        }
        ModelId::KittenTts => {
            ort_runtime::init(config, hf_home)?;
            Ok(Box::new(KittenSpeech::load(&snapshot()?, espeak())?))
        }
        ModelId::Qwen3Tts => Err(AudiogenError::unsupported(
            "Qwen3-TTS requires the MLX runtime, which is not available to this build",
        )),
        ModelId::AceStep => Err(AudiogenError::invalid_input(format!(
            "'{model}' is not a speech model"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use rstest::rstest;

    #[test]
    fn test_request_defaults() {
        let request = SpeechRequest::new("Hello", "af_nova");
        assert_eq!(request.speed, 1.0);
        assert_eq!(request.temperature, 0.7);
        assert!(request.seed.is_none());
        assert!(request.validate().is_ok());
    }

    #[rstest]
    #[case::empty_text("", "af_nova", 1.0, 0.7)]
    #[case::blank_text("   ", "af_nova", 1.0, 0.7)]
    #[case::blank_voice("Hi", " ", 1.0, 0.7)]
    #[case::too_slow("Hi", "af_nova", 0.4, 0.7)]
    #[case::too_fast("Hi", "af_nova", 2.1, 0.7)]
    #[case::nan_speed("Hi", "af_nova", f32::NAN, 0.7)]
    #[case::zero_temperature("Hi", "af_nova", 1.0, 0.0)]
    #[case::hot_temperature("Hi", "af_nova", 1.0, 2.5)]
    fn test_invalid_requests(
        #[case] text: &str,
        #[case] voice: &str,
        #[case] speed: f32,
        #[case] temperature: f32,
    ) {
        let err = SpeechRequest::new(text, voice)
            .with_speed(speed)
            .with_temperature(temperature)
            .validate()
            .unwrap_err();
        assert!(err.is_user_error(), "{err}");
    }

    #[rstest]
    #[case(0.5)]
    #[case(2.0)]
    fn test_speed_bounds_are_inclusive(#[case] speed: f32) {
        assert!(SpeechRequest::new("Hi", "af_nova")
            .with_speed(speed)
            .with_temperature(2.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_text_length_limit() {
        let text = "a".repeat(text::MAX_TEXT_LENGTH + 1);
        let err = SpeechRequest::new(text, "af_nova").validate().unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_load_missing_model() {
        let temp = TempDir::new().unwrap();
        let err = load_speech_model(ModelId::Kokoro, temp.path(), &AudiogenConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, AudiogenError::ModelNotInstalled { .. }));
        assert!(err.to_string().contains("tts-download-model --model kokoro"));
    }

    #[test]
    fn test_load_installed_qwen3_is_unsupported() {
        let temp = TempDir::new().unwrap();
        temp.child("hub/models--mlx-community--Qwen3-TTS-12Hz-0.6B-CustomVoice-bf16/snapshots/abc/config.json")
            .write_str("{}")
            .unwrap();
        let err = load_speech_model(ModelId::Qwen3Tts, temp.path(), &AudiogenConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.category(), "unsupported");
    }

    #[test]
    fn test_music_model_is_rejected() {
        let temp = TempDir::new().unwrap();
        let err = load_speech_model(ModelId::AceStep, temp.path(), &AudiogenConfig::default())
            .err()
            .unwrap();
        assert!(err.is_user_error());
    }
}
