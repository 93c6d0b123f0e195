// Model types and the static model catalog

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AudiogenError;

/// Supported model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// Kokoro-82M speech model (ONNX export)
    #[serde(rename = "kokoro")]
    Kokoro,
    /// KittenTTS nano speech model
    #[serde(rename = "kitten")]
    KittenTts,
    /// Qwen3-TTS custom voice model (MLX weights)
    #[serde(rename = "qwen3")]
    Qwen3Tts,
    /// ACE-Step 1.5 text-to-music model
    #[serde(rename = "acestep")]
    AceStep,
}

impl ModelId {
    /// Default speech model
    #[must_use]
    pub const fn default_speech() -> Self {
        Self::Kokoro
    }

    /// All speech models
    #[must_use]
    pub const fn speech_models() -> &'static [Self] {
        &[Self::Kokoro, Self::KittenTts, Self::Qwen3Tts]
    }

    /// Get model name as used on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kokoro => "kokoro",
            Self::KittenTts => "kitten",
            Self::Qwen3Tts => "qwen3",
            Self::AceStep => "acestep",
        }
    }

    /// Catalog entry for this model
    #[must_use]
    pub fn info(self) -> ModelInfo {
        match self {
            Self::Kokoro => ModelInfo::kokoro(),
            Self::KittenTts => ModelInfo::kitten(),
            Self::Qwen3Tts => ModelInfo::qwen3(),
            Self::AceStep => ModelInfo::acestep(),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = AudiogenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kokoro" => Ok(Self::Kokoro),
            "kitten" | "kittentts" => Ok(Self::KittenTts),
            "qwen3" | "qwen3-tts" => Ok(Self::Qwen3Tts),
            "acestep" | "ace-step" => Ok(Self::AceStep),
            other => Err(AudiogenError::invalid_input(format!(
                "Unknown model '{other}' (expected kokoro, kitten, qwen3 or acestep)"
            ))),
        }
    }
}

/// What a model produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Text-to-speech
    Speech,
    /// Text-to-music
    Music,
}

/// Where a model's files live on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayout {
    /// Hugging Face hub cache under `HF_HOME/hub`
    HubCache,
    /// Plain checkpoints directory; the named sub-directory must be populated
    Checkpoints {
        /// Sub-directory whose presence marks the model as installed
        marker_dir: &'static str,
    },
}

/// A set of files fetched from one Hugging Face repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Repository id (`org/name`)
    pub repo_id: String,
    /// Glob patterns selecting files; `None` fetches the whole snapshot
    pub include: Option<Vec<String>>,
}

impl Artifact {
    /// Whole-repository artifact
    #[must_use]
    pub fn repo(repo_id: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            include: None,
        }
    }

    /// Artifact restricted to files matching the given patterns
    #[must_use]
    pub fn filtered(repo_id: &str, include: &[&str]) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            include: Some(include.iter().map(|p| (*p).to_string()).collect()),
        }
    }

    /// Check whether a repository file belongs to this artifact
    #[must_use]
    pub fn matches(&self, rfilename: &str) -> bool {
        let Some(patterns) = &self.include else {
            return true;
        };
        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches_with(rfilename, options))
                .unwrap_or(false)
        })
    }
}

/// Model metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier
    pub id: ModelId,
    /// Human-readable model name
    pub name: String,
    /// Model description
    pub description: String,
    /// Speech or music
    pub kind: ModelKind,
    /// On-disk layout
    pub layout: CacheLayout,
    /// Output sample rate
    pub sample_rate: u32,
    /// Voice used when none is requested
    pub default_voice: Option<String>,
    /// Files required for the model to be usable
    pub artifacts: Vec<Artifact>,
}

impl ModelInfo {
    /// Kokoro-82M ONNX export with per-voice style files
    #[must_use]
    pub fn kokoro() -> Self {
        Self {
            id: ModelId::Kokoro,
            name: "Kokoro TTS".to_string(),
            description: "82M parameter neural TTS, ONNX export".to_string(),
            kind: ModelKind::Speech,
            layout: CacheLayout::HubCache,
            sample_rate: crate::SPEECH_SAMPLE_RATE,
            default_voice: Some("af_nova".to_string()),
            artifacts: vec![Artifact::filtered(
                "onnx-community/Kokoro-82M-v1.0-ONNX",
                &[
                    "config.json",
                    "tokenizer.json",
                    "onnx/model_quantized.onnx",
                    "voices/*.bin",
                ],
            )],
        }
    }

    /// KittenTTS nano
    #[must_use]
    pub fn kitten() -> Self {
        Self {
            id: ModelId::KittenTts,
            name: "KittenTTS".to_string(),
            description: "Ultra-lightweight ONNX TTS".to_string(),
            kind: ModelKind::Speech,
            layout: CacheLayout::HubCache,
            sample_rate: crate::SPEECH_SAMPLE_RATE,
            default_voice: Some("Jasper".to_string()),
            artifacts: vec![Artifact::repo("KittenML/kitten-tts-nano-0.8-fp32")],
        }
    }

    /// Qwen3-TTS custom voice, MLX weights
    #[must_use]
    pub fn qwen3() -> Self {
        Self {
            id: ModelId::Qwen3Tts,
            name: "Qwen3-TTS".to_string(),
            description: "Qwen3-TTS 12Hz 0.6B custom voice, MLX bf16".to_string(),
            kind: ModelKind::Speech,
            layout: CacheLayout::HubCache,
            sample_rate: crate::SPEECH_SAMPLE_RATE,
            default_voice: Some("Ryan".to_string()),
            artifacts: vec![Artifact::repo(
                "mlx-community/Qwen3-TTS-12Hz-0.6B-CustomVoice-bf16",
            )],
        }
    }

    /// ACE-Step 1.5: turbo DiT, VAE, text encoder and 5Hz language model
    #[must_use]
    pub fn acestep() -> Self {
        Self {
            id: ModelId::AceStep,
            name: "ACE-Step 1.5".to_string(),
            description: "Text-to-music diffusion transformer (turbo)".to_string(),
            kind: ModelKind::Music,
            layout: CacheLayout::Checkpoints {
                marker_dir: "acestep-v15-turbo",
            },
            sample_rate: crate::MUSIC_SAMPLE_RATE,
            default_voice: None,
            artifacts: vec![Artifact::filtered(
                "ACE-Step/Ace-Step1.5",
                &[
                    "acestep-v15-turbo/*",
                    "vae/*",
                    "Qwen3-Embedding-0.6B/*",
                    "acestep-5Hz-lm-1.7B/*",
                ],
            )],
        }
    }

    /// Command that installs this model
    #[must_use]
    pub fn download_hint(&self) -> String {
        match self.kind {
            ModelKind::Speech => format!("tts-download-model --model {}", self.id),
            ModelKind::Music => "music-download-model --checkpoints-dir <dir>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("kokoro", ModelId::Kokoro)]
    #[case("Kitten", ModelId::KittenTts)]
    #[case("kittentts", ModelId::KittenTts)]
    #[case("qwen3", ModelId::Qwen3Tts)]
    #[case("ace-step", ModelId::AceStep)]
    fn test_parse_model_id(#[case] input: &str, #[case] expected: ModelId) {
        assert_eq!(input.parse::<ModelId>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_model_id() {
        let err = "dia".parse::<ModelId>().unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_display_round_trips_cli_name() {
        for id in [ModelId::Kokoro, ModelId::KittenTts, ModelId::Qwen3Tts, ModelId::AceStep] {
            assert_eq!(id.to_string().parse::<ModelId>().unwrap(), id);
        }
    }

    #[test]
    fn test_artifact_filters() {
        let info = ModelInfo::kokoro();
        let artifact = &info.artifacts[0];
        assert!(artifact.matches("voices/af_nova.bin"));
        assert!(artifact.matches("onnx/model_quantized.onnx"));
        assert!(artifact.matches("tokenizer.json"));
        assert!(!artifact.matches("onnx/model_fp16.onnx"));
        assert!(!artifact.matches("README.md"));

        let whole = Artifact::repo("KittenML/kitten-tts-nano-0.8-fp32");
        assert!(whole.matches("anything.bin"));
    }

    #[test]
    fn test_music_model_layout() {
        let info = ModelId::AceStep.info();
        assert_eq!(info.kind, ModelKind::Music);
        assert_eq!(info.sample_rate, 44_100);
        assert_eq!(
            info.layout,
            CacheLayout::Checkpoints {
                marker_dir: "acestep-v15-turbo"
            }
        );
        assert!(info.artifacts[0].matches("acestep-v15-turbo/model.safetensors"));
        assert!(info.artifacts[0].matches("vae/diffusion_pytorch_model.safetensors"));
    }

    #[test]
    fn test_speech_models_use_hub_cache() {
        for id in ModelId::speech_models() {
            let info = id.info();
            assert_eq!(info.kind, ModelKind::Speech);
            assert_eq!(info.layout, CacheLayout::HubCache);
            assert_eq!(info.sample_rate, 24_000);
            assert!(info.default_voice.is_some());
        }
    }
}
