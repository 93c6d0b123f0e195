//! Command-line arguments.

use std::path::PathBuf;

use audiogen_core::{ModelId, ModelKind};
use clap::Parser;

/// Parse `--model` and reject music models
///
/// # Errors
///
/// Returns a message for unknown ids and non-speech models.
pub fn parse_speech_model(value: &str) -> Result<ModelId, String> {
    let model: ModelId = value.parse().map_err(|e| format!("{e}"))?;
    if model.info().kind == ModelKind::Speech {
        Ok(model)
    } else {
        let names: Vec<&str> = ModelId::speech_models().iter().map(|m| m.as_str()).collect();
        Err(format!(
            "'{model}' is not a speech model (expected one of: {})",
            names.join(", ")
        ))
    }
}

/// Check whether a speech model is cached under `HF_HOME`
#[derive(Parser, Debug)]
#[command(name = "tts-check-model", version, about = "Print 'installed' or 'missing' for a speech model")]
pub struct TtsCheckArgs {
    /// Speech model (kokoro, kitten, qwen3)
    #[arg(long, value_parser = parse_speech_model)]
    pub model: Option<ModelId>,
}

/// Download a speech model into `HF_HOME`
#[derive(Parser, Debug)]
#[command(name = "tts-download-model", version, about = "Download a speech model into HF_HOME")]
pub struct TtsDownloadArgs {
    /// Speech model (kokoro, kitten, qwen3)
    #[arg(long, value_parser = parse_speech_model)]
    pub model: Option<ModelId>,
}

/// Synthesize speech to a WAV file
#[derive(Parser, Debug)]
#[command(name = "tts-generate", version, about = "Synthesize speech to a WAV file")]
pub struct TtsGenerateArgs {
    /// Text to speak
    #[arg(long)]
    pub text: String,

    /// Output WAV file path
    #[arg(long)]
    pub output: PathBuf,

    /// Voice preset (defaults to the model's default voice)
    #[arg(long)]
    pub voice: Option<String>,

    /// Speed multiplier, 0.5 to 2.0
    #[arg(long)]
    pub speed: Option<f32>,

    /// Speech model (kokoro, kitten, qwen3)
    #[arg(long, value_parser = parse_speech_model)]
    pub model: Option<ModelId>,

    /// Sampling seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Sampling temperature
    #[arg(long, default_value_t = audiogen_core::speech::DEFAULT_TEMPERATURE)]
    pub temperature: f32,
}

/// Check whether the music checkpoints are present
#[derive(Parser, Debug)]
#[command(name = "music-check-model", version, about = "Print 'installed' or 'missing' for the music model")]
pub struct MusicCheckArgs {
    /// Path to checkpoints directory
    #[arg(long)]
    pub checkpoints_dir: PathBuf,
}

/// Download the music checkpoints
#[derive(Parser, Debug)]
#[command(name = "music-download-model", version, about = "Download the music model checkpoints")]
pub struct MusicDownloadArgs {
    /// Path to checkpoints directory
    #[arg(long)]
    pub checkpoints_dir: PathBuf,
}

/// Generate music to a WAV file
#[derive(Parser, Debug)]
#[command(name = "music-generate", version, about = "Generate music to a WAV file")]
pub struct MusicGenerateArgs {
    /// Music style caption
    #[arg(long)]
    pub genre: String,

    /// Duration in seconds, 10 to 600
    #[arg(long, default_value_t = audiogen_core::music::DEFAULT_DURATION_SECS)]
    pub duration: u32,

    /// Output WAV file path
    #[arg(long)]
    pub output: PathBuf,

    /// Project root containing `checkpoints/`
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Sampling seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl MusicGenerateArgs {
    /// Checkpoints directory under the project root
    #[must_use]
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.project_root.join("checkpoints")
    }
}
