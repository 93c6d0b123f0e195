//! Speech commands.

use std::path::Path;
use std::process::ExitCode;

use audiogen_core::config::{hf_home, hub_dir, require_hf_home};
use audiogen_core::model::HfHubClient;
use audiogen_core::speech::DEFAULT_SPEED;
use audiogen_core::{
    load_speech_model, ort_runtime, synthesize_to_wav, AudiogenConfig, AudiogenError,
    AudiogenResult, DownloadReport, ModelId, ModelManager, ModelStatus, SpeechRequest,
};

use super::{config_or_default, report, runtime};
use crate::args::{TtsCheckArgs, TtsDownloadArgs, TtsGenerateArgs};

fn resolve_model(requested: Option<ModelId>, config: &AudiogenConfig) -> ModelId {
    requested
        .or(config.speech.model)
        .unwrap_or_else(ModelId::default_speech)
}

/// Presence of `model` under a cache root. No root means missing.
#[must_use]
pub fn speech_status(model: ModelId, hf_home: Option<&Path>) -> ModelStatus {
    hf_home.map_or(ModelStatus::Missing, |root| {
        ModelManager::new(model, root).status()
    })
}

/// `tts-check-model`: print `installed` or `missing`. Always exits 0.
#[must_use]
pub fn check(args: &TtsCheckArgs) -> ExitCode {
    let config = config_or_default();
    let model = resolve_model(args.model, &config);
    let home = hf_home();
    println!("{}", speech_status(model, home.as_deref()));
    ExitCode::SUCCESS
}

/// `tts-download-model`
#[must_use]
pub fn download(args: &TtsDownloadArgs) -> ExitCode {
    report(run_download(args))
}

fn run_download(args: &TtsDownloadArgs) -> AudiogenResult<DownloadReport> {
    let config = AudiogenConfig::load()?;
    let hf_home = require_hf_home()?;
    let model = resolve_model(args.model, &config);
    runtime()?.block_on(download_speech_model(model, &hf_home, &config))
}

/// Download a speech model into `<hf_home>/hub`, plus the ONNX Runtime
/// library for the ONNX backends.
///
/// # Errors
///
/// Returns the first directory, download or extraction error.
pub async fn download_speech_model(
    model: ModelId,
    hf_home: &Path,
    config: &AudiogenConfig,
) -> AudiogenResult<DownloadReport> {
    let hub = hub_dir(hf_home);
    std::fs::create_dir_all(&hub).map_err(|e| {
        AudiogenError::file(format!("cannot create {}: {e}", hub.display()))
    })?;

    let manager = ModelManager::new(model, hf_home);
    println!(
        "Downloading {} model (this may take several minutes)...",
        manager.info().name
    );
    let client = HfHubClient::new(hub, config.hf_token.clone())?;
    let report = manager.download(&client).await?;

    if matches!(model, ModelId::Kokoro | ModelId::KittenTts) {
        ort_runtime::ensure_runtime(config, hf_home).await?;
    }

    println!("Download complete");
    Ok(report)
}

/// `tts-generate`
#[must_use]
pub fn generate(args: TtsGenerateArgs) -> ExitCode {
    report(run_generate(args))
}

/// Build the request from flags, config defaults and the model's default
/// voice. The configured voice belongs to the configured model and is only
/// used when that model is the one selected.
#[must_use]
pub fn build_request(args: &TtsGenerateArgs, model: ModelId, config: &AudiogenConfig) -> SpeechRequest {
    let configured_voice = config
        .speech
        .voice
        .clone()
        .filter(|_| resolve_model(None, config) == model);
    let voice = args
        .voice
        .clone()
        .or(configured_voice)
        .or_else(|| model.info().default_voice)
        .unwrap_or_default();
    let speed = args.speed.or(config.speech.speed).unwrap_or(DEFAULT_SPEED);

    SpeechRequest::new(args.text.clone(), voice)
        .with_speed(speed)
        .with_seed(args.seed)
        .with_temperature(args.temperature)
}

fn run_generate(args: TtsGenerateArgs) -> AudiogenResult<()> {
    let config = AudiogenConfig::load()?;
    let model_id = resolve_model(args.model, &config);
    let request = build_request(&args, model_id, &config);
    request.validate()?;

    let hf_home = require_hf_home()?;
    let mut model = load_speech_model(model_id, &hf_home, &config)?;
    synthesize_to_wav(model.as_mut(), &request, &args.output)?;
    println!("Audio saved to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use clap::Parser;

    fn generate_args(extra: &[&str]) -> TtsGenerateArgs {
        let mut argv = vec!["tts-generate", "--text", "Hello", "--output", "out.wav"];
        argv.extend_from_slice(extra);
        TtsGenerateArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_speech_status() {
        let temp = TempDir::new().unwrap();
        assert_eq!(speech_status(ModelId::Kokoro, None), ModelStatus::Missing);
        assert_eq!(
            speech_status(ModelId::Kokoro, Some(temp.path())),
            ModelStatus::Missing
        );

        temp.child("hub/models--onnx-community--Kokoro-82M-v1.0-ONNX/snapshots/rev/config.json")
            .write_str("{}")
            .unwrap();
        assert_eq!(
            speech_status(ModelId::Kokoro, Some(temp.path())),
            ModelStatus::Installed
        );
        assert_eq!(
            speech_status(ModelId::KittenTts, Some(temp.path())),
            ModelStatus::Missing
        );
    }

    #[test]
    fn test_request_uses_model_default_voice() {
        let config = AudiogenConfig::default();
        let request = build_request(&generate_args(&[]), ModelId::KittenTts, &config);
        assert_eq!(request.voice, "Jasper");
        assert_eq!(request.speed, 1.0);

        let request = build_request(&generate_args(&[]), ModelId::Qwen3Tts, &config);
        assert_eq!(request.voice, "Ryan");
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = AudiogenConfig::default();
        config.speech.voice = Some("af_bella".to_string());
        config.speech.speed = Some(1.5);

        let request = build_request(&generate_args(&[]), ModelId::Kokoro, &config);
        assert_eq!(request.voice, "af_bella");
        assert_eq!(request.speed, 1.5);

        let args = generate_args(&["--voice", "af_sky", "--speed", "0.8", "--seed", "7"]);
        let request = build_request(&args, ModelId::Kokoro, &config);
        assert_eq!(request.voice, "af_sky");
        assert_eq!(request.speed, 0.8);
        assert_eq!(request.seed, Some(7));
    }

    #[test]
    fn test_configured_voice_stays_with_configured_model() {
        let mut config = AudiogenConfig::default();
        config.speech.voice = Some("af_bella".to_string());

        let request = build_request(&generate_args(&["--model", "kitten"]), ModelId::KittenTts, &config);
        assert_eq!(request.voice, "Jasper");

        config.speech.model = Some(ModelId::KittenTts);
        config.speech.voice = Some("Bella".to_string());
        let request = build_request(&generate_args(&[]), ModelId::KittenTts, &config);
        assert_eq!(request.voice, "Bella");
        let request = build_request(&generate_args(&[]), ModelId::Kokoro, &config);
        assert_eq!(request.voice, "af_nova");
    }

    #[test]
    fn test_model_resolution() {
        let mut config = AudiogenConfig::default();
        assert_eq!(resolve_model(None, &config), ModelId::Kokoro);
        config.speech.model = Some(ModelId::KittenTts);
        assert_eq!(resolve_model(None, &config), ModelId::KittenTts);
        assert_eq!(resolve_model(Some(ModelId::Qwen3Tts), &config), ModelId::Qwen3Tts);
    }
}
