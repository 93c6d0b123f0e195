//! Music commands.

use std::path::Path;
use std::process::ExitCode;

use audiogen_core::config::hf_home;
use audiogen_core::model::HfHubClient;
use audiogen_core::{
    compose_to_wav, load_music_model, AudiogenConfig, AudiogenError, AudiogenResult,
    DownloadReport, ModelId, ModelManager, ModelStatus, MusicRequest,
};

use super::{report, runtime};
use crate::args::{MusicCheckArgs, MusicDownloadArgs, MusicGenerateArgs};

/// `music-check-model`: print `installed` or `missing`. Always exits 0.
#[must_use]
pub fn check(args: &MusicCheckArgs) -> ExitCode {
    println!("{}", music_status(&args.checkpoints_dir));
    ExitCode::SUCCESS
}

/// Presence of the music checkpoints
#[must_use]
pub fn music_status(checkpoints: &Path) -> ModelStatus {
    ModelManager::new(ModelId::AceStep, checkpoints).status()
}

/// `music-download-model`
#[must_use]
pub fn download(args: &MusicDownloadArgs) -> ExitCode {
    report(run_download(args))
}

fn run_download(args: &MusicDownloadArgs) -> AudiogenResult<DownloadReport> {
    let config = AudiogenConfig::load()?;
    runtime()?.block_on(download_music_model(
        &args.checkpoints_dir,
        hf_home().as_deref(),
        &config,
    ))
}

/// Download the music checkpoints into `checkpoints`, staging through the
/// hub cache under `hf_home` when one is given.
///
/// # Errors
///
/// Returns the first directory, download or copy error.
pub async fn download_music_model(
    checkpoints: &Path,
    hf_home: Option<&Path>,
    config: &AudiogenConfig,
) -> AudiogenResult<DownloadReport> {
    let manager = ModelManager::new(ModelId::AceStep, checkpoints);
    let staging = manager.staging_hub_dir(hf_home);
    std::fs::create_dir_all(&staging).map_err(|e| {
        AudiogenError::file(format!("cannot create {}: {e}", staging.display()))
    })?;

    println!(
        "Downloading {} model (this may take several minutes)...",
        manager.info().name
    );
    let client = HfHubClient::new(staging, config.hf_token.clone())?;
    let report = manager.download(&client).await?;
    println!("Download complete");
    Ok(report)
}

/// `music-generate`
#[must_use]
pub fn generate(args: &MusicGenerateArgs) -> ExitCode {
    report(run_generate(args))
}

fn run_generate(args: &MusicGenerateArgs) -> AudiogenResult<()> {
    let request = MusicRequest::new(args.genre.clone())
        .with_duration(args.duration)
        .with_seed(args.seed);
    request.validate()?;

    let mut model = load_music_model(&args.checkpoints_dir())?;
    compose_to_wav(model.as_mut(), &request, &args.output)?;
    println!("Music saved to {}", args.output.display());
    Ok(())
}
