//! Command bodies. Each public function returns the process exit code.

pub mod music;
pub mod tts;

use std::process::ExitCode;

use audiogen_core::{AudiogenConfig, AudiogenError, AudiogenResult};

/// Map a command result to an exit code, printing `Error: <message>` on
/// failure.
pub fn report<T>(result: AudiogenResult<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed ({})", e.category());
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the config, falling back to defaults with a warning. Used by the
/// presence checks, which never fail.
#[must_use]
pub fn config_or_default() -> AudiogenConfig {
    AudiogenConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring config: {e}");
        AudiogenConfig::default()
    })
}

/// Current-thread runtime for the download commands
///
/// # Errors
///
/// Returns a configuration error if the runtime cannot start.
pub fn runtime() -> AudiogenResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AudiogenError::configuration(format!("failed to start async runtime: {e}")))
}
