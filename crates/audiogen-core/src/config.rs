//! Runtime configuration.
//!
//! Settings come from an optional TOML file and the process environment.
//! The environment wins. `HF_HOME` is only ever read from the environment so
//! that the cache root stays under the control of the calling process.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{AudiogenError, AudiogenResult};
use crate::model::ModelId;

/// Environment variable naming the model cache root
pub const HF_HOME_ENV: &str = "HF_HOME";
/// Environment variable carrying a Hugging Face access token
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";
/// Environment variable pointing at the ONNX Runtime shared library
pub const ORT_DYLIB_ENV: &str = "ORT_DYLIB_PATH";
/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "AUDIOGEN_CONFIG";

/// Phonemizer settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EspeakConfig {
    /// espeak executable name or path
    pub program: String,
    /// espeak voice/language code
    pub language: String,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            language: "en-us".to_string(),
        }
    }
}

/// Defaults applied to speech generation when flags are omitted
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeechDefaults {
    /// Backend used when `--model` is not given
    pub model: Option<ModelId>,
    /// Voice used when `--voice` is not given
    pub voice: Option<String>,
    /// Speed used when `--speed` is not given
    pub speed: Option<f32>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudiogenConfig {
    /// Hugging Face access token for gated repositories
    pub hf_token: Option<String>,
    /// Explicit ONNX Runtime shared library
    pub ort_dylib_path: Option<PathBuf>,
    /// Phonemizer settings
    pub espeak: EspeakConfig,
    /// Speech generation defaults
    pub speech: SpeechDefaults,
}

impl AudiogenConfig {
    /// Load the config file (if any) and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a config file exists but cannot be
    /// read or parsed.
    pub fn load() -> AudiogenResult<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            Some(path) => {
                tracing::debug!("No config file at {}", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> AudiogenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AudiogenError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Location of the config file: `$AUDIOGEN_CONFIG`, else the platform
    /// config directory.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = non_empty_env(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("ai", "Audiogen", "audiogen")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Some(token) = non_empty_env(HF_TOKEN_ENV) {
            self.hf_token = Some(token);
        }
        if let Some(path) = non_empty_env(ORT_DYLIB_ENV) {
            self.ort_dylib_path = Some(PathBuf::from(path));
        }
    }
}

/// Read the cache root from `HF_HOME`.
///
/// # Errors
///
/// Returns a configuration error if the variable is unset or empty.
pub fn require_hf_home() -> AudiogenResult<PathBuf> {
    non_empty_env(HF_HOME_ENV)
        .map(PathBuf::from)
        .ok_or_else(|| AudiogenError::configuration("HF_HOME env var not set"))
}

/// Read the cache root from `HF_HOME`, if set.
#[must_use]
pub fn hf_home() -> Option<PathBuf> {
    non_empty_env(HF_HOME_ENV).map(PathBuf::from)
}

/// Hub directory under a cache root (`<HF_HOME>/hub`)
#[must_use]
pub fn hub_dir(hf_home: &Path) -> PathBuf {
    hf_home.join("hub")
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
