// ModelManager: presence checks and downloads for one catalog model

use std::fmt;
use std::path::{Path, PathBuf};

use super::cache::{dir_is_populated, HubCache};
use super::download::{fetch_artifact, materialize, HubClient};
use super::types::{CacheLayout, ModelId, ModelInfo};
use crate::error::{AudiogenError, AudiogenResult};

/// Result of a presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// Every required location exists and is non-empty
    Installed,
    /// Anything else
    Missing,
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => f.write_str("installed"),
            Self::Missing => f.write_str("missing"),
        }
    }
}

/// Summary of a finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Downloaded model
    pub model: ModelId,
    /// Number of repository files fetched
    pub files: usize,
    /// Root the model was installed under
    pub location: PathBuf,
}

/// Checks and installs a model under a storage root.
///
/// The root is `HF_HOME` for hub-cache models and the checkpoints directory
/// for checkpoint-layout models.
#[derive(Debug, Clone)]
pub struct ModelManager {
    info: ModelInfo,
    root: PathBuf,
}

impl ModelManager {
    /// Manager for `model` stored under `root`
    #[must_use]
    pub fn new(model: ModelId, root: impl Into<PathBuf>) -> Self {
        Self {
            info: model.info(),
            root: root.into(),
        }
    }

    /// Catalog entry of the managed model
    #[must_use]
    pub const fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Storage root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hub cache view (meaningful for hub-cache models)
    #[must_use]
    pub fn hub_cache(&self) -> HubCache {
        HubCache::new(&self.root)
    }

    /// Check whether the model is installed. Never fails: any problem reads
    /// as [`ModelStatus::Missing`].
    #[must_use]
    pub fn status(&self) -> ModelStatus {
        let installed = match self.info.layout {
            CacheLayout::HubCache => {
                let cache = self.hub_cache();
                self.info
                    .artifacts
                    .iter()
                    .all(|artifact| cache.has_snapshot(&artifact.repo_id))
            }
            CacheLayout::Checkpoints { marker_dir } => dir_is_populated(&self.root.join(marker_dir)),
        };
        tracing::debug!(
            "Presence check for {} under {}: {}",
            self.info.id,
            self.root.display(),
            installed
        );
        if installed {
            ModelStatus::Installed
        } else {
            ModelStatus::Missing
        }
    }

    /// Fail with an install hint unless the model is present.
    ///
    /// # Errors
    ///
    /// Returns [`AudiogenError::ModelNotInstalled`] if the presence check fails.
    pub fn ensure_installed(&self) -> AudiogenResult<()> {
        match self.status() {
            ModelStatus::Installed => Ok(()),
            ModelStatus::Missing => Err(AudiogenError::not_installed(
                self.info.id.as_str(),
                self.info.download_hint(),
            )),
        }
    }

    /// Download every artifact of the model.
    ///
    /// Hub-cache models land wherever `client` caches. Checkpoint models are
    /// additionally copied into the storage root.
    ///
    /// # Errors
    ///
    /// Returns the first listing, fetch or copy error. Files already fetched
    /// are left in place.
    pub async fn download<C: HubClient>(&self, client: &C) -> AudiogenResult<DownloadReport> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            AudiogenError::file(format!("cannot create {}: {e}", self.root.display()))
        })?;

        tracing::info!("Downloading {} into {}", self.info.name, self.root.display());
        let mut files = 0;
        for artifact in &self.info.artifacts {
            let fetched = fetch_artifact(client, artifact).await?;
            files += fetched.len();
            if let CacheLayout::Checkpoints { .. } = self.info.layout {
                let root = self.root.clone();
                tokio::task::spawn_blocking(move || materialize(&fetched, &root))
                    .await
                    .map_err(|e| AudiogenError::file(format!("copy task failed: {e}")))??;
            }
        }

        tracing::info!("Downloaded {} ({} files)", self.info.name, files);
        Ok(DownloadReport {
            model: self.info.id,
            files,
            location: self.root.clone(),
        })
    }

    /// Hub cache directory used while downloading checkpoint-layout models.
    ///
    /// Uses `<HF_HOME>/hub` when a cache root is known, otherwise a private
    /// cache inside the checkpoints directory.
    #[must_use]
    pub fn staging_hub_dir(&self, hf_home: Option<&Path>) -> PathBuf {
        match (self.info.layout, hf_home) {
            (CacheLayout::HubCache, _) => crate::config::hub_dir(&self.root),
            (CacheLayout::Checkpoints { .. }, Some(home)) => crate::config::hub_dir(home),
            (CacheLayout::Checkpoints { .. }, None) => self.root.join(".cache").join("hub"),
        }
    }
}
