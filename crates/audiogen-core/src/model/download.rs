// Artifact downloads through the Hugging Face hub client.
// hf-hub owns the cache layout, resumption and etag handling; this module only
// selects files and, for plain checkpoint layouts, links them into place.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use hf_hub::api::tokio::{Api, ApiBuilder};

use super::types::Artifact;
use crate::error::{AudiogenError, AudiogenResult};

/// Minimal view of a model hub: list a repository, fetch one file.
pub trait HubClient {
    /// List every file (`rfilename`) in the repository's main revision
    fn list_files(&self, repo_id: &str) -> impl Future<Output = AudiogenResult<Vec<String>>>;

    /// Fetch a file into the local cache and return its cached path
    fn fetch(&self, repo_id: &str, filename: &str) -> impl Future<Output = AudiogenResult<PathBuf>>;
}

/// [`HubClient`] backed by `hf-hub`'s async API
#[derive(Clone)]
pub struct HfHubClient {
    api: Api,
}

impl fmt::Debug for HfHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfHubClient").finish_non_exhaustive()
    }
}

impl HfHubClient {
    /// Create a client caching into `hub_dir` (usually `<HF_HOME>/hub`).
    ///
    /// # Errors
    ///
    /// Returns a download error if the HTTP client cannot be built.
    pub fn new(hub_dir: PathBuf, token: Option<String>) -> AudiogenResult<Self> {
        tracing::debug!("Hub cache directory: {}", hub_dir.display());
        let api = ApiBuilder::new()
            .with_cache_dir(hub_dir)
            .with_token(token)
            .with_progress(false)
            .build()?;
        Ok(Self { api })
    }
}

impl HubClient for HfHubClient {
    async fn list_files(&self, repo_id: &str) -> AudiogenResult<Vec<String>> {
        let info = self.api.model(repo_id.to_string()).info().await?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    async fn fetch(&self, repo_id: &str, filename: &str) -> AudiogenResult<PathBuf> {
        let path = self.api.model(repo_id.to_string()).get(filename).await?;
        Ok(path)
    }
}

/// A file fetched into the hub cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Path relative to the repository root
    pub rfilename: String,
    /// Location in the local cache
    pub path: PathBuf,
}

/// Fetch every file of an artifact that matches its include patterns.
///
/// # Errors
///
/// Returns a download error if listing or fetching fails, or if no file in
/// the repository matches the artifact's patterns.
pub async fn fetch_artifact<C: HubClient>(
    client: &C,
    artifact: &Artifact,
) -> AudiogenResult<Vec<FetchedFile>> {
    let files = client.list_files(&artifact.repo_id).await?;
    let selected: Vec<String> = files.into_iter().filter(|f| artifact.matches(f)).collect();
    if selected.is_empty() {
        return Err(AudiogenError::download(format!(
            "no files in {} match {:?}",
            artifact.repo_id,
            artifact.include.as_deref().unwrap_or_default()
        )));
    }

    tracing::info!("Fetching {} files from {}", selected.len(), artifact.repo_id);
    let mut fetched = Vec::with_capacity(selected.len());
    for rfilename in selected {
        tracing::debug!("Fetching {}/{}", artifact.repo_id, rfilename);
        let path = client.fetch(&artifact.repo_id, &rfilename).await?;
        fetched.push(FetchedFile { rfilename, path });
    }
    Ok(fetched)
}

/// Place fetched files into a plain directory tree under `dest`.
///
/// Each file is hard linked to its cached blob, or copied when the link
/// fails (different filesystem, unsupported), under a temporary name and
/// renamed into place. A file already present with the same size is left
/// alone. Returns the number of files placed.
///
/// # Errors
///
/// Returns a file error if a directory cannot be created or both linking
/// and copying fail.
pub fn materialize(files: &[FetchedFile], dest: &Path) -> AudiogenResult<usize> {
    let mut copied = 0;
    for file in files {
        let target = dest.join(&file.rfilename);
        let source_len = std::fs::metadata(&file.path)?.len();
        if let Ok(existing) = std::fs::metadata(&target) {
            if existing.is_file() && existing.len() == source_len {
                tracing::debug!("Up to date: {}", target.display());
                continue;
            }
        }
        place_atomic(&file.path, &target)?;
        copied += 1;
    }
    tracing::info!("Placed {} of {} files into {}", copied, files.len(), dest.display());
    Ok(copied)
}

fn place_atomic(source: &Path, target: &Path) -> AudiogenResult<()> {
    let parent = target
        .parent()
        .ok_or_else(|| AudiogenError::file(format!("invalid target path {}", target.display())))?;
    std::fs::create_dir_all(parent)?;

    // snapshot entries are symlinks into blobs/; link the blob itself
    let blob = std::fs::canonicalize(source)?;
    let temp = parent.join(format!(".{}.part", uuid::Uuid::new_v4()));
    if let Err(link_err) = std::fs::hard_link(&blob, &temp) {
        tracing::debug!("Hard link of {} failed ({link_err}), copying", blob.display());
        if let Err(e) = std::fs::copy(&blob, &temp) {
            let _ = std::fs::remove_file(&temp);
            return Err(AudiogenError::file(format!(
                "failed to copy {} to {}: {e}",
                blob.display(),
                target.display()
            )));
        }
    }
    std::fs::rename(&temp, target)?;
    Ok(())
}
