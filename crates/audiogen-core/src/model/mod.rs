//! Model catalog, cache inspection and downloads

/// Hugging Face hub cache and checkpoint directory inspection
pub mod cache;
/// Downloading model artifacts through `hf-hub`
pub mod download;
/// Presence checks and downloads per model
pub mod manager;
/// Model types and the static catalog
pub mod types;

pub use cache::{dir_is_populated, repo_folder_name, HubCache};
pub use download::{HfHubClient, HubClient};
pub use manager::{DownloadReport, ModelManager, ModelStatus};
pub use types::{Artifact, CacheLayout, ModelId, ModelInfo, ModelKind};
