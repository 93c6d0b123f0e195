// Read-only view of the Hugging Face hub cache layout
// (<HF_HOME>/hub/models--<org>--<repo>/{snapshots,refs,blobs})

use std::path::{Path, PathBuf};

use crate::config::hub_dir;

/// Folder name of a repository inside the hub cache (`models--org--repo`)
#[must_use]
pub fn repo_folder_name(repo_id: &str) -> String {
    format!("models--{}", repo_id.replace('/', "--"))
}

/// Check that `path` is a directory with at least one entry.
///
/// Any I/O error counts as not populated.
#[must_use]
pub fn dir_is_populated(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_some(),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            false
        }
    }
}

/// The hub cache rooted at `<HF_HOME>/hub`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubCache {
    hub_dir: PathBuf,
}

impl HubCache {
    /// Cache under the given `HF_HOME`
    #[must_use]
    pub fn new(hf_home: &Path) -> Self {
        Self {
            hub_dir: hub_dir(hf_home),
        }
    }

    /// The `hub` directory
    #[must_use]
    pub fn hub_dir(&self) -> &Path {
        &self.hub_dir
    }

    /// Directory holding a repository's cache entries
    #[must_use]
    pub fn repo_dir(&self, repo_id: &str) -> PathBuf {
        self.hub_dir.join(repo_folder_name(repo_id))
    }

    /// Check whether the repository has at least one non-empty snapshot
    #[must_use]
    pub fn has_snapshot(&self, repo_id: &str) -> bool {
        let snapshots = self.repo_dir(repo_id).join("snapshots");
        let found = self.snapshot_dirs(&snapshots).iter().any(|d| dir_is_populated(d));
        tracing::debug!("Snapshot check for {} at {}: {}", repo_id, snapshots.display(), found);
        found
    }

    /// Resolve the active snapshot directory.
    ///
    /// Prefers the revision recorded in `refs/main`, falling back to the first
    /// non-empty snapshot in lexical order.
    #[must_use]
    pub fn snapshot_dir(&self, repo_id: &str) -> Option<PathBuf> {
        let repo_dir = self.repo_dir(repo_id);
        let snapshots = repo_dir.join("snapshots");

        if let Ok(revision) = std::fs::read_to_string(repo_dir.join("refs").join("main")) {
            let candidate = snapshots.join(revision.trim());
            if !revision.trim().is_empty() && dir_is_populated(&candidate) {
                return Some(candidate);
            }
            tracing::debug!("refs/main for {} points at a missing snapshot", repo_id);
        }

        self.snapshot_dirs(&snapshots)
            .into_iter()
            .find(|d| dir_is_populated(d))
    }

    /// Resolve a file inside the active snapshot
    #[must_use]
    pub fn resolve_file(&self, repo_id: &str, filename: &str) -> Option<PathBuf> {
        let path = self.snapshot_dir(repo_id)?.join(filename);
        path.exists().then_some(path)
    }

    fn snapshot_dirs(&self, snapshots: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(snapshots) else {
            return Vec::new();
        };
        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    const REPO: &str = "onnx-community/Kokoro-82M-v1.0-ONNX";

    #[test]
    fn test_repo_folder_name() {
        assert_eq!(
            repo_folder_name(REPO),
            "models--onnx-community--Kokoro-82M-v1.0-ONNX"
        );
    }

    #[test]
    fn test_missing_cache_has_no_snapshot() {
        let temp = TempDir::new().unwrap();
        let cache = HubCache::new(temp.path());
        assert!(!cache.has_snapshot(REPO));
        assert!(cache.snapshot_dir(REPO).is_none());
    }

    #[test]
    fn test_empty_snapshot_is_not_installed() {
        let temp = TempDir::new().unwrap();
        temp.child("hub/models--onnx-community--Kokoro-82M-v1.0-ONNX/snapshots/abc")
            .create_dir_all()
            .unwrap();
        let cache = HubCache::new(temp.path());
        assert!(!cache.has_snapshot(REPO));
    }

    #[test]
    fn test_populated_snapshot() {
        let temp = TempDir::new().unwrap();
        temp.child("hub/models--onnx-community--Kokoro-82M-v1.0-ONNX/snapshots/abc/config.json")
            .write_str("{}")
            .unwrap();
        let cache = HubCache::new(temp.path());
        assert!(cache.has_snapshot(REPO));
        assert_eq!(
            cache.resolve_file(REPO, "config.json"),
            Some(temp.path().join(
                "hub/models--onnx-community--Kokoro-82M-v1.0-ONNX/snapshots/abc/config.json"
            ))
        );
        assert!(cache.resolve_file(REPO, "tokenizer.json").is_none());
    }

    #[test]
    fn test_refs_main_wins_over_lexical_order() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("hub/models--onnx-community--Kokoro-82M-v1.0-ONNX");
        repo.child("snapshots/aaa/config.json").write_str("{}").unwrap();
        repo.child("snapshots/bbb/config.json").write_str("{}").unwrap();

        let cache = HubCache::new(temp.path());
        assert_eq!(
            cache.snapshot_dir(REPO).unwrap().file_name().unwrap(),
            "aaa"
        );

        repo.child("refs/main").write_str("bbb\n").unwrap();
        assert_eq!(
            cache.snapshot_dir(REPO).unwrap().file_name().unwrap(),
            "bbb"
        );
    }

    #[test]
    fn test_stale_ref_falls_back() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("hub/models--onnx-community--Kokoro-82M-v1.0-ONNX");
        repo.child("snapshots/aaa/config.json").write_str("{}").unwrap();
        repo.child("refs/main").write_str("gone").unwrap();

        let cache = HubCache::new(temp.path());
        assert_eq!(
            cache.snapshot_dir(REPO).unwrap().file_name().unwrap(),
            "aaa"
        );
    }

    #[test]
    fn test_dir_is_populated() {
        let temp = TempDir::new().unwrap();
        assert!(!dir_is_populated(&temp.path().join("nope")));
        assert!(!dir_is_populated(temp.path()));

        temp.child("file.txt").write_str("x").unwrap();
        assert!(dir_is_populated(temp.path()));
        assert!(!dir_is_populated(&temp.path().join("file.txt")));
    }
}
