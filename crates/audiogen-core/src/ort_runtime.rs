//! ONNX Runtime shared library management.
//!
//! `ort` is built with `load-dynamic`, so the runtime library has to be found
//! (or fetched) before the first session is created. Lookup order is the
//! configured path (`ORT_DYLIB_PATH` or `ort_dylib_path` in the config file),
//! then the copy cached under `<HF_HOME>/onnxruntime/`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::config::{AudiogenConfig, ORT_DYLIB_ENV};
use crate::error::{AudiogenError, AudiogenResult};

/// ONNX Runtime release fetched when no library is available
pub const ORT_VERSION: &str = "1.22.0";

static ORT_INIT: OnceCell<PathBuf> = OnceCell::new();

/// Release archive platform tag and library file name for this target
#[must_use]
pub const fn platform() -> Option<(&'static str, &'static str)> {
    if cfg!(all(target_os = "windows", target_arch = "x86_64")) {
        Some(("win-x64", "onnxruntime.dll"))
    } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        Some(("osx-arm64", "libonnxruntime.dylib"))
    } else if cfg!(all(target_os = "macos", target_arch = "x86_64")) {
        Some(("osx-x86_64", "libonnxruntime.dylib"))
    } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
        Some(("linux-x64", "libonnxruntime.so"))
    } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
        Some(("linux-aarch64", "libonnxruntime.so"))
    } else {
        None
    }
}

/// Directory holding the cached runtime (`<HF_HOME>/onnxruntime`)
#[must_use]
pub fn runtime_dir(hf_home: &Path) -> PathBuf {
    hf_home.join("onnxruntime")
}

/// Find an existing runtime library without touching the network
#[must_use]
pub fn locate(config: &AudiogenConfig, hf_home: &Path) -> Option<PathBuf> {
    if let Some(path) = &config.ort_dylib_path {
        if path.is_file() {
            return Some(path.clone());
        }
        tracing::warn!("Configured ONNX Runtime library not found: {}", path.display());
    }
    let (_, lib_name) = platform()?;
    let cached = runtime_dir(hf_home).join(lib_name);
    cached.is_file().then_some(cached)
}

/// Make sure a runtime library is available, downloading the official release
/// into `<HF_HOME>/onnxruntime` if necessary.
///
/// # Errors
///
/// Returns a download error if the platform has no prebuilt release or the
/// download or extraction fails.
pub async fn ensure_runtime(config: &AudiogenConfig, hf_home: &Path) -> AudiogenResult<PathBuf> {
    if let Some(path) = locate(config, hf_home) {
        tracing::info!("ONNX Runtime library already available: {}", path.display());
        return Ok(path);
    }

    let (platform, lib_name) = platform().ok_or_else(|| {
        AudiogenError::download(format!(
            "no prebuilt ONNX Runtime for this platform; set {ORT_DYLIB_ENV}"
        ))
    })?;
    let ort_dir = runtime_dir(hf_home);
    std::fs::create_dir_all(&ort_dir)?;

    let archive_name = if cfg!(target_os = "windows") {
        format!("onnxruntime-{platform}-{ORT_VERSION}.zip")
    } else {
        format!("onnxruntime-{platform}-{ORT_VERSION}.tgz")
    };
    let download_url = format!(
        "https://github.com/microsoft/onnxruntime/releases/download/v{ORT_VERSION}/{archive_name}"
    );
    tracing::info!("Downloading ONNX Runtime {} from {}", ORT_VERSION, download_url);

    let lib_path = ort_dir.join(lib_name);
    let target = lib_path.clone();
    tokio::task::spawn_blocking(move || {
        download_and_extract(&download_url, &archive_name, &ort_dir, &target, lib_name)
    })
    .await
    .map_err(|e| AudiogenError::download(format!("runtime download task failed: {e}")))??;

    if lib_path.is_file() {
        tracing::info!("ONNX Runtime library installed: {}", lib_path.display());
        Ok(lib_path)
    } else {
        Err(AudiogenError::download(format!(
            "ONNX Runtime archive did not contain {lib_name}"
        )))
    }
}

fn download_and_extract(
    download_url: &str,
    archive_name: &str,
    ort_dir: &Path,
    lib_path: &Path,
    lib_name: &str,
) -> AudiogenResult<()> {
    let archive_path = ort_dir.join(archive_name);

    let response = reqwest::blocking::get(download_url)
        .map_err(|e| AudiogenError::download(format!("ONNX Runtime request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(AudiogenError::download(format!(
            "ONNX Runtime download returned HTTP {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|e| AudiogenError::download(format!("ONNX Runtime download interrupted: {e}")))?;
    File::create(&archive_path)?.write_all(&bytes)?;
    tracing::debug!("Saved {} bytes to {}", bytes.len(), archive_path.display());

    if archive_name.ends_with(".zip") {
        extract_zip(&archive_path, ort_dir)?;
    } else {
        let tar_gz = File::open(&archive_path)?;
        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(tar_gz));
        archive.unpack(ort_dir)?;
    }

    let source = find_library(ort_dir, lib_name).ok_or_else(|| {
        AudiogenError::download(format!("{lib_name} not found in {archive_name}"))
    })?;
    std::fs::copy(&source, lib_path)?;
    tracing::debug!("Copied {} to {}", source.display(), lib_path.display());

    let _ = std::fs::remove_file(&archive_path);
    Ok(())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> AudiogenResult<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AudiogenError::download(format!("invalid ONNX Runtime archive: {e}")))?;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| AudiogenError::download(format!("invalid ONNX Runtime archive: {e}")))?;
        let outpath = dest.join(entry.mangled_name());
        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)?;
    }
    Ok(())
}

// Release archives unpack to onnxruntime-<platform>-<version>/lib/<lib>
fn find_library(ort_dir: &Path, lib_name: &str) -> Option<PathBuf> {
    std::fs::read_dir(ort_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path().join("lib").join(lib_name))
        .find(|candidate| candidate.is_file())
}

/// Point `ort` at the runtime library and initialize the global environment.
///
/// Safe to call more than once; later calls are no-ops.
///
/// # Errors
///
/// Returns [`AudiogenError::ModelNotInstalled`] if no runtime library is
/// available, or a model error if ONNX Runtime fails to initialize.
pub fn init(config: &AudiogenConfig, hf_home: &Path) -> AudiogenResult<()> {
    ORT_INIT.get_or_try_init(|| {
        let path = locate(config, hf_home).ok_or_else(|| {
            AudiogenError::not_installed("onnxruntime", "tts-download-model")
        })?;
        // load-dynamic resolves the library through this variable on first use
        std::env::set_var(ORT_DYLIB_ENV, &path);
        tracing::info!("Initializing ONNX Runtime from {}", path.display());
        ort::init()
            .with_name("audiogen")
            .commit()
            .map_err(|e| AudiogenError::model(format!("failed to initialize ONNX Runtime: {e}")))?;
        Ok::<_, AudiogenError>(path)
    })?;
    Ok(())
}
