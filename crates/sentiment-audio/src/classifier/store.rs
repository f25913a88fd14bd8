//! Model location resolution and download cache
//!
//! Local models are used where they are. Remote models are downloaded once
//! into `<cache_dir>/<cache_key>.onnx` and loaded from there on every later
//! call; the URL itself is never treated as a path.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::config::ModelLocation;
use super::error::{ClassifierError, ModelLoadError, Result};

/// Extension of cached model files
const MODEL_EXTENSION: &str = "onnx";

/// Resolves model locations to local files, downloading when needed
#[derive(Debug, Clone)]
pub struct ModelStore {
    /// Directory where downloaded models are cached; `None` means the
    /// platform cache directory, looked up only when a download needs it
    cache_dir: Option<PathBuf>,
    /// File stem of the cached model
    cache_key: String,
}

impl ModelStore {
    /// Create a store using the platform cache directory
    ///
    /// Default location: `~/.cache/audio-sentiment/models/`
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            cache_dir: None,
            cache_key: cache_key.into(),
        }
    }

    /// Create a store with a custom cache directory
    pub fn with_cache_dir(cache_dir: PathBuf, cache_key: impl Into<String>) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            cache_key: cache_key.into(),
        }
    }

    /// Directory downloaded models are cached in
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let base = dirs::cache_dir().ok_or_else(|| {
            ClassifierError::InvalidConfig("Could not determine cache directory".to_string())
        })?;
        Ok(base.join("audio-sentiment").join("models"))
    }

    /// Local path a downloaded model is cached under
    pub fn cached_path(&self) -> Result<PathBuf> {
        Ok(self
            .cache_dir()?
            .join(format!("{}.{}", self.cache_key, MODEL_EXTENSION)))
    }

    /// Get a local file for `location`, downloading a remote model if it is
    /// not cached yet.
    pub fn resolve(&self, location: &ModelLocation) -> Result<PathBuf> {
        match location {
            ModelLocation::LocalPath(path) => {
                if !path.exists() {
                    return Err(ModelLoadError::Unreadable {
                        path: path.clone(),
                        reason: "file not found".to_string(),
                    }
                    .into());
                }
                Ok(path.clone())
            }
            ModelLocation::RemoteUrl(url) => {
                let target = self.cached_path()?;
                if target.exists() {
                    log::info!("Model for {} found in cache at {:?}", url, target);
                    return Ok(target);
                }
                log::info!("Downloading model from {}", url);
                self.download_file(url, &target)?;
                Ok(target)
            }
        }
    }

    /// Remove the cached model, if any
    pub fn clear_cache(&self) -> Result<()> {
        let path = self.cached_path()?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| ClassifierError::io(&path, e))?;
            log::info!("Deleted cached model: {:?}", path);
        }
        Ok(())
    }

    /// Download a file from a URL into the cache with atomic rename
    ///
    /// The partial `.tmp` file is removed on every failure.
    fn download_file(&self, url: &str, target_path: &Path) -> Result<()> {
        let cache_dir = self.cache_dir()?;
        fs::create_dir_all(&cache_dir).map_err(|e| ClassifierError::io(&cache_dir, e))?;

        let temp_path = target_path.with_extension("tmp");

        let downloaded = match fetch_to(url, &temp_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                fs::remove_file(&temp_path).ok();
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, target_path) {
            fs::remove_file(&temp_path).ok();
            return Err(ClassifierError::io(target_path, e));
        }

        log::info!(
            "Downloaded model {:?} ({} bytes)",
            target_path.file_name().unwrap_or_default(),
            downloaded
        );
        Ok(())
    }
}

/// Stream the body at `url` into `path`, returning the byte count.
///
/// Fails when the body is shorter or longer than a declared Content-Length.
fn fetch_to(url: &str, path: &Path) -> Result<u64> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| ClassifierError::ModelDownloadFailed(format!("{}: {}", url, e)))?;

    let content_length: Option<u64> = response
        .header("Content-Length")
        .and_then(|s| s.parse().ok());

    let mut file = fs::File::create(path).map_err(|e| ClassifierError::io(path, e))?;

    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut downloaded: u64 = 0;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| ClassifierError::ModelDownloadFailed(format!("Read error: {}", e)))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(|e| ClassifierError::io(path, e))?;
        downloaded += bytes_read as u64;
    }

    file.flush().map_err(|e| ClassifierError::io(path, e))?;

    if let Some(expected) = content_length {
        if downloaded != expected {
            return Err(ClassifierError::ModelDownloadFailed(format!(
                "Download incomplete: expected {} bytes, got {}",
                expected, downloaded
            )));
        }
    }

    Ok(downloaded)
}
