//! Input staging
//!
//! Archived inputs are extracted into a fresh temporary directory owned by
//! [`StagedData`]; the directory is deleted when the value is dropped, so two
//! stagings never share or clobber a location.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::error::{ClassifierError, Result};

/// Prefix of temporary staging directories
const STAGING_PREFIX: &str = "audio-sentiment-";

/// A directory holding the embedding artifacts for one operation
#[derive(Debug)]
pub struct StagedData {
    root: PathBuf,
    /// Removed on drop; `None` when the source was already a directory
    scratch: Option<TempDir>,
}

impl StagedData {
    /// Directory containing the staged artifacts
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the data was extracted into a temporary directory
    pub fn is_extracted(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Stage `source`: extract it when it is an archive, otherwise use it in place.
pub fn stage(source: &Path, is_archive: bool) -> Result<StagedData> {
    if !source.exists() {
        return Err(ClassifierError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "data source does not exist"),
        ));
    }

    if !is_archive {
        return Ok(StagedData {
            root: source.to_path_buf(),
            scratch: None,
        });
    }

    let scratch = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir()
        .map_err(|e| ClassifierError::io(std::env::temp_dir(), e))?;

    extract_zip(source, scratch.path())?;

    Ok(StagedData {
        root: scratch.path().to_path_buf(),
        scratch: Some(scratch),
    })
}

/// Extract every entry of the zip archive at `archive` into `target`.
fn extract_zip(archive: &Path, target: &Path) -> Result<()> {
    let file = fs::File::open(archive).map_err(|e| ClassifierError::io(archive, e))?;

    let archive_err = |e: zip::result::ZipError| ClassifierError::Archive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    };

    let mut zip = zip::ZipArchive::new(file).map_err(archive_err)?;
    log::debug!("Extracting {} entries from {:?}", zip.len(), archive);
    zip.extract(target).map_err(archive_err)?;
    Ok(())
}
