//! Zip extraction

use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{LandmarkError, Result};

/// Extract every entry of `archive` into `dest_dir`
pub fn extract_zip(archive: &Path, dest_dir: &Path) -> Result<usize> {
    let file = File::open(archive).map_err(|e| LandmarkError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| LandmarkError::Archive {
        path: archive.to_path_buf(),
        message: e.to_string(),
    })?;

    let entries = zip.len();
    zip.extract(dest_dir).map_err(|e| LandmarkError::Archive {
        path: archive.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!("Extracted {} entries from {} into {}", entries, archive.display(), dest_dir.display());
    Ok(entries)
}
