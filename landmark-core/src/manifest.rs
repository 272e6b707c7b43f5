//! Dataset integrity manifest
//!
//! The manifest maps every file under the data directory to the hex MD5 of
//! its contents. Keys are relative to the data directory: top-level files
//! are written `./<file>` and nested files `<subdir>/<file>`, so manifests
//! sealed by the Python envoy verify here unchanged. It is persisted as
//! `dataset.json` next to the data; if it exists and matches a fresh
//! computation, the dataset is complete.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{LandmarkError, Result};

/// File name of the persisted manifest
pub const MANIFEST_FILE: &str = "dataset.json";

/// Relative path → content checksum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetManifest {
    files: BTreeMap<String, String>,
}

impl DatasetManifest {
    /// Checksum every file under `root`, skipping any file named `dataset.json`
    ///
    /// Symlinks to files are hashed through the link; symlinked directories
    /// are not descended into.
    pub fn compute(root: &Path) -> Result<Self> {
        let mut files = BTreeMap::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"));
                LandmarkError::io(path, source)
            })?;

            let file_type = entry.file_type();
            let is_file = file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir());
            if !is_file || entry.file_name() == MANIFEST_FILE {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| LandmarkError::Internal {
                    message: format!("{} is outside {}: {}", entry.path().display(), root.display(), e),
                })?;
            files.insert(manifest_key(rel), file_md5(entry.path())?);
        }

        debug!("Computed checksums for {} files under {}", files.len(), root.display());
        Ok(Self { files })
    }

    /// Load the persisted manifest; `None` if it is absent or unreadable
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(MANIFEST_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LandmarkError::io(path, e)),
        };

        match serde_json::from_str(&text) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(e) => {
                warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Persist as `dataset.json` under `root`
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(MANIFEST_FILE);
        let json = serde_json::to_string(self).map_err(|e| LandmarkError::ManifestInvalid {
            reason: format!("Serialization failed: {}", e),
        })?;
        std::fs::write(&path, json).map_err(|e| LandmarkError::io(path, e))
    }

    /// Compare a fresh computation against the persisted manifest
    pub fn verify(root: &Path) -> Result<bool> {
        let current = Self::compute(root)?;
        Ok(match Self::load(root)? {
            Some(stored) => stored == current,
            None => false,
        })
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check whether no files are tracked
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Checksum of a tracked file
    pub fn checksum(&self, rel_path: &str) -> Option<&str> {
        self.files.get(rel_path).map(String::as_str)
    }
}

/// Manifest key for a path relative to the data directory
fn manifest_key(rel: &Path) -> String {
    let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
    if parts.len() == 1 {
        format!("./{}", parts[0])
    } else {
        parts.join("/")
    }
}

/// Hex MD5 of a file's contents
pub fn file_md5(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| LandmarkError::io(path, e))?;
    let mut hasher = Md5::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| LandmarkError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}
