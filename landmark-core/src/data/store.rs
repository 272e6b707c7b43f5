//! On-disk dataset cache
//!
//! Keeps the converted sample files in a data directory and refreshes
//! them from an [`ArchiveSource`] whenever the integrity manifest does
//! not match the directory contents.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::convert::convert_csv;
use crate::error::{LandmarkError, Result};
use crate::manifest::DatasetManifest;
use crate::storage::{extract_zip, ArchiveSource};

/// Leftover directory from an interrupted conversion
pub const PARTIAL_DIR: &str = "train";

/// Result of an availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Manifest matched, nothing fetched
    CacheHit,
    /// Data was fetched and converted
    Refreshed {
        /// Samples written by the conversion
        samples: usize,
    },
}

/// Data directory holding the converted samples
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check the manifest without refreshing
    pub fn verify(&self) -> Result<bool> {
        if !self.root.is_dir() {
            return Ok(false);
        }
        DatasetManifest::verify(&self.root)
    }

    /// Make sure converted, verified data is present, fetching it if needed
    pub fn ensure_available<S: ArchiveSource + ?Sized>(&self, source: &S) -> Result<Availability> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| LandmarkError::io(&self.root, e))?;
        }

        if DatasetManifest::verify(&self.root)? {
            debug!("Dataset in {} is complete", self.root.display());
            return Ok(Availability::CacheHit);
        }

        info!("Your dataset is absent or damaged. Downloading ...");
        let samples = self.refresh(source)?;
        Ok(Availability::Refreshed { samples })
    }

    /// Fetch, extract, convert and re-seal the dataset
    fn refresh<S: ArchiveSource + ?Sized>(&self, source: &S) -> Result<usize> {
        let partial = self.root.join(PARTIAL_DIR);
        if partial.exists() {
            std::fs::remove_dir_all(&partial).map_err(|e| LandmarkError::io(&partial, e))?;
        }

        let archive = source.fetch(&self.root)?;
        extract_zip(&archive, &self.root)?;
        std::fs::remove_file(&archive).map_err(|e| LandmarkError::io(&archive, e))?;

        let csv_path = self.root.join(source.csv_name());
        let summary = convert_csv(&csv_path, &self.root)?;
        std::fs::remove_file(&csv_path).map_err(|e| LandmarkError::io(&csv_path, e))?;

        let manifest = DatasetManifest::compute(&self.root)?;
        manifest.save(&self.root)?;
        info!(
            "Dataset ready in {}: {} samples, {} files sealed",
            self.root.display(),
            summary.samples,
            manifest.len()
        );

        Ok(summary.samples)
    }
}
