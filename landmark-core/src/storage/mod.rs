//! Dataset source and archive handling
//!
//! The raw dataset is a zip archive fetched from a data host.

pub mod archive;
pub mod kaggle;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use archive::extract_zip;
pub use kaggle::{KaggleConfig, KaggleSource};

/// Something that can place the raw dataset archive on disk
pub trait ArchiveSource {
    /// Download the archive into `dest_dir`, returning the archive path
    fn fetch(&self, dest_dir: &Path) -> Result<PathBuf>;

    /// Name of the table inside the archive
    fn csv_name(&self) -> &str;
}
