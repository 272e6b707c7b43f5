//! Shared fixtures: synthetic keypoint tables and an offline archive source

#![allow(dead_code)]

use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use landmark_core::error::{LandmarkError, Result};
use landmark_core::storage::ArchiveSource;
use zip::write::FileOptions;

pub const PIXELS: usize = 96 * 96;

/// Pixel string with every pixel set to `value`
pub fn pixel_string(value: u32) -> String {
    vec![value.to_string(); PIXELS].join(" ")
}

/// Table with `rows` samples; keypoints of row i are (i, i + 0.5)
pub fn keypoint_table(rows: usize) -> String {
    let mut csv = String::from("left_eye_center_x,left_eye_center_y,Image\n");
    for i in 0..rows {
        csv.push_str(&format!("{},{},{}\n", i, i as f32 + 0.5, pixel_string(i as u32 % 256)));
    }
    csv
}

/// Write a zip archive holding a single entry
pub fn write_zip(path: &Path, entry: &str, contents: &[u8]) -> zip::result::ZipResult<()> {
    let mut writer = zip::ZipWriter::new(File::create(path)?);
    writer.start_file(entry, FileOptions::default())?;
    writer.write_all(contents)?;
    writer.finish()?;
    Ok(())
}

/// Serves a zip holding one CSV and counts how often it was fetched
pub struct FakeSource {
    csv: String,
    fetches: Cell<usize>,
}

impl FakeSource {
    pub fn new(csv: impl Into<String>) -> Self {
        Self {
            csv: csv.into(),
            fetches: Cell::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl ArchiveSource for FakeSource {
    fn fetch(&self, dest_dir: &Path) -> Result<PathBuf> {
        self.fetches.set(self.fetches.get() + 1);

        let path = dest_dir.join("training.zip");
        write_zip(&path, "training.csv", self.csv.as_bytes()).map_err(|e| LandmarkError::Archive {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }

    fn csv_name(&self) -> &str {
        "training.csv"
    }
}

/// Source that must never be asked for data
pub struct NoFetch;

impl ArchiveSource for NoFetch {
    fn fetch(&self, _dest_dir: &Path) -> Result<PathBuf> {
        Err(LandmarkError::StorageError {
            message: "unexpected fetch".into(),
        })
    }

    fn csv_name(&self) -> &str {
        "training.csv"
    }
}
