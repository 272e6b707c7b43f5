//! CSV to per-sample array conversion
//!
//! The source table has one row per face: keypoint coordinate columns
//! followed by an `Image` column of space-separated pixel intensities.
//! Missing cells are forward-filled column by column before conversion.

use ndarray::{Array1, Array2};
use std::path::Path;
use tracing::{debug, info};

use super::sample::{sample_paths, save_array};
use crate::error::{LandmarkError, Result};

/// Name of the pixel column
pub const IMAGE_COLUMN: &str = "Image";

/// Side length of the square image grid
pub const IMAGE_SIDE: usize = 96;

/// Cell values treated as missing
const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Outcome of a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of samples written
    pub samples: usize,
    /// Keypoint column names in output order
    pub keypoint_columns: Vec<String>,
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Per-column forward fill over raw cell text
#[derive(Debug)]
struct ForwardFill {
    last: Vec<Option<String>>,
}

impl ForwardFill {
    fn new(columns: usize) -> Self {
        Self {
            last: vec![None; columns],
        }
    }

    /// Cell value after filling; `None` when nothing has been seen yet
    fn fill(&mut self, column: usize, cell: &str) -> Option<&str> {
        if !is_missing(cell) {
            self.last[column] = Some(cell.to_string());
        }
        self.last[column].as_deref()
    }
}

/// Parse a pixel string into a 96x96 grid; empty tokens become zero
pub fn parse_image(pixels: &str, row: usize) -> Result<Array2<f32>> {
    let values = pixels
        .split(' ')
        .map(|token| {
            if token.is_empty() {
                Ok(0.0)
            } else {
                token.parse::<f32>().map_err(|e| LandmarkError::Conversion {
                    row,
                    reason: format!("pixel {:?} is not a number: {}", token, e),
                })
            }
        })
        .collect::<Result<Vec<f32>>>()?;

    let count = values.len();
    Array2::from_shape_vec((IMAGE_SIDE, IMAGE_SIDE), values).map_err(|_| LandmarkError::Conversion {
        row,
        reason: format!(
            "expected {} pixels for a {}x{} grid, got {}",
            IMAGE_SIDE * IMAGE_SIDE,
            IMAGE_SIDE,
            IMAGE_SIDE,
            count
        ),
    })
}

fn parse_keypoint(cell: Option<&str>, row: usize, column: &str) -> Result<f32> {
    match cell {
        None => Ok(f32::NAN),
        Some(text) => text.trim().parse::<f32>().map_err(|e| LandmarkError::Conversion {
            row,
            reason: format!("{} value {:?} is not a number: {}", column, text, e),
        }),
    }
}

/// Convert `csv_path` into `img_<i>.npy` / `keypoints_<i>.npy` files in `out_dir`
pub fn convert_csv(csv_path: &Path, out_dir: &Path) -> Result<ConversionSummary> {
    let csv_err = |e: csv::Error| LandmarkError::Csv {
        path: csv_path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let image_col = headers
        .iter()
        .position(|h| h == IMAGE_COLUMN)
        .ok_or_else(|| LandmarkError::Csv {
            path: csv_path.to_path_buf(),
            message: format!("no {:?} column in header", IMAGE_COLUMN),
        })?;
    let keypoint_cols: Vec<usize> = (0..headers.len()).filter(|&c| c != image_col).collect();
    let keypoint_columns: Vec<String> = keypoint_cols.iter().map(|&c| headers[c].to_string()).collect();

    let mut fill = ForwardFill::new(headers.len());
    let mut samples = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;

        let pixels = fill
            .fill(image_col, record.get(image_col).unwrap_or(""))
            .ok_or_else(|| LandmarkError::Conversion {
                row,
                reason: "image is missing and no earlier row to fill from".into(),
            })?
            .to_string();
        let image = parse_image(&pixels, row)?;

        let mut keypoints = Vec::with_capacity(keypoint_cols.len());
        for (&col, name) in keypoint_cols.iter().zip(&keypoint_columns) {
            let cell = fill.fill(col, record.get(col).unwrap_or(""));
            keypoints.push(parse_keypoint(cell, row, name)?);
        }
        let keypoints = Array1::from_vec(keypoints);

        let (image_path, keypoints_path) = sample_paths(out_dir, row);
        save_array(&image_path, &image)?;
        save_array(&keypoints_path, &keypoints)?;
        samples += 1;

        if samples % 1000 == 0 {
            debug!("Converted {} rows from {}", samples, csv_path.display());
        }
    }

    info!(
        "Converted {} samples with {} keypoint columns from {}",
        samples,
        keypoint_columns.len(),
        csv_path.display()
    );

    Ok(ConversionSummary {
        samples,
        keypoint_columns,
    })
}
