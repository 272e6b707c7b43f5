//! Sample files on disk
//!
//! Each sample is a pair of `.npy` files sharing an index:
//! `img_<i>.npy` (96x96 `f32` image) and `keypoints_<i>.npy` (`f32` vector).

use ndarray::ArrayD;
use ndarray_npy::{read_npy, write_npy, WritableElement};
use std::path::{Path, PathBuf};

use crate::error::{LandmarkError, Result};

/// Filename token of image files
pub const IMAGE_TOKEN: &str = "img";

/// Filename token of keypoint files
pub const KEYPOINTS_TOKEN: &str = "keypoints";

/// Array file extension
pub const NPY_EXTENSION: &str = "npy";

/// Image file name for a sample index
pub fn image_file_name(index: usize) -> String {
    format!("{}_{}.{}", IMAGE_TOKEN, index, NPY_EXTENSION)
}

/// Keypoint file name for a sample index
pub fn keypoints_file_name(index: usize) -> String {
    format!("{}_{}.{}", KEYPOINTS_TOKEN, index, NPY_EXTENSION)
}

/// Parse the sample index out of an `img_<i>.npy` file name
pub fn parse_image_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(IMAGE_TOKEN)?
        .strip_prefix('_')?
        .strip_suffix(NPY_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Paired keypoint file name for an image file name
pub fn paired_keypoints_name(image_file_name: &str) -> String {
    image_file_name.replacen(IMAGE_TOKEN, KEYPOINTS_TOKEN, 1)
}

/// One loaded sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel grid
    pub image: ArrayD<f32>,
    /// Keypoint coordinates
    pub keypoints: ArrayD<f32>,
}

impl Sample {
    /// Load the image and keypoint files of a sample
    pub fn load(image_path: &Path, keypoints_path: &Path) -> Result<Self> {
        Ok(Self {
            image: load_array(image_path)?,
            keypoints: load_array(keypoints_path)?,
        })
    }

    /// Image dimensions
    pub fn image_shape(&self) -> &[usize] {
        self.image.shape()
    }

    /// Number of keypoint dimensions
    pub fn keypoints_ndim(&self) -> usize {
        self.keypoints.ndim()
    }
}

/// Read an `f32` array of any dimensionality
pub fn load_array(path: &Path) -> Result<ArrayD<f32>> {
    if !path.is_file() {
        return Err(LandmarkError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "sample file is missing"),
        ));
    }
    read_npy(path).map_err(|e| LandmarkError::Npy {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write an array as `.npy`
pub fn save_array<A, D>(path: &Path, array: &ndarray::Array<A, D>) -> Result<()>
where
    A: WritableElement,
    D: ndarray::Dimension,
{
    write_npy(path, array).map_err(|e| LandmarkError::Npy {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Image and keypoint paths for a sample index inside `dir`
pub fn sample_paths(dir: &Path, index: usize) -> (PathBuf, PathBuf) {
    (dir.join(image_file_name(index)), dir.join(keypoints_file_name(index)))
}
