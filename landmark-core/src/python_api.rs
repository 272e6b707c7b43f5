use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::DescriptorConfig;
use crate::data::{Sample, ShardDataset};
use crate::descriptor::{DatasetType, LandmarkShardDescriptor, ShardDescriptor};
use crate::error::LandmarkError;

fn to_py_err(e: LandmarkError) -> PyErr {
    match e {
        LandmarkError::IndexOutOfRange { .. } => pyo3::exceptions::PyIndexError::new_err(e.to_string()),
        LandmarkError::TargetShape { .. } => pyo3::exceptions::PyAssertionError::new_err(e.to_string()),
        _ => pyo3::exceptions::PyRuntimeError::new_err(e.to_string()),
    }
}

/// Flat values and shape of an array
type PyArray = (Vec<f32>, Vec<usize>);

fn sample_to_py(sample: Sample) -> (PyArray, PyArray) {
    let image_shape = sample.image.shape().to_vec();
    let keypoints_shape = sample.keypoints.shape().to_vec();
    (
        (sample.image.iter().copied().collect(), image_shape),
        (sample.keypoints.iter().copied().collect(), keypoints_shape),
    )
}

#[pyclass(name = "LandmarkShardDescriptor")]
struct PyShardDescriptor {
    inner: LandmarkShardDescriptor,
}

#[pymethods]
impl PyShardDescriptor {
    #[new]
    #[pyo3(signature = (data_folder = "data".to_string(), rank_worldsize = "1, 1".to_string(), **_kwargs))]
    fn new(data_folder: String, rank_worldsize: String, _kwargs: Option<&PyDict>) -> PyResult<Self> {
        let config = DescriptorConfig::new(data_folder, rank_worldsize);
        let inner = LandmarkShardDescriptor::open(&config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[pyo3(signature = (dataset_type = "train".to_string()))]
    fn get_dataset(&self, dataset_type: String) -> PyResult<PyShardDataset> {
        let dataset_type = dataset_type.parse::<DatasetType>().unwrap_or_default();
        let inner = self.inner.get_dataset(dataset_type).map_err(to_py_err)?;
        Ok(PyShardDataset { inner })
    }

    #[getter]
    fn sample_shape(&self) -> Vec<String> {
        self.inner.sample_shape().to_vec()
    }

    #[getter]
    fn target_shape(&self) -> String {
        self.inner.target_shape().to_string()
    }

    #[getter]
    fn dataset_description(&self) -> String {
        self.inner.dataset_description()
    }
}

#[pyclass(name = "LandmarkShardDataset")]
struct PyShardDataset {
    inner: ShardDataset,
}

#[pymethods]
impl PyShardDataset {
    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Returns `((image_values, image_shape), (keypoint_values, keypoint_shape))`
    fn __getitem__(&self, index: usize) -> PyResult<(PyArray, PyArray)> {
        self.inner.get(index).map(sample_to_py).map_err(to_py_err)
    }
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn landmark_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyShardDescriptor>()?;
    m.add_class::<PyShardDataset>()?;
    Ok(())
}
