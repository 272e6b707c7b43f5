//! Shard descriptor for the facial keypoints dataset
//!
//! The descriptor is what a federated training envoy loads: it makes sure
//! the dataset is on disk, reads sample and target shapes once, and hands
//! out per-rank dataset views on request.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::config::{DescriptorConfig, RankWorldSize};
use crate::data::{Availability, DatasetStore, Sample, ShardDataset};
use crate::error::{LandmarkError, Result};
use crate::storage::{ArchiveSource, KaggleConfig, KaggleSource};

/// Indexable dataset handed to the training framework
pub trait ShardDatasetView {
    /// Number of samples
    fn len(&self) -> usize;

    /// Load one sample
    fn get(&self, index: usize) -> Result<Sample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Contract between a dataset adapter and the training framework
pub trait ShardDescriptor {
    type Dataset: ShardDatasetView;

    /// Dataset view for a split
    fn get_dataset(&self, dataset_type: DatasetType) -> Result<Self::Dataset>;

    /// Sample dimensions as strings
    fn sample_shape(&self) -> &[String];

    /// Target dimensionality as a string
    fn target_shape(&self) -> &str;

    /// Human-readable description
    fn dataset_description(&self) -> String;
}

impl ShardDatasetView for ShardDataset {
    fn len(&self) -> usize {
        ShardDataset::len(self)
    }

    fn get(&self, index: usize) -> Result<Sample> {
        ShardDataset::get(self, index)
    }
}

/// Dataset split requested by the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetType {
    #[default]
    Train,
    Val,
    Test,
}

impl FromStr for DatasetType {
    type Err = LandmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(DatasetType::Train),
            "val" | "valid" | "validation" => Ok(DatasetType::Val),
            "test" => Ok(DatasetType::Test),
            other => Err(LandmarkError::InvalidConfig {
                reason: format!("unknown dataset type {:?}", other),
            }),
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetType::Train => "train",
            DatasetType::Val => "val",
            DatasetType::Test => "test",
        };
        f.write_str(name)
    }
}

/// Facial keypoints shard descriptor
#[derive(Debug, Clone)]
pub struct LandmarkShardDescriptor {
    data_folder: PathBuf,
    spec: RankWorldSize,
    sample_shape: Vec<String>,
    target_shape: String,
    availability: Availability,
}

impl LandmarkShardDescriptor {
    /// Build a descriptor backed by the Kaggle API, configured from the environment
    pub fn open(config: &DescriptorConfig) -> Result<Self> {
        let source = KaggleSource::new(KaggleConfig::from_env()?)?;
        Self::new(config, &source)
    }

    /// Build a descriptor, fetching data from `source` if the cache is invalid
    pub fn new<S: ArchiveSource + ?Sized>(config: &DescriptorConfig, source: &S) -> Result<Self> {
        let spec = config.rank_worldsize()?;
        let data_folder = config.resolve_data_folder()?;

        let availability = DatasetStore::new(&data_folder).ensure_available(source)?;

        let shard = ShardDataset::new(&data_folder, spec)?;
        if shard.is_empty() {
            return Err(LandmarkError::DatasetEmpty {
                rank: spec.rank(),
                world_size: spec.world_size(),
            });
        }
        let sample = shard.get(0)?;

        if sample.keypoints_ndim() != 1 {
            return Err(LandmarkError::TargetShape {
                ndim: sample.keypoints_ndim(),
            });
        }

        let sample_shape = sample.image_shape().iter().map(|d| d.to_string()).collect();
        let target_shape = sample.keypoints_ndim().to_string();

        info!(
            "Shard {} of {} ready in {}: {} samples",
            spec.rank(),
            spec.world_size(),
            data_folder.display(),
            shard.len()
        );

        Ok(Self {
            data_folder,
            spec,
            sample_shape,
            target_shape,
            availability,
        })
    }

    /// Resolved data directory
    pub fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    /// Rank and world size of this descriptor
    pub fn rank_worldsize(&self) -> RankWorldSize {
        self.spec
    }

    /// Whether construction used the cache or refreshed the data
    pub fn availability(&self) -> Availability {
        self.availability
    }
}

impl ShardDescriptor for LandmarkShardDescriptor {
    type Dataset = ShardDataset;

    /// Every split maps to the same training partition
    fn get_dataset(&self, _dataset_type: DatasetType) -> Result<ShardDataset> {
        ShardDataset::new(&self.data_folder, self.spec)
    }

    fn sample_shape(&self) -> &[String] {
        &self.sample_shape
    }

    fn target_shape(&self) -> &str {
        &self.target_shape
    }

    fn dataset_description(&self) -> String {
        format!(
            "Facial keypoints dataset, shard number {} out of {}",
            self.spec.rank(),
            self.spec.world_size()
        )
    }
}
