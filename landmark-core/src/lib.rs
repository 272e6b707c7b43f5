//! Landmark Core - facial keypoints shard descriptor
//!
//! This crate plugs the facial keypoints dataset into a federated
//! training envoy:
//! - Fetching the raw archive from the data host
//! - Converting the CSV table into per-sample `.npy` files
//! - Integrity checking of the converted data
//! - Per-rank partitioning of the samples

pub mod config;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod storage;
#[cfg(feature = "python")]
pub mod python_api;

pub use config::{DescriptorConfig, RankWorldSize};
pub use data::{Sample, ShardDataset};
pub use descriptor::{DatasetType, LandmarkShardDescriptor, ShardDatasetView, ShardDescriptor};
pub use error::LandmarkError;
