//! Envoy-side descriptor check
//!
//! Loads the descriptor the way an envoy would, makes sure the data is in
//! place, and walks this rank's shard once.

use landmark_core::config::{DescriptorConfig, EnvoyConfig};
use landmark_core::{DatasetType, LandmarkShardDescriptor, ShardDescriptor};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<DescriptorConfig, Box<dyn std::error::Error>> {
    let config_path = std::env::var("ENVOY_CONFIG").unwrap_or_else(|_| "envoy_config.yaml".into());

    let mut config = if Path::new(&config_path).is_file() {
        info!("Loading envoy configuration from {}", config_path);
        EnvoyConfig::from_yaml_file(&config_path)?.shard_descriptor.params
    } else {
        warn!("{} not found, using defaults", config_path);
        DescriptorConfig::default()
    };

    if let Ok(folder) = std::env::var("DATA_FOLDER") {
        config.data_folder = folder;
    }
    if let Ok(rank_worldsize) = std::env::var("RANK_WORLDSIZE") {
        config.rank_worldsize = rank_worldsize;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let descriptor = match LandmarkShardDescriptor::open(&config) {
        Ok(descriptor) => descriptor,
        Err(e) if e.is_corruption() => {
            error!(
                "Dataset in {} is unusable, remove the folder to force a fresh download: {}",
                config.data_folder, e
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("{}", descriptor.dataset_description());
    info!(
        "Sample shape [{}], target shape {}",
        descriptor.sample_shape().join(", "),
        descriptor.target_shape()
    );

    let dataset = descriptor.get_dataset(DatasetType::Train)?;
    let mut sums: Vec<f64> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();

    for sample in dataset.iter() {
        let sample = sample?;
        if sums.is_empty() {
            sums = vec![0.0; sample.keypoints.len()];
            counts = vec![0; sample.keypoints.len()];
        }
        for (i, &v) in sample.keypoints.iter().enumerate().take(sums.len()) {
            if !v.is_nan() {
                sums[i] += f64::from(v);
                counts[i] += 1;
            }
        }
    }

    let means: Vec<String> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c == 0 { "nan".to_string() } else { format!("{:.2}", s / c as f64) })
        .collect();
    info!("Walked {} samples; keypoint means [{}]", dataset.len(), means.join(", "));

    Ok(())
}
