//! End-to-end tests for the shard descriptor
//!
//! Runs fetch → extract → convert → seal against an offline source and
//! checks caching, sharding and shape probing.

mod common;

use std::collections::BTreeSet;

use landmark_core::data::sample::{image_file_name, keypoints_file_name, save_array};
use landmark_core::data::{Availability, DatasetStore};
use landmark_core::manifest::{file_md5, DatasetManifest, MANIFEST_FILE};
use landmark_core::{
    DatasetType, DescriptorConfig, LandmarkError, LandmarkShardDescriptor, ShardDatasetView,
    ShardDescriptor,
};
use ndarray::{Array1, Array2};

use common::{keypoint_table, FakeSource, NoFetch};

fn config_for(dir: &std::path::Path, rank_worldsize: &str) -> DescriptorConfig {
    DescriptorConfig::new(dir.to_string_lossy().into_owned(), rank_worldsize)
}

#[test]
fn test_first_start_fetches_and_seals() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(6));

    let descriptor = LandmarkShardDescriptor::new(&config_for(&data, "1,1"), &source).unwrap();

    assert_eq!(source.fetches(), 1);
    assert_eq!(descriptor.availability(), Availability::Refreshed { samples: 6 });
    assert!(data.join(MANIFEST_FILE).is_file());
    assert!(!data.join("training.zip").exists());
    assert!(!data.join("training.csv").exists());
    assert_eq!(descriptor.sample_shape(), &["96".to_string(), "96".to_string()]);
    assert_eq!(descriptor.target_shape(), "1");
    assert_eq!(
        descriptor.dataset_description(),
        "Facial keypoints dataset, shard number 1 out of 1"
    );
}

#[test]
fn test_second_start_uses_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(4));
    let config = config_for(&data, "1,2");

    LandmarkShardDescriptor::new(&config, &source).unwrap();
    let again = LandmarkShardDescriptor::new(&config, &source).unwrap();

    assert_eq!(source.fetches(), 1);
    assert_eq!(again.availability(), Availability::CacheHit);

    let store = DatasetStore::new(&data);
    assert_eq!(store.ensure_available(&source).unwrap(), Availability::CacheHit);
    assert_eq!(source.fetches(), 1);
}

#[test]
fn test_corruption_forces_refetch() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(3));
    let config = config_for(&data, "1,1");

    LandmarkShardDescriptor::new(&config, &source).unwrap();

    let victim = data.join(image_file_name(1));
    let mut bytes = std::fs::read(&victim).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&victim, bytes).unwrap();

    let descriptor = LandmarkShardDescriptor::new(&config, &source).unwrap();
    assert_eq!(source.fetches(), 2);
    assert_eq!(descriptor.availability(), Availability::Refreshed { samples: 3 });
    assert!(DatasetStore::new(&data).verify().unwrap());
}

#[test]
fn test_missing_manifest_forces_refetch_and_clears_partial_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(2));
    let config = config_for(&data, "1,1");

    LandmarkShardDescriptor::new(&config, &source).unwrap();
    std::fs::remove_file(data.join(MANIFEST_FILE)).unwrap();
    std::fs::create_dir(data.join("train")).unwrap();
    std::fs::write(data.join("train").join("leftover"), b"x").unwrap();

    LandmarkShardDescriptor::new(&config, &source).unwrap();
    assert_eq!(source.fetches(), 2);
    assert!(!data.join("train").exists());
}

#[test]
fn test_ranks_partition_the_samples() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(5));

    let mut seen = BTreeSet::new();
    let mut sizes = Vec::new();
    for rank in 1..=2 {
        let descriptor =
            LandmarkShardDescriptor::new(&config_for(&data, &format!("{},2", rank)), &source).unwrap();
        let dataset = descriptor.get_dataset(DatasetType::Train).unwrap();
        sizes.push(ShardDatasetView::len(&dataset));
        for idx in dataset.indices() {
            assert!(seen.insert(idx));
        }
    }

    assert_eq!(source.fetches(), 1);
    assert_eq!(sizes, vec![3, 2]);
    assert_eq!(seen, (0..5).collect::<BTreeSet<_>>());
}

#[test]
fn test_samples_pair_images_with_their_keypoints() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(7));
    let descriptor = LandmarkShardDescriptor::new(&config_for(&data, "2,3"), &source).unwrap();

    let dataset = descriptor.get_dataset(DatasetType::Train).unwrap();
    let indices = dataset.indices();
    assert_eq!(indices.len(), 2);

    for (pos, &idx) in indices.iter().enumerate() {
        let sample = dataset.get(pos).unwrap();
        let first_pixel = sample.image.iter().next().copied().unwrap();
        let first_keypoint = sample.keypoints.iter().next().copied().unwrap();
        assert_eq!(first_pixel, idx as f32);
        assert_eq!(first_keypoint, idx as f32);
    }
}

#[test]
fn test_dataset_type_does_not_change_partition() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(9));
    let descriptor = LandmarkShardDescriptor::new(&config_for(&data, "1,3"), &source).unwrap();

    let sorted = |t: DatasetType| {
        let mut v = descriptor.get_dataset(t).unwrap().indices();
        v.sort();
        v
    };
    assert_eq!(sorted(DatasetType::Train), vec![0, 3, 6]);
    assert_eq!(sorted(DatasetType::Val), vec![0, 3, 6]);
    assert_eq!(sorted(DatasetType::Test), vec![0, 3, 6]);
}

#[test]
fn test_two_dimensional_target_fails_construction() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir(&data).unwrap();

    save_array(&data.join(image_file_name(0)), &Array2::<f32>::zeros((96, 96))).unwrap();
    save_array(&data.join(keypoints_file_name(0)), &Array2::<f32>::zeros((15, 2))).unwrap();
    DatasetManifest::compute(&data).unwrap().save(&data).unwrap();

    let err = LandmarkShardDescriptor::new(&config_for(&data, "1,1"), &NoFetch).unwrap_err();
    assert!(matches!(err, LandmarkError::TargetShape { ndim: 2 }));
    assert!(err.is_corruption());
}

#[test]
fn test_folder_sealed_by_python_envoy_is_a_cache_hit() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir(&data).unwrap();

    let image = data.join(image_file_name(0));
    let keypoints = data.join(keypoints_file_name(0));
    save_array(&image, &Array2::<f32>::zeros((96, 96))).unwrap();
    save_array(&keypoints, &Array1::<f32>::zeros(30)).unwrap();

    let sealed = format!(
        r#"{{"./{}": "{}", "./{}": "{}"}}"#,
        image_file_name(0),
        file_md5(&image).unwrap(),
        keypoints_file_name(0),
        file_md5(&keypoints).unwrap()
    );
    std::fs::write(data.join(MANIFEST_FILE), sealed).unwrap();

    let descriptor = LandmarkShardDescriptor::new(&config_for(&data, "1,1"), &NoFetch).unwrap();
    assert_eq!(descriptor.availability(), Availability::CacheHit);
    assert_eq!(descriptor.sample_shape(), &["96".to_string(), "96".to_string()]);
}

#[test]
fn test_missing_keypoint_file_surfaces_on_access() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir(&data).unwrap();

    save_array(&data.join(image_file_name(0)), &Array2::<f32>::zeros((96, 96))).unwrap();
    save_array(&data.join(keypoints_file_name(0)), &Array1::<f32>::zeros(30)).unwrap();
    save_array(&data.join(image_file_name(1)), &Array2::<f32>::zeros((96, 96))).unwrap();
    DatasetManifest::compute(&data).unwrap().save(&data).unwrap();

    let descriptor = LandmarkShardDescriptor::new(&config_for(&data, "1,2"), &NoFetch).unwrap();
    assert_eq!(descriptor.target_shape(), "1");

    let rank2 = LandmarkShardDescriptor::new(&config_for(&data, "2,2"), &NoFetch);
    assert!(matches!(rank2, Err(LandmarkError::Io { .. })));
}

#[test]
fn test_empty_shard_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(2));

    let err = LandmarkShardDescriptor::new(&config_for(&data, "3,3"), &source).unwrap_err();
    assert!(matches!(err, LandmarkError::DatasetEmpty { rank: 3, world_size: 3 }));
}

#[test]
fn test_bad_rank_spec_fails_before_fetch() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let source = FakeSource::new(keypoint_table(2));

    let err = LandmarkShardDescriptor::new(&config_for(&data, "0,2"), &source).unwrap_err();
    assert!(matches!(err, LandmarkError::InvalidShardSpec { .. }));
    assert_eq!(source.fetches(), 0);
    assert!(!data.exists());
}

#[test]
fn test_fetch_failure_propagates() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");

    let err = LandmarkShardDescriptor::new(&config_for(&data, "1,1"), &NoFetch).unwrap_err();
    assert!(matches!(err, LandmarkError::StorageError { .. }));
    assert!(!err.is_corruption());
}
