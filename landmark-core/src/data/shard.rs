//! Per-rank view over the sample directory
//!
//! Selects this rank's samples by stride slicing and shuffles them.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::partition::Partition;
use super::sample::{paired_keypoints_name, parse_image_index, Sample};
use crate::config::RankWorldSize;
use crate::error::{LandmarkError, Result};

/// Image file of one retained sample
#[derive(Debug, Clone)]
struct SampleEntry {
    index: usize,
    file_name: String,
}

/// Partition view of the dataset for one rank
#[derive(Debug, Clone)]
pub struct ShardDataset {
    dataset_dir: PathBuf,
    entries: Vec<SampleEntry>,
}

impl ShardDataset {
    /// Open the view with a non-seeded shuffle
    pub fn new(dataset_dir: impl Into<PathBuf>, spec: RankWorldSize) -> Result<Self> {
        Self::with_rng(dataset_dir, spec, &mut rand::thread_rng())
    }

    /// Open the view with a reproducible shuffle
    pub fn with_seed(dataset_dir: impl Into<PathBuf>, spec: RankWorldSize, seed: u64) -> Result<Self> {
        Self::with_rng(dataset_dir, spec, &mut StdRng::seed_from_u64(seed))
    }

    fn with_rng<R: Rng + ?Sized>(
        dataset_dir: impl Into<PathBuf>,
        spec: RankWorldSize,
        rng: &mut R,
    ) -> Result<Self> {
        let dataset_dir = dataset_dir.into();
        let partition = Partition::new(spec);

        let all = list_image_files(&dataset_dir)?;
        let total = all.len();
        let mut entries = partition.select(all);
        entries.shuffle(rng);

        debug!(
            "Shard {}/{} holds {} of {} samples in {}",
            spec.rank(),
            spec.world_size(),
            entries.len(),
            total,
            dataset_dir.display()
        );

        Ok(Self { dataset_dir, entries })
    }

    /// Number of samples in this shard
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the shard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the sample at `index` in shuffled order
    pub fn get(&self, index: usize) -> Result<Sample> {
        let entry = self.entries.get(index).ok_or(LandmarkError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;

        let image_path = self.dataset_dir.join(&entry.file_name);
        let keypoints_path = self.dataset_dir.join(paired_keypoints_name(&entry.file_name));
        Sample::load(&image_path, &keypoints_path)
    }

    /// Sample indices in iteration order
    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.index).collect()
    }

    /// Iterate samples in iteration order
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}

/// All `img_<i>.npy` files in `dir`, ordered by index
fn list_image_files(dir: &Path) -> Result<Vec<SampleEntry>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| LandmarkError::io(dir, e))?;

    let mut entries = Vec::new();
    for dirent in read_dir {
        let dirent = dirent.map_err(|e| LandmarkError::io(dir, e))?;
        let file_name = dirent.file_name().to_string_lossy().into_owned();
        if let Some(index) = parse_image_index(&file_name) {
            entries.push(SampleEntry { index, file_name });
        }
    }

    entries.sort_by_key(|e| e.index);
    Ok(entries)
}
