//! Deterministic sample partitioning
//!
//! Assigns sample positions to ranks by stride slicing: rank `r` of `W`
//! keeps positions `r-1, r-1+W, r-1+2W, ...`.

use std::collections::HashMap;
use std::num::NonZeroU32;
use tracing::debug;

use crate::config::RankWorldSize;

/// Stride partition for one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// 1-based rank
    rank: u32,
    /// Total number of ranks
    world_size: NonZeroU32,
}

impl Partition {
    /// Create a partition for a validated rank/world-size pair
    pub fn new(spec: RankWorldSize) -> Self {
        Self {
            rank: spec.rank(),
            world_size: spec.world_size_nonzero(),
        }
    }

    fn offset(&self) -> usize {
        (self.rank - 1) as usize
    }

    fn stride(&self) -> usize {
        self.world_size.get() as usize
    }

    /// Keep the items at this rank's positions, preserving their order
    pub fn select<T>(&self, items: Vec<T>) -> Vec<T> {
        let (offset, stride) = (self.offset(), self.stride());
        items
            .into_iter()
            .enumerate()
            .filter(|(pos, _)| *pos >= offset && (pos - offset) % stride == 0)
            .map(|(_, item)| item)
            .collect()
    }

    /// Positions owned by this rank in a set of `total` items
    pub fn indices(&self, total: usize) -> Vec<usize> {
        (self.offset()..total).step_by(self.stride()).collect()
    }

    /// Number of positions owned by this rank in a set of `total` items
    pub fn len_for(&self, total: usize) -> usize {
        let offset = self.offset();
        if total <= offset {
            0
        } else {
            (total - offset).div_ceil(self.stride())
        }
    }

    /// 1-based rank that owns `position` under `world_size` ranks
    pub fn owner_of(position: usize, world_size: NonZeroU32) -> u32 {
        (position % world_size.get() as usize) as u32 + 1
    }

    /// Positions of every rank for a set of `total` items, keyed by rank
    pub fn assign_all(total: usize, world_size: NonZeroU32) -> HashMap<u32, Vec<usize>> {
        let mut assignments: HashMap<u32, Vec<usize>> =
            (1..=world_size.get()).map(|rank| (rank, Vec::new())).collect();

        for position in 0..total {
            let owner = Self::owner_of(position, world_size);
            if let Some(owned) = assignments.get_mut(&owner) {
                owned.push(position);
            }
        }

        debug!("Assigned {} samples to {} ranks", total, world_size);
        assignments
    }
}
