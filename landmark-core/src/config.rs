//! Descriptor configuration
//!
//! Parameters arrive either programmatically or from an envoy YAML file
//! of the form:
//!
//! ```yaml
//! shard_descriptor:
//!   template: landmark_shard_descriptor.LandmarkShardDescriptor
//!   params:
//!     data_folder: landmark_data
//!     rank_worldsize: 1,2
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use crate::error::{LandmarkError, Result};

/// Default data folder, relative to the working directory
pub const DEFAULT_DATA_FOLDER: &str = "data";

/// Default rank/world-size string
pub const DEFAULT_RANK_WORLDSIZE: &str = "1, 1";

/// Position of this participant among all participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankWorldSize {
    rank: u32,
    world_size: NonZeroU32,
}

impl RankWorldSize {
    /// Create a validated rank/world-size pair
    pub fn new(rank: u32, world_size: u32) -> Result<Self> {
        let world_size = NonZeroU32::new(world_size).ok_or_else(|| LandmarkError::InvalidShardSpec {
            reason: "world size must be at least 1".into(),
        })?;
        if rank == 0 || rank > world_size.get() {
            return Err(LandmarkError::InvalidShardSpec {
                reason: format!("rank {} is outside 1..={}", rank, world_size),
            });
        }
        Ok(Self { rank, world_size })
    }

    /// 1-based rank
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Total number of participants
    pub fn world_size(&self) -> u32 {
        self.world_size.get()
    }

    /// Total number of participants, never zero
    pub fn world_size_nonzero(&self) -> NonZeroU32 {
        self.world_size
    }

    /// Parse a `"rank,worldsize"` string; whitespace around either number is allowed
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(LandmarkError::InvalidShardSpec {
                reason: format!("expected \"rank,worldsize\", got {:?}", spec),
            });
        }

        let parse_part = |part: &str, what: &str| -> Result<u32> {
            part.parse::<u32>().map_err(|e| LandmarkError::InvalidShardSpec {
                reason: format!("{} {:?} is not a non-negative integer: {}", what, part, e),
            })
        };

        let rank = parse_part(parts[0], "rank")?;
        let world_size = parse_part(parts[1], "world size")?;
        Self::new(rank, world_size)
    }
}

impl fmt::Display for RankWorldSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.rank, self.world_size)
    }
}

/// Constructor parameters for the shard descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorConfig {
    /// Data directory; relative paths resolve against the working directory
    #[serde(default = "default_data_folder")]
    pub data_folder: String,
    /// `"rank,worldsize"` string
    #[serde(default = "default_rank_worldsize")]
    pub rank_worldsize: String,
    /// Extra parameters, accepted and ignored
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_data_folder() -> String {
    DEFAULT_DATA_FOLDER.into()
}

fn default_rank_worldsize() -> String {
    DEFAULT_RANK_WORLDSIZE.into()
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            rank_worldsize: default_rank_worldsize(),
            extra: BTreeMap::new(),
        }
    }
}

impl DescriptorConfig {
    /// Create a configuration for a data folder and rank/world-size string
    pub fn new(data_folder: impl Into<String>, rank_worldsize: impl Into<String>) -> Self {
        Self {
            data_folder: data_folder.into(),
            rank_worldsize: rank_worldsize.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Parse the rank/world-size string
    pub fn rank_worldsize(&self) -> Result<RankWorldSize> {
        RankWorldSize::parse(&self.rank_worldsize)
    }

    /// Resolve the data folder against the current working directory
    pub fn resolve_data_folder(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| LandmarkError::io(".", e))?;
        Ok(cwd.join(&self.data_folder))
    }
}

/// Shard descriptor section of an envoy configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardDescriptorSection {
    /// Descriptor class path, informational only
    #[serde(default)]
    pub template: Option<String>,
    /// Constructor parameters
    #[serde(default)]
    pub params: DescriptorConfig,
}

/// Envoy configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvoyConfig {
    pub shard_descriptor: ShardDescriptorSection,
    /// Remaining top-level sections, accepted and ignored
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl EnvoyConfig {
    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| LandmarkError::InvalidConfig {
            reason: format!("YAML parse failed: {}", e),
        })
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LandmarkError::io(path, e))?;
        Self::from_yaml(&text)
    }
}
