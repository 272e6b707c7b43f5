//! Dataset pipeline
//!
//! Conversion of the raw table into sample files, the on-disk cache,
//! and per-rank partition views.

pub mod convert;
pub mod partition;
pub mod sample;
pub mod shard;
pub mod store;

pub use convert::{convert_csv, ConversionSummary};
pub use partition::Partition;
pub use sample::Sample;
pub use shard::ShardDataset;
pub use store::{Availability, DatasetStore};
