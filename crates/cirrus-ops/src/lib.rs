#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Sequential and parallel dispatch over element collections.
pub mod execute;

/// Point cloud subsampling and ready-made aggregation policies.
pub mod subsample;

/// Nearest-in-time association of timestamped sequences.
pub mod temporal;

/// In-place transformation of point clouds.
pub mod transform;

/// Uniform voxel grid bucketing and per-cell aggregation.
pub mod voxel;
