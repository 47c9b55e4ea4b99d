#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Point cloud container backed by a spatial index.
pub mod cloud;

/// Spatial index abstraction and implementations.
pub mod index;

/// Point value type and typed properties.
pub mod point;
