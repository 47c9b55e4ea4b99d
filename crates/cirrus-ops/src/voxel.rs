use std::collections::HashMap;

use glam::DVec3;
use thiserror::Error;

use cirrus_cloud::point::{bounds, Point};

use crate::execute::{DispatchError, ExecuteExt, ExecutionStrategy};

/// Key of one cell of a uniform voxel grid.
pub type CellKey = [i64; 3];

/// Errors from voxel grid construction and aggregation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoxelGridError {
    /// The requested resolution is not a positive finite number.
    #[error("voxel resolution must be positive, got {0}")]
    InvalidResolution(f64),

    /// The grid origin (supplied, or derived from the input bounds) is not
    /// finite.
    #[error("voxel grid origin is not finite")]
    MalformedBounds,

    /// The per-cell dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// A uniform 3D grid that buckets points into cells by position.
///
/// Two points share a cell iff their positions, shifted by the grid origin
/// and divided by the resolution, floor to the same integer triple.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    resolution: f64,
    origin: DVec3,
    cells: HashMap<CellKey, Vec<Point>>,
}

impl VoxelGrid {
    /// Bucket `points` into a grid of the given resolution.
    ///
    /// The origin defaults to the minimum bound of `points`, which makes
    /// cell keys deterministic for a given input and resolution. Pass a
    /// fixed `origin` to keep keys comparable across calls.
    pub fn from_points(
        points: &[Point],
        resolution: f64,
        origin: Option<DVec3>,
    ) -> Result<Self, VoxelGridError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(VoxelGridError::InvalidResolution(resolution));
        }

        let origin = match origin {
            Some(origin) => origin,
            None => bounds(points).map_or(DVec3::ZERO, |(min, _)| min),
        };
        if !origin.is_finite() {
            return Err(VoxelGridError::MalformedBounds);
        }

        let mut grid = Self {
            resolution,
            origin,
            cells: HashMap::new(),
        };
        for point in points {
            let key = grid.cell_key(point.position());
            grid.cells.entry(key).or_default().push(point.clone());
        }
        Ok(grid)
    }

    /// Compute the cell key for a position.
    pub fn cell_key(&self, position: DVec3) -> CellKey {
        let scaled = (position - self.origin) / self.resolution;
        [
            scaled.x.floor() as i64,
            scaled.y.floor() as i64,
            scaled.z.floor() as i64,
        ]
    }

    /// Get the grid resolution (cell edge length).
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Get the grid origin.
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Number of occupied cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The points bucketed into the given cell, if occupied.
    pub fn cell(&self, key: &CellKey) -> Option<&[Point]> {
        self.cells.get(key).map(Vec::as_slice)
    }

    /// Iterate over all occupied cells, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellKey, &[Point])> {
        self.cells
            .iter()
            .map(|(key, members)| (key, members.as_slice()))
    }

    /// Reduce every sufficiently occupied cell to one representative point.
    ///
    /// Cells with fewer than `min_points` members are dropped entirely. The
    /// retained cells are processed in ascending key order, each through the
    /// `geometry` callback and then the `properties` callback, so the output
    /// is identical under serial and parallel execution. An empty grid
    /// yields an empty output.
    pub fn aggregate<G, P>(
        &self,
        min_points: usize,
        geometry: G,
        properties: P,
        strategy: ExecutionStrategy,
    ) -> Result<Vec<Point>, VoxelGridError>
    where
        G: Fn(&[Point]) -> Point + Send + Sync,
        P: Fn(&mut Point, &[Point]) + Send + Sync,
    {
        let mut retained: Vec<(&CellKey, &[Point])> = self
            .cells
            .iter()
            .filter(|(_, members)| members.len() >= min_points)
            .map(|(key, members)| (key, members.as_slice()))
            .collect();
        retained.sort_unstable_by_key(|(key, _)| **key);

        log::debug!(
            "aggregating {} of {} cells (min occupancy {})",
            retained.len(),
            self.cells.len(),
            min_points
        );

        let mut output = vec![Point::default(); retained.len()];
        retained.execute_with(strategy, &mut output, |&(_, members), out| {
            *out = geometry(members);
            properties(out, members);
        })?;
        Ok(output)
    }
}
