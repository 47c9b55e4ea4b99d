use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use cirrus_cloud::cloud::PointCloud;
use cirrus_cloud::index::{BruteForceIndex, SpatialIndex};
use cirrus_cloud::point::{Point, PropertyValue};

use crate::execute::ExecutionStrategy;
use crate::voxel::{VoxelGrid, VoxelGridError};

/// Reduces the points of one grid cell to a representative point.
pub type GeometryAggregator = Arc<dyn Fn(&[Point]) -> Point + Send + Sync>;

/// Enriches a representative point from the cell members it replaces.
pub type PropertyAggregator = Arc<dyn Fn(&mut Point, &[Point]) + Send + Sync>;

/// Produces the spatial index backing a subsampled cloud.
pub type IndexFactory = Arc<dyn Fn() -> Box<dyn SpatialIndex> + Send + Sync>;

/// Configuration of one subsampling run.
///
/// Built with [`SubsampleConfig::new`]; every other field starts at its
/// default (keep every cell, derive the origin from the input bounds,
/// centroid geometry, no property aggregation, serial execution,
/// brute-force output index) and can be overridden in place.
pub struct SubsampleConfig {
    /// Cell edge length of the voxel grid. Must be positive.
    pub resolution: f64,
    /// Minimum number of points a cell needs to be retained.
    pub min_points_per_cell: usize,
    /// Fixed grid origin; derived from the input bounds when `None`.
    pub origin: Option<DVec3>,
    /// How per-cell aggregation is dispatched.
    pub strategy: ExecutionStrategy,
    /// Reduces each cell's members to one representative point.
    pub geometry: GeometryAggregator,
    /// Post-processes the representative point from the cell members.
    pub properties: PropertyAggregator,
    /// Produces the index backing the output cloud.
    pub index: IndexFactory,
}

impl SubsampleConfig {
    /// Create a configuration with the given resolution and defaults for
    /// everything else.
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            min_points_per_cell: 0,
            origin: None,
            strategy: ExecutionStrategy::Serial,
            geometry: Arc::new(centroid),
            properties: Arc::new(|_, _| {}),
            index: Arc::new(|| Box::new(BruteForceIndex::new()) as Box<dyn SpatialIndex>),
        }
    }
}

impl fmt::Debug for SubsampleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsampleConfig")
            .field("resolution", &self.resolution)
            .field("min_points_per_cell", &self.min_points_per_cell)
            .field("origin", &self.origin)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Subsample a point cloud on a uniform voxel grid.
///
/// Builds a grid at `config.resolution`, reduces every cell with at least
/// `config.min_points_per_cell` members to one representative point, and
/// returns the result as a new cloud backed by a fresh index from
/// `config.index`. The input cloud is never mutated. An empty input yields
/// an empty output, not an error.
///
/// # Arguments
///
/// * `cloud` - The input point cloud.
/// * `config` - Resolution, occupancy threshold, aggregation callbacks,
///   execution strategy and output index backend.
///
/// # Returns
///
/// A new point cloud with one point per retained cell.
///
/// Example:
///
/// ```
/// use cirrus_cloud::cloud::PointCloud;
/// use cirrus_cloud::point::Point;
/// use cirrus_ops::subsample::{subsample, SubsampleConfig};
/// use glam::DVec3;
///
/// let cloud = PointCloud::from_points(vec![
///     Point::new(DVec3::new(0.0, 0.0, 0.0)),
///     Point::new(DVec3::new(0.4, 0.0, 0.0)),
///     Point::new(DVec3::new(6.0, 6.0, 6.0)),
/// ]);
/// let reduced = subsample(&cloud, &SubsampleConfig::new(1.0)).unwrap();
/// assert_eq!(reduced.len(), 2);
/// ```
pub fn subsample(
    cloud: &PointCloud,
    config: &SubsampleConfig,
) -> Result<PointCloud, VoxelGridError> {
    let grid = VoxelGrid::from_points(cloud.points(), config.resolution, config.origin)?;
    let points = grid.aggregate(
        config.min_points_per_cell,
        config.geometry.as_ref(),
        config.properties.as_ref(),
        config.strategy,
    )?;

    log::debug!("subsampled {} points into {}", cloud.len(), points.len());

    Ok(PointCloud::new(points, (config.index)()))
}

/// Default geometry aggregation: arithmetic mean of the member positions,
/// no normal, no properties.
///
/// PRECONDITION: `members` is non-empty (voxel cells are, by construction).
pub fn centroid(members: &[Point]) -> Point {
    let sum = members
        .iter()
        .fold(DVec3::ZERO, |acc, point| acc + point.position());
    Point::new(sum / members.len() as f64)
}

/// Property aggregation that averages the members' normals.
///
/// The mean normal is renormalized when it has nonzero length; the output
/// point is left untouched when no member carries a normal.
pub fn average_normals(out: &mut Point, members: &[Point]) {
    let normals: Vec<DVec3> = members.iter().filter_map(Point::normal).collect();
    if normals.is_empty() {
        return;
    }

    let mean = normals.iter().fold(DVec3::ZERO, |acc, n| acc + *n) / normals.len() as f64;
    let length = mean.length();
    if length > 0.0 {
        out.set_normal(Some(mean / length));
    } else {
        out.set_normal(Some(mean));
    }
}

/// Build a property aggregation that averages the named property.
///
/// The kind is taken from the first member carrying `key`; members holding
/// a different kind under the same key are ignored. Scalars and vectors are
/// averaged arithmetically; colors are averaged per channel and rounded.
pub fn mean_property(key: impl Into<String>) -> PropertyAggregator {
    let key = key.into();
    Arc::new(move |out, members| {
        let values: Vec<&PropertyValue> = members
            .iter()
            .filter_map(|point| point.property(&key))
            .collect();
        let first = match values.first() {
            Some(first) => *first,
            None => return,
        };

        let aggregated = match first {
            PropertyValue::Scalar(_) => {
                let scalars: Vec<f64> = values.iter().filter_map(|v| v.as_scalar()).collect();
                PropertyValue::Scalar(scalars.iter().sum::<f64>() / scalars.len() as f64)
            }
            PropertyValue::Color(_) => {
                let colors: Vec<[u8; 3]> = values.iter().filter_map(|v| v.as_color()).collect();
                let sum = colors.iter().fold([0u64; 3], |acc, c| {
                    [
                        acc[0] + c[0] as u64,
                        acc[1] + c[1] as u64,
                        acc[2] + c[2] as u64,
                    ]
                });
                let count = colors.len() as f64;
                PropertyValue::Color([
                    (sum[0] as f64 / count).round() as u8,
                    (sum[1] as f64 / count).round() as u8,
                    (sum[2] as f64 / count).round() as u8,
                ])
            }
            PropertyValue::Vector(_) => {
                let vectors: Vec<DVec3> = values.iter().filter_map(|v| v.as_vector()).collect();
                let sum = vectors.iter().fold(DVec3::ZERO, |acc, v| acc + *v);
                PropertyValue::Vector(sum / vectors.len() as f64)
            }
        };
        out.set_property(key.clone(), aggregated);
    })
}
