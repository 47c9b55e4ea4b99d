use glam::DVec3;

use crate::index::{BruteForceIndex, Neighbor, SpatialIndex};
use crate::point::{bounds, Point};

/// An ordered collection of points backed by a spatial index.
///
/// The backing index always reflects the current point set: construction and
/// [`PointCloud::push`] feed it directly, and bulk mutation through
/// [`PointCloud::update_points`] rebuilds it before control returns to the
/// caller. There is no way to mutate the points without the index following.
#[derive(Debug, Clone)]
pub struct PointCloud {
    points: Vec<Point>,
    index: Box<dyn SpatialIndex>,
}

impl PointCloud {
    /// Create a point cloud backed by the given index.
    ///
    /// The index is cleared and repopulated from `points`.
    pub fn new(points: Vec<Point>, mut index: Box<dyn SpatialIndex>) -> Self {
        index.clear();
        for (i, point) in points.iter().enumerate() {
            index.insert(i, point.position());
        }
        Self { points, index }
    }

    /// Create a point cloud backed by the default brute-force index.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self::new(points, Box::new(BruteForceIndex::new()))
    }

    /// Get the number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the cloud.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the point stored at `index`.
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    /// Append a point, updating the backing index incrementally.
    pub fn push(&mut self, point: Point) {
        self.index.insert(self.points.len(), point.position());
        self.points.push(point);
    }

    /// Mutate the point set in bulk.
    ///
    /// The closure receives the points by mutable reference; the backing
    /// index is rebuilt when it returns, so it is never observed stale.
    pub fn update_points<R>(&mut self, f: impl FnOnce(&mut Vec<Point>) -> R) -> R {
        let result = f(&mut self.points);
        self.index.clear();
        for (i, point) in self.points.iter().enumerate() {
            self.index.insert(i, point.position());
        }
        result
    }

    /// The `k` points closest to `query`, ascending by distance.
    pub fn nearest(&self, query: DVec3, k: usize) -> Vec<Neighbor> {
        self.index.nearest(query, k)
    }

    /// All points within `radius` of `query`, ascending by distance.
    pub fn within_radius(&self, query: DVec3, radius: f64) -> Vec<Neighbor> {
        self.index.within_radius(query, radius)
    }

    /// Get the backing spatial index.
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    /// Get the minimum bound of the cloud. Returns `DVec3::ZERO` if empty.
    pub fn min_bound(&self) -> DVec3 {
        bounds(&self.points).map_or(DVec3::ZERO, |(min, _)| min)
    }

    /// Get the maximum bound of the cloud. Returns `DVec3::ZERO` if empty.
    pub fn max_bound(&self) -> DVec3 {
        bounds(&self.points).map_or(DVec3::ZERO, |(_, max)| max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::KdTreeIndex;

    fn sample_points() -> Vec<Point> {
        vec![
            Point::new(DVec3::new(0.0, 0.0, 0.0)),
            Point::new(DVec3::new(1.0, 0.0, 0.0)),
            Point::new(DVec3::new(4.0, 4.0, 4.0)),
        ]
    }

    #[test]
    fn test_construction_populates_index() {
        let cloud = PointCloud::from_points(sample_points());
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.index().len(), 3);

        let nearest = cloud.nearest(DVec3::new(0.9, 0.0, 0.0), 1);
        assert_eq!(nearest[0].index, 1);
    }

    #[test]
    fn test_custom_index_backend() {
        let cloud = PointCloud::new(sample_points(), Box::new(KdTreeIndex::new()));
        let nearest = cloud.nearest(DVec3::new(4.1, 4.0, 4.0), 1);
        assert_eq!(nearest[0].index, 2);
    }

    #[test]
    fn test_push_updates_index() {
        let mut cloud = PointCloud::from_points(sample_points());
        cloud.push(Point::new(DVec3::new(10.0, 0.0, 0.0)));

        assert_eq!(cloud.len(), 4);
        let nearest = cloud.nearest(DVec3::new(9.0, 0.0, 0.0), 1);
        assert_eq!(nearest[0].index, 3);
    }

    #[test]
    fn test_update_points_rebuilds_index() {
        let mut cloud = PointCloud::from_points(sample_points());
        cloud.update_points(|points| {
            for point in points.iter_mut() {
                point.set_position(point.position() + DVec3::new(100.0, 0.0, 0.0));
            }
        });

        let nearest = cloud.nearest(DVec3::new(101.0, 0.0, 0.0), 1);
        assert_eq!(nearest[0].index, 1);
        assert!(cloud.within_radius(DVec3::ZERO, 50.0).is_empty());
    }

    #[test]
    fn test_update_points_may_change_length() {
        let mut cloud = PointCloud::from_points(sample_points());
        cloud.update_points(|points| points.truncate(1));

        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud.index().len(), 1);
    }

    #[test]
    fn test_bounds() {
        let cloud = PointCloud::from_points(sample_points());
        assert_eq!(cloud.min_bound(), DVec3::ZERO);
        assert_eq!(cloud.max_bound(), DVec3::new(4.0, 4.0, 4.0));

        let empty = PointCloud::from_points(vec![]);
        assert_eq!(empty.min_bound(), DVec3::ZERO);
        assert_eq!(empty.max_bound(), DVec3::ZERO);
    }

    #[test]
    fn test_clone_is_independent() {
        let cloud = PointCloud::from_points(sample_points());
        let mut cloned = cloud.clone();
        cloned.push(Point::new(DVec3::splat(9.0)));

        assert_eq!(cloud.len(), 3);
        assert_eq!(cloned.len(), 4);
        assert_eq!(cloned.index().len(), 4);
    }
}
