use cirrus_cloud::cloud::PointCloud;
use cirrus_cloud::point::Point;

use crate::execute::{execute_mut, DispatchError, ExecutionStrategy};

/// Apply a transformation to every point of a cloud.
///
/// The per-point function may move positions, rewrite normals, or edit
/// properties; the cloud's backing index is rebuilt before this returns, so
/// queries never observe stale positions. The function must be safe to
/// invoke concurrently on distinct points when a parallel strategy is used.
pub fn transform_cloud<F>(
    cloud: &mut PointCloud,
    strategy: ExecutionStrategy,
    op: F,
) -> Result<(), DispatchError>
where
    F: Fn(&mut Point) + Send + Sync,
{
    cloud.update_points(|points| execute_mut(points, strategy, op))
}
