use std::sync::Arc;

use approx::assert_relative_eq;
use glam::DVec3;

use cirrus_cloud::cloud::PointCloud;
use cirrus_cloud::index::{KdTreeIndex, SpatialIndex};
use cirrus_cloud::point::{Point, PropertyValue};
use cirrus_ops::execute::ExecutionStrategy;
use cirrus_ops::subsample::{mean_property, subsample, SubsampleConfig};
use cirrus_ops::temporal::{associate, Timestamped};
use cirrus_ops::transform::transform_cloud;

#[test]
fn test_scan_reduction_pipeline() {
    // dense synthetic scan: two clusters along x with intensity attached
    let mut points = Vec::new();
    for i in 0..50 {
        let offset = i as f64 * 0.01;
        points.push(
            Point::new(DVec3::new(offset, 0.0, 0.0))
                .with_property("intensity", PropertyValue::Scalar(1.0)),
        );
        points.push(
            Point::new(DVec3::new(10.0 + offset, 0.0, 0.0))
                .with_property("intensity", PropertyValue::Scalar(3.0)),
        );
    }
    let mut cloud = PointCloud::from_points(points);

    // register the scan into the world frame
    transform_cloud(&mut cloud, ExecutionStrategy::Parallel, |point| {
        point.set_position(point.position() + DVec3::new(0.0, 2.0, 0.0));
    })
    .unwrap();

    let mut config = SubsampleConfig::new(1.0);
    config.min_points_per_cell = 10;
    config.strategy = ExecutionStrategy::Parallel;
    config.properties = mean_property("intensity");
    config.index = Arc::new(|| Box::new(KdTreeIndex::new()) as Box<dyn SpatialIndex>);

    let reduced = subsample(&cloud, &config).unwrap();
    assert_eq!(reduced.len(), 2);
    for point in reduced.points() {
        assert_relative_eq!(point.position().y, 2.0);
        assert!(point.property("intensity").is_some());
    }

    // the reduced cloud answers proximity queries through its kd index
    let nearest = reduced.nearest(DVec3::new(10.0, 2.0, 0.0), 1);
    assert_eq!(nearest.len(), 1);
    assert!(reduced.points()[nearest[0].index].position().x > 9.0);
    assert_eq!(
        reduced.points()[nearest[0].index]
            .property("intensity")
            .and_then(PropertyValue::as_scalar),
        Some(3.0)
    );

    // pair the reduced frames with externally timestamped poses
    let frames: Vec<Timestamped<usize>> = (0..reduced.len())
        .map(|i| Timestamped::new(i as f64, i))
        .collect();
    let poses = vec![
        Timestamped::new(0.05, "pose-a"),
        Timestamped::new(0.90, "pose-b"),
    ];
    let associated = associate(&frames, &poses, 0.2, ExecutionStrategy::Parallel).unwrap();
    assert_eq!(associated.len(), reduced.len());
    assert_eq!(
        associated[0].matched.as_ref().map(|m| m.value),
        Some("pose-a")
    );
    assert_eq!(
        associated[1].matched.as_ref().map(|m| m.value),
        Some("pose-b")
    );
}
