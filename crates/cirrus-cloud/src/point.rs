use std::collections::HashMap;

use glam::DVec3;

/// A typed property attached to a [`Point`].
///
/// The set of kinds is closed: numeric scalars, 8-bit RGB colors, and 3D
/// vectors.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A numeric scalar, e.g. an intensity or a confidence weight.
    Scalar(f64),
    /// An 8-bit RGB color.
    Color([u8; 3]),
    /// A 3D vector, e.g. a velocity or a gradient.
    Vector(DVec3),
}

impl PropertyValue {
    /// Return the scalar payload, if this is a [`PropertyValue::Scalar`].
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Return the color payload, if this is a [`PropertyValue::Color`].
    pub fn as_color(&self) -> Option<[u8; 3]> {
        match self {
            PropertyValue::Color(value) => Some(*value),
            _ => None,
        }
    }

    /// Return the vector payload, if this is a [`PropertyValue::Vector`].
    pub fn as_vector(&self) -> Option<DVec3> {
        match self {
            PropertyValue::Vector(value) => Some(*value),
            _ => None,
        }
    }
}

/// A point with a position, an optional normal, and named properties.
///
/// The position is only mutated through [`Point::set_position`], typically
/// from a transformation applied over a whole cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    position: DVec3,
    normal: Option<DVec3>,
    properties: HashMap<String, PropertyValue>,
}

impl Point {
    /// Create a point at the given position, with no normal and no
    /// properties.
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            normal: None,
            properties: HashMap::new(),
        }
    }

    /// Attach a normal to the point.
    pub fn with_normal(mut self, normal: DVec3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Attach a named property to the point.
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Get the position of the point.
    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Set the position of the point.
    #[inline]
    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    /// Get the normal of the point, if it has one.
    #[inline]
    pub fn normal(&self) -> Option<DVec3> {
        self.normal
    }

    /// Set or clear the normal of the point.
    #[inline]
    pub fn set_normal(&mut self, normal: Option<DVec3>) {
        self.normal = normal;
    }

    /// Get a named property, if present.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Set a named property, replacing any previous value under the key.
    pub fn set_property(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get as reference the full property map of the point.
    pub fn properties(&self) -> &HashMap<String, PropertyValue> {
        &self.properties
    }
}

/// Compute the axis-aligned bounding box of a set of points.
///
/// Returns `None` if the slice is empty.
pub fn bounds(points: &[Point]) -> Option<(DVec3, DVec3)> {
    let first = points.first()?.position();
    Some(points.iter().fold((first, first), |(min, max), point| {
        (min.min(point.position()), max.max(point.position()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_construction() {
        let point = Point::new(DVec3::new(1.0, 2.0, 3.0))
            .with_normal(DVec3::Y)
            .with_property("intensity", PropertyValue::Scalar(0.5));

        assert_eq!(point.position(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(point.normal(), Some(DVec3::Y));
        assert_eq!(
            point.property("intensity").and_then(PropertyValue::as_scalar),
            Some(0.5)
        );
        assert!(point.property("color").is_none());
    }

    #[test]
    fn test_set_property_replaces() {
        let mut point = Point::new(DVec3::ZERO);
        point.set_property("color", PropertyValue::Color([255, 0, 0]));
        point.set_property("color", PropertyValue::Color([0, 255, 0]));

        assert_eq!(point.properties().len(), 1);
        assert_eq!(
            point.property("color").and_then(PropertyValue::as_color),
            Some([0, 255, 0])
        );
    }

    #[test]
    fn test_property_kind_accessors() {
        let scalar = PropertyValue::Scalar(1.0);
        let vector = PropertyValue::Vector(DVec3::X);

        assert_eq!(scalar.as_scalar(), Some(1.0));
        assert!(scalar.as_color().is_none());
        assert!(scalar.as_vector().is_none());
        assert_eq!(vector.as_vector(), Some(DVec3::X));
    }

    #[test]
    fn test_bounds() {
        let points = vec![
            Point::new(DVec3::new(0.0, 5.0, -1.0)),
            Point::new(DVec3::new(2.0, -3.0, 4.0)),
        ];

        let (min, max) = bounds(&points).unwrap();
        assert_eq!(min, DVec3::new(0.0, -3.0, -1.0));
        assert_eq!(max, DVec3::new(2.0, 5.0, 4.0));
    }

    #[test]
    fn test_bounds_empty() {
        assert!(bounds(&[]).is_none());
    }
}
