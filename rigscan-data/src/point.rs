#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in centimeters. `y` points forward, `x` to the side and `z` up.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Point3D {
        Point3D { x, y, z }
    }

    /// Euclidean distance from the sensor origin.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Points accumulated over a scan, in capture order.
///
/// The cloud only grows: there is no way to remove or reorder points.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud {
    points: Vec<Point3D>,
}

impl PointCloud {
    pub fn new() -> PointCloud {
        PointCloud { points: Vec::new() }
    }

    pub fn extend<I: IntoIterator<Item = Point3D>>(&mut self, points: I) {
        self.points.extend(points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3D> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3D;
    type IntoIter = std::slice::Iter<'a, Point3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_keeps_order() {
        let mut cloud = PointCloud::new();
        assert!(cloud.is_empty());
        cloud.extend([Point3D::new(1., 0., 0.), Point3D::new(0., 1., 0.)]);
        cloud.extend(Vec::new());
        cloud.extend([Point3D::new(0., 0., 1.)]);

        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.points()[0], Point3D::new(1., 0., 0.));
        assert_eq!(cloud.points()[2], Point3D::new(0., 0., 1.));
    }

    #[test]
    fn test_norm() {
        assert_eq!(Point3D::new(3., 4., 0.).norm(), 5.);
    }
}
