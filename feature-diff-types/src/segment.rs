//! See documentation for [`Segment`].
use serde::{Deserialize, Serialize};

use crate::point::Point3d;

/// A straight line segment between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    from: Point3d,
    to: Point3d,
}

impl Segment {
    /// Creates a new segment.
    pub fn new(from: Point3d, to: Point3d) -> Self {
        Self { from, to }
    }

    /// Start vertex.
    pub fn from(&self) -> &Point3d {
        &self.from
    }

    /// End vertex.
    pub fn to(&self) -> &Point3d {
        &self.to
    }

    /// Whether start and end vertices have the same XY coordinates.
    pub fn is_degenerate(&self) -> bool {
        self.from.x() == self.to.x() && self.from.y() == self.to.y()
    }

    /// Parameter of the location on the segment closest to the point in the XY plane, from `0.0`
    /// (start vertex) to `1.0` (end vertex).
    pub fn closest_parameter(&self, point: &Point3d) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }

        let ds = self.to.xy() - self.from.xy();
        let dp = point.xy() - self.from.xy();

        (dp.dot(&ds) / ds.norm_squared()).clamp(0.0, 1.0)
    }

    /// Squared XY distance from the point to the closest point of the segment. The closest point is the projection
    /// of the point onto the segment, clamped to the segment's endpoints.
    pub fn distance_to_point_sq(&self, point: &Point3d) -> f64 {
        if self.is_degenerate() {
            return self.from.distance_2d_sq(point);
        }

        let ds = self.to.xy() - self.from.xy();
        let dp = point.xy() - self.from.xy();
        let ds_len = ds.norm_squared();

        let r = dp.dot(&ds) / ds_len;
        if r <= 0.0 {
            self.from.distance_2d_sq(point)
        } else if r >= 1.0 {
            self.to.distance_2d_sq(point)
        } else {
            let s = (dp.y * ds.x - dp.x * ds.y) / ds_len;
            (s * s) * ds_len
        }
    }

    /// Z value at the given parameter, linearly interpolated between the end vertices.
    ///
    /// Returns `NaN` if any of the vertices has no Z.
    pub fn z_at(&self, parameter: f64) -> f64 {
        self.from.z() + (self.to.z() - self.from.z()) * parameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn distance_to_point() {
        let segment = Segment::new(Point3d::new_2d(0.0, 0.0), Point3d::new_2d(10.0, 0.0));

        assert_eq!(segment.distance_to_point_sq(&Point3d::new_2d(5.0, 0.0)), 0.0);
        assert_abs_diff_eq!(segment.distance_to_point_sq(&Point3d::new_2d(5.0, 2.0)), 4.0);
        assert_abs_diff_eq!(segment.distance_to_point_sq(&Point3d::new_2d(-3.0, 4.0)), 25.0);
        assert_abs_diff_eq!(segment.distance_to_point_sq(&Point3d::new_2d(13.0, 4.0)), 25.0);
    }

    #[test]
    fn distance_to_degenerate_segment() {
        let point = Point3d::new(1.0, 1.0, 0.0);
        let segment = Segment::new(point, point.with_z(5.0));

        assert!(segment.is_degenerate());
        assert_eq!(segment.closest_parameter(&Point3d::new_2d(4.0, 5.0)), 0.0);
        assert_abs_diff_eq!(segment.distance_to_point_sq(&Point3d::new_2d(4.0, 5.0)), 25.0);
    }

    #[test]
    fn interpolates_z() {
        let segment = Segment::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(10.0, 0.0, 5.0));

        let parameter = segment.closest_parameter(&Point3d::new_2d(4.0, 3.0));
        assert_abs_diff_eq!(parameter, 0.4);
        assert_abs_diff_eq!(segment.z_at(parameter), 2.0);
        assert_eq!(segment.closest_parameter(&Point3d::new_2d(20.0, 0.0)), 1.0);

        let flat = Segment::new(Point3d::new_2d(0.0, 0.0), Point3d::new_2d(10.0, 0.0));
        assert!(flat.z_at(0.5).is_nan());
    }
}
