use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A vertex with X, Y and an optional Z coordinate.
///
/// A `NaN` Z value means the vertex has no Z. Such vertices are created with [`Point3d::new_2d`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    x: f64,
    y: f64,
    z: f64,
}

impl Point3d {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a new point without Z value.
    pub const fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: f64::NAN }
    }

    /// X coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Z coordinate, `NaN` if the point has no Z.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Whether the point has a Z value.
    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }

    /// Returns a copy of the point with the given Z value.
    pub fn with_z(&self, z: f64) -> Self {
        Self { z, ..*self }
    }

    /// Projection of the point to the XY plane.
    pub fn xy(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Squared distance between the points in the XY plane.
    pub fn distance_2d_sq(&self, other: &Point3d) -> f64 {
        (self.xy() - other.xy()).norm_squared()
    }

    /// Returns true if both points have exactly the same coordinates. Two missing Z values are
    /// considered equal, unlike with `==`.
    pub fn coincides(&self, other: &Point3d) -> bool {
        self.x == other.x
            && self.y == other.y
            && (self.z == other.z || (self.z.is_nan() && other.z.is_nan()))
    }
}

impl From<[f64; 3]> for Point3d {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[f64; 2]> for Point3d {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new_2d(x, y)
    }
}
