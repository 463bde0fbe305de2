//! Tolerance based equality and ordering of vertices.
//!
//! Equality within tolerance is not transitive: `a ~ b` and `b ~ c` do not imply `a ~ c`. To still be able to hash
//! vertices, every coordinate is snapped to a grid much finer than the tolerance (see [`Quantizer`]). Two vertices
//! with the same hash key are always equal within tolerance, two vertices that are equal within tolerance may end
//! up in neighbouring cells though. Hash based lookups report such vertices as different.
//!
//! Sorting uses a second, coarse grid with the cell size of the tolerance itself, so vertices equal within
//! tolerance stay close to each other in the sorted order.

use std::cmp::Ordering;

use feature_diff_types::{Point3d, SpatialReference};
use serde::{Deserialize, Serialize};

use crate::error::ComparisonError;

// Number of grid cells per tolerance distance.
const CELLS_PER_TOLERANCE: f64 = 10.0;

/// XY and Z tolerance used to decide whether two vertices are the same.
///
/// A `NaN` Z tolerance disables Z comparison. In serialized form it is represented by `null` or a missing `z` field:
///
/// ```
/// use feature_diff::Tolerance;
///
/// let tolerance: Tolerance = serde_json::from_str(r#"{"xy": 0.01}"#).unwrap();
/// assert!(!tolerance.has_z());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToleranceConfig", into = "ToleranceConfig")]
pub struct Tolerance {
    xy: f64,
    z: f64,
}

#[derive(Serialize, Deserialize)]
struct ToleranceConfig {
    xy: f64,
    #[serde(default)]
    z: Option<f64>,
}

impl TryFrom<ToleranceConfig> for Tolerance {
    type Error = ComparisonError;

    fn try_from(value: ToleranceConfig) -> Result<Self, Self::Error> {
        Tolerance::new(value.xy, value.z.unwrap_or(f64::NAN))
    }
}

impl From<Tolerance> for ToleranceConfig {
    fn from(value: Tolerance) -> Self {
        Self {
            xy: value.xy,
            z: value.has_z().then_some(value.z),
        }
    }
}

impl Tolerance {
    /// Creates a new tolerance.
    ///
    /// XY tolerance must be finite and not negative. Z tolerance must be either `NaN` or finite and not negative.
    pub fn new(xy: f64, z: f64) -> Result<Self, ComparisonError> {
        if !xy.is_finite() || xy < 0.0 {
            return Err(ComparisonError::InvalidArgument(format!(
                "xy tolerance must be a finite non-negative number, got {xy}"
            )));
        }

        if !z.is_nan() && (!z.is_finite() || z < 0.0) {
            return Err(ComparisonError::InvalidArgument(format!(
                "z tolerance must be NaN or a finite non-negative number, got {z}"
            )));
        }

        Ok(Self { xy, z })
    }

    /// Creates a tolerance that ignores Z values.
    pub fn xy_only(xy: f64) -> Result<Self, ComparisonError> {
        Self::new(xy, f64::NAN)
    }

    /// Tolerance equal to the resolution of the spatial reference. Z is ignored if the spatial reference is not
    /// Z-aware.
    pub fn from_resolution(spatial_reference: &SpatialReference) -> Result<Self, ComparisonError> {
        Self::new(
            spatial_reference.xy_resolution(),
            spatial_reference.z_resolution(),
        )
    }

    /// XY tolerance.
    pub fn xy(&self) -> f64 {
        self.xy
    }

    /// Z tolerance, `NaN` if Z is ignored.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Whether Z values are compared.
    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }

    /// Copy of the tolerance with Z comparison disabled.
    pub fn ignoring_z(&self) -> Self {
        Self {
            xy: self.xy,
            z: f64::NAN,
        }
    }

    /// Returns true if the points are within the XY tolerance of each other and their Z values are the same in
    /// the sense of [`Tolerance::is_same_z`].
    pub fn is_same_point(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_2d_sq(b) <= self.xy * self.xy && self.is_same_z(a, b)
    }

    /// Compares Z values of the points:
    /// * always true if Z is ignored;
    /// * true if both points have no Z, false if only one of them has it;
    /// * otherwise true if the difference is within the Z tolerance.
    pub fn is_same_z(&self, a: &Point3d, b: &Point3d) -> bool {
        if !self.has_z() {
            return true;
        }

        match (a.has_z(), b.has_z()) {
            (false, false) => true,
            (true, true) => (a.z() - b.z()).abs() <= self.z,
            _ => false,
        }
    }

    /// Fine grid used to hash points with this tolerance.
    pub fn quantizer(&self) -> Quantizer {
        Quantizer {
            xy_cell: self.xy / CELLS_PER_TOLERANCE,
            z_cell: self.z / CELLS_PER_TOLERANCE,
            snap: Snap::Nearest,
        }
    }

    /// Coarse grid used to sort points, with cells of the tolerance size.
    pub fn sort_quantizer(&self) -> Quantizer {
        Quantizer {
            xy_cell: self.xy,
            z_cell: self.z,
            snap: Snap::Floor,
        }
    }

    /// Total order of points. Points are ordered by their coarse grid cells (X, then Y, then Z); points in the same
    /// cell are ordered by their exact coordinates.
    pub fn cmp_points(&self, a: &Point3d, b: &Point3d) -> Ordering {
        let quantizer = self.sort_quantizer();
        quantizer
            .key(a)
            .cmp(&quantizer.key(b))
            .then_with(|| a.x().total_cmp(&b.x()))
            .then_with(|| a.y().total_cmp(&b.y()))
            .then_with(|| a.z().total_cmp(&b.z()))
    }

    /// Sorts the points with [`Tolerance::cmp_points`].
    pub fn sort_points(&self, points: &mut [Point3d]) {
        let quantizer = self.sort_quantizer();
        points.sort_by_cached_key(|point| {
            (
                quantizer.key(point),
                ExactOrder(point.x()),
                ExactOrder(point.y()),
                ExactOrder(point.z()),
            )
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct ExactOrder(f64);

impl PartialEq for ExactOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ExactOrder {}

impl PartialOrd for ExactOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExactOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Snaps coordinates to a grid.
///
/// The hashing grid ([`Tolerance::quantizer`]) has cells of one tenth of the tolerance and snaps to the nearest
/// node, the sorting grid ([`Tolerance::sort_quantizer`]) has cells of the tolerance size and snaps down. With zero
/// tolerance the exact value is used as a key. `-0.0` and `0.0` get the same key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    xy_cell: f64,
    z_cell: f64,
    snap: Snap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Snap {
    Nearest,
    Floor,
}

impl Quantizer {
    /// Grid key of the point.
    pub fn key(&self, point: &Point3d) -> QuantizedPoint {
        let z = if self.z_cell.is_nan() {
            ZKey::Ignored
        } else if !point.has_z() {
            ZKey::Missing
        } else {
            ZKey::Value(self.snap_value(point.z(), self.z_cell))
        };

        QuantizedPoint {
            x: self.snap_value(point.x(), self.xy_cell),
            y: self.snap_value(point.y(), self.xy_cell),
            z,
        }
    }

    fn snap_value(&self, value: f64, cell: f64) -> i64 {
        if cell > 0.0 {
            let scaled = value / cell;
            return match self.snap {
                Snap::Nearest => scaled.round() as i64,
                Snap::Floor => scaled.floor() as i64,
            };
        }

        exact_key(value)
    }
}

fn exact_key(value: f64) -> i64 {
    // Map the bit pattern to an integer with the same ordering as the float value.
    let bits = (value + 0.0).to_bits() as i64;
    if bits < 0 {
        bits ^ i64::MAX
    } else {
        bits
    }
}

/// Grid key of a point. See [`Quantizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedPoint {
    x: i64,
    y: i64,
    z: ZKey,
}

impl QuantizedPoint {
    /// Grid column.
    pub fn x(&self) -> i64 {
        self.x
    }

    /// Grid row.
    pub fn y(&self) -> i64 {
        self.y
    }

    /// Z cell.
    pub fn z(&self) -> ZKey {
        self.z
    }
}

/// Z part of a [`QuantizedPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZKey {
    /// Z is not compared.
    Ignored,
    /// Z is compared, but the point has no Z value.
    Missing,
    /// Grid cell of the Z value.
    Value(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn tolerance(xy: f64, z: f64) -> Tolerance {
        Tolerance::new(xy, z).unwrap()
    }

    #[test]
    fn invalid_tolerance() {
        assert_matches!(Tolerance::new(-1.0, 0.1), Err(ComparisonError::InvalidArgument(_)));
        assert_matches!(Tolerance::new(f64::NAN, 0.1), Err(ComparisonError::InvalidArgument(_)));
        assert_matches!(Tolerance::new(0.1, -0.1), Err(ComparisonError::InvalidArgument(_)));
        assert_matches!(
            Tolerance::new(0.1, f64::INFINITY),
            Err(ComparisonError::InvalidArgument(_))
        );
        assert!(Tolerance::new(0.0, f64::NAN).is_ok());
    }

    #[test]
    fn same_point_in_xy() {
        let tolerance = tolerance(0.1, f64::NAN);
        let a = Point3d::new(0.0, 0.0, 0.0);

        assert!(tolerance.is_same_point(&a, &Point3d::new(0.06, 0.08, 100.0)));
        assert!(!tolerance.is_same_point(&a, &Point3d::new(0.07, 0.08, 0.0)));
        assert!(tolerance.is_same_point(&a, &Point3d::new_2d(0.0, 0.0)));
    }

    #[test]
    fn same_point_in_z() {
        let tolerance = tolerance(0.1, 0.5);
        let a = Point3d::new(0.0, 0.0, 1.0);

        assert!(tolerance.is_same_point(&a, &Point3d::new(0.0, 0.0, 1.5)));
        assert!(!tolerance.is_same_point(&a, &Point3d::new(0.0, 0.0, 1.6)));
        assert!(!tolerance.is_same_point(&a, &Point3d::new_2d(0.0, 0.0)));
        assert!(tolerance.is_same_point(&Point3d::new_2d(0.0, 0.0), &Point3d::new_2d(0.0, 0.0)));
    }

    #[test]
    fn equality_is_not_transitive() {
        let tolerance = tolerance(1.0, f64::NAN);
        let a = Point3d::new_2d(0.0, 0.0);
        let b = Point3d::new_2d(0.9, 0.0);
        let c = Point3d::new_2d(1.8, 0.0);

        assert!(tolerance.is_same_point(&a, &b));
        assert!(tolerance.is_same_point(&b, &c));
        assert!(!tolerance.is_same_point(&a, &c));
    }

    #[test]
    fn same_key_means_same_point() {
        let tolerance = tolerance(0.01, 0.01);
        let quantizer = tolerance.quantizer();
        let a = Point3d::new(100.0004, 200.0, 5.0);
        let b = Point3d::new(99.9996, 200.0004, 5.0004);

        assert_eq!(quantizer.key(&a), quantizer.key(&b));
        assert!(tolerance.is_same_point(&a, &b));

        let c = Point3d::new(100.002, 200.0, 5.0);
        assert_ne!(quantizer.key(&a), quantizer.key(&c));
    }

    #[test]
    fn zero_tolerance_keys() {
        let quantizer = tolerance(0.0, 0.0).quantizer();

        assert_eq!(
            quantizer.key(&Point3d::new(-0.0, 1.0, 2.0)),
            quantizer.key(&Point3d::new(0.0, 1.0, 2.0))
        );
        assert_ne!(
            quantizer.key(&Point3d::new(1.0, 1.0, 2.0)),
            quantizer.key(&Point3d::new(1.0 + f64::EPSILON, 1.0, 2.0))
        );

        let mut points = vec![
            Point3d::new(2.0, 0.0, 0.0),
            Point3d::new(-3.0, 0.0, 0.0),
            Point3d::new(-0.5, 0.0, 0.0),
            Point3d::new(0.0, 0.0, 0.0),
        ];
        tolerance(0.0, 0.0).sort_points(&mut points);
        let xs: Vec<f64> = points.iter().map(|p| p.x()).collect();
        assert_eq!(xs, vec![-3.0, -0.5, 0.0, 2.0]);
    }

    #[test]
    fn z_keys() {
        let quantizer = tolerance(0.1, f64::NAN).quantizer();
        assert_eq!(quantizer.key(&Point3d::new(0.0, 0.0, 5.0)).z, ZKey::Ignored);

        let quantizer = tolerance(0.1, 0.1).quantizer();
        assert_eq!(quantizer.key(&Point3d::new_2d(0.0, 0.0)).z, ZKey::Missing);
        assert_eq!(quantizer.key(&Point3d::new(0.0, 0.0, 5.0)).z, ZKey::Value(500));
    }

    #[test]
    fn ordering_is_total_and_deterministic() {
        let tolerance = tolerance(0.1, 0.1);
        let a = Point3d::new(1.0, 1.0, 1.0);
        let b = Point3d::new(1.001, 1.0, 1.0);

        assert_eq!(tolerance.quantizer().key(&a), tolerance.quantizer().key(&b));
        assert_eq!(tolerance.cmp_points(&a, &b), Ordering::Less);
        assert_eq!(tolerance.cmp_points(&b, &a), Ordering::Greater);
        assert_eq!(tolerance.cmp_points(&a, &a), Ordering::Equal);

        let mut sorted = vec![b, Point3d::new(0.0, 5.0, 0.0), a];
        tolerance.sort_points(&mut sorted);
        assert!(sorted[0].coincides(&Point3d::new(0.0, 5.0, 0.0)));
        assert!(sorted[1].coincides(&a));
        assert!(sorted[2].coincides(&b));
    }

    #[test]
    fn close_points_are_sorted_next_to_each_other() {
        let tolerance = tolerance(0.05, f64::NAN);
        let mut points = vec![
            Point3d::new_2d(0.01, 7.0),
            Point3d::new_2d(0.03, 0.0),
            Point3d::new_2d(0.0, 0.0),
        ];
        tolerance.sort_points(&mut points);

        assert!(points[0].coincides(&Point3d::new_2d(0.0, 0.0)));
        assert!(points[1].coincides(&Point3d::new_2d(0.03, 0.0)));
        assert!(points[2].coincides(&Point3d::new_2d(0.01, 7.0)));

        let sort_key = tolerance.sort_quantizer().key(&Point3d::new_2d(0.03, -0.01));
        assert_eq!((sort_key.x(), sort_key.y()), (0, -1));
        assert_eq!(sort_key.z(), ZKey::Ignored);
    }

    #[test]
    fn serialization() {
        let tolerance = tolerance(0.01, f64::NAN);
        let json = serde_json::to_string(&tolerance).unwrap();
        assert_eq!(json, r#"{"xy":0.01,"z":null}"#);

        let restored: Tolerance = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.xy(), 0.01);
        assert!(!restored.has_z());

        let with_z: Tolerance = serde_json::from_str(r#"{"xy":0.01,"z":0.5}"#).unwrap();
        assert_eq!(with_z.z(), 0.5);

        assert!(serde_json::from_str::<Tolerance>(r#"{"xy":-1.0}"#).is_err());
    }
}
