use feature_diff_types::VertexSequence;

use crate::comparison::GeometryComparison;
use crate::error::ComparisonError;
use crate::tolerance::Tolerance;

/// Convenience type to configure a [`GeometryComparison`].
///
/// ```
/// use feature_diff::GeometryComparison;
/// use feature_diff::feature_diff_types::{Geometry, Point3d, SpatialReference};
///
/// let sr = SpatialReference::new("LV95", 0.0001, 0.001).with_z(0.0001, 0.001);
/// let base = Geometry::point(Point3d::new(0.0, 0.0, 0.0), sr.clone());
/// let compare = Geometry::point(Point3d::new(0.0, 0.0, 0.5), sr);
///
/// let comparison = GeometryComparison::builder(&base, &compare)
///     .with_xy_tolerance(0.01)
///     .with_z_tolerance(1.0)
///     .build()
///     .unwrap();
///
/// assert!(comparison.have_same_vertices(false).unwrap());
/// ```
#[derive(Debug)]
pub struct ComparisonBuilder<'a, G: VertexSequence> {
    base: &'a G,
    compare: &'a G,
    xy_tolerance: Option<f64>,
    z_tolerance: Option<f64>,
}

impl<'a, G: VertexSequence> ComparisonBuilder<'a, G> {
    /// Creates a new builder for the two geometries.
    pub fn new(base: &'a G, compare: &'a G) -> Self {
        Self {
            base,
            compare,
            xy_tolerance: None,
            z_tolerance: None,
        }
    }

    /// Sets the XY tolerance.
    ///
    /// Defaults to the XY resolution of the base spatial reference.
    pub fn with_xy_tolerance(mut self, xy_tolerance: f64) -> Self {
        self.xy_tolerance = Some(xy_tolerance);
        self
    }

    /// Sets the Z tolerance. `NaN` disables Z comparison.
    ///
    /// Defaults to the Z resolution of the base spatial reference, or `NaN` if it is not Z-aware.
    pub fn with_z_tolerance(mut self, z_tolerance: f64) -> Self {
        self.z_tolerance = Some(z_tolerance);
        self
    }

    /// Sets both XY and Z tolerance.
    ///
    /// Replaces the values set by the [`ComparisonBuilder::with_xy_tolerance`] and
    /// [`ComparisonBuilder::with_z_tolerance`] methods.
    pub fn with_tolerance(self, tolerance: Tolerance) -> Self {
        self.with_xy_tolerance(tolerance.xy())
            .with_z_tolerance(tolerance.z())
    }

    /// Validates the inputs and creates the comparison.
    pub fn build(self) -> Result<GeometryComparison<'a, G>, ComparisonError> {
        let spatial_reference = self.base.spatial_reference();
        let tolerance = Tolerance::new(
            self.xy_tolerance
                .unwrap_or_else(|| spatial_reference.xy_resolution()),
            self.z_tolerance
                .unwrap_or_else(|| spatial_reference.z_resolution()),
        )?;

        GeometryComparison::with_tolerance(self.base, self.compare, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use feature_diff_types::{Geometry, Point3d, SpatialReference};

    fn points() -> (Geometry, Geometry) {
        let sr = SpatialReference::new("LV95", 0.0001, 0.001).with_z(0.001, 0.01);
        (
            Geometry::point(Point3d::new(0.0, 0.0, 0.0), sr.clone()),
            Geometry::point(Point3d::new(0.05, 0.0, 2.0), sr),
        )
    }

    #[test]
    fn defaults_to_resolution() {
        let (base, compare) = points();
        let comparison = ComparisonBuilder::new(&base, &compare).build().unwrap();

        assert_eq!(comparison.tolerance().xy(), 0.0001);
        assert_eq!(comparison.tolerance().z(), 0.001);
        assert!(!comparison.have_same_vertices(false).unwrap());
    }

    #[test]
    fn with_tolerance_replaces_values() {
        let (base, compare) = points();

        let comparison = GeometryComparison::builder(&base, &compare)
            .with_xy_tolerance(0.1)
            .build()
            .unwrap();
        assert!(!comparison.have_same_vertices(false).unwrap());

        let comparison = GeometryComparison::builder(&base, &compare)
            .with_xy_tolerance(0.1)
            .with_z_tolerance(f64::NAN)
            .build()
            .unwrap();
        assert!(comparison.have_same_vertices(false).unwrap());

        let comparison = GeometryComparison::builder(&base, &compare)
            .with_z_tolerance(5.0)
            .with_tolerance(Tolerance::new(0.001, 0.001).unwrap())
            .build()
            .unwrap();
        assert_eq!(comparison.tolerance().xy(), 0.001);
        assert_eq!(comparison.tolerance().z(), 0.001);
    }

    #[test]
    fn invalid_tolerance() {
        let (base, compare) = points();
        assert_matches!(
            GeometryComparison::builder(&base, &compare)
                .with_xy_tolerance(-0.1)
                .build(),
            Err(ComparisonError::InvalidArgument(_))
        );
    }
}
