use approx::relative_eq;
use serde::{Deserialize, Serialize};

/// Precision of one coordinate dimension.
///
/// *Resolution* is the grid coordinates are snapped to, *tolerance* is the distance below which two
/// coordinates are considered equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precision {
    /// Coordinate grid size.
    pub resolution: f64,
    /// Equality tolerance.
    pub tolerance: f64,
}

/// Coordinate frame of a geometry together with its XY and (optional) Z precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialReference {
    frame: String,
    xy: Precision,
    z: Option<Precision>,
}

impl SpatialReference {
    /// Creates a new spatial reference without Z.
    pub fn new(frame: impl Into<String>, xy_resolution: f64, xy_tolerance: f64) -> Self {
        Self {
            frame: frame.into(),
            xy: Precision {
                resolution: xy_resolution,
                tolerance: xy_tolerance,
            },
            z: None,
        }
    }

    /// Makes the spatial reference Z-aware with the given Z precision.
    pub fn with_z(mut self, z_resolution: f64, z_tolerance: f64) -> Self {
        self.z = Some(Precision {
            resolution: z_resolution,
            tolerance: z_tolerance,
        });
        self
    }

    /// Name of the coordinate frame.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// XY precision.
    pub fn xy(&self) -> Precision {
        self.xy
    }

    /// Z precision, `None` if the spatial reference is not Z-aware.
    pub fn z(&self) -> Option<Precision> {
        self.z
    }

    /// Whether the spatial reference has a Z precision.
    pub fn is_z_aware(&self) -> bool {
        self.z.is_some()
    }

    /// XY resolution.
    pub fn xy_resolution(&self) -> f64 {
        self.xy.resolution
    }

    /// XY tolerance.
    pub fn xy_tolerance(&self) -> f64 {
        self.xy.tolerance
    }

    /// Z resolution, `NaN` if the spatial reference is not Z-aware.
    pub fn z_resolution(&self) -> f64 {
        self.z.map_or(f64::NAN, |z| z.resolution)
    }

    /// Z tolerance, `NaN` if the spatial reference is not Z-aware.
    pub fn z_tolerance(&self) -> f64 {
        self.z.map_or(f64::NAN, |z| z.tolerance)
    }

    /// Returns true if both spatial references use the same frame with the same XY resolution and
    /// tolerance. The vertical precision is not compared.
    pub fn is_same_xy_frame(&self, other: &SpatialReference) -> bool {
        self.frame == other.frame
            && relative_eq!(self.xy.resolution, other.xy.resolution)
            && relative_eq!(self.xy.tolerance, other.xy.tolerance)
    }

    /// Returns true if both spatial references are Z-aware and have the same Z resolution, or if at
    /// least one of them is not Z-aware.
    pub fn has_compatible_z(&self, other: &SpatialReference) -> bool {
        match (self.z, other.z) {
            (Some(a), Some(b)) => relative_eq!(a.resolution, b.resolution),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_comparison_ignores_vertical_precision() {
        let a = SpatialReference::new("LV95", 0.0001, 0.001).with_z(0.0001, 0.001);
        let b = SpatialReference::new("LV95", 0.0001, 0.001);
        assert!(a.is_same_xy_frame(&b));
        assert!(a.has_compatible_z(&b));

        let c = b.clone().with_z(0.01, 0.1);
        assert!(!a.has_compatible_z(&c));
        assert!(!a.is_same_xy_frame(&SpatialReference::new("WGS84", 0.0001, 0.001)));
        assert!(!a.is_same_xy_frame(&SpatialReference::new("LV95", 0.001, 0.01)));
    }

    #[test]
    fn missing_z_precision_is_nan() {
        let sr = SpatialReference::new("LV95", 0.0001, 0.001);
        assert!(!sr.is_z_aware());
        assert!(sr.z_resolution().is_nan());
        assert!(sr.z_tolerance().is_nan());
    }
}
