//! See documentation for [`GeometryKind`].
use serde::{Deserialize, Serialize};

/// Kind of a vertex sequence.
///
/// The kind determines how the vertices of a sequence are connected:
/// * [`GeometryKind::Point`] and [`GeometryKind::MultiPoint`] vertices are not connected, they have no segments;
/// * [`GeometryKind::Polyline`] parts are open paths, each part with `n` vertices has `n - 1` segments;
/// * [`GeometryKind::Polygon`] parts are rings. The first vertex of a ring is repeated at its end, so a ring
///   also has `n - 1` segments and no segment bridges two rings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Single point.
    Point,
    /// Unconnected set of points stored in one part.
    MultiPoint,
    /// One or more open paths.
    Polyline,
    /// One or more closed rings.
    Polygon,
}

impl GeometryKind {
    /// Whether vertices of geometries of this kind are connected by segments.
    pub fn has_segments(&self) -> bool {
        matches!(self, Self::Polyline | Self::Polygon)
    }
}
