//! Spatially indexed copy of a vertex sequence used for point-on-geometry tests.

use rstar::{RTree, RTreeObject, AABB};

use crate::point::Point3d;
use crate::segment::Segment;
use crate::sequence::VertexSequence;

#[derive(Debug, Clone)]
struct IndexedSegment {
    segment: Segment,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let from = self.segment.from();
        let to = self.segment.to();
        AABB::from_corners([from.x(), from.y()], [to.x(), to.y()])
    }
}

/// Copy of the segments of a vertex sequence stored in an R-tree.
///
/// Point and multipoint vertices are stored as degenerate segments, so every geometry kind can be queried the
/// same way. Only the boundary is indexed: a point inside a polygon ring but away from its edges is disjoint.
#[derive(Debug)]
pub struct IndexedGeometry {
    tree: RTree<IndexedSegment>,
    xy_tolerance: f64,
    z_tolerance: f64,
}

impl IndexedGeometry {
    /// Builds the index. A `NaN` Z tolerance disables the Z check of [`IndexedGeometry::is_disjoint_3d`].
    pub fn new(sequence: &impl VertexSequence, xy_tolerance: f64, z_tolerance: f64) -> Self {
        let segments: Vec<IndexedSegment> = if sequence.kind().has_segments() {
            sequence
                .iter_segments()
                .map(|segment| IndexedSegment { segment })
                .collect()
        } else {
            sequence
                .iter_points()
                .map(|point| IndexedSegment {
                    segment: Segment::new(*point, *point),
                })
                .collect()
        };

        Self {
            tree: RTree::bulk_load(segments),
            xy_tolerance,
            z_tolerance,
        }
    }

    /// Number of indexed segments.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Returns true if the point is farther than the XY tolerance from every segment, or if it is within the XY
    /// tolerance but its Z differs by more than the Z tolerance from the Z interpolated at the closest location on
    /// every such segment.
    pub fn is_disjoint_3d(&self, point: &Point3d) -> bool {
        let tolerance = self.xy_tolerance;
        let search = AABB::from_corners(
            [point.x() - tolerance, point.y() - tolerance],
            [point.x() + tolerance, point.y() + tolerance],
        );

        !self
            .tree
            .locate_in_envelope_intersecting(&search)
            .any(|candidate| self.touches(&candidate.segment, point))
    }

    fn touches(&self, segment: &Segment, point: &Point3d) -> bool {
        if segment.distance_to_point_sq(point) > self.xy_tolerance * self.xy_tolerance {
            return false;
        }

        if self.z_tolerance.is_nan() {
            return true;
        }

        let z = closest_z(segment, point);
        match (z.is_nan(), point.z().is_nan()) {
            (true, true) => true,
            (false, false) => (z - point.z()).abs() <= self.z_tolerance,
            _ => false,
        }
    }
}

// Z of the location on the segment closest to the point. For a vertical segment this is the Z of the segment
// nearest to the Z of the point.
fn closest_z(segment: &Segment, point: &Point3d) -> f64 {
    if !segment.is_degenerate() {
        return segment.z_at(segment.closest_parameter(point));
    }

    let from = segment.from().z();
    let to = segment.to().z();
    if from.is_nan() || to.is_nan() || point.z().is_nan() {
        return from;
    }

    point.z().max(from.min(to)).min(from.max(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::spatial_reference::SpatialReference;

    fn sr() -> SpatialReference {
        SpatialReference::new("LV95", 0.0001, 0.001).with_z(0.0001, 0.001)
    }

    #[test]
    fn point_near_segment() {
        let line = Geometry::polyline(
            vec![vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(10.0, 0.0, 10.0)]],
            sr(),
        )
        .unwrap();
        let indexed = IndexedGeometry::new(&line, 0.01, 0.01);
        assert_eq!(indexed.len(), 1);

        assert!(!indexed.is_disjoint_3d(&Point3d::new(5.0, 0.005, 5.0)));
        assert!(indexed.is_disjoint_3d(&Point3d::new(5.0, 0.5, 5.0)));
        assert!(indexed.is_disjoint_3d(&Point3d::new(5.0, 0.0, 6.0)));
        assert!(indexed.is_disjoint_3d(&Point3d::new_2d(5.0, 0.0)));

        let indexed_2d = IndexedGeometry::new(&line, 0.01, f64::NAN);
        assert!(!indexed_2d.is_disjoint_3d(&Point3d::new(5.0, 0.0, 6.0)));
    }

    #[test]
    fn polygon_interior_is_disjoint() {
        let polygon = Geometry::polygon(
            vec![vec![
                Point3d::new_2d(0.0, 0.0),
                Point3d::new_2d(10.0, 0.0),
                Point3d::new_2d(10.0, 10.0),
                Point3d::new_2d(0.0, 10.0),
            ]],
            sr(),
        )
        .unwrap();
        let indexed = IndexedGeometry::new(&polygon, 0.01, 0.01);

        assert_eq!(indexed.len(), 4);
        assert!(indexed.is_disjoint_3d(&Point3d::new_2d(5.0, 5.0)));
        assert!(!indexed.is_disjoint_3d(&Point3d::new_2d(0.0, 5.0)));
    }

    #[test]
    fn point_on_vertical_segment() {
        let line = Geometry::polyline(
            vec![vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(5.0, 0.0, 0.0),
                Point3d::new(5.0, 0.0, 10.0),
            ]],
            sr(),
        )
        .unwrap();
        let indexed = IndexedGeometry::new(&line, 0.01, 0.01);

        assert!(!indexed.is_disjoint_3d(&Point3d::new(5.0, 0.0, 7.5)));
        assert!(indexed.is_disjoint_3d(&Point3d::new(5.0, 0.0, 10.5)));
    }

    #[test]
    fn multipoint_vertices() {
        let multipoint = Geometry::multipoint(
            vec![Point3d::new(1.0, 1.0, 1.0), Point3d::new(2.0, 2.0, 2.0)],
            sr(),
        );
        let indexed = IndexedGeometry::new(&multipoint, 0.1, 0.1);

        assert_eq!(indexed.len(), 2);
        assert!(!indexed.is_disjoint_3d(&Point3d::new(2.05, 2.0, 2.05)));
        assert!(indexed.is_disjoint_3d(&Point3d::new(1.5, 1.5, 1.5)));
    }
}
