//! Vertex sequence is an ordered list of vertices grouped in parts.
//!
//! A vertex is addressed either by its *global* index (position in the whole sequence) or by the index of its part
//! and its index inside that part. Segments connect consecutive vertices of the same part only, so a part with `n`
//! vertices contributes `n - 1` segments. Point and multipoint sequences have a single part and no segments.

use crate::geometry_type::GeometryKind;
use crate::point::Point3d;
use crate::segment::Segment;
use crate::spatial_reference::SpatialReference;

/// Read access to a geometry as a sequence of vertices. See module level documentation for details.
///
/// This is the only view of a geometry the comparison engine needs. Implementations must return consistent values
/// for as long as they are borrowed: the number of vertices returned by [`VertexSequence::iter_points`] must equal
/// the sum of [`VertexSequence::point_count_in_part`] over all parts.
pub trait VertexSequence {
    /// Kind of the geometry.
    fn kind(&self) -> GeometryKind;

    /// Spatial reference the coordinates are defined in.
    fn spatial_reference(&self) -> &SpatialReference;

    /// Number of parts.
    fn part_count(&self) -> usize;

    /// Number of vertices in the part with the given index. Returns `0` for indices out of range.
    fn point_count_in_part(&self, part_index: usize) -> usize;

    /// Iterates over all vertices in their original order, part after part.
    fn iter_points(&self) -> impl Iterator<Item = &'_ Point3d>;

    /// Total number of vertices.
    fn point_count(&self) -> usize {
        (0..self.part_count())
            .map(|part| self.point_count_in_part(part))
            .sum()
    }

    /// Copies all vertices in their original order.
    fn coordinates(&self) -> Vec<Point3d> {
        self.iter_points().copied().collect()
    }

    /// Vertex with the given global index.
    fn point(&self, global_index: usize) -> Option<Point3d> {
        self.iter_points().nth(global_index).copied()
    }

    /// Segment with the given global index, `None` if the index is out of range or the geometry has no segments.
    fn segment(&self, global_segment_index: usize) -> Option<Segment> {
        if !self.kind().has_segments() {
            return None;
        }

        let mut remaining = global_segment_index;
        let mut part_start = 0;
        for part_index in 0..self.part_count() {
            let point_count = self.point_count_in_part(part_index);
            let segment_count = point_count.saturating_sub(1);
            if remaining < segment_count {
                let from = self.point(part_start + remaining)?;
                let to = self.point(part_start + remaining + 1)?;
                return Some(Segment::new(from, to));
            }

            remaining -= segment_count;
            part_start += point_count;
        }

        None
    }

    /// Iterates over all segments, part after part.
    fn iter_segments(&self) -> impl Iterator<Item = Segment> {
        let mut global_index = 0;
        std::iter::from_fn(move || {
            let segment = self.segment(global_index)?;
            global_index += 1;
            Some(segment)
        })
    }
}
