use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geometry_type::GeometryKind;
use crate::point::Point3d;
use crate::segment::Segment;
use crate::sequence::VertexSequence;
use crate::spatial_reference::SpatialReference;

/// Simple [`VertexSequence`] implementation.
///
/// Vertices of all parts are stored in one vector, parts are defined by the index of their first vertex.
/// Deserialization fails for empty parts and part starts that are out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeometryData")]
pub struct Geometry {
    kind: GeometryKind,
    points: Vec<Point3d>,
    part_starts: Vec<usize>,
    spatial_reference: SpatialReference,
}

#[derive(Deserialize)]
struct GeometryData {
    kind: GeometryKind,
    points: Vec<Point3d>,
    part_starts: Vec<usize>,
    spatial_reference: SpatialReference,
}

impl TryFrom<GeometryData> for Geometry {
    type Error = GeometryError;

    fn try_from(data: GeometryData) -> Result<Self, Self::Error> {
        let GeometryData {
            kind,
            points,
            part_starts,
            spatial_reference,
        } = data;

        match part_starts.first() {
            None if !points.is_empty() => {
                return Err(GeometryError::InvalidGeometry(
                    "geometry with vertices must have at least one part".into(),
                ))
            }
            Some(&first) if first != 0 => {
                return Err(GeometryError::InvalidGeometry(format!(
                    "first part must start at vertex 0, got {first}"
                )))
            }
            _ => {}
        }

        let points_len = points.len();
        let mut ends = part_starts.iter().skip(1).chain(std::iter::once(&points_len));
        for (part_index, start) in part_starts.iter().enumerate() {
            let end = ends.next().copied().unwrap_or(points.len());
            if end <= *start {
                return Err(GeometryError::InvalidGeometry(format!(
                    "part {part_index} starting at vertex {start} is empty"
                )));
            }
        }

        Ok(Self {
            kind,
            points,
            part_starts,
            spatial_reference,
        })
    }
}

impl Geometry {
    /// Creates a single point geometry.
    pub fn point(point: Point3d, spatial_reference: SpatialReference) -> Self {
        Self {
            kind: GeometryKind::Point,
            points: vec![point],
            part_starts: vec![0],
            spatial_reference,
        }
    }

    /// Creates a multipoint. All points are stored in a single part.
    pub fn multipoint(points: Vec<Point3d>, spatial_reference: SpatialReference) -> Self {
        Self {
            kind: GeometryKind::MultiPoint,
            part_starts: if points.is_empty() { vec![] } else { vec![0] },
            points,
            spatial_reference,
        }
    }

    /// Creates a polyline from a list of paths. Every path must have at least two vertices.
    pub fn polyline(
        paths: Vec<Vec<Point3d>>,
        spatial_reference: SpatialReference,
    ) -> Result<Self, GeometryError> {
        if let Some(path) = paths.iter().find(|path| path.len() < 2) {
            return Err(GeometryError::InvalidGeometry(format!(
                "polyline path must have at least 2 vertices, got {}",
                path.len()
            )));
        }

        Ok(Self::from_parts(
            GeometryKind::Polyline,
            paths,
            spatial_reference,
        ))
    }

    /// Creates a polygon from a list of rings.
    ///
    /// A ring that does not end with its start vertex is closed by repeating the start vertex. Every closed ring
    /// must have at least four vertices.
    pub fn polygon(
        rings: Vec<Vec<Point3d>>,
        spatial_reference: SpatialReference,
    ) -> Result<Self, GeometryError> {
        let mut closed_rings = Vec::with_capacity(rings.len());
        for mut ring in rings {
            match (ring.first(), ring.last()) {
                (Some(first), Some(last)) if !first.coincides(last) => ring.push(*first),
                _ => {}
            }

            if ring.len() < 4 {
                return Err(GeometryError::InvalidGeometry(format!(
                    "polygon ring must have at least 4 vertices, got {}",
                    ring.len()
                )));
            }

            closed_rings.push(ring);
        }

        Ok(Self::from_parts(
            GeometryKind::Polygon,
            closed_rings,
            spatial_reference,
        ))
    }

    /// Assembles a polyline from the segments. Consecutive segments are joined into one path if the end of
    /// the first one coincides with the start of the next one, otherwise a new path is started.
    pub fn polyline_from_segments(
        segments: impl IntoIterator<Item = Segment>,
        spatial_reference: SpatialReference,
    ) -> Self {
        let mut paths: Vec<Vec<Point3d>> = vec![];
        for segment in segments {
            match paths.last_mut() {
                Some(path) if path.last().is_some_and(|last| last.coincides(segment.from())) => {
                    path.push(*segment.to());
                }
                _ => paths.push(vec![*segment.from(), *segment.to()]),
            }
        }

        Self::from_parts(GeometryKind::Polyline, paths, spatial_reference)
    }

    fn from_parts(
        kind: GeometryKind,
        parts: Vec<Vec<Point3d>>,
        spatial_reference: SpatialReference,
    ) -> Self {
        let mut points = Vec::with_capacity(parts.iter().map(Vec::len).sum());
        let mut part_starts = Vec::with_capacity(parts.len());
        for part in parts {
            part_starts.push(points.len());
            points.extend(part);
        }

        Self {
            kind,
            points,
            part_starts,
            spatial_reference,
        }
    }

    /// Vertices of the part with the given index.
    pub fn part(&self, part_index: usize) -> Option<&[Point3d]> {
        let start = *self.part_starts.get(part_index)?;
        let end = self
            .part_starts
            .get(part_index + 1)
            .copied()
            .unwrap_or(self.points.len());
        self.points.get(start..end)
    }

    /// Iterates over the parts.
    pub fn parts(&self) -> impl Iterator<Item = &[Point3d]> {
        (0..self.part_starts.len()).filter_map(|part_index| self.part(part_index))
    }

    /// Whether the geometry has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Replaces the vertex with the given global index.
    ///
    /// Note that for polygons the start and the end vertex of a ring are separate vertices, moving one of them
    /// without the other leaves the ring open.
    pub fn update_point(
        &mut self,
        global_index: usize,
        point: Point3d,
    ) -> Result<(), GeometryError> {
        let len = self.points.len();
        let vertex = self
            .points
            .get_mut(global_index)
            .ok_or(GeometryError::IndexOutOfRange {
                index: global_index,
                len,
            })?;
        *vertex = point;

        Ok(())
    }

    /// Appends a vertex to the end of the last part.
    pub fn push_point(&mut self, point: Point3d) {
        if self.part_starts.is_empty() {
            self.part_starts.push(0);
        }

        self.points.push(point);
    }

    /// Global index of the first vertex of every part.
    pub fn part_starts(&self) -> &[usize] {
        &self.part_starts
    }
}

impl VertexSequence for Geometry {
    fn kind(&self) -> GeometryKind {
        self.kind
    }

    fn spatial_reference(&self) -> &SpatialReference {
        &self.spatial_reference
    }

    fn part_count(&self) -> usize {
        self.part_starts.len()
    }

    fn point_count_in_part(&self, part_index: usize) -> usize {
        self.part(part_index).map_or(0, <[Point3d]>::len)
    }

    fn iter_points(&self) -> impl Iterator<Item = &'_ Point3d> {
        self.points.iter()
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn coordinates(&self) -> Vec<Point3d> {
        self.points.clone()
    }

    fn point(&self, global_index: usize) -> Option<Point3d> {
        self.points.get(global_index).copied()
    }

    fn segment(&self, global_segment_index: usize) -> Option<Segment> {
        if !self.kind.has_segments() {
            return None;
        }

        let mut first_in_part = 0;
        for part in self.parts() {
            let segment_count = part.len().saturating_sub(1);
            if global_segment_index < first_in_part + segment_count {
                let index_in_part = global_segment_index - first_in_part;
                return Some(Segment::new(
                    *part.get(index_in_part)?,
                    *part.get(index_in_part + 1)?,
                ));
            }

            first_in_part += segment_count;
        }

        None
    }
}
