//! See documentation for [`GeometryComparison`].

use std::cell::OnceCell;
use std::collections::BTreeMap;

use feature_diff_types::{
    Geometry, GeometryKind, IndexedGeometry, Point3d, Segment, VertexSequence,
};
use web_time::Instant;

use crate::addressing::{PartStarts, VertexAddress};
use crate::builder::ComparisonBuilder;
use crate::differ::SequenceDiffer;
use crate::error::ComparisonError;
use crate::index::{CoordinateIndex, Dimensions, IndexEntry};
use crate::tolerance::Tolerance;

/// Compares the vertices of a *base* and a *compare* version of the same feature.
///
/// The comparison borrows both geometries for its whole lifetime and lazily builds the indices it needs on the
/// first query that requires them. Indices are never rebuilt, so repeated queries are cheap.
///
/// ```
/// use feature_diff::GeometryComparison;
/// use feature_diff::feature_diff_types::{Geometry, Point3d, SpatialReference};
///
/// let sr = SpatialReference::new("LV95", 0.001, 0.01);
/// let square = |moved_y: f64| {
///     Geometry::polygon(
///         vec![vec![
///             Point3d::new_2d(0.0, 0.0),
///             Point3d::new_2d(10.0, moved_y),
///             Point3d::new_2d(10.0, 10.0),
///             Point3d::new_2d(0.0, 10.0),
///         ]],
///         sr.clone(),
///     )
///     .unwrap()
/// };
///
/// let base = square(0.0);
/// let compare = square(0.5);
/// let comparison = GeometryComparison::new(&base, &compare).unwrap();
///
/// assert_eq!(comparison.different_vertices(true).unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct GeometryComparison<'a, G: VertexSequence> {
    base: &'a G,
    compare: &'a G,
    tolerance: Tolerance,

    base_index_2d: OnceCell<CoordinateIndex>,
    base_index_3d: OnceCell<CoordinateIndex>,
    compare_index_2d: OnceCell<CoordinateIndex>,
    compare_index_3d: OnceCell<CoordinateIndex>,
    base_part_starts: OnceCell<PartStarts>,
    compare_part_starts: OnceCell<PartStarts>,
    compare_indexed: OnceCell<IndexedGeometry>,
}

/// Result of [`GeometryComparison::differing_segments`].
#[derive(Debug, Clone)]
pub struct SegmentDifference {
    /// Base segments adjacent to the base vertices that are not contained in the compare geometry.
    pub line: Geometry,
    /// Base vertices that have no vertex with the same 3D key in the compare geometry.
    pub different_points: Vec<IndexEntry>,
}

impl<'a, G: VertexSequence> GeometryComparison<'a, G> {
    /// Creates a comparison using the resolution of the base spatial reference as tolerance. Z values are compared
    /// only if the base spatial reference is Z-aware.
    pub fn new(base: &'a G, compare: &'a G) -> Result<Self, ComparisonError> {
        let tolerance = Tolerance::from_resolution(base.spatial_reference())?;
        Self::with_tolerance(base, compare, tolerance)
    }

    /// Creates a comparison with explicit tolerance.
    pub fn with_tolerance(
        base: &'a G,
        compare: &'a G,
        tolerance: Tolerance,
    ) -> Result<Self, ComparisonError> {
        let base_sr = base.spatial_reference();
        let compare_sr = compare.spatial_reference();
        if !base_sr.is_same_xy_frame(compare_sr) {
            return Err(ComparisonError::InvalidArgument(format!(
                "spatial references are not equal: {base_sr:?} and {compare_sr:?}"
            )));
        }

        if !base_sr.has_compatible_z(compare_sr) {
            return Err(ComparisonError::InvalidArgument(format!(
                "z resolutions are not equal: {} and {}",
                base_sr.z_resolution(),
                compare_sr.z_resolution()
            )));
        }

        if base.point_count() == 0 || compare.point_count() == 0 {
            return Err(ComparisonError::InvalidArgument(
                "cannot compare empty geometries".into(),
            ));
        }

        Ok(Self {
            base,
            compare,
            tolerance,
            base_index_2d: OnceCell::new(),
            base_index_3d: OnceCell::new(),
            compare_index_2d: OnceCell::new(),
            compare_index_3d: OnceCell::new(),
            base_part_starts: OnceCell::new(),
            compare_part_starts: OnceCell::new(),
            compare_indexed: OnceCell::new(),
        })
    }

    /// Starts configuring a comparison. See [`ComparisonBuilder`].
    pub fn builder(base: &'a G, compare: &'a G) -> ComparisonBuilder<'a, G> {
        ComparisonBuilder::new(base, compare)
    }

    /// Base geometry.
    pub fn base(&self) -> &'a G {
        self.base
    }

    /// Compare geometry.
    pub fn compare(&self) -> &'a G {
        self.compare
    }

    /// Tolerance of the comparison.
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Base vertices, in their original order, that have no vertex with the same key in the compare geometry.
    ///
    /// This is a fast hash based check. Vertices within tolerance of each other may still have different keys when
    /// they lie near a grid cell border, so the result can contain vertices that are equal within tolerance to a
    /// compare vertex. Duplicate base vertices are listed once.
    pub fn approximate_difference(
        &self,
        mode: Dimensions,
    ) -> Result<Vec<IndexEntry>, ComparisonError> {
        let base_index = self.base_index(mode)?;
        let compare_index = self.compare_index(mode)?;

        let difference: Vec<IndexEntry> = base_index
            .entries()
            .iter()
            .filter(|entry| !compare_index.contains(&entry.point))
            .copied()
            .collect();

        log::debug!(
            "{} of {} base vertices are not in the compare geometry ({mode:?})",
            difference.len(),
            base_index.len()
        );

        Ok(difference)
    }

    /// Returns true if the compare geometry has a vertex equal to the point in 3D, or if the point lies on a
    /// compare segment within the XY tolerance with Z within the Z tolerance.
    pub fn compare_contains_point_3d(&self, point: &Point3d) -> Result<bool, ComparisonError> {
        if self.compare_index(Dimensions::Xyz)?.contains(point) {
            return Ok(true);
        }

        let index_2d = self.compare_index(Dimensions::Xy)?;
        if let Some(entry) = index_2d.get(point) {
            if self.tolerance.is_same_z(point, &entry.point) {
                return Ok(true);
            }

            let Some(duplicates) = index_2d.duplicates(point) else {
                return Ok(false);
            };

            for address in duplicates {
                if self
                    .tolerance
                    .is_same_point(point, &self.compare_point(*address)?)
                {
                    return Ok(true);
                }
            }
        }

        Ok(!self.compare_indexed().is_disjoint_3d(point))
    }

    /// Vertices that differ between the geometries. Duplicate vertices are reported for multipoints only.
    ///
    /// If `symmetric` is false, only the base vertices missing in the compare geometry are returned.
    pub fn different_vertices(&self, symmetric: bool) -> Result<Vec<Point3d>, ComparisonError> {
        let report_duplicates = self.base.kind() == GeometryKind::MultiPoint;
        self.different_vertices_with(symmetric, report_duplicates)
    }

    /// Vertices that differ between the geometries.
    ///
    /// With `report_duplicates` a vertex present more times in one geometry than in the other is a difference.
    /// Vertices are returned sorted, not in the order of the geometry. A single point is compared directly to a
    /// single point.
    pub fn different_vertices_with(
        &self,
        symmetric: bool,
        report_duplicates: bool,
    ) -> Result<Vec<Point3d>, ComparisonError> {
        if self.base.kind() == GeometryKind::Point && self.compare.kind() == GeometryKind::Point {
            return self.different_points(symmetric);
        }

        let base = self.base.coordinates();
        let compare = self.compare.coordinates();
        let difference = SequenceDiffer::new(self.tolerance)
            .with_report_duplicates(report_duplicates)
            .with_base_only(!symmetric)
            .diff(&base, &compare);

        log::debug!(
            "Found {} different vertices (symmetric: {symmetric}, duplicates: {report_duplicates})",
            difference.len()
        );

        Ok(difference)
    }

    fn different_points(&self, symmetric: bool) -> Result<Vec<Point3d>, ComparisonError> {
        let base = self.base_point(VertexAddress::new(0, 0, true))?;
        let compare = self.compare_point(VertexAddress::new(0, 0, true))?;

        Ok(if self.tolerance.is_same_point(&base, &compare) {
            vec![]
        } else if symmetric {
            vec![base, compare]
        } else {
            vec![base]
        })
    }

    /// Returns true if the geometries have no different vertices.
    ///
    /// With `ignore_duplicates` a vertex present more times in one geometry than in the other is not a difference.
    pub fn have_same_vertices(&self, ignore_duplicates: bool) -> Result<bool, ComparisonError> {
        Ok(self
            .different_vertices_with(true, !ignore_duplicates)?
            .is_empty())
    }

    /// Base segments that are not part of the compare geometry.
    ///
    /// For every base vertex that is not contained in the compare geometry (see
    /// [`GeometryComparison::compare_contains_point_3d`]) both adjacent base segments are taken. The segments are
    /// ordered by their position in the base geometry and joined into a polyline.
    ///
    /// Only geometries with segments are supported.
    pub fn differing_segments(&self) -> Result<SegmentDifference, ComparisonError> {
        let kind = self.base.kind();
        if !kind.has_segments() {
            return Err(ComparisonError::UnsupportedGeometryKind(kind));
        }

        let start = Instant::now();
        let different_points = self.approximate_difference(Dimensions::Xyz)?;

        let mut segments = BTreeMap::new();
        for entry in &different_points {
            if self.compare_contains_point_3d(&entry.point)? {
                continue;
            }

            if let Some(previous) = entry.address.previous() {
                self.add_segment(&mut segments, previous)?;
            }

            if !entry.address.is_last_in_part() {
                self.add_segment(&mut segments, entry.address)?;
            }
        }

        let segment_count = segments.len();
        let line = Geometry::polyline_from_segments(
            segments.into_values(),
            self.base.spatial_reference().clone(),
        );

        log::debug!(
            "Found {segment_count} differing segments in {} ms",
            start.elapsed().as_millis()
        );

        Ok(SegmentDifference {
            line,
            different_points,
        })
    }

    fn add_segment(
        &self,
        segments: &mut BTreeMap<(usize, usize), Segment>,
        from: VertexAddress,
    ) -> Result<(), ComparisonError> {
        let key = (from.part_index(), from.index_in_part());
        if !segments.contains_key(&key) {
            segments.insert(key, self.base_segment(from)?);
        }

        Ok(())
    }

    /// Base segment starting at the vertex.
    pub fn base_segment(&self, from: VertexAddress) -> Result<Segment, ComparisonError> {
        let global_index = self.base_part_starts().global_segment_index(from)?;
        self.base.segment(global_index).ok_or_else(|| {
            ComparisonError::InconsistentState(format!(
                "base geometry has no segment {global_index}"
            ))
        })
    }

    /// Base vertex at the address.
    pub fn base_point(&self, address: VertexAddress) -> Result<Point3d, ComparisonError> {
        let global_index = self.base_part_starts().global_vertex_index(address)?;
        self.base.point(global_index).ok_or_else(|| {
            ComparisonError::InconsistentState(format!(
                "base geometry has no vertex {global_index}"
            ))
        })
    }

    /// Compare vertex at the address.
    pub fn compare_point(&self, address: VertexAddress) -> Result<Point3d, ComparisonError> {
        let global_index = self.compare_part_starts().global_vertex_index(address)?;
        self.compare.point(global_index).ok_or_else(|| {
            ComparisonError::InconsistentState(format!(
                "compare geometry has no vertex {global_index}"
            ))
        })
    }

    fn base_index(&self, mode: Dimensions) -> Result<&CoordinateIndex, ComparisonError> {
        let cell = match mode {
            Dimensions::Xy => &self.base_index_2d,
            Dimensions::Xyz => &self.base_index_3d,
        };

        cached(cell, || {
            CoordinateIndex::build(self.base, &self.tolerance, mode)
        })
    }

    fn compare_index(&self, mode: Dimensions) -> Result<&CoordinateIndex, ComparisonError> {
        let cell = match mode {
            Dimensions::Xy => &self.compare_index_2d,
            Dimensions::Xyz => &self.compare_index_3d,
        };

        cached(cell, || {
            CoordinateIndex::build(self.compare, &self.tolerance, mode)
        })
    }

    fn base_part_starts(&self) -> &PartStarts {
        self.base_part_starts
            .get_or_init(|| PartStarts::new(self.base))
    }

    fn compare_part_starts(&self) -> &PartStarts {
        self.compare_part_starts
            .get_or_init(|| PartStarts::new(self.compare))
    }

    fn compare_indexed(&self) -> &IndexedGeometry {
        self.compare_indexed.get_or_init(|| {
            IndexedGeometry::new(self.compare, self.tolerance.xy(), self.tolerance.z())
        })
    }
}

fn cached<T>(
    cell: &OnceCell<T>,
    init: impl FnOnce() -> Result<T, ComparisonError>,
) -> Result<&T, ComparisonError> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }

    let value = init()?;
    Ok(cell.get_or_init(|| value))
}
