//! Hash index of the vertices of a sequence keyed by their tolerance grid cell.

use ahash::AHashMap;
use feature_diff_types::{Point3d, VertexSequence};

use crate::addressing::VertexAddress;
use crate::error::ComparisonError;
use crate::tolerance::{QuantizedPoint, Quantizer, Tolerance};

/// Coordinates taken into account by a [`CoordinateIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensions {
    /// Only X and Y are compared.
    Xy,
    /// X, Y and Z are compared (if the tolerance has a Z component).
    Xyz,
}

/// Indexed vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    /// Coordinates of the vertex.
    pub point: Point3d,
    /// Position of the vertex in the indexed sequence.
    pub address: VertexAddress,
}

/// Maps quantized vertex coordinates to the address of the first vertex with these coordinates.
///
/// If an XY index is built with a tolerance that compares Z, vertices that share a key with an already indexed
/// vertex are additionally collected into a duplicates bucket of that key. Such vertices are at the same XY location
/// but may differ in Z, e.g. on a vertical segment.
#[derive(Debug)]
pub struct CoordinateIndex {
    mode: Dimensions,
    quantizer: Quantizer,
    entries: Vec<IndexEntry>,
    primary: AHashMap<QuantizedPoint, usize>,
    duplicates: AHashMap<QuantizedPoint, Vec<VertexAddress>>,
}

impl CoordinateIndex {
    /// Indexes the vertices of the sequence.
    pub fn build(
        sequence: &impl VertexSequence,
        tolerance: &Tolerance,
        mode: Dimensions,
    ) -> Result<Self, ComparisonError> {
        let collect_duplicates = mode == Dimensions::Xy && tolerance.has_z();
        let quantizer = match mode {
            Dimensions::Xy => tolerance.ignoring_z().quantizer(),
            Dimensions::Xyz => tolerance.quantizer(),
        };

        let part_count = sequence.part_count();
        let mut index = Self {
            mode,
            quantizer,
            entries: Vec::with_capacity(sequence.point_count()),
            primary: AHashMap::with_capacity(sequence.point_count()),
            duplicates: AHashMap::new(),
        };

        let mut part_index = 0;
        let mut index_in_part = 0;
        for point in sequence.iter_points() {
            while part_index < part_count && sequence.point_count_in_part(part_index) == 0 {
                part_index += 1;
            }

            if part_index >= part_count {
                return Err(ComparisonError::InconsistentState(format!(
                    "sequence has more vertices than its {part_count} parts contain"
                )));
            }

            let is_last_in_part = index_in_part + 1 == sequence.point_count_in_part(part_index);
            let address = VertexAddress::new(part_index, index_in_part, is_last_in_part);
            index.insert(*point, address, collect_duplicates);

            if is_last_in_part {
                part_index += 1;
                index_in_part = 0;
            } else {
                index_in_part += 1;
            }
        }

        let remaining = (part_index..part_count).any(|part| sequence.point_count_in_part(part) > 0);
        if index_in_part != 0 || remaining {
            return Err(ComparisonError::InconsistentState(format!(
                "sequence has fewer vertices than its {part_count} parts contain"
            )));
        }

        log::debug!(
            "Built {:?} coordinate index: {} unique keys, {} duplicate buckets",
            mode,
            index.entries.len(),
            index.duplicates.len()
        );

        Ok(index)
    }

    fn insert(&mut self, point: Point3d, address: VertexAddress, collect_duplicates: bool) {
        let key = self.quantizer.key(&point);
        match self.primary.get(&key) {
            None => {
                self.primary.insert(key, self.entries.len());
                self.entries.push(IndexEntry { point, address });
            }
            Some(&first) if collect_duplicates => {
                let first_address = self.entries[first].address;
                self.duplicates
                    .entry(key)
                    .or_insert_with(|| vec![first_address])
                    .push(address);
            }
            Some(_) => {}
        }
    }

    /// Dimensions the index was built for.
    pub fn mode(&self) -> Dimensions {
        self.mode
    }

    /// First indexed vertex with the same key as the point.
    pub fn get(&self, point: &Point3d) -> Option<&IndexEntry> {
        let position = *self.primary.get(&self.quantizer.key(point))?;
        self.entries.get(position)
    }

    /// Whether a vertex with the same key as the point is indexed.
    pub fn contains(&self, point: &Point3d) -> bool {
        self.primary.contains_key(&self.quantizer.key(point))
    }

    /// All vertices with the same key as the point, including the first one. `None` if the key has a single vertex
    /// or duplicates are not collected by this index.
    pub fn duplicates(&self, point: &Point3d) -> Option<&[VertexAddress]> {
        self.duplicates
            .get(&self.quantizer.key(point))
            .map(Vec::as_slice)
    }

    /// First vertex of every key, in the order of the vertices in the sequence.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of unique keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use feature_diff_types::{Geometry, GeometryKind, SpatialReference};

    fn sr() -> SpatialReference {
        SpatialReference::new("LV95", 0.0001, 0.001).with_z(0.0001, 0.001)
    }

    #[test]
    fn ring_closing_vertex_is_not_unique() {
        let ring = Geometry::polygon(
            vec![vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(10.0, 0.0, 0.0),
                Point3d::new(10.0, 10.0, 0.0),
                Point3d::new(0.0, 10.0, 0.0),
            ]],
            sr(),
        )
        .unwrap();
        let tolerance = Tolerance::new(0.01, 0.01).unwrap();

        let index = CoordinateIndex::build(&ring, &tolerance, Dimensions::Xyz).unwrap();
        assert_eq!(index.mode(), Dimensions::Xyz);
        assert_eq!(index.len(), 4);
        assert_eq!(
            index.get(&Point3d::new(0.0, 0.0, 0.0)).unwrap().address,
            VertexAddress::new(0, 0, false)
        );
        assert_eq!(
            index.entries()[3].address,
            VertexAddress::new(0, 3, false)
        );
        assert!(index.duplicates(&Point3d::new(0.0, 0.0, 0.0)).is_none());

        let index = CoordinateIndex::build(&ring, &tolerance, Dimensions::Xy).unwrap();
        assert_eq!(
            index.duplicates(&Point3d::new(0.0, 0.0, 0.0)).unwrap(),
            &[VertexAddress::new(0, 0, false), VertexAddress::new(0, 4, true)]
        );
    }

    #[test]
    fn vertical_segment_in_xy_index() {
        let line = Geometry::polyline(
            vec![vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(5.0, 0.0, 0.0),
                Point3d::new(5.0, 0.0, 10.0),
                Point3d::new(5.0, 0.0, 20.0),
            ]],
            sr(),
        )
        .unwrap();
        let tolerance = Tolerance::new(0.01, 0.01).unwrap();

        let index_3d = CoordinateIndex::build(&line, &tolerance, Dimensions::Xyz).unwrap();
        assert_eq!(index_3d.len(), 4);
        assert!(index_3d.contains(&Point3d::new(5.0, 0.0, 10.0)));
        assert!(!index_3d.contains(&Point3d::new(5.0, 0.0, 15.0)));

        let index_2d = CoordinateIndex::build(&line, &tolerance, Dimensions::Xy).unwrap();
        assert_eq!(index_2d.len(), 2);
        assert!(index_2d.contains(&Point3d::new(5.0, 0.0, 15.0)));
        assert_eq!(index_2d.duplicates(&Point3d::new_2d(5.0, 0.0)).unwrap().len(), 3);
    }

    #[test]
    fn no_duplicates_without_z_tolerance() {
        let line = Geometry::polyline(
            vec![vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(0.0, 0.0, 10.0)]],
            sr(),
        )
        .unwrap();
        let tolerance = Tolerance::xy_only(0.01).unwrap();

        let index = CoordinateIndex::build(&line, &tolerance, Dimensions::Xy).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.duplicates(&Point3d::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn last_vertex_of_every_part() {
        let p = |x: f64| Point3d::new_2d(x, 0.0);
        let line = Geometry::polyline(
            vec![vec![p(0.0), p(1.0)], vec![p(2.0), p(3.0), p(4.0)]],
            sr(),
        )
        .unwrap();
        let tolerance = Tolerance::xy_only(0.01).unwrap();

        let index = CoordinateIndex::build(&line, &tolerance, Dimensions::Xy).unwrap();
        let last: Vec<bool> = index
            .entries()
            .iter()
            .map(|entry| entry.address.is_last_in_part())
            .collect();
        assert_eq!(last, vec![false, true, false, false, true]);
        assert_eq!(
            index.get(&p(3.0)).unwrap().address,
            VertexAddress::new(1, 1, false)
        );
    }

    struct Inconsistent {
        points: Vec<Point3d>,
        reported_count: usize,
        sr: SpatialReference,
    }

    impl VertexSequence for Inconsistent {
        fn kind(&self) -> GeometryKind {
            GeometryKind::Polyline
        }

        fn spatial_reference(&self) -> &SpatialReference {
            &self.sr
        }

        fn part_count(&self) -> usize {
            1
        }

        fn point_count_in_part(&self, _part_index: usize) -> usize {
            self.reported_count
        }

        fn iter_points(&self) -> impl Iterator<Item = &'_ Point3d> {
            self.points.iter()
        }
    }

    #[test]
    fn inconsistent_counts() {
        let tolerance = Tolerance::xy_only(0.01).unwrap();
        let points = vec![
            Point3d::new_2d(0.0, 0.0),
            Point3d::new_2d(1.0, 0.0),
            Point3d::new_2d(2.0, 0.0),
        ];

        let too_many = Inconsistent {
            points: points.clone(),
            reported_count: 2,
            sr: sr(),
        };
        assert_matches!(
            CoordinateIndex::build(&too_many, &tolerance, Dimensions::Xy),
            Err(ComparisonError::InconsistentState(_))
        );

        let too_few = Inconsistent {
            points,
            reported_count: 4,
            sr: sr(),
        };
        assert_matches!(
            CoordinateIndex::build(&too_few, &tolerance, Dimensions::Xy),
            Err(ComparisonError::InconsistentState(_))
        );
    }
}
