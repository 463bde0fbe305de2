//! Order based difference of two vertex lists.
//!
//! Both lists are sorted with [`Tolerance::cmp_points`] and walked with two cursors. Vertices that find no partner
//! within tolerance on the other side are reported. No sort order keeps all vertices that are equal within tolerance
//! next to each other, so vertices left without partner on both sides are matched once more against each other.
//! Runs of vertices equal to their predecessor are tracked separately, so that a vertex present twice in one list
//! and once in the other can be reported as a difference.
//!
//! The lists are compared as multisets: two sequences visiting the same vertices in a different order have no
//! difference.

use ahash::AHashMap;
use feature_diff_types::Point3d;

use crate::tolerance::Tolerance;

/// Computes differences between two vertex lists.
#[derive(Debug, Clone, Copy)]
pub struct SequenceDiffer {
    tolerance: Tolerance,
    report_duplicates: bool,
    base_only: bool,
}

impl SequenceDiffer {
    /// Creates a differ reporting the symmetric difference without duplicates.
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            report_duplicates: false,
            base_only: false,
        }
    }

    /// Report vertices whose duplicate count differs between the lists.
    pub fn with_report_duplicates(mut self, report_duplicates: bool) -> Self {
        self.report_duplicates = report_duplicates;
        self
    }

    /// Report only vertices of the base list that are missing in the compare list.
    pub fn with_base_only(mut self, base_only: bool) -> Self {
        self.base_only = base_only;
        self
    }

    /// Vertices that differ between the lists, in the order they are found while walking the sorted lists.
    pub fn diff(&self, base: &[Point3d], compare: &[Point3d]) -> Vec<Point3d> {
        let mut a = base.to_vec();
        let mut b = compare.to_vec();
        self.tolerance.sort_points(&mut a);
        self.tolerance.sort_points(&mut b);

        // Compare side vertices are collected in one-sided mode too, they are needed to cancel out pairs.
        let mut unmatched = vec![];
        let mut i = 0;
        let mut j = 0;

        while i < a.len() && j < b.len() {
            let mut in_sync = self.is_same(&a[i], &b[j]);

            if !in_sync {
                let base_point = a[i];
                let compare_point = b[j];

                in_sync = self.advance_until_match(
                    &b,
                    &mut j,
                    &base_point,
                    Side::Compare,
                    &mut unmatched,
                );

                if !in_sync {
                    in_sync = self.advance_until_match(
                        &a,
                        &mut i,
                        &compare_point,
                        Side::Base,
                        &mut unmatched,
                    );
                }
            }

            if in_sync {
                i += 1;
                j += 1;
            }

            while self.same_as_previous(&a, i) {
                if in_sync && self.same_as_previous(&b, j) {
                    j += 1;
                } else if self.report_duplicates {
                    unmatched.push(Unmatched::new(Side::Base, a[i]));
                }

                i += 1;
            }

            while self.same_as_previous(&b, j) {
                if self.report_duplicates {
                    unmatched.push(Unmatched::new(Side::Compare, b[j]));
                }

                j += 1;
            }
        }

        self.add_remaining(&a, i, Side::Base, &mut unmatched);
        self.add_remaining(&b, j, Side::Compare, &mut unmatched);

        let cancelled = self.cancel_pairs(&mut unmatched);
        let result: Vec<Point3d> = unmatched
            .into_iter()
            .filter(|item| !self.base_only || item.side == Side::Base)
            .map(|item| item.point)
            .collect();

        log::trace!(
            "Compared {} base and {} compare vertices: {} differences, {} pairs matched out of order",
            a.len(),
            b.len(),
            result.len(),
            cancelled
        );

        result
    }

    fn is_same(&self, a: &Point3d, b: &Point3d) -> bool {
        self.tolerance.is_same_point(a, b)
    }

    fn same_as_previous(&self, points: &[Point3d], index: usize) -> bool {
        index >= 1 && index < points.len() && self.is_same(&points[index], &points[index - 1])
    }

    // Moves the cursor forward while the vertices are not greater than `target`. Stops at the first vertex equal to
    // `target` within tolerance and returns true. Skipped vertices are collected as unmatched.
    fn advance_until_match(
        &self,
        points: &[Point3d],
        index: &mut usize,
        target: &Point3d,
        side: Side,
        unmatched: &mut Vec<Unmatched>,
    ) -> bool {
        while *index < points.len()
            && self.tolerance.cmp_points(target, &points[*index]) != std::cmp::Ordering::Less
        {
            if self.is_same(target, &points[*index]) {
                return true;
            }

            if self.report_duplicates || !self.same_as_previous(points, *index) {
                unmatched.push(Unmatched::new(side, points[*index]));
            }

            *index += 1;
        }

        false
    }

    fn add_remaining(
        &self,
        points: &[Point3d],
        from: usize,
        side: Side,
        unmatched: &mut Vec<Unmatched>,
    ) {
        for index in from..points.len() {
            if self.report_duplicates || !self.same_as_previous(points, index) {
                unmatched.push(Unmatched::new(side, points[index]));
            }
        }
    }

    // The sorted walk only finds partners that are adjacent in the sort order. Two vertices equal within tolerance
    // can still be separated by other vertices when they lie in different grid cells. Such pairs are left unmatched
    // on both sides and are removed here. Returns the number of removed pairs.
    fn cancel_pairs(&self, unmatched: &mut Vec<Unmatched>) -> usize {
        let grid = self.tolerance.sort_quantizer();
        let cell = |point: &Point3d| {
            let key = grid.key(point);
            (key.x(), key.y())
        };

        let mut compare_cells: AHashMap<(i64, i64), Vec<usize>> = AHashMap::new();
        for (position, item) in unmatched.iter().enumerate() {
            if item.side == Side::Compare {
                compare_cells
                    .entry(cell(&item.point))
                    .or_default()
                    .push(position);
            }
        }

        if compare_cells.is_empty() {
            return 0;
        }

        let mut removed = vec![false; unmatched.len()];
        let mut pairs = 0;
        for position in 0..unmatched.len() {
            if unmatched[position].side != Side::Base {
                continue;
            }

            let point = unmatched[position].point;
            let (x, y) = cell(&point);
            let partner = neighbour_cells(x, y).find_map(|neighbour| {
                compare_cells.get(&neighbour)?.iter().copied().find(|candidate| {
                    !removed[*candidate] && self.is_same(&point, &unmatched[*candidate].point)
                })
            });

            if let Some(partner) = partner {
                removed[position] = true;
                removed[partner] = true;
                pairs += 1;
            }
        }

        let mut removed = removed.into_iter();
        unmatched.retain(|_| !removed.next().unwrap_or_default());

        pairs
    }
}

// A cell and its eight neighbours. Cells are as large as the tolerance, so points equal within tolerance are never
// further than one cell apart.
fn neighbour_cells(x: i64, y: i64) -> impl Iterator<Item = (i64, i64)> {
    (-1..=1).flat_map(move |dx| (-1..=1).map(move |dy| (x.saturating_add(dx), y.saturating_add(dy))))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Base,
    Compare,
}

#[derive(Debug, Clone, Copy)]
struct Unmatched {
    side: Side,
    point: Point3d,
}

impl Unmatched {
    fn new(side: Side, point: Point3d) -> Self {
        Self { side, point }
    }
}

/// Vertices that differ between the lists.
///
/// With `base_only` only base vertices missing in the compare list are reported.
pub fn changed_vertices(
    base: &[Point3d],
    compare: &[Point3d],
    tolerance: Tolerance,
    report_duplicates: bool,
    base_only: bool,
) -> Vec<Point3d> {
    SequenceDiffer::new(tolerance)
        .with_report_duplicates(report_duplicates)
        .with_base_only(base_only)
        .diff(base, compare)
}

/// Returns true if the symmetric difference of the lists is empty.
///
/// With `ignore_duplicates` a vertex present twice in one list and once in the other is not a difference.
pub fn have_same_vertices(
    base: &[Point3d],
    compare: &[Point3d],
    tolerance: Tolerance,
    ignore_duplicates: bool,
) -> bool {
    changed_vertices(base, compare, tolerance, !ignore_duplicates, false).is_empty()
}
