//! Translation between part based vertex addresses and global vertex and segment indices.

use feature_diff_types::VertexSequence;
use serde::{Deserialize, Serialize};

use crate::error::ComparisonError;

/// Position of a vertex in a multi-part sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexAddress {
    part_index: usize,
    index_in_part: usize,
    is_last_in_part: bool,
}

impl VertexAddress {
    /// Creates a new address.
    pub fn new(part_index: usize, index_in_part: usize, is_last_in_part: bool) -> Self {
        Self {
            part_index,
            index_in_part,
            is_last_in_part,
        }
    }

    /// Index of the part.
    pub fn part_index(&self) -> usize {
        self.part_index
    }

    /// Index of the vertex inside its part.
    pub fn index_in_part(&self) -> usize {
        self.index_in_part
    }

    /// Whether this is the last vertex of its part.
    pub fn is_last_in_part(&self) -> bool {
        self.is_last_in_part
    }

    /// Address of the previous vertex in the same part, `None` for the first vertex of a part.
    pub fn previous(&self) -> Option<Self> {
        Some(Self {
            part_index: self.part_index,
            index_in_part: self.index_in_part.checked_sub(1)?,
            is_last_in_part: false,
        })
    }
}

/// Global index of the first vertex of every part of a sequence.
#[derive(Debug, Clone)]
pub struct PartStarts {
    // `prefix[k]` is the number of vertices in parts `0..k`; the last item is the total count.
    prefix: Vec<usize>,
}

impl PartStarts {
    /// Computes part starts of the sequence.
    pub fn new(sequence: &impl VertexSequence) -> Self {
        let mut prefix = Vec::with_capacity(sequence.part_count() + 1);
        let mut total = 0;
        prefix.push(total);
        for part_index in 0..sequence.part_count() {
            total += sequence.point_count_in_part(part_index);
            prefix.push(total);
        }

        Self { prefix }
    }

    /// Number of parts.
    pub fn part_count(&self) -> usize {
        self.prefix.len() - 1
    }

    /// Total number of vertices.
    pub fn point_count(&self) -> usize {
        self.prefix.last().copied().unwrap_or_default()
    }

    /// Number of vertices in the part.
    pub fn point_count_in_part(&self, part_index: usize) -> Option<usize> {
        Some(self.prefix.get(part_index + 1)? - self.prefix.get(part_index)?)
    }

    /// Global index of the vertex.
    pub fn global_vertex_index(&self, address: VertexAddress) -> Result<usize, ComparisonError> {
        let point_count = self.checked_point_count(address.part_index)?;
        if address.index_in_part >= point_count {
            return Err(ComparisonError::InconsistentState(format!(
                "vertex {} does not exist in part {} with {point_count} vertices",
                address.index_in_part, address.part_index
            )));
        }

        Ok(self.prefix[address.part_index] + address.index_in_part)
    }

    /// Global index of the segment starting at the vertex.
    pub fn global_segment_index(&self, address: VertexAddress) -> Result<usize, ComparisonError> {
        let point_count = self.checked_point_count(address.part_index)?;
        if address.index_in_part >= point_count.saturating_sub(1) {
            return Err(ComparisonError::InconsistentState(format!(
                "no segment starts at vertex {} of part {} with {point_count} vertices",
                address.index_in_part, address.part_index
            )));
        }

        // Empty parts have no segments, so they cannot be subtracted as one segment per part.
        let segments_before: usize = self.prefix[..=address.part_index]
            .windows(2)
            .map(|bounds| (bounds[1] - bounds[0]).saturating_sub(1))
            .sum();

        Ok(segments_before + address.index_in_part)
    }

    /// Address of the vertex with the given global index.
    pub fn vertex_address(&self, global_index: usize) -> Result<VertexAddress, ComparisonError> {
        if global_index >= self.point_count() {
            return Err(ComparisonError::InconsistentState(format!(
                "vertex {global_index} does not exist in a sequence with {} vertices",
                self.point_count()
            )));
        }

        // Empty parts share their start with the next part, the last part starting at or before the index wins.
        let part_index = self.prefix.partition_point(|start| *start <= global_index) - 1;
        let index_in_part = global_index - self.prefix[part_index];
        let point_count = self.prefix[part_index + 1] - self.prefix[part_index];

        Ok(VertexAddress::new(
            part_index,
            index_in_part,
            index_in_part + 1 == point_count,
        ))
    }

    /// Address of the first vertex of the segment with the given global index.
    pub fn segment_address(
        &self,
        global_segment_index: usize,
    ) -> Result<VertexAddress, ComparisonError> {
        let mut remaining = global_segment_index;
        for (part_index, bounds) in self.prefix.windows(2).enumerate() {
            let segment_count = (bounds[1] - bounds[0]).saturating_sub(1);
            if remaining < segment_count {
                return Ok(VertexAddress::new(part_index, remaining, false));
            }

            remaining -= segment_count;
        }

        Err(ComparisonError::InconsistentState(format!(
            "segment {global_segment_index} does not exist in a sequence with {} segments",
            global_segment_index - remaining
        )))
    }

    fn checked_point_count(&self, part_index: usize) -> Result<usize, ComparisonError> {
        self.point_count_in_part(part_index).ok_or_else(|| {
            ComparisonError::InconsistentState(format!(
                "part {part_index} does not exist in a sequence with {} parts",
                self.part_count()
            ))
        })
    }
}
