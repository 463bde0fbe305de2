//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Geometry cannot be constructed from the given vertices.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Vertex index does not exist in the geometry.
    #[error("vertex index {index} is out of range, geometry has {len} vertices")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of vertices in the geometry.
        len: usize,
    },
}
