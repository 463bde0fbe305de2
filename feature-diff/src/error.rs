//! Error types used by the crate.

use feature_diff_types::GeometryKind;
use thiserror::Error;

/// Comparison error type.
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// Inputs or tolerances cannot be compared.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not defined for this kind of geometry.
    #[error("operation is not supported for {0:?} geometries")]
    UnsupportedGeometryKind(GeometryKind),
    /// Vertex sequence reports counts that do not match its vertices, or a vertex address does not exist in it.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
