//! Tolerance-aware comparison of two versions of a feature geometry.
//!
//! Given a *base* and a *compare* geometry, [`GeometryComparison`] answers which vertices or segments differ between
//! them when coordinates closer than a tolerance are treated as equal. Geometries are accessed through the
//! [`VertexSequence`](feature_diff_types::VertexSequence) trait, so any vertex storage can be compared.
//!
//! Two kinds of queries are offered:
//!
//! * fast hash based lookups ([`GeometryComparison::approximate_difference`],
//!   [`GeometryComparison::differing_segments`]) that snap coordinates to a fine grid and may report vertices near
//!   a grid cell border as different;
//! * an exact difference of the sorted vertex lists ([`GeometryComparison::different_vertices`]) with symmetric or
//!   one-sided results and optional reporting of duplicate vertices.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod addressing;
mod builder;
mod comparison;
pub mod differ;
pub mod error;
pub mod index;
pub mod tolerance;

pub use addressing::{PartStarts, VertexAddress};
pub use builder::ComparisonBuilder;
pub use comparison::{GeometryComparison, SegmentDifference};
pub use error::ComparisonError;
pub use index::{CoordinateIndex, Dimensions, IndexEntry};
pub use tolerance::Tolerance;

pub use feature_diff_types;
