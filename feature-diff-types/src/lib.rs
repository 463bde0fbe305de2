//! Geometry model used by the `feature-diff` comparison engine.
//!
//! The engine works with anything that implements [`VertexSequence`]: an ordered list of vertices grouped in
//! parts. [`Geometry`] is a simple owned implementation of it, [`IndexedGeometry`] is a spatially indexed copy of a
//! sequence for point-on-geometry tests.

mod error;
pub use error::GeometryError;

mod geometry;
pub use geometry::Geometry;

pub mod geometry_type;
pub use geometry_type::GeometryKind;

mod indexed;
pub use indexed::IndexedGeometry;

mod point;
pub use point::Point3d;

pub mod segment;
pub use segment::Segment;

pub mod sequence;
pub use sequence::VertexSequence;

mod spatial_reference;
pub use spatial_reference::{Precision, SpatialReference};
