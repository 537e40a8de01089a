//! Hierarchical multi-order coverage of the sphere.
//!
//! The sphere is tessellated by a dyadic hierarchical pixelization: each
//! resolution level ("order") splits every cell of the previous order into
//! four children. A [`CoverageMap`](types::CoverageMap) records, per order,
//! the sorted set of cell ids belonging to a covered region and keeps that
//! representation canonical: no cell is stored together with one of its
//! ancestors, and no sibling quartet is stored instead of its parent.
//!
//! The crate provides the data model (`Cell`, `LevelStore`, `CoverageMap`),
//! set algebra on a flat interval form (`RangeSet`), and the narrow
//! [`Pixelization`](types::Pixelization) interface through which the actual
//! spherical projection math is consumed.

pub mod types;

pub use types::*;
