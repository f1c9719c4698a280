//! Host-side values exchanged with native buffers.
//!
//! A [`HostVector`] is what a garbage-collected host hands across the
//! boundary: a typed, contiguous vector with a fixed element width. A
//! [`HostRegion`] is a host vector that zero-copy buffers may address
//! directly; every such buffer pins the region until its native object is
//! released.

mod region;
mod vector;

pub use region::{HostRegion, RegionPin};
pub use vector::{HostVector, VectorKind, NA_INTEGER, NA_LOGICAL};
