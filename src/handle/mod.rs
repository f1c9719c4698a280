//! Type-tagged ownership of native resources.
//!
//! A [`Handle`] is what a host holds in place of a native object. It carries
//! a [`ResourceKind`] tag, hands out the resource to accessors of the
//! matching kind, and releases it exactly once.

#[allow(clippy::module_inception)]
mod handle;
mod kind;
mod slot;

pub use handle::{Handle, Resource};
pub use kind::ResourceKind;
pub use slot::Slot;
