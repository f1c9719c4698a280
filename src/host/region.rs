use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::trace;

use super::vector::{HostVector, VectorKind};
use crate::error::{Error, Result};
use crate::telemetry;

/// A host vector that zero-copy buffers address directly.
///
/// Cloning a region is cheap and yields another reference to the same
/// storage. The element count is fixed once the region exists; only element
/// values can change, so storage never moves while a buffer pins it.
///
/// Copying a region's own contents, borrowed through [`HostRegion::read`],
/// into a buffer that wraps the same region fails with `UnsupportedType`.
/// Copy from [`HostRegion::to_vector`] instead.
#[derive(Clone)]
pub struct HostRegion {
    inner: Arc<RegionInner>,
}

struct RegionInner {
    data: RwLock<HostVector>,
    kind: VectorKind,
    len: usize,
    /// Address and byte length of the storage, fixed at creation.
    base: usize,
    byte_len: usize,
    pins: AtomicUsize,
}

impl HostRegion {
    pub fn new(vector: HostVector) -> Result<Self> {
        let kind = vector.kind();
        kind.require_width()?;

        let len = vector.len();
        let bytes = vector.as_bytes().unwrap_or(&[]);
        let (base, byte_len) = (bytes.as_ptr() as usize, bytes.len());
        Ok(Self {
            inner: Arc::new(RegionInner {
                data: RwLock::new(vector),
                kind,
                len,
                base,
                byte_len,
                pins: AtomicUsize::new(0),
            }),
        })
    }

    pub fn kind(&self) -> VectorKind {
        self.inner.kind
    }

    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.inner.byte_len
    }

    pub fn read(&self) -> RwLockReadGuard<'_, HostVector> {
        self.inner.data.read()
    }

    pub fn to_vector(&self) -> HostVector {
        self.inner.data.read().clone()
    }

    /// Replaces every element with those of `values`, which must have the
    /// region's kind and length.
    pub fn overwrite(&self, values: &HostVector) -> Result<()> {
        if values.kind() != self.inner.kind {
            return Err(Error::unsupported(format!(
                "cannot store a {} vector in a {} region",
                values.kind(),
                self.inner.kind
            )));
        }
        if values.len() != self.inner.len {
            return Err(Error::bounds(format!(
                "region holds {} elements, got {}",
                self.inner.len,
                values.len()
            )));
        }

        // Copy in place; swapping the vector would move storage under pins.
        let mut data = self.inner.data.write();
        if let (Some(dst), Some(src)) = (data.as_bytes_mut(), values.as_bytes()) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let data = self.inner.data.read();
        f(data.as_bytes().unwrap_or(&[]))
    }

    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut data = self.inner.data.write();
        f(data.as_bytes_mut().unwrap_or(&mut []))
    }

    /// Number of live buffers currently addressing this region.
    pub fn pin_count(&self) -> usize {
        self.inner.pins.load(Ordering::Acquire)
    }

    pub fn ptr_eq(&self, other: &HostRegion) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Base address of the region's storage.
    pub(crate) fn base_ptr(&self) -> *const u8 {
        self.inner.base as *const u8
    }

    /// Whether `bytes` lies inside this region's storage, which means the
    /// caller is holding one of its guards.
    pub(crate) fn overlaps(&self, bytes: &[u8]) -> bool {
        if bytes.is_empty() || self.inner.byte_len == 0 {
            return false;
        }
        let start = bytes.as_ptr() as usize;
        start < self.inner.base + self.inner.byte_len && self.inner.base < start + bytes.len()
    }

    pub(crate) fn pin(&self) -> RegionPin {
        let count = self.inner.pins.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(pins = count, bytes = self.byte_len(), "pinned host region");
        telemetry::global().record_pin_acquired();
        RegionPin {
            region: self.clone(),
        }
    }
}

impl fmt::Debug for HostRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRegion")
            .field("kind", &self.inner.kind)
            .field("len", &self.inner.len)
            .field("pins", &self.pin_count())
            .finish()
    }
}

/// Keeps a [`HostRegion`] alive and counted as pinned until dropped.
///
/// A pin is only ever created by the zero-copy buffer constructor and is
/// dropped with the buffer's native object, so it releases exactly once.
pub struct RegionPin {
    region: HostRegion,
}

impl RegionPin {
    pub fn region(&self) -> &HostRegion {
        &self.region
    }
}

impl Drop for RegionPin {
    fn drop(&mut self) {
        let remaining = self.region.inner.pins.fetch_sub(1, Ordering::AcqRel) - 1;
        trace!(pins = remaining, "unpinned host region");
        telemetry::global().record_pin_released();
    }
}

impl fmt::Debug for RegionPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionPin").field("region", &self.region).finish()
    }
}
