use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::kind::ResourceKind;
use super::slot::Slot;
use crate::error::{Error, Result};
use crate::gpu::{Buffer, CommandQueue, ComputePipeline, Device, Function, Library};
use crate::telemetry;

/// One native object owned by a [`Handle`].
pub enum Resource {
    Device(Arc<Device>),
    Library(Arc<Library>),
    Function(Arc<Function>),
    ComputePipeline(Arc<ComputePipeline>),
    CommandQueue(Arc<CommandQueue>),
    Buffer(Arc<Buffer>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Device(_) => ResourceKind::Device,
            Resource::Library(_) => ResourceKind::Library,
            Resource::Function(_) => ResourceKind::Function,
            Resource::ComputePipeline(_) => ResourceKind::ComputePipeline,
            Resource::CommandQueue(_) => ResourceKind::CommandQueue,
            Resource::Buffer(_) => ResourceKind::Buffer,
        }
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        trace!(kind = %self.kind(), "released handle resource");
        telemetry::global().record_handle_released();
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.kind()).finish()
    }
}

macro_rules! impl_from_resource {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Resource {
                fn from(value: $variant) -> Self {
                    Resource::$variant(Arc::new(value))
                }
            }

            impl From<Arc<$variant>> for Resource {
                fn from(value: Arc<$variant>) -> Self {
                    Resource::$variant(value)
                }
            }
        )*
    };
}

impl_from_resource!(Device, Library, Function, ComputePipeline, CommandQueue, Buffer);

struct HandleInner {
    kind: ResourceKind,
    slot: Slot<Resource>,
}

/// Opaque, type-tagged token owning one native resource.
///
/// Clones share the same resource. The resource is released exactly once:
/// by the first [`Handle::dispose`], or when the last clone is dropped,
/// whichever comes first. Accessors fail with `InvalidHandle` after
/// release or when the tag does not match.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<HandleInner>,
}

macro_rules! typed_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> Result<Arc<$ty>> {
            match self.access(ResourceKind::$variant, |r| match r {
                Resource::$variant(value) => Some(Arc::clone(value)),
                _ => None,
            })? {
                Some(value) => Ok(value),
                None => Err(self.mismatch(ResourceKind::$variant)),
            }
        }
    };
}

impl Handle {
    pub fn wrap(resource: impl Into<Resource>) -> Self {
        let resource = resource.into();
        let kind = resource.kind();
        trace!(%kind, "created handle");
        telemetry::global().record_handle_created();

        Self {
            inner: Arc::new(HandleInner {
                kind,
                slot: Slot::new(resource),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.inner.kind
    }

    /// Releases the native resource. Returns `false` if it was already
    /// released; a repeated call is never an error.
    pub fn dispose(&self) -> bool {
        self.inner.slot.release()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.slot.is_released()
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Checks the tag, then runs `f` while the resource is still held.
    fn access<R>(&self, expected: ResourceKind, f: impl FnOnce(&Resource) -> R) -> Result<R> {
        if self.inner.kind != expected {
            return Err(self.mismatch(expected));
        }
        self.inner.slot.with(f).ok_or_else(|| {
            Error::invalid_handle(format!("{} has already been released", expected))
        })
    }

    fn mismatch(&self, expected: ResourceKind) -> Error {
        Error::invalid_handle(format!(
            "expected a {} but got a {}",
            expected, self.inner.kind
        ))
    }

    typed_accessor!(device, Device, Device);
    typed_accessor!(library, Library, Library);
    typed_accessor!(function, Function, Function);
    typed_accessor!(compute_pipeline, ComputePipeline, ComputePipeline);
    typed_accessor!(command_queue, CommandQueue, CommandQueue);
    typed_accessor!(buffer, Buffer, Buffer);

    /// Leaks this reference as a pointer for a host finalizer to hold.
    ///
    /// The pointer must be passed to [`Handle::from_raw`] exactly once.
    pub fn into_raw(self) -> *const c_void {
        Arc::into_raw(self.inner) as *const c_void
    }

    /// Reclaims a reference produced by [`Handle::into_raw`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` and must not have been reclaimed
    /// before.
    pub unsafe fn from_raw(ptr: *const c_void) -> Self {
        Self {
            inner: Arc::from_raw(ptr as *const HandleInner),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.inner.kind)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::host::{HostRegion, HostVector};

    // Buffers over host regions need no GPU, which makes them the one
    // resource unit tests can wrap.
    fn region_buffer(region: &HostRegion) -> Handle {
        Handle::wrap(Buffer::detached_for_tests(region))
    }

    #[test]
    fn test_wrap_sets_kind() {
        let region = HostRegion::new(HostVector::Integer(vec![1, 2])).unwrap();
        let handle = region_buffer(&region);
        assert_eq!(handle.kind(), ResourceKind::Buffer);
        assert!(handle.buffer().is_ok());
    }

    #[test]
    fn test_tag_mismatch_is_invalid_handle() {
        let region = HostRegion::new(HostVector::Integer(vec![1])).unwrap();
        let handle = region_buffer(&region);

        let err = handle.device().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert!(err.to_string().contains("gpu_device"));
        assert_eq!(handle.library().unwrap_err().kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_double_dispose_releases_once() {
        let region = HostRegion::new(HostVector::Integer(vec![1])).unwrap();
        let handle = region_buffer(&region);
        assert_eq!(region.pin_count(), 1);

        assert!(handle.dispose());
        assert_eq!(region.pin_count(), 0);
        assert!(!handle.dispose());
        assert_eq!(region.pin_count(), 0);

        let err = handle.buffer().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_last_clone_drop_releases() {
        let region = HostRegion::new(HostVector::Raw(vec![0; 4])).unwrap();
        let handle = region_buffer(&region);
        let alias = handle.clone();

        drop(handle);
        assert_eq!(region.pin_count(), 1);
        drop(alias);
        assert_eq!(region.pin_count(), 0);
    }

    #[test]
    fn test_access_outlives_dispose() {
        let region = HostRegion::new(HostVector::Integer(vec![3])).unwrap();
        let handle = region_buffer(&region);

        let buffer = handle.buffer().unwrap();
        handle.dispose();
        // The accessor's reference keeps the native object valid.
        assert_eq!(buffer.len(), 4);
        assert_eq!(region.pin_count(), 1);
        drop(buffer);
        assert_eq!(region.pin_count(), 0);
    }

    #[test]
    fn test_raw_round_trip_then_dispose() {
        let region = HostRegion::new(HostVector::Integer(vec![3])).unwrap();
        let handle = region_buffer(&region);
        let raw = handle.clone().into_raw();

        // Host finalizer path
        let reclaimed = unsafe { Handle::from_raw(raw) };
        assert!(reclaimed.ptr_eq(&handle));
        assert!(reclaimed.dispose());
        assert!(!handle.dispose());
        assert_eq!(region.pin_count(), 0);
    }
}
