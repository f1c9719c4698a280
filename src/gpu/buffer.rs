//! Shared-storage buffers mirrored into wgpu device memory.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::device::{Device, DeviceContext, DeviceId};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::host::{HostRegion, RegionPin};

/// Host-visible bytes that are the buffer's canonical contents.
enum Storage {
    Owned(RwLock<Box<[u8]>>),
    Pinned(RegionPin),
}

/// The device-side copy bound to kernels.
pub(crate) struct DeviceMirror {
    pub(crate) ctx: Arc<DeviceContext>,
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) size: u64,
}

/// A fixed-length region of memory shared by host and device.
///
/// Host reads and writes go to the storage directly. Dispatch uploads
/// storage the host changed before encoding and downloads the device copy
/// once the kernel completes, so both sides observe one set of contents.
pub struct Buffer {
    storage: Storage,
    len: usize,
    dirty: AtomicBool,
    /// Set once a mutable pointer has been lent out. Writes through it are
    /// invisible to the dirty flag, so the buffer uploads on every dispatch.
    exposed: AtomicBool,
    mirror: Option<DeviceMirror>,
}

impl Buffer {
    /// Allocates `len` zero-filled bytes owned by the buffer.
    pub fn allocate(device: &Device, len: usize) -> Result<Self> {
        let mirror = create_mirror(&device.ctx, len)?;
        trace!(device = %device.id(), bytes = len, "allocated buffer");

        Ok(Self {
            storage: Storage::Owned(RwLock::new(vec![0u8; len].into_boxed_slice())),
            len,
            dirty: AtomicBool::new(false),
            exposed: AtomicBool::new(false),
            mirror: Some(mirror),
        })
    }

    /// Creates a zero-copy buffer over `region`.
    ///
    /// The region is pinned before the device allocation is attempted and
    /// stays pinned until the buffer is dropped. If the allocation fails
    /// the pin is released before this returns.
    pub fn wrap(device: &Device, region: &HostRegion) -> Result<Self> {
        let pin = region.pin();
        let len = region.byte_len();
        let mirror = create_mirror(&device.ctx, len)?;
        trace!(device = %device.id(), bytes = len, "wrapped host region");

        Ok(Self {
            storage: Storage::Pinned(pin),
            len,
            dirty: AtomicBool::new(true),
            exposed: AtomicBool::new(false),
            mirror: Some(mirror),
        })
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_zero_copy(&self) -> bool {
        matches!(self.storage, Storage::Pinned(_))
    }

    /// The host region a zero-copy buffer addresses.
    pub fn region(&self) -> Option<&HostRegion> {
        match &self.storage {
            Storage::Pinned(pin) => Some(pin.region()),
            Storage::Owned(_) => None,
        }
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        self.mirror.as_ref().map(|m| m.ctx.id)
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        match &self.storage {
            Storage::Owned(bytes) => f(&bytes.read()[..]),
            Storage::Pinned(pin) => pin.region().with_bytes(f),
        }
    }

    /// Mutable access to the contents; the next dispatch uploads them.
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let result = match &self.storage {
            Storage::Owned(bytes) => f(&mut bytes.write()[..]),
            Storage::Pinned(pin) => pin.region().with_bytes_mut(f),
        };
        self.dirty.store(true, Ordering::Release);
        result
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.with_bytes(|bytes| bytes.to_vec())
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        match &self.storage {
            Storage::Owned(bytes) => bytes.read().as_ptr(),
            Storage::Pinned(pin) => pin.region().base_ptr(),
        }
    }

    /// Writes through this pointer, at any later time, are uploaded by the
    /// dispatch that follows them.
    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        self.exposed.store(true, Ordering::Release);
        self.with_bytes_mut(|bytes| bytes.as_mut_ptr())
    }

    pub(crate) fn mirror(&self) -> Option<&DeviceMirror> {
        self.mirror.as_ref()
    }

    /// Host memory behind a pin or a lent pointer may change without going
    /// through the buffer, so those buffers always upload.
    pub(crate) fn needs_upload(&self) -> bool {
        self.is_zero_copy()
            || self.exposed.load(Ordering::Acquire)
            || self.dirty.load(Ordering::Acquire)
    }

    /// Writes the storage into the device copy, padded to the copy
    /// alignment.
    pub(crate) fn upload(&self, queue: &wgpu::Queue, mirror: &DeviceMirror) {
        let mut padded = vec![0u8; mirror.size as usize];
        self.with_bytes(|bytes| padded[..bytes.len()].copy_from_slice(bytes));
        queue.write_buffer(&mirror.buffer, 0, &padded);
        self.dirty.store(false, Ordering::Release);
        trace!(bytes = self.len, "uploaded buffer to device");
    }

    /// Replaces the storage with bytes read back from the device copy.
    pub(crate) fn store_download(&self, data: &[u8]) {
        let len = self.len;
        match &self.storage {
            Storage::Owned(bytes) => bytes.write().copy_from_slice(&data[..len]),
            Storage::Pinned(pin) => pin
                .region()
                .with_bytes_mut(|bytes| bytes.copy_from_slice(&data[..len])),
        }
        trace!(bytes = len, "downloaded buffer from device");
    }

    #[cfg(test)]
    pub(crate) fn host_only(len: usize) -> Self {
        Self {
            storage: Storage::Owned(RwLock::new(vec![0u8; len].into_boxed_slice())),
            len,
            dirty: AtomicBool::new(false),
            exposed: AtomicBool::new(false),
            mirror: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached_for_tests(region: &HostRegion) -> Self {
        Self {
            storage: Storage::Pinned(region.pin()),
            len: region.byte_len(),
            dirty: AtomicBool::new(true),
            exposed: AtomicBool::new(false),
            mirror: None,
        }
    }
}

fn create_mirror(ctx: &Arc<DeviceContext>, len: usize) -> Result<DeviceMirror> {
    let size = super::aligned_size(len as u64);
    if size > ctx.max_buffer_size {
        return Err(Error::allocation(format!(
            "requested {} bytes but {} allows at most {}",
            len, ctx.info.name, ctx.max_buffer_size
        )));
    }

    let (buffer, error) = super::capture(ctx, |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(ctx.label.as_str()),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    });
    if let Some(error) = error {
        return Err(Error::allocation(error.to_string()));
    }

    Ok(DeviceMirror {
        ctx: Arc::clone(ctx),
        buffer,
        size,
    })
}

impl Drop for Buffer {
    fn drop(&mut self) {
        trace!(bytes = self.len, zero_copy = self.is_zero_copy(), "dropped buffer");
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("zero_copy", &self.is_zero_copy())
            .field("device", &self.device_id())
            .finish()
    }
}

/// Pointer and length of a buffer's contents, lent to the host.
///
/// The view holds a reference back to the buffer handle it came from. It
/// does not own the handle's release: disposing the handle still works,
/// and the memory stays valid until the view is dropped too.
pub struct BufferView {
    owner: Handle,
    buffer: Arc<Buffer>,
}

impl BufferView {
    pub fn new(owner: &Handle) -> Result<Self> {
        let buffer = owner.buffer()?;
        Ok(Self {
            owner: owner.clone(),
            buffer,
        })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Mutable base pointer. The buffer is treated as modified, so the
    /// next dispatch uploads whatever the host writes here.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.buffer.as_mut_ptr()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn owner(&self) -> &Handle {
        &self.owner
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.buffer.to_vec()
    }
}

impl fmt::Debug for BufferView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferView")
            .field("ptr", &self.as_ptr())
            .field("len", &self.len())
            .finish()
    }
}
