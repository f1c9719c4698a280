//! Host-facing operations over type-tagged [`Handle`]s.
//!
//! Each function takes and returns opaque handles so a host binding layer
//! can forward its calls directly. Every operation either completes or
//! fails with an [`Error`](crate::Error); a failure never invalidates
//! handles created earlier.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::gpu::{
    Buffer, BufferView, ComputePipeline, Device, DeviceInfo, FunctionInfo, Library,
};
use crate::handle::Handle;
use crate::host::{HostRegion, HostVector, VectorKind};
use crate::transfer;

/// Opens the device `config` selects.
pub fn default_device(config: &Config) -> Result<Handle> {
    Device::system_default(config).map(Handle::wrap)
}

pub fn device_info(device: &Handle) -> Result<DeviceInfo> {
    Ok(device.device()?.info().clone())
}

/// Compiles `source` into a library on `device`.
pub fn make_library(device: &Handle, source: &str) -> Result<Handle> {
    let device = device.device()?;
    Library::compile(&device, source).map(Handle::wrap)
}

pub fn library_function_names(library: &Handle) -> Result<Vec<String>> {
    Ok(library.library()?.function_names())
}

/// Looks up a function by name. `Ok(None)` when the library has no such
/// entry point.
pub fn library_function(library: &Handle, name: &str) -> Result<Option<Handle>> {
    Ok(library.library()?.function(name).map(Handle::wrap))
}

pub fn function_info(function: &Handle) -> Result<FunctionInfo> {
    Ok(function.function()?.info())
}

/// Allocates a zero-filled buffer of `byte_length` bytes.
pub fn buffer(device: &Handle, byte_length: usize) -> Result<Handle> {
    let device = device.device()?;
    Buffer::allocate(&device, byte_length).map(Handle::wrap)
}

/// Creates a buffer that addresses `region` without copying. The region
/// stays pinned until the buffer is released.
pub fn buffer_wrap(device: &Handle, region: &HostRegion) -> Result<Handle> {
    let device = device.device()?;
    Buffer::wrap(&device, region).map(Handle::wrap)
}

pub fn buffer_size(buffer: &Handle) -> Result<usize> {
    Ok(buffer.buffer()?.len())
}

pub fn buffer_copy_from(
    source: &HostVector,
    buffer: &Handle,
    source_offset: i64,
    buffer_offset: i64,
    length: i64,
) -> Result<()> {
    let buffer = buffer.buffer()?;
    transfer::copy_from(source, &buffer, source_offset, buffer_offset, length)
}

pub fn buffer_copy_into(
    buffer: &Handle,
    kind: VectorKind,
    buffer_offset: i64,
    length: i64,
) -> Result<HostVector> {
    let buffer = buffer.buffer()?;
    transfer::copy_into(&buffer, kind, buffer_offset, length)
}

pub fn buffer_pointer(buffer: &Handle) -> Result<BufferView> {
    BufferView::new(buffer)
}

/// A queue handle for `device`. Queues of one device share its native
/// submission queue.
pub fn command_queue(device: &Handle) -> Result<Handle> {
    Ok(Handle::wrap(device.device()?.command_queue()))
}

pub fn compute_pipeline(function: &Handle) -> Result<Handle> {
    let function = function.function()?;
    ComputePipeline::build(&function).map(Handle::wrap)
}

pub fn pipeline_max_threads(pipeline: &Handle) -> Result<u32> {
    Ok(pipeline.compute_pipeline()?.max_total_threads_per_threadgroup())
}

/// Dispatches `pipeline` on `queue` with `args` bound by position and
/// blocks until the GPU finishes. `None` leaves a slot unbound.
pub fn compute_pipeline_execute(
    pipeline: &Handle,
    queue: &Handle,
    args: &[Option<Handle>],
) -> Result<()> {
    let pipeline = pipeline.compute_pipeline()?;
    let queue = queue.command_queue()?;
    let buffers = args
        .iter()
        .map(|arg| arg.as_ref().map(Handle::buffer).transpose())
        .collect::<Result<Vec<Option<Arc<Buffer>>>>>()?;

    pipeline.execute(&queue, &buffers)
}
