//! wgpu-backed native objects behind the handle layer.
//!
//! Each type here is one native resource kind: [`Device`], [`Library`],
//! [`Function`], [`ComputePipeline`], [`CommandQueue`] and [`Buffer`].
//! Objects remember the [`DeviceId`] they were created on.

pub mod buffer;
pub mod device;
pub mod dispatch;
pub mod function;
pub mod library;
pub mod pipeline;
pub mod queue;
pub mod reflect;

pub use buffer::{Buffer, BufferView};
pub use device::{Device, DeviceId, DeviceInfo};
pub use dispatch::DispatchSize;
pub use function::{Function, FunctionInfo};
pub use library::Library;
pub use pipeline::ComputePipeline;
pub use queue::CommandQueue;
pub use reflect::{BindingAccess, BindingSlot, EntryPoint, FunctionRole, ShaderReflection};

use futures::executor::block_on;

use device::DeviceContext;

/// Runs `f` inside validation and out-of-memory error scopes and returns
/// the first error wgpu reported while it ran.
pub(crate) fn capture<T>(
    ctx: &DeviceContext,
    f: impl FnOnce(&wgpu::Device) -> T,
) -> (T, Option<wgpu::Error>) {
    let _scope = ctx.scope_lock.lock();

    ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f(&ctx.device);
    let validation = block_on(ctx.device.pop_error_scope());
    let out_of_memory = block_on(ctx.device.pop_error_scope());

    (value, validation.or(out_of_memory))
}

/// Rounds `len` up to the copy alignment, never below one aligned unit.
pub(crate) fn aligned_size(len: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    len.div_ceil(align).max(1) * align
}
