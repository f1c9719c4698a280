use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::buffer::Buffer;
use super::device::{DeviceContext, DeviceId};
use super::dispatch::{self, DispatchSize};
use super::function::Function;
use super::queue::CommandQueue;
use super::reflect::FunctionRole;
use crate::error::{Error, Result};

/// Dispatch-ready state built from one kernel function.
pub struct ComputePipeline {
    pub(crate) ctx: Arc<DeviceContext>,
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bind_group_layout: Option<wgpu::BindGroupLayout>,
    function_name: String,
    slots: Vec<u32>,
}

impl ComputePipeline {
    /// Builds a pipeline on the device the function's library was compiled
    /// for.
    ///
    /// Fails with `BuildError` when the function is not a kernel, binds
    /// resources outside group 0, or declares more than one invocation per
    /// workgroup.
    pub fn build(function: &Function) -> Result<Self> {
        let entry = function.entry_point();

        if entry.role != FunctionRole::Kernel {
            return Err(Error::build(format!(
                "`{}` is a {} function, not a kernel",
                entry.name, entry.role
            )));
        }
        if let Some(binding) = entry.bindings.iter().find(|b| b.group != 0) {
            return Err(Error::build(format!(
                "`{}` uses @group({}) @binding({}); only group 0 can be bound by slot",
                entry.name, binding.group, binding.binding
            )));
        }
        if entry.threads_per_workgroup() != 1 {
            let [x, y, z] = entry.workgroup_size;
            return Err(Error::build(format!(
                "`{}` declares @workgroup_size({}, {}, {}); dispatch runs one thread, declare @workgroup_size(1)",
                entry.name, x, y, z
            )));
        }

        let library = function.library();
        let ctx = Arc::clone(&library.ctx);
        let slots = entry.slots();

        let ((pipeline, bind_group_layout), error) = super::capture(&ctx, |device| {
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry.name.as_str()),
                layout: None,
                module: &library.module,
                entry_point: Some(entry.name.as_str()),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });
            let layout = (!slots.is_empty()).then(|| pipeline.get_bind_group_layout(0));
            (pipeline, layout)
        });
        if let Some(error) = error {
            return Err(Error::build(error.to_string()));
        }

        debug!(device = %ctx.id, function = %entry.name, slots = ?slots, "built compute pipeline");

        Ok(Self {
            ctx,
            pipeline,
            bind_group_layout,
            function_name: entry.name.clone(),
            slots,
        })
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Group 0 bindings the kernel reads or writes, ascending.
    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    pub fn device_id(&self) -> DeviceId {
        self.ctx.id
    }

    pub fn max_total_threads_per_threadgroup(&self) -> u32 {
        self.ctx.max_threads_per_group
    }

    pub fn dispatch_size(&self) -> Result<DispatchSize> {
        DispatchSize::for_max_threads(self.max_total_threads_per_threadgroup())
    }

    /// Binds `args` by slot, dispatches, and blocks until the GPU is done.
    pub fn execute(&self, queue: &CommandQueue, args: &[Option<Arc<Buffer>>]) -> Result<()> {
        dispatch::execute(self, queue, args)
    }
}

impl fmt::Debug for ComputePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputePipeline")
            .field("device", &self.ctx.id)
            .field("function", &self.function_name)
            .field("slots", &self.slots)
            .finish()
    }
}
