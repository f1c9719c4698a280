//! Synchronous compute dispatch.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use super::buffer::{Buffer, DeviceMirror};
use super::pipeline::ComputePipeline;
use super::queue::CommandQueue;
use crate::error::{Error, Result};
use crate::telemetry;

/// Grid and thread-group extents of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSize {
    pub grid: [u32; 3],
    pub threads_per_group: [u32; 3],
}

impl DispatchSize {
    /// Every dispatch covers a single logical element.
    pub const GRID_LENGTH: u32 = 1;

    /// Sizing for a pipeline whose thread groups hold at most `max_threads`.
    pub fn for_max_threads(max_threads: u32) -> Result<Self> {
        let threads = max_threads.min(Self::GRID_LENGTH);
        if threads == 0 {
            return Err(Error::dispatch("pipeline allows zero threads per thread group"));
        }

        Ok(Self {
            grid: [Self::GRID_LENGTH, 1, 1],
            threads_per_group: [threads, 1, 1],
        })
    }

    /// Number of thread groups along each axis.
    pub fn workgroups(&self) -> [u32; 3] {
        let mut groups = [0; 3];
        for (axis, count) in groups.iter_mut().enumerate() {
            *count = self.grid[axis].div_ceil(self.threads_per_group[axis]);
        }
        groups
    }
}

pub(crate) fn execute(
    pipeline: &ComputePipeline,
    queue: &CommandQueue,
    args: &[Option<Arc<Buffer>>],
) -> Result<()> {
    let started = Instant::now();
    let result = run(pipeline, queue, args);

    match &result {
        Ok(()) => {
            let elapsed = started.elapsed();
            telemetry::global().record_dispatch(elapsed);
            debug!(
                function = pipeline.function_name(),
                elapsed_us = elapsed.as_micros() as u64,
                "dispatch completed"
            );
        }
        Err(_) => telemetry::global().record_dispatch_failure(),
    }
    result
}

struct Binding<'a> {
    slot: u32,
    buffer: &'a Buffer,
    mirror: &'a DeviceMirror,
}

/// Pairs every slot the kernel uses with the buffer supplied for it.
fn resolve_bindings<'a>(
    pipeline: &ComputePipeline,
    queue: &CommandQueue,
    args: &'a [Option<Arc<Buffer>>],
) -> Result<Vec<Binding<'a>>> {
    let device = pipeline.device_id();
    if queue.device_id() != device {
        return Err(Error::device_mismatch(format!(
            "pipeline belongs to {} but the queue belongs to {}",
            device,
            queue.device_id()
        )));
    }

    for (slot, buffer) in args.iter().enumerate() {
        let Some(buffer) = buffer else { continue };
        match buffer.device_id() {
            Some(id) if id == device => {}
            Some(id) => {
                return Err(Error::device_mismatch(format!(
                    "buffer at slot {} belongs to {} but the pipeline belongs to {}",
                    slot, id, device
                )))
            }
            None => {
                return Err(Error::dispatch(format!(
                    "buffer at slot {} has no device allocation",
                    slot
                )))
            }
        }

        if !pipeline.slots().contains(&(slot as u32)) {
            warn!(
                slot,
                function = pipeline.function_name(),
                "buffer supplied for a slot the kernel does not use; ignoring it"
            );
        }
    }

    pipeline
        .slots()
        .iter()
        .map(|&slot| {
            let buffer = args
                .get(slot as usize)
                .and_then(Option::as_ref)
                .ok_or_else(|| {
                    Error::dispatch(format!(
                        "`{}` uses binding {} but no buffer was supplied for it",
                        pipeline.function_name(),
                        slot
                    ))
                })?;
            let mirror = buffer.mirror().ok_or_else(|| {
                Error::dispatch(format!("buffer at slot {} has no device allocation", slot))
            })?;
            Ok(Binding {
                slot,
                buffer: buffer.as_ref(),
                mirror,
            })
        })
        .collect()
}

fn run(pipeline: &ComputePipeline, queue: &CommandQueue, args: &[Option<Arc<Buffer>>]) -> Result<()> {
    let bindings = resolve_bindings(pipeline, queue, args)?;
    let size = pipeline.dispatch_size()?;
    let ctx = &queue.ctx;
    let label = Some(pipeline.function_name());

    debug!(
        function = pipeline.function_name(),
        bound = bindings.len(),
        workgroups = ?size.workgroups(),
        "dispatching"
    );

    let ((staging, submission), error) = super::capture(ctx, |device| {
        for binding in &bindings {
            if binding.buffer.needs_upload() {
                binding.buffer.upload(&ctx.queue, binding.mirror);
            }
        }

        let bind_group = pipeline.bind_group_layout.as_ref().map(|layout| {
            let entries: Vec<wgpu::BindGroupEntry> = bindings
                .iter()
                .map(|binding| wgpu::BindGroupEntry {
                    binding: binding.slot,
                    resource: binding.mirror.buffer.as_entire_binding(),
                })
                .collect();
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label,
                layout,
                entries: &entries,
            })
        });

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label,
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline.pipeline);
            if let Some(bind_group) = &bind_group {
                pass.set_bind_group(0, bind_group, &[]);
            }
            let [x, y, z] = size.workgroups();
            pass.dispatch_workgroups(x, y, z);
        }

        // Read every bound buffer back in the same submission.
        let staging: Vec<wgpu::Buffer> = bindings
            .iter()
            .map(|binding| {
                let readback = device.create_buffer(&wgpu::BufferDescriptor {
                    label,
                    size: binding.mirror.size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                encoder.copy_buffer_to_buffer(
                    &binding.mirror.buffer,
                    0,
                    &readback,
                    0,
                    binding.mirror.size,
                );
                readback
            })
            .collect();

        let submission = ctx.queue.submit(Some(encoder.finish()));
        (staging, submission)
    });
    if let Some(error) = error {
        return Err(Error::dispatch(error.to_string()));
    }

    let (tx, rx) = crossbeam_channel::bounded(staging.len());
    for readback in &staging {
        let tx = tx.clone();
        readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
    }
    drop(tx);

    // No timeout: a kernel that never finishes blocks here.
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .map_err(|e| Error::dispatch(format!("device poll failed: {:?}", e)))?;

    for _ in 0..staging.len() {
        rx.recv()
            .map_err(|_| Error::dispatch("readback callback was dropped"))?
            .map_err(|e| Error::dispatch(format!("failed to map readback buffer: {}", e)))?;
    }

    for (binding, readback) in bindings.iter().zip(&staging) {
        {
            let data = readback.slice(..).get_mapped_range();
            binding.buffer.store_download(&data);
        }
        readback.unmap();
    }

    Ok(())
}
