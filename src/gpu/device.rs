//! Device discovery using wgpu.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::executor::block_on;
use parking_lot::Mutex;
use tracing::debug;

use super::queue::CommandQueue;
use crate::config::Config;
use crate::error::{Error, Result};

/// Process-unique identity of a device, used to reject cross-device use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl DeviceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DeviceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Human-readable identification, copied out of the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub description: String,
}

impl DeviceInfo {
    fn from_adapter(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            description: describe(
                &info.name,
                info.device_type,
                info.backend,
                &info.driver,
                &info.driver_info,
            ),
        }
    }
}

fn describe(
    name: &str,
    device_type: wgpu::DeviceType,
    backend: wgpu::Backend,
    driver: &str,
    driver_info: &str,
) -> String {
    let mut description = format!("{} ({:?}, {:?} backend", name, device_type, backend);
    if !driver.is_empty() {
        description.push_str(&format!(", driver {}", driver));
        if !driver_info.is_empty() {
            description.push_str(&format!(" {}", driver_info));
        }
    }
    description.push(')');
    description
}

/// State shared by a device and every object created from it.
pub(crate) struct DeviceContext {
    pub(crate) id: DeviceId,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) info: DeviceInfo,
    pub(crate) max_buffer_size: u64,
    pub(crate) max_threads_per_group: u32,
    pub(crate) label: String,
    // Error scopes are per device; one capture at a time.
    pub(crate) scope_lock: Mutex<()>,
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .finish()
    }
}

/// A GPU device together with its submission queue.
#[derive(Debug)]
pub struct Device {
    pub(crate) ctx: Arc<DeviceContext>,
}

impl Device {
    /// Acquire the adapter `config` selects and open a device on it.
    pub fn system_default(config: &Config) -> Result<Self> {
        config.validate()?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: config.power_preference.to_wgpu(),
            compatible_surface: None,
            force_fallback_adapter: config.force_fallback_adapter,
        }))
        .map_err(|e| Error::no_device(e.to_string()))?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();

        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some(config.device_label.as_str()),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            ..Default::default()
        }))
        .map_err(|e| Error::no_device(format!("failed to open {}: {}", adapter_info.name, e)))?;

        let max_buffer_size = allocation_limit(config.max_buffer_size, limits.max_buffer_size);

        let ctx = DeviceContext {
            id: DeviceId::next(),
            device,
            queue,
            info: DeviceInfo::from_adapter(&adapter_info),
            max_buffer_size,
            max_threads_per_group: limits.max_compute_invocations_per_workgroup,
            label: config.device_label.clone(),
            scope_lock: Mutex::new(()),
        };

        debug!(
            id = %ctx.id,
            name = %ctx.info.name,
            backend = ?adapter_info.backend,
            max_buffer_size,
            "acquired device"
        );

        Ok(Self { ctx: Arc::new(ctx) })
    }

    pub fn id(&self) -> DeviceId {
        self.ctx.id
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.ctx.info
    }

    /// Largest buffer this device will allocate, in bytes. Always a
    /// multiple of the copy alignment.
    pub fn max_buffer_size(&self) -> u64 {
        self.ctx.max_buffer_size
    }

    /// The device's submission queue. Every queue of a device shares the
    /// one native queue.
    pub fn command_queue(&self) -> CommandQueue {
        CommandQueue::new(Arc::clone(&self.ctx))
    }
}

/// The smaller of the configured cap and the device limit, rounded down so
/// that a buffer of exactly this length still fits once padded.
fn allocation_limit(cap: Option<u64>, device_limit: u64) -> u64 {
    let limit = cap.map_or(device_limit, |cap| cap.min(device_limit));
    limit - limit % wgpu::COPY_BUFFER_ALIGNMENT
}
