use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::device::{Device, DeviceContext, DeviceId};
use super::function::Function;
use super::reflect::ShaderReflection;
use crate::error::{Error, Result};

/// A compiled shader module and the entry points it defines.
pub struct Library {
    pub(crate) ctx: Arc<DeviceContext>,
    pub(crate) module: wgpu::ShaderModule,
    reflection: ShaderReflection,
}

impl Library {
    /// Compiles `source` on `device`. Either the whole module compiles or
    /// nothing is returned.
    pub fn compile(device: &Device, source: &str) -> Result<Self> {
        let reflection = ShaderReflection::parse(source)?;

        let ctx = Arc::clone(&device.ctx);
        let (module, error) = super::capture(&ctx, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(ctx.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });
        if let Some(error) = error {
            return Err(Error::compile(error.to_string()));
        }

        debug!(
            device = %ctx.id,
            entry_points = reflection.entry_points().len(),
            "compiled library"
        );

        Ok(Self {
            ctx,
            module,
            reflection,
        })
    }

    pub fn device_id(&self) -> DeviceId {
        self.ctx.id
    }

    /// Entry point names in the order the source declares them.
    pub fn function_names(&self) -> Vec<String> {
        self.reflection.names()
    }

    /// Looks up an entry point. A missing name is `None`, not an error.
    pub fn function(self: &Arc<Self>, name: &str) -> Option<Function> {
        self.reflection
            .position(name)
            .map(|index| Function::new(Arc::clone(self), index))
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("device", &self.ctx.id)
            .field("functions", &self.reflection.names())
            .finish()
    }
}
