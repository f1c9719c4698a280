use std::fmt;

/// Type tag carried by every [`Handle`](super::Handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Device,
    Library,
    Function,
    ComputePipeline,
    CommandQueue,
    Buffer,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Device,
        ResourceKind::Library,
        ResourceKind::Function,
        ResourceKind::ComputePipeline,
        ResourceKind::CommandQueue,
        ResourceKind::Buffer,
    ];

    /// Class name a host attaches to the opaque token.
    pub const fn class_name(self) -> &'static str {
        match self {
            ResourceKind::Device => "gpu_device",
            ResourceKind::Library => "gpu_library",
            ResourceKind::Function => "gpu_function",
            ResourceKind::ComputePipeline => "gpu_compute_pipeline",
            ResourceKind::CommandQueue => "gpu_command_queue",
            ResourceKind::Buffer => "gpu_buffer",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_name() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}
