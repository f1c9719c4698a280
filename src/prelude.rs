pub use crate::api;
pub use crate::config::{Config, ConfigBuilder, PowerPreference};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::floats::PackedFloats;
pub use crate::gpu::{BufferView, DeviceInfo, FunctionInfo, FunctionRole};
pub use crate::handle::{Handle, ResourceKind};
pub use crate::host::{HostRegion, HostVector, VectorKind, NA_INTEGER, NA_LOGICAL};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};
