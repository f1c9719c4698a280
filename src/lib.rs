//! gpubridge - GPU compute for garbage-collected hosts
//!
//! Exposes wgpu devices, shader libraries, functions, compute pipelines,
//! command queues and buffers as opaque, type-tagged handles with
//! exactly-once release, plus the byte transfer protocol between host
//! vectors and buffers.
//!
//! # Quick Start
//!
//! ```no_run
//! use gpubridge::prelude::*;
//!
//! let device = api::default_device(&Config::default()).unwrap();
//! let library = api::make_library(&device, r#"
//!     @group(0) @binding(0) var<storage, read_write> data: array<i32>;
//!
//!     @compute @workgroup_size(1)
//!     fn add_one() {
//!         for (var i = 0u; i < arrayLength(&data); i = i + 1u) {
//!             data[i] = data[i] + 1;
//!         }
//!     }
//! "#).unwrap();
//!
//! let function = api::library_function(&library, "add_one").unwrap().unwrap();
//! let pipeline = api::compute_pipeline(&function).unwrap();
//! let queue = api::command_queue(&device).unwrap();
//!
//! let buffer = api::buffer(&device, 16).unwrap();
//! api::buffer_copy_from(&HostVector::Integer(vec![1, 2, 3, 4]), &buffer, 0, 0, 16).unwrap();
//! api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
//!
//! let out = api::buffer_copy_into(&buffer, VectorKind::Integer, 0, 16).unwrap();
//! assert_eq!(out, HostVector::Integer(vec![2, 3, 4, 5]));
//! ```
//!
//! # Features
//!
//! - **Handles**: closed set of resource kinds, idempotent disposal
//! - **Zero-copy buffers**: host regions pinned for the buffer's lifetime
//! - **Packed floats**: optional `f32` values inside 4-byte integer storage
//! - **Telemetry**: handle, pin, transfer and dispatch metrics (optional)

#![warn(missing_debug_implementations)]

pub mod api;
pub mod config;
pub mod error;
pub mod floats;
pub mod gpu;
pub mod handle;
pub mod host;
pub mod prelude;
pub mod telemetry;
pub mod transfer;

pub use config::{Config, ConfigBuilder, PowerPreference};
pub use error::{Error, ErrorKind, Result};
pub use floats::PackedFloats;
pub use handle::{Handle, ResourceKind};
pub use host::{HostRegion, HostVector, VectorKind};
