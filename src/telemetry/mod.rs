//! Telemetry for the resource bridge.
//!
//! Counts handle creation and release, zero-copy pins, bytes moved across
//! the host boundary, and dispatch latency. All counters live in one
//! process-wide [`Metrics`] returned by [`global`].

use std::sync::OnceLock;

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub mod export;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(feature = "telemetry")]
pub use export::{ConsoleExporter, JsonExporter, MetricsExporter};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self { Self }
        pub fn record_handle_created(&self) {}
        pub fn record_handle_released(&self) {}
        pub fn record_pin_acquired(&self) {}
        pub fn record_pin_released(&self) {}
        pub fn record_upload(&self, _: usize) {}
        pub fn record_download(&self, _: usize) {}
        pub fn record_dispatch(&self, _: Duration) {}
        pub fn record_dispatch_failure(&self) {}
        pub fn reset(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot { MetricsSnapshot::default() }
    }

    #[derive(Debug, Clone, Default)]
    pub struct MetricsSnapshot {
        pub timestamp: Option<Instant>,
        pub handles_created: u64,
        pub handles_released: u64,
        pub pins_acquired: u64,
        pub pins_released: u64,
        pub dispatches: u64,
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};

/// The process-wide collector every subsystem records into.
pub fn global() -> &'static Metrics {
    static GLOBAL: OnceLock<Metrics> = OnceLock::new();
    GLOBAL.get_or_init(Metrics::new)
}
