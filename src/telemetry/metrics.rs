//! Counters for handle lifetimes, pinning, transfers and dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use parking_lot::RwLock;

/// Process-wide bridge metrics collector
#[derive(Debug)]
pub struct Metrics {
    // Handle lifetimes
    handles_created: AtomicU64,
    handles_released: AtomicU64,

    // Zero-copy pins
    pins_acquired: AtomicU64,
    pins_released: AtomicU64,

    // Transfers, in bytes
    bytes_uploaded: AtomicU64,
    bytes_downloaded: AtomicU64,

    dispatches: AtomicU64,
    dispatch_failures: AtomicU64,
    dispatch_latency: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        // 3 significant figures, up to one hour in nanoseconds
        let histogram = Histogram::new_with_max(3_600_000_000_000, 3)
            .expect("histogram bounds are valid");

        Self {
            handles_created: AtomicU64::new(0),
            handles_released: AtomicU64::new(0),
            pins_acquired: AtomicU64::new(0),
            pins_released: AtomicU64::new(0),
            bytes_uploaded: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            dispatch_latency: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    pub fn record_handle_created(&self) {
        self.handles_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handle_released(&self) {
        self.handles_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pin_acquired(&self) {
        self.pins_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pin_released(&self) {
        self.pins_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Bytes copied from host memory into buffers.
    pub fn record_upload(&self, bytes: usize) {
        self.bytes_uploaded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Bytes copied from buffers into fresh host vectors.
    pub fn record_download(&self, bytes: usize) {
        self.bytes_downloaded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a completed dispatch and how long the caller was blocked.
    pub fn record_dispatch(&self, duration: Duration) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        if let Some(mut hist) = self.dispatch_latency.try_write() {
            let _ = hist.record(nanos);
        }
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.dispatch_latency.read();

        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            handles_created: self.handles_created.load(Ordering::Relaxed),
            handles_released: self.handles_released.load(Ordering::Relaxed),
            pins_acquired: self.pins_acquired.load(Ordering::Relaxed),
            pins_released: self.pins_released.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            avg_dispatch_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_dispatch_ns: histogram.value_at_quantile(0.50),
            p95_dispatch_ns: histogram.value_at_quantile(0.95),
            p99_dispatch_ns: histogram.value_at_quantile(0.99),
            max_dispatch_ns: histogram.max(),
        }
    }

    pub fn reset(&self) {
        self.handles_created.store(0, Ordering::Relaxed);
        self.handles_released.store(0, Ordering::Relaxed);
        self.pins_acquired.store(0, Ordering::Relaxed);
        self.pins_released.store(0, Ordering::Relaxed);
        self.bytes_uploaded.store(0, Ordering::Relaxed);
        self.bytes_downloaded.store(0, Ordering::Relaxed);
        self.dispatches.store(0, Ordering::Relaxed);
        self.dispatch_failures.store(0, Ordering::Relaxed);

        if let Some(mut hist) = self.dispatch_latency.try_write() {
            hist.reset();
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: Duration,
    pub handles_created: u64,
    pub handles_released: u64,
    pub pins_acquired: u64,
    pub pins_released: u64,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub avg_dispatch_ns: u64,
    pub p50_dispatch_ns: u64,
    pub p95_dispatch_ns: u64,
    pub p99_dispatch_ns: u64,
    pub max_dispatch_ns: u64,
}

impl MetricsSnapshot {
    /// Handles created but not yet released.
    pub fn live_handles(&self) -> u64 {
        self.handles_created.saturating_sub(self.handles_released)
    }

    /// Host regions currently pinned by zero-copy buffers.
    pub fn live_pins(&self) -> u64 {
        self.pins_acquired.saturating_sub(self.pins_released)
    }

    pub fn dispatches_per_second(&self) -> f64 {
        let seconds = self.uptime.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.dispatches as f64 / seconds
    }
}
