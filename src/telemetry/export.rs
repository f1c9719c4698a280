//! Metrics export to JSON files and the console.

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use super::metrics::MetricsSnapshot;
use crate::error::{Error, Result};

/// Trait for exporting metrics to different formats
pub trait MetricsExporter: Send + Sync {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}

/// Writes each snapshot as pretty-printed JSON, replacing the file.
#[derive(Debug)]
pub struct JsonExporter {
    output_path: PathBuf,
}

impl JsonExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn to_json(snapshot: &MetricsSnapshot) -> Result<String> {
        serde_json::to_string_pretty(&SerializableSnapshot::from(snapshot))
            .map_err(|e| Error::telemetry(format!("JSON serialization failed: {}", e)))
    }
}

impl MetricsExporter for JsonExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let json = Self::to_json(snapshot)?;

        std::fs::write(&self.output_path, json)
            .map_err(|e| Error::telemetry(format!("Failed to write file: {}", e)))?;

        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct SerializableSnapshot {
    exported_at_secs: u64,
    uptime_secs: f64,
    handles_created: u64,
    handles_released: u64,
    live_handles: u64,
    pins_acquired: u64,
    pins_released: u64,
    live_pins: u64,
    bytes_uploaded: u64,
    bytes_downloaded: u64,
    dispatches: u64,
    dispatch_failures: u64,
    avg_dispatch_us: f64,
    p50_dispatch_us: f64,
    p95_dispatch_us: f64,
    p99_dispatch_us: f64,
    max_dispatch_us: f64,
}

impl From<&MetricsSnapshot> for SerializableSnapshot {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        let exported_at_secs = std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            exported_at_secs,
            uptime_secs: snapshot.uptime.as_secs_f64(),
            handles_created: snapshot.handles_created,
            handles_released: snapshot.handles_released,
            live_handles: snapshot.live_handles(),
            pins_acquired: snapshot.pins_acquired,
            pins_released: snapshot.pins_released,
            live_pins: snapshot.live_pins(),
            bytes_uploaded: snapshot.bytes_uploaded,
            bytes_downloaded: snapshot.bytes_downloaded,
            dispatches: snapshot.dispatches,
            dispatch_failures: snapshot.dispatch_failures,
            avg_dispatch_us: snapshot.avg_dispatch_ns as f64 / 1_000.0,
            p50_dispatch_us: snapshot.p50_dispatch_ns as f64 / 1_000.0,
            p95_dispatch_us: snapshot.p95_dispatch_ns as f64 / 1_000.0,
            p99_dispatch_us: snapshot.p99_dispatch_ns as f64 / 1_000.0,
            max_dispatch_us: snapshot.max_dispatch_ns as f64 / 1_000.0,
        }
    }
}

/// Export metrics to console (stdout)
#[derive(Debug)]
pub struct ConsoleExporter {
    verbose: bool,
}

impl ConsoleExporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl MetricsExporter for ConsoleExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        println!("=== gpubridge metrics ===");
        println!("Uptime: {:.2}s", snapshot.uptime.as_secs_f64());
        println!(
            "Handles: {} created, {} released, {} live",
            snapshot.handles_created,
            snapshot.handles_released,
            snapshot.live_handles()
        );
        println!("Pinned regions: {}", snapshot.live_pins());
        println!("Dispatches: {}", snapshot.dispatches);

        if self.verbose {
            println!("\nTransfers:");
            println!("  Host -> buffer: {} bytes", snapshot.bytes_uploaded);
            println!("  Buffer -> host: {} bytes", snapshot.bytes_downloaded);

            println!("\nDispatch latency:");
            println!("  Average: {:.2}μs", snapshot.avg_dispatch_ns as f64 / 1_000.0);
            println!("  P50: {:.2}μs", snapshot.p50_dispatch_ns as f64 / 1_000.0);
            println!("  P99: {:.2}μs", snapshot.p99_dispatch_ns as f64 / 1_000.0);
            println!("  Max: {:.2}μs", snapshot.max_dispatch_ns as f64 / 1_000.0);
            println!("  Failed: {}", snapshot.dispatch_failures);
        }

        println!("=========================");

        Ok(())
    }
}

impl Default for ConsoleExporter {
    fn default() -> Self {
        Self::new(false)
    }
}
