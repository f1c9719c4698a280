//! Byte copies between host vectors and buffers.
//!
//! Offsets and lengths are signed so that negative host input is rejected
//! with `BoundsError` instead of wrapping. All validation happens before any
//! byte is written, so a failed copy leaves its destination untouched.

use crate::error::{Error, Result};
use crate::gpu::Buffer;
use crate::host::{HostVector, VectorKind};
use crate::telemetry;

fn non_negative(value: i64, what: &str) -> Result<usize> {
    if value < 0 {
        return Err(Error::bounds(format!("invalid {}: {}", what, value)));
    }
    usize::try_from(value)
        .map_err(|_| Error::bounds(format!("{} {} does not fit in memory", what, value)))
}

fn check_multiple(length: usize, width: usize, kind: VectorKind) -> Result<()> {
    if length % width != 0 {
        return Err(Error::bounds(format!(
            "length {} is not a multiple of the {} element size ({} bytes)",
            length, kind, width
        )));
    }
    Ok(())
}

/// `offset..offset + length`, provided it ends within `extent`.
fn span(offset: usize, length: usize, extent: usize, target: &str) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(length) {
        Some(end) if end <= extent => Ok(offset..end),
        _ => Err(Error::bounds(format!(
            "{} not long enough: {} bytes at offset {} exceeds {} bytes",
            target, length, offset, extent
        ))),
    }
}

/// Copies `length` bytes of `source`, starting `source_offset` bytes in,
/// into `buffer` at `buffer_offset`.
pub fn copy_from(
    source: &HostVector,
    buffer: &Buffer,
    source_offset: i64,
    buffer_offset: i64,
    length: i64,
) -> Result<()> {
    let source_offset = non_negative(source_offset, "source offset")?;
    let buffer_offset = non_negative(buffer_offset, "buffer offset")?;
    let length = non_negative(length, "length")?;
    if length == 0 {
        return Ok(());
    }

    let kind = source.kind();
    let width = kind.require_width()?;
    check_multiple(length, width, kind)?;

    let bytes = source.as_bytes().unwrap_or(&[]);
    let from = span(source_offset, length, bytes.len(), "vector")?;
    let to = span(buffer_offset, length, buffer.len(), "buffer")?;

    // The caller's read guard on the region would block the write below.
    if buffer.region().is_some_and(|region| region.overlaps(bytes)) {
        return Err(Error::unsupported(
            "source vector is borrowed from the region this buffer wraps; copy from a snapshot of it",
        ));
    }

    buffer.with_bytes_mut(|dst| dst[to].copy_from_slice(&bytes[from]));
    telemetry::global().record_upload(length);
    Ok(())
}

/// Reads `length` bytes of `buffer` at `buffer_offset` into a fresh host
/// vector of `kind`.
pub fn copy_into(buffer: &Buffer, kind: VectorKind, buffer_offset: i64, length: i64) -> Result<HostVector> {
    let buffer_offset = non_negative(buffer_offset, "buffer offset")?;
    let length = non_negative(length, "length")?;
    if length == 0 {
        return Ok(HostVector::zeroed(kind, 0));
    }

    let width = kind.require_width()?;
    check_multiple(length, width, kind)?;
    let from = span(buffer_offset, length, buffer.len(), "buffer")?;

    let mut out = HostVector::zeroed(kind, length / width);
    if let Some(dst) = out.as_bytes_mut() {
        buffer.with_bytes(|src| dst.copy_from_slice(&src[from]));
    }
    telemetry::global().record_download(length);
    Ok(out)
}
