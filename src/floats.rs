//! Optional 32-bit floats packed into a host 4-byte integer container.
//!
//! Hosts without a native float32 type keep these vectors in their integer
//! storage. Each element is the IEEE-754 single precision bit pattern of the
//! value, in host byte order, and any NaN means "missing".

use crate::error::{Error, Result};
use crate::host::{HostVector, NA_INTEGER, NA_LOGICAL};

/// A sequence of optional `f32` values stored as raw bits in `i32` slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedFloats {
    bits: Vec<i32>,
}

/// Bit pattern written for missing elements.
pub const MISSING_BITS: u32 = 0x7fc0_0000;

const MISSING: i32 = MISSING_BITS as i32;

#[inline]
fn pack(value: f32) -> i32 {
    value.to_bits() as i32
}

#[inline]
fn unpack(bits: i32) -> f32 {
    f32::from_bits(bits as u32)
}

impl PackedFloats {
    /// Allocate `size` elements all holding `fill`, or the missing encoding
    /// when `fill` is `None`.
    pub fn new(size: usize, fill: Option<f32>) -> Self {
        Self {
            bits: vec![fill.map_or(MISSING, pack); size],
        }
    }

    /// Adopt an integer container whose elements already hold float bits.
    pub fn from_container(bits: Vec<i32>) -> Self {
        Self { bits }
    }

    pub fn from_f32(values: &[f32]) -> Self {
        Self {
            bits: values.iter().map(|&v| pack(v)).collect(),
        }
    }

    pub fn from_logical(values: &[i32]) -> Self {
        let bits = values
            .iter()
            .map(|&v| {
                if v == NA_LOGICAL {
                    MISSING
                } else {
                    pack(v as f32)
                }
            })
            .collect();
        Self { bits }
    }

    pub fn from_integer(values: &[i32]) -> Self {
        let bits = values
            .iter()
            .map(|&v| {
                if v == NA_INTEGER {
                    MISSING
                } else {
                    pack(v as f32)
                }
            })
            .collect();
        Self { bits }
    }

    /// Narrows every element to the nearest `f32`; NaN stays NaN.
    pub fn from_double(values: &[f64]) -> Self {
        Self {
            bits: values.iter().map(|&v| pack(v as f32)).collect(),
        }
    }

    /// Converts a plain host vector. Returns `None` for vectors that are
    /// already packed floats and for raw or character vectors.
    pub fn from_host(vector: &HostVector) -> Option<Self> {
        match vector {
            HostVector::Logical(v) => Some(Self::from_logical(v)),
            HostVector::Integer(v) => Some(Self::from_integer(v)),
            HostVector::Double(v) => Some(Self::from_double(v)),
            HostVector::Floats(_) | HostVector::Raw(_) | HostVector::Character(_) => None,
        }
    }

    /// Missing elements become `NA_LOGICAL`; others truncate toward zero.
    pub fn to_logical(&self) -> Vec<i32> {
        self.iter()
            .map(|v| match v {
                Some(f) => f as i32,
                None => NA_LOGICAL,
            })
            .collect()
    }

    /// Missing elements become `NA_INTEGER`; others truncate toward zero.
    ///
    /// The cast saturates, so values at or below `-2^31` land on
    /// `NA_INTEGER` and read back as missing.
    pub fn to_integer(&self) -> Vec<i32> {
        self.iter()
            .map(|v| match v {
                Some(f) => f as i32,
                None => NA_INTEGER,
            })
            .collect()
    }

    /// Widens every element. Missing elements propagate as NaN.
    pub fn to_double(&self) -> Vec<f64> {
        self.bits.iter().map(|&b| unpack(b) as f64).collect()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Element `index`, `None` when it is out of range or missing.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.bits
            .get(index)
            .map(|&b| unpack(b))
            .filter(|v| !v.is_nan())
    }

    pub fn is_missing(&self, index: usize) -> bool {
        self.bits.get(index).is_some_and(|&b| unpack(b).is_nan())
    }

    /// Stores `value` at `index`; `None` writes the missing encoding.
    pub fn set(&mut self, index: usize, value: Option<f32>) -> Result<()> {
        let len = self.bits.len();
        let slot = self.bits.get_mut(index).ok_or_else(|| {
            Error::bounds(format!("index {} out of range for {} elements", index, len))
        })?;
        *slot = value.map_or(MISSING, pack);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f32>> + '_ {
        self.bits.iter().map(|&b| {
            let v = unpack(b);
            if v.is_nan() {
                None
            } else {
                Some(v)
            }
        })
    }

    /// The host integer container.
    pub fn as_container(&self) -> &[i32] {
        &self.bits
    }

    pub fn into_container(self) -> Vec<i32> {
        self.bits
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bits)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.bits)
    }
}

impl FromIterator<Option<f32>> for PackedFloats {
    fn from_iter<I: IntoIterator<Item = Option<f32>>>(iter: I) -> Self {
        Self {
            bits: iter
                .into_iter()
                .map(|v| v.map_or(MISSING, pack))
                .collect(),
        }
    }
}
