use std::fmt;

use crate::error::{Error, Result};
use crate::floats::PackedFloats;

/// Missing marker of host logical vectors.
pub const NA_LOGICAL: i32 = i32::MIN;

/// Missing marker of host integer vectors.
pub const NA_INTEGER: i32 = i32::MIN;

/// The type of a host vector, used as the target prototype of reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    Logical,
    Integer,
    Double,
    Raw,
    Floats,
    Character,
}

impl VectorKind {
    /// Bytes per element, `None` for types without a fixed width.
    pub const fn element_width(self) -> Option<usize> {
        match self {
            VectorKind::Logical | VectorKind::Integer | VectorKind::Floats => Some(4),
            VectorKind::Double => Some(8),
            VectorKind::Raw => Some(1),
            VectorKind::Character => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            VectorKind::Logical => "logical",
            VectorKind::Integer => "integer",
            VectorKind::Double => "double",
            VectorKind::Raw => "raw",
            VectorKind::Floats => "floats",
            VectorKind::Character => "character",
        }
    }

    pub(crate) fn require_width(self) -> Result<usize> {
        self.element_width().ok_or_else(|| {
            Error::unsupported(format!("{} vectors cannot be transferred", self.as_str()))
        })
    }
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostVector {
    Logical(Vec<i32>),
    Integer(Vec<i32>),
    Double(Vec<f64>),
    Raw(Vec<u8>),
    Floats(PackedFloats),
    Character(Vec<Option<String>>),
}

impl HostVector {
    pub fn logical_from(values: &[Option<bool>]) -> Self {
        HostVector::Logical(
            values
                .iter()
                .map(|v| v.map_or(NA_LOGICAL, i32::from))
                .collect(),
        )
    }

    pub fn integer_from(values: &[Option<i32>]) -> Self {
        HostVector::Integer(values.iter().map(|v| v.unwrap_or(NA_INTEGER)).collect())
    }

    /// A zero-filled vector of `len` elements of `kind`.
    pub fn zeroed(kind: VectorKind, len: usize) -> Self {
        match kind {
            VectorKind::Logical => HostVector::Logical(vec![0; len]),
            VectorKind::Integer => HostVector::Integer(vec![0; len]),
            VectorKind::Double => HostVector::Double(vec![0.0; len]),
            VectorKind::Raw => HostVector::Raw(vec![0; len]),
            VectorKind::Floats => HostVector::Floats(PackedFloats::from_container(vec![0; len])),
            VectorKind::Character => HostVector::Character(vec![None; len]),
        }
    }

    pub fn kind(&self) -> VectorKind {
        match self {
            HostVector::Logical(_) => VectorKind::Logical,
            HostVector::Integer(_) => VectorKind::Integer,
            HostVector::Double(_) => VectorKind::Double,
            HostVector::Raw(_) => VectorKind::Raw,
            HostVector::Floats(_) => VectorKind::Floats,
            HostVector::Character(_) => VectorKind::Character,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HostVector::Logical(v) | HostVector::Integer(v) => v.len(),
            HostVector::Double(v) => v.len(),
            HostVector::Raw(v) => v.len(),
            HostVector::Floats(v) => v.len(),
            HostVector::Character(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_width(&self) -> Option<usize> {
        self.kind().element_width()
    }

    /// The vector's storage as bytes, `None` for character vectors.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HostVector::Logical(v) | HostVector::Integer(v) => Some(bytemuck::cast_slice(v)),
            HostVector::Double(v) => Some(bytemuck::cast_slice(v)),
            HostVector::Raw(v) => Some(v),
            HostVector::Floats(v) => Some(v.as_bytes()),
            HostVector::Character(_) => None,
        }
    }

    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            HostVector::Logical(v) | HostVector::Integer(v) => {
                Some(bytemuck::cast_slice_mut(v.as_mut_slice()))
            }
            HostVector::Double(v) => Some(bytemuck::cast_slice_mut(v.as_mut_slice())),
            HostVector::Raw(v) => Some(v.as_mut_slice()),
            HostVector::Floats(v) => Some(v.as_bytes_mut()),
            HostVector::Character(_) => None,
        }
    }

    /// Byte extent of the vector's storage.
    pub fn byte_len(&self) -> Option<usize> {
        self.element_width().map(|w| w * self.len())
    }
}

impl From<Vec<i32>> for HostVector {
    fn from(values: Vec<i32>) -> Self {
        HostVector::Integer(values)
    }
}

impl From<Vec<f64>> for HostVector {
    fn from(values: Vec<f64>) -> Self {
        HostVector::Double(values)
    }
}

impl From<Vec<u8>> for HostVector {
    fn from(values: Vec<u8>) -> Self {
        HostVector::Raw(values)
    }
}

impl From<PackedFloats> for HostVector {
    fn from(values: PackedFloats) -> Self {
        HostVector::Floats(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_widths() {
        assert_eq!(VectorKind::Logical.element_width(), Some(4));
        assert_eq!(VectorKind::Integer.element_width(), Some(4));
        assert_eq!(VectorKind::Floats.element_width(), Some(4));
        assert_eq!(VectorKind::Double.element_width(), Some(8));
        assert_eq!(VectorKind::Raw.element_width(), Some(1));
        assert_eq!(VectorKind::Character.element_width(), None);
    }

    #[test]
    fn test_character_has_no_bytes() {
        let v = HostVector::Character(vec![Some("a".into())]);
        assert!(v.as_bytes().is_none());
        assert_eq!(
            VectorKind::Character.require_width().unwrap_err().kind(),
            crate::error::ErrorKind::UnsupportedType
        );
    }

    #[test]
    fn test_integer_bytes_are_native_endian() {
        let v = HostVector::Integer(vec![1, 2]);
        let mut expected = 1i32.to_ne_bytes().to_vec();
        expected.extend_from_slice(&2i32.to_ne_bytes());
        assert_eq!(v.as_bytes().unwrap(), expected.as_slice());
        assert_eq!(v.byte_len(), Some(8));
    }

    #[test]
    fn test_logical_from_options() {
        let v = HostVector::logical_from(&[Some(true), Some(false), None]);
        assert_eq!(v, HostVector::Logical(vec![1, 0, NA_LOGICAL]));
    }

    #[test]
    fn test_zeroed_matches_kind() {
        for kind in [
            VectorKind::Logical,
            VectorKind::Integer,
            VectorKind::Double,
            VectorKind::Raw,
            VectorKind::Floats,
        ] {
            let v = HostVector::zeroed(kind, 3);
            assert_eq!(v.kind(), kind);
            assert_eq!(v.len(), 3);
            assert!(v.as_bytes().unwrap().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_mutating_bytes_changes_elements() {
        let mut v = HostVector::Double(vec![0.0]);
        v.as_bytes_mut().unwrap().copy_from_slice(&2.5f64.to_ne_bytes());
        assert_eq!(v, HostVector::Double(vec![2.5]));
    }
}
