//! Multi-dimensional numeric arrays with explicit layout control.
//!
//! A [`Tensor`] owns typed element storage plus shape/stride bookkeeping, so
//! views (currently transposition) can share storage without copying. The
//! wire format only ever sees the result of [`Tensor::to_row_major_bytes`],
//! which materializes a contiguous row-major buffer whatever the view's
//! stride layout is.

use std::sync::Arc;
use thiserror::Error;

/// Errors from tensor construction and reconstruction.
#[derive(Debug, Error)]
pub enum TensorError {
    #[error("shape {shape:?} implies {expected} elements, got {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("data length {actual} does not match expected {expected} bytes")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("shape {shape:?} overflows the addressable element count")]
    ShapeOverflow { shape: Vec<usize> },
}

/// Element type of a tensor, the closed set with a wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Float32,
    Float64,
    Int32,
    Int64,
    UInt8,
}

impl Dtype {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
            Self::UInt8 => 1,
        }
    }

    /// Wire tag for this element type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
        }
    }

    /// Resolve a wire tag back to an element type.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "float32" => Some(Self::Float32),
            "float64" => Some(Self::Float64),
            "int32" => Some(Self::Int32),
            "int64" => Some(Self::Int64),
            "uint8" => Some(Self::UInt8),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Fixed-size element that can cross the wire in little-endian form.
trait Element: Copy {
    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty),*) => {
        $(impl Element for $ty {
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                Self::from_le_bytes(buf)
            }
        })*
    };
}

impl_element!(f32, f64, i32, i64, u8);

#[derive(Debug, Clone)]
enum Storage {
    F32(Arc<[f32]>),
    F64(Arc<[f64]>),
    I32(Arc<[i32]>),
    I64(Arc<[i64]>),
    U8(Arc<[u8]>),
}

impl Storage {
    const fn dtype(&self) -> Dtype {
        match self {
            Self::F32(_) => Dtype::Float32,
            Self::F64(_) => Dtype::Float64,
            Self::I32(_) => Dtype::Int32,
            Self::I64(_) => Dtype::Int64,
            Self::U8(_) => Dtype::UInt8,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::U8(v) => v.len(),
        }
    }
}

/// A multi-dimensional numeric array, possibly a non-contiguous view.
#[derive(Debug, Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Vec<usize>,
    /// Per-dimension element strides. Row-major on construction; views
    /// permute them without touching storage.
    strides: Vec<usize>,
}

impl Tensor {
    fn from_storage(storage: Storage, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = checked_element_count(shape)
            .ok_or_else(|| TensorError::ShapeOverflow { shape: shape.to_vec() })?;
        let actual = storage.len();
        if expected != actual {
            return Err(TensorError::ShapeMismatch {
                shape: shape.to_vec(),
                expected,
                actual,
            });
        }
        Ok(Self {
            storage,
            shape: shape.to_vec(),
            strides: row_major_strides(shape),
        })
    }

    /// Build a float32 tensor from row-major elements.
    pub fn from_f32(values: Vec<f32>, shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_storage(Storage::F32(values.into()), shape)
    }

    /// Build a float64 tensor from row-major elements.
    pub fn from_f64(values: Vec<f64>, shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_storage(Storage::F64(values.into()), shape)
    }

    /// Build an int32 tensor from row-major elements.
    pub fn from_i32(values: Vec<i32>, shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_storage(Storage::I32(values.into()), shape)
    }

    /// Build an int64 tensor from row-major elements.
    pub fn from_i64(values: Vec<i64>, shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_storage(Storage::I64(values.into()), shape)
    }

    /// Build a uint8 tensor from row-major elements.
    pub fn from_u8(values: Vec<u8>, shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_storage(Storage::U8(values.into()), shape)
    }

    /// Reconstruct a contiguous tensor from raw row-major little-endian
    /// bytes, as read off the wire.
    pub fn from_row_major_bytes(
        dtype: Dtype,
        shape: &[usize],
        bytes: &[u8],
    ) -> Result<Self, TensorError> {
        let count = checked_element_count(shape)
            .ok_or_else(|| TensorError::ShapeOverflow { shape: shape.to_vec() })?;
        let expected = count
            .checked_mul(dtype.size_bytes())
            .ok_or_else(|| TensorError::ShapeOverflow { shape: shape.to_vec() })?;
        if bytes.len() != expected {
            return Err(TensorError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        fn unpack<T: Element>(bytes: &[u8], size: usize) -> Vec<T> {
            bytes.chunks_exact(size).map(T::read_le).collect()
        }

        let size = dtype.size_bytes();
        let storage = match dtype {
            Dtype::Float32 => Storage::F32(unpack::<f32>(bytes, size).into()),
            Dtype::Float64 => Storage::F64(unpack::<f64>(bytes, size).into()),
            Dtype::Int32 => Storage::I32(unpack::<i32>(bytes, size).into()),
            Dtype::Int64 => Storage::I64(unpack::<i64>(bytes, size).into()),
            Dtype::UInt8 => Storage::U8(unpack::<u8>(bytes, size).into()),
        };
        Self::from_storage(storage, shape)
    }

    /// Element type.
    #[must_use]
    pub const fn dtype(&self) -> Dtype {
        self.storage.dtype()
    }

    /// Dimension sizes, outermost first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Logical element count (product of the shape).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the strides describe row-major storage order.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.strides == row_major_strides(&self.shape)
    }

    /// Reversed-axes view sharing this tensor's storage. For a matrix this
    /// is the usual transpose; the result is non-contiguous for rank >= 2
    /// with non-degenerate dimensions.
    #[must_use]
    pub fn transposed(&self) -> Self {
        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.reverse();
        strides.reverse();
        Self {
            storage: self.storage.clone(),
            shape,
            strides,
        }
    }

    /// Materialize the logical row-major element sequence as little-endian
    /// bytes. Contiguous tensors pack storage directly; views gather
    /// elements through their strides first.
    #[must_use]
    pub fn to_row_major_bytes(&self) -> Vec<u8> {
        fn pack<T: Element>(
            data: &[T],
            shape: &[usize],
            strides: &[usize],
            contiguous: bool,
            size: usize,
        ) -> Vec<u8> {
            let mut out = Vec::with_capacity(data.len() * size);
            if contiguous {
                for &v in data {
                    v.write_le(&mut out);
                }
            } else {
                for_each_row_major_offset(shape, strides, |off| data[off].write_le(&mut out));
            }
            out
        }

        let contiguous = self.is_contiguous();
        let size = self.dtype().size_bytes();
        match &self.storage {
            Storage::F32(v) => pack(v, &self.shape, &self.strides, contiguous, size),
            Storage::F64(v) => pack(v, &self.shape, &self.strides, contiguous, size),
            Storage::I32(v) => pack(v, &self.shape, &self.strides, contiguous, size),
            Storage::I64(v) => pack(v, &self.shape, &self.strides, contiguous, size),
            Storage::U8(v) => pack(v, &self.shape, &self.strides, contiguous, size),
        }
    }

    /// Row-major float32 elements, if this is a float32 tensor.
    #[must_use]
    pub fn to_vec_f32(&self) -> Option<Vec<f32>> {
        let Storage::F32(data) = &self.storage else {
            return None;
        };
        if self.is_contiguous() {
            return Some(data.to_vec());
        }
        let mut out = Vec::with_capacity(self.element_count());
        for_each_row_major_offset(&self.shape, &self.strides, |off| out.push(data[off]));
        Some(out)
    }
}

/// Logical equality: same dtype, same shape, same row-major element bytes.
/// A transposed view therefore equals its contiguous copy.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.dtype() == other.dtype()
            && self.shape == other.shape
            && self.to_row_major_bytes() == other.to_row_major_bytes()
    }
}

fn checked_element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1].max(1);
    }
    strides
}

/// Visit storage offsets in logical row-major index order.
fn for_each_row_major_offset(shape: &[usize], strides: &[usize], mut f: impl FnMut(usize)) {
    let total: usize = shape.iter().product();
    if total == 0 {
        return;
    }
    let rank = shape.len();
    if rank == 0 {
        f(0);
        return;
    }
    let mut index = vec![0usize; rank];
    for _ in 0..total {
        let offset = index.iter().zip(strides).map(|(&i, &s)| i * s).sum();
        f(offset);
        for d in (0..rank).rev() {
            index[d] += 1;
            if index[d] < shape[d] {
                break;
            }
            index[d] = 0;
        }
    }
}
