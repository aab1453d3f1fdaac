// ============================================================
// Layer 3 — Tensor Domain Type
// ============================================================
// A dense, row-major tensor held as raw little-endian bytes.
//
// The exporter never looks at the numbers themselves, so the
// tensor keeps its bytes untouched and only tracks:
//   - dtype: how many bytes one element occupies
//   - shape: the logical dimensions
//
// Squeezing (dropping every axis of length 1) only rewrites the
// shape. Removing a length-1 axis never changes the row-major
// order of the remaining elements, so the bytes stay as they are.
//
// Example:
//   shape [1, 768]    → squeeze → [768]
//   shape [1]         → squeeze → []      (a scalar)
//   shape [3, 1, 4]   → squeeze → [3, 4]
//
// Reference: numpy.squeeze semantics
//            Rust Book §5 (Structs), §6 (Enums)

/// Element types a checkpoint tensor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    F16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl DType {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            DType::Bool | DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 | DType::F16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub dtype: DType,
    pub shape: Vec<usize>,
    /// Row-major, little-endian element bytes
    pub data:  Vec<u8>,
}

impl Tensor {
    pub fn new(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Self {
        Self { dtype, shape, data }
    }

    /// Number of elements (1 for a scalar)
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when `data` holds exactly `numel * dtype.size()` bytes
    pub fn is_consistent(&self) -> bool {
        self.numel() * self.dtype.size() == self.data.len()
    }

    /// Remove every axis of length 1.
    pub fn squeeze(mut self) -> Self {
        self.shape.retain(|&d| d != 1);
        self
    }
}
