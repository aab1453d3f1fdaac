// ============================================================
// Layer 4 — Array Formats
// ============================================================
// Byte-level encodings for tensors written to or read from disk.
//
//   Tensor (domain)
//       │
//       ▼
//   npy::encode   → bytes in NumPy .npy format
//       │
//       ▼
//   ArrayExporter (infra) writes them under exploded_model/
//
// npy::decode goes the other way and is used when verifying an
// existing export.
//
// Reference: numpy.lib.format documentation

/// NumPy .npy encoder / decoder
pub mod npy;
