// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Typed failures raised by the pure domain logic.
//
// Every variant is fatal: the export stops at the first one.
// Outer layers carry these inside anyhow::Error, so callers
// that care about the exact kind can use downcast_ref.
//
//   MissingLayerCount / InvalidLayerCount → configuration errors
//   BadBlockIndex / InvalidSegment /
//   ReservedName / BareBlockMarker        → naming errors
//   PathConflict                          → naming errors
//   BlockOutOfRange                       → index errors
//
// Reference: thiserror crate documentation
//            Rust Book §9 (Error Handling)

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplodeError {
    /// hparams.json has no `n_layer` field
    #[error("hparams.json does not declare `n_layer`")]
    MissingLayerCount,

    /// `n_layer` is present but not a non-negative integer
    #[error("`n_layer` must be a non-negative integer, got {0}")]
    InvalidLayerCount(String),

    /// Block marker digits overflow the index type
    #[error("variable '{name}': block index '{digits}' is not a valid integer")]
    BadBlockIndex { name: String, digits: String },

    /// Empty, `.` or `..` path segment
    #[error("variable '{name}' has an invalid path segment '{segment}'")]
    InvalidSegment { name: String, segment: String },

    /// A global parameter would shadow the `blocks` slot
    #[error("variable '{name}' collides with the reserved `blocks` key")]
    ReservedName { name: String },

    /// Block marker with nothing after it, e.g. `model/h0`
    #[error("variable '{name}' names a block but no parameter inside it")]
    BareBlockMarker { name: String },

    /// A leaf and a mapping would share one position in the tree
    #[error("variable '{name}' conflicts with an existing entry at '{segment}'")]
    PathConflict { name: String, segment: String },

    #[error("variable '{name}' refers to block {index}, but n_layer is {n_layer}")]
    BlockOutOfRange {
        name:    String,
        index:   usize,
        n_layer: usize,
    },
}
