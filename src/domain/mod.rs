// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and rules that define what a checkpoint
// export IS:
//
//   name.rs      — flat variable name → typed path + block index
//   manifest.rs  — the nested model.json tree
//   tensor.rs    — raw tensor bytes, dtype, shape, squeeze
//   hparams.rs   — the `n_layer` setting from hparams.json
//   error.rs     — typed fatal errors
//   traits.rs    — the CheckpointSource abstraction
//
// Rules for this layer:
//   - NO file I/O
//   - NO checkpoint-format or .npy-format code
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod error;

pub mod hparams;

pub mod manifest;

pub mod name;

pub mod tensor;

pub mod traits;
