// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The export workflow only needs two things from a checkpoint:
// the list of variable names, and the tensor behind each name.
//
// Implementations:
//   - SafetensorsCheckpoint → memory-mapped .safetensors file
//   - (tests) in-memory checkpoints built from a Vec
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::tensor::Tensor;

// ─── CheckpointSource ─────────────────────────────────────────────────────────
/// Anything that can enumerate and load named tensors.
pub trait CheckpointSource {
    /// All variable names, in the checkpoint's enumeration order.
    fn list_variables(&self) -> Result<Vec<String>>;

    /// Load the tensor stored under `name`.
    fn load_variable(&self, name: &str) -> Result<Tensor>;
}
