// ============================================================
// Layer 5 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs — memory-mapped .safetensors reader and
//                   "latest checkpoint in a directory" lookup
//
//   exporter.rs   — squeezes each tensor and writes it as .npy
//                   under exploded_model/
//
//   model_dir.rs  — hparams.json input, model.json output
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Safetensors checkpoint reading
pub mod checkpoint;

/// Per-variable .npy export
pub mod exporter;

/// hparams.json / model.json persistence
pub mod model_dir;
