// ============================================================
// Layer 5 — Array Exporter
// ============================================================
// Writes one .npy file per checkpoint variable.
//
// The destination is derived only from the normalized name:
//
//   normalized "h1/attn/c_attn/w"
//       → {model_dir}/exploded_model/h1/attn/c_attn/w.npy
//
// Each '/' becomes a directory separator. ".npy" is appended to
// the last segment rather than replacing an extension, so
// "ln_f/b.bias" becomes "ln_f/b.bias.npy".
//
// Every tensor is squeezed before it is written. Writes are
// independent of each other; a second write to the same path
// replaces the first.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::npy;
use crate::domain::name::DELIMITER;
use crate::domain::tensor::Tensor;

/// Directory under the model dir that holds the exported arrays
pub const EXPLODED_DIR: &str = "exploded_model";

pub struct ArrayExporter {
    /// {model_dir}/exploded_model
    root: PathBuf,
}

impl ArrayExporter {
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        Self {
            root: model_dir.as_ref().join(EXPLODED_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the array for `normalized` lives on disk
    pub fn artifact_path(&self, normalized: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = normalized.split(DELIMITER).peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}.{}", segment, npy::EXTENSION));
            }
        }
        path
    }

    /// Squeeze `tensor` and write it as .npy. Returns the file path.
    pub fn export(&self, normalized: &str, tensor: Tensor) -> Result<PathBuf> {
        let path   = self.artifact_path(normalized);
        let tensor = tensor.squeeze();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let bytes = npy::encode(&tensor)
            .with_context(|| format!("Cannot encode variable '{}'", normalized))?;
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write array to '{}'", path.display()))?;

        tracing::debug!(
            "Exported '{}' {:?} {:?} → '{}'",
            normalized,
            tensor.dtype,
            tensor.shape,
            path.display()
        );
        Ok(path)
    }
}
