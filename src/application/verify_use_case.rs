// ============================================================
// Layer 2 — VerifyUseCase
// ============================================================
// Re-reads a finished export and checks that it is complete:
//
//   1. model.json parses and has exactly n_layer blocks
//   2. every leaf points at exploded_model/<leaf>.npy
//   3. every such file decodes as a valid .npy array
//
// Any failure is fatal; nothing is repaired.

use anyhow::{ensure, Context, Result};
use std::fs;

use crate::data::npy;
use crate::infra::{exporter::ArrayExporter, model_dir::ModelDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of manifest leaves whose array was checked
    pub leaves:  usize,
    pub n_layer: usize,
}

pub struct VerifyUseCase {
    model_dir: ModelDir,
}

impl VerifyUseCase {
    pub fn new(model_dir: ModelDir) -> Self {
        Self { model_dir }
    }

    pub fn execute(&self) -> Result<VerifyReport> {
        let hparams  = self.model_dir.load_hparams()?;
        let manifest = self.model_dir.load_manifest()?;

        ensure!(
            manifest.n_layer() == hparams.n_layer,
            "model.json has {} blocks but hparams.json declares n_layer = {}",
            manifest.n_layer(),
            hparams.n_layer
        );

        let exporter = ArrayExporter::new(self.model_dir.path());
        let leaves   = manifest.leaves();

        for leaf in &leaves {
            let path  = exporter.artifact_path(leaf);
            let bytes = fs::read(&path)
                .with_context(|| format!("Missing array for '{}' at '{}'", leaf, path.display()))?;
            let tensor = npy::decode(&bytes)
                .with_context(|| format!("Corrupt array '{}'", path.display()))?;

            tracing::debug!("Verified '{}' {:?} {:?}", leaf, tensor.dtype, tensor.shape);
        }

        tracing::info!("Verified {} arrays across {} blocks", leaves.len(), manifest.n_layer());
        Ok(VerifyReport {
            leaves:  leaves.len(),
            n_layer: manifest.n_layer(),
        })
    }
}
