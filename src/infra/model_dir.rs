// ============================================================
// Layer 5 — Model Directory
// ============================================================
// Reads and writes the JSON files that sit next to a checkpoint.
//
// Directory layout:
//   {model_dir}/
//     hparams.json        ← input: must contain `n_layer`
//     *.safetensors       ← input: the checkpoint
//     model.json          ← output: the manifest
//     exploded_model/     ← output: one .npy per variable
//
// model.json is always rewritten from scratch; an existing
// manifest is never merged.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::domain::hparams::Hyperparameters;
use crate::domain::manifest::Manifest;

pub const HPARAMS_FILE: &str = "hparams.json";
pub const MANIFEST_FILE: &str = "model.json";

/// Parse a JSON file into any deserialisable type
pub fn json_from_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid JSON in '{}'", path.display()))
}

pub struct ModelDir {
    dir: PathBuf,
}

impl ModelDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn hparams_path(&self) -> PathBuf {
        self.dir.join(HPARAMS_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Load hparams.json and pull out `n_layer`.
    pub fn load_hparams(&self) -> Result<Hyperparameters> {
        let path  = self.hparams_path();
        let value = json_from_path::<serde_json::Value>(&path)?;
        let hparams = Hyperparameters::from_json(&value)
            .with_context(|| format!("Bad configuration in '{}'", path.display()))?;

        tracing::info!("Loaded hparams: n_layer = {}", hparams.n_layer);
        Ok(hparams)
    }

    /// Write model.json, replacing any previous manifest.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(manifest)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write manifest to '{}'", path.display()))?;

        tracing::info!("Wrote manifest '{}'", path.display());
        Ok(())
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        json_from_path(self.manifest_path())
    }
}
