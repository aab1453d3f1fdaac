// ============================================================
// Layer 5 — Checkpoint Reader
// ============================================================
// Reads named tensors out of a .safetensors checkpoint.
//
// A .safetensors file is:
//   [u64 header size][JSON header: name → dtype/shape/offsets][raw data]
//
// The file is memory-mapped, so opening a multi-gigabyte
// checkpoint costs nothing until a tensor is actually loaded.
// Each load copies exactly one tensor's bytes out of the map.
//
// Finding the checkpoint:
//   model_dir/
//     hparams.json
//     model-step-1000.safetensors
//     model-step-2000.safetensors   ← newest mtime wins
//
// Dtype handling:
//   - Every integer / float type with a .npy equivalent is kept as-is
//   - BF16 has no .npy equivalent and is widened to F32 (via `half`)
//   - FP8 variants are rejected
//
// Reference: safetensors crate documentation
//            memmap2 crate documentation

use anyhow::{bail, ensure, Context, Result};
use memmap2::Mmap;
use safetensors::{Dtype, SafeTensors};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::domain::tensor::{DType, Tensor};
use crate::domain::traits::CheckpointSource;

/// File extension of checkpoints this reader understands
pub const CHECKPOINT_EXTENSION: &str = "safetensors";

/// A memory-mapped .safetensors checkpoint.
pub struct SafetensorsCheckpoint {
    path:  PathBuf,
    mmap:  Mmap,
    names: Vec<String>,
}

impl SafetensorsCheckpoint {
    /// Open and validate the header of a .safetensors file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("Cannot open checkpoint '{}'", path.display()))?;

        // SAFETY: the map is read-only and the checkpoint is not
        // modified while an export runs.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Cannot memory-map '{}'", path.display()))?;

        let mut names: Vec<String> = SafeTensors::deserialize(&mmap)
            .with_context(|| format!("Invalid safetensors file '{}'", path.display()))?
            .names()
            .into_iter()
            .cloned()
            .collect();

        // The header is a JSON object with no meaningful order
        names.sort();

        tracing::info!(
            "Opened checkpoint '{}' ({} variables)",
            path.display(),
            names.len()
        );

        Ok(Self { path, mmap, names })
    }
}

impl CheckpointSource for SafetensorsCheckpoint {
    fn list_variables(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    fn load_variable(&self, name: &str) -> Result<Tensor> {
        let tensors = SafeTensors::deserialize(&self.mmap)
            .with_context(|| format!("Invalid safetensors file '{}'", self.path.display()))?;
        let view = tensors
            .tensor(name)
            .with_context(|| format!("Cannot load variable '{}'", name))?;

        let shape = view.shape().to_vec();
        let data  = view.data();

        let tensor = match view.dtype() {
            Dtype::BF16 => Tensor::new(DType::F32, shape, widen_bf16(data)),
            dtype => Tensor::new(map_dtype(dtype, name)?, shape, data.to_vec()),
        };

        ensure!(
            tensor.is_consistent(),
            "variable '{}' holds {} bytes, which does not match shape {:?}",
            name,
            tensor.data.len(),
            tensor.shape
        );
        Ok(tensor)
    }
}

fn map_dtype(dtype: Dtype, name: &str) -> Result<DType> {
    let mapped = match dtype {
        Dtype::BOOL => DType::Bool,
        Dtype::U8   => DType::U8,
        Dtype::I8   => DType::I8,
        Dtype::U16  => DType::U16,
        Dtype::I16  => DType::I16,
        Dtype::F16  => DType::F16,
        Dtype::U32  => DType::U32,
        Dtype::I32  => DType::I32,
        Dtype::F32  => DType::F32,
        Dtype::U64  => DType::U64,
        Dtype::I64  => DType::I64,
        Dtype::F64  => DType::F64,
        other => bail!("variable '{}' has unsupported dtype {:?}", name, other),
    };
    Ok(mapped)
}

/// Convert little-endian bf16 bytes into little-endian f32 bytes
fn widen_bf16(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(2)
        .flat_map(|b| half::bf16::from_le_bytes([b[0], b[1]]).to_f32().to_le_bytes())
        .collect()
}

/// Pick the newest .safetensors file in `dir`.
///
/// Files are ranked by modification time; ties go to the
/// lexicographically largest file name.
pub fn latest_checkpoint(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let mut best: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXTENSION) {
            continue;
        }
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .with_context(|| format!("Cannot stat '{}'", path.display()))?;

        let newer = match &best {
            None => true,
            Some((t, p)) => (modified, path.file_name()) > (*t, p.file_name()),
        };
        if newer {
            best = Some((modified, path));
        }
    }

    match best {
        Some((_, path)) => {
            tracing::debug!("Latest checkpoint: '{}'", path.display());
            Ok(path)
        }
        None => bail!("No .{} checkpoint found in '{}'", CHECKPOINT_EXTENSION, dir.display()),
    }
}
