// ============================================================
// Layer 2 — ExportUseCase
// ============================================================
// Explodes a checkpoint into per-variable arrays plus model.json.
//
//   Step 1: Load hparams.json           (Layer 5 - infra)
//   Step 2: Locate + open checkpoint    (Layer 5 - infra)
//   Step 3: For every variable, in checkpoint order:
//             a. parse its name        (Layer 3 - domain)
//             b. export its array      (Layer 5 - infra)
//             c. add it to the tree    (Layer 3 - domain)
//   Step 4: Write model.json            (Layer 5 - infra)
//
// The first error stops the run. Arrays exported before the
// failure stay on disk, and model.json is only written once every
// variable has been placed.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::{
    hparams::Hyperparameters,
    manifest::Manifest,
    name::NameParser,
    traits::CheckpointSource,
};
use crate::infra::{
    checkpoint::{latest_checkpoint, SafetensorsCheckpoint},
    exporter::ArrayExporter,
    model_dir::ModelDir,
};

// ─── Export Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub model_dir:    PathBuf,
    /// Explicit checkpoint file; None means "newest in model_dir"
    pub checkpoint:   Option<PathBuf>,
    pub prefix:       String,
    pub block_marker: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            model_dir:    PathBuf::from("."),
            checkpoint:   None,
            prefix:       "model/".to_string(),
            block_marker: 'h',
        }
    }
}

/// Totals reported back to the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub variables: usize,
    pub n_layer:   usize,
}

// ─── Assembly ────────────────────────────────────────────────────────────────
/// The finished manifest and how many checkpoint variables went into it.
/// Duplicate names count once per occurrence.
#[derive(Debug)]
pub struct Assembly {
    pub manifest:  Manifest,
    pub variables: usize,
}

/// Export every variable of `checkpoint` and build the manifest.
pub fn assemble(
    checkpoint: &dyn CheckpointSource,
    hparams:    &Hyperparameters,
    parser:     &NameParser,
    exporter:   &ArrayExporter,
) -> Result<Assembly> {
    let mut manifest  = Manifest::new(hparams.n_layer);
    let mut variables = 0;

    for name in checkpoint.list_variables()? {
        let parsed = parser.parse(&name)?;

        let tensor = checkpoint.load_variable(&name)?;
        exporter.export(&parsed.normalized, tensor)?;

        manifest
            .insert(&parsed)
            .with_context(|| format!("Cannot place variable '{}' in the manifest", name))?;
        variables += 1;
    }

    Ok(Assembly { manifest, variables })
}

// ─── ExportUseCase ───────────────────────────────────────────────────────────
pub struct ExportUseCase {
    config: ExportConfig,
}

impl ExportUseCase {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ExportSummary> {
        let cfg       = &self.config;
        let model_dir = ModelDir::new(&cfg.model_dir);

        // ── Step 1: Configuration ────────────────────────────────────────────
        let hparams = model_dir.load_hparams()?;

        // ── Step 2: Checkpoint ───────────────────────────────────────────────
        let ckpt_path = match &cfg.checkpoint {
            Some(path) => path.clone(),
            None => latest_checkpoint(model_dir.path())?,
        };
        let checkpoint = SafetensorsCheckpoint::open(&ckpt_path)?;

        // ── Step 3: Export arrays + build manifest ───────────────────────────
        let parser   = NameParser::new(cfg.prefix.as_str(), cfg.block_marker);
        let exporter = ArrayExporter::new(model_dir.path());
        let assembly = assemble(&checkpoint, &hparams, &parser, &exporter)?;

        // ── Step 4: Persist manifest ─────────────────────────────────────────
        model_dir.write_manifest(&assembly.manifest)?;

        let summary = ExportSummary {
            variables: assembly.variables,
            n_layer:   assembly.manifest.n_layer(),
        };
        tracing::info!(
            "Exported {} variables across {} blocks into '{}'",
            summary.variables,
            summary.n_layer,
            exporter.root().display()
        );
        Ok(summary)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::npy;
    use crate::domain::{error::ExplodeError, manifest::ManifestNode, tensor::{DType, Tensor}};
    use crate::infra::checkpoint::test_support::{f32_bytes, write_safetensors};
    use crate::infra::model_dir::{HPARAMS_FILE, MANIFEST_FILE};
    use safetensors::Dtype;
    use std::{cell::Cell, fs};

    /// A checkpoint held in memory, enumerated in insertion order.
    /// Loads are served in the same order, so duplicate names each
    /// get their own tensor.
    struct MemoryCheckpoint {
        vars:   Vec<(String, Tensor)>,
        cursor: Cell<usize>,
    }

    impl MemoryCheckpoint {
        fn new(vars: Vec<(&str, Vec<usize>, Vec<f32>)>) -> Self {
            let vars = vars
                .into_iter()
                .map(|(name, shape, values)| {
                    (name.to_string(), Tensor::new(DType::F32, shape, f32_bytes(&values)))
                })
                .collect();
            Self { vars, cursor: Cell::new(0) }
        }
    }

    impl CheckpointSource for MemoryCheckpoint {
        fn list_variables(&self) -> Result<Vec<String>> {
            Ok(self.vars.iter().map(|(n, _)| n.clone()).collect())
        }

        fn load_variable(&self, name: &str) -> Result<Tensor> {
            let i = self.cursor.get();
            self.cursor.set(i + 1);
            let (stored, tensor) = self.vars.get(i).context("read past the last variable")?;
            anyhow::ensure!(stored == name, "expected '{}', asked for '{}'", stored, name);
            Ok(tensor.clone())
        }
    }

    fn run(ckpt: &MemoryCheckpoint, n_layer: usize, dir: &std::path::Path) -> Result<Manifest> {
        let assembly = assemble(
            ckpt,
            &Hyperparameters { n_layer },
            &NameParser::default(),
            &ArrayExporter::new(dir),
        )?;
        Ok(assembly.manifest)
    }

    fn execute_in(dir: &std::path::Path) -> Result<ExportSummary> {
        ExportUseCase::new(ExportConfig {
            model_dir: dir.to_path_buf(),
            ..ExportConfig::default()
        })
        .execute()
    }

    #[test]
    fn test_block_variable_lands_in_block_and_file() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![("model/h1/attn/c_attn/w", vec![2, 2], vec![1.0; 4])]);

        let m = run(&ckpt, 2, dir.path()).unwrap();
        assert_eq!(
            m.get(Some(1), &["attn", "c_attn", "w"]).and_then(ManifestNode::as_leaf),
            Some("h1/attn/c_attn/w")
        );
        assert!(dir.path().join("exploded_model/h1/attn/c_attn/w.npy").is_file());
    }

    #[test]
    fn test_global_variable_lands_at_root() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![("model/wte", vec![3, 2], vec![0.5; 6])]);

        let m = run(&ckpt, 2, dir.path()).unwrap();
        assert_eq!(m.globals.get("wte"), Some(&ManifestNode::Leaf("wte".into())));
        assert_eq!(m.n_layer(), 2);
        assert!(dir.path().join("exploded_model/wte.npy").is_file());
    }

    #[test]
    fn test_block_index_out_of_range_aborts() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![("model/h3/ln_1/g", vec![4], vec![1.0; 4])]);

        let err = run(&ckpt, 1, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::BlockOutOfRange { index: 3, n_layer: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![
            ("model/a/b", vec![1], vec![1.0]),
            ("model/a/b", vec![2], vec![2.0, 3.0]),
        ]);

        let m = run(&ckpt, 0, dir.path()).unwrap();
        assert_eq!(m.get(None, &["a", "b"]).and_then(ManifestNode::as_leaf), Some("a/b"));

        let bytes = fs::read(dir.path().join("exploded_model/a/b.npy")).unwrap();
        assert_eq!(npy::decode(&bytes).unwrap().shape, vec![2]);
    }

    #[test]
    fn test_every_variable_is_a_reachable_leaf() {
        let dir   = tempfile::tempdir().unwrap();
        let names = [
            "model/h0/attn/c_attn/w",
            "model/h0/attn/c_attn/b",
            "model/h0/ln_1/g",
            "model/h2/mlp/c_proj/w",
            "model/wpe",
            "model/wte",
            "model/ln_f/g",
        ];
        let ckpt = MemoryCheckpoint::new(names.iter().map(|n| (*n, vec![1], vec![0.0])).collect());

        let m      = run(&ckpt, 3, dir.path()).unwrap();
        let parser = NameParser::default();
        for name in names {
            let p = parser.parse(name).unwrap();
            assert_eq!(m.resolve(p.block, &p.normalized), Some(p.normalized.as_str()));
            assert!(ArrayExporter::new(dir.path()).artifact_path(&p.normalized).is_file());
        }
        assert_eq!(m.n_layer(), 3);
        assert!(m.blocks[1].is_empty());
    }

    #[test]
    fn test_empty_checkpoint_yields_bare_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let m   = run(&MemoryCheckpoint::new(Vec::new()), 2, dir.path()).unwrap();
        assert_eq!(m, Manifest::new(2));
    }

    #[test]
    fn test_execute_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 2, "n_embd": 2}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[
                ("model/h1/attn/c_attn/w", Dtype::F32, vec![1, 2, 2], f32_bytes(&[1.0; 4])),
                ("model/wte", Dtype::F32, vec![2, 2], f32_bytes(&[2.0; 4])),
            ],
        );

        let summary = ExportUseCase::new(ExportConfig {
            model_dir: dir.path().to_path_buf(),
            ..ExportConfig::default()
        })
        .execute()
        .unwrap();
        assert_eq!(summary, ExportSummary { variables: 2, n_layer: 2 });

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(json["blocks"][1]["attn"]["c_attn"]["w"], "h1/attn/c_attn/w");
        assert_eq!(json["blocks"][0], serde_json::json!({}));
        assert_eq!(json["wte"], "wte");

        let w = fs::read(dir.path().join("exploded_model/h1/attn/c_attn/w.npy")).unwrap();
        assert_eq!(npy::decode(&w).unwrap().shape, vec![2, 2]);
    }

    #[test]
    fn test_execute_index_error_writes_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 1}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[("model/h3/ln_1/g", Dtype::F32, vec![2], f32_bytes(&[1.0, 1.0]))],
        );

        let result = ExportUseCase::new(ExportConfig {
            model_dir: dir.path().to_path_buf(),
            ..ExportConfig::default()
        })
        .execute();

        assert!(result.is_err());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_execute_without_hparams_fails_before_export() {
        let dir = tempfile::tempdir().unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[("model/wte", Dtype::F32, vec![1], f32_bytes(&[1.0]))],
        );

        let result = ExportUseCase::new(ExportConfig {
            model_dir: dir.path().to_path_buf(),
            ..ExportConfig::default()
        })
        .execute();

        assert!(result.is_err());
        assert!(!dir.path().join("exploded_model").exists());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_duplicate_names_each_count_as_a_variable() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![
            ("model/a/b", vec![1], vec![1.0]),
            ("model/a/b", vec![1], vec![2.0]),
            ("model/wte", vec![1], vec![3.0]),
        ]);

        let assembly = assemble(
            &ckpt,
            &Hyperparameters { n_layer: 0 },
            &NameParser::default(),
            &ArrayExporter::new(dir.path()),
        )
        .unwrap();
        assert_eq!(assembly.variables, 3);
        assert_eq!(assembly.manifest.leaves().len(), 2);
    }

    #[test]
    fn test_leaf_then_mapping_aborts() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![
            ("model/a", vec![1], vec![1.0]),
            ("model/a/b", vec![1], vec![2.0]),
        ]);

        let err = run(&ckpt, 0, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::PathConflict { segment, .. }) if segment == "a"
        ));
    }

    #[test]
    fn test_mapping_then_leaf_aborts() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = MemoryCheckpoint::new(vec![
            ("model/h0/ln_1/g", vec![1], vec![1.0]),
            ("model/h0/ln_1", vec![1], vec![2.0]),
        ]);

        let err = run(&ckpt, 1, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::PathConflict { .. })
        ));
    }

    #[test]
    fn test_execute_path_conflict_writes_no_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 0}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[
                ("model/a", Dtype::F32, vec![1], f32_bytes(&[1.0])),
                ("model/a/b", Dtype::F32, vec![1], f32_bytes(&[2.0])),
            ],
        );

        let err = execute_in(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::PathConflict { .. })
        ));
        assert!(dir.path().join("exploded_model/a.npy").is_file());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_execute_index_error_keeps_earlier_arrays() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 1}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[
                ("model/a", Dtype::F32, vec![2], f32_bytes(&[1.0, 2.0])),
                ("model/h3/ln_1/g", Dtype::F32, vec![2], f32_bytes(&[1.0, 1.0])),
            ],
        );

        let err = execute_in(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::BlockOutOfRange { index: 3, n_layer: 1, .. })
        ));

        let a = fs::read(dir.path().join("exploded_model/a.npy")).unwrap();
        assert_eq!(npy::decode(&a).unwrap().shape, vec![2]);
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_execute_naming_error_keeps_earlier_arrays() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 1}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[
                ("model/a", Dtype::F32, vec![1], f32_bytes(&[1.0])),
                ("model/h99999999999999999999999/w", Dtype::F32, vec![1], f32_bytes(&[1.0])),
            ],
        );

        let err = execute_in(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::BadBlockIndex { .. })
        ));
        assert!(dir.path().join("exploded_model/a.npy").is_file());
        assert!(!dir.path().join("exploded_model/h99999999999999999999999").exists());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_execute_unsafe_segment_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HPARAMS_FILE), r#"{"n_layer": 0}"#).unwrap();
        write_safetensors(
            &dir.path().join("model.safetensors"),
            &[("model/../escape", Dtype::F32, vec![1], f32_bytes(&[1.0]))],
        );

        let err = execute_in(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExplodeError>(),
            Some(ExplodeError::InvalidSegment { segment, .. }) if segment == ".."
        ));
        assert!(!dir.path().join("escape.npy").exists());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }
}
