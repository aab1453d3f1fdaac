// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `export` and `verify`, and their
// flags.
//
// clap's derive macros generate --help text, missing-argument
// errors and type conversion (string → PathBuf, char).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::export_use_case::ExportConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explode a checkpoint into exploded_model/*.npy and model.json
    Export(ExportArgs),

    /// Check that model.json and exploded_model/ agree
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Model directory containing hparams.json and the checkpoint
    pub model_dir: PathBuf,

    /// Checkpoint file to read instead of the newest .safetensors
    /// file in the model directory
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Model-scope prefix stripped from every variable name
    #[arg(long, default_value = "model/")]
    pub prefix: String,

    /// Letter that, followed by digits, marks a transformer block
    /// (h0, h1, ...)
    #[arg(long, default_value_t = 'h')]
    pub block_marker: char,
}

/// The application layer never sees clap types.
impl From<ExportArgs> for ExportConfig {
    fn from(a: ExportArgs) -> Self {
        ExportConfig {
            model_dir:    a.model_dir,
            checkpoint:   a.checkpoint,
            prefix:       a.prefix,
            block_marker: a.block_marker,
        }
    }
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Model directory containing hparams.json and model.json
    pub model_dir: PathBuf,
}
