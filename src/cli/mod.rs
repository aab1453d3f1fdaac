// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command-line arguments with clap and hands off to the
// application layer. This is the only layer that prints.
//
//   1. `export <MODEL_DIR>` — explode the checkpoint
//   2. `verify <MODEL_DIR>` — check an existing export
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ExportArgs, VerifyArgs};

use crate::infra::model_dir::ModelDir;

#[derive(Parser, Debug)]
#[command(
    name = "ckpt-explode",
    version,
    about = "Explode a transformer checkpoint into per-tensor .npy files and a model.json manifest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Export(args) => run_export(args),
            Commands::Verify(args) => run_verify(args),
        }
    }
}

fn run_export(args: ExportArgs) -> Result<()> {
    use crate::application::export_use_case::ExportUseCase;

    tracing::info!("Exporting checkpoint in '{}'", args.model_dir.display());

    let summary = ExportUseCase::new(args.into()).execute()?;

    println!(
        "Exported {} variables ({} blocks).",
        summary.variables, summary.n_layer
    );
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    use crate::application::verify_use_case::VerifyUseCase;

    let report = VerifyUseCase::new(ModelDir::new(args.model_dir)).execute()?;

    println!(
        "OK: {} arrays match model.json ({} blocks).",
        report.leaves, report.n_layer
    );
    Ok(())
}
