// ============================================================
// Layer 3 — Hyperparameters
// ============================================================
// The subset of hparams.json this tool reads.
//
// Only `n_layer` matters: it fixes how many entries the
// manifest's `blocks` array has. Every other field (n_embd,
// n_head, n_vocab, ...) is ignored.
//
// Validation works on an already-parsed JSON value so this
// layer stays free of file I/O.

use serde_json::Value;

use crate::domain::error::ExplodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperparameters {
    /// Number of transformer blocks
    pub n_layer: usize,
}

impl Hyperparameters {
    pub fn from_json(value: &Value) -> Result<Self, ExplodeError> {
        let field = value.get("n_layer").ok_or(ExplodeError::MissingLayerCount)?;

        let n_layer = field
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ExplodeError::InvalidLayerCount(field.to_string()))?;

        Ok(Self { n_layer })
    }
}
