// ============================================================
// Layer 3 — Manifest Tree
// ============================================================
// The hierarchical view of a checkpoint that ends up in
// model.json.
//
// Shape of the tree:
//
//   {
//     "blocks": [                    ← exactly n_layer entries
//       { "attn": { "c_attn": { "w": "h0/attn/c_attn/w", ... } } },
//       { ... },
//     ],
//     "wte": "wte",                  ← global parameters
//     "ln_f": { "g": "ln_f/g", "b": "ln_f/b" }
//   }
//
// Every leaf holds the normalized variable name, which is also the
// relative path of its .npy file under exploded_model/.
//
// Insertion walks the path one segment at a time, creating empty
// mappings as needed (get-or-insert-child). Writing the same path
// twice keeps the last value. A path that would turn a leaf into a
// mapping, or a mapping into a leaf, is rejected.
//
// Reference: Rust Book §6 (Enums), §8 (Collections)
//            serde documentation (untagged enums, flatten)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::ExplodeError;
use crate::domain::name::ParsedName;

/// Reserved root key holding the per-block sub-trees
pub const BLOCKS_KEY: &str = "blocks";

/// One node of the manifest: a leaf name or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestNode {
    Leaf(String),
    Map(BTreeMap<String, ManifestNode>),
}

impl ManifestNode {
    pub fn empty() -> Self {
        ManifestNode::Map(BTreeMap::new())
    }

    /// Append every leaf value below this node, depth first
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ManifestNode::Leaf(name) => out.push(name),
            ManifestNode::Map(children) => {
                for child in children.values() {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// Set `leaf` at `path` inside `map`, creating intermediate mappings
/// on demand. An empty path is a no-op.
///
/// Writing a leaf where a leaf already sits replaces it. A leaf in the
/// way of a deeper path, or a populated mapping where the leaf should
/// go, is a `PathConflict`.
pub fn set_path<S: AsRef<str>>(
    map:  &mut BTreeMap<String, ManifestNode>,
    path: &[S],
    leaf: &str,
) -> Result<(), ExplodeError> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(());
    };
    let head = head.as_ref();
    let conflict = || ExplodeError::PathConflict {
        name:    leaf.to_string(),
        segment: head.to_string(),
    };

    let child = map.entry(head.to_string()).or_insert_with(ManifestNode::empty);
    if rest.is_empty() {
        if matches!(child, ManifestNode::Map(children) if !children.is_empty()) {
            return Err(conflict());
        }
        *child = ManifestNode::Leaf(leaf.to_string());
        return Ok(());
    }
    match child {
        ManifestNode::Map(children) => set_path(children, rest, leaf),
        ManifestNode::Leaf(_) => Err(conflict()),
    }
}

// ─── Manifest Root ────────────────────────────────────────────────────────────
// `blocks` is typed as a Vec of mappings so a block can never
// collapse into a bare leaf. All other root keys are flattened
// next to it when serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub blocks: Vec<BTreeMap<String, ManifestNode>>,

    #[serde(flatten)]
    pub globals: BTreeMap<String, ManifestNode>,
}

impl Manifest {
    /// An empty manifest with `n_layer` empty blocks
    pub fn new(n_layer: usize) -> Self {
        Self {
            blocks:  vec![BTreeMap::new(); n_layer],
            globals: BTreeMap::new(),
        }
    }

    pub fn n_layer(&self) -> usize {
        self.blocks.len()
    }

    /// Place one parsed variable into the tree.
    pub fn insert(&mut self, parsed: &ParsedName) -> Result<(), ExplodeError> {
        match parsed.block {
            Some(index) => {
                let n_layer = self.n_layer();
                let block = self.blocks.get_mut(index).ok_or_else(|| {
                    ExplodeError::BlockOutOfRange {
                        name: parsed.normalized.clone(),
                        index,
                        n_layer,
                    }
                })?;
                if parsed.segments.is_empty() {
                    return Err(ExplodeError::BareBlockMarker {
                        name: parsed.normalized.clone(),
                    });
                }
                set_path(block, &parsed.segments, &parsed.normalized)?;
            }
            None => {
                if parsed.segments.first().map(String::as_str) == Some(BLOCKS_KEY) {
                    return Err(ExplodeError::ReservedName {
                        name: parsed.normalized.clone(),
                    });
                }
                set_path(&mut self.globals, &parsed.segments, &parsed.normalized)?;
            }
        }
        Ok(())
    }

    /// Every leaf value in the manifest: blocks in index order, then globals
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for node in self.blocks.iter().flat_map(|b| b.values()) {
            node.collect_leaves(&mut out);
        }
        for node in self.globals.values() {
            node.collect_leaves(&mut out);
        }
        out
    }
}

// ─── Lookup ──────────────────────────────────────────────────────────────────
// Read-side helpers used by tests to check where a name landed.
#[cfg(test)]
impl ManifestNode {
    /// Follow `path` down from this node
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&ManifestNode> {
        let mut node = self;
        for segment in path {
            match node {
                ManifestNode::Map(children) => node = children.get(segment.as_ref())?,
                ManifestNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            ManifestNode::Leaf(name) => Some(name),
            ManifestNode::Map(_) => None,
        }
    }
}

#[cfg(test)]
impl Manifest {
    /// Look up a node by block index (or root) and path
    pub fn get<S: AsRef<str>>(&self, block: Option<usize>, path: &[S]) -> Option<&ManifestNode> {
        let map = match block {
            Some(index) => self.blocks.get(index)?,
            None => &self.globals,
        };
        let (head, rest) = path.split_first()?;
        map.get(head.as_ref())?.get(rest)
    }

    /// Resolve a normalized name (e.g. "h1/attn/c_attn/w") the same
    /// way `insert` would place it, without a block-marker check.
    pub fn resolve(&self, block: Option<usize>, normalized: &str) -> Option<&str> {
        let segments: Vec<&str> = normalized.split(crate::domain::name::DELIMITER).collect();
        let path = if block.is_some() { &segments[1..] } else { &segments[..] };
        self.get(block, path)?.as_leaf()
    }
}
