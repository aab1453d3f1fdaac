// ============================================================
// Layer 3 — Variable Name Parser
// ============================================================
// Turns a flat checkpoint variable name into a typed path.
//
// A name has up to three parts:
//
//   model/  h11  /attn/c_proj/w
//   ──┬───  ─┬─   ──────┬─────
//   prefix  block  remaining path
//   (opt.)  (opt.)
//
// Parsing steps:
//   1. Strip the model-scope prefix ("model/") if present
//   2. Split the rest on '/'
//   3. If the first segment is the block marker letter followed
//      only by digits ("h0", "h11"), read the digits as the block
//      index and drop that segment from the path
//
// A first segment like "head" or "h1x" is NOT a block marker;
// such names are treated as global parameters.
//
// The parser is pure: no I/O, no logging, fully unit-testable.
//
// Reference: Rust Book §8 (Strings), §9 (Error Handling)

use crate::domain::error::ExplodeError;

/// Path delimiter inside checkpoint variable names
pub const DELIMITER: char = '/';

/// The parsed form of one checkpoint variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// The name with the model prefix removed, e.g. "h1/attn/c_attn/w".
    /// This string is also the manifest leaf value.
    pub normalized: String,

    /// Block index when the name starts with a block marker
    pub block: Option<usize>,

    /// Path below the block (or below the root when `block` is None)
    pub segments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NameParser {
    prefix:       String,
    block_marker: char,
}

impl NameParser {
    pub fn new(prefix: impl Into<String>, block_marker: char) -> Self {
        Self {
            prefix: prefix.into(),
            block_marker,
        }
    }

    /// Remove the model prefix once; names without it pass through.
    pub fn strip_prefix<'a>(&self, raw: &'a str) -> &'a str {
        raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw)
    }

    /// Returns the block index if `segment` is a block marker.
    ///
    /// `Ok(None)`  → not a marker
    /// `Err(..)`   → a marker whose digits overflow usize
    fn block_index(&self, name: &str, segment: &str) -> Result<Option<usize>, ExplodeError> {
        let Some(digits) = segment.strip_prefix(self.block_marker) else {
            return Ok(None);
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }

        digits
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ExplodeError::BadBlockIndex {
                name:   name.to_string(),
                digits: digits.to_string(),
            })
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedName, ExplodeError> {
        let normalized = self.strip_prefix(raw);

        let mut segments = Vec::new();
        for segment in normalized.split(DELIMITER) {
            // Segments become directory names on disk
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(ExplodeError::InvalidSegment {
                    name:    raw.to_string(),
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }

        // split() always yields at least one item, so segments[0] exists
        let block = self.block_index(raw, &segments[0])?;
        if block.is_some() {
            segments.remove(0);
        }

        Ok(ParsedName {
            normalized: normalized.to_string(),
            block,
            segments,
        })
    }
}

impl Default for NameParser {
    fn default() -> Self {
        Self::new("model/", 'h')
    }
}
