// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No name parsing or tree logic here (that's Layer 3)
//   - No printing (that's Layer 1)
//   - No direct file formats (that's Layers 4 and 5)
//   - Only workflow coordination

// Checkpoint → exploded_model/ + model.json
pub mod export_use_case;

// Consistency check of an existing export
pub mod verify_use_case;
