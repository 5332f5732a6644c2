// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one of the three pipeline goals.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct parsing/tensor work (that's Layer 4 and 5)
//   - Only workflow coordination
//
// Think of this layer as the "director" — it tells other
// layers what to do but doesn't do the work itself.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// PDF → chunks → generated QA pairs → JSON corpus
pub mod generate_use_case;

// JSON corpus → training samples → fine-tuned artifact
pub mod finetune_use_case;

// Artifact + questions file → answers file
pub mod query_use_case;
