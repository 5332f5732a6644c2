// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs      — The model artifact directory.
//                        Saves/loads weights with Burn's
//                        CompactRecorder, keeps the periodic
//                        step checkpoints pruned, and stores
//                        the architecture config JSON so a
//                        later process can rebuild the model.
//
//   tokenizer_store.rs — Tokenizer persistence.
//                        Builds a word-level tokenizer from the
//                        corpus if none exists, or loads the one
//                        saved with the artifact. Ensures the
//                        same vocabulary is used for fine-tuning
//                        and querying.
//
//   metrics.rs         — Training metrics logging.
//                        Writes step-level metrics (loss, lr)
//                        to a CSV file for later analysis.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model artifact saving, loading, and checkpoint pruning
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
