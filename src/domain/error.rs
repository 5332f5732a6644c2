// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// One error enum shared by all three pipelines so callers can
// tell the failure classes apart:
//
//   InputNotFound    — a required path does not exist
//   EmptyCorpus      — corpus directory has no .json files
//   MalformedCorpus  — a corpus file fails to parse or violates
//                      the {context, question, answer} schema
//   Generation       — one chunk/question failed to generate;
//                      isolated per unit, never aborts the batch
//   Artifact         — a model directory is missing pieces or
//                      cannot be read back
//
// Reference: Rust Book §9 (Error Handling)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("no .json corpus files in {dir}")]
    EmptyCorpus { dir: PathBuf },

    #[error("malformed corpus {path}: {reason}")]
    MalformedCorpus { path: PathBuf, reason: String },

    #[error("generation failed for {unit}: {reason}")]
    Generation { unit: String, reason: String },

    #[error("model artifact error at {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
}

impl PipelineError {
    /// Shorthand for the per-unit generation failure
    pub fn generation(unit: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Generation {
            unit:   unit.into(),
            reason: reason.to_string(),
        }
    }
}
