// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the thin data adapters (dataset/batcher) in Layer 4.
//
// What's in this layer:
//
//   model.rs     — The encoder-decoder transformer
//                  • Shared token embeddings (T5-style tying)
//                  • Learned positional embeddings per side
//                  • Encoder blocks: self-attention + FFN
//                  • Decoder blocks: masked self-attention,
//                    cross-attention over encoder memory, FFN
//                  • LM head projecting to the vocabulary
//                  • Named architecture presets
//
//   trainer.rs   — The supervised fine-tuning loop
//                  AdamW with weight decay, linear warmup,
//                  periodic step checkpoints, metrics rows
//
//   beam.rs      — Beam-search decoding over log-probs
//
//   generator.rs — The single generation interface both the
//                  gen-qa and query pipelines call into
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Raffel et al. (2020) T5

/// Encoder-decoder transformer architecture
pub mod model;

/// Fine-tuning loop with warmup and step checkpointing
pub mod trainer;

/// Beam-search decoder
pub mod beam;

/// Unified text-generation interface
pub mod generator;

use std::path::{Path, PathBuf};

/// Where model weights come from.
///
/// The two generator variants of the original scripts (load by
/// model name vs. load explicit local weights) collapse into this
/// one enum: a name selects an architecture preset with fresh
/// weights, a path loads a previously saved artifact directory.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// A named architecture preset, e.g. "t5-small"
    Preset(String),

    /// A directory produced by the finetune pipeline
    Artifact(PathBuf),
}

impl ModelSource {
    /// A string that names an existing directory is an artifact
    /// path; anything else is treated as a preset name.
    pub fn parse(name_or_path: &str) -> Self {
        let path = Path::new(name_or_path);
        if path.is_dir() {
            Self::Artifact(path.to_path_buf())
        } else {
            Self::Preset(name_or_path.to_string())
        }
    }
}
