// ============================================================
// Layer 2 — FinetuneUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load + validate the corpus   (Layer 4 - data)
//   Step 2: Resolve the model source     (Layer 5/6)
//           preset name → fresh weights, corpus tokenizer
//           artifact dir → saved weights, saved tokenizer
//   Step 3: Encode training samples      (Layer 4 - data)
//   Step 4: Build / restore the model    (Layer 5 - ml)
//   Step 5: Save config + recipe         (Layer 6 - infra)
//   Step 6: Run the training loop        (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::backend::{Device, TrainBackend};
use crate::data::{
    corpus::CorpusReader,
    dataset::{encode_corpus, CorpusDataset},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    model::{Seq2SeqConfig, Seq2SeqModel},
    trainer::run_training,
    ModelSource,
};

// ─── Fine-Tuning Configuration ───────────────────────────────────────────────
// All hyperparameters for a fine-tuning run. Serialisable so the
// recipe can be written next to the artifact for provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    pub data_dir:         String,
    pub output_dir:       String,
    /// Preset name (e.g. "t5-small") or path to an existing artifact
    pub model_source:     String,
    pub epochs:           usize,
    pub batch_size:       usize,
    pub max_source_len:   usize,
    pub max_target_len:   usize,
    pub lr:               f64,
    pub weight_decay:     f32,
    pub warmup_steps:     usize,
    pub save_steps:       usize,
    pub keep_checkpoints: usize,
    pub log_steps:        usize,
    pub seed:             u64,
}

impl Default for FinetuneConfig {
    fn default() -> Self {
        Self {
            data_dir:         String::new(),
            output_dir:       String::new(),
            model_source:     "t5-small".to_string(),
            epochs:           3,
            batch_size:       8,
            max_source_len:   512,
            max_target_len:   512,
            lr:               5e-5,
            weight_decay:     0.01,
            warmup_steps:     500,
            save_steps:       500,
            keep_checkpoints: 2,
            log_steps:        100,
            seed:             42,
        }
    }
}

// ─── FinetuneUseCase ─────────────────────────────────────────────────────────
pub struct FinetuneUseCase {
    config: FinetuneConfig,
    device: Device,
}

impl FinetuneUseCase {
    pub fn new(config: FinetuneConfig, device: Device) -> Self {
        Self { config, device }
    }

    /// Execute the full fine-tuning pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the QA corpus ────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_dir);
        let pairs = CorpusReader::new(&cfg.data_dir).load_all()?;

        // ── Step 2: Resolve the model source ──────────────────────────────────
        let source    = ModelSource::parse(&cfg.model_source);
        let out_store = TokenizerStore::new(&cfg.output_dir);

        let (tokenizer, model_cfg) = match &source {
            ModelSource::Preset(name) => {
                let base = Seq2SeqConfig::preset(name).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown model '{}': not a preset name and not an artifact directory",
                        name
                    )
                })?;

                // The tokenizer is built from the corpus itself and
                // saved straight into the output artifact
                let texts: Vec<String> = pairs
                    .iter()
                    .flat_map(|p| {
                        [p.context.clone(), p.question.clone(), p.answer.clone()]
                    })
                    .collect();
                let tokenizer = out_store.load_or_build(&texts, base.vocab_size)?;

                // Narrow the embedding table to the actual vocabulary
                let mut model_cfg = base;
                model_cfg.vocab_size     = TokenizerStore::vocab_size(&tokenizer);
                model_cfg.max_source_len = cfg.max_source_len;
                model_cfg.max_target_len = cfg.max_target_len;
                (tokenizer, model_cfg)
            }
            ModelSource::Artifact(dir) => {
                // Continued fine-tuning: architecture and vocabulary
                // are fixed by the existing artifact
                let model_cfg = CheckpointManager::new(dir).load_model_config()?;
                let tokenizer = TokenizerStore::new(dir).load()?;
                out_store.save(&tokenizer)?;
                (tokenizer, model_cfg)
            }
        };

        // ── Step 3: Encode training samples (one per pair) ────────────────────
        let samples = encode_corpus(
            &pairs,
            &tokenizer,
            model_cfg.max_source_len,
            model_cfg.max_target_len,
        )?;
        tracing::info!("Built {} training samples", samples.len());
        if samples.is_empty() {
            tracing::warn!("Corpus contains no QA pairs — saving an untrained model");
        }
        let dataset = CorpusDataset::new(samples);

        // ── Step 4: Build the model (fresh or restored weights) ───────────────
        let mut model: Seq2SeqModel<TrainBackend> = model_cfg.init(&self.device);
        if let ModelSource::Artifact(dir) = &source {
            model = CheckpointManager::new(dir).load_model(model, &self.device)?;
            tracing::info!("Continuing fine-tuning from '{}'", dir.display());
        }

        // ── Step 5: Save config + recipe for the artifact ─────────────────────
        // query rebuilds the model from config.json before loading
        // weights; training_args.json is provenance only
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir);
        ckpt_manager.save_model_config(&model_cfg)?;
        fs::write(
            ckpt_manager.dir().join("training_args.json"),
            serde_json::to_string_pretty(cfg)?,
        )
        .with_context(|| "Cannot write training_args.json")?;

        // ── Step 6: Run the training loop (Layer 5) ───────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        run_training(cfg, model, dataset, &ckpt_manager, &metrics, self.device.clone())?;

        tracing::info!("Fine-tuned model saved to '{}'", cfg.output_dir);
        Ok(())
    }
}
