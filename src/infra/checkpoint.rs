// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns the model artifact directory layout:
//
//   <dir>/
//     config.json            ← model architecture (rebuild first,
//                              then load weights into it)
//     tokenizer.json         ← written by TokenizerStore
//     model_step_500.mpk     ← periodic checkpoints, pruned to
//     model_step_1000.mpk      the most recent `keep`
//     latest_step.json       ← number of the newest step file
//     model.mpk              ← final weights after training
//
// Burn's CompactRecorder serialises model parameters to
// MessagePack. Loading is type-safe: it fails if the saved
// record doesn't match the architecture it is loaded into,
// which is exactly why config.json is saved alongside.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::domain::error::PipelineError;
use crate::ml::model::{Seq2SeqConfig, Seq2SeqModel};

const STEP_PREFIX: &str = "model_step_";
const RECORD_EXT:  &str = "mpk";

/// Manages saving and loading of one model artifact directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a periodic checkpoint for a given optimizer step and
    /// prune old step files down to the `keep` most recent.
    pub fn save_step<B: AutodiffBackend>(
        &self,
        model: &Seq2SeqModel<B>,
        step:  usize,
        keep:  usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("{STEP_PREFIX}{step}"));
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        // Update the pointer the loader falls back to when no
        // final model exists (e.g. after a killed run)
        fs::write(
            self.dir.join("latest_step.json"),
            serde_json::to_string(&step)?,
        )
        .with_context(|| "Failed to write latest_step.json")?;

        self.prune_steps(keep)?;
        tracing::debug!("Saved checkpoint at step {}", step);
        Ok(())
    }

    /// Save the final weights at the end of training.
    pub fn save_final<B: AutodiffBackend>(&self, model: &Seq2SeqModel<B>) -> Result<()> {
        let path = self.dir.join("model");
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::info!("Final model saved to '{}'", self.dir.display());
        Ok(())
    }

    /// Load weights into a freshly built model of the matching
    /// architecture. Prefers the final model; falls back to the
    /// newest step checkpoint.
    pub fn load_model<B: Backend>(
        &self,
        model:  Seq2SeqModel<B>,
        device: &B::Device,
    ) -> Result<Seq2SeqModel<B>> {
        let path = if self.dir.join(format!("model.{RECORD_EXT}")).exists() {
            self.dir.join("model")
        } else {
            let step = self.latest_step()?;
            tracing::info!("No final model — loading checkpoint from step {}", step);
            self.dir.join(format!("{STEP_PREFIX}{step}"))
        };

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load weights '{}'. Has this model been fine-tuned?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the model architecture so a later process can rebuild
    /// the exact same model before loading weights into it.
    pub fn save_model_config(&self, cfg: &Seq2SeqConfig) -> Result<()> {
        let path = self.dir.join("config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Load the model architecture config from the artifact.
    pub fn load_model_config(&self) -> Result<Seq2SeqConfig> {
        let path = self.dir.join("config.json");
        Seq2SeqConfig::load(&path).map_err(|e| {
            PipelineError::Artifact {
                path:   self.dir.clone(),
                reason: format!("missing or unreadable config.json: {e}"),
            }
            .into()
        })
    }

    /// Read latest_step.json and return the step number.
    fn latest_step(&self) -> Result<usize> {
        let path = self.dir.join("latest_step.json");
        let s = fs::read_to_string(&path).map_err(|_| PipelineError::Artifact {
            path:   self.dir.clone(),
            reason: "no model weights found (neither final nor step checkpoint)".to_string(),
        })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// Delete step checkpoints beyond the `keep` most recent.
    fn prune_steps(&self, keep: usize) -> Result<()> {
        let mut steps: Vec<(usize, PathBuf)> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let step = name
                    .strip_prefix(STEP_PREFIX)?
                    .strip_suffix(&format!(".{RECORD_EXT}"))?
                    .parse::<usize>()
                    .ok()?;
                Some((step, path))
            })
            .collect();

        // Newest first; everything past `keep` goes
        steps.sort_by(|a, b| b.0.cmp(&a.0));
        for (step, path) in steps.into_iter().skip(keep) {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("Cannot prune checkpoint step {}: {}", step, e);
            } else {
                tracing::debug!("Pruned checkpoint step {}", step);
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn touch_step(dir: &Path, step: usize) {
        fs::write(dir.join(format!("{STEP_PREFIX}{step}.{RECORD_EXT}")), b"x").unwrap();
    }

    fn step_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(STEP_PREFIX))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_prune_keeps_two_most_recent() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path());
        for step in [500, 1000, 1500, 2000] {
            touch_step(tmp.path(), step);
        }

        ckpt.prune_steps(2).unwrap();
        assert_eq!(
            step_files(tmp.path()),
            vec!["model_step_1500.mpk", "model_step_2000.mpk"]
        );
    }

    #[test]
    fn test_prune_with_fewer_files_than_keep_is_noop() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path());
        touch_step(tmp.path(), 500);

        ckpt.prune_steps(2).unwrap();
        assert_eq!(step_files(tmp.path()), vec!["model_step_500.mpk"]);
    }

    #[test]
    fn test_prune_ignores_unrelated_files() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path());
        fs::write(tmp.path().join("model.mpk"), b"final").unwrap();
        fs::write(tmp.path().join("config.json"), b"{}").unwrap();
        for step in [1, 2, 3] {
            touch_step(tmp.path(), step);
        }

        ckpt.prune_steps(1).unwrap();
        assert!(tmp.path().join("model.mpk").exists());
        assert!(tmp.path().join("config.json").exists());
        assert_eq!(step_files(tmp.path()), vec!["model_step_3.mpk"]);
    }

    #[test]
    fn test_missing_config_is_artifact_error() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path());
        let err  = ckpt.load_model_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Artifact { .. })
        ));
    }

    #[test]
    fn test_model_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path());
        let cfg  = Seq2SeqConfig::preset("t5-small").unwrap();
        ckpt.save_model_config(&cfg).unwrap();

        let loaded = ckpt.load_model_config().unwrap();
        assert_eq!(loaded.d_model, cfg.d_model);
        assert_eq!(loaded.num_encoder_layers, cfg.num_encoder_layers);
        assert_eq!(loaded.vocab_size, cfg.vocab_size);
    }
}
