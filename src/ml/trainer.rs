// ============================================================
// Layer 5 — Fine-Tuning Loop
// ============================================================
// Manual train loop over the corpus dataset with AdamW.
//
// The recipe is fixed (matching the checkpoint's provenance):
//   - AdamW, weight decay 0.01
//   - learning rate 5e-5 with linear warmup over 500 steps
//   - checkpoint every 500 optimizer steps, keep the last 2
//   - log every 100 steps
//   - no validation split — training proceeds blind, the only
//     quality signal is the falling train loss
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::finetune_use_case::FinetuneConfig;
use crate::backend::{Device, TrainBackend};
use crate::data::{batcher::Seq2SeqBatcher, dataset::CorpusDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, TrainStepMetrics},
};
use crate::ml::model::Seq2SeqModel;

pub fn run_training(
    cfg:          &FinetuneConfig,
    mut model:    Seq2SeqModel<TrainBackend>,
    dataset:      CorpusDataset,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       Device,
) -> Result<()> {
    TrainBackend::seed(cfg.seed);

    let sample_count = dataset.sample_count();
    tracing::info!(
        "Training on {} samples for {} epochs (batch_size={})",
        sample_count,
        cfg.epochs,
        cfg.batch_size
    );

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    let optim_cfg = AdamWConfig::new().with_weight_decay(cfg.weight_decay);
    let mut optim = optim_cfg.init();

    // ── Training data loader ──────────────────────────────────────────────────
    let batcher = Seq2SeqBatcher::default();
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device)
        .build(dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut global_step = 0usize;

    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            let (loss, _) = model.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.decoder_input_ids,
                batch.labels,
            );

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;
            global_step += 1;

            // Linear warmup ramps the learning rate up from zero
            let lr = warmup_lr(cfg.lr, global_step, cfg.warmup_steps);

            // Backward pass + AdamW update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            if global_step % cfg.log_steps == 0 {
                tracing::info!(
                    "step {:>6} | epoch {} | loss={:.4} | lr={:.2e}",
                    global_step, epoch, loss_val, lr,
                );
                metrics.log(&TrainStepMetrics::new(global_step, epoch, loss_val, lr))?;
            }

            if global_step % cfg.save_steps == 0 {
                ckpt_manager.save_step(&model, global_step, cfg.keep_checkpoints)?;
            }
        }

        let avg_loss = if batches > 0 {
            loss_sum / batches as f64
        } else {
            f64::NAN
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | steps={}",
            epoch, cfg.epochs, avg_loss, global_step,
        );
    }

    ckpt_manager.save_final(&model)?;
    tracing::info!("Fine-tuning complete after {} steps", global_step);
    Ok(())
}

/// Linear warmup: ramps from ~0 to `base` over `warmup` steps,
/// flat afterwards. Step counting starts at 1.
fn warmup_lr(base: f64, step: usize, warmup: usize) -> f64 {
    if warmup == 0 {
        base
    } else {
        base * (step as f64 / warmup as f64).min(1.0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_ramps_linearly() {
        assert!((warmup_lr(5e-5, 1, 500) - 1e-7).abs() < 1e-12);
        assert!((warmup_lr(5e-5, 250, 500) - 2.5e-5).abs() < 1e-12);
        assert!((warmup_lr(5e-5, 500, 500) - 5e-5).abs() < 1e-12);
    }

    #[test]
    fn test_warmup_flat_after_window() {
        assert_eq!(warmup_lr(5e-5, 501, 500), 5e-5);
        assert_eq!(warmup_lr(5e-5, 100_000, 500), 5e-5);
    }

    #[test]
    fn test_zero_warmup_is_identity() {
        assert_eq!(warmup_lr(5e-5, 1, 0), 5e-5);
    }
}
