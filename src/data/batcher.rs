// ============================================================
// Layer 4 — Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<Seq2SeqSample>
// into tensors for the model forward pass.
//
// All sequences are already padded to fixed lengths, so batching
// is a straight per-sample 1D tensor + stack — no dynamic padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::Seq2SeqSample;

/// A batch of seq2seq samples ready for the model.
/// All tensors have batch_size as their first dimension.
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    /// Encoder token ids — shape: [batch_size, source_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Encoder attention mask — 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Decoder input ids ([BOS]-shifted) — [batch_size, target_len]
    pub decoder_input_ids: Tensor<B, 2, Int>,

    /// Target ids the decoder must predict — [batch_size, target_len]
    pub labels: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct Seq2SeqBatcher;

impl<B: Backend> Batcher<B, Seq2SeqSample, Seq2SeqBatch<B>> for Seq2SeqBatcher {
    fn batch(&self, items: Vec<Seq2SeqSample>, device: &B::Device) -> Seq2SeqBatch<B> {
        let to_row = |ids: &[u32]| {
            let ints: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
            Tensor::<B, 1, Int>::from_ints(ints.as_slice(), device)
        };

        let input_ids = Tensor::stack(
            items.iter().map(|s| to_row(&s.input_ids)).collect::<Vec<_>>(),
            0,
        );
        let attention_mask = Tensor::stack(
            items.iter().map(|s| to_row(&s.attention_mask)).collect::<Vec<_>>(),
            0,
        );
        let decoder_input_ids = Tensor::stack(
            items.iter().map(|s| to_row(&s.decoder_input_ids)).collect::<Vec<_>>(),
            0,
        );
        let labels = Tensor::stack(
            items.iter().map(|s| to_row(&s.labels)).collect::<Vec<_>>(),
            0,
        );

        Seq2SeqBatch {
            input_ids,
            attention_mask,
            decoder_input_ids,
            labels,
        }
    }
}
