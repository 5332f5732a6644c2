// ============================================================
// Layer 5 — Text Generator
// ============================================================
// The single generation interface both pipelines call into:
// gen-qa drives it with `generate questions: {chunk}` prompts,
// query with `answer question: {question}` prompts. Loading,
// encoding, and decoding live here exactly once.
//
// Decoding is encode-once beam search: the encoder memory is
// computed one time per prompt, then each step runs the decoder
// over every live hypothesis and hands the resulting log-probs
// to the BeamSearch ranker.

use anyhow::Result;
use std::path::Path;

use burn::prelude::*;
use burn::tensor::activation::log_softmax;
use tokenizers::Tokenizer;

use crate::backend::{Device, InferenceBackend};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::tokenizer_store::{TokenizerStore, BOS_ID, EOS_ID, PAD_ID, UNK_ID};
use crate::ml::beam::BeamSearch;
use crate::ml::model::Seq2SeqModel;

/// Decoding parameters for one generator instance.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Maximum number of generated tokens per call
    pub max_new_tokens: usize,
    /// Beam width
    pub num_beams: usize,
    /// Freeze hypotheses on [EOS] and stop when all are frozen
    pub early_stopping: bool,
    /// Length-normalisation exponent for beam ranking
    pub length_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            num_beams:      4,
            early_stopping: true,
            length_penalty: 1.0,
        }
    }
}

pub struct TextGenerator {
    model:     Seq2SeqModel<InferenceBackend>,
    tokenizer: Tokenizer,
    device:    Device,
    options:   GenerationOptions,
}

impl TextGenerator {
    /// Load model + tokenizer from an artifact directory produced
    /// by the finetune pipeline.
    pub fn from_artifact(dir: &Path, device: Device, options: GenerationOptions) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(dir);

        // Rebuild the exact architecture first, dropout disabled so
        // decoding is deterministic, then load the weights into it
        let model_cfg = ckpt_manager.load_model_config()?.with_dropout(0.0);
        let tokenizer = TokenizerStore::new(dir).load()?;
        let model = ckpt_manager.load_model(model_cfg.init::<InferenceBackend>(&device), &device)?;

        tracing::info!("Model loaded from '{}'", dir.display());
        Ok(Self { model, tokenizer, device, options })
    }

    /// Generate text for one prompt via beam search.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        // ── Encode the prompt once ────────────────────────────────────────────
        let enc = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| anyhow::anyhow!("Prompt tokenise: {e}"))?;
        let mut input_ids: Vec<u32> = enc.get_ids().to_vec();
        input_ids.truncate(self.model.max_source_len);
        if input_ids.is_empty() {
            // A prompt of pure punctuation/whitespace still needs
            // one encoder position to attend over
            input_ids.push(UNK_ID);
        }

        let ints: Vec<i32> = input_ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<InferenceBackend, 1, Int>::from_ints(ints.as_slice(), &self.device)
            .unsqueeze::<2>();
        let src_pad_mask = Seq2SeqModel::pad_mask(&input);
        let memory = self.model.encode(input, src_pad_mask.clone());

        // ── Beam-search decode ────────────────────────────────────────────────
        let mut beam_search = BeamSearch::new(self.options.num_beams, EOS_ID)
            .with_length_penalty(self.options.length_penalty);
        if self.options.early_stopping {
            beam_search = beam_search.with_early_stopping();
        }

        // The decoder's positional table bounds how far we can go
        let budget = self
            .options
            .max_new_tokens
            .min(self.model.max_target_len.saturating_sub(1));

        let mut beams = beam_search.init(BOS_ID);
        for _ in 0..budget {
            let expansions = beams
                .iter()
                .map(|hyp| {
                    if hyp.is_done {
                        return Ok((hyp.clone(), Vec::new()));
                    }
                    let log_probs = self.next_token_log_probs(&memory, &src_pad_mask, &hyp.tokens)?;
                    Ok((hyp.clone(), log_probs))
                })
                .collect::<Result<Vec<_>>>()?;

            beams = beam_search.step(expansions);
            if beam_search.all_done(&beams) {
                break;
            }
        }

        let best = beam_search
            .best(&beams)
            .ok_or_else(|| anyhow::anyhow!("beam search produced no hypotheses"))?;

        // Strip the control tokens before decoding back to text
        let output_ids: Vec<u32> = best
            .tokens
            .iter()
            .copied()
            .filter(|&id| id != BOS_ID && id != EOS_ID && id != PAD_ID)
            .collect();
        if output_ids.is_empty() {
            return Ok(String::new());
        }

        let text = self
            .tokenizer
            .decode(&output_ids, true)
            .map_err(|e| anyhow::anyhow!("Decode: {e}"))?;
        Ok(text.trim().to_string())
    }

    /// Run the decoder over one hypothesis and return the
    /// log-probabilities of its next token.
    fn next_token_log_probs(
        &self,
        memory:       &Tensor<InferenceBackend, 3>,
        src_pad_mask: &Tensor<InferenceBackend, 2, Bool>,
        tokens:       &[u32],
    ) -> Result<Vec<f32>> {
        let t = tokens.len();
        let ints: Vec<i32> = tokens.iter().map(|&x| x as i32).collect();
        let decoder_input = Tensor::<InferenceBackend, 1, Int>::from_ints(ints.as_slice(), &self.device)
            .unsqueeze::<2>();

        let logits = self
            .model
            .decode(memory.clone(), src_pad_mask.clone(), decoder_input);
        let last = logits
            .slice([0..1, t - 1..t, 0..self.model.vocab_size])
            .reshape([self.model.vocab_size]);

        log_softmax(last, 0)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read logits: {e:?}"))
    }
}
