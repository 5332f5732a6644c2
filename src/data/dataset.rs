use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::qa_pair::QaPair;
use crate::infra::tokenizer_store::{BOS_ID, EOS_ID, PAD_ID};

/// Task prefix prepended to the context for question generation
pub const GENERATE_PREFIX: &str = "generate questions: ";
/// Task prefix prepended to a question at query time
pub const ANSWER_PREFIX: &str = "answer question: ";

/// One fully tokenised and padded training sample.
/// Input:  "generate questions: {context}"     → encoder
/// Target: "{question} {answer}" + [EOS]       → decoder (teacher-forced)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2SeqSample {
    pub input_ids:         Vec<u32>,
    pub attention_mask:    Vec<u32>,
    pub decoder_input_ids: Vec<u32>,
    pub labels:            Vec<u32>,
}

impl Seq2SeqSample {
    /// Encode one QA pair into fixed-length token sequences.
    ///
    /// The encoder side is truncated/padded to max_source_len; the
    /// decoder side to max_target_len. decoder_input_ids is the
    /// target shifted right behind [BOS], labels is the unshifted
    /// target ending in [EOS]. [PAD] fills both and is ignored by
    /// the loss.
    pub fn encode(
        pair:           &QaPair,
        tokenizer:      &Tokenizer,
        max_source_len: usize,
        max_target_len: usize,
    ) -> Result<Self> {
        assert!(max_target_len >= 1, "target length must fit at least [EOS]");

        let input_text  = format!("{GENERATE_PREFIX}{}", pair.context);
        let target_text = format!("{} {}", pair.question, pair.answer);

        let input_enc = tokenizer
            .encode(input_text.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Input tokenise: {e}"))?;
        let mut input_ids: Vec<u32> = input_enc.get_ids().to_vec();
        input_ids.truncate(max_source_len);

        let mut attention_mask = vec![1u32; input_ids.len()];
        while input_ids.len() < max_source_len {
            input_ids.push(PAD_ID);
            attention_mask.push(0);
        }

        let target_enc = tokenizer
            .encode(target_text.as_str(), false)
            .map_err(|e| anyhow::anyhow!("Target tokenise: {e}"))?;
        let mut target_ids: Vec<u32> = target_enc.get_ids().to_vec();
        target_ids.truncate(max_target_len - 1);
        target_ids.push(EOS_ID);

        // Teacher forcing: decoder sees [BOS] t0 .. tn-1, predicts t0 .. tn
        let mut decoder_input_ids = Vec::with_capacity(max_target_len);
        decoder_input_ids.push(BOS_ID);
        decoder_input_ids.extend_from_slice(&target_ids[..target_ids.len() - 1]);

        let mut labels = target_ids;
        while decoder_input_ids.len() < max_target_len {
            decoder_input_ids.push(PAD_ID);
        }
        while labels.len() < max_target_len {
            labels.push(PAD_ID);
        }

        Ok(Self { input_ids, attention_mask, decoder_input_ids, labels })
    }
}

/// Encode a whole corpus — exactly one sample per pair.
pub fn encode_corpus(
    pairs:          &[QaPair],
    tokenizer:      &Tokenizer,
    max_source_len: usize,
    max_target_len: usize,
) -> Result<Vec<Seq2SeqSample>> {
    pairs
        .iter()
        .map(|p| Seq2SeqSample::encode(p, tokenizer, max_source_len, max_target_len))
        .collect()
}

pub struct CorpusDataset {
    samples: Vec<Seq2SeqSample>,
}

impl CorpusDataset {
    pub fn new(samples: Vec<Seq2SeqSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<Seq2SeqSample> for CorpusDataset {
    fn get(&self, index: usize) -> Option<Seq2SeqSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;

    fn test_tokenizer() -> Tokenizer {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        store
            .build_and_save(
                &["generate questions the capital of france is paris what".to_string()],
                256,
            )
            .unwrap()
    }

    #[test]
    fn test_one_sample_per_pair_with_fixed_lengths() {
        let tok = test_tokenizer();
        let pairs: Vec<QaPair> = (0..5)
            .map(|n| QaPair::new(format!("the capital {n}"), "what is it?", "paris"))
            .collect();

        let samples = encode_corpus(&pairs, &tok, 32, 16).unwrap();
        assert_eq!(samples.len(), 5);
        for s in &samples {
            assert_eq!(s.input_ids.len(), 32);
            assert_eq!(s.attention_mask.len(), 32);
            assert_eq!(s.decoder_input_ids.len(), 16);
            assert_eq!(s.labels.len(), 16);
        }
    }

    #[test]
    fn test_decoder_input_is_shifted_target() {
        let tok  = test_tokenizer();
        let pair = QaPair::new("the capital of france", "what is the capital", "paris");
        let s    = Seq2SeqSample::encode(&pair, &tok, 32, 16).unwrap();

        assert_eq!(s.decoder_input_ids[0], BOS_ID);
        // labels[i] == decoder_input_ids[i + 1] up to the [EOS]
        let eos_at = s.labels.iter().position(|&id| id == EOS_ID).unwrap();
        for i in 0..eos_at {
            assert_eq!(s.labels[i], s.decoder_input_ids[i + 1]);
        }
    }

    #[test]
    fn test_labels_end_with_eos_before_padding() {
        let tok  = test_tokenizer();
        let pair = QaPair::new("france", "what", "paris");
        let s    = Seq2SeqSample::encode(&pair, &tok, 32, 16).unwrap();

        let eos_at = s.labels.iter().position(|&id| id == EOS_ID).unwrap();
        assert!(s.labels[eos_at + 1..].iter().all(|&id| id == PAD_ID));
    }

    #[test]
    fn test_long_target_is_truncated_but_keeps_eos() {
        let tok  = test_tokenizer();
        let long = "what is the capital of france ".repeat(20);
        let pair = QaPair::new("ctx", long.clone(), long);
        let s    = Seq2SeqSample::encode(&pair, &tok, 32, 8).unwrap();

        assert_eq!(s.labels.len(), 8);
        assert_eq!(*s.labels.last().unwrap(), EOS_ID);
    }

    #[test]
    fn test_attention_mask_marks_real_tokens() {
        let tok  = test_tokenizer();
        let pair = QaPair::new("france", "what", "paris");
        let s    = Seq2SeqSample::encode(&pair, &tok, 32, 16).unwrap();

        let real = s.attention_mask.iter().filter(|&&m| m == 1).count();
        assert!(real > 0 && real < 32);
        // Masked-off positions are exactly the padded ones
        for (id, m) in s.input_ids.iter().zip(&s.attention_mask) {
            if *m == 0 {
                assert_eq!(*id, PAD_ID);
            }
        }
    }

    #[test]
    fn test_empty_context_still_encodes() {
        let tok  = test_tokenizer();
        let pair = QaPair::new("", "", "");
        let s    = Seq2SeqSample::encode(&pair, &tok, 16, 8).unwrap();
        // The task prefix alone supplies the encoder tokens
        assert!(s.attention_mask.iter().any(|&m| m == 1));
    }

    #[test]
    fn test_dataset_len_matches_samples() {
        let tok     = test_tokenizer();
        let pairs   = vec![QaPair::new("a", "b", "c"), QaPair::new("d", "e", "f")];
        let samples = encode_corpus(&pairs, &tok, 16, 8).unwrap();
        let dataset = CorpusDataset::new(samples);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.get(1).is_some());
        assert!(dataset.get(2).is_none());
    }
}
