// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Manages tokenizer building, saving, and loading.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. The workable approach at this scale is
// to build the tokenizer JSON directly from corpus word counts
// and load it back, bypassing the trainer type mismatch.
//
// The vocabulary is word-level with four special tokens in fixed
// slots; every other id is assigned by descending corpus
// frequency. The same tokenizer.json travels with the model
// artifact so fine-tuning and querying always agree on ids.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Padding token id — also what the loss ignores in labels
pub const PAD_ID: u32 = 0;
/// Unknown-word token id
pub const UNK_ID: u32 = 1;
/// Decoder start-of-sequence token id
pub const BOS_ID: u32 = 2;
/// End-of-sequence token id — terminates beam hypotheses
pub const EOS_ID: u32 = 3;

/// Number of reserved special-token slots
const SPECIAL_TOKENS: usize = 4;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        if self.dir.join("tokenizer.json").exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from its JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })
    }

    /// Persist an already-loaded tokenizer into this store's
    /// directory (used when fine-tuning continues from an
    /// existing artifact but saves to a new output dir).
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir).ok();
        let path = self.dir.join("tokenizer.json");
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot save tokenizer to '{}': {}", path.display(), e))
    }

    /// Effective vocabulary size including special tokens —
    /// this is what sizes the model's embedding table.
    pub fn vocab_size(tokenizer: &Tokenizer) -> usize {
        tokenizer.get_vocab_size(true)
    }

    /// Build a word-level vocabulary from corpus texts and write a
    /// valid tokenizer JSON directly.
    pub fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Build vocabulary from word frequencies ────────────────────
        use std::collections::HashMap;
        let mut freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in text.split_whitespace() {
                // Normalise to lowercase, strip punctuation from edges
                let w = word.to_lowercase();
                let w = w.trim_matches(|c: char| !c.is_alphanumeric());
                if !w.is_empty() {
                    *freq.entry(w.to_string()).or_insert(0) += 1;
                }
            }
        }

        // Sort by frequency descending (ties by word so the build is
        // deterministic), keep the top vocab_size - 4 entries
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
            "[BOS]": BOS_ID,
            "[EOS]": EOS_ID,
        });

        let mut next_id = SPECIAL_TOKENS as u64;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        // This format is what Tokenizer::from_file() expects
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": BOS_ID, "content": "[BOS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": EOS_ID, "content": "[EOS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join("tokenizer.json");
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        // Load back as a proper Tokenizer instance
        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_then_encode_known_words() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["the cat sat on the mat".to_string()];
        let tok   = store.build_and_save(&texts, 100).unwrap();

        let enc = tok.encode("the cat", false).unwrap();
        assert_eq!(enc.get_ids().len(), 2);
        // No id may collide with the reserved special slots
        assert!(enc.get_ids().iter().all(|&id| id >= SPECIAL_TOKENS as u32));
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok   = store
            .build_and_save(&["alpha beta".to_string()], 100)
            .unwrap();

        let enc = tok.encode("gamma", false).unwrap();
        assert_eq!(enc.get_ids(), &[UNK_ID]);
    }

    #[test]
    fn test_load_or_build_reuses_saved_file() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok1  = store
            .load_or_build(&["one two three".to_string()], 100)
            .unwrap();
        // Second call must load the same vocabulary, not rebuild
        let tok2 = store.load_or_build(&[], 100).unwrap();
        assert_eq!(
            tok1.encode("two", false).unwrap().get_ids(),
            tok2.encode("two", false).unwrap().get_ids()
        );
    }

    #[test]
    fn test_vocab_capped_at_requested_size() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let texts = vec!["a b c d e f g h i j k l m n o p".to_string()];
        let tok   = store.build_and_save(&texts, 8).unwrap();
        assert!(TokenizerStore::vocab_size(&tok) <= 8);
    }
}
