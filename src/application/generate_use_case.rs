// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Orchestrates the corpus-generation pipeline in order:
//
//   Step 1: Load the generation model   (Layer 5 - ml)
//   Step 2: Extract PDF text            (Layer 4 - data)
//   Step 3: Clean the text              (Layer 4 - data)
//   Step 4: Chunk into fixed windows    (Layer 4 - data)
//   Step 5: Generate + parse per chunk  (Layer 5 - ml, Layer 3)
//           flushing after every chunk  (Layer 4 - data)
//
// A chunk whose generation or parsing fails is logged and
// skipped; the corpus file always holds every completed chunk,
// so a crash mid-run loses at most the chunk in flight.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backend::Device;
use crate::data::{
    chunker::Chunker,
    corpus::CorpusWriter,
    dataset::GENERATE_PREFIX,
    pdf::PdfExtractor,
    preprocessor::Preprocessor,
};
use crate::domain::error::PipelineError;
use crate::domain::qa_pair::QaPair;
use crate::domain::traits::DocumentSource;
use crate::ml::generator::{GenerationOptions, TextGenerator};

// ─── Generation Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Path to the input PDF
    pub input: String,
    /// Path of the JSON corpus to write
    pub output: String,
    /// Directory holding the pretrained question-generation model
    pub weights_dir: String,
    /// Characters per chunk fed to one generation call
    pub chunk_size: usize,
    /// Token budget per generation call
    pub max_new_tokens: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            input:          String::new(),
            output:         String::new(),
            weights_dir:    "weights".to_string(),
            chunk_size:     512,
            max_new_tokens: 256,
        }
    }
}

// ─── GenerateUseCase ─────────────────────────────────────────────────────────
pub struct GenerateUseCase {
    config: GenerateConfig,
    device: Device,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig, device: Device) -> Self {
        Self { config, device }
    }

    /// Execute the full generation pipeline end to end.
    /// Returns the number of QA pairs written.
    pub fn execute(&self) -> Result<usize> {
        let cfg = &self.config;

        // ── Step 1: Load the question-generation model ────────────────────────
        let weights = Path::new(&cfg.weights_dir);
        if !weights.is_dir() {
            return Err(PipelineError::InputNotFound { path: weights.to_path_buf() }.into());
        }
        let options = GenerationOptions {
            max_new_tokens: cfg.max_new_tokens,
            ..GenerationOptions::default()
        };
        let generator = TextGenerator::from_artifact(weights, self.device.clone(), options)?;

        // ── Step 2: Extract text from the PDF ─────────────────────────────────
        let extractor = PdfExtractor::new(&cfg.input);
        let document  = extractor.load()?;
        tracing::info!("Text extracted from PDF ({} chars)", document.text.len());

        // ── Step 3: Clean / normalise text ────────────────────────────────────
        let clean_text = Preprocessor::new().clean(&document.text);

        // ── Step 4: Chunk into fixed character windows ────────────────────────
        let chunker = Chunker::new(cfg.chunk_size);
        let chunks  = chunker.chunk(&clean_text);
        tracing::info!("Split into {} chunks of {} chars", chunks.len(), cfg.chunk_size);

        // ── Step 5: Generate QA pairs chunk by chunk ──────────────────────────
        // The writer rewrites the whole array after each chunk, so the
        // output file is always a valid corpus of the completed work.
        let mut writer = CorpusWriter::new(&cfg.output);
        writer.flush()?;

        for (i, chunk) in chunks.iter().enumerate() {
            let unit   = format!("chunk {}/{}", i + 1, chunks.len());
            let prompt = format!("{GENERATE_PREFIX}{chunk}");

            match generator.generate(&prompt) {
                Ok(raw) => {
                    let pairs = QaPair::parse_generated(chunk, &raw);
                    if pairs.is_empty() {
                        tracing::warn!(
                            "{}",
                            PipelineError::generation(unit, "output contained no parseable QA pair")
                        );
                        continue;
                    }
                    tracing::debug!("{}: {} pairs", unit, pairs.len());
                    writer.append(pairs)?;
                }
                // One failed chunk must not abort the whole document
                Err(e) => {
                    tracing::warn!("{}", PipelineError::generation(unit, e));
                }
            }
        }

        tracing::info!("QA pairs saved to '{}' ({} pairs)", cfg.output, writer.len());
        Ok(writer.len())
    }
}
