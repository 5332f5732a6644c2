// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a raw PDF file all the
// way to GPU-ready tensor batches.
//
// The gen-qa side of the pipeline flows in this order:
//
//   input.pdf
//       │
//       ▼
//   PdfExtractor      → per-page text, concatenated in order
//       │
//       ▼
//   Preprocessor      → cleans text (whitespace, encoding)
//       │
//       ▼
//   Chunker           → fixed-size character windows
//       │
//       ▼
//   CorpusWriter      → flushes QA pairs to the JSON corpus
//
// and the finetune side:
//
//   corpus dir (*.json)
//       │
//       ▼
//   CorpusReader      → validated QaPair records
//       │
//       ▼
//   Seq2SeqSample     → fixed-length token sequences
//       │
//       ▼
//   CorpusDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   Seq2SeqBatcher    → stacks samples into tensor batches
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Extracts per-page text from a PDF using lopdf
pub mod pdf;

/// Cleans and normalises raw extracted text
pub mod preprocessor;

/// Splits text into fixed-size character windows
pub mod chunker;

/// Reads, validates, and incrementally writes the JSON corpus
pub mod corpus;

/// Fixed-length seq2seq training samples + Burn Dataset impl
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
