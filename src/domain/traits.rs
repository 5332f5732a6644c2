// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - PdfExtractor implements DocumentSource
//   - A future EpubExtractor could also implement DocumentSource
//   - The application layer only sees DocumentSource
//     and works with both without any changes
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::document::Document;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load one document's text.
///
/// Implementations:
///   - PdfExtractor → per-page extraction from a PDF file
pub trait DocumentSource {
    /// Load the document, or an error when the source is
    /// missing or unreadable.
    fn load(&self) -> Result<Document>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Any component that can answer natural language questions.
///
/// Implementations:
///   - QueryUseCase → beam-search decoding on the fine-tuned model
pub trait QuestionAnswerer {
    /// Given a question string, return the generated answer.
    fn answer(&self, question: &str) -> Result<String>;
}
