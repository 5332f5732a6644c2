// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// Represents a single document loaded from disk.
// This is a plain data struct with no behaviour —
// just a source name and the extracted text content.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// A raw document loaded from disk.
/// Format-agnostic — by the time a Document is created,
/// the text has already been extracted from the PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The filename or path — kept for traceability
    /// so we know which file a QA pair came from
    pub source: String,

    /// The full extracted text content of the document
    /// before any cleaning or chunking
    pub text: String,
}

impl Document {
    /// Create a new Document with a source path and text content.
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }
}
