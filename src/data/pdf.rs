// ============================================================
// Layer 4 — PDF Extractor
// ============================================================
// Extracts text from a PDF file using the lopdf crate.
//
// lopdf parses the PDF object graph and exposes the page tree
// as a map keyed by page number, so iterating it visits pages
// in document order. extract_text() decodes each page's content
// streams into a plain string.
//
// Page texts are concatenated with NO separator — the output is
// exactly the in-order concatenation of every page's extraction
// result. A page that yields no text (scanned image, empty page,
// or a content stream lopdf cannot decode) contributes the empty
// string and a warning instead of aborting the run.
//
// Reference: lopdf crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::document::Document;
use crate::domain::error::PipelineError;
use crate::domain::traits::DocumentSource;

/// Loads the text of one PDF file.
/// Implements the DocumentSource trait from Layer 3.
pub struct PdfExtractor {
    /// Path to the .pdf file
    path: PathBuf,
}

impl PdfExtractor {
    /// Create a new PdfExtractor pointed at a file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Extract the text of every page, in page order.
    /// One String per page; empty when the page has no text.
    fn extract_page_texts(&self) -> Result<Vec<String>> {
        let doc = lopdf::Document::load(&self.path)
            .with_context(|| format!("Cannot parse PDF '{}'", self.path.display()))?;

        let mut pages = Vec::new();

        // get_pages() returns a BTreeMap<page number, object id>,
        // so iteration order is page order
        for (&page_num, _) in doc.get_pages().iter() {
            match doc.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => pages.push(text),
                Ok(_) => {
                    tracing::warn!(
                        "Page {} of '{}' has no extractable text",
                        page_num,
                        self.path.display()
                    );
                    pages.push(String::new());
                }
                // Keep going — one undecodable page must not lose the document
                Err(e) => {
                    tracing::warn!(
                        "Cannot extract page {} of '{}': {}",
                        page_num,
                        self.path.display(),
                        e
                    );
                    pages.push(String::new());
                }
            }
        }

        Ok(pages)
    }
}

impl DocumentSource for PdfExtractor {
    fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            return Err(PipelineError::InputNotFound { path: self.path.clone() }.into());
        }

        let pages = self.extract_page_texts()?;
        tracing::info!(
            "Extracted {} pages from '{}'",
            pages.len(),
            self.path.display()
        );

        let source = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Document::new(source, concat_pages(&pages)))
    }
}

/// Join page texts in order with no separator.
fn concat_pages(pages: &[String]) -> String {
    pages.concat()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chunker::Chunker;

    #[test]
    fn test_pages_concatenate_in_order_without_separator() {
        let pages = vec!["A text. ".to_string(), "B text. ".to_string(), "C text.".to_string()];
        assert_eq!(concat_pages(&pages), "A text. B text. C text.");
    }

    #[test]
    fn test_empty_page_contributes_nothing() {
        let pages = vec!["one".to_string(), String::new(), "two".to_string()];
        assert_eq!(concat_pages(&pages), "onetwo");
    }

    #[test]
    fn test_three_page_document_chunks_at_fixed_boundaries() {
        // Pins down the extraction → chunking hand-off exactly:
        // concatenation carries whatever trailing whitespace each page
        // extraction produced, and the chunker cuts every 10 chars.
        let pages = vec!["A text. ".to_string(), "B text. ".to_string(), "C text.".to_string()];
        let text = concat_pages(&pages);
        let chunks = Chunker::new(10).chunk(&text);
        assert_eq!(chunks, vec!["A text. B ", "text. C te", "xt."]);
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let extractor = PdfExtractor::new("/definitely/not/here.pdf");
        let err = extractor.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputNotFound { .. })
        ));
    }
}
