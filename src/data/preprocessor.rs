// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans raw text extracted from PDFs before chunking.
//
// Why do we need to clean text?
//   PDF extraction often produces:
//   - Form feeds (\x0C) at page boundaries
//   - Soft hyphens (U+00AD) from line-break hyphenation
//   - Non-breaking spaces (U+00A0) from layout engines
//   - Zero-width spaces (U+200B) and BOMs
//   - Carriage returns (\r) from Windows-produced files
//   - Runs of spaces where columns were flattened
//
// Cleaning steps (applied in order):
//   1. Normalise/remove problem characters
//   2. Collapse multiple spaces into one per line, trim lines
//   3. Collapse more than 2 consecutive newlines
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text string for downstream chunking.
    /// Takes a &str and returns an owned String.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ───────────────────────────
        // Soft hyphens are deleted outright so hyphenated line breaks
        // rejoin into whole words; everything else maps to a space or
        // newline equivalent.
        let step1: String = text
            .chars()
            .filter_map(|c| match c {
                '\u{00AD}' => None,            // soft hyphen → gone
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => Some(' '),
                '\u{0C}' => Some('\n'),        // form feed = page boundary
                '\r' => Some('\n'),
                c if c.is_control() && c != '\n' => Some(' '),
                c => Some(c),
            })
            .collect();

        // ── Step 2: Clean each line individually ─────────────────────────────
        // Line by line so intentional paragraph breaks survive
        let step2: String = step1
            .lines()
            .map(|line| {
                let mut out        = String::with_capacity(line.len());
                let mut last_space = false;

                for c in line.chars() {
                    if c == ' ' {
                        if !last_space {
                            out.push(' ');
                        }
                        last_space = true;
                    } else {
                        out.push(c);
                        last_space = false;
                    }
                }

                out.trim().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n");

        // ── Step 3: Collapse excessive blank lines ────────────────────────────
        // Allow at most 2 consecutive newlines (one blank line)
        let mut result        = String::with_capacity(step2.len());
        let mut newline_count = 0usize;

        for c in step2.chars() {
            if c == '\n' {
                newline_count += 1;
                if newline_count <= 2 {
                    result.push(c);
                }
            } else {
                newline_count = 0;
                result.push(c);
            }
        }

        result.trim().to_string()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello   world"), "hello world");
    }

    #[test]
    fn test_removes_soft_hyphen() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("exam\u{00AD}ple"), "example");
    }

    #[test]
    fn test_form_feed_becomes_newline() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("page one\u{0C}page two"), "page one\npage two");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  hello world  "), "hello world");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("hello\x01world"), "hello world");
    }

    #[test]
    fn test_collapses_blank_lines() {
        let p      = Preprocessor::new();
        let output = p.clean("line1\n\n\n\n\nline2");
        assert!(!output.contains("\n\n\n"));
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
