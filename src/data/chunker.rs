// ============================================================
// Layer 4 — Text Chunker
// ============================================================
// Splits extracted text into fixed-size character windows.
//
// Why do we need chunking?
//   The generation model has a maximum input length, and a whole
//   PDF is far longer than that. Each window becomes one prompt
//   for the question-generation call.
//
// The windows are NON-overlapping and cut by character count,
// not by tokens or sentences — a chunk may end mid-word. This is
// an accepted approximation: the downstream encoder truncates to
// the model's real token budget anyway.
//
// Invariants:
//   - concatenating all chunks in order reproduces the input exactly
//   - every chunk except possibly the last has exactly max_chars chars
//   - windows never split a UTF-8 character (counted in chars, not bytes)
//
// Example with max_chars=10:
//   "A text. B text. C text." → ["A text. B ", "text. C te", "xt."]
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Chunker {
    /// Number of characters per window
    max_chars: usize,
}

impl Chunker {
    /// Create a new Chunker.
    ///
    /// # Panics
    /// Panics if max_chars is 0, which would loop forever
    /// producing empty chunks.
    pub fn new(max_chars: usize) -> Self {
        assert!(max_chars > 0, "chunk size must be at least 1 character");
        Self { max_chars }
    }

    /// Split text into consecutive windows of max_chars characters.
    /// Returns a Vec of owned Strings — one per window.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks  = Vec::new();
        let mut current = String::new();
        let mut count   = 0usize;

        for ch in text.chars() {
            current.push(ch);
            count += 1;
            if count == self.max_chars {
                chunks.push(std::mem::take(&mut current));
                count = 0;
            }
        }

        // Whatever is left over becomes the (shorter) final chunk
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Returns how many chunks a text of `char_count` characters produces
    pub fn num_chunks(&self, char_count: usize) -> usize {
        char_count.div_ceil(self.max_chars)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_boundary_scenario() {
        let chunks = Chunker::new(10).chunk("A text. B text. C text.");
        assert_eq!(chunks, vec!["A text. B ", "text. C te", "xt."]);
    }

    #[test]
    fn test_chunking_is_lossless() {
        let text   = "the quick brown fox jumps over the lazy dog";
        let chunks = Chunker::new(7).chunk(text);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_all_chunks_full_except_last() {
        let text   = "abcdefghijk"; // 11 chars, window 4 → 4,4,3
        let chunks = Chunker::new(4).chunk(text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 4);
        assert_eq!(chunks[1].chars().count(), 4);
        assert_eq!(chunks[2].chars().count(), 3);
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let chunks = Chunker::new(4).chunk("abcdefgh");
        assert_eq!(chunks, vec!["abcd", "efgh"]);
    }

    #[test]
    fn test_short_text_gives_one_chunk() {
        let chunks = Chunker::new(100).chunk("just a few words");
        assert_eq!(chunks, vec!["just a few words"]);
    }

    #[test]
    fn test_empty_text_gives_no_chunks() {
        assert!(Chunker::new(5).chunk("").is_empty());
    }

    #[test]
    fn test_multibyte_chars_are_not_split() {
        // 5 chars of 2-3 bytes each; byte-indexed slicing would panic
        let text   = "äöüßé";
        let chunks = Chunker::new(2).chunk(text);
        assert_eq!(chunks, vec!["äö", "üß", "é"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_num_chunks_matches_chunk() {
        let c    = Chunker::new(4);
        let text = "abcdefghijk";
        assert_eq!(c.num_chunks(text.chars().count()), c.chunk(text).len());
        assert_eq!(c.num_chunks(0), 0);
    }

    #[test]
    #[should_panic]
    fn test_zero_chunk_size_panics() {
        let _ = Chunker::new(0);
    }
}
