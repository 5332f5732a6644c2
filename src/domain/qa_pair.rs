// ============================================================
// Layer 3 — QaPair Domain Type
// ============================================================
// Represents a single question-answer pair in domain terms.
// This is the core concept of generative Q&A:
//   - We have a context passage taken from a document
//   - The model generates a question about that passage
//   - The model generates the answer text itself
//
// This is different from extractive Q&A where the answer is a
// span inside the context. Here both question and answer are
// free text produced by the model, and the same triple is later
// used as one supervised training example.
//
// One canonical schema is used everywhere: the generator writes
// it, the fine-tuner reads it, JSON round-trips preserve it.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// A (context, question, answer) triple.
///
/// No uniqueness or ordering invariant — duplicates and empty
/// answers are allowed and preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    /// The document passage the pair was generated from
    pub context: String,

    /// The natural language question
    pub question: String,

    /// The free-text answer
    pub answer: String,
}

impl QaPair {
    /// Create a new QaPair
    pub fn new(
        context:  impl Into<String>,
        question: impl Into<String>,
        answer:   impl Into<String>,
    ) -> Self {
        Self {
            context:  context.into(),
            question: question.into(),
            answer:   answer.into(),
        }
    }

    /// Parse the raw text produced by a question-generation model
    /// into QA pairs, all sharing the given context.
    ///
    /// The model family emits records of the shape
    ///   `question: <q> answer: <a> question: <q> answer: <a> ...`
    /// with no guaranteed casing. Each `question:` marker opens a
    /// record that runs until the next marker; a record without an
    /// `answer:` marker or with an empty question is dropped.
    ///
    /// Returns an empty Vec when nothing parseable is found —
    /// the caller decides whether that counts as a failure.
    pub fn parse_generated(context: &str, raw: &str) -> Vec<QaPair> {
        const Q_MARK: &str = "question:";
        const A_MARK: &str = "answer:";

        // Collect the byte offsets of every `question:` marker
        let mut starts = Vec::new();
        let mut from = 0;
        while let Some(pos) = find_ascii_ci(raw, Q_MARK, from) {
            starts.push(pos);
            from = pos + Q_MARK.len();
        }

        let mut pairs = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            // A record runs from its marker to the next marker (or EOF)
            let body_start = start + Q_MARK.len();
            let body_end   = starts.get(i + 1).copied().unwrap_or(raw.len());
            let body       = &raw[body_start..body_end];

            let Some(ans_at) = find_ascii_ci(body, A_MARK, 0) else {
                continue;
            };

            let question = body[..ans_at].trim();
            let answer   = body[ans_at + A_MARK.len()..].trim();

            if !question.is_empty() {
                pairs.push(QaPair::new(context, question, answer));
            }
        }

        pairs
    }
}

/// ASCII-case-insensitive substring search starting at `from`.
/// Returns a byte offset into `haystack`. Safe to slice at: the
/// needle is ASCII, so a match always begins on a char boundary.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() || from > h.len() - n.len() {
        return None;
    }
    (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_single_pair() {
        let pairs = QaPair::parse_generated(
            "ctx",
            "question: What is the capital of France? answer: Paris",
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].context, "ctx");
        assert_eq!(pairs[0].question, "What is the capital of France?");
        assert_eq!(pairs[0].answer, "Paris");
    }

    #[test]
    fn test_parses_multiple_pairs() {
        let raw = "question: Q1? answer: A1 question: Q2? answer: A2";
        let pairs = QaPair::parse_generated("c", raw);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "Q1?");
        assert_eq!(pairs[0].answer, "A1");
        assert_eq!(pairs[1].question, "Q2?");
        assert_eq!(pairs[1].answer, "A2");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let pairs = QaPair::parse_generated("c", "Question: Q? Answer: A");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Q?");
    }

    #[test]
    fn test_record_without_answer_is_dropped() {
        let raw = "question: Q1? question: Q2? answer: A2";
        let pairs = QaPair::parse_generated("c", raw);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Q2?");
    }

    #[test]
    fn test_empty_answer_is_kept() {
        // An empty answer string is valid data, not a parse failure
        let pairs = QaPair::parse_generated("c", "question: Q? answer:");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "");
    }

    #[test]
    fn test_unparseable_text_gives_no_pairs() {
        assert!(QaPair::parse_generated("c", "the model rambled instead").is_empty());
        assert!(QaPair::parse_generated("c", "").is_empty());
    }

    #[test]
    fn test_non_ascii_text_around_markers() {
        let raw = "question: Wie heißt die Hauptstadt? answer: Berlin — natürlich";
        let pairs = QaPair::parse_generated("c", raw);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "Berlin — natürlich");
    }
}
