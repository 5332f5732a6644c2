// ============================================================
// Layer 2 — QueryUseCase
// ============================================================
// Loads a fine-tuned artifact once, then answers the questions
// of a text file strictly one at a time:
//
//   Step 1: Load model + tokenizer      (Layer 5/6)
//   Step 2: Read questions (one/line)   (here — plain text I/O)
//   Step 3: Beam-search decode each     (Layer 5 - ml)
//   Step 4: Write + flush each record   (here)
//
// Output format, one record per question:
//
//   Question: <q>
//   Answer: <a>
//   <blank line>
//
// A question whose generation fails gets an empty answer and a
// warning instead of aborting the run, and every record is
// flushed as soon as it is written.

use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::backend::Device;
use crate::data::dataset::ANSWER_PREFIX;
use crate::domain::error::PipelineError;
use crate::domain::traits::QuestionAnswerer;
use crate::ml::generator::{GenerationOptions, TextGenerator};

pub struct QueryUseCase {
    generator: TextGenerator,
}

impl QueryUseCase {
    /// Load the fine-tuned model from its artifact directory.
    /// Decoding parameters: beam width 4, early stopping, max
    /// output length 512 (the GenerationOptions defaults).
    pub fn new(model_dir: &str, device: Device) -> Result<Self> {
        let dir = Path::new(model_dir);
        if !dir.is_dir() {
            return Err(PipelineError::InputNotFound { path: dir.to_path_buf() }.into());
        }
        let generator = TextGenerator::from_artifact(dir, device, GenerationOptions::default())?;
        Ok(Self { generator })
    }

    /// Answer every question of `input`, writing records to `output`.
    /// Returns the number of questions processed.
    pub fn execute(&self, input: &Path, output: &Path) -> Result<usize> {
        let questions = read_questions(input)?;
        tracing::info!("Answering {} questions", questions.len());

        // Created before the loop: a 0-question run still leaves
        // a (valid, empty) answers file behind
        let mut writer = AnswerWriter::create(output)?;

        for (i, question) in questions.iter().enumerate() {
            match self.answer(question) {
                Ok(answer) => writer.write_record(question, &answer)?,
                // One failed question must not abort the batch
                Err(e) => {
                    tracing::warn!(
                        "{}",
                        PipelineError::generation(format!("question {}", i + 1), e)
                    );
                    writer.write_record(question, "")?;
                }
            }
        }

        tracing::info!("Answers saved to '{}'", output.display());
        Ok(questions.len())
    }
}

impl QuestionAnswerer for QueryUseCase {
    fn answer(&self, question: &str) -> Result<String> {
        let prompt = format!("{ANSWER_PREFIX}{}", question.trim());
        self.generator.generate(&prompt)
    }
}

/// Read one question per line, skipping blank lines.
fn read_questions(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound { path: path.to_path_buf() }.into());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read questions from '{}'", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Writes `Question:`/`Answer:` records, flushing after each one
/// so completed answers survive a mid-run crash.
struct AnswerWriter {
    file: fs::File,
    path: PathBuf,
}

impl AnswerWriter {
    fn create(path: &Path) -> Result<Self> {
        let file = fs::File::create(path)
            .with_context(|| format!("Cannot create answers file '{}'", path.display()))?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    fn write_record(&mut self, question: &str, answer: &str) -> Result<()> {
        write!(self.file, "Question: {question}\nAnswer: {answer}\n\n")
            .with_context(|| format!("Cannot write to '{}'", self.path.display()))?;
        self.file.flush()?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_one_question_per_line() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");
        fs::write(&path, "What is 2+2?\nWho wrote it?\n").unwrap();

        let qs = read_questions(&path).unwrap();
        assert_eq!(qs, vec!["What is 2+2?", "Who wrote it?"]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");
        fs::write(&path, "\nfirst?\n\n   \nsecond?\n\n").unwrap();

        let qs = read_questions(&path).unwrap();
        assert_eq!(qs.len(), 2);
    }

    #[test]
    fn test_empty_file_gives_no_questions() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");
        fs::write(&path, "").unwrap();
        assert!(read_questions(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let err = read_questions(Path::new("/no/questions.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_record_format() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");

        let mut writer = AnswerWriter::create(&path).unwrap();
        writer.write_record("What is 2+2?", "4").unwrap();
        writer.write_record("Unanswerable?", "").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Question: What is 2+2?\nAnswer: 4\n\nQuestion: Unanswerable?\nAnswer: \n\n"
        );
    }

    #[test]
    fn test_zero_questions_leaves_empty_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");
        let _ = AnswerWriter::create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
