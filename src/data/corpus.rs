// ============================================================
// Layer 4 — Corpus Reader / Writer
// ============================================================
// The JSON hand-off point between the gen-qa and finetune
// pipelines. One canonical file shape on both sides:
//
//   [
//     { "context": "...", "question": "...", "answer": "..." },
//     ...
//   ]
//
// CorpusReader walks a directory of *.json files (sorted by
// filename so runs are deterministic across platforms) and
// validates each one against the QaPair schema. A file that
// fails to parse is a MalformedCorpus error for the whole run —
// silently skipping corpus data would train on less than the
// user asked for.
//
// CorpusWriter accumulates pairs and rewrites the full array
// after every append, so a crash mid-generation keeps all
// completed chunks on disk.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::error::PipelineError;
use crate::domain::qa_pair::QaPair;

// ─── CorpusReader ─────────────────────────────────────────────────────────────
/// Loads all QA pairs from the .json files of a directory.
pub struct CorpusReader {
    dir: PathBuf,
}

impl CorpusReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load every pair from every .json file, in filename order.
    ///
    /// Errors:
    ///   - InputNotFound    when the directory does not exist
    ///   - EmptyCorpus      when it contains no .json files
    ///   - MalformedCorpus  when any file fails to parse/validate
    pub fn load_all(&self) -> Result<Vec<QaPair>> {
        if !self.dir.exists() {
            return Err(PipelineError::InputNotFound { path: self.dir.clone() }.into());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::EmptyCorpus { dir: self.dir.clone() }.into());
        }

        let mut pairs = Vec::new();
        for path in files {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;

            let file_pairs: Vec<QaPair> =
                serde_json::from_str(&text).map_err(|e| PipelineError::MalformedCorpus {
                    path:   path.clone(),
                    reason: e.to_string(),
                })?;

            tracing::debug!("Loaded {} pairs from '{}'", file_pairs.len(), path.display());
            pairs.extend(file_pairs);
        }

        tracing::info!("Corpus: {} QA pairs from '{}'", pairs.len(), self.dir.display());
        Ok(pairs)
    }
}

// ─── CorpusWriter ─────────────────────────────────────────────────────────────
/// Accumulates QA pairs and persists them as one JSON array.
pub struct CorpusWriter {
    path:  PathBuf,
    pairs: Vec<QaPair>,
}

impl CorpusWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), pairs: Vec::new() }
    }

    /// Append new pairs and immediately rewrite the file,
    /// so completed work survives a mid-run crash.
    pub fn append(&mut self, new_pairs: Vec<QaPair>) -> Result<()> {
        self.pairs.extend(new_pairs);
        self.flush()
    }

    /// Serialize the accumulated array to disk (pretty-printed,
    /// matching the shape CorpusReader validates).
    pub fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.pairs)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write corpus to '{}'", self.path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn pair(n: usize) -> QaPair {
        QaPair::new(format!("ctx {n}"), format!("q {n}?"), format!("a {n}"))
    }

    #[test]
    fn test_round_trip_preserves_values_and_order() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");

        let mut writer = CorpusWriter::new(&path);
        writer.append(vec![pair(1), pair(2), pair(3)]).unwrap();

        let loaded = CorpusReader::new(dir.path()).load_all().unwrap();
        assert_eq!(loaded, vec![pair(1), pair(2), pair(3)]);
    }

    #[test]
    fn test_incremental_appends_are_flushed() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");

        let mut writer = CorpusWriter::new(&path);
        writer.append(vec![pair(1)]).unwrap();

        // The file must already hold the first batch before the second
        let partial: Vec<QaPair> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(partial.len(), 1);

        writer.append(vec![pair(2)]).unwrap();
        assert_eq!(writer.len(), 2);

        let full: Vec<QaPair> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(full, vec![pair(1), pair(2)]);
    }

    #[test]
    fn test_empty_array_file_plus_five_pairs_gives_five() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_empty.json"), "[]").unwrap();
        let five: Vec<QaPair> = (0..5).map(pair).collect();
        fs::write(
            dir.path().join("b_five.json"),
            serde_json::to_string(&five).unwrap(),
        )
        .unwrap();

        let loaded = CorpusReader::new(dir.path()).load_all().unwrap();
        assert_eq!(loaded.len(), 5);
    }

    #[test]
    fn test_missing_dir_is_input_not_found() {
        let err = CorpusReader::new("/no/such/dir").load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_dir_without_json_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a corpus").unwrap();
        let err = CorpusReader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyCorpus { .. })
        ));
    }

    #[test]
    fn test_bad_json_is_malformed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let err = CorpusReader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedCorpus { .. })
        ));
    }

    #[test]
    fn test_wrong_schema_is_malformed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        // Array of objects missing the required fields
        fs::write(dir.path().join("legacy.json"), r#"[{"generated_text": "q"}]"#).unwrap();
        let err = CorpusReader::new(dir.path()).load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedCorpus { .. })
        ));
    }
}
