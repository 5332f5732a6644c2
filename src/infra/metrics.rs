// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file every logging interval.
//
// Metrics recorded per row:
//   - step:  global optimizer step (1, 2, 3, ...)
//   - epoch: which epoch the step fell in
//   - loss:  cross-entropy loss of that step's batch
//   - lr:    learning rate actually applied (shows the warmup ramp)
//
// Output file: <output_dir>/metrics.csv
//
// Example CSV output:
//   step,epoch,loss,lr
//   100,1,6.214500,0.000010
//   200,1,5.890100,0.000020
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single logged step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainStepMetrics {
    /// Global optimizer step (starts at 1)
    pub step: usize,

    /// Epoch the step belongs to (starts at 1)
    pub epoch: usize,

    /// Cross-entropy loss of this step's batch.
    /// Random initialisation gives ~ln(vocab_size)
    pub loss: f64,

    /// Learning rate applied at this step — ramps linearly
    /// over the warmup window, flat afterwards
    pub lr: f64,
}

impl TrainStepMetrics {
    pub fn new(step: usize, epoch: usize, loss: f64, lr: f64) -> Self {
        Self { step, epoch, loss, lr }
    }
}

/// Logs step metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "step,epoch,loss,lr")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one logged step as a new CSV row.
    pub fn log(&self, m: &TrainStepMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{},{:.6},{:.6}", m.step, m.epoch, m.loss, m.lr)?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&TrainStepMetrics::new(100, 1, 6.5, 1e-5)).unwrap();
        logger.log(&TrainStepMetrics::new(200, 1, 5.9, 2e-5)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "step,epoch,loss,lr");
        assert!(lines[1].starts_with("100,1,"));
    }

    #[test]
    fn test_reopening_appends_without_second_header() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let logger = MetricsLogger::new(tmp.path()).unwrap();
            logger.log(&TrainStepMetrics::new(1, 1, 3.0, 1e-5)).unwrap();
        }
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&TrainStepMetrics::new(2, 1, 2.5, 2e-5)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(content.matches("step,epoch,loss,lr").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }
}
