// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: cross-entropy over the training nodes
//   - train_acc:  accuracy over the training nodes
//   - val_loss:   cross-entropy over the validation nodes
//   - val_acc:    accuracy over the validation nodes
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.946100,0.142857,1.943800,0.158000
//   2,1.931500,0.500000,1.935200,0.374000
//   ...
//
// How to read the metrics:
//   - train_loss should fall steadily (full-batch training)
//   - val_loss turning upward while train_loss keeps falling
//     means the model has started to overfit the few labelled nodes
//
// Each training run starts a fresh file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    pub val_loss:   f64,
    pub val_acc:    f64,
}

impl EpochMetrics {
    /// Higher validation accuracy wins; equal accuracy falls back to
    /// lower validation loss.
    pub fn improves_on(&self, best: Option<&EpochMetrics>) -> bool {
        match best {
            None => true,
            Some(b) => {
                self.val_acc > b.val_acc
                    || (self.val_acc == b.val_acc && self.val_loss < b.val_loss)
            }
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `<dir>/metrics.csv` with a header row, replacing any
    /// file left by a previous run.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.val_loss,
            m.val_acc,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
