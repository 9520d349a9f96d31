// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the average losses of each epoch to a CSV file.
//
// Metrics recorded per epoch:
//   - epoch:   the epoch number (1, 2, 3, ...)
//   - steps:   batches trained in this epoch
//   - d_loss:  discriminator loss  ½·(BCE(real,1) + BCE(fake,0))
//   - g_loss:  total generator loss  g_adv + g_l1
//   - g_adv:   adversarial part of the generator loss
//   - g_l1:    weighted pixel (L1) part of the generator loss
//
// Output file: {output_dir}/metrics.csv
//
// Example CSV output:
//   epoch,steps,d_loss,g_loss,g_adv,g_l1
//   1,400,0.612300,38.120400,1.402100,36.718300
//   2,400,0.583100,31.004200,1.511900,29.492300
//
// A resumed run appends to the same file, so rows after the
// resume point may repeat epochs that were trained but never
// snapshotted.

use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::error::{Result, TrainError};

const HEADER: &str = "epoch,steps,d_loss,g_loss,g_adv,g_l1";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch:  usize,
    pub steps:  usize,
    pub d_loss: f64,
    pub g_loss: f64,
    pub g_adv:  f64,
    pub g_l1:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize) -> Self {
        Self { epoch, ..Default::default() }
    }

    /// Add the losses of one batch.
    pub fn record(&mut self, d_loss: f64, g_adv: f64, g_l1: f64) {
        self.steps  += 1;
        self.d_loss += d_loss;
        self.g_adv  += g_adv;
        self.g_l1   += g_l1;
        self.g_loss += g_adv + g_l1;
    }

    /// Per-batch averages of everything recorded so far.
    pub fn averaged(&self) -> Self {
        let n = self.steps.max(1) as f64;
        Self {
            epoch:  self.epoch,
            steps:  self.steps,
            d_loss: self.d_loss / n,
            g_loss: self.g_loss / n,
            g_adv:  self.g_adv / n,
            g_l1:   self.g_l1 / n,
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| TrainError::setup(dir, e))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            fs::write(&csv_path, format!("{HEADER}\n")).map_err(|e| TrainError::write(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Drop every row, keeping only the header.
    pub fn reset(&self) -> Result<()> {
        fs::write(&self.csv_path, format!("{HEADER}\n")).map_err(|e| TrainError::write(&self.csv_path, e))
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| TrainError::write(&self.csv_path, e))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.steps, m.d_loss, m.g_loss, m.g_adv, m.g_l1,
        )
        .map_err(|e| TrainError::write(&self.csv_path, e))?;

        tracing::debug!(
            "Logged epoch {} metrics: d_loss={:.4}, g_loss={:.4}",
            m.epoch,
            m.d_loss,
            m.g_loss,
        );
        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
