// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything the training loop writes to disk:
//
//   snapshot.rs — Full training state (both modules, both
//                 optimizers, meta.json) per checkpoint epoch,
//                 plus train_config.json for inference.
//
//   export.rs   — The generator as a static ONNX graph, on
//                 the same cadence as snapshots.
//
//   preview.rs  — input | generated | target JPEGs every
//                 sample_interval batches.
//
//   metrics.rs  — Per-epoch average losses in a CSV file.
//
// All four share one output directory. A restarted run clears
// what the previous run left there before it trains.

use std::{fs, path::Path};

use crate::domain::error::{Result, TrainError};

/// Snapshot bundles and run configuration
pub mod snapshot;

/// ONNX export of the generator
pub mod export;

/// Side-by-side preview images
pub mod preview;

/// Training metrics CSV logger
pub mod metrics;

/// The artifact stores of one training run.
pub struct RunArtifacts {
    pub snapshots: snapshot::SnapshotStore,
    pub exports:   export::ExportStore,
    pub previews:  preview::PreviewWriter,
    pub metrics:   metrics::MetricsLogger,
}

impl RunArtifacts {
    /// Open (creating if absent) every store under `dir`.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            snapshots: snapshot::SnapshotStore::new(dir)?,
            exports:   export::ExportStore::new(dir)?,
            previews:  preview::PreviewWriter::new(dir)?,
            metrics:   metrics::MetricsLogger::new(dir)?,
        })
    }

    /// Remove every snapshot, export and preview and empty the metrics
    /// file, so nothing from an abandoned run can be resumed or mixed in.
    pub fn discard_previous_run(&self) -> Result<usize> {
        let removed = self.snapshots.discard_all()?
            + self.exports.discard_all()?
            + self.previews.discard_all()?;
        self.metrics.reset()?;
        Ok(removed)
    }
}

/// Delete the entries of `dir` whose file name satisfies `matches`.
/// Directories are removed recursively.
pub(crate) fn remove_matching(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !matches(name) {
            continue;
        }
        if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        }
        .map_err(|e| TrainError::write(&path, e))?;
        tracing::debug!("Removed '{}'", path.display());
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_previous_run_keeps_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = RunArtifacts::create(dir.path()).unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("snapshot_epoch_003.ckpt")).unwrap();
        fs::create_dir_all(root.join(".snapshot_epoch_004.ckpt.tmp")).unwrap();
        fs::write(root.join("generator_epoch_003.onnx"), b"onnx").unwrap();
        fs::write(root.join("epoch_003_iter_0000.jpg"), b"jpg").unwrap();
        fs::write(root.join("train_config.json"), b"{}").unwrap();
        fs::write(root.join("notes.txt"), b"keep").unwrap();
        fs::write(artifacts.metrics.csv_path(), "epoch,steps,d_loss,g_loss,g_adv,g_l1\n3,1,0,0,0,0\n").unwrap();

        assert_eq!(artifacts.discard_previous_run().unwrap(), 4);

        let mut left: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["metrics.csv", "notes.txt", "train_config.json"]);
        assert_eq!(fs::read_to_string(artifacts.metrics.csv_path()).unwrap().lines().count(), 1);
    }
}
