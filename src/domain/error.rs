// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure in the training pipeline is fatal: nothing is
// retried and no batch is skipped. The variants only exist so the
// operator sees which stage stopped the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    /// Missing or unreadable input, raised before any training state exists.
    #[error("setup failed for {path}: {reason}")]
    Setup { path: PathBuf, reason: String },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unreadable or corrupt image file.
    #[error("cannot decode image {path}: {source}")]
    Decode {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Tensor or image shapes that cannot be combined.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    Shape {
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    /// A snapshot that cannot be fully restored. Nothing is applied.
    #[error("cannot resume from {path}: {reason}")]
    Resume { path: PathBuf, reason: String },

    /// Writing an artifact (record, preview, metrics row) failed.
    #[error("cannot write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Tensor contents could not be read back to the host.
    #[error("tensor readback failed: {0}")]
    Tensor(String),

    /// Generator trace or ONNX serialization failed.
    #[error("export to {path} failed: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrainError>;

impl TrainError {
    /// Shorthand for wrapping an error that happened at `path` during setup.
    pub fn setup(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TrainError::Setup { path: path.into(), reason: reason.to_string() }
    }

    /// Shorthand for a resume failure at `path`.
    pub fn resume(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TrainError::Resume { path: path.into(), reason: reason.to_string() }
    }

    /// Shorthand for a failed write at `path`.
    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TrainError::Write { path: path.into(), reason: reason.to_string() }
    }

    /// Shorthand for an export failure at `path`.
    pub fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TrainError::Export { path: path.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_message_lists_both_shapes() {
        let err = TrainError::Shape { expected: vec![3, 4, 4], actual: vec![3, 4, 5] };
        let msg = err.to_string();
        assert!(msg.contains("[3, 4, 4]"));
        assert!(msg.contains("[3, 4, 5]"));
    }

    #[test]
    fn test_resume_names_the_snapshot() {
        let err = TrainError::resume("out/snapshot_epoch_003.ckpt", "missing optim_generator");
        assert!(err.to_string().contains("snapshot_epoch_003.ckpt"));
    }
}
