// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration       (Layer 2)
//   Step 2: Scan the paired image directory  (Layer 4 - data)
//   Step 3: Open the output stores           (Layer 6 - infra)
//   Step 4: Save config for inference        (Layer 6 - infra)
//   Step 5: Build the parallel batch loader  (Layer 4 - data)
//   Step 6: Run the adversarial loop         (Layer 5 - ml)
//
// Steps 1 and 2 fail before any model or optimizer exists.

use anyhow::{Context, Result};
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{
    augment::DEFAULT_JITTER_MARGIN,
    batch_loader::{LoaderConfig, PairBatchLoader},
    dataset::PairedDataset,
};
use crate::domain::{
    error::TrainError,
    traits::PairSource,
};
use crate::infra::RunArtifacts;
use crate::ml::{
    discriminator::DiscriminatorConfig,
    generator::GeneratorConfig,
    loss::DEFAULT_L1_WEIGHT,
    trainer::{train, TrainingSummary},
};

/// Compute device family the run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU through WebGPU (Vulkan / Metal / DX12)
    Wgpu,
    /// CPU; deterministic for a fixed seed
    NdArray,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run, built once from the CLI
// and passed by reference. Saved as train_config.json so the
// `translate` command can rebuild the same generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub input_dir:         String,
    pub output_dir:        String,
    /// Batches between previews; 0 disables previews
    pub sample_interval:   usize,
    /// Epochs between snapshot + export
    pub snapshot_interval: usize,
    /// Epochs to train in this invocation, counted from the resume point
    pub epochs:            usize,
    pub batch_size:        usize,
    /// Ignore existing snapshots and start from epoch 1
    pub restart:           bool,
    pub seed:              u64,
    pub num_workers:       usize,
    /// Batches each loader thread may queue ahead
    pub prefetch:          usize,
    pub shuffle:           bool,
    pub drop_last:         bool,
    /// Synchronized random jitter + mirroring of both halves
    pub augment:           bool,
    pub jitter_margin:     u32,
    /// Spatial size of the exported ONNX graph
    pub export_size:       usize,
    pub lr:                f64,
    pub beta1:             f32,
    pub beta2:             f32,
    pub l1_weight:         f64,
    pub generator:         GeneratorConfig,
    pub discriminator:     DiscriminatorConfig,
    pub backend:           BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            input_dir:         "data/pairs".to_string(),
            output_dir:        "output".to_string(),
            sample_interval:   100,
            snapshot_interval: 5,
            epochs:            200,
            batch_size:        1,
            restart:           false,
            seed:              42,
            num_workers:       4,
            prefetch:          2,
            shuffle:           true,
            drop_last:         false,
            augment:           false,
            jitter_margin:     DEFAULT_JITTER_MARGIN,
            export_size:       512,
            lr:                2e-4,
            beta1:             0.5,
            beta2:             0.999,
            l1_weight:         DEFAULT_L1_WEIGHT,
            generator:         GeneratorConfig::new(),
            discriminator:     DiscriminatorConfig::new(),
            backend:           BackendKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Reject values that would make the run meaningless or crash later.
    pub fn validate(&self) -> std::result::Result<(), TrainError> {
        let fail = |msg: String| Err(TrainError::Config(msg));

        if self.batch_size == 0 {
            return fail("batch_size must be at least 1".into());
        }
        if self.epochs == 0 {
            return fail("epochs must be at least 1".into());
        }
        if self.snapshot_interval == 0 {
            return fail("snapshot_interval must be at least 1".into());
        }
        if self.generator.depth == 0 || self.discriminator.n_layers == 0 {
            return fail("generator depth and discriminator layers must be at least 1".into());
        }
        let multiple = self.generator.size_multiple();
        if self.export_size == 0 || self.export_size % multiple != 0 {
            return fail(format!(
                "export_size {} must be a positive multiple of {multiple} (2^depth)",
                self.export_size
            ));
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return fail(format!("learning rate {} must be positive", self.lr));
        }
        Ok(())
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            batch_size:  self.batch_size,
            num_workers: self.num_workers,
            shuffle:     self.shuffle,
            drop_last:   self.drop_last,
            prefetch:    self.prefetch,
            seed:        self.seed,
        }
    }

    fn jitter(&self) -> Option<u32> {
        self.augment.then_some(self.jitter_margin)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Scan the dataset ──────────────────────────────────────────
        // A missing input directory fails here, before anything is written.
        let dataset = PairedDataset::open(&cfg.input_dir, cfg.jitter())
            .with_context(|| format!("Cannot open dataset '{}'", cfg.input_dir))?;
        if dataset.is_empty() {
            return Err(TrainError::setup(&cfg.input_dir, "no .jpg/.jpeg/.png files found").into());
        }
        tracing::info!(
            "Dataset: {} pairs, augmentation {}",
            dataset.len(),
            if dataset.augments() { "on" } else { "off" },
        );

        // ── Step 3: Output stores ─────────────────────────────────────────────
        let artifacts = RunArtifacts::create(&cfg.output_dir)
            .with_context(|| format!("Cannot prepare output directory '{}'", cfg.output_dir))?;

        // ── Step 4: Save config for inference ─────────────────────────────────
        artifacts.snapshots.save_config(cfg)?;

        // ── Step 5: Batch loader ──────────────────────────────────────────────
        let loader = PairBatchLoader::new(Arc::new(dataset), cfg.loader_config())?;
        tracing::info!(
            "{} batches per epoch (batch size {}, {} loader threads)",
            loader.num_batches(),
            cfg.batch_size,
            cfg.num_workers,
        );

        // ── Step 6: Adversarial training (Layer 5) ────────────────────────────
        let summary = match cfg.backend {
            BackendKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                train::<Autodiff<Wgpu>>(cfg, &loader, &artifacts, &device)?.summary
            }
            BackendKind::NdArray => {
                let device = NdArrayDevice::Cpu;
                tracing::info!("Using NdArray CPU backend");
                train::<Autodiff<NdArray>>(cfg, &loader, &artifacts, &device)?.summary
            }
        };

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::write_paired_dataset;
    use crate::infra::snapshot::SnapshotStore;
    use crate::ml::determinism::lock_backend;

    fn cpu_config(input: &std::path::Path, output: &std::path::Path) -> TrainConfig {
        TrainConfig {
            input_dir:     input.display().to_string(),
            output_dir:    output.join("run").display().to_string(),
            epochs:        1,
            snapshot_interval: 1,
            sample_interval:   0,
            batch_size:    2,
            num_workers:   1,
            export_size:   4,
            generator:     GeneratorConfig::new().with_base_filters(2).with_depth(2),
            discriminator: DiscriminatorConfig::new().with_base_filters(2).with_n_layers(1),
            backend:       BackendKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { epochs: 0, ..TrainConfig::default() },
            TrainConfig { snapshot_interval: 0, ..TrainConfig::default() },
            TrainConfig { export_size: 300, ..TrainConfig::default() },
            TrainConfig { lr: 0.0, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(TrainError::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg = TrainConfig { seed: 9, backend: BackendKind::NdArray, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"ndarray\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, 9);
        assert_eq!(back.generator.depth, cfg.generator.depth);
    }

    #[test]
    fn test_missing_input_dir_fails_before_output_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cpu_config(&tmp.path().join("absent"), tmp.path());

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();
        assert!(matches!(err.downcast_ref::<TrainError>(), Some(TrainError::Setup { .. })));
        assert!(!std::path::Path::new(&cfg.output_dir).exists());
    }

    #[test]
    fn test_execute_trains_and_saves_config() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 2, 4, 4);

        let cfg = cpu_config(data.path(), out.path());
        let summary = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(summary.snapshots.len(), 1);

        let store = SnapshotStore::new(&cfg.output_dir).unwrap();
        let saved: TrainConfig = store.load_config().unwrap();
        assert_eq!(saved.export_size, 4);
        assert_eq!(saved.backend, BackendKind::NdArray);
    }
}
