// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Runs a trained generator on one image file:
//   1. Load train_config.json to rebuild the architecture
//   2. Find the latest snapshot and load its generator weights
//   3. Decode the image (or the input half of a paired file)
//   4. Resize to the nearest size the generator accepts
//   5. Translate and write the result
//
// Plain images come back at their original size. Paired files
// are written as input | generated | target at the working size.

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};
use image::{imageops::{self, FilterType}, RgbImage};
use std::path::{Path, PathBuf};

use crate::application::train_use_case::{BackendKind, TrainConfig};
use crate::data::{
    loader::decode_rgb,
    preprocessor::{normalize, split_pair, to_rgb_image},
};
use crate::domain::error::TrainError;
use crate::infra::{
    preview::compose,
    snapshot::{SnapshotEntry, SnapshotStore},
};
use crate::ml::inferencer::Inferencer;

pub struct TranslateUseCase {
    store:    SnapshotStore,
    config:   TrainConfig,
    snapshot: SnapshotEntry,
    backend:  BackendKind,
}

impl TranslateUseCase {
    /// Open a training output directory. `backend` overrides the one
    /// the run was trained with.
    pub fn new(output_dir: &str, backend: Option<BackendKind>) -> Result<Self> {
        if !Path::new(output_dir).is_dir() {
            return Err(TrainError::setup(output_dir, "output directory does not exist").into());
        }
        let store = SnapshotStore::new(output_dir)?;
        let config: TrainConfig = store.load_config()?;
        let snapshot = store
            .latest()?
            .ok_or_else(|| TrainError::resume(output_dir, "no snapshots found. Run 'train' first"))?;

        tracing::info!(
            "Using snapshot '{}' (epoch {})",
            snapshot.path.display(),
            snapshot.meta.epoch,
        );
        Ok(Self {
            backend: backend.unwrap_or(config.backend),
            store,
            config,
            snapshot,
        })
    }

    /// Epoch of the snapshot the generator is loaded from.
    pub fn epoch(&self) -> usize {
        self.snapshot.meta.epoch
    }

    /// Translate `image` and write the result to `out`.
    /// With `paired`, `image` is a target | input file.
    pub fn translate(&self, image: &Path, out: &Path, paired: bool) -> Result<PathBuf> {
        let rendered = match self.backend {
            BackendKind::Wgpu => self.render::<Wgpu>(&WgpuDevice::default(), image, paired)?,
            BackendKind::NdArray => self.render::<NdArray>(&NdArrayDevice::Cpu, image, paired)?,
        };

        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TrainError::write(parent, e))?;
        }
        rendered
            .save(out)
            .map_err(|e| TrainError::write(out, e))
            .with_context(|| format!("Cannot write translated image for '{}'", image.display()))?;

        tracing::info!("Wrote '{}'", out.display());
        Ok(out.to_path_buf())
    }

    fn render<B: Backend>(&self, device: &B::Device, image: &Path, paired: bool) -> Result<RgbImage> {
        let generator = self.config.generator.init::<B>(device);
        let generator = self.store.load_generator(&self.snapshot, generator, device)?;
        let multiple = generator.size_multiple() as u32;
        let inferencer = Inferencer::new(generator, device.clone());

        let decoded = decode_rgb(image)?;
        let (source, target) = if paired {
            let (target, input) = split_pair(&decoded);
            (input, Some(target))
        } else {
            (decoded, None)
        };

        let (width, height) = source.dimensions();
        let (work_w, work_h) = (aligned(width, multiple), aligned(height, multiple));
        let working = fit(&source, work_w, work_h);

        let input = normalize(&working);
        let generated = inferencer.translate(&input)?;

        match target {
            Some(target) => {
                let target = normalize(&fit(&target, work_w, work_h));
                Ok(compose(&[&input, &generated, &target])?)
            }
            None => Ok(fit(&to_rgb_image(&generated), width, height)),
        }
    }
}

/// Nearest positive multiple of `multiple`.
fn aligned(size: u32, multiple: u32) -> u32 {
    let rounded = (size + multiple / 2) / multiple * multiple;
    rounded.max(multiple)
}

fn fit(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        img.clone()
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}
