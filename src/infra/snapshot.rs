// ============================================================
// Layer 6 — Snapshot Store
// ============================================================
// Saves and restores the full training state with Burn's
// NamedMpkGzFileRecorder at full precision.
//
// One snapshot is one directory:
//
//   snapshot_epoch_005.ckpt/
//     generator.mpk.gz              ← generator parameters + BN running stats
//     discriminator.mpk.gz          ← discriminator parameters
//     optim_generator.mpk.gz        ← Adam moments for the generator
//     optim_discriminator.mpk.gz    ← Adam moments for the discriminator
//     meta.json                     ← { format_version, epoch, step }
//
// The bundle is written under `.snapshot_epoch_005.ckpt.tmp/` and
// renamed into place, so a reader never sees half a snapshot.
// "Latest" is the highest epoch recorded in meta.json.
//
// Restoring is all-or-nothing: every record is read before any of
// them is applied to the live modules.

use burn::{
    module::Module,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{
    error::{Result, TrainError},
    position::TrainingPosition,
};
use crate::infra::remove_matching;
use crate::ml::{discriminator::Discriminator, generator::Generator, trainer::Adversaries};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

const GENERATOR_FILE:     &str = "generator";
const DISCRIMINATOR_FILE: &str = "discriminator";
const OPTIM_G_FILE:       &str = "optim_generator";
const OPTIM_D_FILE:       &str = "optim_discriminator";
const META_FILE:          &str = "meta.json";
const RECORD_EXTENSION:   &str = "mpk.gz";
const CONFIG_FILE:        &str = "train_config.json";

type SnapshotRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Metadata stored inside every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    /// Epoch at whose end the snapshot was taken
    pub epoch:          usize,
    /// Global optimisation steps completed at that point
    pub step:           usize,
}

impl SnapshotMeta {
    pub fn resume_position(&self) -> TrainingPosition {
        TrainingPosition::after_snapshot(self.epoch, self.step)
    }
}

/// A snapshot found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub meta: SnapshotMeta,
}

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create the store, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TrainError::setup(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn snapshot_name(epoch: usize) -> String {
        format!("snapshot_epoch_{epoch:03}.ckpt")
    }

    /// Write the four records and meta.json for the end of `epoch`.
    pub fn save<B, OG, OD>(
        &self,
        state: &Adversaries<B, OG, OD>,
        epoch: usize,
        step:  usize,
    ) -> Result<SnapshotEntry>
    where
        B:  AutodiffBackend,
        OG: Optimizer<Generator<B>, B>,
        OD: Optimizer<Discriminator<B>, B>,
    {
        let name  = Self::snapshot_name(epoch);
        let final_path = self.dir.join(&name);
        let tmp_path   = self.dir.join(format!(".{name}.tmp"));

        if tmp_path.exists() {
            fs::remove_dir_all(&tmp_path).map_err(|e| TrainError::write(&tmp_path, e))?;
        }
        fs::create_dir_all(&tmp_path).map_err(|e| TrainError::write(&tmp_path, e))?;

        let recorder = SnapshotRecorder::new();
        record::<B, _>(&recorder, state.generator.clone().into_record(), &tmp_path, GENERATOR_FILE)?;
        record::<B, _>(&recorder, state.discriminator.clone().into_record(), &tmp_path, DISCRIMINATOR_FILE)?;
        record::<B, _>(&recorder, state.optim_g.to_record(), &tmp_path, OPTIM_G_FILE)?;
        record::<B, _>(&recorder, state.optim_d.to_record(), &tmp_path, OPTIM_D_FILE)?;

        let meta = SnapshotMeta { format_version: SNAPSHOT_FORMAT_VERSION, epoch, step };
        let meta_path = tmp_path.join(META_FILE);
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
            .map_err(|e| TrainError::write(&meta_path, e))?;

        if final_path.exists() {
            fs::remove_dir_all(&final_path).map_err(|e| TrainError::write(&final_path, e))?;
        }
        fs::rename(&tmp_path, &final_path).map_err(|e| TrainError::write(&final_path, e))?;

        tracing::debug!("Saved snapshot '{}'", final_path.display());
        Ok(SnapshotEntry { path: final_path, meta })
    }

    /// All complete snapshots, ordered by epoch.
    pub fn list(&self) -> Result<Vec<SnapshotEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_snapshot = path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("snapshot_epoch_") && n.ends_with(".ckpt"));
            if is_snapshot {
                let meta = read_meta(&path)?;
                entries.push(SnapshotEntry { path, meta });
            }
        }
        entries.sort_by_key(|e| e.meta.epoch);
        Ok(entries)
    }

    /// Delete every snapshot directory, complete or half-written.
    pub fn discard_all(&self) -> Result<usize> {
        remove_matching(&self.dir, |name| {
            let name = name.strip_prefix('.').unwrap_or(name);
            name.starts_with("snapshot_epoch_") && (name.ends_with(".ckpt") || name.ends_with(".ckpt.tmp"))
        })
    }

    /// Snapshot with the highest recorded epoch, if any.
    pub fn latest(&self) -> Result<Option<SnapshotEntry>> {
        Ok(self.list()?.pop())
    }

    /// Restore generator, discriminator and both optimizers from `entry`.
    ///
    /// Fails with `TrainError::Resume` if any component is missing or
    /// unreadable; `state` is then dropped untouched by the snapshot.
    pub fn load<B, OG, OD>(
        &self,
        entry:  &SnapshotEntry,
        state:  Adversaries<B, OG, OD>,
        device: &B::Device,
    ) -> Result<Adversaries<B, OG, OD>>
    where
        B:  AutodiffBackend,
        OG: Optimizer<Generator<B>, B>,
        OD: Optimizer<Discriminator<B>, B>,
    {
        if entry.meta.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(TrainError::resume(
                &entry.path,
                format!("unsupported format version {}", entry.meta.format_version),
            ));
        }
        for file in [GENERATOR_FILE, DISCRIMINATOR_FILE, OPTIM_G_FILE, OPTIM_D_FILE] {
            let path = record_path(&entry.path, file);
            if !path.is_file() {
                return Err(TrainError::resume(&entry.path, format!("missing component '{file}'")));
            }
        }

        let recorder = SnapshotRecorder::new();
        let g_record = load::<B, _>(&recorder, &entry.path, GENERATOR_FILE, device)?;
        let d_record = load::<B, _>(&recorder, &entry.path, DISCRIMINATOR_FILE, device)?;
        let og_record = load::<B, _>(&recorder, &entry.path, OPTIM_G_FILE, device)?;
        let od_record = load::<B, _>(&recorder, &entry.path, OPTIM_D_FILE, device)?;

        tracing::info!(
            "Restored snapshot '{}' (epoch {}, step {})",
            entry.path.display(),
            entry.meta.epoch,
            entry.meta.step,
        );
        Ok(Adversaries {
            generator:     state.generator.load_record(g_record),
            discriminator: state.discriminator.load_record(d_record),
            optim_g:       state.optim_g.load_record(og_record),
            optim_d:       state.optim_d.load_record(od_record),
        })
    }

    /// Load only the generator weights, for inference on any backend.
    pub fn load_generator<B: Backend>(
        &self,
        entry:     &SnapshotEntry,
        generator: Generator<B>,
        device:    &B::Device,
    ) -> Result<Generator<B>> {
        let record = load::<B, _>(&SnapshotRecorder::new(), &entry.path, GENERATOR_FILE, device)?;
        Ok(generator.load_record(record))
    }

    /// Save the run configuration next to the snapshots so inference can
    /// rebuild the same architecture.
    pub fn save_config<C: Serialize>(&self, cfg: &C) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .map_err(|e| TrainError::write(&path, e))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config<C: DeserializeOwned>(&self) -> Result<C> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| {
            TrainError::setup(&path, format!("{e}. Has 'train' been run in this directory?"))
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn record_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(file).with_extension(RECORD_EXTENSION)
}

fn record<B: Backend, R: burn::record::Record<B>>(
    recorder: &SnapshotRecorder,
    item:     R,
    dir:      &Path,
    file:     &str,
) -> Result<()> {
    Recorder::<B>::record(recorder, item, dir.join(file))
        .map(|_| ())
        .map_err(|e| TrainError::write(record_path(dir, file), e))
}

fn load<B: Backend, R: burn::record::Record<B>>(
    recorder: &SnapshotRecorder,
    dir:      &Path,
    file:     &str,
    device:   &B::Device,
) -> Result<R> {
    Recorder::<B>::load(recorder, dir.join(file), device)
        .map_err(|e| TrainError::resume(dir, format!("cannot read '{file}': {e}")))
}

fn read_meta(dir: &Path) -> Result<SnapshotMeta> {
    let path = dir.join(META_FILE);
    let json = fs::read_to_string(&path)
        .map_err(|e| TrainError::resume(dir, format!("unreadable {META_FILE}: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| TrainError::resume(dir, format!("invalid {META_FILE}: {e}")))
}
