// ============================================================
// Layer 5 — Adversarial Training Loop
// ============================================================
// INITIALIZING → RESUMING | FRESH_START → RUNNING(epoch, step)
//   → CHECKPOINTING → RUNNING → ... → DONE
//
// Per batch, strictly in this order:
//   1. fake = G(input)
//   2. D step on (input, target) vs (input, fake.detach())
//   3. G step scored by the *updated* D, plus λ·L1(fake, target)
//   4. every sample_interval batches: preview from eval-mode G
//
// Checkpoint at the end of epoch e when e % snapshot_interval == 0
// (1-based epochs): snapshot first, then ONNX export of a
// `valid()` copy of G. The training module is never switched.
//
// `restart` deletes the previous run's snapshots, exports, previews
// and metrics rows before anything is trained, so a later resume can
// only ever pick up the restarted run.
//
// The backend generator is re-seeded at the start of every epoch,
// so resuming from a snapshot replays exactly the random stream an
// uninterrupted run would have used.

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batch_loader::PairBatchLoader,
    batcher::{PairBatch, PairBatcher},
};
use crate::domain::{
    error::{Result, TrainError},
    image::ImagePair,
    position::TrainingPosition,
};
use crate::infra::{metrics::EpochMetrics, snapshot::SnapshotEntry, RunArtifacts};
use crate::ml::{
    contract::{ImageTranslator, PairCritic},
    determinism::{seed_epoch, seed_everything},
    discriminator::Discriminator,
    generator::Generator,
    inferencer::Inferencer,
    loss::{discriminator_loss, generator_loss},
};

/// Both networks and their optimizers: everything a snapshot holds.
pub struct Adversaries<B: AutodiffBackend, OG, OD> {
    pub generator:     Generator<B>,
    pub discriminator: Discriminator<B>,
    pub optim_g:       OG,
    pub optim_d:       OD,
}

/// Scalar losses of one training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLosses {
    pub d_loss: f64,
    pub g_adv:  f64,
    pub g_l1:   f64,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub start_epoch:  usize,
    /// Last epoch trained; `start_epoch - 1` if no epoch ran
    pub last_epoch:   usize,
    /// Global steps completed, including those before a resume
    pub steps:        usize,
    /// Epoch of the snapshot this run resumed from
    pub resumed_from: Option<usize>,
    pub snapshots:    Vec<PathBuf>,
    pub exports:      Vec<PathBuf>,
    pub previews:     Vec<PathBuf>,
}

impl TrainingSummary {
    fn starting_at(position: TrainingPosition, resumed_from: Option<usize>) -> Self {
        Self {
            start_epoch: position.epoch,
            last_epoch: position.epoch - 1,
            steps: position.step,
            resumed_from,
            snapshots: Vec::new(),
            exports: Vec::new(),
            previews: Vec::new(),
        }
    }
}

/// The trained networks, still in training mode, and the run summary.
pub struct TrainedModels<B: AutodiffBackend> {
    pub generator:     Generator<B>,
    pub discriminator: Discriminator<B>,
    pub summary:       TrainingSummary,
}

fn adam(cfg: &TrainConfig) -> AdamConfig {
    AdamConfig::new().with_beta_1(cfg.beta1).with_beta_2(cfg.beta2)
}

pub fn train<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    loader:    &PairBatchLoader,
    artifacts: &RunArtifacts,
    device:    &B::Device,
) -> Result<TrainedModels<B>> {
    if loader.source().is_empty() {
        return Err(TrainError::Config("the dataset has no samples".into()));
    }

    // ── INITIALIZING ──────────────────────────────────────────────────────────
    seed_everything::<B>(cfg.seed);
    let state = Adversaries {
        generator:     cfg.generator.init::<B>(device),
        discriminator: cfg.discriminator.init::<B>(device),
        optim_g:       adam(cfg).init::<B, Generator<B>>(),
        optim_d:       adam(cfg).init::<B, Discriminator<B>>(),
    };
    tracing::info!(
        "Generator: {} parameters (depth {}), discriminator: {} parameters",
        state.generator.num_params(),
        state.generator.depth(),
        state.discriminator.num_params(),
    );

    // fixed before anything is loaded or discarded, never augmented
    let preview = loader.source().load(0, None)?;
    let size_multiple = state.generator.size_multiple();
    check_sample_size(&preview, size_multiple)?;

    // ── RESUMING | FRESH_START ────────────────────────────────────────────────
    let (mut state, position, resumed_from) = match resume_point(cfg, artifacts)? {
        Some(entry) => {
            let state = artifacts.snapshots.load(&entry, state, device)?;
            tracing::info!("Resuming at epoch {}", entry.meta.epoch + 1);
            (state, entry.meta.resume_position(), Some(entry.meta.epoch))
        }
        None => {
            tracing::info!("Fresh start at epoch 1");
            (state, TrainingPosition::fresh(), None)
        }
    };

    let batcher = PairBatcher::<B>::new(device.clone());
    let mut summary = TrainingSummary::starting_at(position, resumed_from);
    let mut step = position.step;
    let end_epoch = position.epoch + cfg.epochs;

    // ── RUNNING ───────────────────────────────────────────────────────────────
    for epoch in position.epoch..end_epoch {
        seed_epoch::<B>(cfg.seed, epoch);

        let batches = loader.epoch(epoch)?;
        let bar = progress_bar(epoch, end_epoch - 1, batches.total());
        let mut metrics = EpochMetrics::new(epoch);

        for (index, items) in batches.enumerate() {
            let items = items?;
            if let Some(first) = items.first() {
                check_sample_size(first, size_multiple)?;
            }
            let batch = batcher.try_batch(items)?;
            let (next, losses) = train_step(state, batch, cfg.lr, cfg.l1_weight)?;
            state = next;
            step += 1;

            metrics.record(losses.d_loss, losses.g_adv, losses.g_l1);
            bar.set_message(format!(
                "d={:.4} g={:.4}",
                losses.d_loss,
                losses.g_adv + losses.g_l1,
            ));
            bar.inc(1);

            if cfg.sample_interval > 0 && index % cfg.sample_interval == 0 {
                let path = write_preview(&state.generator, &preview, epoch, index, artifacts, device)?;
                summary.previews.push(path);
            }
        }
        bar.finish_and_clear();

        let avg = metrics.averaged();
        artifacts.metrics.log(&avg)?;
        tracing::info!(
            "Epoch {:>3}/{} | d_loss={:.4} | g_loss={:.4} (adv={:.4}, l1={:.4})",
            epoch,
            end_epoch - 1,
            avg.d_loss,
            avg.g_loss,
            avg.g_adv,
            avg.g_l1,
        );

        // ── CHECKPOINTING ─────────────────────────────────────────────────────
        if TrainingPosition::is_checkpoint_epoch(epoch, cfg.snapshot_interval) {
            let entry = artifacts.snapshots.save(&state, epoch, step)?;
            summary.snapshots.push(entry.path);

            let export = artifacts
                .exports
                .export(&state.generator.valid(), epoch, cfg.export_size, device)?;
            tracing::info!("Checkpoint for epoch {epoch} saved, generator exported to '{}'", export.display());
            summary.exports.push(export);
        }

        summary.last_epoch = epoch;
        summary.steps = step;
    }

    // ── DONE ──────────────────────────────────────────────────────────────────
    tracing::info!("Training complete: epochs {}..={}, {} steps", summary.start_epoch, summary.last_epoch, step);
    Ok(TrainedModels {
        generator:     state.generator,
        discriminator: state.discriminator,
        summary,
    })
}

fn resume_point(cfg: &TrainConfig, artifacts: &RunArtifacts) -> Result<Option<SnapshotEntry>> {
    if cfg.restart {
        let removed = artifacts.discard_previous_run()?;
        tracing::info!("Restart requested, removed {removed} artifacts of the previous run");
        return Ok(None);
    }
    artifacts.snapshots.latest()
}

/// Both sides of a sample must be positive multiples of `multiple`,
/// or the U-Net skip connections cannot be concatenated.
fn check_sample_size(pair: &ImagePair, multiple: usize) -> Result<()> {
    let [c, h, w] = pair.input.shape();
    if h == 0 || w == 0 || h % multiple != 0 || w % multiple != 0 {
        return Err(TrainError::Shape {
            expected: vec![c, h.div_ceil(multiple).max(1) * multiple, w.div_ceil(multiple).max(1) * multiple],
            actual:   vec![c, h, w],
        });
    }
    Ok(())
}

/// One discriminator update followed by one generator update.
pub fn train_step<B, OG, OD>(
    state:     Adversaries<B, OG, OD>,
    batch:     PairBatch<B>,
    lr:        f64,
    l1_weight: f64,
) -> Result<(Adversaries<B, OG, OD>, StepLosses)>
where
    B:  AutodiffBackend,
    OG: Optimizer<Generator<B>, B>,
    OD: Optimizer<Discriminator<B>, B>,
{
    let Adversaries { generator, discriminator, mut optim_g, mut optim_d } = state;
    let PairBatch { inputs, targets } = batch;

    let fake = generator.translate(inputs.clone());

    // discriminator: real → 1, generated → 0; G receives no gradient here
    let real_score = discriminator.score(inputs.clone(), targets.clone());
    let fake_score = discriminator.score(inputs.clone(), fake.clone().detach());
    let d_loss = discriminator_loss(real_score, fake_score);
    let d_value = scalar(&d_loss)?;

    let grads = GradientsParams::from_grads(d_loss.backward(), &discriminator);
    let discriminator = optim_d.step(lr, discriminator, grads);

    // generator: fool the updated discriminator and stay close to the target
    let fake_score = discriminator.score(inputs, fake.clone());
    let g_loss = generator_loss(fake_score, fake, targets, l1_weight);
    let g_adv = scalar(&g_loss.adversarial)?;
    let g_l1 = scalar(&g_loss.pixel)?;

    let grads = GradientsParams::from_grads(g_loss.total.backward(), &generator);
    let generator = optim_g.step(lr, generator, grads);

    let losses = StepLosses { d_loss: d_value, g_adv, g_l1 };
    if !(d_value.is_finite() && g_adv.is_finite() && g_l1.is_finite()) {
        return Err(TrainError::Tensor(format!("non-finite loss {losses:?}")));
    }

    Ok((Adversaries { generator, discriminator, optim_g, optim_d }, losses))
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> Result<f64> {
    let values = loss
        .clone()
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| TrainError::Tensor(format!("{e:?}")))?;
    values.first().copied().ok_or_else(|| TrainError::Tensor("empty loss tensor".into()))
}

fn write_preview<B: AutodiffBackend>(
    generator: &Generator<B>,
    pair:      &ImagePair,
    epoch:     usize,
    step:      usize,
    artifacts: &RunArtifacts,
    device:    &B::Device,
) -> Result<PathBuf> {
    let generated = Inferencer::new(generator.valid(), device.clone()).translate(&pair.input)?;
    artifacts.previews.write(epoch, step, &[&pair.input, &generated, &pair.target])
}

fn progress_bar(epoch: usize, last_epoch: usize, batches: usize) -> ProgressBar {
    let bar = ProgressBar::new(batches as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar.set_prefix(format!("Epoch {epoch}/{last_epoch}"));
    bar
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::BackendKind;
    use crate::data::{
        batch_loader::LoaderConfig, batcher::image_to_tensor, dataset::PairedDataset,
        fixtures::write_paired_dataset,
    };
    use crate::infra::{export::ExportStore, preview::PreviewWriter, snapshot::SnapshotStore};
    use crate::ml::{
        determinism::lock_backend, discriminator::DiscriminatorConfig, generator::GeneratorConfig,
        loss::bce_with_logits,
    };
    use burn::backend::{Autodiff, NdArray};
    use std::{path::Path, sync::Arc};

    type B = Autodiff<NdArray>;

    fn tiny_config(input: &Path, output: &Path) -> TrainConfig {
        TrainConfig {
            input_dir:         input.display().to_string(),
            output_dir:        output.display().to_string(),
            sample_interval:   1,
            snapshot_interval: 1,
            epochs:            2,
            batch_size:        2,
            num_workers:       0,
            export_size:       4,
            generator:         GeneratorConfig::new().with_base_filters(2).with_depth(2),
            discriminator:     DiscriminatorConfig::new().with_base_filters(2).with_n_layers(1),
            backend:           BackendKind::NdArray,
            ..TrainConfig::default()
        }
    }

    fn run(cfg: &TrainConfig) -> Result<TrainedModels<B>> {
        let source = Arc::new(PairedDataset::open(&cfg.input_dir, None)?);
        let loader = PairBatchLoader::new(source, cfg.loader_config())?;
        let artifacts = RunArtifacts::create(&cfg.output_dir)?;
        train::<B>(cfg, &loader, &artifacts, &Default::default())
    }

    /// Eval-mode generator output on a fixed reference image, as a fingerprint of the
    /// parameters and batch-norm statistics.
    fn fingerprint(models: &TrainedModels<B>) -> Vec<f32> {
        let reference = crate::domain::image::NormalizedImage::new(
            4,
            4,
            (0..48).map(|i| (i as f32 / 24.0) - 1.0).collect(),
        );
        let device = Default::default();
        let g = models.generator.valid();
        let d = models.discriminator.valid();
        let x = image_to_tensor::<NdArray>(&reference, &device);
        let mut out = g.forward(x.clone()).into_data().to_vec::<f32>().unwrap();
        out.extend(d.score(x.clone(), x).into_data().to_vec::<f32>().unwrap());
        out
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() <= 1e-5, "{x} vs {y}");
        }
    }

    #[test]
    fn test_end_to_end_four_pairs_two_epochs() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 4, 4, 4);

        let cfg = tiny_config(data.path(), out.path());
        let models = run(&cfg).unwrap();
        let summary = &models.summary;

        assert_eq!((summary.start_epoch, summary.last_epoch, summary.steps), (1, 2, 4));
        assert_eq!(summary.snapshots.len(), 2);
        assert_eq!(summary.exports.len(), 2);
        assert_eq!(summary.previews.len(), 4);
        assert!(out.path().join("snapshot_epoch_001.ckpt").is_dir());
        assert!(out.path().join("snapshot_epoch_002.ckpt").is_dir());
        assert!(out.path().join("generator_epoch_002.onnx").is_file());
        assert!(out.path().join("epoch_002_iter_0001.jpg").is_file());
        assert!(out.path().join("metrics.csv").is_file());

        let batch = Tensor::<B, 4>::zeros([2, 3, 4, 4], &Default::default());
        assert_eq!(models.generator.forward(batch).dims(), [2, 3, 4, 4]);
    }

    #[test]
    fn test_twelve_epochs_interval_five_checkpoints_at_five_and_ten() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 2, 4, 4);

        let cfg = TrainConfig {
            epochs: 12,
            snapshot_interval: 5,
            sample_interval: 0,
            ..tiny_config(data.path(), out.path())
        };
        let summary = run(&cfg).unwrap().summary;

        let names = |paths: &[PathBuf]| -> Vec<String> {
            paths.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect()
        };
        assert_eq!(
            names(&summary.snapshots),
            vec![SnapshotStore::snapshot_name(5), SnapshotStore::snapshot_name(10)]
        );
        assert_eq!(
            names(&summary.exports),
            vec![ExportStore::artifact_name(5), ExportStore::artifact_name(10)]
        );
        assert!(summary.previews.is_empty());
    }

    #[test]
    fn test_same_seed_gives_same_parameters() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 4, 4, 4);

        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let cfg_a = TrainConfig { num_workers: 2, ..tiny_config(data.path(), a.path()) };
        let cfg_b = TrainConfig { num_workers: 2, ..tiny_config(data.path(), b.path()) };

        assert_close(&fingerprint(&run(&cfg_a).unwrap()), &fingerprint(&run(&cfg_b).unwrap()));
    }

    #[test]
    fn test_resumed_run_matches_uninterrupted_run() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 4, 4, 4);

        let straight = tempfile::tempdir().unwrap();
        let uninterrupted = run(&tiny_config(data.path(), straight.path())).unwrap();

        let split = tempfile::tempdir().unwrap();
        let first = TrainConfig { epochs: 1, ..tiny_config(data.path(), split.path()) };
        run(&first).unwrap();
        let resumed = run(&first).unwrap();

        assert_eq!(resumed.summary.resumed_from, Some(1));
        assert_eq!(resumed.summary.start_epoch, 2);
        assert_eq!(resumed.summary.steps, uninterrupted.summary.steps);
        assert_close(&fingerprint(&uninterrupted), &fingerprint(&resumed));
    }

    #[test]
    fn test_restart_ignores_existing_snapshots() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 2, 4, 4);

        let cfg = TrainConfig { epochs: 1, ..tiny_config(data.path(), out.path()) };
        run(&cfg).unwrap();

        let again = run(&TrainConfig { restart: true, ..cfg }).unwrap();
        assert_eq!(again.summary.start_epoch, 1);
        assert_eq!(again.summary.resumed_from, None);
    }

    #[test]
    fn test_restart_discards_the_abandoned_run() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 2, 4, 4);

        let cfg = TrainConfig { epochs: 3, ..tiny_config(data.path(), out.path()) };
        run(&cfg).unwrap();
        assert!(out.path().join(SnapshotStore::snapshot_name(3)).is_dir());

        let restarted = run(&TrainConfig { epochs: 1, restart: true, ..cfg.clone() }).unwrap();
        assert_eq!((restarted.summary.start_epoch, restarted.summary.last_epoch), (1, 1));
        for epoch in [2, 3] {
            assert!(!out.path().join(SnapshotStore::snapshot_name(epoch)).exists());
            assert!(!out.path().join(ExportStore::artifact_name(epoch)).exists());
            assert!(!out.path().join(PreviewWriter::preview_name(epoch, 0)).exists());
        }

        // the next plain run continues the restarted run, not the old epoch 3
        let resumed = run(&TrainConfig { epochs: 1, ..cfg }).unwrap();
        assert_eq!(resumed.summary.resumed_from, Some(1));
        assert_eq!(resumed.summary.start_epoch, 2);

        let csv = std::fs::read_to_string(out.path().join("metrics.csv")).unwrap();
        let epochs: Vec<&str> = csv.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(epochs, vec!["1", "2"]);
    }

    #[test]
    fn test_unaligned_sample_size_is_a_shape_error() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        // 6x6 halves cannot pass a depth-2 U-Net (multiple of 4)
        write_paired_dataset(data.path(), 2, 6, 6);

        let err = run(&tiny_config(data.path(), out.path())).err().unwrap();
        match err {
            TrainError::Shape { expected, actual } => {
                assert_eq!(actual, vec![3, 6, 6]);
                assert_eq!(expected, vec![3, 8, 8]);
            }
            other => panic!("expected a shape error, got {other}"),
        }
        assert!(SnapshotStore::new(out.path()).unwrap().latest().unwrap().is_none());
    }

    #[test]
    fn test_export_failure_leaves_snapshot_intact() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 2, 4, 4);
        // a directory where the temporary export file should go
        std::fs::create_dir_all(out.path().join("generator_epoch_001.onnx.tmp")).unwrap();

        let cfg = TrainConfig { epochs: 1, ..tiny_config(data.path(), out.path()) };
        let err = run(&cfg).err().unwrap();
        assert!(matches!(err, TrainError::Export { .. }), "{err}");

        let latest = SnapshotStore::new(out.path()).unwrap().latest().unwrap().unwrap();
        assert_eq!(latest.meta.epoch, 1);
        assert!(latest.path.join("optim_generator.mpk.gz").is_file());
    }

    #[test]
    fn test_corrupt_sample_aborts_the_run() {
        let _guard = lock_backend();
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_paired_dataset(data.path(), 3, 4, 4);
        std::fs::write(data.path().join("zz_broken.png"), b"not an image").unwrap();

        let cfg = TrainConfig { num_workers: 2, ..tiny_config(data.path(), out.path()) };
        let err = run(&cfg).err().unwrap();
        assert!(matches!(err, TrainError::Decode { .. }), "{err}");
        assert!(SnapshotStore::new(out.path()).unwrap().latest().unwrap().is_none());
    }

    #[test]
    fn test_generator_pixel_loss_falls_on_constant_pairs() {
        let _guard = lock_backend();
        let device = Default::default();
        seed_everything::<B>(7);

        let mut state = Adversaries {
            generator:     GeneratorConfig::new()
                .with_base_filters(2)
                .with_depth(2)
                .with_dropout(0.0)
                .init::<B>(&device),
            discriminator: DiscriminatorConfig::new().with_base_filters(2).with_n_layers(1).init::<B>(&device),
            optim_g:       AdamConfig::new().init::<B, Generator<B>>(),
            optim_d:       AdamConfig::new().init::<B, Discriminator<B>>(),
        };
        let batch = PairBatch {
            inputs:  Tensor::<B, 4>::ones([2, 3, 4, 4], &device).neg(),
            targets: Tensor::<B, 4>::ones([2, 3, 4, 4], &device),
        };

        let mut losses = Vec::new();
        for _ in 0..30 {
            let (next, step) = train_step(state, batch.clone(), 1e-3, 100.0).unwrap();
            state = next;
            losses.push(step);
        }
        assert!(losses.iter().all(|l| l.d_loss.is_finite() && l.g_l1 >= 0.0));
        // pixel loss drives the generator towards the constant target
        assert!(losses.last().unwrap().g_l1 < losses[0].g_l1);
    }

    #[test]
    fn test_discriminator_learns_to_tell_real_from_fixed_fake() {
        let _guard = lock_backend();
        let device = Default::default();
        seed_everything::<B>(11);

        let mut discriminator =
            DiscriminatorConfig::new().with_base_filters(2).with_n_layers(1).init::<B>(&device);
        let mut optim = AdamConfig::new().init::<B, Discriminator<B>>();

        let shape = [2, 3, 8, 8];
        let inputs = Tensor::<B, 4>::ones(shape, &device).neg();
        let ramp: Vec<f32> = (0..2 * 3 * 8 * 8).map(|i| (i % 8) as f32 / 3.5 - 1.0).collect();
        let targets = Tensor::<B, 4>::from_data(TensorData::new(ramp, shape), &device);
        let fake = Tensor::<B, 4>::zeros(shape, &device);

        let real_loss = |d: &Discriminator<B>| {
            scalar(&bce_with_logits(d.score(inputs.clone(), targets.clone()), 1.0)).unwrap()
        };
        let real_before = real_loss(&discriminator);

        let mut d_losses = Vec::new();
        for _ in 0..50 {
            let d_loss = discriminator_loss(
                discriminator.score(inputs.clone(), targets.clone()),
                discriminator.score(inputs.clone(), fake.clone()),
            );
            d_losses.push(scalar(&d_loss).unwrap());
            let grads = GradientsParams::from_grads(d_loss.backward(), &discriminator);
            discriminator = optim.step(2e-3, discriminator, grads);
        }

        // real pairs are pushed towards label 1 and the combined loss falls
        assert!(real_loss(&discriminator) < real_before);
        assert!(d_losses.last().unwrap() < &d_losses[0]);
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let err = run(&tiny_config(data.path(), out.path())).err().unwrap();
        assert!(matches!(err, TrainError::Config(_)));
    }
}
