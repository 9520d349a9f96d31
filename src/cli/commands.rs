// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `translate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::{BackendKind, TrainConfig};
use crate::ml::{discriminator::DiscriminatorConfig, generator::GeneratorConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or resume training) a pix2pix model on side-by-side images
    Train(TrainArgs),

    /// Translate one image with the latest snapshot of a training run
    Translate(TranslateArgs),
}

/// Compute backend, as spelled on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// GPU through WebGPU
    Wgpu,
    /// CPU (reproducible for a fixed seed)
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory of side-by-side images: left half target, right half input
    #[arg(long, default_value = "data/pairs")]
    pub input_dir: String,

    /// Directory for snapshots, ONNX exports, previews and metrics
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Write a preview every N batches (0 disables previews)
    #[arg(long, default_value_t = 100)]
    pub sample_interval: usize,

    /// Snapshot and export every N epochs
    #[arg(long, default_value_t = 5)]
    pub snapshot_interval: usize,

    /// Epochs to train in this invocation (counted from the resume point)
    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Ignore existing snapshots and start again from epoch 1
    #[arg(long)]
    pub restart: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Loader threads decoding images in parallel
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Enable random jitter and mirroring, applied identically to both halves
    #[arg(long)]
    pub augment: bool,

    /// Pixels added before the random crop when augmenting
    #[arg(long, default_value_t = 30)]
    pub jitter_margin: u32,

    /// Spatial size of the exported ONNX graph
    #[arg(long, default_value_t = 512)]
    pub export_size: usize,

    /// Adam learning rate for both networks
    #[arg(long, default_value_t = 2e-4)]
    pub lr: f64,

    /// Weight of the L1 reconstruction term in the generator loss
    #[arg(long, default_value_t = 100.0)]
    pub l1_weight: f64,

    /// U-Net levels; image sides must be multiples of 2^depth
    #[arg(long, default_value_t = 8)]
    pub depth: usize,

    /// Feature maps of the first generator and discriminator layer
    #[arg(long, default_value_t = 64)]
    pub base_filters: usize,

    /// Stride-2 layers in the PatchGAN discriminator
    #[arg(long, default_value_t = 3)]
    pub disc_layers: usize,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            input_dir:         a.input_dir,
            output_dir:        a.output_dir,
            sample_interval:   a.sample_interval,
            snapshot_interval: a.snapshot_interval,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            restart:           a.restart,
            seed:              a.seed,
            num_workers:       a.num_workers,
            augment:           a.augment,
            jitter_margin:     a.jitter_margin,
            export_size:       a.export_size,
            lr:                a.lr,
            l1_weight:         a.l1_weight,
            generator:         GeneratorConfig::new()
                .with_depth(a.depth)
                .with_base_filters(a.base_filters),
            discriminator:     DiscriminatorConfig::new()
                .with_base_filters(a.base_filters)
                .with_n_layers(a.disc_layers),
            backend:           a.backend.into(),
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Image to translate
    #[arg(long)]
    pub image: PathBuf,

    /// Where to write the result (format from the extension)
    #[arg(long)]
    pub out: PathBuf,

    /// Output directory of the training run
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Treat --image as a target | input file and write input | generated | target
    #[arg(long)]
    pub paired: bool,

    /// Override the backend the run was trained with
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["pix2pix-trainer", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let defaults = TrainConfig::default();

        assert_eq!(cfg.input_dir, defaults.input_dir);
        assert_eq!(cfg.snapshot_interval, defaults.snapshot_interval);
        assert_eq!(cfg.sample_interval, defaults.sample_interval);
        assert_eq!(cfg.export_size, defaults.export_size);
        assert_eq!(cfg.generator.depth, defaults.generator.depth);
        assert_eq!(cfg.discriminator.n_layers, defaults.discriminator.n_layers);
        assert_eq!(cfg.backend, BackendKind::Wgpu);
        assert!(!cfg.restart);
    }

    #[test]
    fn test_train_flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "pix2pix-trainer", "train",
            "--input-dir", "facades",
            "--epochs", "3",
            "--restart",
            "--augment",
            "--depth", "4",
            "--export-size", "64",
            "--backend", "ndarray",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.input_dir, "facades");
        assert_eq!(cfg.epochs, 3);
        assert!(cfg.restart && cfg.augment);
        assert_eq!(cfg.generator.depth, 4);
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_translate_requires_image_and_out() {
        assert!(Cli::try_parse_from(["pix2pix-trainer", "translate"]).is_err());
        let cli = Cli::try_parse_from([
            "pix2pix-trainer", "translate", "--image", "a.png", "--out", "b.png",
        ])
        .unwrap();
        let Commands::Translate(args) = cli.command else { panic!("expected translate") };
        assert!(args.backend.is_none());
        assert!(!args.paired);
    }
}
