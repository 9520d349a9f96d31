// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`     — trains (or resumes) on a paired image folder
//   2. `translate` — runs the latest snapshot on one image

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, TranslateArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "pix2pix-trainer",
    version,
    about = "Train a pix2pix image-to-image GAN on side-by-side pairs, then translate images."
)]
pub struct Cli {
    /// The subcommand to run (train or translate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on pairs in: {}", args.input_dir);

    let use_case = TrainUseCase::new(args.into());
    let summary = use_case.execute()?;

    match summary.resumed_from {
        Some(epoch) => println!(
            "Resumed after epoch {epoch}; trained epochs {}..={}.",
            summary.start_epoch, summary.last_epoch
        ),
        None => println!("Trained epochs {}..={}.", summary.start_epoch, summary.last_epoch),
    }
    println!(
        "{} steps, {} snapshots, {} ONNX exports, {} previews in '{}'.",
        summary.steps,
        summary.snapshots.len(),
        summary.exports.len(),
        summary.previews.len(),
        use_case.config().output_dir,
    );
    Ok(())
}

/// Handles the `translate` subcommand.
fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case = TranslateUseCase::new(&args.output_dir, args.backend.map(Into::into))?;
    let written = use_case.translate(&args.image, &args.out, args.paired)?;
    println!("Translated with epoch {} snapshot: {}", use_case.epoch(), written.display());
    Ok(())
}
