// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The networks, the losses and the adversarial loop.
//
//   generator.rs     — U-Net: 8 stride-2 downsampling blocks,
//                      8 transposed-conv upsampling blocks with
//                      skip concatenation, tanh output in [-1, 1]
//
//   discriminator.rs — PatchGAN: judges (condition, candidate)
//                      pairs with one logit per receptive patch
//
//   loss.rs          — Logit-space BCE and weighted L1
//
//   trainer.rs       — Alternating D/G updates with Adam,
//                      previews, snapshots, export, resume
//
//   inferencer.rs    — Eval-mode translation of host images
//
// Reference: Isola et al. (2017) Image-to-Image Translation
//            with Conditional Adversarial Networks
//            Burn Book §5 (Training)

/// ImageTranslator / PairCritic seams implemented by the networks
pub mod contract;

/// Backend seeding and the shared test lock
pub mod determinism;

/// U-Net generator
pub mod generator;

/// PatchGAN discriminator
pub mod discriminator;

/// Adversarial and reconstruction losses
pub mod loss;

/// Resumable adversarial training loop
pub mod trainer;

/// Eval-mode generator on host images
pub mod inferencer;
