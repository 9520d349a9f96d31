// ============================================================
// Layer 5 — Adversarial and Reconstruction Losses
// ============================================================
//   d_loss = ½ · (BCE(D(x, y), 1) + BCE(D(x, G(x)), 0))
//   g_loss = BCE(D(x, G(x)), 1) + λ · mean|G(x) − y|,  λ = 100
//
// BCE works on raw logits:
//   max(z, 0) − z·t + log(1 + e^(−|z|))

use burn::prelude::*;

/// Weight of the pixel term in the reference setup.
pub const DEFAULT_L1_WEIGHT: f64 = 100.0;

/// Mean binary cross-entropy of `logits` against a constant label.
pub fn bce_with_logits<B: Backend, const D: usize>(logits: Tensor<B, D>, label: f32) -> Tensor<B, 1> {
    let log_term = logits.clone().abs().neg().exp().log1p();
    (logits.clone().clamp_min(0.0) - logits * label + log_term).mean()
}

/// Mean absolute error.
pub fn l1_loss<B: Backend, const D: usize>(a: Tensor<B, D>, b: Tensor<B, D>) -> Tensor<B, 1> {
    (a - b).abs().mean()
}

/// Discriminator objective: real pairs → 1, generated pairs → 0, halved.
pub fn discriminator_loss<B: Backend>(real_score: Tensor<B, 4>, fake_score: Tensor<B, 4>) -> Tensor<B, 1> {
    (bce_with_logits(real_score, 1.0) + bce_with_logits(fake_score, 0.0)) * 0.5
}

/// The three generator terms, kept apart for logging.
pub struct GeneratorLoss<B: Backend> {
    pub total:       Tensor<B, 1>,
    pub adversarial: Tensor<B, 1>,
    pub pixel:       Tensor<B, 1>,
}

/// Generator objective: fool the critic and stay close to the real target.
pub fn generator_loss<B: Backend>(
    fake_score: Tensor<B, 4>,
    fake:       Tensor<B, 4>,
    target:     Tensor<B, 4>,
    l1_weight:  f64,
) -> GeneratorLoss<B> {
    let adversarial = bce_with_logits(fake_score, 1.0);
    let pixel = l1_loss(fake, target) * l1_weight;
    GeneratorLoss { total: adversarial.clone() + pixel.clone(), adversarial, pixel }
}
