// ============================================================
// Layer 5 — Model Contracts
// ============================================================
// The trainer drives the two networks only through these traits.
// Everything else a module needs comes from burn:
//
//   parameters         Module::num_params / visit
//   state blob         Module::into_record / load_record
//   evaluation mode    AutodiffModule::valid()  (dropout off,
//                      batch norm on running statistics)
//   training mode      the autodiff module itself

use burn::prelude::*;

/// Maps source-domain images `[n, 3, h, w]` to synthesized target-domain
/// images of the same shape, values in [-1, 1].
pub trait ImageTranslator<B: Backend> {
    fn translate(&self, input: Tensor<B, 4>) -> Tensor<B, 4>;
}

/// Scores how plausible `candidate` is as the target for `input`.
/// Returns raw logits as a spatial realness map `[n, 1, h', w']`.
pub trait PairCritic<B: Backend> {
    fn score(&self, input: Tensor<B, 4>, candidate: Tensor<B, 4>) -> Tensor<B, 4>;
}
