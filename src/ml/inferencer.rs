// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a generator in evaluation mode on host-side images.
// Used for training previews (on the `valid()` copy of the
// training generator) and by the `translate` command (on a
// generator restored from the latest snapshot).

use burn::prelude::*;

use crate::data::batcher::image_to_tensor;
use crate::domain::{
    error::{Result, TrainError},
    image::{NormalizedImage, CHANNELS},
};
use crate::ml::contract::ImageTranslator;
use crate::ml::generator::Generator;

pub struct Inferencer<B: Backend> {
    generator: Generator<B>,
    device:    B::Device,
}

impl<B: Backend> Inferencer<B> {
    /// `generator` must already be in evaluation mode.
    pub fn new(generator: Generator<B>, device: B::Device) -> Self {
        Self { generator, device }
    }

    /// Translate one image. Both sides must be multiples of the
    /// generator's size multiple.
    pub fn translate(&self, image: &NormalizedImage) -> Result<NormalizedImage> {
        let multiple = self.generator.size_multiple();
        if image.height % multiple != 0 || image.width % multiple != 0 || image.height == 0 || image.width == 0 {
            return Err(TrainError::Shape {
                expected: vec![CHANNELS, multiple, multiple],
                actual:   image.shape().to_vec(),
            });
        }

        let output = self.generator.translate(image_to_tensor::<B>(image, &self.device));
        let mut images = tensor_to_images(output)?;
        images.pop().ok_or_else(|| TrainError::Tensor("generator returned an empty batch".into()))
    }
}

/// Split a `[n, 3, h, w]` tensor back into `n` host images.
pub fn tensor_to_images<B: Backend>(tensor: Tensor<B, 4>) -> Result<Vec<NormalizedImage>> {
    let [n, c, h, w] = tensor.dims();
    if c != CHANNELS {
        return Err(TrainError::Shape { expected: vec![n, CHANNELS, h, w], actual: vec![n, c, h, w] });
    }
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainError::Tensor(format!("{e:?}")))?;

    let per_image = c * h * w;
    Ok(values
        .chunks_exact(per_image.max(1))
        .take(n)
        .map(|chunk| NormalizedImage::new(h, w, chunk.to_vec()))
        .collect())
}
