// ============================================================
// Layer 4 — Pair Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N ImagePairs into two
// [N, 3, H, W] float tensors on the target device.
//
// Batcher::batch cannot fail, so shapes are checked first with
// `check_batch` and a mismatch becomes a TrainError::Shape.

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};

use crate::domain::{
    error::{Result, TrainError},
    image::{ImagePair, NormalizedImage},
};

/// A batch of pairs ready for the forward pass.
#[derive(Debug, Clone)]
pub struct PairBatch<B: Backend> {
    /// Source-domain images — shape: [batch, 3, h, w]
    pub inputs:  Tensor<B, 4>,
    /// Real target-domain images — shape: [batch, 3, h, w]
    pub targets: Tensor<B, 4>,
}

impl<B: Backend> PairBatch<B> {
    pub fn len(&self) -> usize {
        self.inputs.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Validate shapes, then stack. The only entry point the trainer uses.
    pub fn try_batch(&self, items: Vec<ImagePair>) -> Result<PairBatch<B>> {
        check_batch(&items)?;
        Ok(self.batch(items))
    }
}

/// Every half of every pair must share the first input's `[c, h, w]`.
pub fn check_batch(items: &[ImagePair]) -> Result<()> {
    let Some(first) = items.first() else {
        return Err(TrainError::Shape { expected: vec![1], actual: vec![0] });
    };
    let expected = first.input.shape();
    for pair in items {
        for shape in [pair.input.shape(), pair.target.shape()] {
            if shape != expected {
                return Err(TrainError::Shape {
                    expected: expected.to_vec(),
                    actual:   shape.to_vec(),
                });
            }
        }
    }
    Ok(())
}

/// One image as a `[1, 3, h, w]` tensor.
pub fn image_to_tensor<B: Backend>(img: &NormalizedImage, device: &B::Device) -> Tensor<B, 4> {
    let [c, h, w] = img.shape();
    Tensor::from_data(TensorData::new(img.data.clone(), [1, c, h, w]), device)
}

impl<B: Backend> Batcher<ImagePair, PairBatch<B>> for PairBatcher<B> {
    fn batch(&self, items: Vec<ImagePair>) -> PairBatch<B> {
        let n = items.len();
        let [c, h, w] = items[0].input.shape();

        let mut inputs = Vec::with_capacity(n * c * h * w);
        let mut targets = Vec::with_capacity(n * c * h * w);
        for pair in &items {
            inputs.extend_from_slice(&pair.input.data);
            targets.extend_from_slice(&pair.target.data);
        }

        PairBatch {
            inputs:  Tensor::from_data(TensorData::new(inputs, [n, c, h, w]), &self.device),
            targets: Tensor::from_data(TensorData::new(targets, [n, c, h, w]), &self.device),
        }
    }
}
