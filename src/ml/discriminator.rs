use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::leaky_relu,
};

use crate::ml::contract::PairCritic;
use crate::ml::generator::{init_weights, KERNEL, LEAKY_SLOPE, NORM_EPSILON, STRIDE};

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    /// input image channels + candidate image channels
    #[config(default = 6)]
    pub in_channels:  usize,
    #[config(default = 64)]
    pub base_filters: usize,
    /// Number of stride-2 layers
    #[config(default = 3)]
    pub n_layers:     usize,
}

impl DiscriminatorConfig {
    fn filters(&self, layer: usize) -> usize {
        self.base_filters << layer.min(3)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let n = self.n_layers;

        let mut blocks: Vec<PatchBlock<B>> = (0..n)
            .map(|i| {
                let in_ch = if i == 0 { self.in_channels } else { self.filters(i - 1) };
                PatchBlock::new([in_ch, self.filters(i)], KERNEL, STRIDE, i != 0, device)
            })
            .collect();
        // one more 3x3 stride-1 block widens features without shrinking the map
        blocks.push(PatchBlock::new([self.filters(n - 1), self.filters(n)], 3, 1, true, device));

        let head = Conv2dConfig::new([self.filters(n), 1], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(init_weights())
            .init(device);

        Discriminator { blocks, head }
    }
}

#[derive(Module, Debug)]
pub struct PatchBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> PatchBlock<B> {
    fn new(channels: [usize; 2], kernel: usize, stride: usize, normed: bool, device: &B::Device) -> Self {
        // k4 s2 halves the map, k3 s1 keeps it
        let padding = (kernel - 1) / 2;
        Self {
            conv: Conv2dConfig::new(channels, [kernel, kernel])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .with_bias(!normed)
                .with_initializer(init_weights())
                .init(device),
            norm: normed.then(|| BatchNormConfig::new(channels[1]).with_epsilon(NORM_EPSILON).init(device)),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        leaky_relu(x, LEAKY_SLOPE)
    }
}

/// PatchGAN: each output logit judges one receptive-field patch of the
/// concatenated (input, candidate) pair.
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    pub blocks: Vec<PatchBlock<B>>,
    pub head:   Conv2d<B>,
}

impl<B: Backend> Discriminator<B> {
    /// `[n, 6, h, w]` → `[n, 1, h / 2^n_layers, w / 2^n_layers]`
    pub fn forward(&self, pair: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = pair;
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.head.forward(x)
    }
}

impl<B: Backend> PairCritic<B> for Discriminator<B> {
    fn score(&self, input: Tensor<B, 4>, candidate: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(Tensor::cat(vec![input, candidate], 1))
    }
}
