use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Initializer, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{leaky_relu, relu, tanh},
};

use crate::ml::contract::ImageTranslator;

/// Every resampling conv in the U-Net is 4x4, stride 2, padding 1.
pub const KERNEL: usize = 4;
pub const STRIDE: usize = 2;
pub const PADDING: usize = 1;
pub const LEAKY_SLOPE: f64 = 0.2;
pub const NORM_EPSILON: f64 = 1e-5;

/// Decoder levels (counted from the bottleneck) that carry dropout.
const DROPOUT_LEVELS: usize = 3;

pub(crate) fn init_weights() -> Initializer {
    Initializer::Normal { mean: 0.0, std: 0.02 }
}

// NOTE: #[derive(Config)] already provides Clone + Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    #[config(default = 3)]
    pub in_channels:  usize,
    #[config(default = 3)]
    pub out_channels: usize,
    #[config(default = 64)]
    pub base_filters: usize,
    /// Number of stride-2 levels; image sides must be multiples of 2^depth
    #[config(default = 8)]
    pub depth:        usize,
    #[config(default = 0.5)]
    pub dropout:      f64,
}

impl GeneratorConfig {
    /// Feature maps at encoder level `level` (doubling, capped at 8x).
    pub fn filters(&self, level: usize) -> usize {
        self.base_filters << level.min(3)
    }

    /// Image sides must be a positive multiple of this.
    pub fn size_multiple(&self) -> usize {
        1 << self.depth
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let d = self.depth;

        let downs = (0..d)
            .map(|i| {
                let in_ch = if i == 0 { self.in_channels } else { self.filters(i - 1) };
                // outermost and innermost levels are not normalised
                let normed = i != 0 && i != d - 1;
                DownBlock {
                    conv: Conv2dConfig::new([in_ch, self.filters(i)], [KERNEL, KERNEL])
                        .with_stride([STRIDE, STRIDE])
                        .with_padding(PaddingConfig2d::Explicit(PADDING, PADDING))
                        .with_bias(!normed)
                        .with_initializer(init_weights())
                        .init(device),
                    norm: normed.then(|| {
                        BatchNormConfig::new(self.filters(i)).with_epsilon(NORM_EPSILON).init(device)
                    }),
                }
            })
            .collect();

        let ups = (0..d.saturating_sub(1))
            .map(|k| {
                let level = d - 1 - k;
                let in_ch = if k == 0 { self.filters(level) } else { 2 * self.filters(level) };
                let out_ch = self.filters(level - 1);
                let p = if k < DROPOUT_LEVELS { self.dropout } else { 0.0 };
                UpBlock {
                    conv: ConvTranspose2dConfig::new([in_ch, out_ch], [KERNEL, KERNEL])
                        .with_stride([STRIDE, STRIDE])
                        .with_padding([PADDING, PADDING])
                        .with_bias(false)
                        .with_initializer(init_weights())
                        .init(device),
                    norm:    BatchNormConfig::new(out_ch).with_epsilon(NORM_EPSILON).init(device),
                    dropout: DropoutConfig::new(p).init(),
                }
            })
            .collect();

        let head_in = if d > 1 { 2 * self.filters(0) } else { self.filters(0) };
        let head = ConvTranspose2dConfig::new([head_in, self.out_channels], [KERNEL, KERNEL])
            .with_stride([STRIDE, STRIDE])
            .with_padding([PADDING, PADDING])
            .with_initializer(init_weights())
            .init(device);

        Generator { downs, ups, head }
    }
}

/// conv 4x4/2 → [batch norm] → LeakyReLU(0.2)
#[derive(Module, Debug)]
pub struct DownBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> DownBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        leaky_relu(x, LEAKY_SLOPE)
    }
}

/// transposed conv 4x4/2 → batch norm → dropout → ReLU
#[derive(Module, Debug)]
pub struct UpBlock<B: Backend> {
    pub conv:    ConvTranspose2d<B>,
    pub norm:    BatchNorm<B, 2>,
    pub dropout: Dropout,
}

impl<B: Backend> UpBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(self.conv.forward(x));
        relu(self.dropout.forward(x))
    }
}

/// U-Net generator: `depth` encoder levels, `depth - 1` decoder levels
/// each concatenated with the mirrored encoder output, and a transposed
/// conv head with tanh.
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub downs: Vec<DownBlock<B>>,
    pub ups:   Vec<UpBlock<B>>,
    pub head:  ConvTranspose2d<B>,
}

impl<B: Backend> Generator<B> {
    /// `[n, in, h, w]` → `[n, out, h, w]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut skips = Vec::with_capacity(self.downs.len());
        let mut x = input;
        for down in &self.downs {
            x = down.forward(x);
            skips.push(x.clone());
        }
        // the bottleneck feeds the decoder directly
        skips.pop();

        for (up, skip) in self.ups.iter().zip(skips.into_iter().rev()) {
            x = Tensor::cat(vec![up.forward(x), skip], 1);
        }
        tanh(self.head.forward(x))
    }

    pub fn depth(&self) -> usize {
        self.downs.len()
    }

    pub fn size_multiple(&self) -> usize {
        1 << self.depth()
    }
}

impl<B: Backend> ImageTranslator<B> for Generator<B> {
    fn translate(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.forward(input)
    }
}
