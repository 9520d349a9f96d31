// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// Plain host-side image buffers. No burn types here: the data
// layer produces these, the batcher turns them into tensors.
//
// Layout is CHW (channel-major), 3 channels, values in [-1, 1].

use serde::{Deserialize, Serialize};

/// Number of colour channels every image in the pipeline carries.
pub const CHANNELS: usize = 3;

/// One RGB image normalised to [-1, 1], stored channel-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedImage {
    pub height: usize,
    pub width:  usize,
    /// `CHANNELS * height * width` values, channel-major
    pub data:   Vec<f32>,
}

impl NormalizedImage {
    pub fn new(height: usize, width: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), CHANNELS * height * width);
        Self { height, width, data }
    }

    /// `[channels, height, width]`
    pub fn shape(&self) -> [usize; 3] {
        [CHANNELS, self.height, self.width]
    }

    /// Value at channel `c`, row `y`, column `x`.
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }
}

/// One training example: the source-domain image and its paired target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePair {
    pub input:  NormalizedImage,
    pub target: NormalizedImage,
}

impl ImagePair {
    pub fn new(input: NormalizedImage, target: NormalizedImage) -> Self {
        Self { input, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_is_channel_major() {
        // 3 channels of a 1x2 image: c0 = [0,1], c1 = [2,3], c2 = [4,5]
        let img = NormalizedImage::new(1, 2, (0..6).map(|v| v as f32).collect());
        assert_eq!(img.at(0, 0, 1), 1.0);
        assert_eq!(img.at(1, 0, 0), 2.0);
        assert_eq!(img.at(2, 0, 1), 5.0);
    }
}
