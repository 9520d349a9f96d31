use image::RgbImage;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use crate::data::{
    augment::{random_jitter, JitterTransform},
    loader::{decode_rgb, ImageDirectory},
    preprocessor::{normalize, split_pair},
};
use crate::domain::{error::Result, image::ImagePair, traits::PairSource};

/// Directory of side-by-side image files, read lazily one pair at a time.
pub struct PairedDataset {
    files:         Vec<PathBuf>,
    /// `Some(margin)` enables synchronized random jitter
    jitter_margin: Option<u32>,
}

impl PairedDataset {
    /// Scan `dir` for samples. Augmentation is off unless `jitter_margin` is set.
    pub fn open(dir: impl AsRef<Path>, jitter_margin: Option<u32>) -> Result<Self> {
        let files = ImageDirectory::new(dir.as_ref()).scan()?;
        Ok(Self { files, jitter_margin })
    }

    pub fn augments(&self) -> bool {
        self.jitter_margin.is_some()
    }

    /// Load pair `index` and report the geometric transform applied to it.
    pub fn load_with_transform(
        &self,
        index: usize,
        rng:   Option<&mut StdRng>,
    ) -> Result<(ImagePair, JitterTransform)> {
        let path = &self.files[index];
        let (target, input) = split_pair(&decode_rgb(path)?);

        let (target, input, transform) = match (self.jitter_margin, rng) {
            (Some(margin), Some(rng)) => random_jitter(&target, &input, margin, rng),
            _ => (target, input, JitterTransform::identity()),
        };

        Ok((to_pair(&input, &target), transform))
    }
}

impl PairSource for PairedDataset {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn load(&self, index: usize, rng: Option<&mut StdRng>) -> Result<ImagePair> {
        self.load_with_transform(index, rng).map(|(pair, _)| pair)
    }
}

fn to_pair(input: &RgbImage, target: &RgbImage) -> ImagePair {
    ImagePair::new(normalize(input), normalize(target))
}
