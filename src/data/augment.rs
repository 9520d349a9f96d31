// ============================================================
// Layer 4 — Synchronized Random Jitter
// ============================================================
// pix2pix augmentation: upscale by a margin with bicubic
// interpolation, random-crop back to the original size, then
// mirror horizontally half of the time.
//
// Input and target must stay pixel-aligned, so the random draw
// happens once per pair (JitterTransform::sample) and the same
// transform is applied to both halves.

use image::{imageops, imageops::FilterType, RgbImage};
use rand::Rng;

/// Default enlargement before cropping (256 → 286 in the reference setup).
pub const DEFAULT_JITTER_MARGIN: u32 = 30;

/// One concrete geometric transform shared by both halves of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterTransform {
    pub margin:   u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub flipped:  bool,
}

impl JitterTransform {
    /// Draw crop offsets in `0..=margin` and a fair flip decision.
    pub fn sample<R: Rng + ?Sized>(margin: u32, rng: &mut R) -> Self {
        let offset_x = rng.gen_range(0..=margin);
        let offset_y = rng.gen_range(0..=margin);
        let flipped = rng.gen_bool(0.5);
        Self { margin, offset_x, offset_y, flipped }
    }

    /// The identity transform (no resize, no crop offset, no flip).
    pub fn identity() -> Self {
        Self { margin: 0, offset_x: 0, offset_y: 0, flipped: false }
    }

    /// Apply to one image; output has the input's dimensions.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let (w, h) = img.dimensions();
        let cropped = if self.margin == 0 {
            img.clone()
        } else {
            let resized =
                imageops::resize(img, w + self.margin, h + self.margin, FilterType::CatmullRom);
            imageops::crop_imm(&resized, self.offset_x, self.offset_y, w, h).to_image()
        };
        if self.flipped {
            imageops::flip_horizontal(&cropped)
        } else {
            cropped
        }
    }
}

/// Jitter a `(target, input)` pair with one shared random transform.
pub fn random_jitter<R: Rng + ?Sized>(
    target: &RgbImage,
    input:  &RgbImage,
    margin: u32,
    rng:    &mut R,
) -> (RgbImage, RgbImage, JitterTransform) {
    let transform = JitterTransform::sample(margin, rng);
    (transform.apply(target), transform.apply(input), transform)
}
