// ============================================================
// Layer 4 — Pair Preprocessor
// ============================================================
// Turns one decoded side-by-side file into two normalised halves.
//
//   ┌──────────┬──────────┐
//   │  target  │  input   │   ← one file, width 2w
//   └──────────┴──────────┘
//
// Left half is always the target domain, right half the input
// domain. The order is a dataset convention, never detected.
//
// Pixel mapping:  v ∈ [0, 255]  →  v / 127.5 − 1  ∈ [−1, 1]
// and back for previews / inference output.

use image::{imageops, RgbImage};

use crate::domain::image::{NormalizedImage, CHANNELS};

/// Split a side-by-side image at the width midpoint into `(target, input)`.
///
/// For an odd width the right (input) half gets the extra column, so the
/// halves differ by one pixel and batch collation later rejects them.
pub fn split_pair(img: &RgbImage) -> (RgbImage, RgbImage) {
    let (width, height) = img.dimensions();
    let mid = width / 2;
    let target = imageops::crop_imm(img, 0, 0, mid, height).to_image();
    let input = imageops::crop_imm(img, mid, 0, width - mid, height).to_image();
    (target, input)
}

/// Map one 8-bit channel value into [-1, 1].
pub fn normalize_value(v: u8) -> f32 {
    v as f32 / 127.5 - 1.0
}

/// Map a [-1, 1] value back to 8 bits, clamping out-of-range values.
pub fn denormalize_value(v: f32) -> u8 {
    ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

/// Convert an RGB image (HWC, u8) into a channel-major normalised image.
pub fn normalize(img: &RgbImage) -> NormalizedImage {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut data = vec![0.0f32; CHANNELS * h * w];
    for (x, y, px) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..CHANNELS {
            data[(c * h + y) * w + x] = normalize_value(px.0[c]);
        }
    }
    NormalizedImage::new(h, w, data)
}

/// Inverse of [`normalize`].
pub fn to_rgb_image(img: &NormalizedImage) -> RgbImage {
    RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        image::Rgb([
            denormalize_value(img.at(0, y, x)),
            denormalize_value(img.at(1, y, x)),
            denormalize_value(img.at(2, y, x)),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { image::Rgb([255, 0, 0]) } else { image::Rgb([0, 0, 255]) }
        })
    }

    #[test]
    fn test_split_halves_have_half_width_and_same_height() {
        let img = striped(8, 4);
        let (target, input) = split_pair(&img);
        assert_eq!(target.dimensions(), (4, 4));
        assert_eq!(input.dimensions(), (4, 4));
        // left half is the target
        assert_eq!(target.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(input.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_odd_width_gives_wider_input_half() {
        let img = striped(9, 2);
        let (target, input) = split_pair(&img);
        assert_eq!(target.width(), 4);
        assert_eq!(input.width(), 5);
    }

    #[test]
    fn test_normalization_round_trip_all_values() {
        for v in 0..=255u8 {
            let n = normalize_value(v);
            assert!((-1.0..=1.0).contains(&n));
            assert_abs_diff_eq!((n + 1.0) * 127.5, v as f32, epsilon = 1e-3);
            assert_eq!(denormalize_value(n), v);
        }
    }

    #[test]
    fn test_normalize_is_channel_major() {
        let img = RgbImage::from_fn(2, 1, |x, _| image::Rgb([x as u8 * 255, 0, 255]));
        let n = normalize(&img);
        assert_eq!(n.shape(), [3, 1, 2]);
        assert_abs_diff_eq!(n.at(0, 0, 0), -1.0);
        assert_abs_diff_eq!(n.at(0, 0, 1), 1.0);
        assert_abs_diff_eq!(n.at(2, 0, 0), 1.0);
        assert_eq!(to_rgb_image(&n), img);
    }
}
