// Synthetic paired datasets for tests.

use image::RgbImage;
use std::path::Path;

/// Write `count` PNG files of size `(2 * half_width) x height` into `dir`.
///
/// Left (target) halves are red-dominant, right (input) halves
/// blue-dominant, and every file differs from the others.
pub fn write_paired_dataset(dir: &Path, count: usize, half_width: u32, height: u32) {
    for i in 0..count as u32 {
        let img = RgbImage::from_fn(half_width * 2, height, |x, y| {
            if x < half_width {
                image::Rgb([
                    (150 + (x * 13 + y * 7 + i * 29) % 100) as u8,
                    (10 + (y * 5) % 40) as u8,
                    20,
                ])
            } else {
                let x = x - half_width;
                image::Rgb([
                    20,
                    (10 + (x * 3) % 40) as u8,
                    (150 + (x * 11 + y * 3 + i * 17) % 100) as u8,
                ])
            }
        });
        img.save(dir.join(format!("pair_{i:03}.png"))).unwrap();
    }
}
