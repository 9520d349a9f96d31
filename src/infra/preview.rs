// ============================================================
// Layer 6 — Preview Writer
// ============================================================
// Dumps `input | generated | target` side by side as a JPEG so
// training progress can be eyeballed while a run is going.
//
// File naming:  epoch_{epoch:03}_iter_{step:04}.jpg

use image::{imageops, ImageFormat, RgbImage};
use std::{
    fs,
    path::PathBuf,
};

use crate::data::preprocessor::to_rgb_image;
use crate::domain::{
    error::{Result, TrainError},
    image::NormalizedImage,
};
use crate::infra::remove_matching;

pub struct PreviewWriter {
    dir: PathBuf,
}

impl PreviewWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TrainError::setup(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn preview_name(epoch: usize, step: usize) -> String {
        format!("epoch_{epoch:03}_iter_{step:04}.jpg")
    }

    pub fn discard_all(&self) -> Result<usize> {
        remove_matching(&self.dir, |name| {
            name.starts_with("epoch_") && name.contains("_iter_") && name.ends_with(".jpg")
        })
    }

    /// Write `panels` left to right into one image. All panels must share
    /// a height.
    pub fn write(&self, epoch: usize, step: usize, panels: &[&NormalizedImage]) -> Result<PathBuf> {
        let path = self.dir.join(Self::preview_name(epoch, step));
        let canvas = compose(panels)?;
        canvas
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|e| TrainError::write(&path, e))?;
        tracing::debug!("Wrote preview '{}'", path.display());
        Ok(path)
    }
}

/// Concatenate panels horizontally, rescaled from [-1, 1] to 8-bit.
pub fn compose(panels: &[&NormalizedImage]) -> Result<RgbImage> {
    let height = panels.first().map_or(0, |p| p.height);
    if let Some(odd) = panels.iter().find(|p| p.height != height) {
        return Err(TrainError::Shape {
            expected: vec![height],
            actual:   vec![odd.height],
        });
    }

    let width: usize = panels.iter().map(|p| p.width).sum();
    let mut canvas = RgbImage::new(width as u32, height as u32);
    let mut x = 0i64;
    for panel in panels {
        imageops::replace(&mut canvas, &to_rgb_image(panel), x, 0);
        x += panel.width as i64;
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::CHANNELS;

    fn flat(height: usize, width: usize, value: f32) -> NormalizedImage {
        NormalizedImage::new(height, width, vec![value; CHANNELS * height * width])
    }

    #[test]
    fn test_preview_name() {
        assert_eq!(PreviewWriter::preview_name(3, 40), "epoch_003_iter_0040.jpg");
    }

    #[test]
    fn test_compose_places_panels_left_to_right() {
        let (black, grey, white) = (flat(4, 2, -1.0), flat(4, 3, 0.0), flat(4, 2, 1.0));
        let canvas = compose(&[&black, &grey, &white]).unwrap();
        assert_eq!(canvas.dimensions(), (7, 4));
        assert_eq!(canvas.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 2).0, [128, 128, 128]);
        assert_eq!(canvas.get_pixel(6, 3).0, [255, 255, 255]);
    }

    #[test]
    fn test_mismatched_heights_are_rejected() {
        let result = compose(&[&flat(4, 2, 0.0), &flat(3, 2, 0.0)]);
        assert!(matches!(result, Err(TrainError::Shape { .. })));
    }

    #[test]
    fn test_write_produces_decodable_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PreviewWriter::new(dir.path()).unwrap();
        let panel = flat(8, 8, 0.5);
        let path = writer.write(1, 0, &[&panel, &panel, &panel]).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 8));
    }
}
