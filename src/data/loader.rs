// ============================================================
// Layer 4 — Image Directory Loader
// ============================================================
// Finds the paired image files in the dataset directory and
// decodes them to 8-bit RGB using the `image` crate.
//
// The directory is flat: every .jpg / .jpeg / .png file is one
// sample (target | input side by side). Anything else is ignored.
// Files are returned sorted by name so sample indices are stable
// between runs, which the seeded shuffle relies on.

use image::RgbImage;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{Result, TrainError};

/// Extensions accepted as samples (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A flat directory of side-by-side paired images.
pub struct ImageDirectory {
    dir: PathBuf,
}

impl ImageDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List every eligible image file, sorted by file name.
    ///
    /// A missing or unreadable directory is a setup error: it surfaces
    /// before any model or optimizer exists.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(TrainError::setup(&self.dir, "input directory does not exist"));
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| TrainError::setup(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TrainError::setup(&self.dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            if has_image_extension(&path) {
                files.push(path);
            } else {
                tracing::debug!("Ignoring non-image file '{}'", path.display());
            }
        }

        files.sort();
        tracing::info!("Found {} paired images in '{}'", files.len(), self.dir.display());
        Ok(files)
    }
}

/// Decode one file to 8-bit RGB. Grayscale and RGBA inputs are converted.
pub fn decode_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| TrainError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
