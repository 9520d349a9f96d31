// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// PairSource is the seam between the data pipeline and the batch
// loader: the loader only needs "how many" and "give me pair i".
// PairedDataset reads side-by-side image files; tests plug in
// in-memory sources.
//
// The model contracts (ImageTranslator / PairCritic) carry tensor
// types and therefore live in Layer 5, ml::contract.

use rand::rngs::StdRng;

use crate::domain::error::Result;
use crate::domain::image::ImagePair;

/// Indexed, fallible source of image pairs.
///
/// Implementations must be shareable across loader threads.
pub trait PairSource: Send + Sync {
    /// Number of pairs available.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load pair `index`. When `rng` is given and augmentation is enabled,
    /// the same random transform is applied to both halves.
    fn load(&self, index: usize, rng: Option<&mut StdRng>) -> Result<ImagePair>;
}
