// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From a directory of side-by-side images to device tensors:
//
//   *.jpg / *.png
//       │
//       ▼
//   ImageDirectory   → lists and decodes files
//       │
//       ▼
//   Preprocessor     → splits target | input, normalises to [-1, 1]
//       │
//       ▼
//   RandomJitter     → optional shared resize/crop/flip
//       │
//       ▼
//   PairedDataset    → implements PairSource
//       │
//       ▼
//   PairBatchLoader  → seeded shuffle, worker threads, prefetch
//       │
//       ▼
//   PairBatcher      → implements Burn's Batcher trait

/// Lists and decodes the image files in the dataset directory
pub mod loader;

/// Split at the midpoint and map pixels to/from [-1, 1]
pub mod preprocessor;

/// Synchronized random jitter for (input, target)
pub mod augment;

/// File-backed PairSource
pub mod dataset;

/// Multi-threaded, per-epoch batch iterator
pub mod batch_loader;

/// Stacks pairs into [N, 3, H, W] tensors
pub mod batcher;

#[cfg(test)]
pub(crate) mod fixtures;
