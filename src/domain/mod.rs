// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, the error taxonomy, and the traits the other
// layers implement. No file I/O lives here.

/// Host-side normalised images and (input, target) pairs
pub mod image;

/// Epoch/step coordinate persisted with every snapshot
pub mod position;

/// TrainError and the crate Result alias
pub mod error;

/// PairSource: indexed access to (input, target) pairs
pub mod traits;
