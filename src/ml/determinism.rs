// ============================================================
// Layer 5 — Deterministic RNG Manager
// ============================================================
// One integer seed drives every source of randomness:
//
//   backend generator   — parameter init, dropout masks
//   epoch seed          — shuffle order + worker seeds + backend
//                         re-seed at the start of each epoch
//   worker generators   — augmentation inside loader threads
//
// Re-seeding per epoch means a run resumed at epoch k draws the
// same random stream as an uninterrupted run reaching epoch k.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seed the backend generator before any model exists.
///
/// burn has no switch for non-deterministic kernels; on the CPU
/// backend results are reproducible once the generator is seeded.
pub fn seed_everything<B: Backend>(seed: u64) {
    B::seed(seed);
    tracing::info!("Seeded backend generator with {seed} (deterministic mode, best effort)");
}

/// Re-seed the backend generator for `epoch`.
pub fn seed_epoch<B: Backend>(seed: u64, epoch: usize) {
    B::seed(epoch_seed(seed, epoch));
}

/// Seed scoping all randomness of one epoch.
pub fn epoch_seed(seed: u64, epoch: usize) -> u64 {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&(epoch as u64).to_le_bytes());
    StdRng::from_seed(key).gen()
}

/// Initial seed handed to loader worker `worker_id` for one epoch.
pub fn worker_initial_seed(epoch_seed: u64, worker_id: usize) -> u64 {
    epoch_seed.wrapping_add(worker_id as u64)
}

/// Sub-seed a worker derives from its initial seed, modulo 2^32.
pub fn worker_seed(initial_seed: u64) -> u64 {
    initial_seed % (1u64 << 32)
}

/// Worker-local generator. Each worker owns its own; none are shared.
pub fn seed_worker(initial_seed: u64) -> StdRng {
    StdRng::seed_from_u64(worker_seed(initial_seed))
}

/// The backend generator is process-global. Every test that initialises a
/// model or draws random tensors holds this lock so seeded tests see an
/// uninterrupted stream.
#[cfg(test)]
static BACKEND_SEED_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn lock_backend() -> std::sync::MutexGuard<'static, ()> {
    BACKEND_SEED_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
