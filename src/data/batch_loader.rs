// ============================================================
// Layer 4 — Parallel Batch Loader
// ============================================================
// Produces one epoch of batches at a time from any PairSource.
//
//   epoch(e)
//     │  shuffle indices with epoch_seed(seed, e)
//     │  chunk into batches (keep or drop the partial tail)
//     ▼
//   worker w loads batches w, w+W, w+2W, ...  ──► bounded channel w
//     ▼
//   iterator reads channel b % W for batch b  ──► shuffled order kept
//
// Each worker owns a generator seeded through the worker-seeding
// hook, so augmentation never touches shared random state.
// num_workers = 0 loads on the calling thread.

use rand::seq::SliceRandom;
use std::{
    io,
    sync::{
        mpsc::{sync_channel, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{
    error::{Result, TrainError},
    image::ImagePair,
    traits::PairSource,
};
use crate::ml::determinism::{epoch_seed, seed_worker, worker_initial_seed};

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub batch_size:  usize,
    pub num_workers: usize,
    pub shuffle:     bool,
    /// Drop the final batch of an epoch when it is smaller than `batch_size`
    pub drop_last:   bool,
    /// Batches each worker may hold ready ahead of consumption
    pub prefetch:    usize,
    pub seed:        u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size:  1,
            num_workers: 0,
            shuffle:     true,
            drop_last:   false,
            prefetch:    2,
            seed:        42,
        }
    }
}

pub struct PairBatchLoader {
    source: Arc<dyn PairSource>,
    config: LoaderConfig,
}

impl PairBatchLoader {
    pub fn new(source: Arc<dyn PairSource>, config: LoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(TrainError::Config("batch_size must be at least 1".into()));
        }
        Ok(Self { source, config })
    }

    pub fn source(&self) -> &Arc<dyn PairSource> {
        &self.source
    }

    /// Batches per epoch under the drop-last policy.
    pub fn num_batches(&self) -> usize {
        let n = self.source.len();
        let bs = self.config.batch_size;
        if self.config.drop_last { n / bs } else { n.div_ceil(bs) }
    }

    /// Sample indices of every batch in `epoch`, in iteration order.
    pub fn batch_indices(&self, epoch: usize) -> Vec<Vec<usize>> {
        let mut order: Vec<usize> = (0..self.source.len()).collect();
        if self.config.shuffle {
            let mut rng = StdRng::seed_from_u64(epoch_seed(self.config.seed, epoch));
            order.shuffle(&mut rng);
        }
        order
            .chunks(self.config.batch_size)
            .filter(|c| !self.config.drop_last || c.len() == self.config.batch_size)
            .map(|c| c.to_vec())
            .collect()
    }

    /// Start loading `epoch`. The returned iterator is finite; call again
    /// for the next epoch.
    pub fn epoch(&self, epoch: usize) -> Result<EpochBatches> {
        let batches = self.batch_indices(epoch);
        let total = batches.len();
        let seed = epoch_seed(self.config.seed, epoch);

        if self.config.num_workers == 0 {
            return Ok(EpochBatches {
                next: 0,
                total,
                mode: Mode::Inline {
                    source: Arc::clone(&self.source),
                    batches,
                    rng: seed_worker(worker_initial_seed(seed, 0)),
                },
            });
        }

        let workers = self.config.num_workers.min(total.max(1));
        let mut receivers = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let assigned: Vec<Vec<usize>> =
                batches.iter().skip(worker_id).step_by(workers).cloned().collect();
            let (tx, rx) = sync_channel(self.config.prefetch.max(1));
            let source = Arc::clone(&self.source);

            let handle = thread::Builder::new()
                .name(format!("pair-loader-{worker_id}"))
                .spawn(move || {
                    let mut rng = seed_worker(worker_initial_seed(seed, worker_id));
                    for indices in assigned {
                        let result = load_batch(source.as_ref(), &indices, &mut rng);
                        let failed = result.is_err();
                        // a closed channel means the consumer stopped early
                        if tx.send(result).is_err() || failed {
                            break;
                        }
                    }
                })?;

            receivers.push(rx);
            handles.push(handle);
        }

        tracing::debug!("Epoch {epoch}: {total} batches across {workers} loader threads");
        Ok(EpochBatches { next: 0, total, mode: Mode::Workers { receivers, handles } })
    }
}

fn load_batch(source: &dyn PairSource, indices: &[usize], rng: &mut StdRng) -> Result<Vec<ImagePair>> {
    indices.iter().map(|&i| source.load(i, Some(&mut *rng))).collect()
}

enum Mode {
    Inline {
        source:  Arc<dyn PairSource>,
        batches: Vec<Vec<usize>>,
        rng:     StdRng,
    },
    Workers {
        receivers: Vec<Receiver<Result<Vec<ImagePair>>>>,
        handles:   Vec<JoinHandle<()>>,
    },
}

/// One epoch of batches, yielded in shuffled order.
pub struct EpochBatches {
    next:  usize,
    total: usize,
    mode:  Mode,
}

impl EpochBatches {
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for EpochBatches {
    type Item = Result<Vec<ImagePair>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let b = self.next;
        self.next += 1;

        match &mut self.mode {
            Mode::Inline { source, batches, rng } => Some(load_batch(source.as_ref(), &batches[b], rng)),
            Mode::Workers { receivers, .. } => {
                let rx = &receivers[b % receivers.len()];
                Some(rx.recv().unwrap_or_else(|_| {
                    Err(TrainError::Io(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        format!("loader worker for batch {b} stopped"),
                    )))
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl Drop for EpochBatches {
    fn drop(&mut self) {
        if let Mode::Workers { receivers, handles } = &mut self.mode {
            // unblock workers waiting on a full channel
            receivers.clear();
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
        }
    }
}
