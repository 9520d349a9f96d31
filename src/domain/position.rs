// ============================================================
// Layer 3 — Training Position
// ============================================================
// Where a run currently is: the 1-based epoch and the number of
// optimisation steps completed so far. Persisted inside every
// snapshot's meta.json, never recovered from a file name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPosition {
    /// 1-based epoch number
    pub epoch: usize,
    /// Global optimisation steps completed before this position
    pub step:  usize,
}

impl TrainingPosition {
    /// Position of a run that has never trained.
    pub fn fresh() -> Self {
        Self { epoch: 1, step: 0 }
    }

    /// Position to continue from after a snapshot taken at the end of
    /// `epoch`, having completed `step` steps.
    pub fn after_snapshot(epoch: usize, step: usize) -> Self {
        Self { epoch: epoch + 1, step }
    }

    /// Whether a snapshot is due at the end of `epoch`.
    /// Epochs are 1-based: interval 5 fires at 5, 10, 15, ...
    pub fn is_checkpoint_epoch(epoch: usize, snapshot_interval: usize) -> bool {
        snapshot_interval > 0 && epoch % snapshot_interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_starts_after_snapshot_epoch() {
        let p = TrainingPosition::after_snapshot(5, 40);
        assert_eq!(p.epoch, 6);
        assert_eq!(p.step, 40);
    }

    #[test]
    fn test_checkpoint_epochs_for_twelve_epochs_interval_five() {
        let hits: Vec<usize> = (1..=12)
            .filter(|&e| TrainingPosition::is_checkpoint_epoch(e, 5))
            .collect();
        assert_eq!(hits, vec![5, 10]);
    }

    #[test]
    fn test_zero_interval_never_checkpoints() {
        assert!(!TrainingPosition::is_checkpoint_epoch(3, 0));
    }
}
