// Checkpoint naming and retention.
//
// A checkpoint is written only when the epoch's training loss beats every
// earlier epoch. File names embed the 1-based epoch (two digits, wider if
// needed) and the loss to four decimals:
//
//   weights-improvement-{epoch:02}-{loss:.4}-bigger.mpk
//
// `CheckpointTracker` remembers what has been written and, under a
// bounded `RetentionPolicy`, says which older files should go. It never
// touches the filesystem itself; the trainer does the deleting.

use crate::config::RetentionPolicy;
use std::path::{Path, PathBuf};

pub const CHECKPOINT_EXTENSION: &str = "mpk";

/// Stem of the checkpoint file for an improving epoch.
pub fn checkpoint_stem(epoch: usize, loss: f32) -> String {
    format!("weights-improvement-{epoch:02}-{loss:.4}-bigger")
}

/// Full checkpoint path. The extension is appended rather than set, because
/// the loss puts a '.' in the stem.
pub fn checkpoint_path(dir: &Path, epoch: usize, loss: f32) -> PathBuf {
    dir.join(format!(
        "{}.{CHECKPOINT_EXTENSION}",
        checkpoint_stem(epoch, loss)
    ))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub epoch: usize,
    pub loss: f32,
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CheckpointTracker {
    policy: RetentionPolicy,
    best: Option<f32>,
    kept: Vec<Checkpoint>,
}

impl CheckpointTracker {
    pub fn new(policy: RetentionPolicy) -> Self {
        CheckpointTracker {
            policy,
            best: None,
            kept: Vec::new(),
        }
    }

    /// True when `loss` is strictly below every loss seen so far. NaN never
    /// improves.
    pub fn improves(&self, loss: f32) -> bool {
        match self.best {
            None => !loss.is_nan(),
            Some(best) => loss < best,
        }
    }

    pub fn best_loss(&self) -> Option<f32> {
        self.best
    }

    /// Checkpoints still on disk, oldest first.
    pub fn kept(&self) -> &[Checkpoint] {
        &self.kept
    }

    /// Register a written checkpoint. Returns the paths that fall outside the
    /// retention policy and should be deleted.
    pub fn record(&mut self, checkpoint: Checkpoint) -> Vec<PathBuf> {
        if self.best.is_none_or(|b| checkpoint.loss < b) {
            self.best = Some(checkpoint.loss);
        }
        self.kept.push(checkpoint);

        let (limit, by_loss) = match self.policy {
            RetentionPolicy::KeepAll => return Vec::new(),
            RetentionPolicy::KeepBestN(n) => (n.max(1), true),
            RetentionPolicy::KeepLastN(n) => (n.max(1), false),
        };
        if self.kept.len() <= limit {
            return Vec::new();
        }

        let mut ranked: Vec<usize> = (0..self.kept.len()).collect();
        if by_loss {
            // Best first; equal losses favour the newer file.
            ranked.sort_by(|&a, &b| {
                self.kept[a]
                    .loss
                    .total_cmp(&self.kept[b].loss)
                    .then(self.kept[b].epoch.cmp(&self.kept[a].epoch))
            });
        } else {
            ranked.sort_by(|&a, &b| self.kept[b].epoch.cmp(&self.kept[a].epoch));
        }
        let mut keep = vec![false; self.kept.len()];
        for &i in ranked.iter().take(limit) {
            keep[i] = true;
        }

        let mut evicted = Vec::new();
        let mut retained = Vec::with_capacity(limit);
        for (checkpoint, keep) in self.kept.drain(..).zip(keep) {
            if keep {
                retained.push(checkpoint);
            } else {
                evicted.push(checkpoint.path);
            }
        }
        self.kept = retained;
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(epoch: usize, loss: f32) -> Checkpoint {
        Checkpoint {
            epoch,
            loss,
            path: checkpoint_path(Path::new("ckpt"), epoch, loss),
        }
    }

    #[test]
    fn names_pad_epoch_and_round_loss() {
        assert_eq!(checkpoint_stem(1, 4.567891), "weights-improvement-01-4.5679-bigger");
        assert_eq!(checkpoint_stem(123, 0.5), "weights-improvement-123-0.5000-bigger");
        assert_eq!(
            checkpoint_path(Path::new("out"), 7, 3.25),
            PathBuf::from("out/weights-improvement-07-3.2500-bigger.mpk")
        );
    }

    #[test]
    fn only_strict_improvements_count() {
        let mut tracker = CheckpointTracker::new(RetentionPolicy::KeepAll);
        assert!(!tracker.improves(f32::NAN));
        assert!(tracker.improves(5.0));
        tracker.record(checkpoint(1, 5.0));
        assert!(!tracker.improves(5.0));
        assert!(!tracker.improves(6.0));
        assert!(!tracker.improves(f32::NAN));
        assert!(tracker.improves(4.9));
        assert_eq!(tracker.best_loss(), Some(5.0));
    }

    #[test]
    fn keep_all_never_evicts() {
        let mut tracker = CheckpointTracker::new(RetentionPolicy::KeepAll);
        for (epoch, loss) in [(1, 5.0), (2, 4.0), (4, 3.0)] {
            assert!(tracker.record(checkpoint(epoch, loss)).is_empty());
        }
        assert_eq!(tracker.kept().len(), 3);
    }

    #[test]
    fn keep_last_evicts_oldest() {
        let mut tracker = CheckpointTracker::new(RetentionPolicy::KeepLastN(2));
        assert!(tracker.record(checkpoint(1, 5.0)).is_empty());
        assert!(tracker.record(checkpoint(2, 4.0)).is_empty());
        let evicted = tracker.record(checkpoint(5, 3.0));
        assert_eq!(evicted, vec![checkpoint(1, 5.0).path]);
        let epochs: Vec<usize> = tracker.kept().iter().map(|c| c.epoch).collect();
        assert_eq!(epochs, vec![2, 5]);
    }

    #[test]
    fn keep_best_evicts_highest_loss() {
        // Losses recorded out of order, as when a tracker is fed from a resumed run.
        let mut tracker = CheckpointTracker::new(RetentionPolicy::KeepBestN(2));
        tracker.record(checkpoint(1, 3.0));
        tracker.record(checkpoint(2, 5.0));
        let evicted = tracker.record(checkpoint(3, 4.0));
        assert_eq!(evicted, vec![checkpoint(2, 5.0).path]);
        let epochs: Vec<usize> = tracker.kept().iter().map(|c| c.epoch).collect();
        assert_eq!(epochs, vec![1, 3]);
        assert_eq!(tracker.best_loss(), Some(3.0));
    }

    #[test]
    fn zero_count_still_keeps_newest() {
        let mut tracker = CheckpointTracker::new(RetentionPolicy::KeepLastN(0));
        tracker.record(checkpoint(1, 2.0));
        let evicted = tracker.record(checkpoint(2, 1.0));
        assert_eq!(evicted.len(), 1);
        assert_eq!(tracker.kept()[0].epoch, 2);
    }
}
