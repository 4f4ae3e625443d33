// Sliding-window training pairs.
//
// A corpus of L symbols and window length S yields L - S pairs: pair i is
// ids[i..i + S] followed by ids[i + S]. The set keeps the encoded corpus once
// and slices windows out of it on demand instead of copying every window.
//
// Network views:
// - normalized input: each id divided by vocab_size, shape (pairs, S, 1).
//   Every value is in [0, 1).
// - target: one-hot row of width vocab_size per pair.
// Both are materialized per batch of pair indices, which is what the trainer
// feeds to the tensor backend.

use crate::error::{CorpusError, Result};
use crate::symbol::Symbol;
use crate::vocab::Vocabulary;

/// Window length used when none is configured.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSet {
    ids: Vec<usize>,
    sequence_length: usize,
    vocab_size: usize,
}

/// Encode `corpus` and window it. Fails when no pair can be formed.
pub fn prepare_sequences(
    corpus: &[Symbol],
    vocab: &Vocabulary,
    sequence_length: usize,
) -> Result<TrainingSet> {
    let ids = vocab.encode(corpus)?;
    TrainingSet::from_ids(ids, sequence_length, vocab.len())
}

impl TrainingSet {
    pub fn from_ids(ids: Vec<usize>, sequence_length: usize, vocab_size: usize) -> Result<Self> {
        if sequence_length == 0 || ids.len() <= sequence_length {
            return Err(CorpusError::SequenceTooShort {
                corpus_len: ids.len(),
                sequence_length,
            });
        }
        if vocab_size == 0 {
            return Err(CorpusError::EmptyCorpus);
        }
        debug_assert!(ids.iter().all(|&id| id < vocab_size));
        Ok(TrainingSet {
            ids,
            sequence_length,
            vocab_size,
        })
    }

    /// Number of training pairs.
    pub fn len(&self) -> usize {
        self.ids.len() - self.sequence_length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn window(&self, pair: usize) -> &[usize] {
        &self.ids[pair..pair + self.sequence_length]
    }

    pub fn target(&self, pair: usize) -> usize {
        self.ids[pair + self.sequence_length]
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&[usize], usize)> + '_ {
        (0..self.len()).map(|i| (self.window(i), self.target(i)))
    }

    /// Shape of the full normalized input tensor.
    pub fn input_shape(&self) -> [usize; 3] {
        [self.len(), self.sequence_length, 1]
    }

    pub fn normalize(&self, id: usize) -> f32 {
        id as f32 / self.vocab_size as f32
    }

    /// Row-major normalized inputs for the given pairs, shape (n, S, 1).
    pub fn normalized_batch(&self, pairs: &[usize]) -> Vec<f32> {
        let mut out = Vec::with_capacity(pairs.len() * self.sequence_length);
        for &pair in pairs {
            out.extend(self.window(pair).iter().map(|&id| self.normalize(id)));
        }
        out
    }

    pub fn one_hot_row(&self, pair: usize) -> Vec<f32> {
        let mut row = vec![0.0; self.vocab_size];
        row[self.target(pair)] = 1.0;
        row
    }

    /// Row-major one-hot targets for the given pairs, shape (n, vocab_size).
    pub fn one_hot_batch(&self, pairs: &[usize]) -> Vec<f32> {
        let mut out = vec![0.0; pairs.len() * self.vocab_size];
        for (row, &pair) in pairs.iter().enumerate() {
            out[row * self.vocab_size + self.target(pair)] = 1.0;
        }
        out
    }

    /// Hold out the trailing `fraction` of pairs for validation, before any
    /// shuffling. Returns the set unchanged when the held-out share rounds to
    /// zero pairs.
    pub fn split_validation(self, fraction: f64) -> Result<(TrainingSet, Option<TrainingSet>)> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(CorpusError::InvalidSplit(fraction));
        }
        let total = self.len();
        let train_pairs = ((total as f64 * (1.0 - fraction)) as usize).max(1);
        if train_pairs >= total {
            return Ok((self, None));
        }
        let validation = TrainingSet {
            ids: self.ids[train_pairs..].to_vec(),
            sequence_length: self.sequence_length,
            vocab_size: self.vocab_size,
        };
        let mut train = self;
        train.ids.truncate(train_pairs + train.sequence_length);
        Ok((train, Some(validation)))
    }
}
