// Error type for corpus extraction, encoding and persistence.
//
// A parse failure on any MIDI file is fatal for the whole ingestion batch;
// callers get the offending path back. Shape errors (`EmptyCorpus`,
// `SequenceTooShort`) are raised before anything reaches the trainer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse MIDI file {path}: {source}")]
    MidiParse {
        path: PathBuf,
        #[source]
        source: midly::Error,
    },

    #[error("corpus is empty: no notes or chords were extracted")]
    EmptyCorpus,

    #[error(
        "corpus of {corpus_len} symbols is too short for sequence length {sequence_length}"
    )]
    SequenceTooShort {
        corpus_len: usize,
        sequence_length: usize,
    },

    #[error("validation split {0} must be in [0, 1)")]
    InvalidSplit(f64),

    #[error("symbol {0:?} is not in the vocabulary")]
    UnknownSymbol(String),

    #[error("corpus serialization failed: {0}")]
    Persist(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
