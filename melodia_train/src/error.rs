// Error type for a training run: corpus and chart failures pass through,
// checkpoint writes keep the path that failed.

use melodia_charts::ChartError;
use melodia_corpus::CorpusError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("failed to save checkpoint {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TrainError>;
