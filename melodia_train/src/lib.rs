// Melodia trainer: stacked-LSTM next-symbol model over MIDI note/chord corpora.
//
// - config.rs: `TrainingConfig` (paths, hyperparameters, retention policy)
// - pipeline.rs: ingestion, corpus/vocabulary persistence, histogram, windows
// - model.rs: `ModelConfig` and the `MusicLstm` network, cross-entropy loss
// - batch.rs: tensor batches from a `TrainingSet`
// - checkpoint.rs: checkpoint file naming and retention bookkeeping
// - train.rs: the epoch loop, validation loss, loss history and chart
//
// The crate is generic over burn backends; the `train` binary runs on
// `Autodiff<NdArray>` on the CPU.

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod train;

pub use config::{RetentionPolicy, TrainingConfig};
pub use error::{Result, TrainError};
pub use model::{ModelConfig, MusicLstm};
pub use pipeline::{Prepared, prepare};
pub use train::{TrainingReport, train};
