// Melodia corpus preparation.
//
// Turns a directory of MIDI files into training data for the next-symbol
// LSTM in `melodia_train`:
//
// - symbol.rs: note and chord symbols (pitch names, chord normal order)
// - score.rs: SMF decoding into timed notes and score objects (midly)
// - partition.rs: instrument partitioning as a tagged result
// - ingest.rs: directory walk, symbol extraction, pitch histogram
// - vocab.rs: sorted symbol <-> id vocabulary
// - window.rs: sliding-window pairs, normalized inputs, one-hot targets
// - store.rs: corpus (bincode) and vocabulary (JSON) persistence
//
// Everything here is single-threaded and synchronous.

pub mod error;
pub mod ingest;
pub mod partition;
pub mod score;
pub mod store;
pub mod symbol;
pub mod vocab;
pub mod window;

pub use error::{CorpusError, Result};
pub use ingest::{Ingested, PitchHistogram, ingest_directory, pitch_histogram};
pub use symbol::Symbol;
pub use vocab::Vocabulary;
pub use window::{DEFAULT_SEQUENCE_LENGTH, TrainingSet, prepare_sequences};
