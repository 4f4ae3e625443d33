// Data preparation for a training run.
//
// Runs everything before the first gradient step: ingest the MIDI
// directory, persist the raw corpus and the vocabulary, draw the pitch
// histogram of the training corpus, and cut the encoded corpus into
// windows (optionally splitting off a validation tail). The returned
// `Prepared` holds what the training loop and model construction need.

use crate::config::TrainingConfig;
use crate::error::{Result, TrainError};
use melodia_charts::render_pitch_histogram;
use melodia_corpus::store::{save_corpus, save_vocabulary};
use melodia_corpus::{CorpusError, TrainingSet, Vocabulary, ingest_directory, prepare_sequences};
use melodia_prng::TrainRng;
use std::path::Path;
use tracing::info;

pub struct Prepared {
    pub vocabulary: Vocabulary,
    pub train_set: TrainingSet,
    pub validation: Option<TrainingSet>,
    pub files: usize,
    pub corpus_len: usize,
}

pub fn prepare(config: &TrainingConfig) -> Result<Prepared> {
    config.validate()?;

    let ingested = ingest_directory(&config.midi_dir, &config.pattern)?;
    if ingested.corpus.is_empty() {
        return Err(CorpusError::EmptyCorpus.into());
    }

    save_corpus(&ingested.corpus, &config.corpus_path)?;

    // Bar colours draw from a fork so the histogram never shifts training.
    let mut chart_rng = TrainRng::new(config.seed).fork();
    ensure_parent(&config.histogram_plot_path)?;
    render_pitch_histogram(
        &ingested.histogram,
        config.histogram_threshold,
        &config.histogram_plot_path,
        &mut chart_rng,
    )?;

    let vocabulary = Vocabulary::build(&ingested.corpus)?;
    save_vocabulary(&vocabulary, &config.vocabulary_path)?;
    info!(size = vocabulary.len(), "vocabulary built");

    let sequences = prepare_sequences(&ingested.corpus, &vocabulary, config.sequence_length)?;
    let (train_set, validation) = sequences.split_validation(config.validation_split)?;

    Ok(Prepared {
        vocabulary,
        train_set,
        validation,
        files: ingested.files.len(),
        corpus_len: ingested.corpus.len(),
    })
}

/// Create the parent directories of an output file.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|source| TrainError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}
