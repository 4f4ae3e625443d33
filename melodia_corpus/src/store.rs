// Persistence for the corpus and vocabulary.
//
// The corpus is written as a bincode blob (`data/notes` by default) so later
// sessions can skip MIDI parsing. The vocabulary is written as a JSON array
// of symbols in id order, readable by anything that needs to decode model
// outputs.

use crate::error::{CorpusError, Result};
use crate::symbol::Symbol;
use crate::vocab::Vocabulary;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn save_corpus(corpus: &[Symbol], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    bincode::serialize_into(&mut writer, corpus)?;
    writer.flush().map_err(|e| CorpusError::io(path, e))
}

pub fn load_corpus(path: &Path) -> Result<Vec<Symbol>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

pub fn save_vocabulary(vocab: &Vocabulary, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, vocab)?;
    writer.flush().map_err(|e| CorpusError::io(path, e))
}

pub fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let data = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    Ok(serde_json::from_str(&data)?)
}

/// Create `path`, making its parent directories first.
fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
    }
    File::create(path).map_err(|e| CorpusError::io(path, e))
}
