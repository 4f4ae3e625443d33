// MIDI directory ingestion.
//
// Enumerates files matching a glob-style pattern, classifies each one
// (partition.rs), and turns its elements into symbols: notes become pitch
// names, chords become normal-order strings, anything else is logged and
// skipped. Single-note pitch counts are accumulated into a `PitchHistogram`
// that is returned next to the corpus; training never reads it.
//
// A file that fails to decode aborts the whole batch. There is no partial
// corpus recovery.
//
// Enumeration order is whatever the filesystem returns. Nothing downstream
// may rely on it being sorted.

use crate::error::{CorpusError, Result};
use crate::partition::{Element, ScoreStructure, classify, flat_elements};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Occurrence counts of single-note pitch symbols.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchHistogram {
    counts: BTreeMap<Symbol, u64>,
}

impl PitchHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pitch: &Symbol) {
        *self.counts.entry(pitch.clone()).or_insert(0) += 1;
    }

    pub fn count(&self, pitch: &Symbol) -> u64 {
        self.counts.get(pitch).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, u64)> {
        self.counts.iter().map(|(s, c)| (s, *c))
    }

    /// Pitches occurring strictly more than `threshold` times.
    pub fn above(&self, threshold: u64) -> Vec<(&Symbol, u64)> {
        self.iter().filter(|&(_, c)| c > threshold).collect()
    }
}

/// Result of ingesting a MIDI directory.
#[derive(Clone, Debug, Default)]
pub struct Ingested {
    pub corpus: Vec<Symbol>,
    pub histogram: PitchHistogram,
    pub files: Vec<PathBuf>,
}

/// Ingest every file in `dir` whose name matches `pattern`.
pub fn ingest_directory(dir: &Path, pattern: &str) -> Result<Ingested> {
    let mut ingested = Ingested::default();
    for path in matching_files(dir, pattern)? {
        info!(file = %path.display(), "parsing");
        let elements = elements_of(&path)?;
        extract_symbols(&elements, &mut ingested.corpus, &mut ingested.histogram);
        ingested.files.push(path);
    }
    info!(
        files = ingested.files.len(),
        symbols = ingested.corpus.len(),
        "ingestion complete"
    );
    Ok(ingested)
}

/// Pitch counts only, for the diagnostic histogram.
pub fn pitch_histogram(dir: &Path, pattern: &str) -> Result<PitchHistogram> {
    let mut histogram = PitchHistogram::new();
    let mut discard = Vec::new();
    for path in matching_files(dir, pattern)? {
        info!(file = %path.display(), "counting pitches");
        let elements = elements_of(&path)?;
        extract_symbols(&elements, &mut discard, &mut histogram);
        discard.clear();
    }
    Ok(histogram)
}

/// Elements to walk for one file, following its classified structure.
fn elements_of(path: &Path) -> Result<Vec<Element>> {
    match classify(path) {
        ScoreStructure::HasInstrumentParts(part) => {
            debug!(instrument = %part.instrument, "using first instrument part");
            Ok(part.elements)
        }
        ScoreStructure::Flat(score) => {
            debug!(notes = score.note_count(), "no instrument parts, using flat notes");
            Ok(flat_elements(&score))
        }
        ScoreStructure::ParseError(err) => Err(err),
    }
}

/// Append the symbols of `elements` to `corpus`, counting single pitches.
pub fn extract_symbols(
    elements: &[Element],
    corpus: &mut Vec<Symbol>,
    histogram: &mut PitchHistogram,
) {
    for element in elements {
        match element {
            Element::Note(key) => {
                let symbol = Symbol::note(*key);
                histogram.record(&symbol);
                corpus.push(symbol);
            }
            Element::Chord(keys) => corpus.push(Symbol::chord(keys)),
            Element::Other(description) => {
                debug!(element = %description, "element neither chord nor note, skipping");
            }
        }
    }
}

/// Files in `dir` whose names match `pattern`, in directory order.
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CorpusError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matched = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| wildcard_match(pattern, name));
        if matched {
            files.push(path);
        }
    }
    Ok(files)
}

/// Glob-style match supporting `*` (any run) and `?` (any one char).
/// A leading '.' in `name` is only matched by a literal leading '.' in
/// `pattern`, so hidden files such as `._song.mid` are skipped.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    if name.starts_with('.') && !pattern.starts_with('.') {
        return false;
    }
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    // Position of the last '*' and the name index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ni));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ni = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}
