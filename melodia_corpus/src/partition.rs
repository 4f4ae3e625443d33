// Instrument partitioning of a decoded score.
//
// A file is classified into one of three outcomes, each handled by its own
// branch in ingestion:
// - `HasInstrumentParts(part)`: the score carries program changes and at
//   least one instrument actually plays. `part` is the first instrument to
//   sound, flattened to a time-ordered element list (instrument marker, the
//   meta elements of the tracks it plays on, and its notes/chords).
// - `Flat(score)`: no instrument metadata, or instruments that never play.
//   Callers walk `flat_elements`, which yields notes and chords only.
// - `ParseError(err)`: the file could not be read or decoded.
//
// Once a score has instrument metadata, channels that never received a
// program change play General MIDI program 0, and channel 10 is always
// percussion.
//
// Notes on the same track that start on the same tick are merged into one
// chord when they cover more than one distinct key.

use crate::error::CorpusError;
use crate::score::{PERCUSSION_CHANNEL, Score, TimedNote};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrument {
    Program(u8),
    Percussion,
}

impl Instrument {
    fn of(note: &TimedNote) -> Instrument {
        if note.channel == PERCUSSION_CHANNEL {
            Instrument::Percussion
        } else {
            Instrument::Program(note.program.unwrap_or(0))
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Program(p) => write!(f, "program {p}"),
            Instrument::Percussion => f.write_str("percussion"),
        }
    }
}

/// One musical event as seen by symbol extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    Note(u8),
    /// Distinct keys sounding together, ascending.
    Chord(Vec<u8>),
    Other(String),
}

#[derive(Clone, Debug)]
pub struct Part {
    pub instrument: Instrument,
    pub elements: Vec<Element>,
}

#[derive(Debug)]
pub enum ScoreStructure {
    HasInstrumentParts(Part),
    Flat(Score),
    ParseError(CorpusError),
}

/// Load `path` and classify its structure.
pub fn classify(path: &Path) -> ScoreStructure {
    match Score::load(path) {
        Ok(score) => structure_of(score),
        Err(err) => ScoreStructure::ParseError(err),
    }
}

pub fn structure_of(score: Score) -> ScoreStructure {
    if !score.has_instruments() {
        return ScoreStructure::Flat(score);
    }
    match first_part(&score) {
        Some(part) => ScoreStructure::HasInstrumentParts(part),
        None => ScoreStructure::Flat(score),
    }
}

/// Every instrument that plays at least one note, ordered by its first note
/// (tick, then track index).
pub fn instruments(score: &Score) -> Vec<Instrument> {
    let mut first_seen: BTreeMap<Instrument, (u64, usize)> = BTreeMap::new();
    for track in &score.tracks {
        for note in &track.notes {
            let at = (note.onset, track.index);
            first_seen
                .entry(Instrument::of(note))
                .and_modify(|seen| *seen = (*seen).min(at))
                .or_insert(at);
        }
    }
    let mut order: Vec<(Instrument, (u64, usize))> = first_seen.into_iter().collect();
    order.sort_by_key(|&(instrument, at)| (at, instrument));
    order.into_iter().map(|(instrument, _)| instrument).collect()
}

fn first_part(score: &Score) -> Option<Part> {
    let instrument = *instruments(score).first()?;
    Some(part_for(score, instrument))
}

/// Flatten one instrument's notes plus the score objects of the tracks it
/// plays on.
pub fn part_for(score: &Score, instrument: Instrument) -> Part {
    let mut timed: Vec<(u64, u8, usize, Element)> =
        vec![(0, 0, 0, Element::Other(format!("Instrument {instrument}")))];

    for track in &score.tracks {
        let notes: Vec<&TimedNote> = track
            .notes
            .iter()
            .filter(|n| Instrument::of(n) == instrument)
            .collect();
        if notes.is_empty() {
            continue;
        }
        timed.extend(
            track
                .others
                .iter()
                .map(|o| (o.onset, 1, track.index, Element::Other(o.description.clone()))),
        );
        timed.extend(
            group_onsets(notes)
                .map(|(onset, element)| (onset, 2, track.index, element)),
        );
    }

    timed.sort_by_key(|&(onset, rank, track, _)| (onset, rank, track));
    Part {
        instrument,
        elements: timed.into_iter().map(|(.., element)| element).collect(),
    }
}

/// Notes and chords of the whole score in time order, without any other
/// score objects.
pub fn flat_elements(score: &Score) -> Vec<Element> {
    let mut timed: Vec<(u64, usize, Element)> = Vec::new();
    for track in &score.tracks {
        timed.extend(
            group_onsets(track.notes.iter().collect())
                .map(|(onset, element)| (onset, track.index, element)),
        );
    }
    timed.sort_by_key(|&(onset, track, _)| (onset, track));
    timed.into_iter().map(|(.., element)| element).collect()
}

/// Merge notes sharing an onset into chords. Input notes come from a single
/// track.
fn group_onsets(notes: Vec<&TimedNote>) -> impl Iterator<Item = (u64, Element)> {
    let mut by_onset: BTreeMap<u64, Vec<u8>> = BTreeMap::new();
    for note in notes {
        by_onset.entry(note.onset).or_default().push(note.key);
    }
    by_onset.into_iter().map(|(onset, mut keys)| {
        keys.sort_unstable();
        keys.dedup();
        let element = if keys.len() == 1 {
            Element::Note(keys[0])
        } else {
            Element::Chord(keys)
        };
        (onset, element)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::tests::{Ev, smf, track};

    fn score(tracks: Vec<midly::Track<'static>>) -> Score {
        Score::from_smf(&smf(tracks))
    }

    #[test]
    fn no_program_changes_is_flat() {
        let s = score(vec![track(&[Ev::On(0, 0, 60), Ev::Off(10, 0, 60)])]);
        assert!(matches!(structure_of(s), ScoreStructure::Flat(_)));
    }

    #[test]
    fn instruments_that_never_play_are_flat() {
        let s = score(vec![track(&[Ev::Program(0, 0, 40)])]);
        assert!(matches!(structure_of(s), ScoreStructure::Flat(_)));
    }

    #[test]
    fn first_sounding_instrument_wins() {
        let violin = track(&[
            Ev::Program(0, 0, 40),
            Ev::On(480, 0, 76),
            Ev::Off(480, 0, 76),
        ]);
        let piano = track(&[
            Ev::Program(0, 1, 0),
            Ev::On(0, 1, 60),
            Ev::On(0, 1, 64),
            Ev::Off(480, 1, 60),
            Ev::Off(0, 1, 64),
        ]);
        let s = score(vec![violin, piano]);
        assert_eq!(
            instruments(&s),
            vec![Instrument::Program(0), Instrument::Program(40)]
        );
        match structure_of(s) {
            ScoreStructure::HasInstrumentParts(part) => {
                assert_eq!(part.instrument, Instrument::Program(0));
                assert_eq!(
                    part.elements,
                    vec![
                        Element::Other("Instrument program 0".into()),
                        Element::Chord(vec![60, 64]),
                    ]
                );
            }
            other => panic!("expected instrument parts, got {other:?}"),
        }
    }

    #[test]
    fn part_includes_meta_of_its_tracks() {
        let s = score(vec![track(&[
            Ev::Tempo(0, 500_000),
            Ev::Program(0, 0, 73),
            Ev::On(0, 0, 72),
            Ev::Off(240, 0, 72),
        ])]);
        let part = part_for(&s, Instrument::Program(73));
        assert_eq!(part.elements.len(), 3);
        assert_eq!(part.elements[1], Element::Other("MetronomeMark 120.0 bpm".into()));
        assert_eq!(part.elements[2], Element::Note(72));
    }

    #[test]
    fn percussion_channel_is_its_own_instrument() {
        let s = score(vec![track(&[
            Ev::Program(0, 0, 0),
            Ev::On(0, 9, 36),
            Ev::Off(10, 9, 36),
            Ev::On(0, 0, 60),
            Ev::Off(10, 0, 60),
        ])]);
        assert_eq!(
            instruments(&s),
            vec![Instrument::Percussion, Instrument::Program(0)]
        );
    }

    #[test]
    fn flat_elements_skip_meta_and_merge_chords() {
        let s = score(vec![
            track(&[
                Ev::Tempo(0, 400_000),
                Ev::On(0, 0, 60),
                Ev::On(0, 0, 67),
                Ev::Off(100, 0, 60),
                Ev::Off(0, 0, 67),
                Ev::On(0, 0, 62),
                Ev::Off(100, 0, 62),
            ]),
            track(&[Ev::On(50, 2, 48), Ev::Off(10, 2, 48)]),
        ]);
        assert_eq!(
            flat_elements(&s),
            vec![
                Element::Chord(vec![60, 67]),
                Element::Note(48),
                Element::Note(62),
            ]
        );
    }

    #[test]
    fn classify_reports_missing_file_as_parse_error() {
        let path = std::env::temp_dir().join("melodia_definitely_missing.mid");
        assert!(matches!(classify(&path), ScoreStructure::ParseError(_)));
    }
}
