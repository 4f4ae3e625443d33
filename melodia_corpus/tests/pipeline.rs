// End-to-end corpus preparation on MIDI files written to a scratch directory.
//
// Writes small SMF files with midly (one with instrument parts, one flat,
// decoys with a non-matching extension or a hidden name), then runs
// ingestion, vocabulary building and windowing over the directory.

use std::path::{Path, PathBuf};

use melodia_corpus::ingest::matching_files;
use melodia_corpus::{
    CorpusError, Symbol, Vocabulary, ingest_directory, pitch_histogram, prepare_sequences,
};
use midly::num::{u4, u7, u15, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

/// Helper: build a track from (delta, channel, message) triples.
fn track(events: &[(u32, u8, MidiMessage)]) -> Track<'static> {
    let mut track: Track<'static> = events
        .iter()
        .map(|&(delta, channel, message)| TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        })
        .collect();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

fn on(key: u8) -> MidiMessage {
    MidiMessage::NoteOn {
        key: u7::new(key),
        vel: u7::new(90),
    }
}

fn off(key: u8) -> MidiMessage {
    MidiMessage::NoteOff {
        key: u7::new(key),
        vel: u7::new(0),
    }
}

fn program(p: u8) -> MidiMessage {
    MidiMessage::ProgramChange { program: u7::new(p) }
}

fn write_smf(path: &Path, tracks: Vec<Track<'static>>) {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(480)),
    ));
    smf.tracks = tracks;
    let mut buf = Vec::new();
    smf.write(&mut buf).unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("melodia_pipeline_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A melody on piano (program 0) plus a bass line on program 32 that starts
/// later. Only the piano part is extracted.
fn write_partitioned(dir: &Path) {
    let piano = track(&[
        (0, 0, program(0)),
        (0, 0, on(60)),
        (240, 0, off(60)),
        (0, 0, on(62)),
        (240, 0, off(62)),
        (0, 0, on(60)),
        (0, 0, on(64)),
        (0, 0, on(67)),
        (480, 0, off(60)),
        (0, 0, off(64)),
        (0, 0, off(67)),
        (0, 0, on(62)),
        (240, 0, off(62)),
    ]);
    let bass = track(&[(0, 1, program(32)), (240, 1, on(36)), (480, 1, off(36))]);
    write_smf(&dir.join("a_parts.mid"), vec![piano, bass]);
}

/// No program changes: a flat score. The chord here is an inversion of the
/// piano chord above in a different octave.
fn write_flat(dir: &Path) {
    let t = track(&[
        (0, 0, on(76)),
        (0, 0, on(79)),
        (0, 0, on(84)),
        (480, 0, off(76)),
        (0, 0, off(79)),
        (0, 0, off(84)),
        (0, 0, on(60)),
        (240, 0, off(60)),
    ]);
    write_smf(&dir.join("b_flat.mid"), vec![t]);
}

fn corpus_of(dir: &Path) -> Vec<Symbol> {
    let ingested = ingest_directory(dir, "*.mid").unwrap();
    assert_eq!(ingested.files.len(), 2);
    ingested.corpus
}

#[test]
fn ingests_both_structures() {
    let dir = scratch_dir("both");
    write_partitioned(&dir);
    write_flat(&dir);
    std::fs::write(dir.join("notes.txt"), b"not midi").unwrap();

    let ingested = ingest_directory(&dir, "*.mid").unwrap();
    assert_eq!(ingested.files.len(), 2);

    // Directory order is unspecified; compare the per-file runs as a set.
    let parts: Vec<&str> = ["C4", "D4", "0.4.7", "D4"].to_vec();
    let flat: Vec<&str> = ["0.4.7", "C4"].to_vec();
    let names: Vec<&str> = ingested.corpus.iter().map(Symbol::as_str).collect();
    assert!(
        names == [parts.clone(), flat.clone()].concat() || names == [flat, parts].concat(),
        "unexpected corpus {names:?}"
    );

    assert_eq!(ingested.histogram.count(&Symbol::from("C4")), 2);
    assert_eq!(ingested.histogram.count(&Symbol::from("D4")), 2);
    assert_eq!(ingested.histogram.count(&Symbol::from("C2")), 0);
    assert_eq!(ingested.histogram.total(), 4);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corpus_to_training_pairs() {
    let dir = scratch_dir("pairs");
    write_partitioned(&dir);
    write_flat(&dir);

    let corpus = corpus_of(&dir);
    let vocab = Vocabulary::build(&corpus).unwrap();
    assert_eq!(
        vocab.symbols(),
        &[Symbol::from("0.4.7"), Symbol::from("C4"), Symbol::from("D4")]
    );

    let set = prepare_sequences(&corpus, &vocab, 2).unwrap();
    assert_eq!(set.len(), corpus.len() - 2);
    for (i, (window, target)) in set.pairs().enumerate() {
        assert_eq!(window.len(), 2);
        assert_eq!(vocab.symbol(target), Some(&corpus[i + 2]));
    }

    let err = prepare_sequences(&corpus, &vocab, 100).unwrap_err();
    assert!(matches!(err, CorpusError::SequenceTooShort { corpus_len: 6, .. }));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn histogram_only_pass_matches_ingestion() {
    let dir = scratch_dir("histogram");
    write_partitioned(&dir);
    write_flat(&dir);

    let histogram = pitch_histogram(&dir, "*.mid").unwrap();
    let ingested = ingest_directory(&dir, "*.mid").unwrap();
    assert_eq!(histogram, ingested.histogram);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_file_aborts_the_batch() {
    let dir = scratch_dir("corrupt");
    write_partitioned(&dir);
    std::fs::write(dir.join("broken.mid"), b"this is not a midi file").unwrap();

    let err = ingest_directory(&dir, "*.mid").unwrap_err();
    match err {
        CorpusError::MidiParse { path, .. } => assert!(path.ends_with("broken.mid")),
        other => panic!("expected MidiParse, got {other}"),
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn hidden_files_are_not_ingested() {
    let dir = scratch_dir("hidden");
    write_partitioned(&dir);
    // AppleDouble metadata left next to a song by macOS copies.
    std::fs::write(dir.join("._a_parts.mid"), b"\x00\x05\x16\x07\x00\x02\x00\x00Mac OS X").unwrap();

    let files = matching_files(&dir, "*.mid").unwrap();
    assert_eq!(files, vec![dir.join("a_parts.mid")]);

    let ingested = ingest_directory(&dir, "*.mid").unwrap();
    assert_eq!(ingested.files, vec![dir.join("a_parts.mid")]);
    let names: Vec<&str> = ingested.corpus.iter().map(Symbol::as_str).collect();
    assert_eq!(names, vec!["C4", "D4", "0.4.7", "D4"]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_directory_yields_empty_corpus() {
    let dir = scratch_dir("empty");
    let ingested = ingest_directory(&dir, "*.mid").unwrap();
    assert!(ingested.corpus.is_empty());
    assert!(matches!(
        Vocabulary::build(&ingested.corpus),
        Err(CorpusError::EmptyCorpus)
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}
