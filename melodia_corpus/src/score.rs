// In-memory score decoded from a Standard MIDI File.
//
// Each SMF track becomes a `ScoreTrack` holding paired notes (onset and
// duration in ticks, key, channel, the program active on that channel at the
// onset), program changes, and the handful of meta events a notation reader
// would surface as score objects (tempo, time and key signatures, track
// names). Everything else in the file (sysex, controllers, end-of-track) is
// dropped.
//
// Note pairing: a NoteOn with velocity 0 counts as a NoteOff. Overlapping
// notes on the same key and channel close first-in first-out. Notes still
// sounding at the end of a track are closed at the track's last tick.
//
// Uses the `midly` crate for decoding.

use crate::error::{CorpusError, Result};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

/// MIDI channel 10 (index 9) is reserved for percussion in General MIDI.
pub const PERCUSSION_CHANNEL: u8 = 9;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedNote {
    pub onset: u64,
    pub duration: u64,
    pub key: u8,
    pub channel: u8,
    /// Program active on `channel` at `onset`, if any program change preceded it.
    pub program: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramChange {
    pub onset: u64,
    pub channel: u8,
    pub program: u8,
}

/// A non-note score object. Ingestion logs and skips these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtherElement {
    pub onset: u64,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct ScoreTrack {
    pub index: usize,
    pub notes: Vec<TimedNote>,
    pub program_changes: Vec<ProgramChange>,
    pub others: Vec<OtherElement>,
}

#[derive(Clone, Debug, Default)]
pub struct Score {
    pub tracks: Vec<ScoreTrack>,
}

impl Score {
    /// Read and decode a MIDI file.
    pub fn load(path: &Path) -> Result<Score> {
        let bytes = std::fs::read(path).map_err(|e| CorpusError::io(path, e))?;
        let smf = Smf::parse(&bytes).map_err(|source| CorpusError::MidiParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Score::from_smf(&smf))
    }

    pub fn from_smf(smf: &Smf<'_>) -> Score {
        let tracks = smf
            .tracks
            .iter()
            .enumerate()
            .map(|(index, events)| decode_track(index, events))
            .collect();
        Score { tracks }
    }

    /// Whether any track assigns an instrument through a program change.
    pub fn has_instruments(&self) -> bool {
        self.tracks.iter().any(|t| !t.program_changes.is_empty())
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

fn decode_track(index: usize, events: &[midly::TrackEvent<'_>]) -> ScoreTrack {
    let mut track = ScoreTrack {
        index,
        ..Default::default()
    };
    let mut tick: u64 = 0;
    let mut programs: [Option<u8>; 16] = [None; 16];
    // (channel, key) -> onsets of notes still sounding, oldest first.
    let mut sounding: BTreeMap<(u8, u8), VecDeque<(u64, Option<u8>)>> = BTreeMap::new();

    for event in events {
        tick += u64::from(event.delta.as_int());
        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        sounding
                            .entry((channel, key.as_int()))
                            .or_default()
                            .push_back((tick, programs[usize::from(channel)]));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        if let Some((onset, program)) = sounding
                            .get_mut(&(channel, key))
                            .and_then(VecDeque::pop_front)
                        {
                            track.notes.push(TimedNote {
                                onset,
                                duration: tick - onset,
                                key,
                                channel,
                                program,
                            });
                        }
                    }
                    MidiMessage::ProgramChange { program } => {
                        programs[usize::from(channel)] = Some(program.as_int());
                        track.program_changes.push(ProgramChange {
                            onset: tick,
                            channel,
                            program: program.as_int(),
                        });
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(meta) => {
                if let Some(description) = describe_meta(&meta) {
                    track.others.push(OtherElement {
                        onset: tick,
                        description,
                    });
                }
            }
            TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => {}
        }
    }

    for ((channel, key), onsets) in sounding {
        for (onset, program) in onsets {
            track.notes.push(TimedNote {
                onset,
                duration: tick - onset,
                key,
                channel,
                program,
            });
        }
    }

    track.notes.sort_by_key(|n| (n.onset, n.key));
    track
}

fn describe_meta(meta: &MetaMessage<'_>) -> Option<String> {
    match meta {
        MetaMessage::Tempo(us_per_quarter) => {
            let bpm = 60_000_000.0 / f64::from(us_per_quarter.as_int().max(1));
            Some(format!("MetronomeMark {bpm:.1} bpm"))
        }
        MetaMessage::TimeSignature(numerator, denominator_pow, _, _) => Some(format!(
            "TimeSignature {numerator}/{}",
            1u32 << u32::from(*denominator_pow).min(31)
        )),
        MetaMessage::KeySignature(sharps, minor) => Some(format!(
            "KeySignature {sharps} {}",
            if *minor { "minor" } else { "major" }
        )),
        MetaMessage::TrackName(name) => {
            Some(format!("TrackName {}", String::from_utf8_lossy(name)))
        }
        _ => None,
    }
}
