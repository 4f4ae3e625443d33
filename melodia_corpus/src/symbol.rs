// Vocabulary units: single-pitch and chord symbols.
//
// A note's symbol is its pitch name with octave, spelled the way notation
// software spells MIDI keys (sharps for C#/F#/G#, flats written with '-' for
// E-/B-). A chord's symbol is the dot-joined normal order of its pitch
// classes, which makes it invariant to octave, doubling and voicing.
//
// Symbols compare by their string, so the vocabulary's id order is plain
// lexicographic order ("0.4.7" < "11.2.6" < "A4" < "C#4").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pitch-class spellings indexed by `key % 12`.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "E-", "E", "F", "F#", "G", "G#", "A", "B-", "B",
];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Symbol for a single MIDI key, e.g. 60 -> "C4", 70 -> "B-4".
    pub fn note(key: u8) -> Self {
        Symbol(pitch_name(key))
    }

    /// Symbol for a chord given its MIDI keys in any order or octave.
    pub fn chord(keys: &[u8]) -> Self {
        let order = normal_order(keys.iter().map(|k| k % 12));
        let parts: Vec<String> = order.iter().map(|pc| pc.to_string()).collect();
        Symbol(parts.join("."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pitch name with octave for a MIDI key. Middle C (60) is "C4".
pub fn pitch_name(key: u8) -> String {
    let octave = i32::from(key / 12) - 1;
    format!("{}{}", PITCH_CLASS_NAMES[usize::from(key % 12)], octave)
}

/// Inverse of `pitch_name`, used to order chart bars by pitch height.
/// Returns `None` for chord symbols or anything else unparseable.
///
/// Names below octave 0 are ambiguous ("E-1" is both E in octave -1 and
/// E-flat in octave 1); the flat reading wins.
pub fn pitch_key(name: &str) -> Option<u8> {
    let (pc, octave) = PITCH_CLASS_NAMES
        .iter()
        .enumerate()
        .filter(|(_, class)| name.starts_with(**class))
        .max_by_key(|(_, class)| class.len())
        .map(|(pc, class)| (pc, &name[class.len()..]))?;
    let octave: i32 = octave.parse().ok()?;
    let key = (octave + 1) * 12 + pc as i32;
    u8::try_from(key).ok().filter(|k| *k < 128)
}

/// Rahn normal order of a pitch-class set.
///
/// Picks the rotation of the sorted, deduplicated set with the smallest span
/// from first to last element. Ties compare the interval from the first
/// element to the second-to-last, then third-to-last, and so on. Fully
/// symmetric sets fall back to the rotation starting on the lowest class.
pub fn normal_order(pitch_classes: impl IntoIterator<Item = u8>) -> Vec<u8> {
    let mut set: Vec<u8> = pitch_classes.into_iter().map(|pc| pc % 12).collect();
    set.sort_unstable();
    set.dedup();
    if set.len() <= 1 {
        return set;
    }

    let n = set.len();
    let rotation = |r: usize| -> Vec<u8> { set[r..].iter().chain(&set[..r]).copied().collect() };
    let packing = |rot: &[u8]| -> Vec<u8> {
        (1..n)
            .rev()
            .map(|k| (rot[k] + 12 - rot[0]) % 12)
            .collect()
    };

    let mut best = rotation(0);
    let mut best_packing = packing(&best);
    for r in 1..n {
        let candidate = rotation(r);
        let candidate_packing = packing(&candidate);
        if candidate_packing < best_packing {
            best = candidate;
            best_packing = candidate_packing;
        }
    }
    best
}
