// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch class and note arithmetic.
//!
//! Every computation downstream of this module works in signed semitone
//! space. Spelling is only a presentation concern, see [`Spelling`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semitone offset type
pub type Semitones = i32;

/// Errors raised while parsing note text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    /// Text did not match `<A-G><accidental?><octave>`
    #[error("Invalid note format: {0:?}")]
    InvalidNoteFormat(String),
}

/// The twelve canonical (sharp-spelled) pitch classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Get the pitch class index (0-11)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Get pitch class from any integer, wrapping modulo 12
    pub fn from_index(index: i32) -> Self {
        PitchClass::ALL[index.rem_euclid(12) as usize]
    }

    /// Transpose by semitones
    pub fn transpose(self, semitones: Semitones) -> Self {
        PitchClass::from_index(self.index() as i32 + semitones.rem_euclid(12))
    }

    /// Ascending interval in semitones to another pitch class (0-11)
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.index() as i32 - self.index() as i32).rem_euclid(12) as u8
    }

    /// Sharp spelling ("C#")
    pub fn sharp_name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Flat spelling ("Db")
    pub fn flat_name(self) -> &'static str {
        match self {
            PitchClass::Cs => "Db",
            PitchClass::Ds => "Eb",
            PitchClass::Fs => "Gb",
            PitchClass::Gs => "Ab",
            PitchClass::As => "Bb",
            natural => natural.sharp_name(),
        }
    }

    /// Name under the given spelling preference
    pub fn spelled(self, spelling: Spelling) -> &'static str {
        match spelling {
            Spelling::Sharps => self.sharp_name(),
            Spelling::Flats => self.flat_name(),
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}

/// Accidental preference used only when displaying notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spelling {
    #[default]
    Sharps,
    Flats,
}

impl Spelling {
    /// Conventional spelling for a chord or scale rooted on `root`
    pub fn for_root(root: PitchClass) -> Self {
        match root {
            PitchClass::F
            | PitchClass::As
            | PitchClass::Ds
            | PitchClass::Gs
            | PitchClass::Cs
            | PitchClass::Fs => Spelling::Flats,
            _ => Spelling::Sharps,
        }
    }
}

/// Lowest octave a [`Note`] can carry
pub const MIN_OCTAVE: i32 = -10;
/// Highest octave a [`Note`] can carry
pub const MAX_OCTAVE: i32 = 20;

const MIN_INDEX: i32 = 12 * MIN_OCTAVE;
const MAX_INDEX: i32 = 12 * MAX_OCTAVE + 11;

/// A pitch class plus an octave.
///
/// Equality is pitch equality: spelling is only kept as the canonical
/// sharp form, so `"Bb3"` and `"A#3"` parse to the same value. Octaves stay
/// within [`MIN_OCTAVE`]..=[`MAX_OCTAVE`]; arithmetic saturates at the ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    pitch: PitchClass,
    octave: i32,
}

impl Note {
    /// Create a note from a pitch class and octave, clamping the octave
    pub fn new(pitch: PitchClass, octave: i32) -> Self {
        Self {
            pitch,
            octave: octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
        }
    }

    /// Inverse of [`Note::semitone_index`], clamped to the octave range
    pub fn from_semitone_index(index: i32) -> Self {
        let index = index.clamp(MIN_INDEX, MAX_INDEX);
        Self {
            pitch: PitchClass::from_index(index),
            octave: index.div_euclid(12),
        }
    }

    /// Parse any accepted spelling into its canonical form
    pub fn parse(text: &str) -> Result<Self, NoteError> {
        let invalid = || NoteError::InvalidNoteFormat(text.to_string());
        let (pitch, octave_text) = parse_pitch_prefix(text.trim()).ok_or_else(invalid)?;

        if octave_text.is_empty() || octave_text.starts_with('+') {
            return Err(invalid());
        }
        let octave: i32 = octave_text.parse().map_err(|_| invalid())?;
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(invalid());
        }

        // Cb4 is B3 and B#3 is C4: carry out of the letter's octave.
        let index = pitch + 12 * octave;
        if !(MIN_INDEX..=MAX_INDEX).contains(&index) {
            return Err(invalid());
        }
        Ok(Note::from_semitone_index(index))
    }

    /// Pitch class of this note
    pub fn pitch(&self) -> PitchClass {
        self.pitch
    }

    /// Octave number
    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Absolute semitone index: pitch class + 12 * octave
    pub fn semitone_index(&self) -> i32 {
        self.pitch.index() as i32 + 12 * self.octave
    }

    /// The note `semitones` away, carrying octaves in both directions
    pub fn offset(&self, semitones: Semitones) -> Note {
        Note::from_semitone_index(self.semitone_index().saturating_add(semitones))
    }

    /// Signed distance `other - self`
    pub fn semitones_to(&self, other: &Note) -> Semitones {
        other.semitone_index() - self.semitone_index()
    }

    /// Equal-tempered frequency with A4 = 440 Hz
    pub fn frequency(&self) -> f64 {
        let a4 = Note::new(PitchClass::A, 4);
        440.0 * 2.0_f64.powf(a4.semitones_to(self) as f64 / 12.0)
    }

    /// Display with a spelling preference ("Bb3")
    pub fn spelled(&self, spelling: Spelling) -> String {
        format!("{}{}", self.pitch.spelled(spelling), self.octave)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch, self.octave)
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.semitone_index().cmp(&other.semitone_index())
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}

impl TryFrom<String> for Note {
    type Error = NoteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Note::parse(&value)
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.to_string()
    }
}

/// Parse a note and return its canonical sharp-spelled form
pub fn normalize_note(text: &str) -> Result<Note, NoteError> {
    Note::parse(text)
}

/// The note `semitones` away from `text`
pub fn note_at_offset(text: &str, semitones: Semitones) -> Result<Note, NoteError> {
    Ok(Note::parse(text)?.offset(semitones))
}

/// Signed distance `b - a` in semitones
pub fn semitones_between(a: &str, b: &str) -> Result<Semitones, NoteError> {
    Ok(Note::parse(a)?.semitones_to(&Note::parse(b)?))
}

/// Equal-tempered frequency of a note, A4 = 440 Hz
pub fn note_to_frequency(text: &str) -> Result<f64, NoteError> {
    Ok(Note::parse(text)?.frequency())
}

/// True iff `text` parses as a note
pub fn is_valid_note(text: &str) -> bool {
    Note::parse(text).is_ok()
}

/// Parse a bare pitch class ("Bb", "F#"), no octave
pub fn parse_pitch_class(text: &str) -> Result<PitchClass, NoteError> {
    match parse_pitch_prefix(text.trim()) {
        Some((pitch, "")) => Ok(PitchClass::from_index(pitch)),
        _ => Err(NoteError::InvalidNoteFormat(text.to_string())),
    }
}

/// Letter plus accidental, as a signed offset from C, and the remaining text
fn parse_pitch_prefix(text: &str) -> Option<(i32, &str)> {
    let mut chars = text.chars();
    let natural: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (alter, rest) = if let Some(r) = rest.strip_prefix("##") {
        (2, r)
    } else if let Some(r) = rest.strip_prefix("bb") {
        (-2, r)
    } else if let Some(r) = rest.strip_prefix('x') {
        (2, r)
    } else if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };
    Some((natural + alter, rest))
}
