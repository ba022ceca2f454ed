// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities.
//!
//! Note arithmetic, the named scale table, and chord qualities.

pub mod chord;
pub mod note;
pub mod scale;

pub use chord::ChordType;
pub use note::{
    is_valid_note, normalize_note, note_at_offset, note_to_frequency, parse_pitch_class,
    semitones_between, Note, NoteError, PitchClass, Semitones, Spelling, MAX_OCTAVE, MIN_OCTAVE,
};
pub use scale::{find_scales_for_chord, Scale, ScaleType};
