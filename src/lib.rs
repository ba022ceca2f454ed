// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pedal steel guitar copedent modelling.
//!
//! [`copedent`] describes an instrument: open strings plus the pedals,
//! knee levers and mechanisms that bend them. [`engine`] answers questions
//! about it: where a chord can be played, what a fret and set of controls
//! sounds like, and where a scale lies.

pub mod config;
pub mod copedent;
pub mod engine;
pub mod music;

pub use config::{CopedentLibrary, SearchSettings};
pub use copedent::{presets, Copedent, CopedentError};
pub use engine::{
    decipher, find_chord_voicings, find_scale_on_fretboard, ChordQuery, EngineError, Voicing,
    VoicingCache,
};
