// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord and scale lookup over a copedent.
//!
//! Everything here is a pure function of its inputs except [`cache`],
//! which owns keyed storage. The one piece of pitch logic shared by every
//! entry point is [`string_bend`]: open note plus fret plus the engaged
//! controls' deltas, with `include` splits replacing their pair's sum.

pub mod cache;
pub mod decipher;
pub mod enumerator;
pub mod fretboard;

pub use cache::{CacheStats, VoicingCache};
pub use decipher::{decipher, ChordName};
pub use enumerator::{control_combinations, find_chord_voicings};
pub use fretboard::{find_scale_on_fretboard, IntervalRole, ScalePosition};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::copedent::{
    is_full_combination_valid, AnyControl, Control, Copedent, CopedentError, KneeLever,
    Mechanism, Pedal, SplitResolution, SteelString, StringId,
};
use crate::music::{Note, NoteError, PitchClass, Semitones};

/// Errors raised by the search entry points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Copedent(#[from] CopedentError),

    #[error("Target interval set is empty")]
    EmptyIntervals,

    #[error("Interval {0} is outside 0-11")]
    IntervalOutOfRange(u8),

    #[error(
        "Split on string {string_id} between {first} and {second} must be resolved before searching"
    )]
    UnresolvedSplit {
        string_id: StringId,
        first: String,
        second: String,
    },

    #[error("{0}")]
    InvalidCombination(String),

    #[error("Unknown scale: {0}")]
    UnknownScale(String),

    #[error("Search cancelled at fret {0}")]
    Cancelled(u8),
}

/// Fail unless every split has been resolved
pub fn ensure_searchable(copedent: &Copedent) -> Result<(), EngineError> {
    copedent.ensure_resolved().map_err(|e| match e {
        CopedentError::UnresolvedSplit {
            string_id,
            first,
            second,
        } => EngineError::UnresolvedSplit {
            string_id,
            first,
            second,
        },
        other => EngineError::Copedent(other),
    })
}

/// Set of interval classes (0-11) from a root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntervalSet(u16);

impl IntervalSet {
    /// Build from a slice; every value must be below 12
    pub fn from_intervals(intervals: &[u8]) -> Result<Self, EngineError> {
        intervals.iter().try_fold(IntervalSet(0), |set, &i| {
            if i >= 12 {
                Err(EngineError::IntervalOutOfRange(i))
            } else {
                Ok(set.with(i))
            }
        })
    }

    /// Build from values taken modulo 12
    pub fn from_classes(classes: &[u8]) -> Self {
        classes.iter().fold(IntervalSet(0), |set, &i| set.with(i))
    }

    pub fn with(self, interval: u8) -> Self {
        IntervalSet(self.0 | 1 << (interval % 12))
    }

    pub fn contains(self, interval: u8) -> bool {
        interval < 12 && self.0 & (1 << interval) != 0
    }

    pub fn is_subset_of(self, other: IntervalSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Ascending interval classes
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..12u8).filter(move |&i| self.contains(i))
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.iter().collect()
    }

    /// Every member moved up by `semitones`, modulo 12
    pub fn transposed(self, semitones: Semitones) -> Self {
        let n = semitones.rem_euclid(12) as u32;
        let bits = u32::from(self.0);
        IntervalSet((((bits << n) | (bits >> (12 - n))) & 0xFFF) as u16)
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|i| i.to_string()).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}

/// A chord search request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChordQuery {
    pub root: Note,
    pub intervals: IntervalSet,
    /// Matches kept per fret; 0 keeps all
    pub results_per_fret: usize,
    /// Accepted for compatibility; the full control set is always searched
    pub use_full_copedent: bool,
}

impl ChordQuery {
    /// `root` must include an octave ("E4")
    pub fn new(root: &str, intervals: &[u8], results_per_fret: usize) -> Result<Self, EngineError> {
        let root = Note::parse(root)?;
        let intervals = IntervalSet::from_intervals(intervals)?;
        if intervals.is_empty() {
            return Err(EngineError::EmptyIntervals);
        }
        Ok(Self {
            root,
            intervals,
            results_per_fret,
            use_full_copedent: true,
        })
    }
}

/// Cooperative cancellation, checked once per fret
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A set of engaged controls
#[derive(Debug, Clone, Default)]
pub struct ControlCombo<'a> {
    pub pedals: Vec<&'a Pedal>,
    pub levers: Vec<&'a KneeLever>,
    pub mechanisms: Vec<&'a Mechanism>,
}

impl<'a> ControlCombo<'a> {
    /// Resolve ids against `copedent` after checking the combination is playable
    pub fn from_ids(
        copedent: &'a Copedent,
        pedals: &[impl AsRef<str>],
        levers: &[impl AsRef<str>],
        mechanisms: &[impl AsRef<str>],
    ) -> Result<Self, EngineError> {
        let check = is_full_combination_valid(pedals, levers, mechanisms, copedent);
        if !check.valid {
            return Err(EngineError::InvalidCombination(check.message));
        }
        // validation guarantees every id resolves
        Ok(Self {
            pedals: pedals.iter().filter_map(|id| copedent.pedal(id.as_ref())).collect(),
            levers: levers
                .iter()
                .filter_map(|id| copedent.knee_lever(id.as_ref()))
                .collect(),
            mechanisms: mechanisms
                .iter()
                .filter_map(|id| copedent.mechanism(id.as_ref()))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pedals.len() + self.levers.len() + self.mechanisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pedals, then levers, then mechanisms
    pub fn controls(&self) -> impl Iterator<Item = AnyControl<'a>> + '_ {
        self.pedals
            .iter()
            .map(|&p| AnyControl::Pedal(p))
            .chain(self.levers.iter().map(|&l| AnyControl::Lever(l)))
            .chain(self.mechanisms.iter().map(|&m| AnyControl::Mechanism(m)))
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.controls().map(|c| c.borrowed_id()).collect()
    }

    pub fn pedal_ids(&self) -> Vec<String> {
        self.pedals.iter().map(|p| p.id().to_string()).collect()
    }

    pub fn lever_ids(&self) -> Vec<String> {
        self.levers.iter().map(|l| l.id().to_string()).collect()
    }

    pub fn mechanism_ids(&self) -> Vec<String> {
        self.mechanisms.iter().map(|m| m.id().to_string()).collect()
    }
}

/// Net effect of a control combination on one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBend {
    pub string_id: StringId,
    pub open_note: Note,
    /// Semitones added to the fretted note
    pub offset: Semitones,
    /// Engaged controls that change this string
    pub active_controls: Vec<String>,
    pub overridden_by_split: bool,
}

impl StringBend {
    /// Sounding note with the bar at `fret`
    pub fn at_fret(&self, fret: u8) -> Note {
        self.open_note.offset(self.offset.saturating_add(fret as Semitones))
    }

    /// Sounding pitch class with the bar at `fret`
    pub fn pitch_class_at(&self, fret: u8) -> PitchClass {
        self.open_note.pitch().transpose(self.offset).transpose(fret as Semitones)
    }
}

/// Bend of `string` under `combo`.
///
/// Engaged controls' deltas are summed, except that each `include` split
/// whose two controls are both engaged replaces those two deltas with its
/// manual change. Other engaged controls still add on top. Splits are
/// applied in stored order and a control already used by one split is not
/// reused by another. Sums wrap, so the result does not depend on order.
pub fn string_bend(
    copedent: &Copedent,
    string: &SteelString,
    combo: &ControlCombo<'_>,
) -> StringBend {
    let engaged = combo.ids();
    let mut consumed: Vec<&str> = Vec::new();
    let mut offset: Semitones = 0;

    for split in copedent.splits().iter().filter(|s| {
        s.string_id == string.id
            && s.is_included_in_calculation == SplitResolution::Include
            && s.is_engaged_by(&engaged)
    }) {
        let [a, b] = &split.conflicting_controls;
        if consumed.contains(&a.id.as_str()) || consumed.contains(&b.id.as_str()) {
            continue;
        }
        consumed.push(&a.id);
        consumed.push(&b.id);
        offset = offset.wrapping_add(split.manual_semitone_change);
    }

    let mut active_controls = Vec::new();
    for control in combo.controls() {
        if let Some(delta) = control.change_for(string.id) {
            active_controls.push(control.id().to_string());
            if !consumed.contains(&control.borrowed_id()) {
                offset = offset.wrapping_add(delta);
            }
        }
    }

    StringBend {
        string_id: string.id,
        open_note: string.open_note,
        offset,
        active_controls,
        overridden_by_split: !consumed.is_empty(),
    }
}

/// Bends for every string of the copedent
pub fn string_bends(copedent: &Copedent, combo: &ControlCombo<'_>) -> Vec<StringBend> {
    copedent
        .strings()
        .iter()
        .map(|s| string_bend(copedent, s, combo))
        .collect()
}

/// One string's result within a voicing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteResult {
    pub string_id: StringId,
    pub original_note: Note,
    pub final_note: Note,
    pub semitones_from_root: u8,
    pub is_chord_tone: bool,
    pub is_played_in_voicing: bool,
    pub active_controls: Vec<String>,
    pub is_overridden_by_split: bool,
}

/// A fret plus engaged controls that produce a requested chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voicing {
    pub fret: u8,
    pub pedal_combo: Vec<String>,
    pub lever_combo: Vec<String>,
    pub mec_combo: Vec<String>,
    pub notes: Vec<NoteResult>,
}

impl Voicing {
    /// Strings that ring in the default playback mask
    pub fn played_strings(&self) -> impl Iterator<Item = StringId> + '_ {
        self.notes
            .iter()
            .filter(|n| n.is_played_in_voicing)
            .map(|n| n.string_id)
    }

    /// Engaged controls, pedals first
    pub fn controls(&self) -> impl Iterator<Item = &str> {
        self.pedal_combo
            .iter()
            .chain(&self.lever_combo)
            .chain(&self.mec_combo)
            .map(String::as_str)
    }
}
