// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Where a scale lies on the neck for a fixed set of engaged controls.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_searchable, string_bends, ControlCombo, EngineError};
use crate::copedent::{Copedent, StringId};
use crate::music::{parse_pitch_class, Note, PitchClass, Scale, ScaleType, Spelling};

/// Coarse role of a scale tone relative to the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalRole {
    Root,
    Third,
    Fifth,
    Other,
}

impl IntervalRole {
    pub fn from_semitones(semitones: u8) -> Self {
        match semitones % 12 {
            0 => IntervalRole::Root,
            3 | 4 => IntervalRole::Third,
            7 => IntervalRole::Fifth,
            _ => IntervalRole::Other,
        }
    }
}

/// One playable scale tone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalePosition {
    pub fret: u8,
    pub string_id: StringId,
    pub note: Note,
    /// Spelled with flats or sharps to suit the root
    pub note_name: String,
    pub interval_name: IntervalRole,
    pub semitones_from_root: u8,
}

/// Accepts "E" as well as "E4"
fn parse_root(root: &str) -> Result<PitchClass, EngineError> {
    match Note::parse(root) {
        Ok(note) => Ok(note.pitch()),
        Err(_) => Ok(parse_pitch_class(root)?),
    }
}

/// Every (fret, string) in 0..=`max_fret` whose sounding note belongs to
/// `scale` on `root`, with the given controls engaged.
///
/// Ordered by fret, then string.
pub fn find_scale_on_fretboard(
    copedent: &Copedent,
    root: &str,
    scale: &str,
    pedals: &[impl AsRef<str>],
    levers: &[impl AsRef<str>],
    mechanisms: &[impl AsRef<str>],
    max_fret: u8,
) -> Result<Vec<ScalePosition>, EngineError> {
    ensure_searchable(copedent)?;
    let root = parse_root(root)?;
    let scale_type =
        ScaleType::from_str(scale).ok_or_else(|| EngineError::UnknownScale(scale.to_string()))?;
    let scale = Scale::new(root, scale_type);
    let combo = ControlCombo::from_ids(copedent, pedals, levers, mechanisms)?;
    let bends = string_bends(copedent, &combo);
    let spelling = Spelling::for_root(root);

    let mut positions = Vec::new();
    for fret in 0..=max_fret {
        for bend in &bends {
            let note = bend.at_fret(fret);
            if !scale.contains(note.pitch()) {
                continue;
            }
            let semitones_from_root = root.interval_to(note.pitch());
            positions.push(ScalePosition {
                fret,
                string_id: bend.string_id,
                note,
                note_name: note.spelled(spelling),
                interval_name: IntervalRole::from_semitones(semitones_from_root),
                semitones_from_root,
            });
        }
    }
    debug!(
        root = %root,
        scale = scale_type.name(),
        controls = ?combo.ids(),
        positions = positions.len(),
        "scale search finished"
    );
    Ok(positions)
}
