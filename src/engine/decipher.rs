// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Name the chords that sound at one fret with given controls engaged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_searchable, string_bends, ControlCombo, EngineError, IntervalSet};
use crate::copedent::{Copedent, StringId};
use crate::music::{ChordType, PitchClass, Spelling};

/// A chord found among the sounding strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordName {
    pub root: PitchClass,
    pub chord_type: ChordType,
    /// "E9", "Bbmaj7"
    pub name: String,
    /// Strings sounding a tone of this chord
    pub chord_tone_strings: Vec<StringId>,
}

/// Every chord whose tones are all sounding at `fret` under the given controls.
///
/// Roots are drawn from the sounding pitch classes. Larger chords come
/// first; ties go to the root found on the lower-numbered string and then
/// to chord table order.
pub fn decipher(
    copedent: &Copedent,
    fret: u8,
    pedals: &[impl AsRef<str>],
    levers: &[impl AsRef<str>],
    mechanisms: &[impl AsRef<str>],
) -> Result<Vec<ChordName>, EngineError> {
    ensure_searchable(copedent)?;
    let combo = ControlCombo::from_ids(copedent, pedals, levers, mechanisms)?;
    let sounding: Vec<(StringId, PitchClass)> = string_bends(copedent, &combo)
        .iter()
        .map(|b| (b.string_id, b.pitch_class_at(fret)))
        .collect();

    let mut roots: Vec<PitchClass> = Vec::new();
    for &(_, pc) in &sounding {
        if !roots.contains(&pc) {
            roots.push(pc);
        }
    }

    let mut found: Vec<(usize, usize, usize, ChordName)> = Vec::new();
    for (root_order, &root) in roots.iter().enumerate() {
        let present = sounding
            .iter()
            .fold(IntervalSet::default(), |set, &(_, pc)| set.with(root.interval_to(pc)));
        for (table_order, &chord_type) in ChordType::ALL.iter().enumerate() {
            let wanted = IntervalSet::from_classes(chord_type.intervals());
            if !wanted.is_subset_of(present) {
                continue;
            }
            let chord_tone_strings = sounding
                .iter()
                .filter(|&&(_, pc)| wanted.contains(root.interval_to(pc)))
                .map(|&(id, _)| id)
                .collect();
            let name = format!(
                "{}{}",
                root.spelled(Spelling::for_root(root)),
                chord_type.symbol()
            );
            found.push((
                wanted.len(),
                root_order,
                table_order,
                ChordName {
                    root,
                    chord_type,
                    name,
                    chord_tone_strings,
                },
            ));
        }
    }

    found.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    debug!(fret, controls = ?combo.ids(), chords = found.len(), "deciphered chords");
    Ok(found.into_iter().map(|(_, _, _, chord)| chord).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copedent::presets;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_open_e9() {
        let c = presets::emmons_e9().unwrap();
        let chords = decipher(&c, 0, &NONE, &NONE, &NONE).unwrap();
        assert_eq!(chords[0].name, "E9");
        assert_eq!(chords[0].chord_type, ChordType::Dominant9);
        assert_eq!(chords[0].chord_tone_strings, vec![1, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(chords[1].name, "Emaj9");
        assert!(chords.iter().any(|c| c.name == "E"));
    }

    #[test]
    fn test_a_and_b_pedals() {
        let c = presets::emmons_e9().unwrap();
        let chords = decipher(&c, 0, &["P1", "P2"], &NONE, &NONE).unwrap();
        let names: Vec<&str> = chords.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"A"));
        assert!(names.contains(&"A6"));
        assert!(chords.windows(2).all(|w| {
            w[0].chord_type.intervals().len() >= w[1].chord_type.intervals().len()
        }));
    }

    #[test]
    fn test_transposes_with_fret() {
        let c = presets::emmons_e9().unwrap();
        let chords = decipher(&c, 3, &NONE, &NONE, &NONE).unwrap();
        assert_eq!(chords[0].name, "G9");
    }

    #[test]
    fn test_rejects_invalid_controls() {
        let c = presets::emmons_e9().unwrap();
        assert!(matches!(
            decipher(&c, 0, &NONE, &["LKL", "LKR"], &NONE),
            Err(EngineError::InvalidCombination(_))
        ));
    }

    #[test]
    fn test_every_table_chord_keeps_all_its_tones() {
        for chord in ChordType::ALL {
            let set = IntervalSet::from_classes(chord.intervals());
            assert_eq!(set.len(), chord.intervals().len(), "{chord:?}");
            assert_eq!(IntervalSet::from_intervals(chord.intervals()), Ok(set));
        }
    }
}
