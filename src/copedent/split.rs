// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Split detection.
//!
//! A split is a string bent by two controls that can be engaged together.
//! Their combined effect on that string is not always the sum of the two
//! deltas, so each split carries a user decision: use a manual change
//! (`include`), fall back to the sum (`exclude`), or still undecided
//! (`DEFINE`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combination::controls_combinable;
use super::control::{AnyControl, Control, ControlKind, KneeLever, Mechanism, Pedal};
use super::{MechanismCombinations, SteelString, StringId};
use crate::music::{Note, Semitones};

/// How a split takes part in pitch calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SplitResolution {
    /// Use `manual_semitone_change` for the pair
    #[serde(rename = "include")]
    Include,
    /// Use the naive sum of the two deltas
    #[serde(rename = "exclude")]
    Exclude,
    /// Not yet decided; the copedent cannot be used for searching
    #[default]
    #[serde(rename = "DEFINE")]
    Define,
}

/// A control named by a split
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControlKind,
}

impl ControlRef {
    fn of(control: &impl Control) -> Self {
        Self {
            id: control.id().to_string(),
            name: control.name().to_string(),
            kind: control.kind(),
        }
    }
}

/// Identity of a split: string plus the sorted control pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SplitKey {
    pub string_id: StringId,
    pub first: String,
    pub second: String,
}

impl SplitKey {
    pub fn new(string_id: StringId, a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            string_id,
            first: first.to_string(),
            second: second.to_string(),
        }
    }
}

/// Two combinable controls bending the same string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Split {
    pub string_id: StringId,
    pub open_note: Note,
    /// Sorted by control id
    pub conflicting_controls: [ControlRef; 2],
    /// Change relative to the fretted, unbent note when both are engaged
    pub manual_semitone_change: Semitones,
    #[serde(default)]
    pub is_included_in_calculation: SplitResolution,
}

impl Split {
    pub fn key(&self) -> SplitKey {
        SplitKey::new(
            self.string_id,
            &self.conflicting_controls[0].id,
            &self.conflicting_controls[1].id,
        )
    }

    /// Whether both controls of the pair are in `engaged`
    pub fn is_engaged_by(&self, engaged: &[&str]) -> bool {
        self.conflicting_controls
            .iter()
            .all(|c| engaged.contains(&c.id.as_str()))
    }

    /// Whether `id` is one of the pair
    pub fn involves(&self, id: &str) -> bool {
        self.conflicting_controls.iter().any(|c| c.id == id)
    }
}

/// Find every string bent by two combinable controls.
///
/// Inactive levers are ignored. Output is sorted by string then control
/// pair, so the result does not depend on the order controls are listed in.
pub fn detect_splits(
    strings: &[SteelString],
    pedals: &[Pedal],
    knee_levers: &[KneeLever],
    mechanisms: &[Mechanism],
    combinations: &MechanismCombinations,
) -> Vec<Split> {
    let controls: Vec<AnyControl<'_>> = pedals
        .iter()
        .map(AnyControl::Pedal)
        .chain(knee_levers.iter().filter(|l| l.active).map(AnyControl::Lever))
        .chain(mechanisms.iter().map(AnyControl::Mechanism))
        .collect();

    let mut splits: Vec<Split> = Vec::new();
    for string in strings {
        let affecting: Vec<(AnyControl<'_>, Semitones)> = controls
            .iter()
            .filter_map(|c| c.change_for(string.id).map(|delta| (*c, delta)))
            .collect();
        if affecting.len() < 2 {
            continue;
        }

        for (i, &(a, delta_a)) in affecting.iter().enumerate() {
            for &(b, delta_b) in &affecting[i + 1..] {
                if !controls_combinable(a, b, combinations) {
                    continue;
                }
                let (first, second) = if a.id() <= b.id() { (a, b) } else { (b, a) };
                splits.push(Split {
                    string_id: string.id,
                    open_note: string.open_note,
                    conflicting_controls: [ControlRef::of(&first), ControlRef::of(&second)],
                    manual_semitone_change: delta_a.wrapping_add(delta_b),
                    is_included_in_calculation: SplitResolution::Define,
                });
            }
        }
    }

    splits.sort_by_key(Split::key);
    splits.dedup_by_key(|s| s.key());
    splits
}

/// Carry user resolutions from `previous` into a fresh detection result.
///
/// Splits in `fresh` that were resolved before keep their resolution and
/// manual change; new ones stay `DEFINE`; splits missing from `fresh` are gone.
pub fn merge_splits(fresh: Vec<Split>, previous: &[Split]) -> Vec<Split> {
    let known: HashMap<SplitKey, &Split> = previous.iter().map(|s| (s.key(), s)).collect();
    let mut carried = 0usize;

    let merged: Vec<Split> = fresh
        .into_iter()
        .map(|mut split| {
            if let Some(old) = known.get(&split.key()) {
                split.is_included_in_calculation = old.is_included_in_calculation;
                split.manual_semitone_change = old.manual_semitone_change;
                carried += 1;
            }
            split
        })
        .collect();

    debug!(
        detected = merged.len(),
        carried,
        dropped = previous.len().saturating_sub(carried),
        "merged split resolutions"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn strings(notes: &[&str]) -> Vec<SteelString> {
        notes
            .iter()
            .zip(1..)
            .map(|(n, id)| SteelString {
                id,
                open_note: Note::parse(n).unwrap(),
            })
            .collect()
    }

    fn keys(splits: &[Split]) -> Vec<SplitKey> {
        splits.iter().map(Split::key).collect()
    }

    #[test]
    fn test_single_control_is_not_a_split() {
        let s = strings(&["E3", "G#3"]);
        let pedals = vec![Pedal::new("P1", "A").unwrap().with_change(1, 2)];
        let found = detect_splits(&s, &pedals, &[], &[], &MechanismCombinations::new());
        assert!(found.is_empty());
    }

    #[test]
    fn test_adjacent_pedals_split_with_summed_default() {
        let s = strings(&["E3", "G#3", "B3"]);
        let pedals = vec![
            Pedal::new("P1", "A").unwrap().with_change(3, 2),
            Pedal::new("P2", "B").unwrap().with_change(3, 1),
            Pedal::new("P4", "D").unwrap().with_change(3, -1),
        ];
        let found = detect_splits(&s, &pedals, &[], &[], &MechanismCombinations::new());
        // P1/P2 adjacent; P1/P4 and P2/P4 are not
        assert_eq!(keys(&found), vec![SplitKey::new(3, "P1", "P2")]);
        assert_eq!(found[0].manual_semitone_change, 3);
        assert_eq!(found[0].is_included_in_calculation, SplitResolution::Define);
        assert_eq!(found[0].open_note.to_string(), "B3");
    }

    #[test]
    fn test_levers_and_pedals() {
        let s = strings(&["E3", "B3"]);
        let pedals = vec![Pedal::new("P1", "A").unwrap().with_change(2, 2)];
        let levers = vec![
            KneeLever::new("LKL", "LKL").unwrap().with_change(2, 1),
            KneeLever::new("LKR", "LKR").unwrap().with_change(2, -1),
            KneeLever::new("LKV", "LKV").unwrap().with_change(2, -1).with_active(false),
        ];
        let found = detect_splits(&s, &pedals, &levers, &[], &MechanismCombinations::new());
        // LKL/LKR oppose; LKV inactive
        assert_eq!(
            keys(&found),
            vec![SplitKey::new(2, "LKL", "P1"), SplitKey::new(2, "LKR", "P1")]
        );
        assert_eq!(found[0].conflicting_controls[0].kind, ControlKind::Lever);
        assert_eq!(found[0].conflicting_controls[1].kind, ControlKind::Pedal);
    }

    #[test]
    fn test_mechanisms_need_permission() {
        let s = strings(&["E3"]);
        let pedals = vec![Pedal::new("P1", "A").unwrap().with_change(1, 2)];
        let mechanisms = vec![Mechanism::new("M1", "Stop").with_change(1, 1)];
        let mut combos = MechanismCombinations::new();
        assert!(detect_splits(&s, &pedals, &[], &mechanisms, &combos).is_empty());

        combos.allow("M1", "P1");
        let found = detect_splits(&s, &pedals, &[], &mechanisms, &combos);
        assert_eq!(keys(&found), vec![SplitKey::new(1, "M1", "P1")]);
    }

    #[test]
    fn test_zero_change_does_not_count() {
        let s = strings(&["E3"]);
        let pedals = vec![
            Pedal::new("P1", "A").unwrap().with_change(1, 2),
            Pedal::new("P2", "B").unwrap().with_change(1, 0),
        ];
        assert!(detect_splits(&s, &pedals, &[], &[], &MechanismCombinations::new()).is_empty());
    }

    #[test]
    fn test_detection_ignores_control_order() {
        let s = strings(&["F#4", "D#4", "G#4", "E4", "B3"]);
        let mut pedals = vec![
            Pedal::new("P1", "A").unwrap().with_change(5, 2),
            Pedal::new("P2", "B").unwrap().with_change(3, 1).with_change(5, 1),
            Pedal::new("P3", "C").unwrap().with_change(4, 2).with_change(5, 2),
        ];
        let mut levers = vec![
            KneeLever::new("LKL", "LKL").unwrap().with_change(4, 1),
            KneeLever::new("LKR", "LKR").unwrap().with_change(4, -1).with_change(5, -1),
            KneeLever::new("RKL", "RKL").unwrap().with_change(2, 1),
            KneeLever::new("RKR", "RKR").unwrap().with_change(2, -2),
        ];
        let mut mechanisms = vec![
            Mechanism::new("M1", "Half stop").with_change(5, 1),
            Mechanism::new("M2", "Tuner").with_change(4, -1),
        ];
        let mut combos = MechanismCombinations::new();
        combos.allow("M1", "P1");
        combos.allow("M2", "LKL");
        combos.allow("M1", "M2");

        let baseline = detect_splits(&s, &pedals, &levers, &mechanisms, &combos);
        assert!(!baseline.is_empty());

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            pedals.shuffle(&mut rng);
            levers.shuffle(&mut rng);
            mechanisms.shuffle(&mut rng);
            let shuffled = detect_splits(&s, &pedals, &levers, &mechanisms, &combos);
            assert_eq!(shuffled, baseline);
        }
    }

    #[test]
    fn test_merge_preserves_resolutions() {
        let s = strings(&["E3", "B3"]);
        let pedals = vec![Pedal::new("P1", "A").unwrap().with_change(2, 2)];
        let levers = vec![KneeLever::new("LKR", "LKR").unwrap().with_change(2, -1)];
        let combos = MechanismCombinations::new();

        let mut resolved = detect_splits(&s, &pedals, &levers, &[], &combos);
        resolved[0].is_included_in_calculation = SplitResolution::Include;
        resolved[0].manual_semitone_change = 0;

        // unrelated edit: one more string
        let s = strings(&["E3", "B3", "G#3"]);
        let merged = merge_splits(detect_splits(&s, &pedals, &levers, &[], &combos), &resolved);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].is_included_in_calculation, SplitResolution::Include);
        assert_eq!(merged[0].manual_semitone_change, 0);
    }

    #[test]
    fn test_merge_drops_stale_and_keeps_new_undefined() {
        let s = strings(&["E3", "B3"]);
        let pedals = vec![Pedal::new("P1", "A").unwrap().with_change(2, 2).with_change(1, 1)];
        let mut levers = vec![KneeLever::new("LKR", "LKR").unwrap().with_change(2, -1)];
        let combos = MechanismCombinations::new();

        let mut previous = detect_splits(&s, &pedals, &levers, &[], &combos);
        previous[0].is_included_in_calculation = SplitResolution::Exclude;

        // lever now bends string 1 instead of string 2
        levers[0] = KneeLever::new("LKR", "LKR").unwrap().with_change(1, -1);
        let merged = merge_splits(detect_splits(&s, &pedals, &levers, &[], &combos), &previous);
        assert_eq!(keys(&merged), vec![SplitKey::new(1, "LKR", "P1")]);
        assert_eq!(merged[0].is_included_in_calculation, SplitResolution::Define);
        assert_eq!(merged[0].manual_semitone_change, 0);
    }

    #[test]
    fn test_resolution_serde_names() {
        assert_eq!(serde_yaml::to_string(&SplitResolution::Define).unwrap().trim(), "DEFINE");
        assert_eq!(serde_yaml::to_string(&SplitResolution::Include).unwrap().trim(), "include");
        let r: SplitResolution = serde_yaml::from_str("exclude").unwrap();
        assert_eq!(r, SplitResolution::Exclude);
    }
}
