// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Copedent model.
//!
//! A copedent is the complete tuning and control layout of a pedal steel:
//! ordered strings with open pitches, pedals, knee levers, auxiliary
//! mechanisms, the mechanism permission graph, and the detected splits.

pub mod combination;
pub mod control;
pub mod presets;
pub mod split;

pub use combination::{
    controls_combinable, is_full_combination_valid, is_lever_combination_valid,
    pedals_combinable, CombinationCheck,
};
pub use control::{
    AnyControl, Changes, Control, ControlKind, Knee, KneeLever, LeverGeometry, LeverMotion,
    Mechanism, Pedal,
};
pub use split::{detect_splits, merge_splits, ControlRef, Split, SplitKey, SplitResolution};

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::music::{Note, NoteError, Semitones};

/// 1-based string number, dense within a copedent
pub type StringId = u32;

/// Errors raised while building or validating a copedent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopedentError {
    #[error("Invalid {kind} id: {id:?}")]
    InvalidControlId { kind: ControlKind, id: String },

    #[error("Duplicate control id: {0}")]
    DuplicateControlId(String),

    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Unknown string: {0}")]
    UnknownString(StringId),

    #[error("Control {control} changes string {string}, which does not exist")]
    DanglingStringReference { control: String, string: StringId },

    #[error("String ids must be dense from 1: position {position} has id {id}")]
    NonDenseStringIds { position: usize, id: StringId },

    #[error("{0} is not a mechanism")]
    NotAMechanism(String),

    #[error("Mechanism combination {a} -> {b} is not mirrored")]
    AsymmetricCombination { a: String, b: String },

    #[error("Split on string {string_id} between {first} and {second} is unresolved")]
    UnresolvedSplit {
        string_id: StringId,
        first: String,
        second: String,
    },

    #[error("No split on string {string_id} between {first} and {second}")]
    UnknownSplit {
        string_id: StringId,
        first: String,
        second: String,
    },

    #[error("Copedent has no strings")]
    NoStrings,

    #[error(transparent)]
    Note(#[from] NoteError),
}

/// One string of the instrument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SteelString {
    pub id: StringId,
    pub open_note: Note,
}

/// Symmetric allow-list of controls that may be engaged together with a mechanism
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MechanismCombinations {
    allowed: BTreeMap<String, BTreeSet<String>>,
}

impl MechanismCombinations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit `a` and `b` together (both directions)
    pub fn allow(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.allowed.entry(a.to_string()).or_default().insert(b.to_string());
        self.allowed.entry(b.to_string()).or_default().insert(a.to_string());
    }

    /// Remove a permission (both directions)
    pub fn forbid(&mut self, a: &str, b: &str) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(set) = self.allowed.get_mut(from) {
                set.remove(to);
                if set.is_empty() {
                    self.allowed.remove(from);
                }
            }
        }
    }

    /// Whether `partner` is in `control`'s allowed set
    pub fn allows(&self, control: &str, partner: &str) -> bool {
        self.allowed
            .get(control)
            .is_some_and(|set| set.contains(partner))
    }

    /// Allowed partners of `control`
    pub fn partners(&self, control: &str) -> impl Iterator<Item = &str> {
        self.allowed
            .get(control)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Drop every entry mentioning `control`
    pub fn remove_control(&mut self, control: &str) {
        self.allowed.remove(control);
        self.allowed.retain(|_, set| {
            set.remove(control);
            !set.is_empty()
        });
    }

    /// First `(a, b)` where `a` allows `b` but `b` does not allow `a`
    pub fn asymmetry(&self) -> Option<(&str, &str)> {
        self.allowed.iter().find_map(|(a, set)| {
            set.iter()
                .find(|b| !self.allows(b, a))
                .map(|b| (a.as_str(), b.as_str()))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.allowed
            .iter()
            .flat_map(|(a, set)| set.iter().map(move |b| (a.as_str(), b.as_str())))
    }
}

/// Complete instrument description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Copedent {
    pub id: String,
    pub name: String,
    strings: Vec<SteelString>,
    #[serde(default)]
    pedals: Vec<Pedal>,
    #[serde(default)]
    knee_levers: Vec<KneeLever>,
    #[serde(default)]
    mechanisms: Vec<Mechanism>,
    #[serde(default)]
    mechanism_combinations: MechanismCombinations,
    #[serde(default)]
    detected_splits: Vec<Split>,
}

impl Copedent {
    /// Create a copedent with the given open strings, numbered from 1
    pub fn new(id: impl Into<String>, name: impl Into<String>, open_notes: &[Note]) -> Self {
        let strings = open_notes
            .iter()
            .zip(1..)
            .map(|(&open_note, id)| SteelString { id, open_note })
            .collect();
        Self {
            id: id.into(),
            name: name.into(),
            strings,
            pedals: Vec::new(),
            knee_levers: Vec::new(),
            mechanisms: Vec::new(),
            mechanism_combinations: MechanismCombinations::new(),
            detected_splits: Vec::new(),
        }
    }

    pub fn strings(&self) -> &[SteelString] {
        &self.strings
    }

    pub fn string(&self, id: StringId) -> Option<&SteelString> {
        self.strings.iter().find(|s| s.id == id)
    }

    pub fn pedals(&self) -> &[Pedal] {
        &self.pedals
    }

    pub fn knee_levers(&self) -> &[KneeLever] {
        &self.knee_levers
    }

    /// Levers that take part in calculations
    pub fn active_levers(&self) -> impl Iterator<Item = &KneeLever> {
        self.knee_levers.iter().filter(|l| l.active)
    }

    pub fn mechanisms(&self) -> &[Mechanism] {
        &self.mechanisms
    }

    pub fn mechanism_combinations(&self) -> &MechanismCombinations {
        &self.mechanism_combinations
    }

    pub fn splits(&self) -> &[Split] {
        &self.detected_splits
    }

    pub fn pedal(&self, id: &str) -> Option<&Pedal> {
        self.pedals.iter().find(|p| p.id() == id)
    }

    pub fn knee_lever(&self, id: &str) -> Option<&KneeLever> {
        self.knee_levers.iter().find(|l| l.id() == id)
    }

    pub fn mechanism(&self, id: &str) -> Option<&Mechanism> {
        self.mechanisms.iter().find(|m| m.id() == id)
    }

    /// Look up a control of any kind
    pub fn control(&self, id: &str) -> Option<AnyControl<'_>> {
        self.pedal(id)
            .map(AnyControl::Pedal)
            .or_else(|| self.knee_lever(id).map(AnyControl::Lever))
            .or_else(|| self.mechanism(id).map(AnyControl::Mechanism))
    }

    /// Append a string below the current last one
    pub fn push_string(&mut self, open_note: Note) -> StringId {
        let id = self.strings.len() as StringId + 1;
        self.strings.push(SteelString { id, open_note });
        self.refresh_splits();
        id
    }

    /// Remove the last string and every change that referenced it
    pub fn pop_string(&mut self) -> Result<SteelString, CopedentError> {
        let removed = self.strings.pop().ok_or(CopedentError::NoStrings)?;
        for pedal in &mut self.pedals {
            pedal.changes.remove(&removed.id);
        }
        for lever in &mut self.knee_levers {
            lever.changes.remove(&removed.id);
        }
        for mechanism in &mut self.mechanisms {
            mechanism.changes.remove(&removed.id);
        }
        self.refresh_splits();
        Ok(removed)
    }

    pub fn add_pedal(&mut self, pedal: Pedal) -> Result<(), CopedentError> {
        self.check_new_control(pedal.id(), pedal.changes())?;
        self.pedals.push(pedal);
        self.refresh_splits();
        Ok(())
    }

    pub fn add_knee_lever(&mut self, lever: KneeLever) -> Result<(), CopedentError> {
        self.check_new_control(lever.id(), lever.changes())?;
        self.knee_levers.push(lever);
        self.refresh_splits();
        Ok(())
    }

    pub fn add_mechanism(&mut self, mechanism: Mechanism) -> Result<(), CopedentError> {
        self.check_new_control(mechanism.id(), mechanism.changes())?;
        self.mechanisms.push(mechanism);
        self.refresh_splits();
        Ok(())
    }

    /// Remove a control of any kind, with its permissions
    pub fn remove_control(&mut self, id: &str) -> Result<(), CopedentError> {
        let before = self.pedals.len() + self.knee_levers.len() + self.mechanisms.len();
        self.pedals.retain(|p| p.id() != id);
        self.knee_levers.retain(|l| l.id() != id);
        self.mechanisms.retain(|m| m.id() != id);
        if before == self.pedals.len() + self.knee_levers.len() + self.mechanisms.len() {
            return Err(CopedentError::UnknownControl(id.to_string()));
        }
        self.mechanism_combinations.remove_control(id);
        self.refresh_splits();
        Ok(())
    }

    /// Set (or with a zero delta, clear) one control's effect on one string
    pub fn set_change(
        &mut self,
        control: &str,
        string: StringId,
        delta: Semitones,
    ) -> Result<(), CopedentError> {
        if self.string(string).is_none() {
            return Err(CopedentError::UnknownString(string));
        }
        let changes = self
            .changes_mut(control)
            .ok_or_else(|| CopedentError::UnknownControl(control.to_string()))?;
        if delta == 0 {
            changes.remove(&string);
        } else {
            changes.insert(string, delta);
        }
        self.refresh_splits();
        Ok(())
    }

    pub fn set_lever_active(&mut self, id: &str, active: bool) -> Result<(), CopedentError> {
        let lever = self
            .knee_levers
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or_else(|| CopedentError::UnknownControl(id.to_string()))?;
        lever.active = active;
        self.refresh_splits();
        Ok(())
    }

    /// Permit a mechanism to be engaged with another control
    pub fn allow_combination(&mut self, mechanism: &str, other: &str) -> Result<(), CopedentError> {
        if self.mechanism(mechanism).is_none() {
            return Err(CopedentError::NotAMechanism(mechanism.to_string()));
        }
        if self.control(other).is_none() {
            return Err(CopedentError::UnknownControl(other.to_string()));
        }
        self.mechanism_combinations.allow(mechanism, other);
        self.refresh_splits();
        Ok(())
    }

    pub fn forbid_combination(&mut self, mechanism: &str, other: &str) {
        self.mechanism_combinations.forbid(mechanism, other);
        self.refresh_splits();
    }

    /// Re-run split detection, keeping resolutions of splits that still occur
    pub fn refresh_splits(&mut self) {
        let fresh = detect_splits(
            &self.strings,
            &self.pedals,
            &self.knee_levers,
            &self.mechanisms,
            &self.mechanism_combinations,
        );
        self.detected_splits = merge_splits(fresh, &self.detected_splits);
    }

    /// Record the user's decision for one split
    pub fn resolve_split(
        &mut self,
        string_id: StringId,
        first: &str,
        second: &str,
        resolution: SplitResolution,
        manual_semitone_change: Semitones,
    ) -> Result<(), CopedentError> {
        let key = SplitKey::new(string_id, first, second);
        let split = self
            .detected_splits
            .iter_mut()
            .find(|s| s.key() == key)
            .ok_or_else(|| CopedentError::UnknownSplit {
                string_id,
                first: first.to_string(),
                second: second.to_string(),
            })?;
        split.is_included_in_calculation = resolution;
        split.manual_semitone_change = manual_semitone_change;
        Ok(())
    }

    /// Resolve every unresolved split the same way, keeping its default change
    pub fn resolve_all_unresolved(&mut self, resolution: SplitResolution) {
        for split in &mut self.detected_splits {
            if split.is_included_in_calculation == SplitResolution::Define {
                split.is_included_in_calculation = resolution;
            }
        }
    }

    /// Check the structural invariants
    pub fn validate(&self) -> Result<(), CopedentError> {
        for (position, string) in self.strings.iter().enumerate() {
            if string.id as usize != position + 1 {
                return Err(CopedentError::NonDenseStringIds {
                    position,
                    id: string.id,
                });
            }
        }

        let mut seen = HashSet::new();
        for control in self.all_controls() {
            if !seen.insert(control.borrowed_id()) {
                return Err(CopedentError::DuplicateControlId(control.id().to_string()));
            }
            if let Some(&string) = control
                .changes()
                .keys()
                .find(|&&id| self.string(id).is_none())
            {
                return Err(CopedentError::DanglingStringReference {
                    control: control.id().to_string(),
                    string,
                });
            }
        }

        if let Some((a, b)) = self.mechanism_combinations.asymmetry() {
            return Err(CopedentError::AsymmetricCombination {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        for (a, b) in self.mechanism_combinations.iter() {
            if let Some(missing) = [a, b].into_iter().find(|id| self.control(id).is_none()) {
                return Err(CopedentError::UnknownControl(missing.to_string()));
            }
        }
        Ok(())
    }

    /// Fail if any split is still `DEFINE`
    pub fn ensure_resolved(&self) -> Result<(), CopedentError> {
        match self
            .detected_splits
            .iter()
            .find(|s| s.is_included_in_calculation == SplitResolution::Define)
        {
            Some(split) => Err(CopedentError::UnresolvedSplit {
                string_id: split.string_id,
                first: split.conflicting_controls[0].id.clone(),
                second: split.conflicting_controls[1].id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Hash over everything that affects search results
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.strings.hash(&mut hasher);
        self.pedals.hash(&mut hasher);
        self.knee_levers.hash(&mut hasher);
        self.mechanisms.hash(&mut hasher);
        self.mechanism_combinations.hash(&mut hasher);
        self.detected_splits.hash(&mut hasher);
        let fingerprint = hasher.finish();
        debug!(copedent = %self.id, fingerprint, "computed copedent fingerprint");
        fingerprint
    }

    /// Pedals, then levers (active or not), then mechanisms
    pub fn all_controls(&self) -> impl Iterator<Item = AnyControl<'_>> {
        self.pedals
            .iter()
            .map(AnyControl::Pedal)
            .chain(self.knee_levers.iter().map(AnyControl::Lever))
            .chain(self.mechanisms.iter().map(AnyControl::Mechanism))
    }

    fn changes_mut(&mut self, control: &str) -> Option<&mut Changes> {
        if let Some(p) = self.pedals.iter_mut().find(|p| p.id() == control) {
            return Some(&mut p.changes);
        }
        if let Some(l) = self.knee_levers.iter_mut().find(|l| l.id() == control) {
            return Some(&mut l.changes);
        }
        self.mechanisms
            .iter_mut()
            .find(|m| m.id() == control)
            .map(|m| &mut m.changes)
    }

    fn check_new_control(&self, id: &str, changes: &Changes) -> Result<(), CopedentError> {
        if self.control(id).is_some() {
            return Err(CopedentError::DuplicateControlId(id.to_string()));
        }
        match changes.keys().find(|&&s| self.string(s).is_none()) {
            Some(&string) => Err(CopedentError::DanglingStringReference {
                control: id.to_string(),
                string,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> Note {
        Note::parse(s).unwrap()
    }

    fn three_string() -> Copedent {
        let mut c = Copedent::new("test", "Test", &[note("E3"), note("G#3"), note("B3")]);
        c.add_pedal(Pedal::new("P1", "A").unwrap().with_change(2, 2)).unwrap();
        c.add_knee_lever(KneeLever::new("LKL", "LKL").unwrap().with_change(2, -1))
            .unwrap();
        c
    }

    #[test]
    fn test_new_numbers_strings_from_one() {
        let c = three_string();
        let ids: Vec<_> = c.strings().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_pop_string_cascades() {
        let mut c = three_string();
        c.set_change("P1", 3, 1).unwrap();
        let removed = c.pop_string().unwrap();
        assert_eq!(removed.id, 3);
        assert_eq!(c.pedal("P1").unwrap().change_for(3), None);
        assert_eq!(c.pedal("P1").unwrap().change_for(2), Some(2));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_add_rejects_duplicates_and_dangling() {
        let mut c = three_string();
        assert_eq!(
            c.add_pedal(Pedal::new("P1", "again").unwrap()),
            Err(CopedentError::DuplicateControlId("P1".into()))
        );
        assert_eq!(
            c.add_pedal(Pedal::new("P2", "B").unwrap().with_change(9, 1)),
            Err(CopedentError::DanglingStringReference {
                control: "P2".into(),
                string: 9
            })
        );
    }

    #[test]
    fn test_set_change_zero_clears() {
        let mut c = three_string();
        c.set_change("P1", 2, 0).unwrap();
        assert!(c.pedal("P1").unwrap().changes.is_empty());
        assert_eq!(c.set_change("P9", 1, 1), Err(CopedentError::UnknownControl("P9".into())));
        assert_eq!(c.set_change("P1", 7, 1), Err(CopedentError::UnknownString(7)));
    }

    #[test]
    fn test_edits_refresh_splits() {
        let c = three_string();
        // pedal and lever both touch string 2
        assert_eq!(c.splits().len(), 1);
        assert!(c.ensure_resolved().is_err());

        let mut c = c;
        c.set_lever_active("LKL", false).unwrap();
        assert!(c.splits().is_empty());
        assert!(c.ensure_resolved().is_ok());
    }

    #[test]
    fn test_resolve_split() {
        let mut c = three_string();
        c.resolve_split(2, "LKL", "P1", SplitResolution::Include, 1).unwrap();
        assert!(c.ensure_resolved().is_ok());
        assert_eq!(c.splits()[0].manual_semitone_change, 1);
        assert!(matches!(
            c.resolve_split(1, "LKL", "P1", SplitResolution::Include, 1),
            Err(CopedentError::UnknownSplit { .. })
        ));
    }

    #[test]
    fn test_combinations_are_symmetric() {
        let mut c = three_string();
        c.add_mechanism(Mechanism::new("M1", "Half stop").with_change(1, 1)).unwrap();
        c.allow_combination("M1", "P1").unwrap();
        assert!(c.mechanism_combinations().allows("M1", "P1"));
        assert!(c.mechanism_combinations().allows("P1", "M1"));
        assert_eq!(
            c.allow_combination("P1", "M1"),
            Err(CopedentError::NotAMechanism("P1".into()))
        );
        c.forbid_combination("P1", "M1");
        assert!(!c.mechanism_combinations().allows("M1", "P1"));
    }

    #[test]
    fn test_remove_control_drops_permissions() {
        let mut c = three_string();
        c.add_mechanism(Mechanism::new("M1", "Stop")).unwrap();
        c.allow_combination("M1", "P1").unwrap();
        c.remove_control("P1").unwrap();
        assert!(c.pedal("P1").is_none());
        assert_eq!(c.mechanism_combinations().partners("M1").count(), 0);
        assert!(c.remove_control("P1").is_err());
    }

    #[test]
    fn test_validate_catches_asymmetry_from_file() {
        let yaml = r#"
id: x
name: X
strings:
  - id: 1
    open_note: E3
mechanisms:
  - id: M1
    name: Stop
mechanism_combinations:
  M1: [P1]
"#;
        let c: Copedent = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            c.validate(),
            Err(CopedentError::AsymmetricCombination { .. })
        ));
    }

    #[test]
    fn test_validate_catches_duplicate_ids_from_file() {
        let yaml = r#"
id: x
name: X
strings:
  - id: 1
    open_note: E3
pedals:
  - id: P1
    name: A
    changes:
      1: 2
mechanisms:
  - id: P1
    name: Also P1
"#;
        let c: Copedent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            c.validate(),
            Err(CopedentError::DuplicateControlId("P1".into()))
        );
        assert!(three_string().validate().is_ok());
    }

    #[test]
    fn test_validate_catches_gaps() {
        let yaml = r#"
id: x
name: X
strings:
  - id: 1
    open_note: E3
  - id: 3
    open_note: B3
"#;
        let c: Copedent = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            c.validate(),
            Err(CopedentError::NonDenseStringIds { position: 1, id: 3 })
        );
    }

    #[test]
    fn test_fingerprint_tracks_edits() {
        let mut c = three_string();
        let before = c.fingerprint();
        assert_eq!(before, c.clone().fingerprint());
        c.set_change("P1", 1, 1).unwrap();
        assert_ne!(before, c.fingerprint());
    }
}
