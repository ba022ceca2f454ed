// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Physical feasibility of engaging controls together.
//!
//! Rules, first failure wins:
//! 1. At most two pedals, and two pedals must be neighbours.
//! 2. One knee cannot push left and right at the same time.
//! 3. Every engaged mechanism must list every other engaged control as a partner.

use serde::{Deserialize, Serialize};

use super::control::{AnyControl, Control, KneeLever, Pedal};
use super::{Copedent, MechanismCombinations};

/// Outcome of a validity check, with the reason for a rejection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationCheck {
    pub valid: bool,
    pub message: String,
}

impl CombinationCheck {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Two pedals can be pressed with one foot only when they are next to each other
pub fn pedals_combinable(a: &Pedal, b: &Pedal) -> bool {
    a.index().abs_diff(b.index()) == 1
}

/// No pair of levers pushes the same knee in opposite directions
pub fn is_lever_combination_valid(levers: &[&KneeLever]) -> bool {
    opposed_pair(levers).is_none()
}

fn opposed_pair<'a>(levers: &[&'a KneeLever]) -> Option<(&'a KneeLever, &'a KneeLever)> {
    levers.iter().enumerate().find_map(|(i, a)| {
        levers[i + 1..]
            .iter()
            .find(|b| a.geometry().opposes(&b.geometry()))
            .map(|b| (*a, *b))
    })
}

/// Whether two distinct controls can ever be engaged at the same time
pub fn controls_combinable(
    a: AnyControl<'_>,
    b: AnyControl<'_>,
    combinations: &MechanismCombinations,
) -> bool {
    if a.id() == b.id() {
        return false;
    }
    match (a, b) {
        (AnyControl::Mechanism(m), other) | (other, AnyControl::Mechanism(m)) => {
            combinations.allows(m.id(), other.id())
        }
        (AnyControl::Pedal(p), AnyControl::Pedal(q)) => pedals_combinable(p, q),
        (AnyControl::Lever(l), AnyControl::Lever(k)) => is_lever_combination_valid(&[l, k]),
        (AnyControl::Pedal(_), AnyControl::Lever(_))
        | (AnyControl::Lever(_), AnyControl::Pedal(_)) => true,
    }
}

/// Check a proposed set of engaged controls against `copedent`
pub fn is_full_combination_valid(
    pedals: &[impl AsRef<str>],
    levers: &[impl AsRef<str>],
    mechanisms: &[impl AsRef<str>],
    copedent: &Copedent,
) -> CombinationCheck {
    let mut engaged_pedals = Vec::with_capacity(pedals.len());
    for id in pedals.iter().map(AsRef::as_ref) {
        match copedent.pedal(id) {
            Some(p) => engaged_pedals.push(p),
            None => return CombinationCheck::invalid(format!("Unknown pedal: {}", id)),
        }
    }
    let mut engaged_levers = Vec::with_capacity(levers.len());
    for id in levers.iter().map(AsRef::as_ref) {
        match copedent.knee_lever(id) {
            Some(l) if l.active => engaged_levers.push(l),
            Some(l) => return CombinationCheck::invalid(format!("{} is not active", l.name)),
            None => return CombinationCheck::invalid(format!("Unknown knee lever: {}", id)),
        }
    }
    let mut engaged_mechanisms = Vec::with_capacity(mechanisms.len());
    for id in mechanisms.iter().map(AsRef::as_ref) {
        match copedent.mechanism(id) {
            Some(m) => engaged_mechanisms.push(m),
            None => return CombinationCheck::invalid(format!("Unknown mechanism: {}", id)),
        }
    }

    let all: Vec<AnyControl<'_>> = engaged_pedals
        .iter()
        .map(|&p| AnyControl::Pedal(p))
        .chain(engaged_levers.iter().map(|&l| AnyControl::Lever(l)))
        .chain(engaged_mechanisms.iter().map(|&m| AnyControl::Mechanism(m)))
        .collect();
    if let Some((_, dup)) = all
        .iter()
        .enumerate()
        .find(|(i, c)| all[..*i].iter().any(|d| d.id() == c.id()))
    {
        return CombinationCheck::invalid(format!("{} is engaged twice", dup.name()));
    }

    // Rule 1
    match engaged_pedals.as_slice() {
        [] | [_] => {}
        [a, b] => {
            if !pedals_combinable(a, b) {
                return CombinationCheck::invalid(format!(
                    "Pedals {} and {} are not adjacent",
                    a.name, b.name
                ));
            }
        }
        _ => return CombinationCheck::invalid("At most two pedals can be engaged at once"),
    }

    // Rule 2
    if let Some((a, b)) = opposed_pair(&engaged_levers) {
        return CombinationCheck::invalid(format!(
            "{} and {} move the same knee in opposite directions",
            a.name, b.name
        ));
    }

    // Rule 3
    let combinations = copedent.mechanism_combinations();
    for mechanism in &engaged_mechanisms {
        if let Some(other) = all
            .iter()
            .find(|c| c.id() != mechanism.id() && !combinations.allows(mechanism.id(), c.id()))
        {
            return CombinationCheck::invalid(format!(
                "{} cannot be combined with {}",
                mechanism.name,
                other.name()
            ));
        }
    }

    CombinationCheck::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copedent::{KneeLever, Mechanism};
    use crate::music::Note;

    const NONE: [&str; 0] = [];

    fn copedent() -> Copedent {
        let notes: Vec<Note> = ["E3", "G#3", "B3", "E4"]
            .iter()
            .map(|n| Note::parse(n).unwrap())
            .collect();
        let mut c = Copedent::new("c", "C", &notes);
        for i in 1..=4 {
            c.add_pedal(Pedal::new(format!("P{i}"), format!("Pedal {i}")).unwrap())
                .unwrap();
        }
        for id in ["LKL", "LKR", "LKV", "RKL", "RKR"] {
            c.add_knee_lever(KneeLever::new(id, id).unwrap()).unwrap();
        }
        c.add_knee_lever(KneeLever::new("RKV", "RKV").unwrap().with_active(false))
            .unwrap();
        c.add_mechanism(Mechanism::new("M1", "Half stop")).unwrap();
        c.add_mechanism(Mechanism::new("M2", "Tuner")).unwrap();
        c.allow_combination("M1", "P1").unwrap();
        c.allow_combination("M1", "LKL").unwrap();
        c
    }

    #[test]
    fn test_empty_is_valid() {
        assert!(is_full_combination_valid(&NONE, &NONE, &NONE, &copedent()).valid);
    }

    #[test]
    fn test_rejects_non_adjacent_pedals() {
        let check = is_full_combination_valid(&["P1", "P3"], &NONE, &NONE, &copedent());
        assert!(!check.valid);
        assert!(check.message.contains("not adjacent"));
        assert!(is_full_combination_valid(&["P2", "P3"], &NONE, &NONE, &copedent()).valid);
    }

    #[test]
    fn test_rejects_three_pedals() {
        let check = is_full_combination_valid(&["P1", "P2", "P3"], &NONE, &NONE, &copedent());
        assert!(!check.valid);
        assert!(check.message.contains("two pedals"));
    }

    #[test]
    fn test_rejects_opposed_levers() {
        let c = copedent();
        assert!(!is_full_combination_valid(&NONE, &["LKL", "LKR"], &NONE, &c).valid);
        assert!(is_full_combination_valid(&NONE, &["LKL", "RKL"], &NONE, &c).valid);
        assert!(is_full_combination_valid(&NONE, &["LKL", "LKV"], &NONE, &c).valid);
        assert!(is_full_combination_valid(&NONE, &["LKL", "RKR", "LKV"], &NONE, &c).valid);
    }

    #[test]
    fn test_rejects_inactive_and_unknown() {
        let c = copedent();
        let check = is_full_combination_valid(&NONE, &["RKV"], &NONE, &c);
        assert_eq!(check.message, "RKV is not active");
        assert!(!is_full_combination_valid(&["P9"], &NONE, &NONE, &c).valid);
        assert!(!is_full_combination_valid(&NONE, &NONE, &["M7"], &c).valid);
    }

    #[test]
    fn test_rejects_duplicates() {
        let check = is_full_combination_valid(&["P1", "P1"], &NONE, &NONE, &copedent());
        assert!(!check.valid);
        assert!(check.message.contains("twice"));
    }

    #[test]
    fn test_mechanism_permissions() {
        let c = copedent();
        assert!(is_full_combination_valid(&["P1"], &["LKL"], &["M1"], &c).valid);

        let check = is_full_combination_valid(&["P2"], &NONE, &["M1"], &c);
        assert!(!check.valid);
        assert_eq!(check.message, "Half stop cannot be combined with Pedal 2");

        let check = is_full_combination_valid(&NONE, &NONE, &["M1", "M2"], &c);
        assert!(!check.valid);
    }

    #[test]
    fn test_pairwise_combinability() {
        let c = copedent();
        let combos = c.mechanism_combinations();
        let get = |id: &str| c.control(id).unwrap();
        assert!(controls_combinable(get("P1"), get("P2"), combos));
        assert!(!controls_combinable(get("P1"), get("P3"), combos));
        assert!(!controls_combinable(get("P1"), get("P1"), combos));
        assert!(controls_combinable(get("P1"), get("LKR"), combos));
        assert!(!controls_combinable(get("LKL"), get("LKR"), combos));
        assert!(controls_combinable(get("M1"), get("LKL"), combos));
        assert!(controls_combinable(get("LKL"), get("M1"), combos));
        assert!(!controls_combinable(get("M2"), get("P1"), combos));
    }
}
