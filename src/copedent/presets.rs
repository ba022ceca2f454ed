// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in copedents.

use super::{Copedent, CopedentError, KneeLever, Mechanism, Pedal, SplitResolution};
use crate::music::Note;

/// Lever ids of the default twelve-lever bank, in display order
pub const LEVER_BANK: [&str; 12] = [
    "LKL", "LKR", "LKV", "RKL", "RKR", "RKV", "LKL2", "LKR2", "LKV2", "RKL2", "RKR2", "RKV2",
];

/// Twelve levers, all inactive and without changes
pub fn lever_bank() -> Result<Vec<KneeLever>, CopedentError> {
    LEVER_BANK
        .iter()
        .map(|id| KneeLever::new(*id, *id).map(|l| l.with_active(false)))
        .collect()
}

/// Buddy Emmons E9.
///
/// Open tuning, string 1 farthest from the player:
///   1:F#4  2:D#4  3:G#4  4:E4  5:B3  6:G#3  7:F#3  8:E3  9:D3  10:B2
///
/// No string 1 raise on RKL. The RKR half stop is mechanism `M1`, which
/// raises string 2 by one; RKR with `M1` is a split resolved to D#->D.
/// Every other split ships resolved to the naive sum.
pub fn emmons_e9() -> Result<Copedent, CopedentError> {
    let open: Vec<Note> = ["F#4", "D#4", "G#4", "E4", "B3", "G#3", "F#3", "E3", "D3", "B2"]
        .iter()
        .map(|n| Note::parse(n))
        .collect::<Result<_, _>>()?;
    let mut copedent = Copedent::new("emmons-e9", "Buddy Emmons E9", &open);

    copedent.add_pedal(Pedal::new("P1", "A")?.with_change(5, 2).with_change(10, 2))?;
    copedent.add_pedal(Pedal::new("P2", "B")?.with_change(3, 1).with_change(6, 1))?;
    copedent.add_pedal(Pedal::new("P3", "C")?.with_change(4, 2).with_change(5, 2))?;

    for lever in lever_bank()? {
        copedent.add_knee_lever(lever)?;
    }
    for (lever, changes) in [
        ("LKL", &[(4, 1), (8, 1)][..]),
        ("LKR", &[(4, -1), (8, -1)][..]),
        ("LKV", &[(5, -1), (10, -1)][..]),
        ("RKL", &[(2, 1), (6, -2)][..]),
        ("RKR", &[(2, -2), (9, -1)][..]),
    ] {
        copedent.set_lever_active(lever, true)?;
        for &(string, delta) in changes {
            copedent.set_change(lever, string, delta)?;
        }
    }

    copedent.add_mechanism(Mechanism::new("M1", "RKR half stop").with_change(2, 1))?;
    for partner in ["P1", "P2", "P3", "LKL", "LKR", "LKV", "RKR"] {
        copedent.allow_combination("M1", partner)?;
    }

    copedent.resolve_all_unresolved(SplitResolution::Exclude);
    copedent.resolve_split(2, "M1", "RKR", SplitResolution::Include, -1)?;
    Ok(copedent)
}
