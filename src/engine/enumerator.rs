// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Exhaustive chord search over frets and playable control combinations.

use std::time::Instant;

use tracing::{debug, trace};

use super::{
    ensure_searchable, string_bends, CancelToken, ChordQuery, ControlCombo, EngineError,
    IntervalSet, NoteResult, StringBend, Voicing,
};
use crate::copedent::{
    pedals_combinable, AnyControl, Control, Copedent, KneeLever, Mechanism, Pedal,
    SplitResolution, StringId,
};
use crate::music::Semitones;

/// Controls in enumeration order, addressed by slot: pedals by index, then
/// active levers by id, then mechanisms by id
struct ControlTable<'a> {
    pedals: Vec<&'a Pedal>,
    levers: Vec<&'a KneeLever>,
    mechanisms: Vec<&'a Mechanism>,
}

impl<'a> ControlTable<'a> {
    fn new(copedent: &'a Copedent) -> Self {
        let mut pedals: Vec<&Pedal> = copedent.pedals().iter().collect();
        pedals.sort_by_key(|p| p.index());
        let mut levers: Vec<&KneeLever> = copedent.active_levers().collect();
        levers.sort_by(|a, b| a.id().cmp(b.id()));
        let mut mechanisms: Vec<&Mechanism> = copedent.mechanisms().iter().collect();
        mechanisms.sort_by(|a, b| a.id().cmp(b.id()));
        Self {
            pedals,
            levers,
            mechanisms,
        }
    }

    fn len(&self) -> usize {
        self.pedals.len() + self.levers.len() + self.mechanisms.len()
    }

    fn control(&self, slot: usize) -> AnyControl<'a> {
        let levers_from = self.pedals.len();
        let mechanisms_from = levers_from + self.levers.len();
        if slot < levers_from {
            AnyControl::Pedal(self.pedals[slot])
        } else if slot < mechanisms_from {
            AnyControl::Lever(self.levers[slot - levers_from])
        } else {
            AnyControl::Mechanism(self.mechanisms[slot - mechanisms_from])
        }
    }

    fn slot(&self, id: &str) -> Option<usize> {
        (0..self.len()).find(|&slot| self.control(slot).borrowed_id() == id)
    }

    fn combo(&self, slots: &SlotCombo) -> ControlCombo<'a> {
        let levers_from = self.pedals.len();
        let mechanisms_from = levers_from + self.levers.len();
        ControlCombo {
            pedals: slots.pedal_slots().iter().map(|&s| self.pedals[s]).collect(),
            levers: slots
                .lever_slots()
                .iter()
                .map(|&s| self.levers[s - levers_from])
                .collect(),
            mechanisms: slots
                .mechanism_slots()
                .iter()
                .map(|&s| self.mechanisms[s - mechanisms_from])
                .collect(),
        }
    }
}

/// One combination as ascending slots: pedals, then levers, then mechanisms
#[derive(Debug, Clone)]
struct SlotCombo {
    slots: Vec<usize>,
    pedals: usize,
    levers: usize,
}

impl SlotCombo {
    fn pedal_slots(&self) -> &[usize] {
        &self.slots[..self.pedals]
    }

    fn lever_slots(&self) -> &[usize] {
        &self.slots[self.pedals..self.pedals + self.levers]
    }

    fn mechanism_slots(&self) -> &[usize] {
        &self.slots[self.pedals + self.levers..]
    }
}

/// Every playable combination of pedals, active levers and mechanisms.
///
/// Infeasible partial combinations are pruned while building, so the
/// result never contains a combination that fails the validator. Ordered
/// by control count, then pedal indices, then lever ids, then mechanism ids.
pub fn control_combinations(copedent: &Copedent) -> Vec<ControlCombo<'_>> {
    let table = ControlTable::new(copedent);
    slot_combinations(copedent, &table)
        .iter()
        .map(|slots| table.combo(slots))
        .collect()
}

fn slot_combinations(copedent: &Copedent, table: &ControlTable<'_>) -> Vec<SlotCombo> {
    let pedal_count = table.pedals.len();
    let mut pedal_sets: Vec<Vec<usize>> = vec![Vec::new()];
    pedal_sets.extend((0..pedal_count).map(|i| vec![i]));
    for i in 0..pedal_count {
        for j in i + 1..pedal_count {
            if pedals_combinable(table.pedals[i], table.pedals[j]) {
                pedal_sets.push(vec![i, j]);
            }
        }
    }

    let mut lever_sets = Vec::new();
    lever_subsets(&table.levers, pedal_count, 0, &mut Vec::new(), &mut lever_sets);

    // allowed[k][slot]: mechanism k may be engaged together with `slot`
    let combinations = copedent.mechanism_combinations();
    let allowed: Vec<Vec<bool>> = table
        .mechanisms
        .iter()
        .map(|m| {
            (0..table.len())
                .map(|slot| combinations.allows(m.id(), table.control(slot).borrowed_id()))
                .collect()
        })
        .collect();
    let mechanisms_from = pedal_count + table.levers.len();

    let mut combos = Vec::new();
    for pedal_set in &pedal_sets {
        for lever_set in &lever_sets {
            let mut current: Vec<usize> = pedal_set.iter().chain(lever_set).copied().collect();
            let sizes = (pedal_set.len(), lever_set.len());
            mechanism_subsets(&allowed, mechanisms_from, 0, &mut current, sizes, &mut combos);
        }
    }

    combos.sort_by(|a, b| {
        a.slots
            .len()
            .cmp(&b.slots.len())
            .then_with(|| a.pedal_slots().cmp(b.pedal_slots()))
            .then_with(|| a.lever_slots().cmp(b.lever_slots()))
            .then_with(|| a.mechanism_slots().cmp(b.mechanism_slots()))
    });
    debug!(copedent = %copedent.id, combos = combos.len(), "enumerated control combinations");
    combos
}

fn lever_subsets(
    levers: &[&KneeLever],
    first_slot: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    out.push(current.clone());
    for i in start..levers.len() {
        let geometry = levers[i].geometry();
        if current
            .iter()
            .any(|&slot| levers[slot - first_slot].geometry().opposes(&geometry))
        {
            continue;
        }
        current.push(first_slot + i);
        lever_subsets(levers, first_slot, i + 1, current, out);
        current.pop();
    }
}

fn mechanism_subsets(
    allowed: &[Vec<bool>],
    first_slot: usize,
    start: usize,
    current: &mut Vec<usize>,
    (pedals, levers): (usize, usize),
    out: &mut Vec<SlotCombo>,
) {
    out.push(SlotCombo {
        slots: current.clone(),
        pedals,
        levers,
    });
    for k in start..allowed.len() {
        if current.iter().any(|&slot| !allowed[k][slot]) {
            continue;
        }
        current.push(first_slot + k);
        mechanism_subsets(allowed, first_slot, k + 1, current, (pedals, levers), out);
        current.pop();
    }
}

/// An `include` split located by string position and control slots
struct IncludeSplit {
    position: usize,
    first: usize,
    second: usize,
    change: Semitones,
}

/// Fret-independent pitch data for matching many combinations quickly.
///
/// [`PitchPlan::offsets`] applies the same rule as [`super::string_bend`]
/// without allocating per combination.
struct PitchPlan {
    /// Open pitch class per string position
    open: Vec<Semitones>,
    /// Per slot: (string position, nonzero delta)
    changes: Vec<Vec<(usize, Semitones)>>,
    /// Stored order
    include: Vec<IncludeSplit>,
    engaged: Vec<bool>,
    consumed: Vec<(usize, usize)>,
    offsets: Vec<Semitones>,
}

impl PitchPlan {
    fn new(copedent: &Copedent, table: &ControlTable<'_>) -> Self {
        let strings = copedent.strings();
        let position = |id: StringId| strings.iter().position(|s| s.id == id);

        let changes: Vec<Vec<(usize, Semitones)>> = (0..table.len())
            .map(|slot| {
                let control = table.control(slot);
                control
                    .changes()
                    .keys()
                    .filter_map(|&id| Some((position(id)?, control.change_for(id)?)))
                    .collect()
            })
            .collect();
        let include: Vec<IncludeSplit> = copedent
            .splits()
            .iter()
            .filter(|s| s.is_included_in_calculation == SplitResolution::Include)
            .filter_map(|s| {
                let [a, b] = &s.conflicting_controls;
                Some(IncludeSplit {
                    position: position(s.string_id)?,
                    first: table.slot(&a.id)?,
                    second: table.slot(&b.id)?,
                    change: s.manual_semitone_change,
                })
            })
            .collect();

        Self {
            open: strings
                .iter()
                .map(|s| s.open_note.pitch().index() as Semitones)
                .collect(),
            changes,
            include,
            engaged: vec![false; table.len()],
            consumed: Vec::new(),
            offsets: vec![0; strings.len()],
        }
    }

    /// Offset of every string under `combo`, by string position
    fn offsets(&mut self, combo: &SlotCombo) -> &[Semitones] {
        self.offsets.fill(0);
        for &slot in &combo.slots {
            self.engaged[slot] = true;
            for &(position, delta) in &self.changes[slot] {
                self.offsets[position] = self.offsets[position].wrapping_add(delta);
            }
        }

        for split in &self.include {
            let first = (split.position, split.first);
            let second = (split.position, split.second);
            if !self.engaged[split.first]
                || !self.engaged[split.second]
                || self.consumed.contains(&first)
                || self.consumed.contains(&second)
            {
                continue;
            }
            let replaced = delta_on(&self.changes[split.first], split.position)
                .wrapping_add(delta_on(&self.changes[split.second], split.position));
            let offset = &mut self.offsets[split.position];
            *offset = offset.wrapping_add(split.change).wrapping_sub(replaced);
            self.consumed.push(first);
            self.consumed.push(second);
        }

        for &slot in &combo.slots {
            self.engaged[slot] = false;
        }
        self.consumed.clear();
        &self.offsets
    }

    /// Pitch classes sounding with the bar at fret 0
    fn open_pitches(&mut self, combo: &SlotCombo) -> IntervalSet {
        self.offsets(combo);
        self.open
            .iter()
            .zip(&self.offsets)
            .fold(IntervalSet::default(), |set, (&open, &offset)| {
                set.with(((open + offset.rem_euclid(12)) % 12) as u8)
            })
    }
}

fn delta_on(changes: &[(usize, Semitones)], position: usize) -> Semitones {
    changes
        .iter()
        .find(|&&(p, _)| p == position)
        .map_or(0, |&(_, delta)| delta)
}

fn build_voicing(
    combo: &ControlCombo<'_>,
    bends: &[StringBend],
    query: &ChordQuery,
    fret: u8,
) -> Voicing {
    let root = query.root.pitch();
    let notes = bends
        .iter()
        .map(|bend| {
            let final_note = bend.at_fret(fret);
            let semitones_from_root = root.interval_to(final_note.pitch());
            let is_chord_tone = query.intervals.contains(semitones_from_root);
            NoteResult {
                string_id: bend.string_id,
                original_note: bend.open_note,
                final_note,
                semitones_from_root,
                is_chord_tone,
                is_played_in_voicing: is_chord_tone,
                active_controls: bend.active_controls.clone(),
                is_overridden_by_split: bend.overridden_by_split,
            }
        })
        .collect();
    Voicing {
        fret,
        pedal_combo: combo.pedal_ids(),
        lever_combo: combo.lever_ids(),
        mec_combo: combo.mechanism_ids(),
        notes,
    }
}

/// Every fret 0..=`max_fret` and combination whose sounding pitch classes
/// include all of the query's intervals above its root.
///
/// Results are grouped by ascending fret; within a fret they follow
/// [`control_combinations`] order and stop after `results_per_fret`.
pub fn find_chord_voicings(
    copedent: &Copedent,
    query: &ChordQuery,
    max_fret: u8,
    cancel: Option<&CancelToken>,
) -> Result<Vec<Voicing>, EngineError> {
    ensure_searchable(copedent)?;
    if query.intervals.is_empty() {
        return Err(EngineError::EmptyIntervals);
    }

    let start = Instant::now();
    let table = ControlTable::new(copedent);
    let combos = slot_combinations(copedent, &table);
    // pitch classes at fret 0; moving the bar transposes the whole set
    let mut plan = PitchPlan::new(copedent, &table);
    let open_pitches: Vec<IntervalSet> = combos.iter().map(|c| plan.open_pitches(c)).collect();

    let limit = match query.results_per_fret {
        0 => usize::MAX,
        n => n,
    };
    let root = query.root.pitch().index() as Semitones;

    let mut voicings = Vec::new();
    for fret in 0..=max_fret {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            debug!(fret, "chord search cancelled");
            return Err(EngineError::Cancelled(fret));
        }
        let shift = fret as Semitones - root;
        let mut found = 0;
        for (slots, pitches) in combos.iter().zip(&open_pitches) {
            if found == limit {
                break;
            }
            if query.intervals.is_subset_of(pitches.transposed(shift)) {
                let combo = table.combo(slots);
                let bends = string_bends(copedent, &combo);
                voicings.push(build_voicing(&combo, &bends, query, fret));
                found += 1;
            }
        }
        trace!(fret, found, "searched fret");
    }

    debug!(
        copedent = %copedent.id,
        root = %query.root,
        intervals = %query.intervals,
        combos = combos.len(),
        voicings = voicings.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "chord search finished"
    );
    Ok(voicings)
}
