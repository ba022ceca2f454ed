// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pedals, knee levers, and mechanisms.
//!
//! All three share the same shape: an id, a display name, and a sparse map
//! from string id to semitone delta. Pedal index and lever geometry are
//! parsed from the id once, when the control is built or deserialized.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CopedentError, StringId};
use crate::music::Semitones;

/// Sparse per-string pitch changes. A missing entry means no effect.
pub type Changes = BTreeMap<StringId, Semitones>;

/// Which family a control belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Pedal,
    Lever,
    Mechanism,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Pedal => write!(f, "pedal"),
            ControlKind::Lever => write!(f, "lever"),
            ControlKind::Mechanism => write!(f, "mechanism"),
        }
    }
}

/// Behavior shared by every pitch-changing control
pub trait Control {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn changes(&self) -> &Changes;
    fn kind(&self) -> ControlKind;

    /// Delta applied to `string` when engaged. Zero entries count as absent.
    fn change_for(&self, string: StringId) -> Option<Semitones> {
        self.changes().get(&string).copied().filter(|delta| *delta != 0)
    }
}

/// Serialized form shared by pedals and levers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRecord {
    id: String,
    name: String,
    #[serde(default)]
    changes: Changes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
}

/// A foot pedal, id `P<n>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ControlRecord", into = "ControlRecord")]
pub struct Pedal {
    id: String,
    pub name: String,
    pub changes: Changes,
    index: u32,
}

impl Pedal {
    /// Create a pedal, parsing its index from the id
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, CopedentError> {
        let id = id.into();
        let index = parse_pedal_index(&id)?;
        Ok(Self {
            id,
            name: name.into(),
            changes: Changes::new(),
            index,
        })
    }

    /// Builder-style change entry
    pub fn with_change(mut self, string: StringId, delta: Semitones) -> Self {
        self.changes.insert(string, delta);
        self
    }

    /// Numeric pedal position (1 for `P1`)
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Control for Pedal {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn changes(&self) -> &Changes {
        &self.changes
    }
    fn kind(&self) -> ControlKind {
        ControlKind::Pedal
    }
}

impl TryFrom<ControlRecord> for Pedal {
    type Error = CopedentError;

    fn try_from(record: ControlRecord) -> Result<Self, Self::Error> {
        let mut pedal = Pedal::new(record.id, record.name)?;
        pedal.changes = record.changes;
        Ok(pedal)
    }
}

impl From<Pedal> for ControlRecord {
    fn from(pedal: Pedal) -> Self {
        Self {
            id: pedal.id,
            name: pedal.name,
            changes: pedal.changes,
            active: None,
        }
    }
}

fn parse_pedal_index(id: &str) -> Result<u32, CopedentError> {
    id.strip_prefix('P')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| CopedentError::InvalidControlId {
            kind: ControlKind::Pedal,
            id: id.to_string(),
        })
}

/// Which knee operates a lever
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Knee {
    Left,
    Right,
}

/// Direction the knee moves to engage a lever
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeverMotion {
    Left,
    Right,
    /// Pushed up; has no opposing partner
    Vertical,
}

/// Knee and motion parsed from ids like `LKL`, `RKV`, or `LKR2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeverGeometry {
    pub knee: Knee,
    pub motion: LeverMotion,
}

impl LeverGeometry {
    /// Parse `[LR]K[LRV]<digits?>`
    pub fn parse(id: &str) -> Result<Self, CopedentError> {
        let invalid = || CopedentError::InvalidControlId {
            kind: ControlKind::Lever,
            id: id.to_string(),
        };
        let bytes = id.as_bytes();
        if bytes.len() < 3 || bytes[1] != b'K' || !bytes[3..].iter().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let knee = match bytes[0] {
            b'L' => Knee::Left,
            b'R' => Knee::Right,
            _ => return Err(invalid()),
        };
        let motion = match bytes[2] {
            b'L' => LeverMotion::Left,
            b'R' => LeverMotion::Right,
            b'V' => LeverMotion::Vertical,
            _ => return Err(invalid()),
        };
        Ok(Self { knee, motion })
    }

    /// Same knee pushed in opposite horizontal directions
    pub fn opposes(&self, other: &LeverGeometry) -> bool {
        self.knee == other.knee
            && matches!(
                (self.motion, other.motion),
                (LeverMotion::Left, LeverMotion::Right) | (LeverMotion::Right, LeverMotion::Left)
            )
    }
}

/// A knee lever. Inactive levers are kept but ignored everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ControlRecord", into = "ControlRecord")]
pub struct KneeLever {
    id: String,
    pub name: String,
    pub changes: Changes,
    pub active: bool,
    geometry: LeverGeometry,
}

impl KneeLever {
    /// Create an active lever, parsing its geometry from the id
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, CopedentError> {
        let id = id.into();
        let geometry = LeverGeometry::parse(&id)?;
        Ok(Self {
            id,
            name: name.into(),
            changes: Changes::new(),
            active: true,
            geometry,
        })
    }

    /// Builder-style change entry
    pub fn with_change(mut self, string: StringId, delta: Semitones) -> Self {
        self.changes.insert(string, delta);
        self
    }

    /// Builder-style activation flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn geometry(&self) -> LeverGeometry {
        self.geometry
    }
}

impl Control for KneeLever {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn changes(&self) -> &Changes {
        &self.changes
    }
    fn kind(&self) -> ControlKind {
        ControlKind::Lever
    }
}

impl TryFrom<ControlRecord> for KneeLever {
    type Error = CopedentError;

    fn try_from(record: ControlRecord) -> Result<Self, Self::Error> {
        let mut lever = KneeLever::new(record.id, record.name)?;
        lever.changes = record.changes;
        lever.active = record.active.unwrap_or(true);
        Ok(lever)
    }
}

impl From<KneeLever> for ControlRecord {
    fn from(lever: KneeLever) -> Self {
        Self {
            id: lever.id,
            name: lever.name,
            changes: lever.changes,
            active: Some(lever.active),
        }
    }
}

/// An auxiliary mechanism (string stop, half-stop, tuner lever, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mechanism {
    id: String,
    pub name: String,
    #[serde(default)]
    pub changes: Changes,
}

impl Mechanism {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            changes: Changes::new(),
        }
    }

    /// Builder-style change entry
    pub fn with_change(mut self, string: StringId, delta: Semitones) -> Self {
        self.changes.insert(string, delta);
        self
    }
}

impl Control for Mechanism {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn changes(&self) -> &Changes {
        &self.changes
    }
    fn kind(&self) -> ControlKind {
        ControlKind::Mechanism
    }
}

/// A borrowed control of any kind
#[derive(Debug, Clone, Copy)]
pub enum AnyControl<'a> {
    Pedal(&'a Pedal),
    Lever(&'a KneeLever),
    Mechanism(&'a Mechanism),
}

impl<'a> AnyControl<'a> {
    /// Id borrowed from the copedent rather than from this handle
    pub fn borrowed_id(&self) -> &'a str {
        match *self {
            AnyControl::Pedal(p) => p.id(),
            AnyControl::Lever(l) => l.id(),
            AnyControl::Mechanism(m) => m.id(),
        }
    }

    fn inner(&self) -> &dyn Control {
        match self {
            AnyControl::Pedal(p) => *p,
            AnyControl::Lever(l) => *l,
            AnyControl::Mechanism(m) => *m,
        }
    }
}

impl Control for AnyControl<'_> {
    fn id(&self) -> &str {
        self.inner().id()
    }
    fn name(&self) -> &str {
        self.inner().name()
    }
    fn changes(&self) -> &Changes {
        self.inner().changes()
    }
    fn kind(&self) -> ControlKind {
        self.inner().kind()
    }
}
