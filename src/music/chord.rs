// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord type table.
//!
//! Chord qualities as interval sets from the root, used both for naming
//! sounding pitch sets and for turning a chord symbol into search intervals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chord qualities, in naming priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordType {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Power,
    Major6,
    Minor6,
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    HalfDiminished7,
    Diminished7,
    Augmented7,
    Dominant7Sus4,
    Add9,
    MinorAdd9,
    SixNine,
    Dominant9,
    Major9,
    Minor9,
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant11,
    Dominant13,
}

impl ChordType {
    /// Every chord type in table order
    pub const ALL: [ChordType; 27] = [
        ChordType::Major,
        ChordType::Minor,
        ChordType::Diminished,
        ChordType::Augmented,
        ChordType::Sus2,
        ChordType::Sus4,
        ChordType::Power,
        ChordType::Major6,
        ChordType::Minor6,
        ChordType::Dominant7,
        ChordType::Major7,
        ChordType::Minor7,
        ChordType::MinorMajor7,
        ChordType::HalfDiminished7,
        ChordType::Diminished7,
        ChordType::Augmented7,
        ChordType::Dominant7Sus4,
        ChordType::Add9,
        ChordType::MinorAdd9,
        ChordType::SixNine,
        ChordType::Dominant9,
        ChordType::Major9,
        ChordType::Minor9,
        ChordType::Dominant7Flat9,
        ChordType::Dominant7Sharp9,
        ChordType::Dominant11,
        ChordType::Dominant13,
    ];

    /// Interval classes (0-11) from the root
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordType::Major => &[0, 4, 7],
            ChordType::Minor => &[0, 3, 7],
            ChordType::Diminished => &[0, 3, 6],
            ChordType::Augmented => &[0, 4, 8],
            ChordType::Sus2 => &[0, 2, 7],
            ChordType::Sus4 => &[0, 5, 7],
            ChordType::Power => &[0, 7],
            ChordType::Major6 => &[0, 4, 7, 9],
            ChordType::Minor6 => &[0, 3, 7, 9],
            ChordType::Dominant7 => &[0, 4, 7, 10],
            ChordType::Major7 => &[0, 4, 7, 11],
            ChordType::Minor7 => &[0, 3, 7, 10],
            ChordType::MinorMajor7 => &[0, 3, 7, 11],
            ChordType::HalfDiminished7 => &[0, 3, 6, 10],
            ChordType::Diminished7 => &[0, 3, 6, 9],
            ChordType::Augmented7 => &[0, 4, 8, 10],
            ChordType::Dominant7Sus4 => &[0, 5, 7, 10],
            ChordType::Add9 => &[0, 2, 4, 7],
            ChordType::MinorAdd9 => &[0, 2, 3, 7],
            ChordType::SixNine => &[0, 2, 4, 7, 9],
            ChordType::Dominant9 => &[0, 2, 4, 7, 10],
            ChordType::Major9 => &[0, 2, 4, 7, 11],
            ChordType::Minor9 => &[0, 2, 3, 7, 10],
            ChordType::Dominant7Flat9 => &[0, 1, 4, 7, 10],
            ChordType::Dominant7Sharp9 => &[0, 3, 4, 7, 10],
            ChordType::Dominant11 => &[0, 2, 4, 5, 7, 10],
            ChordType::Dominant13 => &[0, 2, 4, 7, 9, 10],
        }
    }

    /// Short symbol appended to the root ("maj7", "m7b5")
    pub fn symbol(self) -> &'static str {
        match self {
            ChordType::Major => "",
            ChordType::Minor => "m",
            ChordType::Diminished => "dim",
            ChordType::Augmented => "aug",
            ChordType::Sus2 => "sus2",
            ChordType::Sus4 => "sus4",
            ChordType::Power => "5",
            ChordType::Major6 => "6",
            ChordType::Minor6 => "m6",
            ChordType::Dominant7 => "7",
            ChordType::Major7 => "maj7",
            ChordType::Minor7 => "m7",
            ChordType::MinorMajor7 => "m(maj7)",
            ChordType::HalfDiminished7 => "m7b5",
            ChordType::Diminished7 => "dim7",
            ChordType::Augmented7 => "aug7",
            ChordType::Dominant7Sus4 => "7sus4",
            ChordType::Add9 => "add9",
            ChordType::MinorAdd9 => "m(add9)",
            ChordType::SixNine => "6/9",
            ChordType::Dominant9 => "9",
            ChordType::Major9 => "maj9",
            ChordType::Minor9 => "m9",
            ChordType::Dominant7Flat9 => "7b9",
            ChordType::Dominant7Sharp9 => "7#9",
            ChordType::Dominant11 => "11",
            ChordType::Dominant13 => "13",
        }
    }

    /// Parse a chord symbol, accepting a few common aliases
    pub fn from_symbol(s: &str) -> Option<Self> {
        let s = s.trim();
        let alias = match s {
            "maj" | "M" | "major" => Some(ChordType::Major),
            "min" | "-" | "minor" => Some(ChordType::Minor),
            "o" | "°" => Some(ChordType::Diminished),
            "+" => Some(ChordType::Augmented),
            "sus" => Some(ChordType::Sus4),
            "M7" | "Δ" | "Δ7" => Some(ChordType::Major7),
            "min7" | "-7" => Some(ChordType::Minor7),
            "ø" | "ø7" => Some(ChordType::HalfDiminished7),
            "o7" | "°7" => Some(ChordType::Diminished7),
            "69" => Some(ChordType::SixNine),
            _ => None,
        };
        alias.or_else(|| ChordType::ALL.iter().copied().find(|c| c.symbol() == s))
    }
}

impl fmt::Display for ChordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordType::Major => f.write_str("maj"),
            other => f.write_str(other.symbol()),
        }
    }
}
