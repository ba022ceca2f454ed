// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Named scale table.
//!
//! Provides scale definitions, name lookup, and the chord-to-scale
//! containment search.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::note::PitchClass;

/// Scale types supported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    // Major scale and modes
    Major,        // Ionian
    Dorian,       // Minor with raised 6th
    Phrygian,     // Minor with lowered 2nd
    Lydian,       // Major with raised 4th
    Mixolydian,   // Major with lowered 7th
    NaturalMinor, // Aeolian
    Locrian,      // Diminished

    // Other minor scales
    HarmonicMinor,
    MelodicMinor, // Ascending form

    // Pentatonic scales
    MajorPentatonic,
    MinorPentatonic,

    // Blues
    Blues,
    MajorBlues,

    // Exotic
    PhrygianDominant,
    LydianDominant,
    Altered,
    HungarianMinor,
    DoubleHarmonic,
    BebopDominant,

    // Symmetric scales
    WholeTone,
    Diminished,   // Half-whole
    DiminishedWH, // Whole-half
    Chromatic,
}

impl ScaleType {
    /// Every scale in lookup priority order: diatonic modes first,
    /// then minor variants, pentatonics, blues, exotic, symmetric.
    pub const ALL: [ScaleType; 23] = [
        ScaleType::Major,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::NaturalMinor,
        ScaleType::Locrian,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::MajorPentatonic,
        ScaleType::MinorPentatonic,
        ScaleType::Blues,
        ScaleType::MajorBlues,
        ScaleType::PhrygianDominant,
        ScaleType::LydianDominant,
        ScaleType::Altered,
        ScaleType::HungarianMinor,
        ScaleType::DoubleHarmonic,
        ScaleType::BebopDominant,
        ScaleType::WholeTone,
        ScaleType::Diminished,
        ScaleType::DiminishedWH,
        ScaleType::Chromatic,
    ];

    /// Get the intervals (semitones from root) for this scale type
    pub fn intervals(self) -> &'static [u8] {
        match self {
            // Major and modes
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],

            // Other minor scales
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],

            // Pentatonic
            ScaleType::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleType::MinorPentatonic => &[0, 3, 5, 7, 10],

            // Blues
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
            ScaleType::MajorBlues => &[0, 2, 3, 4, 7, 9],

            // Exotic
            ScaleType::PhrygianDominant => &[0, 1, 4, 5, 7, 8, 10],
            ScaleType::LydianDominant => &[0, 2, 4, 6, 7, 9, 10],
            ScaleType::Altered => &[0, 1, 3, 4, 6, 8, 10],
            ScaleType::HungarianMinor => &[0, 2, 3, 6, 7, 8, 11],
            ScaleType::DoubleHarmonic => &[0, 1, 4, 5, 7, 8, 11],
            ScaleType::BebopDominant => &[0, 2, 4, 5, 7, 9, 10, 11],

            // Symmetric scales
            ScaleType::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleType::Diminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            ScaleType::DiminishedWH => &[0, 2, 3, 5, 6, 8, 9, 11],
            ScaleType::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    /// Parse scale type from string
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '-', '_', '(', ')'], "");
        match s.as_str() {
            "major" | "ionian" => Some(ScaleType::Major),
            "dorian" => Some(ScaleType::Dorian),
            "phrygian" => Some(ScaleType::Phrygian),
            "lydian" => Some(ScaleType::Lydian),
            "mixolydian" => Some(ScaleType::Mixolydian),
            "minor" | "naturalminor" | "aeolian" => Some(ScaleType::NaturalMinor),
            "locrian" => Some(ScaleType::Locrian),
            "harmonicminor" => Some(ScaleType::HarmonicMinor),
            "melodicminor" => Some(ScaleType::MelodicMinor),
            "majorpentatonic" | "pentatonicmajor" => Some(ScaleType::MajorPentatonic),
            "minorpentatonic" | "pentatonicminor" | "pentatonic" => {
                Some(ScaleType::MinorPentatonic)
            }
            "blues" | "minorblues" => Some(ScaleType::Blues),
            "majorblues" => Some(ScaleType::MajorBlues),
            "phrygiandominant" | "spanish" => Some(ScaleType::PhrygianDominant),
            "lydiandominant" | "overtone" => Some(ScaleType::LydianDominant),
            "altered" | "superlocrian" => Some(ScaleType::Altered),
            "hungarianminor" => Some(ScaleType::HungarianMinor),
            "doubleharmonic" | "byzantine" => Some(ScaleType::DoubleHarmonic),
            "bebopdominant" | "bebop" => Some(ScaleType::BebopDominant),
            "wholetone" => Some(ScaleType::WholeTone),
            "diminished" | "octatonic" | "halfwhole" => Some(ScaleType::Diminished),
            "diminishedwh" | "wholehalf" => Some(ScaleType::DiminishedWH),
            "chromatic" => Some(ScaleType::Chromatic),
            _ => None,
        }
    }

    /// Get a human-readable name for this scale type
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::NaturalMinor => "Natural Minor",
            ScaleType::Locrian => "Locrian",
            ScaleType::HarmonicMinor => "Harmonic Minor",
            ScaleType::MelodicMinor => "Melodic Minor",
            ScaleType::MajorPentatonic => "Major Pentatonic",
            ScaleType::MinorPentatonic => "Minor Pentatonic",
            ScaleType::Blues => "Blues",
            ScaleType::MajorBlues => "Major Blues",
            ScaleType::PhrygianDominant => "Phrygian Dominant",
            ScaleType::LydianDominant => "Lydian Dominant",
            ScaleType::Altered => "Altered",
            ScaleType::HungarianMinor => "Hungarian Minor",
            ScaleType::DoubleHarmonic => "Double Harmonic",
            ScaleType::BebopDominant => "Bebop Dominant",
            ScaleType::WholeTone => "Whole Tone",
            ScaleType::Diminished => "Diminished",
            ScaleType::DiminishedWH => "Diminished (W-H)",
            ScaleType::Chromatic => "Chromatic",
        }
    }

    /// Check if an interval class (0-11) belongs to this scale
    pub fn contains_interval(self, interval: u8) -> bool {
        self.intervals().contains(&(interval % 12))
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A complete scale with root and type
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    root: PitchClass,
    scale_type: ScaleType,
    notes: Vec<PitchClass>,
}

impl Scale {
    /// Create a new scale from root and type
    pub fn new(root: PitchClass, scale_type: ScaleType) -> Self {
        let notes = scale_type
            .intervals()
            .iter()
            .map(|&i| root.transpose(i as i32))
            .collect();

        Self {
            root,
            scale_type,
            notes,
        }
    }

    /// Get the root pitch class
    pub fn root(&self) -> PitchClass {
        self.root
    }

    /// Get the scale type
    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// Get the pitch classes in this scale
    pub fn notes(&self) -> &[PitchClass] {
        &self.notes
    }

    /// Check if a pitch class is in this scale
    pub fn contains(&self, pitch: PitchClass) -> bool {
        self.notes.contains(&pitch)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.scale_type)
    }
}

/// Every scale whose interval set contains all of `chord_intervals`,
/// in [`ScaleType::ALL`] priority order.
pub fn find_scales_for_chord(chord_intervals: &[u8]) -> Vec<&'static str> {
    ScaleType::ALL
        .iter()
        .filter(|scale| {
            chord_intervals
                .iter()
                .all(|&interval| scale.contains_interval(interval))
        })
        .map(|scale| scale.name())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_type_intervals() {
        assert_eq!(ScaleType::Major.intervals(), &[0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(ScaleType::NaturalMinor.intervals(), &[0, 2, 3, 5, 7, 8, 10]);
        assert_eq!(ScaleType::MinorPentatonic.intervals(), &[0, 3, 5, 7, 10]);
    }

    #[test]
    fn test_all_scales_start_on_root() {
        for scale in ScaleType::ALL {
            assert_eq!(scale.intervals()[0], 0, "{scale}");
            assert!(scale.intervals().windows(2).all(|w| w[0] < w[1]), "{scale}");
        }
    }

    #[test]
    fn test_scale_type_from_str() {
        assert_eq!(ScaleType::from_str("major"), Some(ScaleType::Major));
        assert_eq!(ScaleType::from_str("Minor"), Some(ScaleType::NaturalMinor));
        assert_eq!(ScaleType::from_str("harmonic_minor"), Some(ScaleType::HarmonicMinor));
        assert_eq!(ScaleType::from_str("Diminished (W-H)"), Some(ScaleType::DiminishedWH));
        assert_eq!(ScaleType::from_str("unknown"), None);
    }

    #[test]
    fn test_names_parse_back() {
        for scale in ScaleType::ALL {
            assert_eq!(ScaleType::from_str(scale.name()), Some(scale));
        }
    }

    #[test]
    fn test_scale_notes() {
        let c_major = Scale::new(PitchClass::C, ScaleType::Major);
        assert_eq!(
            c_major.notes(),
            &[
                PitchClass::C,
                PitchClass::D,
                PitchClass::E,
                PitchClass::F,
                PitchClass::G,
                PitchClass::A,
                PitchClass::B
            ]
        );
        assert!(c_major.contains(PitchClass::G));
        assert!(!c_major.contains(PitchClass::Fs));
    }

    #[test]
    fn test_scales_for_major_triad() {
        let scales = find_scales_for_chord(&[0, 4, 7]);
        assert_eq!(&scales[..3], &["Major", "Lydian", "Mixolydian"]);
        assert!(scales.contains(&"Major Pentatonic"));
        assert!(!scales.contains(&"Dorian"));
        assert_eq!(scales.last(), Some(&"Chromatic"));
    }

    #[test]
    fn test_scales_for_dominant_seventh() {
        let scales = find_scales_for_chord(&[0, 4, 7, 10]);
        assert_eq!(scales[0], "Mixolydian");
        assert!(scales.contains(&"Lydian Dominant"));
        assert!(!scales.contains(&"Major"));
    }

    #[test]
    fn test_scales_for_empty_chord_is_everything() {
        assert_eq!(find_scales_for_chord(&[]).len(), ScaleType::ALL.len());
    }
}
