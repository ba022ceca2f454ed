// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration files.
//!
//! Copedents live in a YAML library file; search limits in a small TOML
//! settings file. Both load through `anyhow` so callers get the path in
//! every error.

pub mod watcher;

pub use watcher::{validate_library, LibraryEvent, LibraryWatcher};

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::copedent::{presets, Copedent};

/// A set of copedents, one of which may be selected
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CopedentLibrary {
    #[serde(default)]
    pub copedents: Vec<Copedent>,
    /// Id of the copedent to use; the first one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl CopedentLibrary {
    /// Library holding only the built-in E9
    pub fn builtin() -> Result<Self> {
        let e9 = presets::emmons_e9().context("Failed to build the E9 preset")?;
        Ok(Self {
            selected: Some(e9.id.clone()),
            copedents: vec![e9],
        })
    }

    /// Load a library from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read library file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid library file: {:?}", path.as_ref()))
    }

    /// Parse a library, re-detecting splits and validating every copedent
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut library: CopedentLibrary =
            serde_yaml::from_str(yaml).context("Failed to parse YAML library")?;
        for copedent in &mut library.copedents {
            copedent.refresh_splits();
            copedent
                .validate()
                .with_context(|| format!("Copedent {:?} is invalid", copedent.id))?;
        }
        if let Some(id) = &library.selected {
            if library.get(id).is_none() {
                return Err(anyhow!("Selected copedent {:?} is not in the library", id));
            }
        }
        Ok(library)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize library to YAML")
    }

    /// Save the library to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write library file: {:?}", path.as_ref()))
    }

    pub fn get(&self, id: &str) -> Option<&Copedent> {
        self.copedents.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Copedent> {
        self.copedents.iter_mut().find(|c| c.id == id)
    }

    /// The selected copedent, or the first when nothing is selected
    pub fn selected(&self) -> Option<&Copedent> {
        match &self.selected {
            Some(id) => self.get(id),
            None => self.copedents.first(),
        }
    }
}

/// Search limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSettings {
    /// Highest fret for chord searches
    #[serde(default = "default_max_fret")]
    pub max_fret: u8,
    /// Highest fret for scale maps
    #[serde(default = "default_scale_max_fret")]
    pub scale_max_fret: u8,
    /// Voicings kept per fret; 0 keeps all
    #[serde(default = "default_results_per_fret")]
    pub results_per_fret: usize,
}

fn default_max_fret() -> u8 {
    24
}

fn default_scale_max_fret() -> u8 {
    12
}

fn default_results_per_fret() -> usize {
    3
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_fret: default_max_fret(),
            scale_max_fret: default_scale_max_fret(),
            results_per_fret: default_results_per_fret(),
        }
    }
}

impl SearchSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML settings")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings to TOML")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_toml()?;
        fs::write(path.as_ref(), text)
            .with_context(|| format!("Failed to write settings file: {:?}", path.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copedent::SplitResolution;
    use tempfile::tempdir;

    const LIBRARY: &str = r#"
selected: small
copedents:
  - id: small
    name: Small
    strings:
      - id: 1
        open_note: G#4
      - id: 2
        open_note: E4
      - id: 3
        open_note: B3
    pedals:
      - id: P1
        name: A
        changes:
          3: 2
    knee_levers:
      - id: LKV
        name: E to Eb
        changes:
          2: -1
          3: -1
      - id: RKV
        name: Unused
        active: false
    detected_splits:
      - string_id: 3
        open_note: B3
        conflicting_controls:
          - id: LKV
            name: E to Eb
            type: lever
          - id: P1
            name: A
            type: pedal
        manual_semitone_change: 0
        is_included_in_calculation: include
"#;

    #[test]
    fn test_parse_library() {
        let library = CopedentLibrary::from_yaml(LIBRARY).unwrap();
        let small = library.selected().unwrap();
        assert_eq!(small.id, "small");
        assert_eq!(small.strings().len(), 3);
        assert_eq!(small.active_levers().count(), 1);
        let split = &small.splits()[0];
        assert_eq!(split.is_included_in_calculation, SplitResolution::Include);
        assert_eq!(split.manual_semitone_change, 0);
    }

    #[test]
    fn test_missing_splits_are_detected_on_load() {
        let yaml = LIBRARY.split("    detected_splits:").next().unwrap();
        let library = CopedentLibrary::from_yaml(yaml).unwrap();
        let splits = library.selected().unwrap().splits();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].is_included_in_calculation, SplitResolution::Define);
        assert_eq!(splits[0].manual_semitone_change, 1);
    }

    #[test]
    fn test_rejects_invalid_library() {
        let dangling = LIBRARY.replace("          3: 2", "          9: 2");
        assert!(CopedentLibrary::from_yaml(&dangling).is_err());

        let bad_lever = LIBRARY.replace("id: LKV", "id: XKV");
        assert!(CopedentLibrary::from_yaml(&bad_lever).is_err());

        let bad_selection = LIBRARY.replace("selected: small", "selected: big");
        assert!(CopedentLibrary::from_yaml(&bad_selection).is_err());

        assert!(CopedentLibrary::from_yaml("copedents: [").is_err());
    }

    #[test]
    fn test_library_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("library.yaml");
        let library = CopedentLibrary::builtin().unwrap();
        library.save(&path).unwrap();
        let loaded = CopedentLibrary::load(&path).unwrap();
        assert_eq!(loaded, library);
        assert_eq!(loaded.selected().unwrap().id, "emmons-e9");
    }

    #[test]
    fn test_selected_defaults_to_first() {
        let mut library = CopedentLibrary::builtin().unwrap();
        library.selected = None;
        assert_eq!(library.selected().unwrap().id, "emmons-e9");
        assert!(CopedentLibrary::default().selected().is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = SearchSettings::from_toml("").unwrap();
        assert_eq!(settings, SearchSettings::default());
        assert_eq!(settings.max_fret, 24);
        assert_eq!(settings.scale_max_fret, 12);
        assert_eq!(settings.results_per_fret, 3);

        let settings = SearchSettings::from_toml("max_fret = 15").unwrap();
        assert_eq!(settings.max_fret, 15);
        assert_eq!(settings.results_per_fret, 3);
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = SearchSettings {
            max_fret: 12,
            scale_max_fret: 5,
            results_per_fret: 0,
        };
        settings.save(&path).unwrap();
        assert_eq!(SearchSettings::load(&path).unwrap(), settings);
        assert!(SearchSettings::from_toml("max_fret = \"high\"").is_err());
    }
}
