//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use patchlab_synth::{ParamSnapshot, ParameterStore, SynthParams};

use crate::error::ConfigError;
use crate::validation::{ValidationError, validate_params};

/// On-disk encoding of a preset, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl PresetFormat {
    /// Format for a path's extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(PresetFormat::Toml),
            "json" => Some(PresetFormat::Json),
            _ => None,
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            PresetFormat::Toml => "toml",
            PresetFormat::Json => "json",
        }
    }
}

/// A named, complete set of synth parameters.
///
/// Presets replace every parameter at once. Fields missing from a file take
/// their documented defaults, so older presets without pan, a second LFO or a
/// modulation matrix still load.
///
/// # TOML Format
///
/// ```toml
/// name = "FM Bell"
/// description = "Inharmonic bell with a decaying index"
///
/// [params.common]
/// volume = -9.0
///
/// [params.common.envelopes.amplitude]
/// attack = 0.001
/// decay = 1.8
/// sustain = 0.0
/// release = 2.0
///
/// [params.paradigm]
/// kind = "fm"
/// harmonicity = 3.5
/// modulation_index = 8.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Every synth parameter.
    #[serde(default)]
    pub params: SynthParams,
}

impl Preset {
    /// Create a preset from parameters.
    pub fn new(name: impl Into<String>, params: SynthParams) -> Self {
        Self {
            name: name.into(),
            description: None,
            params,
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load a preset from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = PresetFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = match format {
            PresetFormat::Toml => Self::from_toml(&content)?,
            PresetFormat::Json => Self::from_json(&content)?,
        };
        tracing::info!(
            name = %preset.name,
            paradigm = ?preset.params.kind(),
            path = %path.display(),
            "preset loaded"
        );
        Ok(preset)
    }

    /// Load a preset and reject it if any parameter is out of range.
    ///
    /// For preset authoring; [`load`](Self::load) accepts the file and lets
    /// the store clamp.
    pub fn load_strict(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let preset = Self::load(path)?;
        preset.validate()?;
        Ok(preset)
    }

    /// Parse a preset from TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Parse a preset from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the preset, choosing the format from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = PresetFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = match format {
            PresetFormat::Toml => self.to_toml()?,
            PresetFormat::Json => self.to_json()?,
        };
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(name = %self.name, path = %path.display(), "preset saved");
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convert the preset to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strictly check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_params(&self.params)
    }

    /// Publish the preset's parameters to a store, replacing all of them.
    ///
    /// Out-of-range values are clamped by the store.
    pub fn load_into(&self, store: &ParameterStore) -> Arc<ParamSnapshot> {
        store.replace_all(self.params)
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::new("Init", SynthParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlab_synth::{ParadigmKind, ParadigmParams};

    #[test]
    fn test_preset_default() {
        let preset = Preset::default();
        assert_eq!(preset.name, "Init");
        assert!(preset.description.is_none());
        assert_eq!(preset.params.kind(), ParadigmKind::Subtractive);
    }

    #[test]
    fn test_preset_from_toml() {
        let toml = r#"
name = "Bell"
description = "A test preset"

[params.common]
volume = -9.0

[params.paradigm]
kind = "fm"
harmonicity = 3.5
"#;
        let preset = Preset::from_toml(toml).unwrap();
        assert_eq!(preset.name, "Bell");
        assert_eq!(preset.description.as_deref(), Some("A test preset"));
        assert_eq!(preset.params.common.volume, -9.0);
        let ParadigmParams::Fm(fm) = preset.params.paradigm else {
            panic!("expected fm");
        };
        assert_eq!(fm.harmonicity, 3.5);
    }

    #[test]
    fn test_minimal_toml() {
        let preset = Preset::from_toml("name = \"Minimal\"").unwrap();
        assert_eq!(preset.name, "Minimal");
        assert_eq!(preset.params, SynthParams::default());
    }

    #[test]
    fn test_preset_to_toml() {
        let preset = Preset::new("Test", SynthParams::additive()).with_description("Organ");
        let toml = preset.to_toml().unwrap();
        assert!(toml.contains("name = \"Test\""));
        assert!(toml.contains("description = \"Organ\""));
        assert!(toml.contains("kind = \"additive\""));
    }

    #[test]
    fn test_toml_and_json_roundtrip() {
        let original = Preset::new("Roundtrip", SynthParams::fm()).with_description("both ways");
        assert_eq!(Preset::from_toml(&original.to_toml().unwrap()).unwrap(), original);
        assert_eq!(Preset::from_json(&original.to_json().unwrap()).unwrap(), original);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(PresetFormat::from_path(Path::new("a.toml")), Some(PresetFormat::Toml));
        assert_eq!(PresetFormat::from_path(Path::new("dir/a.json")), Some(PresetFormat::Json));
        assert_eq!(PresetFormat::from_path(Path::new("a.yaml")), None);
        assert_eq!(PresetFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_strict_reports_issues() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.toml");
        let bad = dir.path().join("bad.json");
        Preset::new("Good", SynthParams::fm()).save(&good).unwrap();
        std::fs::write(&bad, r#"{"name": "Bad", "params": {"common": {"pan": 4.0}}}"#).unwrap();

        assert_eq!(Preset::load_strict(&good).unwrap().name, "Good");
        let err = Preset::load_strict(&bad).unwrap_err();
        let ConfigError::Validation(validation) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(validation.issues[0].field, "common.pan");
        assert!(err.to_string().starts_with("validation failed: parameter 'common.pan'"));
    }

    #[test]
    fn test_load_into_replaces_params() {
        let store = ParameterStore::new(SynthParams::subtractive());
        let snapshot = Preset::new("FM", SynthParams::fm()).load_into(&store);
        assert_eq!(snapshot.version, 1);
        assert_eq!(store.params().kind(), ParadigmKind::Fm);
    }
}
